//! Classification and parsing of client lines.

use thiserror::Error;

/// Errors produced while classifying a client line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `/` line with nothing after the slash.
    #[error("empty command verb")]
    EmptyVerb,
    /// An `@` line with no recipient before the first space.
    #[error("empty private message recipient")]
    EmptyRecipient,
    /// An `@recipient` line with no message content.
    #[error("empty private message content")]
    EmptyContent,
}

/// A classified client line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// `/VERB args` — verb is uppercased, args are trimmed.
    Command { verb: String, args: String },
    /// `@recipient content` — a private message to one user in the room.
    Private { recipient: String, content: String },
    /// Anything else: a public message to the sender's current room.
    Chat { content: String },
}

/// Classify a raw client line.
///
/// Surrounding whitespace is trimmed first; a blank line yields `Ok(None)`
/// and is ignored by the server.
pub fn parse(raw: &str) -> Result<Option<Inbound>, ParseError> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(rest) = line.strip_prefix('/') {
        let rest = rest.trim_start();
        let (verb, args) = match rest.split_once(char::is_whitespace) {
            Some((verb, args)) => (verb, args.trim()),
            None => (rest, ""),
        };
        if verb.is_empty() {
            return Err(ParseError::EmptyVerb);
        }
        return Ok(Some(Inbound::Command {
            verb: verb.to_ascii_uppercase(),
            args: args.to_string(),
        }));
    }

    if let Some(rest) = line.strip_prefix('@') {
        let (recipient, content) = match rest.split_once(char::is_whitespace) {
            Some((recipient, content)) => (recipient, content.trim()),
            None => (rest, ""),
        };
        if recipient.is_empty() {
            return Err(ParseError::EmptyRecipient);
        }
        if content.is_empty() {
            return Err(ParseError::EmptyContent);
        }
        return Ok(Some(Inbound::Private {
            recipient: recipient.to_string(),
            content: content.to_string(),
        }));
    }

    Ok(Some(Inbound::Chat {
        content: line.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(verb: &str, args: &str) -> Option<Inbound> {
        Some(Inbound::Command {
            verb: verb.into(),
            args: args.into(),
        })
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   \t  "), Ok(None));
        assert_eq!(parse("\r\n"), Ok(None));
    }

    #[test]
    fn verbs_are_uppercased() {
        assert_eq!(parse("/join 123456"), Ok(cmd("JOIN", "123456")));
        assert_eq!(parse("/JoIn 123456"), Ok(cmd("JOIN", "123456")));
        assert_eq!(parse("/LIST"), Ok(cmd("LIST", "")));
    }

    #[test]
    fn args_keep_case_and_inner_spacing() {
        assert_eq!(
            parse("/setname Alice McAllister"),
            Ok(cmd("SETNAME", "Alice McAllister"))
        );
        assert_eq!(
            parse("  /create PRIVATE sEcReT  "),
            Ok(cmd("CREATE", "PRIVATE sEcReT"))
        );
    }

    #[test]
    fn private_messages_split_on_first_space() {
        assert_eq!(
            parse("@Bob yo, got a minute?"),
            Ok(Some(Inbound::Private {
                recipient: "Bob".into(),
                content: "yo, got a minute?".into(),
            }))
        );
    }

    #[test]
    fn malformed_private_messages_error() {
        assert_eq!(parse("@ hello"), Err(ParseError::EmptyRecipient));
        assert_eq!(parse("@Bob"), Err(ParseError::EmptyContent));
        assert_eq!(parse("@Bob   "), Err(ParseError::EmptyContent));
    }

    #[test]
    fn bare_slash_errors() {
        assert_eq!(parse("/"), Err(ParseError::EmptyVerb));
        assert_eq!(parse("/   "), Err(ParseError::EmptyVerb));
    }

    #[test]
    fn everything_else_is_chat() {
        assert_eq!(
            parse("hello world"),
            Ok(Some(Inbound::Chat {
                content: "hello world".into()
            }))
        );
        // '@' and '/' only classify in leading position
        assert_eq!(
            parse("mail me @ home"),
            Ok(Some(Inbound::Chat {
                content: "mail me @ home".into()
            }))
        );
    }
}
