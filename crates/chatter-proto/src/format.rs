//! Chat line formatting.

use chrono::{Local, NaiveDateTime};

/// Format of the store's `DATETIME` column rendering.
const STORED_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current wall-clock time as `[HH:MM:SS]`.
pub fn timestamp() -> String {
    Local::now().format("[%H:%M:%S]").to_string()
}

/// A public chat line: `[HH:MM:SS] sender: content`.
pub fn chat_line(sender: &str, content: &str) -> String {
    format!("{} {}: {}", timestamp(), sender, content)
}

/// A system event line: `[HH:MM:SS] SYSTEM: text`.
pub fn system_line(text: &str) -> String {
    format!("{} SYSTEM: {}", timestamp(), text)
}

/// A replayed history line: `[HH:MM:SS] sender: content`.
///
/// `stored_ts` is the store's `YYYY-MM-DD HH:MM:SS` rendering (UTC); it is
/// re-rendered in local time so replayed lines carry the same bracket shape
/// as live traffic. An unparseable value is bracketed verbatim.
pub fn history_line(stored_ts: &str, sender: &str, content: &str) -> String {
    let bracket = match NaiveDateTime::parse_from_str(stored_ts, STORED_TS_FORMAT) {
        Ok(naive) => naive
            .and_utc()
            .with_timezone(&Local)
            .format("[%H:%M:%S]")
            .to_string(),
        Err(_) => format!("[{stored_ts}]"),
    };
    format!("{bracket} {sender}: {content}")
}
