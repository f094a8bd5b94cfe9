//! Command handlers.
//!
//! This module contains the Handler trait and the command registry that
//! dispatches classified client lines to the right handler. Chat and
//! private-message lines bypass the registry and go straight to the
//! broadcast queue (see [`messaging`]).

mod create;
mod join;
mod leave;
mod messaging;
mod moderation;
mod name;
mod password;
mod query;

pub use create::CreateHandler;
pub use join::JoinHandler;
pub use leave::{ForceLeaveHandler, LeaveHandler};
pub use moderation::{BanHandler, KickHandler, TransferHandler};
pub use name::SetNameHandler;
pub use password::{ChangePasswordHandler, GetPasswordHandler};
pub use query::{ListHandler, UsersHandler};

use crate::error::{HandlerError, HandlerResult};
use crate::state::{ConnId, Hub, Session};
use async_trait::async_trait;
use chatter_proto::{Inbound, Reply};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The connection this command arrived on.
    pub conn_id: ConnId,
    /// Shared server state.
    pub hub: &'a Arc<Hub>,
    /// Outbound channel of this connection.
    pub sender: &'a mpsc::UnboundedSender<String>,
}

/// Copy of the session fields handlers branch on.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub username: String,
    pub room_id: String,
    pub is_owner: bool,
}

impl Context<'_> {
    /// Queue a typed reply on this connection.
    pub fn reply(&self, reply: Reply) -> HandlerResult {
        self.sender.send(reply.to_string())?;
        Ok(())
    }

    /// Queue a raw line on this connection.
    pub fn reply_line(&self, line: String) -> HandlerResult {
        self.sender.send(line)?;
        Ok(())
    }

    /// This connection's session record.
    pub fn session(&self) -> Result<Arc<RwLock<Session>>, HandlerError> {
        self.hub
            .session(self.conn_id)
            .ok_or(HandlerError::SessionMissing)
    }

    /// Snapshot the session fields commands branch on.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, HandlerError> {
        let session = self.session()?;
        let s = session.read().await;
        Ok(SessionSnapshot {
            username: s.username.clone(),
            room_id: s.room_id.clone(),
            is_owner: s.is_owner,
        })
    }

    /// Precondition: the session has taken a username.
    pub async fn require_name(&self) -> Result<SessionSnapshot, HandlerError> {
        let snap = self.snapshot().await?;
        if snap.username.is_empty() {
            return Err(HandlerError::NoName);
        }
        Ok(snap)
    }

    /// Precondition: the session sits in a room.
    pub async fn require_room(&self) -> Result<SessionSnapshot, HandlerError> {
        let snap = self.require_name().await?;
        if snap.room_id.is_empty() {
            return Err(HandlerError::NotInRoom);
        }
        Ok(snap)
    }

    /// Precondition: the session owns its current room.
    pub async fn require_owner(&self) -> Result<SessionSnapshot, HandlerError> {
        let snap = self.require_room().await?;
        if !snap.is_owner {
            return Err(HandlerError::NotOwner);
        }
        Ok(snap)
    }
}

/// Trait implemented by all command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle one command; `args` is the trimmed argument string.
    async fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult;
}

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        handlers.insert("SETNAME", Box::new(SetNameHandler));
        handlers.insert("CREATE", Box::new(CreateHandler));
        handlers.insert("JOIN", Box::new(JoinHandler));
        handlers.insert("LIST", Box::new(ListHandler));
        handlers.insert("USERS", Box::new(UsersHandler));
        handlers.insert("GETPASSWORD", Box::new(GetPasswordHandler));
        handlers.insert("CHANGEPASSWORD", Box::new(ChangePasswordHandler));
        handlers.insert("KICK", Box::new(KickHandler));
        handlers.insert("BAN", Box::new(BanHandler));
        handlers.insert("TRANSFER", Box::new(TransferHandler));
        handlers.insert("LEAVE", Box::new(LeaveHandler));
        handlers.insert("FORCELEAVE", Box::new(ForceLeaveHandler));

        Self { handlers }
    }

    /// Classify one raw line and run it: command, private message, or chat.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, raw: &str) -> HandlerResult {
        match chatter_proto::parse(raw)? {
            None => Ok(()),
            Some(Inbound::Command { verb, args }) => match self.handlers.get(verb.as_str()) {
                Some(handler) => handler.handle(ctx, &args).await,
                None => Err(HandlerError::UnknownCommand(verb)),
            },
            Some(Inbound::Private { recipient, content }) => {
                messaging::queue_private(ctx, recipient, content).await
            }
            Some(Inbound::Chat { content }) => messaging::queue_public(ctx, content).await,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
