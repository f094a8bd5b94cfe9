//! SETNAME command handler.

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use chatter_proto::Reply;
use tracing::{info, warn};

/// Handler for `SETNAME <name>`.
///
/// The name must be unique across live sessions; the durable `users` row is
/// created (or its `last_seen` refreshed) as a side effect.
pub struct SetNameHandler;

#[async_trait]
impl Handler for SetNameHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult {
        let name = args.trim();
        if name.is_empty() {
            return Err(HandlerError::Usage("SETNAME <name>"));
        }
        // Separators the list replies and PM addressing depend on.
        if name.contains(char::is_whitespace) || name.contains(',') || name.contains(':') {
            return ctx.reply(Reply::Error(
                "Invalid username: spaces, commas and colons are not allowed".into(),
            ));
        }

        if ctx.hub.username_taken(name, ctx.conn_id).await {
            return ctx.reply(Reply::NameTaken);
        }

        let session = ctx.session()?;
        session.write().await.username = name.to_string();

        ctx.reply(Reply::NameSet)?;
        info!(conn = %ctx.conn_id, name = %name, "Username set");

        if let Err(e) = ctx.hub.db.users().register_seen(name).await {
            warn!(name = %name, error = %e, "Failed to register user");
        }
        Ok(())
    }
}
