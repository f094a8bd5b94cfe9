//! GETPASSWORD and CHANGEPASSWORD handlers (owner, private rooms only).

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use chatter_proto::Reply;
use tracing::{info, warn};

/// Handler for `GETPASSWORD`.
pub struct GetPasswordHandler;

#[async_trait]
impl Handler for GetPasswordHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        let snap = ctx.require_owner().await?;

        let room = ctx.hub.room(&snap.room_id).ok_or(HandlerError::NotInRoom)?;
        let r = room.read().await;
        if !r.is_private {
            return ctx.reply(Reply::Error("This room has no password".into()));
        }
        ctx.reply(Reply::RoomPassword(r.password.clone()))
    }
}

/// Handler for `CHANGEPASSWORD <password>`.
pub struct ChangePasswordHandler;

#[async_trait]
impl Handler for ChangePasswordHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult {
        let snap = ctx.require_owner().await?;

        let password = args.trim();
        if password.is_empty() {
            return Err(HandlerError::Usage("CHANGEPASSWORD <password>"));
        }

        let room = ctx.hub.room(&snap.room_id).ok_or(HandlerError::NotInRoom)?;
        {
            let mut r = room.write().await;
            if !r.is_private {
                return ctx.reply(Reply::Error(
                    "Cannot set a password on a public room".into(),
                ));
            }
            r.password = password.to_string();
            r.broadcast(
                &ctx.hub.senders,
                &chatter_proto::system_line("The room password was changed"),
                Some(ctx.conn_id),
            );
        }

        if let Err(e) = ctx
            .hub
            .db
            .rooms()
            .update_password(&snap.room_id, password)
            .await
        {
            warn!(room = %snap.room_id, error = %e, "Failed to persist password change");
        }

        info!(room = %snap.room_id, "Room password changed");
        ctx.reply(Reply::PasswordChanged(password.to_string()))
    }
}
