//! LEAVE and FORCELEAVE handlers.
//!
//! The owner's departure is a two-step protocol: the first LEAVE only arms
//! a warning; the client re-issues it as FORCELEAVE, which transfers the
//! room to the longest-tenured remaining member (or empties it).

use super::{Context, Handler};
use crate::error::HandlerResult;
use async_trait::async_trait;
use chatter_proto::Reply;

/// Handler for `LEAVE`.
pub struct LeaveHandler;

#[async_trait]
impl Handler for LeaveHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        let snap = ctx.require_room().await?;

        if snap.is_owner {
            ctx.session()?.write().await.owner_leave_armed = true;
            return ctx.reply(Reply::OwnerLeaveWarning);
        }

        ctx.hub.leave_current_room(ctx.conn_id).await;
        ctx.reply(Reply::LeftRoom)
    }
}

/// Handler for `FORCELEAVE`.
pub struct ForceLeaveHandler;

#[async_trait]
impl Handler for ForceLeaveHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        ctx.require_owner().await?;

        ctx.hub.leave_current_room(ctx.conn_id).await;
        ctx.reply(Reply::LeftRoom)
    }
}
