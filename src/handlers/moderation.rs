//! KICK, BAN and TRANSFER handlers (owner authority).

use super::{Context, Handler, SessionSnapshot};
use crate::error::{HandlerError, HandlerResult};
use crate::state::{ConnId, Room};
use async_trait::async_trait;
use chatter_proto::Reply;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Owner-command boilerplate shared by kick/ban/transfer: validate the
/// target name and resolve it to a connection among the room's members.
async fn resolve_target(
    ctx: &Context<'_>,
    snap: &SessionSnapshot,
    target: &str,
    usage: &'static str,
) -> Result<(Arc<RwLock<Room>>, Option<ConnId>), HandlerError> {
    if target.is_empty() {
        return Err(HandlerError::Usage(usage));
    }
    let room = ctx.hub.room(&snap.room_id).ok_or(HandlerError::NotInRoom)?;
    let members = room.read().await.members_by_tenure();
    let target_conn = ctx.hub.resolve_member(&members, target).await;
    Ok((room, target_conn))
}

/// Handler for `KICK <username>`. A kick is not a ban: the target may
/// rejoin immediately.
pub struct KickHandler;

#[async_trait]
impl Handler for KickHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult {
        let snap = ctx.require_owner().await?;
        let target = args.trim();
        if target == snap.username {
            return ctx.reply(Reply::Error("You cannot kick yourself".into()));
        }

        let (room, target_conn) = resolve_target(ctx, &snap, target, "KICK <username>").await?;
        let Some(target_conn) = target_conn else {
            return ctx.reply(Reply::Error(format!("User {target} is not in the room")));
        };

        ctx.hub.send_reply(target_conn, &Reply::KickedFromRoom);
        {
            let mut r = room.write().await;
            r.remove_member(target_conn);
            r.broadcast_to_all(
                &ctx.hub.senders,
                &chatter_proto::system_line(&format!("{target} was kicked from the room")),
            );
        }
        if let Some(session) = ctx.hub.session(target_conn) {
            session.write().await.clear_room();
        }

        info!(room = %snap.room_id, target = %target, by = %snap.username, "User kicked");
        ctx.reply(Reply::Success(format!("{target} kicked from the room")))
    }
}

/// Handler for `BAN <username>`. Tolerates an absent target: the ban is
/// recorded either way and bites on the next join attempt.
pub struct BanHandler;

#[async_trait]
impl Handler for BanHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult {
        let snap = ctx.require_owner().await?;
        let target = args.trim();
        if target == snap.username {
            return ctx.reply(Reply::Error("You cannot ban yourself".into()));
        }

        let (room, target_conn) = resolve_target(ctx, &snap, target, "BAN <username>").await?;

        if let Some(target_conn) = target_conn {
            ctx.hub.send_reply(target_conn, &Reply::KickedFromRoom);
        }
        {
            let mut r = room.write().await;
            r.ban(target);
            if let Some(target_conn) = target_conn {
                r.remove_member(target_conn);
            }
            r.broadcast_to_all(
                &ctx.hub.senders,
                &chatter_proto::system_line(&format!("{target} was banned from the room")),
            );
        }
        if let Some(target_conn) = target_conn
            && let Some(session) = ctx.hub.session(target_conn)
        {
            session.write().await.clear_room();
        }

        if let Err(e) = ctx.hub.db.bans().add(&snap.room_id, target).await {
            warn!(room = %snap.room_id, target = %target, error = %e, "Failed to persist ban");
        }

        info!(room = %snap.room_id, target = %target, by = %snap.username, "User banned");
        ctx.reply(Reply::Success(format!("{target} banned from the room")))
    }
}

/// Handler for `TRANSFER <username>`: hand ownership to another member.
pub struct TransferHandler;

#[async_trait]
impl Handler for TransferHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult {
        let snap = ctx.require_owner().await?;
        let target = args.trim();
        if target == snap.username {
            return ctx.reply(Reply::Error("You already own this room".into()));
        }

        let (room, target_conn) = resolve_target(ctx, &snap, target, "TRANSFER <username>").await?;
        let Some(target_conn) = target_conn else {
            return ctx.reply(Reply::Error(format!("User {target} is not in the room")));
        };

        {
            let mut r = room.write().await;
            r.owner = target_conn;

            // Room -> Session order holds here.
            ctx.session()?.write().await.is_owner = false;
            if let Some(session) = ctx.hub.session(target_conn) {
                session.write().await.is_owner = true;
            }

            ctx.hub.send_reply(target_conn, &Reply::OwnershipReceived);
            r.broadcast_to_all(
                &ctx.hub.senders,
                &chatter_proto::system_line(&format!(
                    "{} transferred ownership to {target}",
                    snap.username
                )),
            );
        }

        if let Err(e) = ctx.hub.db.rooms().update_owner(&snap.room_id, target).await {
            warn!(room = %snap.room_id, error = %e, "Failed to persist ownership transfer");
        }

        info!(room = %snap.room_id, from = %snap.username, to = %target, "Ownership transferred");
        Ok(())
    }
}
