//! JOIN command handler.

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use chatter_proto::Reply;
use tracing::{info, warn};

/// Handler for `JOIN <room_id> [password]`.
///
/// Existence, ban state (room set and store), and password are screened
/// before the joiner leaves its old room, then verified again under the
/// write lock that inserts the member — the screening pass is advisory,
/// the insert-time pass is binding. The joiner sees `ROOM_JOINED`, then
/// the history block, strictly before any live traffic — the history lines
/// are queued while the room lock is held, so the broadcaster cannot
/// interleave.
pub struct JoinHandler;

#[async_trait]
impl Handler for JoinHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult {
        let snap = ctx.require_name().await?;

        let (room_id, password) = match args.split_once(char::is_whitespace) {
            Some((id, pw)) => (id, pw.trim()),
            None => (args, ""),
        };
        if room_id.is_empty() {
            return Err(HandlerError::Usage("JOIN <room_id> [password]"));
        }

        let Some(room) = ctx.hub.room(room_id) else {
            return ctx.reply(Reply::RoomNotFound);
        };

        // Preconditions under a read lock, before the old room is left.
        {
            let r = room.read().await;
            if r.defunct {
                return ctx.reply(Reply::RoomNotFound);
            }
            if r.is_banned(&snap.username) {
                return ctx.reply(Reply::Error("You are banned from this room".into()));
            }
            if r.is_private && !r.is_member(ctx.conn_id) {
                if password.is_empty() {
                    return ctx.reply(Reply::PasswordRequired);
                }
                if !r.verify_password(password) {
                    return ctx.reply(Reply::WrongPassword);
                }
            }
        }

        // Persisted bans outlive the in-memory set.
        match ctx.hub.db.bans().is_banned(room_id, &snap.username).await {
            Ok(true) => return ctx.reply(Reply::Error("You are banned from this room".into())),
            Ok(false) => {}
            Err(e) => warn!(room = %room_id, error = %e, "Ban lookup failed"),
        }

        if !snap.room_id.is_empty() && snap.room_id != room_id {
            ctx.hub.leave_current_room(ctx.conn_id).await;
        }

        // Fetch durable history before taking the write lock; fall back to
        // the in-memory ring when the store has nothing.
        let mut history = match ctx
            .hub
            .db
            .messages()
            .room_history(room_id, ctx.hub.history_limit as u32)
            .await
        {
            Ok(lines) => lines,
            Err(e) => {
                warn!(room = %room_id, error = %e, "History query failed");
                Vec::new()
            }
        };

        let is_owner_now;
        {
            let mut r = room.write().await;
            if r.defunct {
                return ctx.reply(Reply::RoomNotFound);
            }

            // The precondition pass ran under a read lock that has since
            // been released; a concurrent BAN or CHANGEPASSWORD may have
            // committed in the meantime. Every check gating the insert must
            // hold under this write lock.
            if r.is_banned(&snap.username) {
                return ctx.reply(Reply::Error("You are banned from this room".into()));
            }
            let rejoining = r.is_member(ctx.conn_id);
            if r.is_private && !rejoining {
                if password.is_empty() {
                    return ctx.reply(Reply::PasswordRequired);
                }
                if !r.verify_password(password) {
                    return ctx.reply(Reply::WrongPassword);
                }
            }

            r.add_member(ctx.conn_id);
            is_owner_now = r.owner == ctx.conn_id;

            if history.is_empty() {
                history = r.history().map(String::from).collect();
            }

            // Queued under the room lock: the broadcaster needs this lock to
            // deliver, so nothing can slot in between ack, history and the
            // first live line.
            ctx.reply(Reply::RoomJoined(room_id.to_string()))?;
            ctx.reply(Reply::MessageHistoryStart)?;
            for line in &history {
                ctx.reply_line(line.clone())?;
            }
            ctx.reply(Reply::MessageHistoryEnd)?;

            if !rejoining {
                r.broadcast(
                    &ctx.hub.senders,
                    &chatter_proto::system_line(&format!(
                        "{} has joined the room",
                        snap.username
                    )),
                    Some(ctx.conn_id),
                );
            }
        }

        {
            let session = ctx.session()?;
            let mut s = session.write().await;
            s.room_id = room_id.to_string();
            s.is_owner = is_owner_now;
            s.owner_leave_armed = false;
        }

        info!(room = %room_id, user = %snap.username, "User joined room");
        Ok(())
    }
}
