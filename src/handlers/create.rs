//! CREATE command handler.

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use chatter_proto::Reply;
use tracing::{info, warn};

/// Handler for `CREATE PUBLIC` and `CREATE PRIVATE <password>`.
///
/// The creator leaves any current room first (with the usual departure
/// protocol) and becomes the sole member and owner of the fresh room.
pub struct CreateHandler;

#[async_trait]
impl Handler for CreateHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &str) -> HandlerResult {
        let snap = ctx.require_name().await?;

        let (kind, rest) = match args.split_once(char::is_whitespace) {
            Some((kind, rest)) => (kind, rest.trim()),
            None => (args, ""),
        };

        let (is_private, password) = match kind {
            "PUBLIC" => (false, String::new()),
            "PRIVATE" => {
                if rest.is_empty() {
                    return Err(HandlerError::Usage("CREATE PRIVATE <password>"));
                }
                (true, rest.to_string())
            }
            _ => return Err(HandlerError::Usage("CREATE PUBLIC | CREATE PRIVATE <password>")),
        };

        ctx.hub.leave_current_room(ctx.conn_id).await;

        let (room_id, _room) = ctx
            .hub
            .create_room(is_private, password.clone(), ctx.conn_id);

        {
            let session = ctx.session()?;
            let mut s = session.write().await;
            s.room_id = room_id.clone();
            s.is_owner = true;
            s.owner_leave_armed = false;
        }

        if let Err(e) = ctx
            .hub
            .db
            .rooms()
            .create(&room_id, is_private, &snap.username, &password)
            .await
        {
            warn!(room = %room_id, error = %e, "Failed to persist room");
        }

        info!(
            room = %room_id,
            owner = %snap.username,
            private = is_private,
            "Room created"
        );
        ctx.reply(Reply::RoomCreated {
            id: room_id,
            is_private,
        })
    }
}
