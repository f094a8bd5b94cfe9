//! Chat and private-message intake.
//!
//! These are not registry commands: the codec classifies them and dispatch
//! routes them here. Both just validate preconditions and push an envelope
//! onto the broadcast queue; formatting, fan-out, and persistence happen in
//! the broadcaster.

use super::Context;
use crate::broadcast::Envelope;
use crate::error::{HandlerError, HandlerResult};

/// Queue a public message to the sender's current room.
pub async fn queue_public(ctx: &Context<'_>, content: String) -> HandlerResult {
    let snap = ctx.require_room().await?;

    ctx.hub
        .queue_tx
        .send(Envelope {
            sender: ctx.conn_id,
            sender_name: snap.username,
            room_id: snap.room_id,
            content,
            is_private: false,
            recipient: String::new(),
        })
        .await
        .map_err(|e| HandlerError::Internal(format!("broadcast queue closed: {e}")))
}

/// Queue a private message to one user in the sender's current room.
pub async fn queue_private(ctx: &Context<'_>, recipient: String, content: String) -> HandlerResult {
    let snap = ctx.require_room().await?;

    ctx.hub
        .queue_tx
        .send(Envelope {
            sender: ctx.conn_id,
            sender_name: snap.username,
            room_id: snap.room_id,
            content,
            is_private: true,
            recipient,
        })
        .await
        .map_err(|e| HandlerError::Internal(format!("broadcast queue closed: {e}")))
}
