//! The broadcast pipeline.
//!
//! A single FIFO of message envelopes feeds one broadcaster task. The task
//! pops one envelope at a time, which gives the ordering guarantee the
//! protocol promises: lines queued by one client are delivered in
//! submission order, and cross-client interleaving is whatever order the
//! queue saw.
//!
//! The broadcaster holds only a room id per envelope and must tolerate the
//! room having disappeared between enqueue and dequeue.

use crate::state::{ConnId, Hub};
use chatter_proto::Reply;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One queued chat message.
#[derive(Debug)]
pub struct Envelope {
    pub sender: ConnId,
    pub sender_name: String,
    pub room_id: String,
    pub content: String,
    pub is_private: bool,
    /// Recipient username; empty for public messages.
    pub recipient: String,
}

/// Long-lived broadcaster task. Exits on shutdown after finishing the
/// envelope in hand, or when every producer is gone.
pub async fn run_broadcaster(hub: Arc<Hub>, mut queue_rx: mpsc::Receiver<Envelope>) {
    let mut shutdown_rx = hub.shutdown_tx.subscribe();
    loop {
        tokio::select! {
            maybe = queue_rx.recv() => {
                let Some(envelope) = maybe else { break };
                if envelope.is_private {
                    deliver_private(&hub, envelope).await;
                } else {
                    deliver_public(&hub, envelope).await;
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
    debug!("Broadcaster stopped");
}

/// Fan a public message out to the room, record it in the history ring,
/// and persist it.
async fn deliver_public(hub: &Hub, envelope: Envelope) {
    let Some(room) = hub.room(&envelope.room_id) else {
        debug!(room = %envelope.room_id, "Dropping message for vanished room");
        return;
    };

    let line = chatter_proto::chat_line(&envelope.sender_name, &envelope.content);
    {
        let mut room = room.write().await;
        if room.defunct {
            return;
        }
        room.push_history(line.clone());
        room.broadcast(&hub.senders, &line, Some(envelope.sender));
    }

    if let Err(e) = hub
        .db
        .messages()
        .save(
            &envelope.room_id,
            &envelope.sender_name,
            &envelope.content,
            false,
            None,
        )
        .await
    {
        warn!(room = %envelope.room_id, error = %e, "Failed to persist message");
    }
}

/// Route a private message to one member of the sender's room.
async fn deliver_private(hub: &Hub, envelope: Envelope) {
    let Some(room) = hub.room(&envelope.room_id) else {
        hub.send_reply(
            envelope.sender,
            &Reply::Error("Your room no longer exists".into()),
        );
        return;
    };

    let members = room.read().await.members_by_tenure();
    let Some(target) = hub.resolve_member(&members, &envelope.recipient).await else {
        hub.send_reply(
            envelope.sender,
            &Reply::Error(format!("User {} is not in the room", envelope.recipient)),
        );
        return;
    };

    hub.send_reply(
        target,
        &Reply::PmFrom {
            sender: envelope.sender_name.clone(),
            content: envelope.content.clone(),
        },
    );
    hub.send_reply(
        envelope.sender,
        &Reply::PmSent {
            recipient: envelope.recipient.clone(),
            content: envelope.content.clone(),
        },
    );

    if let Err(e) = hub
        .db
        .messages()
        .save(
            &envelope.room_id,
            &envelope.sender_name,
            &envelope.content,
            true,
            Some(&envelope.recipient),
        )
        .await
    {
        warn!(room = %envelope.room_id, error = %e, "Failed to persist private message");
    }
}
