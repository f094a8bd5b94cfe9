//! LIST and USERS query handlers.

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::Room;
use async_trait::async_trait;
use chatter_proto::{Reply, RoomSummary};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handler for `LIST`: every live room with member count and privacy tag.
pub struct ListHandler;

#[async_trait]
impl Handler for ListHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        // Collect-then-inspect: no shard lock across an await.
        let rooms: Vec<Arc<RwLock<Room>>> = ctx
            .hub
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            let r = room.read().await;
            // Empty rooms are sweeper fodder, not listings.
            if r.defunct || r.is_empty() {
                continue;
            }
            summaries.push(RoomSummary {
                id: r.id.clone(),
                member_count: r.member_count(),
                is_private: r.is_private,
            });
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));

        ctx.reply(Reply::RoomsList(summaries))
    }
}

/// Handler for `USERS`: members of the current room, longest-tenured first.
pub struct UsersHandler;

#[async_trait]
impl Handler for UsersHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        let snap = ctx.require_room().await?;

        let room = ctx.hub.room(&snap.room_id).ok_or(HandlerError::NotInRoom)?;
        let members = room.read().await.members_by_tenure();

        let mut names = Vec::with_capacity(members.len());
        for conn_id in members {
            if let Some(session) = ctx.hub.session(conn_id) {
                let name = session.read().await.username.clone();
                if !name.is_empty() {
                    names.push(name);
                }
            }
        }

        ctx.reply(Reply::UsersList(names))
    }
}
