//! The Hub - central shared state for the chat server.
//!
//! Bundles everything the original design kept in process-wide globals:
//! the session registry, the room registry, per-connection outbound
//! channels, the broadcast queue, the cleanup sweeper feed, the shutdown
//! signal, and the database handle. One `Arc<Hub>` is created in `main`
//! and passed to every component.
//!
//! # Lock Order (Deadlock Prevention)
//!
//! When acquiring multiple locks, always follow this order:
//!
//! 1. DashMap shard lock (acquired during `.get()` / `.iter()`)
//! 2. Room `RwLock` (read or write)
//! 3. Session `RwLock` (read or write)
//! 4. Store (pool acquire)
//!
//! **Never acquire locks in reverse order.** Safe patterns used throughout:
//! collect-then-inspect for map iteration, lock-copy-release before store
//! calls, and channel sends (always lock-free) for cross-task signalling.

use crate::broadcast::Envelope;
use crate::db::Database;
use crate::state::{ConnId, Room, Session};
use chatter_proto::Reply;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{debug, info, warn};

/// How long an empty room lingers before the sweeper reaps it.
pub const CLEANUP_GRACE: Duration = Duration::from_millis(100);

/// Depth of the broadcast FIFO.
const QUEUE_DEPTH: usize = 1024;

/// Central shared state container.
pub struct Hub {
    /// Live sessions keyed by connection id.
    pub sessions: DashMap<ConnId, Arc<RwLock<Session>>>,
    /// Outbound line channel per connection. Unbounded: handlers push
    /// replies from inside the connection's own event loop, which must
    /// never block on its own undrained queue.
    pub senders: DashMap<ConnId, mpsc::UnboundedSender<String>>,
    /// Live rooms keyed by room id.
    pub rooms: DashMap<String, Arc<RwLock<Room>>>,
    /// Producer side of the broadcast FIFO.
    pub queue_tx: mpsc::Sender<Envelope>,
    /// Feed for the empty-room cleanup sweeper.
    cleanup_tx: mpsc::UnboundedSender<String>,
    /// Fired once on SIGINT/SIGTERM; every long-lived task subscribes.
    pub shutdown_tx: broadcast::Sender<()>,
    /// Database handle for server-wide persistence.
    pub db: Database,
    /// In-memory history ring capacity and replay limit.
    pub history_limit: usize,
    next_conn_id: AtomicU64,
}

impl Hub {
    /// Create the hub plus the receiver ends of its two internal queues
    /// (the broadcast FIFO and the cleanup feed).
    pub fn new(
        db: Database,
        history_limit: usize,
    ) -> (
        Arc<Self>,
        mpsc::Receiver<Envelope>,
        mpsc::UnboundedReceiver<String>,
    ) {
        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_DEPTH);
        let (cleanup_tx, cleanup_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = broadcast::channel(4);

        let hub = Arc::new(Self {
            sessions: DashMap::new(),
            senders: DashMap::new(),
            rooms: DashMap::new(),
            queue_tx,
            cleanup_tx,
            shutdown_tx,
            db,
            history_limit,
            next_conn_id: AtomicU64::new(1),
        });

        (hub, queue_rx, cleanup_rx)
    }

    /// Issue a fresh connection id.
    pub fn next_conn_id(&self) -> ConnId {
        ConnId(self.next_conn_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a newly accepted connection: its session record and its
    /// outbound channel.
    pub fn attach(
        &self,
        conn_id: ConnId,
        sender: mpsc::UnboundedSender<String>,
    ) -> Arc<RwLock<Session>> {
        let session = Arc::new(RwLock::new(Session::new(conn_id)));
        self.sessions.insert(conn_id, session.clone());
        self.senders.insert(conn_id, sender);
        session
    }

    /// Drop a connection's session record and outbound channel.
    pub fn detach(&self, conn_id: ConnId) {
        self.sessions.remove(&conn_id);
        self.senders.remove(&conn_id);
    }

    /// Look up a session by connection id.
    pub fn session(&self, conn_id: ConnId) -> Option<Arc<RwLock<Session>>> {
        self.sessions.get(&conn_id).map(|s| s.value().clone())
    }

    /// Look up a room by id.
    pub fn room(&self, room_id: &str) -> Option<Arc<RwLock<Room>>> {
        self.rooms.get(room_id).map(|r| r.value().clone())
    }

    /// Queue a raw line for one connection. Lines for connections that
    /// disappeared between resolve and send are silently dropped.
    pub fn send_line(&self, conn_id: ConnId, line: String) {
        if let Some(sender) = self.senders.get(&conn_id)
            && sender.send(line).is_err()
        {
            debug!(conn = %conn_id, "Dropping line for closed connection");
        }
    }

    /// Queue a typed reply for one connection.
    pub fn send_reply(&self, conn_id: ConnId, reply: &Reply) {
        self.send_line(conn_id, reply.to_string());
    }

    /// Whether a username is already held by another live session.
    pub async fn username_taken(&self, name: &str, except: ConnId) -> bool {
        // Collect-then-inspect: never hold a shard lock across an await.
        let sessions: Vec<Arc<RwLock<Session>>> = self
            .sessions
            .iter()
            .filter(|entry| *entry.key() != except)
            .map(|entry| entry.value().clone())
            .collect();

        for session in sessions {
            if session.read().await.username == name {
                return true;
            }
        }
        false
    }

    /// Find the member of `members` whose username is `name`.
    pub async fn resolve_member(&self, members: &[ConnId], name: &str) -> Option<ConnId> {
        for conn_id in members {
            if let Some(session) = self.session(*conn_id)
                && session.read().await.username == name
            {
                return Some(*conn_id);
            }
        }
        None
    }

    /// Create a fresh room with `owner` as its sole member and register it
    /// under a newly generated id. The entry API makes generation-and-insert
    /// atomic against concurrent creators.
    pub fn create_room(
        &self,
        is_private: bool,
        password: String,
        owner: ConnId,
    ) -> (String, Arc<RwLock<Room>>) {
        loop {
            let id = rand::thread_rng().gen_range(100_000..=999_999).to_string();
            match self.rooms.entry(id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    let room = Arc::new(RwLock::new(Room::new(
                        id.clone(),
                        is_private,
                        password,
                        owner,
                        self.history_limit,
                    )));
                    vacant.insert(room.clone());
                    return (id, room);
                }
            }
        }
    }

    /// Hand a (possibly) empty room to the cleanup sweeper.
    pub fn schedule_cleanup(&self, room_id: &str) {
        if self.cleanup_tx.send(room_id.to_string()).is_err() {
            debug!(room = %room_id, "Cleanup sweeper gone (shutting down)");
        }
    }

    /// Remove a session from its current room, if any.
    ///
    /// Runs the full leave protocol: notice to the remaining members,
    /// removal, ownership transfer to the longest-tenured member when the
    /// owner departs, and cleanup scheduling when the room empties. Returns
    /// the id of the room that was left.
    pub async fn leave_current_room(&self, conn_id: ConnId) -> Option<String> {
        let session = self.session(conn_id)?;
        let (username, room_id) = {
            let s = session.read().await;
            if !s.in_room() {
                return None;
            }
            (s.username.clone(), s.room_id.clone())
        };

        let mut new_owner_name: Option<String> = None;
        let mut emptied = false;

        if let Some(room) = self.room(&room_id) {
            let mut room = room.write().await;

            room.broadcast(
                &self.senders,
                &chatter_proto::system_line(&format!("{username} has left the room")),
                Some(conn_id),
            );

            let was_owner = room.owner == conn_id;
            room.remove_member(conn_id);

            if room.is_empty() {
                emptied = true;
            } else if was_owner
                && let Some(new_owner) = room.longest_member(None)
            {
                room.owner = new_owner;

                // Room -> Session order; see the module doc comment.
                let name = match self.session(new_owner) {
                    Some(s) => {
                        let mut s = s.write().await;
                        s.is_owner = true;
                        s.username.clone()
                    }
                    None => String::new(),
                };

                self.send_reply(new_owner, &Reply::OwnershipReceived);
                room.broadcast_to_all(
                    &self.senders,
                    &chatter_proto::system_line(&format!("{name} is now the room owner")),
                );

                new_owner_name = Some(name);
            }
        } else {
            // Session pointed at a room that no longer exists; just clear it.
            debug!(conn = %conn_id, room = %room_id, "Left a room that was already gone");
        }

        // Store writes happen with every lock released.
        if let Some(ref name) = new_owner_name {
            if let Err(e) = self.db.rooms().update_owner(&room_id, name).await {
                warn!(room = %room_id, error = %e, "Failed to persist ownership transfer");
            }
            info!(room = %room_id, new_owner = %name, "Ownership transferred");
        }
        if emptied {
            self.schedule_cleanup(&room_id);
        }

        session.write().await.clear_room();
        Some(room_id)
    }

    /// Terminal teardown for one connection: room membership first, then
    /// the session and its outbound channel.
    pub async fn disconnect(&self, conn_id: ConnId) {
        let username = match self.session(conn_id) {
            Some(session) => session.read().await.username.clone(),
            None => {
                self.detach(conn_id);
                return;
            }
        };

        self.leave_current_room(conn_id).await;

        if !username.is_empty()
            && let Err(e) = self.db.users().update_last_seen(&username).await
        {
            warn!(user = %username, error = %e, "Failed to update last_seen");
        }

        self.detach(conn_id);
        info!(conn = %conn_id, user = %username, "Client disconnected");
    }

    /// Reap a room if it is still empty after the grace delay.
    pub(crate) async fn reap_if_empty(&self, room_id: &str) {
        let Some(room) = self.room(room_id) else {
            return;
        };

        {
            let mut room = room.write().await;
            if !room.is_empty() {
                return;
            }
            // Mark defunct under the lock so a joiner holding a stale Arc
            // sees the tombstone instead of resurrecting the room.
            room.defunct = true;
        }

        self.rooms.remove(room_id);
        if let Err(e) = self.db.rooms().delete(room_id).await {
            warn!(room = %room_id, error = %e, "Failed to delete room from store");
        }
        info!(room = %room_id, "Empty room destroyed");
    }
}

/// Long-lived sweeper task: waits out the grace delay for each scheduled
/// room, then reaps it if it is still empty. Coalesces naturally through
/// its queue; exits on shutdown.
pub async fn run_cleanup_sweeper(hub: Arc<Hub>, mut cleanup_rx: mpsc::UnboundedReceiver<String>) {
    let mut shutdown_rx = hub.shutdown_tx.subscribe();
    loop {
        tokio::select! {
            maybe_room = cleanup_rx.recv() => {
                let Some(room_id) = maybe_room else { break };
                tokio::time::sleep(CLEANUP_GRACE).await;
                hub.reap_if_empty(&room_id).await;
            }
            _ = shutdown_rx.recv() => break,
        }
    }
    debug!("Cleanup sweeper stopped");
}
