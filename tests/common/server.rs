//! Test server management.
//!
//! Spawns an in-process server (in-memory store, ephemeral port) wired the
//! same way `main.rs` wires the real one.

#![allow(dead_code)]

use chatterd::broadcast::run_broadcaster;
use chatterd::db::Database;
use chatterd::network::Gateway;
use chatterd::state::{Hub, run_cleanup_sweeper};
use std::net::SocketAddr;
use std::sync::Arc;

/// A test server instance.
pub struct TestServer {
    addr: SocketAddr,
    hub: Arc<Hub>,
}

impl TestServer {
    /// Spawn a new test server on an ephemeral port.
    pub async fn spawn() -> anyhow::Result<Self> {
        let db = Database::new(":memory:").await?;
        let (hub, queue_rx, cleanup_rx) = Hub::new(db, 100);

        tokio::spawn(run_broadcaster(Arc::clone(&hub), queue_rx));
        tokio::spawn(run_cleanup_sweeper(Arc::clone(&hub), cleanup_rx));

        let gateway = Gateway::bind("127.0.0.1:0".parse()?, Arc::clone(&hub)).await?;
        let addr = gateway.local_addr()?;
        tokio::spawn(async move {
            let _ = gateway.run().await;
        });

        Ok(Self { addr, hub })
    }

    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared state, for asserting invariants the wire cannot show.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Fire the shutdown signal.
    pub fn shutdown(&self) {
        let _ = self.hub.shutdown_tx.send(());
    }
}
