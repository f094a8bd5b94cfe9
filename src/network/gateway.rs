//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds to a socket and spawns a Connection task for each
//! incoming client; it stops accepting when the shutdown signal fires.

use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::Hub;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, hub: Arc<Hub>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let registry = Arc::new(Registry::new());
        info!(%addr, "Gateway listening");
        Ok(Self {
            listener,
            hub,
            registry,
        })
    }

    /// The address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections until shutdown.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> std::io::Result<()> {
        let mut shutdown_rx = self.hub.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let hub = Arc::clone(&self.hub);
                            let registry = Arc::clone(&self.registry);
                            let conn_id = hub.next_conn_id();

                            tokio::spawn(async move {
                                let connection = Connection::new(conn_id, stream, addr, hub, registry);
                                if let Err(e) = connection.run().await {
                                    error!(%conn_id, %addr, error = %e, "Connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Gateway stopping");
                    break;
                }
            }
        }
        Ok(())
    }
}
