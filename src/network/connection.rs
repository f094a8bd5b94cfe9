//! Connection - Handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task. The socket is framed with a
//! newline codec (4 KiB line cap) and the task `select!`s over three
//! sources: inbound lines (dispatched inline), the connection's outbound
//! queue (filled by handlers and by the broadcaster on behalf of other
//! clients), and the server-wide shutdown signal.
//!
//! Any exit path runs the disconnect routine: room teardown first, then
//! session and sender removal.

use crate::handlers::{Context, Registry};
use crate::state::{ConnId, Hub};
use chatter_proto::Reply;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, instrument, warn};

/// A client connection handler.
pub struct Connection {
    conn_id: ConnId,
    addr: SocketAddr,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
    stream: TcpStream,
}

impl Connection {
    /// Create a new connection handler.
    pub fn new(
        conn_id: ConnId,
        stream: TcpStream,
        addr: SocketAddr,
        hub: Arc<Hub>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            conn_id,
            addr,
            hub,
            registry,
            stream,
        }
    }

    /// Run the connection event loop until disconnect or shutdown.
    #[instrument(skip(self), fields(conn = %self.conn_id, addr = %self.addr), name = "connection")]
    pub async fn run(self) -> anyhow::Result<()> {
        let framed = Framed::new(
            self.stream,
            LinesCodec::new_with_max_length(chatter_proto::MAX_LINE_LEN),
        );
        let (mut writer, mut reader) = framed.split::<String>();

        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<String>();
        self.hub.attach(self.conn_id, outgoing_tx.clone());
        let mut shutdown_rx = self.hub.shutdown_tx.subscribe();

        info!("Client connected");

        if let Err(e) = writer
            .send(Reply::Welcome("Chat Server".into()).to_string())
            .await
        {
            warn!(error = %e, "Failed to send welcome banner");
            self.hub.disconnect(self.conn_id).await;
            return Ok(());
        }

        loop {
            tokio::select! {
                // Inbound lines; dispatcher work runs inline on this task.
                result = reader.next() => {
                    match result {
                        Some(Ok(line)) => {
                            let mut ctx = Context {
                                conn_id: self.conn_id,
                                hub: &self.hub,
                                sender: &outgoing_tx,
                            };
                            if let Err(e) = self.registry.dispatch(&mut ctx, &line).await {
                                match e.to_reply() {
                                    Some(reply) => {
                                        // Outbound queue gone means we are
                                        // mid-teardown; just stop.
                                        if outgoing_tx.send(reply.to_string()).is_err() {
                                            break;
                                        }
                                    }
                                    None => debug!(error = %e, "Handler error"),
                                }
                            }
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "Read error");
                            break;
                        }
                        None => break,
                    }
                }

                // Outbound lines: handler replies and routed traffic.
                maybe = outgoing_rx.recv() => {
                    match maybe {
                        Some(line) => {
                            if let Err(e) = writer.send(line).await {
                                warn!(error = %e, "Write error");
                                break;
                            }
                        }
                        None => break,
                    }
                }

                _ = shutdown_rx.recv() => {
                    debug!("Connection closing on shutdown");
                    break;
                }
            }
        }

        self.hub.disconnect(self.conn_id).await;
        Ok(())
    }
}
