//! Test chat client.
//!
//! A line-oriented client for integration testing: send raw lines, await
//! lines by keyword prefix, or assert silence.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
/// Lines to scan past while waiting for a keyword before giving up.
const SCAN_LIMIT: usize = 200;

/// A test chat client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    /// Connect to a test server and consume the WELCOME banner.
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        };

        let banner = client.recv().await?;
        anyhow::ensure!(
            banner.starts_with("WELCOME:"),
            "expected WELCOME banner, got {banner:?}"
        );
        Ok(client)
    }

    /// Connect and take a username in one step.
    pub async fn connect_named(addr: SocketAddr, name: &str) -> anyhow::Result<Self> {
        let mut client = Self::connect(addr).await?;
        client.send(&format!("/SETNAME {name}")).await?;
        client.expect("NAME_SET").await?;
        Ok(client)
    }

    /// Send one raw line.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive a single line from the server.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(RECV_TIMEOUT).await
    }

    /// Receive a line with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        anyhow::ensure!(n > 0, "connection closed");
        Ok(line.trim_end().to_string())
    }

    /// Receive lines until one starts with `prefix`, returning it. Other
    /// traffic (system notices, chatter) is skipped.
    pub async fn expect(&mut self, prefix: &str) -> anyhow::Result<String> {
        for _ in 0..SCAN_LIMIT {
            let line = self.recv().await?;
            if line.starts_with(prefix) {
                return Ok(line);
            }
        }
        anyhow::bail!("no line starting with {prefix:?} within {SCAN_LIMIT} lines")
    }

    /// Receive lines until one contains `needle`, returning it.
    pub async fn expect_containing(&mut self, needle: &str) -> anyhow::Result<String> {
        for _ in 0..SCAN_LIMIT {
            let line = self.recv().await?;
            if line.contains(needle) {
                return Ok(line);
            }
        }
        anyhow::bail!("no line containing {needle:?} within {SCAN_LIMIT} lines")
    }

    /// Collect everything between MESSAGE_HISTORY_START and _END.
    pub async fn expect_history_block(&mut self) -> anyhow::Result<Vec<String>> {
        self.expect("MESSAGE_HISTORY_START").await?;
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await?;
            if line == "MESSAGE_HISTORY_END" {
                return Ok(lines);
            }
            lines.push(line);
            anyhow::ensure!(lines.len() <= SCAN_LIMIT, "history block never ended");
        }
    }

    /// Consume whatever is pending until the connection goes quiet.
    pub async fn drain(&mut self) {
        while self.recv_timeout(Duration::from_millis(150)).await.is_ok() {}
    }

    /// Assert that nothing arrives within `dur`.
    pub async fn assert_silent(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_timeout(dur).await {
            Ok(line) => anyhow::bail!("expected silence, got {line:?}"),
            Err(_) => Ok(()),
        }
    }
}

/// Extract the room id from a `ROOM_CREATED:<id>:<TYPE>` line.
pub fn room_id_of(created_line: &str) -> anyhow::Result<String> {
    let mut parts = created_line.split(':');
    let keyword = parts.next().unwrap_or_default();
    anyhow::ensure!(keyword == "ROOM_CREATED", "not a ROOM_CREATED line");
    parts
        .next()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("ROOM_CREATED line without id"))
}
