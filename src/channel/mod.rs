//! Reliable, ordered point-to-point messaging between named parties.
//!
//! A [`Channel`] is a bidirectional pipe between exactly two parties over
//! TCP. Messages are length-prefixed frames (see [`wire`]) delivered in
//! send order, each exactly once; any I/O error or expired receive timeout
//! leaves the channel in the terminal `Failed` state, and recovery is a
//! fresh `connect` by the caller — the channel never reconnects on its own.
//!
//! Ordering holds per channel only. A party talking to two peers must not
//! assume anything about interleaving across its channels; rendezvous
//! protocols should block on the specific message they expect from each
//! peer in turn.

pub mod wire;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Error, Result};
pub use wire::WireMessage;

/// A stable logical name for a protocol participant, unique within a
/// session.
pub type PartyId = String;

/// Lifecycle of a channel: `Connected` until either a deliberate close
/// (`Closed`) or any I/O failure (`Failed`). Both end states are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    /// The pipe is usable.
    Connected,
    /// Deliberately closed by this side; no further traffic.
    Closed,
    /// An I/O error or timeout broke the pipe; the caller must re-connect.
    Failed,
}

/// An ordered, reliable, bidirectional message pipe to one peer.
pub struct Channel {
    local: PartyId,
    remote: PartyId,
    stream: TcpStream,
    send_seq: u64,
    recv_seq: u64,
    state: ChannelState,
}

impl Channel {
    /// Connects to a peer listening at `endpoint`.
    ///
    /// Party names are exchanged in a handshake before any payload
    /// traffic; the connection is rejected if the peer does not identify
    /// as `remote`.
    ///
    /// # Errors
    /// `Connection` on refusal or a failed handshake.
    pub async fn connect(
        local: impl Into<PartyId>,
        remote: impl Into<PartyId>,
        endpoint: SocketAddr,
    ) -> Result<Self> {
        let local = local.into();
        let remote = remote.into();

        let mut stream = TcpStream::connect(endpoint).await.map_err(|e| {
            Error::Connection(format!("failed to connect to {remote} at {endpoint}: {e}"))
        })?;
        send_name(&mut stream, &local).await?;
        let peer = recv_name(&mut stream).await?;
        if peer != remote {
            return Err(Error::Connection(format!(
                "handshake expected peer {remote:?}, got {peer:?}"
            )));
        }

        info!(local = %local, remote = %remote, %endpoint, "channel connected");
        Ok(Channel {
            local,
            remote,
            stream,
            send_seq: 0,
            recv_seq: 0,
            state: ChannelState::Connected,
        })
    }

    /// Accepts one inbound connection from `listener`, the listening
    /// complement of [`Channel::connect`]. The peer's identity is learned
    /// from its handshake.
    ///
    /// # Errors
    /// `Connection` if the accept or handshake fails.
    pub async fn accept(local: impl Into<PartyId>, listener: &TcpListener) -> Result<Self> {
        let local = local.into();

        let (mut stream, endpoint) = listener
            .accept()
            .await
            .map_err(|e| Error::Connection(format!("accept failed: {e}")))?;
        let remote = recv_name(&mut stream).await?;
        send_name(&mut stream, &local).await?;

        info!(local = %local, remote = %remote, %endpoint, "channel accepted");
        Ok(Channel {
            local,
            remote,
            stream,
            send_seq: 0,
            recv_seq: 0,
            state: ChannelState::Connected,
        })
    }

    /// This side's party name.
    pub fn local(&self) -> &str {
        &self.local
    }

    /// The peer's party name.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Number of messages sent so far.
    pub fn sent(&self) -> u64 {
        self.send_seq
    }

    /// Number of messages received so far.
    pub fn received(&self) -> u64 {
        self.recv_seq
    }

    /// Sends one message as an atomic frame, blocking until the transport
    /// accepts the bytes (not until the peer processes them).
    ///
    /// # Errors
    /// `ChannelClosed` if the channel is not connected; transport errors
    /// leave the channel `Failed`.
    pub async fn send(&mut self, message: &WireMessage) -> Result<()> {
        self.ensure_connected()?;
        match wire::write_frame(&mut self.stream, message).await {
            Ok(()) => {
                self.send_seq += 1;
                debug!(to = %self.remote, kind = message.kind(), seq = self.send_seq, "sent frame");
                Ok(())
            }
            Err(e) => {
                self.state = ChannelState::Failed;
                Err(e)
            }
        }
    }

    /// Blocks until the next message arrives, in send order.
    ///
    /// # Errors
    /// `ChannelClosed` if the peer disconnected (the channel becomes
    /// `Failed`); `Deserialization` if the frame does not decode — the
    /// frame is consumed whole, so the channel itself stays usable.
    pub async fn recv(&mut self) -> Result<WireMessage> {
        self.ensure_connected()?;
        let result = wire::read_frame(&mut self.stream).await;
        self.finish_recv(result)
    }

    /// Like [`Channel::recv`] but bounded by `limit`.
    ///
    /// # Errors
    /// `ChannelTimeout` on expiry. A partial frame may then be in flight,
    /// so the channel is left `Failed` and no message is considered
    /// consumed.
    pub async fn recv_timeout(&mut self, limit: Duration) -> Result<WireMessage> {
        self.ensure_connected()?;
        match timeout(limit, wire::read_frame(&mut self.stream)).await {
            Ok(result) => self.finish_recv(result),
            Err(_elapsed) => {
                self.state = ChannelState::Failed;
                Err(Error::ChannelTimeout)
            }
        }
    }

    /// Releases the transport. Idempotent; a failed channel stays failed.
    pub async fn close(&mut self) {
        if self.state == ChannelState::Connected {
            // Best effort: the peer may already be gone.
            let _ = self.stream.shutdown().await;
            self.state = ChannelState::Closed;
            info!(local = %self.local, remote = %self.remote, "channel closed");
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        match self.state {
            ChannelState::Connected => Ok(()),
            ChannelState::Closed | ChannelState::Failed => Err(Error::ChannelClosed),
        }
    }

    fn finish_recv(&mut self, result: Result<WireMessage>) -> Result<WireMessage> {
        match result {
            Ok(message) => {
                self.recv_seq += 1;
                debug!(from = %self.remote, kind = message.kind(), seq = self.recv_seq, "received frame");
                Ok(message)
            }
            Err(e) => {
                // A decode failure consumed its whole frame; everything
                // else breaks the stream.
                if !matches!(e, Error::Deserialization(_)) {
                    self.state = ChannelState::Failed;
                }
                Err(e)
            }
        }
    }
}

async fn send_name(stream: &mut TcpStream, name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > 255 {
        return Err(Error::Connection(format!(
            "party name must be 1..=255 bytes, got {}",
            bytes.len()
        )));
    }
    let mut frame = Vec::with_capacity(1 + bytes.len());
    frame.push(bytes.len() as u8);
    frame.extend_from_slice(bytes);
    stream
        .write_all(&frame)
        .await
        .map_err(|e| Error::Connection(format!("handshake send failed: {e}")))
}

async fn recv_name(stream: &mut TcpStream) -> Result<PartyId> {
    let mut len = [0u8; 1];
    stream
        .read_exact(&mut len)
        .await
        .map_err(|e| Error::Connection(format!("handshake receive failed: {e}")))?;
    let mut name = vec![0u8; len[0] as usize];
    stream
        .read_exact(&mut name)
        .await
        .map_err(|e| Error::Connection(format!("handshake receive failed: {e}")))?;
    String::from_utf8(name)
        .map_err(|_| Error::Connection("party name is not valid UTF-8".into()))
}
