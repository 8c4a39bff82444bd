//! Chunk server client abstraction for MoreChunks.
//!
//! Provides the [`ChunkServer`] trait the connection controller drives, and
//! the [`ChunkServerEvent`]s a client reports back. Commands go out
//! fire-and-forget; their outcomes come back later as events, so nothing in
//! this crate ever blocks the caller's game loop.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`

mod error;
mod reason;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use reason::DisconnectReason;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketChunkServer;

use morechunks_protocol::Chunk;

/// Asynchronous notification from a chunk server client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkServerEvent {
    /// A connection attempt succeeded.
    Connected,
    /// The connection ended, or an attempt failed.
    ///
    /// When the controller asked for the disconnect, the reason it passed
    /// comes back unchanged.
    Disconnected(DisconnectReason),
    /// The server pushed an extra chunk.
    ExtraChunk(Chunk),
    /// The server sent an informational text message.
    Info(String),
}

/// Outbound side of a chunk server client.
///
/// Every method returns immediately. Outcomes of `connect` and
/// `disconnect` are delivered later as [`ChunkServerEvent`]s on whatever
/// channel the implementation was built with.
pub trait ChunkServer {
    /// Starts a connection attempt.
    fn connect(&mut self);

    /// Closes the connection. Safe to call in any state.
    fn disconnect(&mut self, reason: DisconnectReason);

    /// Sends a text message over the control channel.
    fn send_message(&mut self, text: &str);

    /// Whether a connection is currently established.
    fn is_connected(&self) -> bool;
}

impl<S: ChunkServer + ?Sized> ChunkServer for Box<S> {
    fn connect(&mut self) {
        (**self).connect();
    }

    fn disconnect(&mut self, reason: DisconnectReason) {
        (**self).disconnect(reason);
    }

    fn send_message(&mut self, text: &str) {
        (**self).send_message(text);
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
