//! Text control messages sent from the client to the chunk server.
//!
//! The chunk server speaks a tiny line-oriented protocol on its text
//! channel: a prefix naming the setting, immediately followed by its value.
//! Chunk data itself travels on the binary channel and is not modelled here.

use std::fmt;

/// Prefix of the message that tells the server how many extra chunks per
/// second it may push to this client.
pub const INFO_SET_CHUNKS_PER_SEC: &str = "SET_CHUNKS_PER_SEC:";

/// A control message understood by the chunk server.
///
/// Encoded with [`encode`](Self::encode) and sent verbatim as a text frame.
///
/// ```rust
/// use morechunks_protocol::ControlMessage;
///
/// let msg = ControlMessage::SetChunksPerSec(42);
/// assert_eq!(msg.encode(), "SET_CHUNKS_PER_SEC:42");
/// assert_eq!(msg.to_string(), "SET_CHUNKS_PER_SEC:42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Limit the rate at which the server sends extra chunks.
    SetChunksPerSec(u32),
}

impl ControlMessage {
    /// Returns the exact text sent on the wire.
    pub fn encode(&self) -> String {
        match self {
            Self::SetChunksPerSec(rate) => {
                format!("{INFO_SET_CHUNKS_PER_SEC}{rate}")
            }
        }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
