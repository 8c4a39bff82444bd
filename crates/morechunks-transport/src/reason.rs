//! Why a chunk server connection ended.

use std::fmt;

/// The cause of a chunk server disconnect.
///
/// Travels in both directions: the controller hands one to
/// [`ChunkServer::disconnect`](crate::ChunkServer::disconnect), and the
/// client hands it back in
/// [`ChunkServerEvent::Disconnected`](crate::ChunkServerEvent::Disconnected).
/// Reasons compare by value, so callers can tell "we asked for this"
/// apart from "the network did this".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisconnectReason {
    expected: bool,
    message: String,
}

impl DisconnectReason {
    /// A disconnect the client itself requested.
    pub fn expected(message: impl Into<String>) -> Self {
        Self {
            expected: true,
            message: message.into(),
        }
    }

    /// A disconnect caused by a failure or by the remote side.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            expected: false,
            message: message.into(),
        }
    }

    /// Whether the client requested this disconnect.
    pub fn is_expected(&self) -> bool {
        self.expected
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MoreChunks: {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes_message() {
        let reason = DisconnectReason::expected("Game ending");
        assert_eq!(reason.to_string(), "MoreChunks: Game ending");
    }

    #[test]
    fn test_expected_and_unexpected_with_same_text_differ() {
        let a = DisconnectReason::expected("Test");
        let b = DisconnectReason::unexpected("Test");
        assert_ne!(a, b);
        assert!(a.is_expected());
        assert!(!b.is_expected());
        assert_eq!(a.message(), b.message());
    }
}
