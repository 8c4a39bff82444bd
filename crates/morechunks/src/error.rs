//! Unified error type for the MoreChunks facade.

use morechunks_transport::TransportError;

/// Top-level error returned by the builder and the runtime handle.
///
/// Connection failures are not errors here: the runtime retries them.
/// What remains is misconfiguration and talking to a runtime that is gone.
#[derive(Debug, thiserror::Error)]
pub enum MoreChunksError {
    /// A transport-level error (bad chunk server URL).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The runtime task has stopped; the handle can no longer reach it.
    #[error("morechunks runtime is not running")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::InvalidUrl("http://nope".into());
        let err: MoreChunksError = err.into();
        assert!(matches!(err, MoreChunksError::Transport(_)));
        assert!(err.to_string().contains("http://nope"));
    }

    #[test]
    fn test_unavailable_display() {
        assert_eq!(
            MoreChunksError::Unavailable.to_string(),
            "morechunks runtime is not running"
        );
    }
}
