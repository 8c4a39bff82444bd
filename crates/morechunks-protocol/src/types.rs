//! Value types that accompany the control channel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A world dimension, as numbered by the host game (0 = overworld).
///
/// Newtype so a dimension can never be confused with a chunk rate or
/// a port number in a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimension(pub i32);

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dim:{}", self.0)
    }
}

/// A chunk payload, either received from the chunk server or observed on
/// the primary game connection.
///
/// The bytes are opaque at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    data: Vec<u8>,
}

impl Chunk {
    /// Wraps raw payload bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Returns the raw payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the chunk, returning its payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_display() {
        assert_eq!(Dimension(-1).to_string(), "dim:-1");
        assert_eq!(Dimension(0).to_string(), "dim:0");
    }

    #[test]
    fn test_chunk_accessors() {
        let chunk = Chunk::new(vec![1, 2, 3]);
        assert_eq!(chunk.len(), 3);
        assert!(!chunk.is_empty());
        assert_eq!(chunk.as_bytes(), &[1, 2, 3]);
        assert_eq!(chunk.into_bytes(), vec![1, 2, 3]);
    }

    #[test]
    fn test_chunk_default_is_empty() {
        assert!(Chunk::default().is_empty());
    }
}
