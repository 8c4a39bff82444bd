//! Hook for whatever consumes chunks and dimension changes on the game side.
//!
//! The connection controller doesn't interpret chunks. It hands them to a
//! [`ChunkHandler`], the same way it hands connection commands to a
//! [`ChunkServer`](morechunks_transport::ChunkServer).

use morechunks_protocol::{Chunk, Dimension};

/// Receives chunk traffic forwarded by the controller.
///
/// Every method defaults to a no-op, so implementors only override what
/// they care about. `()` is the handler that ignores everything.
///
/// ```rust
/// use morechunks_connection::ChunkHandler;
/// use morechunks_protocol::Chunk;
///
/// #[derive(Default)]
/// struct CountExtras(usize);
///
/// impl ChunkHandler for CountExtras {
///     fn on_extra_chunk(&mut self, _chunk: Chunk) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait ChunkHandler {
    /// The player moved to another dimension.
    fn on_player_changed_dimension(&mut self, _dimension: Dimension) {}

    /// The chunk server delivered a chunk.
    fn on_extra_chunk(&mut self, _chunk: Chunk) {}

    /// The primary game connection delivered a chunk.
    fn on_game_chunk(&mut self, _chunk: Chunk) {}
}

impl ChunkHandler for () {}
