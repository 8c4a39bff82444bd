//! Chunk server connection lifecycle for MoreChunks.
//!
//! This crate is the state machine at the center of the client:
//!
//! 1. **Intent**: knowing whether a game session is running
//!    ([`ConnectionController::on_game_connected`] /
//!    [`on_game_disconnected`](ConnectionController::on_game_disconnected))
//! 2. **Reconnection**: retrying failed connections with a doubling
//!    interval that resets on success ([`BackoffState`], [`ReconnectConfig`])
//! 3. **Configuration**: telling the server only about settings that
//!    actually changed ([`Config`], [`diff`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Runtime (above)      ← delivers game, server and tick events one by one
//!     ↕
//! Connection (this crate) ← decides when to connect, disconnect, send
//!     ↕
//! Transport (below)    ← ChunkServer commands and events
//! ```
//!
//! Nothing here is async and nothing can fail: failures arrive as
//! disconnect events and are handled as state.

mod backoff;
mod config;
mod controller;
mod handler;

pub use backoff::{BackoffState, ReconnectConfig};
pub use config::{Config, ConfigChange, ConfigDiff, diff};
pub use controller::{
    ConnectionController, ConnectionState, GAME_ENDING, NO_GAME_RUNNING,
};
pub use handler::ChunkHandler;
