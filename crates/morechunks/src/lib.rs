//! # MoreChunks
//!
//! Keeps a game client connected to a MoreChunks chunk server for exactly
//! as long as a game session is running.
//!
//! The host game reports its lifecycle through a [`MoreChunksHandle`]; the
//! runtime task reconnects with exponential backoff when the chunk server
//! drops, and forwards setting changes only when they matter to the server.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use morechunks::prelude::*;
//!
//! # async fn start() -> Result<(), MoreChunksError> {
//! let (runtime, handle) = MoreChunksBuilder::new()
//!     .config(Config::default())
//!     .build(())?;
//! tokio::spawn(runtime.run());
//!
//! handle.game_connected().await?;
//! // ... later
//! handle.game_disconnected().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod logging;
mod runtime;

pub use error::MoreChunksError;
pub use logging::init_logging;
pub use runtime::{
    ConnectionStatus, MoreChunks, MoreChunksBuilder, MoreChunksHandle, WebSocketMoreChunks,
};

/// Everything a host integration usually needs.
pub mod prelude {
    pub use crate::{
        ConnectionStatus, MoreChunks, MoreChunksBuilder, MoreChunksError,
        MoreChunksHandle, init_logging,
    };
    pub use morechunks_clock::{Clock, TickConfig};
    pub use morechunks_connection::{
        ChunkHandler, Config, ConnectionState, ReconnectConfig,
    };
    pub use morechunks_protocol::{Chunk, Dimension};
    pub use morechunks_transport::DisconnectReason;
}
