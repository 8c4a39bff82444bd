//! Wire vocabulary for MoreChunks.
//!
//! This crate defines what the client and the chunk server say to each
//! other, without knowing anything about sockets or connection state:
//!
//! - **Control messages** ([`ControlMessage`]): the text commands the
//!   client sends to tune the server (e.g. `SET_CHUNKS_PER_SEC:80`).
//! - **Types** ([`Chunk`], [`Dimension`]): the values that travel
//!   alongside the control channel.
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (ControlMessage, Chunk) → Connection (lifecycle)
//! ```
//!
//! Chunk payloads are deliberately opaque here. Decoding them is the job of
//! whatever consumes extra chunks on the game side.

mod message;
mod types;

pub use message::{ControlMessage, INFO_SET_CHUNKS_PER_SEC};
pub use types::{Chunk, Dimension};
