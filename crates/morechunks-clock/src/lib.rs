//! Time sources for MoreChunks.
//!
//! Two things live here:
//!
//! - [`Clock`]: the injected millisecond clock the connection controller
//!   reads its retry deadlines from. [`TokioClock`] inside a Tokio runtime,
//!   [`MonotonicClock`] anywhere else, [`ManualClock`] for tests that step
//!   time by hand.
//! - [`Ticker`]: a fixed-rate tick source that tells the controller when
//!   to re-evaluate those deadlines.
//!
//! # Integration
//!
//! The ticker sits inside the runtime's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = events.recv() => { /* deliver to controller */ }
//!         _ = ticker.wait_for_tick() => controller.on_tick(),
//!     }
//! }
//! ```

mod clock;
mod ticker;

pub use clock::{Clock, ManualClock, MonotonicClock, TokioClock};
pub use ticker::{TickConfig, TickInfo, Ticker};
