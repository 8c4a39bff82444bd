//! The connection controller: keeps the chunk server connected exactly
//! while a game session is running.
//!
//! # State
//!
//! The controller owns three things and nothing else:
//!
//! - **intent**: whether a game session is running and the chunk server
//!   should be connected. Changed only by [`on_game_connected`] and
//!   [`on_game_disconnected`]; never read back from the host, whose own
//!   "in game" flag is still set while the disconnect event is delivered.
//! - **backoff**: the reconnect interval and the deadline of a pending
//!   retry ([`BackoffState`]).
//! - **last config**: the snapshot the server was last told about.
//!
//! ```text
//!            on_game_connected
//!   Idle ───────────────────────→ Connecting ──(server connected)──→ Connected
//!    ↑                              │    ↑                              │
//!    │                  (failure)   ▼    │ (tick past deadline)         │
//!    │                          WaitingRetry ←────(server disconnected)─┘
//!    │                                │
//!    └──── on_game_disconnected ──────┘   (from any state; always disconnects)
//! ```
//!
//! # Threading
//!
//! All entry points take `&mut self` and none of them block. Events must be
//! delivered one at a time, in order, from a single task.
//!
//! [`on_game_connected`]: ConnectionController::on_game_connected
//! [`on_game_disconnected`]: ConnectionController::on_game_disconnected

use std::fmt;

use morechunks_clock::Clock;
use morechunks_protocol::{Chunk, ControlMessage, Dimension};
use morechunks_transport::{ChunkServer, DisconnectReason};
use tracing::{debug, info, trace, warn};

use crate::{BackoffState, ChunkHandler, Config, ReconnectConfig, diff};

/// Reason text sent when the game session ends.
pub const GAME_ENDING: &str = "Game ending";

/// Reason text sent when the server connects outside a game session.
pub const NO_GAME_RUNNING: &str = "No game running";

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// A read-only view of where the controller is in its lifecycle.
///
/// Derived on demand from intent, the client's connected flag and the
/// backoff; it is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No game session, no connection.
    Idle,
    /// Game session running, a connect was issued, no retry scheduled yet.
    Connecting,
    /// Game session running, waiting for the retry deadline.
    WaitingRetry,
    /// Game session running and the chunk server is connected.
    Connected,
    /// No game session but the server is still connected; a disconnect
    /// has been issued.
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::WaitingRetry => write!(f, "WaitingRetry"),
            Self::Connected => write!(f, "Connected"),
            Self::Closing => write!(f, "Closing"),
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionController
// ---------------------------------------------------------------------------

/// Supervises one logical connection to the chunk server.
///
/// Generic over the client it commands (`S`), the clock it reads retry
/// deadlines from (`K`) and the handler chunk traffic is forwarded to (`H`).
pub struct ConnectionController<S, K, H = ()> {
    chunk_server: S,
    clock: K,
    handler: H,
    intent: bool,
    backoff: BackoffState,
    last_config: Config,
}

impl<S: ChunkServer, K: Clock> ConnectionController<S, K, ()> {
    /// Creates an idle controller with default reconnect timing and no
    /// chunk handler.
    ///
    /// `config` is taken as already known to the server: only later
    /// changes relative to it are sent.
    pub fn new(chunk_server: S, clock: K, config: Config) -> Self {
        Self {
            chunk_server,
            clock,
            handler: (),
            intent: false,
            backoff: BackoffState::default(),
            last_config: config,
        }
    }
}

impl<S: ChunkServer, K: Clock, H: ChunkHandler> ConnectionController<S, K, H> {
    /// Replaces the reconnect timing. Meant for construction time.
    pub fn with_reconnect(mut self, config: ReconnectConfig) -> Self {
        self.backoff = BackoffState::new(config);
        self
    }

    /// Replaces the chunk handler.
    pub fn with_handler<H2: ChunkHandler>(
        self,
        handler: H2,
    ) -> ConnectionController<S, K, H2> {
        ConnectionController {
            chunk_server: self.chunk_server,
            clock: self.clock,
            handler,
            intent: self.intent,
            backoff: self.backoff,
            last_config: self.last_config,
        }
    }

    // -- Game session events ------------------------------------------------

    /// A playable game session started.
    ///
    /// Connects unless the session was already known or the server is
    /// already connected.
    pub fn on_game_connected(&mut self) {
        if self.intent {
            debug!("game connected while already in a session, ignoring");
            return;
        }
        self.intent = true;
        info!("game session started");

        if self.chunk_server.is_connected() {
            debug!("chunk server already connected");
            return;
        }
        self.chunk_server.connect();
    }

    /// The game session ended.
    ///
    /// Always sends a disconnect, whatever the current state, and drops any
    /// pending retry.
    pub fn on_game_disconnected(&mut self) {
        self.intent = false;
        self.backoff.cancel();
        info!("game session ended");
        self.chunk_server
            .disconnect(DisconnectReason::expected(GAME_ENDING));
    }

    // -- Chunk server events ------------------------------------------------

    /// A connection attempt succeeded.
    pub fn on_chunk_server_connected(&mut self) {
        if !self.intent {
            warn!("chunk server connected outside a game session, disconnecting");
            self.chunk_server
                .disconnect(DisconnectReason::expected(NO_GAME_RUNNING));
            return;
        }
        self.backoff.reset();
        info!("chunk server connection established");
    }

    /// The connection ended or an attempt failed.
    ///
    /// The first failure since the last success reconnects immediately and
    /// arms the retry timer. Further notifications while a retry is pending
    /// are absorbed; only [`on_tick`](Self::on_tick) issues the next attempt.
    pub fn on_chunk_server_disconnected(&mut self, reason: DisconnectReason) {
        if !self.intent {
            debug!(%reason, "chunk server disconnected, no game session");
            return;
        }
        if self.backoff.is_pending() {
            debug!(
                %reason,
                next_attempt_at_ms = ?self.backoff.next_attempt_at_ms(),
                "chunk server disconnected, retry already pending"
            );
            return;
        }

        let now = self.clock.now_ms();
        self.chunk_server.connect();
        self.backoff.arm(now);
        info!(
            %reason,
            retry_in_ms = self.backoff.wait_interval_ms(),
            "chunk server connection lost, reconnecting"
        );
    }

    /// Periodic check of the retry deadline against the clock.
    ///
    /// Issues a connect once the deadline has passed, then doubles the
    /// interval and schedules the next deadline from now.
    pub fn on_tick(&mut self) {
        if !self.intent || !self.backoff.is_pending() {
            return;
        }
        if self.chunk_server.is_connected() {
            return;
        }
        let now = self.clock.now_ms();
        if !self.backoff.is_due(now) {
            trace!(now, "retry not due yet");
            return;
        }

        self.chunk_server.connect();
        self.backoff.advance(now);
        info!(
            now,
            next_wait_ms = self.backoff.wait_interval_ms(),
            "retrying chunk server connection"
        );
    }

    // -- Configuration ------------------------------------------------------

    /// New settings are in effect. Tells the server only about fields it
    /// cares about that actually changed.
    pub fn on_config_changed(&mut self, config: Config) {
        let changes = diff(&self.last_config, &config);
        if changes.is_empty() {
            debug!("config unchanged");
            return;
        }

        if let Some(rate) = changes.chunk_loads_per_second() {
            let msg = ControlMessage::SetChunksPerSec(rate);
            info!(rate, "sending chunk rate to server");
            self.chunk_server.send_message(&msg.encode());
        }
        if changes.server_address_changed() {
            info!(
                url = %config.server_url(),
                "chunk server address changed, not applied to the running client"
            );
        }
        self.last_config = config;
    }

    // -- Forwarded chunk traffic --------------------------------------------

    /// The player moved to another dimension.
    pub fn on_player_changed_dimension(&mut self, dimension: Dimension) {
        debug!(%dimension, "player changed dimension");
        self.handler.on_player_changed_dimension(dimension);
    }

    /// The chunk server delivered a chunk.
    pub fn on_receive_extra_chunk(&mut self, chunk: Chunk) {
        trace!(bytes = chunk.len(), "extra chunk received");
        self.handler.on_extra_chunk(chunk);
    }

    /// The game connection delivered a chunk.
    pub fn on_receive_game_chunk(&mut self, chunk: Chunk) {
        trace!(bytes = chunk.len(), "game chunk received");
        self.handler.on_game_chunk(chunk);
    }

    // -- Accessors ----------------------------------------------------------

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        match (
            self.intent,
            self.chunk_server.is_connected(),
            self.backoff.is_pending(),
        ) {
            (false, false, _) => ConnectionState::Idle,
            (false, true, _) => ConnectionState::Closing,
            (true, true, _) => ConnectionState::Connected,
            (true, false, true) => ConnectionState::WaitingRetry,
            (true, false, false) => ConnectionState::Connecting,
        }
    }

    /// Whether a game session is believed to be running.
    pub fn intent(&self) -> bool {
        self.intent
    }

    /// Reconnect timing state.
    pub fn backoff(&self) -> &BackoffState {
        &self.backoff
    }

    /// The snapshot last sent to (or assumed by) the server.
    pub fn last_config(&self) -> &Config {
        &self.last_config
    }

    /// The chunk server client.
    pub fn chunk_server(&self) -> &S {
        &self.chunk_server
    }

    /// Mutable access to the chunk server client.
    pub fn chunk_server_mut(&mut self) -> &mut S {
        &mut self.chunk_server
    }

    /// The chunk handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The injected clock.
    pub fn clock(&self) -> &K {
        &self.clock
    }
}
