//! The MoreChunks runtime: one Tokio task owning the connection controller.
//!
//! The host talks to it through a cloneable [`MoreChunksHandle`]; the chunk
//! server client reports back on an event channel; a [`Ticker`] re-checks
//! retry deadlines. All three feed one `select!` loop, so the controller
//! sees every event one at a time and needs no locking.

use std::time::Duration;

use morechunks_clock::{Clock, TickConfig, Ticker, TokioClock};
use morechunks_connection::{
    ChunkHandler, Config, ConnectionController, ConnectionState, ReconnectConfig,
};
use morechunks_protocol::{Chunk, Dimension};
use morechunks_transport::{ChunkServer, ChunkServerEvent, WebSocketChunkServer};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::MoreChunksError;

/// Default capacity of the host command channel.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// How long [`MoreChunks::run`] waits for the chunk server connection to
/// close after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The runtime [`MoreChunksBuilder::build`] produces.
pub type WebSocketMoreChunks<H> = MoreChunks<WebSocketChunkServer, TokioClock, H>;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands sent from a [`MoreChunksHandle`] to the runtime task.
enum Command {
    GameConnected,
    GameDisconnected,
    PlayerChangedDimension(Dimension),
    GameChunk(Chunk),
    ConfigChanged(Config),
    Tick,
    Status {
        reply: oneshot::Sender<ConnectionStatus>,
    },
    Shutdown,
}

/// Snapshot of the controller, returned by [`MoreChunksHandle::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Lifecycle state.
    pub state: ConnectionState,
    /// Whether a game session is running.
    pub in_game: bool,
    /// Current reconnect interval.
    pub wait_interval_ms: u64,
    /// Deadline of the pending retry, if any.
    pub next_attempt_at_ms: Option<u64>,
    /// Settings last sent to the server.
    pub config: Config,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running [`MoreChunks`] runtime.
///
/// Cheap to clone. Every method fails with
/// [`MoreChunksError::Unavailable`] once the runtime has stopped.
#[derive(Clone)]
pub struct MoreChunksHandle {
    sender: mpsc::Sender<Command>,
}

impl MoreChunksHandle {
    async fn send(&self, cmd: Command) -> Result<(), MoreChunksError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| MoreChunksError::Unavailable)
    }

    /// A playable game session started.
    pub async fn game_connected(&self) -> Result<(), MoreChunksError> {
        self.send(Command::GameConnected).await
    }

    /// The game session ended.
    pub async fn game_disconnected(&self) -> Result<(), MoreChunksError> {
        self.send(Command::GameDisconnected).await
    }

    /// The player moved to another dimension.
    pub async fn player_changed_dimension(
        &self,
        dimension: Dimension,
    ) -> Result<(), MoreChunksError> {
        self.send(Command::PlayerChangedDimension(dimension)).await
    }

    /// The game connection delivered a chunk.
    pub async fn game_chunk(&self, chunk: Chunk) -> Result<(), MoreChunksError> {
        self.send(Command::GameChunk(chunk)).await
    }

    /// New settings are in effect.
    pub async fn config_changed(&self, config: Config) -> Result<(), MoreChunksError> {
        self.send(Command::ConfigChanged(config)).await
    }

    /// Re-checks the retry deadline now.
    ///
    /// Hosts that run the ticker at rate 0 call this once per frame.
    pub async fn tick(&self) -> Result<(), MoreChunksError> {
        self.send(Command::Tick).await
    }

    /// Requests a snapshot of the controller.
    pub async fn status(&self) -> Result<ConnectionStatus, MoreChunksError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Status { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| MoreChunksError::Unavailable)
    }

    /// Stops the runtime. A running game session is ended first.
    pub async fn shutdown(&self) -> Result<(), MoreChunksError> {
        self.send(Command::Shutdown).await
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a [`MoreChunks`] runtime talking WebSocket.
///
/// ```rust,no_run
/// use morechunks::prelude::*;
///
/// # fn build() -> Result<(), MoreChunksError> {
/// let (runtime, handle) = MoreChunksBuilder::new()
///     .config(Config { port: 25566, ..Config::default() })
///     .reconnect(ReconnectConfig { max_interval_ms: Some(60_000), ..Default::default() })
///     .build(())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MoreChunksBuilder {
    config: Config,
    reconnect: ReconnectConfig,
    tick: TickConfig,
    channel_size: usize,
}

impl Default for MoreChunksBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            reconnect: ReconnectConfig::default(),
            tick: TickConfig::default(),
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }
}

impl MoreChunksBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial settings; also the snapshot the server is assumed to know.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Reconnect timing.
    pub fn reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Tick rate for retry checks. Rate 0 leaves ticking to the host
    /// through [`MoreChunksHandle::tick`].
    pub fn tick(mut self, tick: TickConfig) -> Self {
        self.tick = tick;
        self
    }

    /// Capacity of the host command channel (minimum 1).
    pub fn channel_size(mut self, channel_size: usize) -> Self {
        self.channel_size = channel_size;
        self
    }

    /// Builds the runtime, forwarding chunk traffic to `handler`.
    ///
    /// Fails only when the configured host and port do not form a usable
    /// server URL. Nothing connects until the runtime is running and told
    /// that a game session started.
    pub fn build<H: ChunkHandler>(
        self,
        handler: H,
    ) -> Result<(WebSocketMoreChunks<H>, MoreChunksHandle), MoreChunksError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let chunk_server = WebSocketChunkServer::new(self.config.server_url(), events_tx)?;

        let controller = ConnectionController::new(chunk_server, TokioClock::new(), self.config)
            .with_reconnect(self.reconnect.validated())
            .with_handler(handler);

        Ok(MoreChunks::from_parts(
            controller,
            events_rx,
            Ticker::new(self.tick),
            self.channel_size,
        ))
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// The runtime task. Drive it with [`run`](Self::run).
pub struct MoreChunks<S, K, H> {
    controller: ConnectionController<S, K, H>,
    commands: mpsc::Receiver<Command>,
    server_events: mpsc::UnboundedReceiver<ChunkServerEvent>,
    ticker: Ticker,
}

impl<S: ChunkServer, K: Clock, H: ChunkHandler> MoreChunks<S, K, H> {
    /// Assembles a runtime from an existing controller.
    ///
    /// `server_events` must be the channel the controller's chunk server
    /// reports on.
    pub fn from_parts(
        controller: ConnectionController<S, K, H>,
        server_events: mpsc::UnboundedReceiver<ChunkServerEvent>,
        ticker: Ticker,
        channel_size: usize,
    ) -> (Self, MoreChunksHandle) {
        let (tx, rx) = mpsc::channel(channel_size.max(1));
        let runtime = Self {
            controller,
            commands: rx,
            server_events,
            ticker,
        };
        (runtime, MoreChunksHandle { sender: tx })
    }

    /// Processes commands, server events and ticks until shut down or
    /// until every handle is dropped.
    ///
    /// On the way out a running game session is ended, and the chunk server
    /// connection gets up to two seconds to close before this returns.
    pub async fn run(mut self) {
        info!("morechunks runtime started");

        loop {
            self.sync_ticker();
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(event) = self.server_events.recv() => self.handle_event(event),
                info = self.ticker.wait_for_tick() => {
                    trace!(tick = info.tick, skipped = info.ticks_skipped, "retry check");
                    self.controller.on_tick();
                }
            }
        }

        if self.controller.intent() {
            self.controller.on_game_disconnected();
        }
        self.drain_until_closed().await;
        info!("morechunks runtime stopped");
    }

    /// Ticks only matter while a retry is waiting for its deadline.
    fn sync_ticker(&mut self) {
        if self.controller.intent() && self.controller.backoff().is_pending() {
            self.ticker.resume();
        } else {
            self.ticker.pause();
        }
    }

    /// Delivers server events until the connection reports closed.
    async fn drain_until_closed(&mut self) {
        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
        while self.controller.chunk_server().is_connected() {
            match tokio::time::timeout_at(deadline, self.server_events.recv()).await {
                Ok(Some(ChunkServerEvent::Disconnected(reason))) => {
                    self.controller.on_chunk_server_disconnected(reason);
                    return;
                }
                Ok(Some(event)) => self.handle_event(event),
                Ok(None) => return,
                Err(_) => {
                    warn!(
                        grace_ms = SHUTDOWN_GRACE.as_millis() as u64,
                        "chunk server connection did not close in time"
                    );
                    return;
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::GameConnected => self.controller.on_game_connected(),
            Command::GameDisconnected => self.controller.on_game_disconnected(),
            Command::PlayerChangedDimension(dimension) => {
                self.controller.on_player_changed_dimension(dimension)
            }
            Command::GameChunk(chunk) => self.controller.on_receive_game_chunk(chunk),
            Command::ConfigChanged(config) => self.controller.on_config_changed(config),
            Command::Tick => self.controller.on_tick(),
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            // Handled by the loop.
            Command::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: ChunkServerEvent) {
        match event {
            ChunkServerEvent::Connected => self.controller.on_chunk_server_connected(),
            ChunkServerEvent::Disconnected(reason) => {
                self.controller.on_chunk_server_disconnected(reason)
            }
            ChunkServerEvent::ExtraChunk(chunk) => self.controller.on_receive_extra_chunk(chunk),
            ChunkServerEvent::Info(text) => info!(%text, "message from chunk server"),
        }
    }

    fn status(&self) -> ConnectionStatus {
        let backoff = self.controller.backoff();
        let status = ConnectionStatus {
            state: self.controller.state(),
            in_game: self.controller.intent(),
            wait_interval_ms: backoff.wait_interval_ms(),
            next_attempt_at_ms: backoff.next_attempt_at_ms(),
            config: self.controller.last_config().clone(),
        };
        debug!(state = %status.state, "status requested");
        status
    }

    /// The controller, for inspection before the runtime is started.
    pub fn controller(&self) -> &ConnectionController<S, K, H> {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morechunks_clock::ManualClock;
    use morechunks_transport::DisconnectReason;

    #[test]
    fn test_builder_defaults() {
        let builder = MoreChunksBuilder::new();
        assert_eq!(builder.config, Config::default());
        assert_eq!(builder.reconnect, ReconnectConfig::default());
        assert_eq!(builder.channel_size, DEFAULT_CHANNEL_SIZE);
    }

    #[tokio::test]
    async fn test_build_starts_idle() {
        let (runtime, _handle) = MoreChunksBuilder::new().build(()).unwrap();
        assert_eq!(runtime.controller().state(), ConnectionState::Idle);
        assert_eq!(runtime.controller().last_config(), &Config::default());
    }

    #[tokio::test]
    async fn test_build_rejects_unusable_host() {
        let config = Config {
            hostname: String::new(),
            ..Config::default()
        };
        let result = MoreChunksBuilder::new().config(config).build(());
        assert!(matches!(result, Err(MoreChunksError::Transport(_))));
    }

    /// Refuses every connect.
    struct Refusing {
        events: mpsc::UnboundedSender<ChunkServerEvent>,
    }

    impl ChunkServer for Refusing {
        fn connect(&mut self) {
            let _ = self.events.send(ChunkServerEvent::Disconnected(
                DisconnectReason::unexpected("refused"),
            ));
        }
        fn disconnect(&mut self, _reason: DisconnectReason) {}
        fn send_message(&mut self, _text: &str) {}
        fn is_connected(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_sync_ticker_runs_only_while_retry_pending() {
        let (tx, rx) = mpsc::unbounded_channel();
        let server = Refusing { events: tx };
        let controller = ConnectionController::new(server, ManualClock::new(), Config::default());
        let ticker = Ticker::with_rate(20);
        let (mut runtime, _handle) = MoreChunks::from_parts(controller, rx, ticker, 4);

        runtime.sync_ticker();
        assert!(runtime.ticker.is_paused(), "idle runtime does not tick");

        runtime.handle_command(Command::GameConnected);
        let event = runtime.server_events.try_recv().unwrap();
        runtime.handle_event(event);
        runtime.sync_ticker();
        assert!(runtime.controller().backoff().is_pending());
        assert!(!runtime.ticker.is_paused(), "pending retry needs ticks");

        runtime.handle_command(Command::GameDisconnected);
        runtime.sync_ticker();
        assert!(runtime.ticker.is_paused());
    }

    #[tokio::test]
    async fn test_handle_fails_after_runtime_dropped() {
        let (runtime, handle) = MoreChunksBuilder::new().build(()).unwrap();
        drop(runtime);
        assert!(matches!(
            handle.game_connected().await,
            Err(MoreChunksError::Unavailable)
        ));
    }
}
