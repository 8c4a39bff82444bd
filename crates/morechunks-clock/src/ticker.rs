//! Fixed-rate tick source.
//!
//! Drives periodic re-evaluation of retry deadlines when the host game does
//! not call the controller once per frame itself. Backoff intervals are
//! measured in whole seconds, so the default 20 Hz is far finer than any
//! deadline it has to catch.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How often the [`Ticker`] fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickConfig {
    /// Ticks per second. 0 leaves ticking to the host: the ticker never
    /// fires on its own.
    pub tick_rate_hz: u32,
    /// Upper bound (µs, exclusive) of a random delay added before the first
    /// tick, so clients launched together drift apart.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            initial_jitter_us: 5_000,
        }
    }
}

impl TickConfig {
    /// Fastest rate a ticker will run at.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// Default jitter at the given rate.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Self::default()
        }
    }

    /// A config that never fires; the host ticks the controller itself.
    pub fn host_driven() -> Self {
        Self::with_rate(0)
    }

    /// Caps the rate at [`MAX_TICK_RATE_HZ`](Self::MAX_TICK_RATE_HZ).
    pub fn validated(self) -> Self {
        let capped = self.tick_rate_hz.min(Self::MAX_TICK_RATE_HZ);
        if capped != self.tick_rate_hz {
            warn!(
                requested = self.tick_rate_hz,
                capped, "tick rate too high, capping"
            );
        }
        Self {
            tick_rate_hz: capped,
            ..self
        }
    }

    /// Time between ticks, or `None` when host-driven.
    pub fn tick_duration(&self) -> Option<Duration> {
        (self.tick_rate_hz > 0)
            .then(|| Duration::from_nanos(1_000_000_000 / u64::from(self.tick_rate_hz)))
    }

    fn first_delay(&self) -> Duration {
        if self.initial_jitter_us == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::rng().random_range(0..self.initial_jitter_us))
    }
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// One fired tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Ticks fired so far, this one included.
    pub tick: u64,
    /// Whole periods that went by unticked because the loop woke up late.
    pub ticks_skipped: u64,
}

/// Fixed-rate tick source for a `tokio::select!` loop.
///
/// A late wakeup fires once and reports how many periods it covered;
/// missed ticks are never replayed, since one check sees every deadline
/// that already passed.
#[derive(Debug)]
pub struct Ticker {
    period: Option<Duration>,
    due: Instant,
    fired: u64,
    paused: bool,
}

impl Ticker {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let period = config.tick_duration();
        let due = Instant::now() + period.unwrap_or_default() + config.first_delay();

        match period {
            Some(period) => debug!(
                rate_hz = config.tick_rate_hz,
                period_ms = period.as_millis() as u64,
                "ticker ready"
            ),
            None => debug!("ticker ready, host-driven"),
        }

        Self {
            period,
            due,
            fired: 0,
            paused: false,
        }
    }

    /// Shorthand for [`TickConfig::with_rate`].
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Resolves at the next tick.
    ///
    /// Never resolves while paused or host-driven, which keeps the branch
    /// inert inside `select!`.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let period = match self.period {
            Some(period) if !self.paused => period,
            _ => return std::future::pending().await,
        };

        time::sleep_until(self.due).await;

        let now = Instant::now();
        let behind = now.saturating_duration_since(self.due);
        let ticks_skipped = (behind.as_nanos() / period.as_nanos()) as u64;
        self.fired += 1;
        self.due = now + period;

        if ticks_skipped > 0 {
            warn!(
                tick = self.fired,
                ticks_skipped,
                behind_ms = behind.as_millis() as u64,
                "tick loop running late"
            );
        } else {
            trace!(tick = self.fired, "tick");
        }

        TickInfo {
            tick: self.fired,
            ticks_skipped,
        }
    }

    /// Suspends ticking. Calling it again has no effect.
    pub fn pause(&mut self) {
        if std::mem::replace(&mut self.paused, true) {
            return;
        }
        debug!(tick = self.fired, "ticker paused");
    }

    /// Restarts ticking; the next tick is one period away.
    pub fn resume(&mut self) {
        if !std::mem::replace(&mut self.paused, false) {
            return;
        }
        if let Some(period) = self.period {
            self.due = Instant::now() + period;
        }
        debug!(tick = self.fired, "ticker resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True at rate 0.
    pub fn is_host_driven(&self) -> bool {
        self.period.is_none()
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.fired
    }

    /// Time between ticks, `None` when host-driven.
    pub fn tick_duration(&self) -> Option<Duration> {
        self.period
    }
}
