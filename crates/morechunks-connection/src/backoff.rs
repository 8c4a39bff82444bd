//! Reconnect timing: a doubling wait interval and the deadline it sets.
//!
//! The controller never sleeps. Instead it stores the time of the next
//! allowed attempt and checks it whenever a tick arrives:
//!
//! ```text
//!   disconnect ──→ arm(now)         interval = base, deadline = now + base
//!   tick ≥ deadline ──→ advance(now) interval *= 2,  deadline = now + interval
//!   connected ──→ reset()            interval = base, no deadline
//! ```

use serde::{Deserialize, Serialize};

/// Reconnect timing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Wait before the first timed retry, and the value the interval
    /// returns to after a successful connect.
    ///
    /// Default: 1000 ms.
    pub base_interval_ms: u64,

    /// Upper bound for the doubled interval. `None` lets it grow without
    /// limit (saturating at `u64::MAX`).
    ///
    /// Default: `None`.
    pub max_interval_ms: Option<u64>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 1000,
            max_interval_ms: None,
        }
    }
}

impl ReconnectConfig {
    /// Clamp values that would make the backoff misbehave.
    ///
    /// - `base_interval_ms` is at least 1, so doubling always makes progress.
    /// - `max_interval_ms`, when set, is at least `base_interval_ms`.
    pub fn validated(mut self) -> Self {
        if self.base_interval_ms == 0 {
            tracing::warn!("base_interval_ms is 0, using 1");
            self.base_interval_ms = 1;
        }
        if let Some(max) = self.max_interval_ms {
            if max < self.base_interval_ms {
                tracing::warn!(
                    max,
                    base = self.base_interval_ms,
                    "max_interval_ms below base, raising to base"
                );
                self.max_interval_ms = Some(self.base_interval_ms);
            }
        }
        self
    }
}

/// Backoff state owned by the connection controller.
///
/// A retry is pending exactly when `next_attempt_at_ms` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffState {
    config: ReconnectConfig,
    wait_interval_ms: u64,
    next_attempt_at_ms: Option<u64>,
}

impl BackoffState {
    /// Creates an idle backoff with the interval at its base.
    pub fn new(config: ReconnectConfig) -> Self {
        let config = config.validated();
        Self {
            wait_interval_ms: config.base_interval_ms,
            next_attempt_at_ms: None,
            config,
        }
    }

    /// Start waiting after the first failure since the last success.
    pub fn arm(&mut self, now_ms: u64) {
        self.wait_interval_ms = self.config.base_interval_ms;
        self.next_attempt_at_ms = Some(now_ms.saturating_add(self.wait_interval_ms));
    }

    /// Whether a pending retry's deadline has been reached.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.next_attempt_at_ms.is_some_and(|at| now_ms >= at)
    }

    /// Record that a retry was just issued: double the interval and
    /// schedule the next deadline from `now_ms` with the new value.
    pub fn advance(&mut self, now_ms: u64) {
        let doubled = self.wait_interval_ms.saturating_mul(2);
        self.wait_interval_ms = match self.config.max_interval_ms {
            Some(max) => doubled.min(max),
            None => doubled,
        };
        self.next_attempt_at_ms = Some(now_ms.saturating_add(self.wait_interval_ms));
    }

    /// A connection succeeded: back to base, nothing pending.
    pub fn reset(&mut self) {
        self.wait_interval_ms = self.config.base_interval_ms;
        self.next_attempt_at_ms = None;
    }

    /// Drop the pending retry without touching the interval.
    pub fn cancel(&mut self) {
        self.next_attempt_at_ms = None;
    }

    /// Whether a retry is scheduled.
    pub fn is_pending(&self) -> bool {
        self.next_attempt_at_ms.is_some()
    }

    /// Current wait interval in milliseconds.
    pub fn wait_interval_ms(&self) -> u64 {
        self.wait_interval_ms
    }

    /// Deadline of the pending retry, if any.
    pub fn next_attempt_at_ms(&self) -> Option<u64> {
        self.next_attempt_at_ms
    }

    /// The settings this backoff was built with (after validation).
    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }
}

impl Default for BackoffState {
    fn default() -> Self {
        Self::new(ReconnectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capped(max: u64) -> BackoffState {
        BackoffState::new(ReconnectConfig {
            base_interval_ms: 1000,
            max_interval_ms: Some(max),
        })
    }

    #[test]
    fn test_new_is_idle_at_base() {
        let b = BackoffState::default();
        assert_eq!(b.wait_interval_ms(), 1000);
        assert!(!b.is_pending());
        assert!(!b.is_due(u64::MAX));
    }

    #[test]
    fn test_arm_sets_deadline_one_base_away() {
        let mut b = BackoffState::default();
        b.arm(0);
        assert!(b.is_pending());
        assert_eq!(b.next_attempt_at_ms(), Some(1000));
        assert!(!b.is_due(999));
        assert!(b.is_due(1000));
    }

    #[test]
    fn test_advance_doubles_then_schedules_from_now() {
        let mut b = BackoffState::default();
        b.arm(0);
        b.advance(1000);
        assert_eq!(b.wait_interval_ms(), 2000);
        assert_eq!(b.next_attempt_at_ms(), Some(3000));
        b.advance(3000);
        assert_eq!(b.wait_interval_ms(), 4000);
        assert_eq!(b.next_attempt_at_ms(), Some(7000));
    }

    #[test]
    fn test_advance_respects_cap() {
        let mut b = capped(3000);
        b.arm(0);
        b.advance(1000); // 2000
        b.advance(3000); // 4000 → 3000
        assert_eq!(b.wait_interval_ms(), 3000);
        b.advance(6000);
        assert_eq!(b.wait_interval_ms(), 3000);
        assert_eq!(b.next_attempt_at_ms(), Some(9000));
    }

    #[test]
    fn test_advance_without_cap_saturates() {
        let mut b = BackoffState::default();
        b.arm(0);
        for _ in 0..80 {
            b.advance(0);
        }
        assert_eq!(b.wait_interval_ms(), u64::MAX);
        assert_eq!(b.next_attempt_at_ms(), Some(u64::MAX));
    }

    #[test]
    fn test_reset_returns_to_base_and_clears_deadline() {
        let mut b = BackoffState::default();
        b.arm(0);
        b.advance(1000);
        b.reset();
        assert_eq!(b.wait_interval_ms(), 1000);
        assert!(!b.is_pending());
    }

    #[test]
    fn test_cancel_keeps_interval() {
        let mut b = BackoffState::default();
        b.arm(0);
        b.advance(1000);
        b.cancel();
        assert!(!b.is_pending());
        assert_eq!(b.wait_interval_ms(), 2000);
    }

    #[test]
    fn test_validated_fixes_zero_base_and_low_cap() {
        let cfg = ReconnectConfig {
            base_interval_ms: 0,
            max_interval_ms: Some(0),
        }
        .validated();
        assert_eq!(cfg.base_interval_ms, 1);
        assert_eq!(cfg.max_interval_ms, Some(1));
    }

    #[test]
    fn test_default_config_has_no_cap() {
        let cfg = ReconnectConfig::default();
        assert_eq!(cfg.base_interval_ms, 1000);
        assert_eq!(cfg.max_interval_ms, None);
    }
}
