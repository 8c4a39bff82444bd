//! Configuration snapshots and the differ that compares them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// An immutable snapshot of the user-facing settings.
///
/// Persisting these is the host's business; this crate only compares
/// snapshots. Every change produces a new value rather than mutating a
/// shared one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many extra chunks per second the server may send.
    pub chunk_loads_per_second: u32,

    /// Chunk server host name.
    pub hostname: String,

    /// Chunk server port.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_loads_per_second: 80,
            hostname: "localhost".to_string(),
            port: 12312,
        }
    }
}

impl Config {
    /// The WebSocket URL of the configured chunk server.
    pub fn server_url(&self) -> String {
        format!("ws://{}:{}", self.hostname, self.port)
    }
}

// ---------------------------------------------------------------------------
// ConfigDiff
// ---------------------------------------------------------------------------

/// One field that differs between two snapshots, carrying its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    ChunkLoadsPerSecond(u32),
    Hostname(String),
    Port(u16),
}

/// The fields that changed between two snapshots, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigDiff {
    changes: Vec<ConfigChange>,
}

impl ConfigDiff {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// All changes.
    pub fn changes(&self) -> &[ConfigChange] {
        &self.changes
    }

    /// The new chunk rate, if it changed.
    pub fn chunk_loads_per_second(&self) -> Option<u32> {
        self.changes.iter().find_map(|c| match c {
            ConfigChange::ChunkLoadsPerSecond(rate) => Some(*rate),
            _ => None,
        })
    }

    /// Whether the chunk server address changed. Takes effect on the next
    /// connection, not the current one.
    pub fn server_address_changed(&self) -> bool {
        self.changes
            .iter()
            .any(|c| matches!(c, ConfigChange::Hostname(_) | ConfigChange::Port(_)))
    }
}

/// Compares two snapshots field by field.
///
/// Total and side-effect free: what to do about the result is up to the
/// caller.
pub fn diff(prev: &Config, next: &Config) -> ConfigDiff {
    let mut changes = Vec::new();
    if prev.chunk_loads_per_second != next.chunk_loads_per_second {
        changes.push(ConfigChange::ChunkLoadsPerSecond(next.chunk_loads_per_second));
    }
    if prev.hostname != next.hostname {
        changes.push(ConfigChange::Hostname(next.hostname.clone()));
    }
    if prev.port != next.port {
        changes.push(ConfigChange::Port(next.port));
    }
    ConfigDiff { changes }
}
