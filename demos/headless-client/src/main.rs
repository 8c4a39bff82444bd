//! Headless MoreChunks client.
//!
//! Pretends a game session is running: connects to the configured chunk
//! server, keeps the connection alive until Ctrl-C, and logs every chunk
//! the server pushes.
//!
//! ```text
//! headless-client [settings.json]
//! ```
//!
//! The settings path can also come from `MORECHUNKS_SETTINGS`. Without one,
//! defaults are used (`ws://localhost:12312`, 80 chunks/s).

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use morechunks::prelude::*;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    config: Config,
    reconnect: ReconnectConfig,
    log: Option<String>,
}

fn load_settings(path: Option<&Path>) -> Result<Settings, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(Settings::default()),
    }
}

// ---------------------------------------------------------------------------
// Chunk sink
// ---------------------------------------------------------------------------

/// Counts what arrives; a real client would hand chunks to its renderer.
#[derive(Clone, Default)]
struct ChunkCounter {
    chunks: Arc<AtomicU64>,
    bytes: Arc<AtomicU64>,
}

impl ChunkHandler for ChunkCounter {
    fn on_extra_chunk(&mut self, chunk: Chunk) {
        let total = self.chunks.fetch_add(1, Ordering::Relaxed) + 1;
        self.bytes.fetch_add(chunk.len() as u64, Ordering::Relaxed);
        tracing::debug!(total, bytes = chunk.len(), "extra chunk");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MORECHUNKS_SETTINGS").ok());
    let settings = load_settings(path.as_deref().map(Path::new))?;
    init_logging(settings.log.as_deref().unwrap_or("info"));

    tracing::info!(url = %settings.config.server_url(), "starting headless client");

    let counter = ChunkCounter::default();
    let (runtime, handle) = MoreChunksBuilder::new()
        .config(settings.config)
        .reconnect(settings.reconnect)
        .build(counter.clone())?;
    let task = tokio::spawn(runtime.run());

    handle.game_connected().await?;
    tokio::signal::ctrl_c().await?;

    handle.game_disconnected().await?;
    handle.shutdown().await?;
    task.await?;

    tracing::info!(
        chunks = counter.chunks.load(Ordering::Relaxed),
        bytes = counter.bytes.load(Ordering::Relaxed),
        "session over"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::SinkExt;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    #[test]
    fn test_load_settings_without_path_uses_defaults() {
        let settings = load_settings(None).unwrap();
        assert_eq!(settings.config, Config::default());
        assert_eq!(settings.reconnect, ReconnectConfig::default());
        assert!(settings.log.is_none());
    }

    #[test]
    fn test_settings_partial_json() {
        let settings: Settings = serde_json::from_str(
            r#"{ "config": { "port": 25566 }, "reconnect": { "max_interval_ms": 60000 } }"#,
        )
        .unwrap();
        assert_eq!(settings.config.port, 25566);
        assert_eq!(settings.config.hostname, "localhost");
        assert_eq!(settings.reconnect.base_interval_ms, 1000);
        assert_eq!(settings.reconnect.max_interval_ms, Some(60_000));
    }

    #[test]
    fn test_load_settings_missing_file_errors() {
        let result = load_settings(Some(Path::new("/nonexistent/morechunks.json")));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_counter_sees_pushed_chunks() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = Config {
            hostname: "127.0.0.1".into(),
            port: listener.local_addr().unwrap().port(),
            ..Config::default()
        };

        let counter = ChunkCounter::default();
        let (runtime, handle) = MoreChunksBuilder::new()
            .config(config)
            .build(counter.clone())
            .unwrap();
        let task = tokio::spawn(runtime.run());
        handle.game_connected().await.unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let mut server = tokio_tungstenite::accept_async(stream).await.unwrap();
        server.send(Message::binary(vec![0u8; 16])).await.unwrap();
        server.send(Message::binary(vec![0u8; 4])).await.unwrap();

        for _ in 0..200 {
            if counter.chunks.load(Ordering::Relaxed) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(counter.chunks.load(Ordering::Relaxed), 2);
        assert_eq!(counter.bytes.load(Ordering::Relaxed), 20);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }
}
