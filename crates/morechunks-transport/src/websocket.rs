//! WebSocket chunk server client using `tokio-tungstenite`.
//!
//! Each call to [`ChunkServer::connect`] spawns one link task that owns the
//! socket for the lifetime of that connection. The [`WebSocketChunkServer`]
//! itself only holds a command channel into the task, so every method
//! returns without awaiting anything.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use morechunks_protocol::Chunk;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{ChunkServer, ChunkServerEvent, DisconnectReason, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Commands from the owning client to its link task.
enum LinkCommand {
    Send(String),
    Close(DisconnectReason),
}

/// Command channel into the currently spawned link task.
///
/// Dropping it lets the task run out its queue, close the socket and exit.
struct Link {
    commands: mpsc::UnboundedSender<LinkCommand>,
}

impl Link {
    /// The task drops its command receiver before reporting its final
    /// disconnect, so a connect issued in response to that event starts a
    /// fresh link.
    fn is_alive(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// A [`ChunkServer`] that talks to the chunk server over a WebSocket.
///
/// Events are reported on the channel given to [`new`](Self::new). Calling
/// [`connect`](ChunkServer::connect) requires a running Tokio runtime.
pub struct WebSocketChunkServer {
    url: String,
    events: mpsc::UnboundedSender<ChunkServerEvent>,
    connected: Arc<AtomicBool>,
    link: Option<Link>,
}

impl WebSocketChunkServer {
    /// Creates a client for the given `ws://` URL.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidUrl`] if the URL has no host or
    /// is not a `ws://` URL.
    pub fn new(
        url: impl Into<String>,
        events: mpsc::UnboundedSender<ChunkServerEvent>,
    ) -> Result<Self, TransportError> {
        let url = url.into();
        let host = url
            .strip_prefix("ws://")
            .and_then(|rest| rest.split(['/', ':']).next())
            .unwrap_or_default();
        if host.is_empty() {
            return Err(TransportError::InvalidUrl(url));
        }
        Ok(Self {
            url,
            events,
            connected: Arc::new(AtomicBool::new(false)),
            link: None,
        })
    }

    /// The URL this client connects to.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn report(&self, event: ChunkServerEvent) {
        let _ = self.events.send(event);
    }
}

impl ChunkServer for WebSocketChunkServer {
    fn connect(&mut self) {
        if self.link.as_ref().is_some_and(Link::is_alive) {
            tracing::debug!(url = %self.url, "connect ignored, link already active");
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(url = %self.url, "connect called outside a Tokio runtime");
            self.report(ChunkServerEvent::Disconnected(
                DisconnectReason::unexpected("no async runtime"),
            ));
            return;
        };

        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_link(
            self.url.clone(),
            rx,
            self.events.clone(),
            Arc::clone(&self.connected),
        ));
        tracing::debug!(url = %self.url, "chunk server connect started");
        self.link = Some(Link { commands: tx });
    }

    fn disconnect(&mut self, reason: DisconnectReason) {
        match &self.link {
            Some(link) if link.is_alive() => {
                let _ = link.commands.send(LinkCommand::Close(reason));
            }
            _ => tracing::trace!(%reason, "disconnect with no active link"),
        }
    }

    fn send_message(&mut self, text: &str) {
        match &self.link {
            Some(link) if link.is_alive() => {
                let _ = link.commands.send(LinkCommand::Send(text.to_string()));
            }
            _ => tracing::debug!(text, "dropping message, no active link"),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Owns one connection from handshake to close.
async fn run_link(
    url: String,
    mut commands: mpsc::UnboundedReceiver<LinkCommand>,
    events: mpsc::UnboundedSender<ChunkServerEvent>,
    connected: Arc<AtomicBool>,
) {
    let mut ws = match open(&url).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(url, error = %e, "chunk server connect failed");
            drop(commands);
            let _ = events.send(ChunkServerEvent::Disconnected(
                DisconnectReason::unexpected(e.to_string()),
            ));
            return;
        }
    };

    connected.store(true, Ordering::Release);
    tracing::info!(url, "chunk server connected");
    let _ = events.send(ChunkServerEvent::Connected);

    let reason = loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(LinkCommand::Send(text)) => {
                    if let Err(e) = send_text(&mut ws, text).await {
                        break DisconnectReason::unexpected(e.to_string());
                    }
                }
                Some(LinkCommand::Close(reason)) => {
                    let _ = ws.close(None).await;
                    break reason;
                }
                None => {
                    // Owner dropped; nobody is listening for the outcome.
                    let _ = ws.close(None).await;
                    connected.store(false, Ordering::Release);
                    return;
                }
            },
            frame = ws.next() => match read_frame(frame) {
                Ok(Some(event)) => {
                    let _ = events.send(event);
                }
                Ok(None) => {}
                Err(e) => break DisconnectReason::unexpected(e.to_string()),
            },
        }
    };

    drop(commands);
    connected.store(false, Ordering::Release);
    tracing::info!(url, %reason, "chunk server disconnected");
    let _ = events.send(ChunkServerEvent::Disconnected(reason));
}

async fn open(url: &str) -> Result<WsStream, TransportError> {
    let (ws, _response) =
        tokio_tungstenite::connect_async(url).await.map_err(|e| {
            TransportError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;
    Ok(ws)
}

async fn send_text(ws: &mut WsStream, text: String) -> Result<(), TransportError> {
    ws.send(Message::text(text)).await.map_err(|e| {
        TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            e,
        ))
    })
}

/// Maps one incoming frame to an event. `Ok(None)` for control frames.
fn read_frame(
    frame: Option<Result<Message, tungstenite::Error>>,
) -> Result<Option<ChunkServerEvent>, TransportError> {
    match frame {
        Some(Ok(Message::Binary(data))) => {
            Ok(Some(ChunkServerEvent::ExtraChunk(Chunk::new(data.to_vec()))))
        }
        Some(Ok(Message::Text(text))) => {
            Ok(Some(ChunkServerEvent::Info(text.as_str().to_string())))
        }
        Some(Ok(Message::Close(_))) | None => Err(
            TransportError::ConnectionClosed("closed by server".to_string()),
        ),
        Some(Ok(_)) => Ok(None), // ping/pong/frame
        Some(Err(e)) => Err(TransportError::ReceiveFailed(
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events() -> mpsc::UnboundedSender<ChunkServerEvent> {
        mpsc::unbounded_channel().0
    }

    #[test]
    fn test_new_accepts_ws_url() {
        let server = WebSocketChunkServer::new("ws://127.0.0.1:12312", events())
            .expect("valid url");
        assert_eq!(server.url(), "ws://127.0.0.1:12312");
        assert!(!server.is_connected());
    }

    #[test]
    fn test_new_rejects_other_schemes() {
        let result = WebSocketChunkServer::new("http://127.0.0.1:12312", events());
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_new_rejects_missing_host() {
        assert!(WebSocketChunkServer::new("ws://", events()).is_err());
        assert!(WebSocketChunkServer::new("ws:///path", events()).is_err());
        assert!(WebSocketChunkServer::new("ws://:12312", events()).is_err());
    }

    #[test]
    fn test_connect_outside_runtime_reports_disconnect() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut server =
            WebSocketChunkServer::new("ws://127.0.0.1:1", tx).unwrap();
        server.connect();
        assert!(matches!(
            rx.try_recv(),
            Ok(ChunkServerEvent::Disconnected(reason)) if !reason.is_expected()
        ));
    }

    #[test]
    fn test_disconnect_without_link_is_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut server =
            WebSocketChunkServer::new("ws://127.0.0.1:1", tx).unwrap();
        server.disconnect(DisconnectReason::expected("Game ending"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_read_frame_maps_binary_to_extra_chunk() {
        let frame = Some(Ok(Message::binary(vec![1u8, 2, 3])));
        let event = read_frame(frame).unwrap();
        assert_eq!(
            event,
            Some(ChunkServerEvent::ExtraChunk(Chunk::new(vec![1, 2, 3])))
        );
    }

    #[test]
    fn test_read_frame_maps_text_to_info() {
        let frame = Some(Ok(Message::text("hello")));
        assert_eq!(
            read_frame(frame).unwrap(),
            Some(ChunkServerEvent::Info("hello".into()))
        );
    }

    #[test]
    fn test_read_frame_end_of_stream_is_closed_error() {
        assert!(matches!(
            read_frame(None),
            Err(TransportError::ConnectionClosed(_))
        ));
    }

    #[test]
    fn test_read_frame_ping_is_skipped() {
        let frame = Some(Ok(Message::Ping(Vec::new().into())));
        assert_eq!(read_frame(frame).unwrap(), None);
    }
}
