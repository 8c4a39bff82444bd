/// Errors that can occur in the transport layer.
///
/// These never escape to the connection controller directly: a failing
/// link reports them as the text of an unexpected [`DisconnectReason`].
///
/// [`DisconnectReason`]: crate::DisconnectReason
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The chunk server address is not a usable `ws://` URL.
    #[error("invalid chunk server url: {0}")]
    InvalidUrl(String),

    /// Opening the connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The connection was closed by the remote side.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}
