//! Socket seam
//!
//! The bridge never touches a concrete socket. A `SocketConnector` opens a
//! connection and reports its lifecycle through a `SocketHandler`; the
//! returned `SocketSink` is the write half.

use std::sync::Arc;

/// Channel errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The connection could not be initiated
    #[error("connect failed: {0}")]
    Connect(String),
    /// A frame could not be written
    #[error("send failed: {0}")]
    Send(String),
    /// The socket is already closed
    #[error("socket closed")]
    Closed,
}

/// Receives socket lifecycle events for one connection.
///
/// Events may arrive on any thread; implementations must not block.
pub trait SocketHandler: Send + Sync {
    /// The connection is open and frames can flow.
    fn handle_open(&self);

    /// A text frame arrived.
    fn handle_message(&self, data: &str);

    /// The connection closed, cleanly or not.
    fn handle_close(&self, code: u16, reason: &str);

    /// The connection failed. A close may or may not follow.
    fn handle_error(&self, error: &str);
}

/// Write half of an open connection
pub trait SocketSink: Send + Sync {
    /// Queue a text frame.
    fn send_text(&self, text: &str) -> Result<(), ChannelError>;

    /// Close the connection. No further events are expected afterwards but
    /// handlers must tolerate them.
    fn close(&self);
}

/// Opens connections.
pub trait SocketConnector: Send + Sync {
    /// Start connecting to `url`.
    ///
    /// Returns the write half immediately. Implementations must not call
    /// into `handler` before this method has returned; the open event is
    /// always delivered later.
    fn connect(
        &self,
        url: &str,
        handler: Arc<dyn SocketHandler>,
    ) -> Result<Arc<dyn SocketSink>, ChannelError>;
}
