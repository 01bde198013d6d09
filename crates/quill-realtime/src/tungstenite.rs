//! Native WebSocket connector backed by tokio-tungstenite.
//!
//! Each connection runs as one task on the current tokio runtime. The sink
//! hands frames to that task over an unbounded channel, so `send_text`
//! never blocks.

use crate::connector::{ChannelError, SocketConnector, SocketHandler, SocketSink};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

enum Outbound {
    Text(String),
    Close,
}

struct TungsteniteSink {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl SocketSink for TungsteniteSink {
    fn send_text(&self, text: &str) -> Result<(), ChannelError> {
        self.tx
            .send(Outbound::Text(text.to_string()))
            .map_err(|_| ChannelError::Closed)
    }

    fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

/// Connector for native hosts running a tokio runtime
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector {
    runtime: Option<tokio::runtime::Handle>,
}

impl TungsteniteConnector {
    /// Spawn connections on the runtime current at `connect` time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn connections on a specific runtime.
    pub fn with_runtime(runtime: tokio::runtime::Handle) -> Self {
        Self {
            runtime: Some(runtime),
        }
    }
}

impl SocketConnector for TungsteniteConnector {
    fn connect(
        &self,
        url: &str,
        handler: Arc<dyn SocketHandler>,
    ) -> Result<Arc<dyn SocketSink>, ChannelError> {
        let runtime = match &self.runtime {
            Some(handle) => handle.clone(),
            None => tokio::runtime::Handle::try_current()
                .map_err(|e| ChannelError::Connect(format!("no tokio runtime: {e}")))?,
        };
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_connection(url.to_string(), handler, rx));
        Ok(Arc::new(TungsteniteSink { tx }))
    }
}

async fn run_connection(
    url: String,
    handler: Arc<dyn SocketHandler>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
) {
    let (stream, _response) = match connect_async(url.as_str()).await {
        Ok(connected) => connected,
        Err(e) => {
            handler.handle_error(&format!("WebSocket connect failed: {e}"));
            return;
        }
    };
    handler.handle_open();
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        handler.handle_error(&format!("WebSocket send failed: {e}"));
                        return;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    debug!(%url, "websocket closed locally");
                    handler.handle_close(1000, "closed by client");
                    return;
                }
            },
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => handler.handle_message(&text),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => handler.handle_message(&text),
                    Err(_) => debug!(%url, "ignoring non-utf8 binary frame"),
                },
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((1005, String::new()));
                    handler.handle_close(code, &reason);
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    handler.handle_error(&format!("WebSocket receive failed: {e}"));
                    return;
                }
                None => {
                    handler.handle_close(1006, "stream ended");
                    return;
                }
            },
        }
    }
}
