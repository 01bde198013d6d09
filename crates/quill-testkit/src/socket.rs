//! Hand-driven realtime sockets
//!
//! `FakeConnector` hands out `FakeSocket`s. Nothing happens on a socket
//! until the test calls `open()`, `deliver()`, `drop_connection()` or
//! `fail()`.

use parking_lot::Mutex;
use quill_realtime::{ChannelError, SocketConnector, SocketHandler, SocketSink};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// One simulated connection
pub struct FakeSocket {
    url: String,
    handler: Arc<dyn SocketHandler>,
    sent: Mutex<Vec<String>>,
    closed: AtomicBool,
    refuse_writes: AtomicBool,
}

impl FakeSocket {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Server accepted the connection.
    pub fn open(&self) {
        self.handler.handle_open();
    }

    /// Server pushed a text frame.
    pub fn deliver(&self, frame: &str) {
        self.handler.handle_message(frame);
    }

    /// Connection lost without the client asking.
    pub fn drop_connection(&self, code: u16, reason: &str) {
        self.closed.store(true, Ordering::SeqCst);
        self.handler.handle_close(code, reason);
    }

    /// Transport error.
    pub fn fail(&self, error: &str) {
        self.handler.handle_error(error);
    }

    /// Make subsequent writes fail.
    pub fn refuse_writes(&self) {
        self.refuse_writes.store(true, Ordering::SeqCst);
    }

    /// Frames the client wrote, in order
    pub fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Frames the client wrote, decoded as JSON
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .iter()
            .filter_map(|f| serde_json::from_str(f).ok())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl SocketSink for FakeSocket {
    fn send_text(&self, text: &str) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        if self.refuse_writes.load(Ordering::SeqCst) {
            return Err(ChannelError::Send("write refused".into()));
        }
        self.sent.lock().push(text.to_string());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Connector recording every connection attempt
#[derive(Default)]
pub struct FakeConnector {
    sockets: Mutex<Vec<Arc<FakeSocket>>>,
    refuse_next: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` connection attempts fail immediately.
    pub fn refuse_next(&self, n: usize) {
        self.refuse_next.store(n, Ordering::SeqCst);
    }

    /// Every socket handed out, oldest first
    pub fn sockets(&self) -> Vec<Arc<FakeSocket>> {
        self.sockets.lock().clone()
    }

    /// Most recent socket
    pub fn latest(&self) -> Option<Arc<FakeSocket>> {
        self.sockets.lock().last().cloned()
    }

    pub fn connect_count(&self) -> usize {
        self.sockets.lock().len()
    }
}

impl SocketConnector for FakeConnector {
    fn connect(
        &self,
        url: &str,
        handler: Arc<dyn SocketHandler>,
    ) -> Result<Arc<dyn SocketSink>, ChannelError> {
        let refused = self
            .refuse_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(ChannelError::Connect("connection refused".into()));
        }
        let socket = Arc::new(FakeSocket {
            url: url.to_string(),
            handler,
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            refuse_writes: AtomicBool::new(false),
        });
        self.sockets.lock().push(socket.clone());
        Ok(socket)
    }
}
