//! Quill Testing Infrastructure
//!
//! Deterministic doubles for every seam of the client core, so tests run
//! synchronously on the test thread with no sockets, timers or runtime:
//!
//! - `StubTransport`: scripted HTTP responses, records every request
//! - `ManualScheduler` / `ManualClock`: spawned work and timers run only
//!   when the test says so
//! - `FakeConnector`: realtime sockets driven by hand
//! - `RecordingPort`: captures cross-context envelopes
//! - `ActionRecorder`: captures every action on the bus
//!
//! ```rust,ignore
//! let scheduler = ManualScheduler::new();
//! let transport = StubTransport::new();
//! transport.respond_json(HttpMethod::Post, "/auth/login", 200, json!({"id": 1}));
//! // dispatch a request, then drive the workflow to completion:
//! scheduler.run_until_idle();
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

pub mod port;
pub mod recorder;
pub mod scheduler;
pub mod socket;
pub mod transport;

pub use port::RecordingPort;
pub use quill_core::effects::MemoryStorage;
pub use recorder::ActionRecorder;
pub use scheduler::{ManualClock, ManualScheduler};
pub use socket::{FakeConnector, FakeSocket};
pub use transport::StubTransport;

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `QUILL_LOG`; output goes through the test harness capture.
pub fn init_test_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_env("QUILL_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
