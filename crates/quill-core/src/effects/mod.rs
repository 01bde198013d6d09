//! # Effect Interfaces
//!
//! Runtime-agnostic traits for everything the core needs from its host:
//! network requests, task spawning, wall-clock time and durable key-value
//! storage. Implementations live with the host (browser bindings, tokio, or
//! the deterministic doubles in `quill-testkit`).

mod http;
mod storage;
mod task;
mod time;

pub use http::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, RequestBody, StatusClass,
    TransportError,
};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError};
pub use task::TaskSpawner;
pub use time::{Clock, SystemClock};
