//! Quill App - Coordinator, Stores and Application Context
//!
//! Builds the running client core on top of `quill-core`:
//!
//! - `Coordinator`: the bus's effects entry point; turns request actions
//!   into transport calls and publishes one outcome per request
//! - stores: `SessionStore`, `ProfileStore`, `FeedStore`, `CommentStore`,
//!   `ChatStore`, `SupportStore`
//! - `AppCore`: constructs and owns all of the above, plus the embedded
//!   widget host and, once started, the realtime channel
//!
//! ```rust,ignore
//! let core = AppCore::new(config, AppEffects { transport, spawner, clock, storage })?;
//! core.dispatch(SessionAction::LoginRequest {
//!     correlation: CorrelationId::new(),
//!     email: "ada@example.com".into(),
//!     password: "hunter22".into(),
//! })?;
//! ```

#![allow(missing_docs)]
#![forbid(unsafe_code)]

/// Application context
pub mod app;

/// Side-effect coordinator
pub mod coordinator;

/// Tracing setup
pub mod logging;

/// Tokio task spawner
pub mod runtime;

/// Feature stores
pub mod stores;

pub use app::{AppCore, AppEffects};
pub use coordinator::{Coordinator, Normalizer, Operation};
pub use logging::init_tracing;
pub use runtime::TokioSpawner;
pub use stores::{
    ChatState, ChatStore, CommentState, CommentStore, FeedState, FeedStore, ProfileState,
    ProfileStore, SessionState, SessionStore, SupportState, SupportStore,
};
