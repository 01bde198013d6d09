//! Quill Embed - Host/Embedded Messaging Bridge
//!
//! The support widget runs in a sandboxed embedded document and talks to
//! the host page only through envelopes:
//!
//! ```text
//! embedded                          host
//!    | ---- ready ------------------> |   (once, after init)
//!    | <--- init -------------------- |   (held until ready)
//!    | ---- submit_ticket ----------> |   -> TICKET_SUBMIT_REQUEST
//!    | <--- ticket_submitted/failed - |   <- TICKET_SUBMIT_SUCCESS/FAIL
//!    | ---- reload_history ---------> |   -> TICKET_HISTORY_REQUEST (coalesced)
//!    | <--- history_loaded/failed --- |   <- TICKET_HISTORY_SUCCESS/FAIL
//!    | <--- cleanup ----------------- |   close()
//! ```
//!
//! Both sides drop anything from a foreign origin, with the wrong `source`,
//! of an unknown type, or for another instance, and count each drop in
//! `BridgeStats`.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod embedded;
pub mod envelope;
pub mod host;
pub mod port;
pub mod stats;
pub mod throttle;

pub use embedded::{EmbeddedClient, HostEvent};
pub use envelope::{
    Envelope, EnvelopeError, EnvelopeType, FailurePayload, HistoryPayload, InitPayload,
    InstanceId, Source, SubmitTicketPayload,
};
pub use host::{EmbedHost, HostConfig};
pub use port::MessagePort;
pub use stats::BridgeStats;
pub use throttle::Throttle;
