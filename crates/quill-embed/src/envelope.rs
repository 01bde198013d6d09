//! Cross-context envelope protocol
//!
//! ```json
//! {"type":"submit_ticket","payload":{"subject":"..","body":".."},"source":"embedded","instanceId":3}
//! ```
//!
//! Parsing is staged so every rejection has a distinct reason: the raw
//! text must be a JSON object, `source` must be `host` or `embedded`,
//! `type` must be known, and `instanceId` (when present) must be a number.

use quill_core::types::{FieldErrors, Ticket, User};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Envelope parsing and posting errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// Not a JSON object
    #[error("malformed envelope: {0}")]
    Malformed(String),
    /// `source` missing or not `host`/`embedded`
    #[error("invalid envelope source")]
    InvalidSource,
    /// `type` missing or not part of the protocol
    #[error("unknown envelope type: {0}")]
    UnknownType(String),
    /// `instanceId` present but not an unsigned integer
    #[error("invalid instance id")]
    InvalidInstance,
    /// The payload does not match the envelope type
    #[error("invalid payload for {kind}: {reason}")]
    InvalidPayload {
        /// Envelope type
        kind: EnvelopeType,
        /// Decoder message
        reason: String,
    },
    /// The target context is gone
    #[error("message port closed")]
    PortClosed,
}

/// Which side sent an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Host,
    Embedded,
}

impl Source {
    fn parse(label: &str) -> Option<Self> {
        match label {
            "host" => Some(Self::Host),
            "embedded" => Some(Self::Embedded),
            _ => None,
        }
    }
}

/// Identity of one open of the embedded surface.
///
/// Assigned by the host, strictly increasing per open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! envelope_types {
    ($($(#[$meta:meta])* $variant:ident => $token:literal,)+) => {
        /// Every envelope type in the protocol
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum EnvelopeType {
            $($(#[$meta])* #[serde(rename = $token)] $variant,)+
        }

        impl EnvelopeType {
            pub fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }

            pub fn parse(token: &str) -> Option<Self> {
                match token {
                    $($token => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

envelope_types! {
    /// embedded -> host: initialization finished, once per instance
    Ready => "ready",
    /// host -> embedded: initial data, only after `ready`
    Init => "init",
    /// embedded -> host
    SubmitTicket => "submit_ticket",
    /// embedded -> host
    ReloadHistory => "reload_history",
    /// host -> embedded
    TicketSubmitted => "ticket_submitted",
    /// host -> embedded
    TicketFailed => "ticket_failed",
    /// host -> embedded
    HistoryLoaded => "history_loaded",
    /// host -> embedded
    HistoryFailed => "history_failed",
    /// host -> embedded: the surface is being torn down
    Cleanup => "cleanup",
}

impl EnvelopeType {
    /// Side allowed to send this type
    pub fn sender(self) -> Source {
        match self {
            Self::Ready | Self::SubmitTicket | Self::ReloadHistory => Source::Embedded,
            _ => Source::Host,
        }
    }
}

impl fmt::Display for EnvelopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One protocol message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub source: Source,
    #[serde(rename = "instanceId", default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<InstanceId>,
}

impl Envelope {
    pub fn new(kind: EnvelopeType, source: Source, instance_id: InstanceId) -> Self {
        Self {
            kind,
            payload: None,
            source,
            instance_id: Some(instance_id),
        }
    }

    /// Attach a typed payload.
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Result<Self, EnvelopeError> {
        let value = serde_json::to_value(payload).map_err(|e| EnvelopeError::InvalidPayload {
            kind: self.kind,
            reason: e.to_string(),
        })?;
        self.payload = Some(value);
        Ok(self)
    }

    /// Decode the payload as `T`. A missing payload decodes from `null`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, EnvelopeError> {
        serde_json::from_value(self.payload.clone().unwrap_or(Value::Null)).map_err(|e| {
            EnvelopeError::InvalidPayload {
                kind: self.kind,
                reason: e.to_string(),
            }
        })
    }

    pub fn encode(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Parse raw message data.
    pub fn parse(raw: &str) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(EnvelopeError::Malformed("envelope is not an object".into()));
        };

        let source = object
            .get("source")
            .and_then(Value::as_str)
            .and_then(Source::parse)
            .ok_or(EnvelopeError::InvalidSource)?;

        let kind = match object.get("type").and_then(Value::as_str) {
            Some(token) => EnvelopeType::parse(token)
                .ok_or_else(|| EnvelopeError::UnknownType(token.to_string()))?,
            None => return Err(EnvelopeError::UnknownType(String::new())),
        };

        let instance_id = instance_field(&object)?;
        let payload = object.remove("payload").filter(|p| !p.is_null());

        Ok(Self {
            kind,
            payload,
            source,
            instance_id,
        })
    }
}

fn instance_field(object: &Map<String, Value>) -> Result<Option<InstanceId>, EnvelopeError> {
    match object.get("instanceId") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|id| Some(InstanceId(id)))
            .ok_or(EnvelopeError::InvalidInstance),
    }
}

/// `submit_ticket` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTicketPayload {
    pub subject: String,
    pub body: String,
}

/// `init` payload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InitPayload {
    /// Session user, if logged in
    #[serde(default)]
    pub user: Option<User>,
    /// Ticket history known to the host
    #[serde(default)]
    pub tickets: Vec<Ticket>,
}

/// `history_loaded` payload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryPayload {
    #[serde(default)]
    pub tickets: Vec<Ticket>,
}

/// `ticket_failed` / `history_failed` payload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FailurePayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "FieldErrors::is_empty")]
    pub field_errors: FieldErrors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_envelope() {
        let env = Envelope::parse(
            r#"{"type":"submit_ticket","payload":{"subject":"s","body":"b"},"source":"embedded","instanceId":3}"#,
        )
        .unwrap();
        assert_eq!(env.kind, EnvelopeType::SubmitTicket);
        assert_eq!(env.source, Source::Embedded);
        assert_eq!(env.instance_id, Some(InstanceId(3)));
        let payload: SubmitTicketPayload = env.payload_as().unwrap();
        assert_eq!(payload.subject, "s");
    }

    #[test]
    fn rejection_reasons_are_distinct() {
        assert!(matches!(
            Envelope::parse("not json"),
            Err(EnvelopeError::Malformed(_))
        ));
        assert!(matches!(
            Envelope::parse("[1,2]"),
            Err(EnvelopeError::Malformed(_))
        ));
        assert_eq!(
            Envelope::parse(r#"{"type":"ready"}"#),
            Err(EnvelopeError::InvalidSource)
        );
        assert_eq!(
            Envelope::parse(r#"{"type":"ready","source":"iframe"}"#),
            Err(EnvelopeError::InvalidSource)
        );
        assert_eq!(
            Envelope::parse(r#"{"type":"explode","source":"embedded"}"#),
            Err(EnvelopeError::UnknownType("explode".into()))
        );
        assert_eq!(
            Envelope::parse(r#"{"type":"ready","source":"embedded","instanceId":"x"}"#),
            Err(EnvelopeError::InvalidInstance)
        );
    }

    #[test]
    fn encode_uses_wire_names() {
        let env = Envelope::new(EnvelopeType::HistoryLoaded, Source::Host, InstanceId(2))
            .with_payload(&HistoryPayload::default())
            .unwrap();
        let json: Value = serde_json::from_str(&env.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "history_loaded");
        assert_eq!(json["source"], "host");
        assert_eq!(json["instanceId"], 2);
        assert_eq!(json["payload"]["tickets"], Value::Array(vec![]));
    }

    #[test]
    fn senders_are_fixed_per_type() {
        assert_eq!(EnvelopeType::Ready.sender(), Source::Embedded);
        assert_eq!(EnvelopeType::Cleanup.sender(), Source::Host);
    }
}
