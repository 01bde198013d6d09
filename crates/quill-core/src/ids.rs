//! Identifiers
//!
//! Entity ids are plain server-assigned integers wrapped in newtypes so a
//! `PostId` can never be passed where a `CommentId` is expected.
//! `CorrelationId` pairs a request action with its outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// User account identifier
    UserId
);
entity_id!(
    /// Post identifier
    PostId
);
entity_id!(
    /// Comment identifier
    CommentId
);
entity_id!(
    /// Chat room identifier
    RoomId
);
entity_id!(
    /// Chat message identifier
    MessageId
);
entity_id!(
    /// Support ticket identifier
    TicketId
);

/// Token carried by a request action and copied onto its outcome.
///
/// Concurrent requests of the same kind resolve in completion order; stores
/// compare the outcome's correlation id against the one they are waiting for
/// and discard superseded responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Fresh random correlation id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic correlation id, for replay and tests
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Underlying uuid
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_unique() {
        assert_ne!(CorrelationId::new(), CorrelationId::new());
        assert_eq!(CorrelationId::from_u128(7), CorrelationId::from_u128(7));
    }

    #[test]
    fn entity_ids_serialize_as_numbers() {
        let json = serde_json::to_string(&PostId(42)).unwrap();
        assert_eq!(json, "42");
        let back: PostId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PostId(42));
    }
}
