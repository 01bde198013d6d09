use crate::effects::StatusClass;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field-level validation messages, in the order the fields were checked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message for a field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Why an operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "status")]
pub enum FailureKind {
    /// Rejected locally before any network call
    Validation,
    /// The server answered with a non-success status class
    Status(StatusClass),
    /// The transport could not reach the server at all
    Offline,
}

/// Payload of every `*Fail` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    /// Human-readable summary suitable for a toast or inline error
    pub message: String,
    #[serde(default, skip_serializing_if = "FieldErrors::is_empty")]
    pub field_errors: FieldErrors,
}

impl Failure {
    pub fn validation(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self {
            kind: FailureKind::Validation,
            message: message.into(),
            field_errors,
        }
    }

    pub fn status(class: StatusClass, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Status(class),
            message: message.into(),
            field_errors: FieldErrors::default(),
        }
    }

    pub fn offline(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Offline,
            message: message.into(),
            field_errors: FieldErrors::default(),
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.kind, FailureKind::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_keep_first_message_and_order() {
        let mut errors = FieldErrors::new();
        errors.add("password", "required");
        errors.add("email", "invalid");
        errors.add("password", "too short");

        let collected: Vec<_> = errors.iter().collect();
        assert_eq!(collected, vec![("password", "required"), ("email", "invalid")]);
    }

    #[test]
    fn failure_serializes_without_empty_field_errors() {
        let failure = Failure::offline("no network");
        let json = serde_json::to_value(&failure).unwrap();
        assert!(json.get("field_errors").is_none());
        assert_eq!(json["kind"]["kind"], "offline");
    }
}
