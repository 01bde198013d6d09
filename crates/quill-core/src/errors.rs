//! Unified error type for the Quill core
//!
//! Component boundaries never panic or throw; failures surface either as a
//! `Result` from a library call or as a `*Fail` action on the bus. This type
//! covers the former.

use serde::{Deserialize, Serialize};

/// Unified error type for core operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum QuillError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Durable client storage failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl QuillError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Standard result type for core operations
pub type QuillResult<T> = Result<T, QuillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category_and_message() {
        let err = QuillError::storage("quota exceeded");
        assert_eq!(err.to_string(), "Storage error: quota exceeded");
    }

    #[test]
    fn serde_json_errors_become_serialization_errors() {
        let err: QuillError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, QuillError::Serialization { .. }));
    }
}
