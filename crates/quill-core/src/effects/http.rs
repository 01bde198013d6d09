//! Network effect interface
//!
//! The coordinator depends only on one generic request function returning
//! `{ status, data?, message? }`. Which HTTP client sits behind it (browser
//! `fetch`, a native client, a stub) is the host's business.

use crate::types::Upload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(method)
    }
}

/// Request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body
    Empty,
    /// JSON document
    Json(Value),
    /// Single-file multipart form, field name `file`
    Multipart(Upload),
}

/// One request issued by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Path relative to the configured API base, including any query string
    pub path: String,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Delete,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn json(method: HttpMethod, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Json(body),
        }
    }

    pub fn upload(path: impl Into<String>, upload: Upload) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: RequestBody::Multipart(upload),
        }
    }
}

/// Transport-level response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Decoded JSON body, if any
    pub data: Option<Value>,
    /// Server-provided message, if any
    pub message: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, data: Option<Value>) -> Self {
        Self {
            status,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn class(&self) -> StatusClass {
        StatusClass::from_status(self.status)
    }
}

/// Errors raised by the transport itself, before any status code exists
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server could not be reached (offline, DNS, connection refused)
    #[error("network unreachable: {0}")]
    Unreachable(String),
    /// The request did not complete in time
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Elapsed time budget
        timeout_ms: u64,
    },
    /// The response body could not be decoded
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

/// The small, fixed set of status classes the coordinator distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// 2xx other than 204
    Success,
    /// 204
    NoContent,
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// Anything else
    Other,
}

impl StatusClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            204 => Self::NoContent,
            200..=299 => Self::Success,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            409 => Self::Conflict,
            _ => Self::Other,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::NoContent)
    }
}

/// Generic request function.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue one request and return its status and decoded body.
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes() {
        assert_eq!(StatusClass::from_status(200), StatusClass::Success);
        assert_eq!(StatusClass::from_status(201), StatusClass::Success);
        assert_eq!(StatusClass::from_status(204), StatusClass::NoContent);
        assert_eq!(StatusClass::from_status(400), StatusClass::BadRequest);
        assert_eq!(StatusClass::from_status(401), StatusClass::Unauthorized);
        assert_eq!(StatusClass::from_status(403), StatusClass::Other);
        assert_eq!(StatusClass::from_status(404), StatusClass::NotFound);
        assert_eq!(StatusClass::from_status(409), StatusClass::Conflict);
        assert_eq!(StatusClass::from_status(500), StatusClass::Other);
        assert!(StatusClass::NoContent.is_success());
        assert!(!StatusClass::Conflict.is_success());
    }
}
