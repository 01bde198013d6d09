//! Response classification
//!
//! Every network call ends in exactly one outcome. The coordinator sorts a
//! transport result into a success body or a `Failure` carrying a
//! feature-specific message for the status class.

use super::normalize;
use quill_core::effects::{HttpResponse, StatusClass, TransportError};
use quill_core::types::Failure;
use serde_json::Value;

const OFFLINE_MESSAGE: &str = "You appear to be offline. Check your connection and try again.";
const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

/// Network operations the coordinator performs, for message selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    Logout,
    LoadProfile,
    UpdateProfile,
    Upload,
    LoadFeed,
    CreatePost,
    DeletePost,
    LoadComments,
    CreateComment,
    DeleteComment,
    LoadRooms,
    LoadChatHistory,
    SubmitTicket,
    LoadTickets,
}

impl Operation {
    /// Message shown for a failed status class.
    pub fn message(self, class: StatusClass) -> &'static str {
        use Operation::*;
        use StatusClass::*;
        match (self, class) {
            (Login, BadRequest) => "Please enter a valid email and password.",
            (Login, Unauthorized) => "Incorrect email or password.",
            (Login, NotFound) => "No account exists for that email.",
            (Register, BadRequest) => "Some registration details are invalid.",
            (Register, Conflict) => "An account with that email already exists.",
            (LoadProfile, NotFound) => "This profile does not exist.",
            (UpdateProfile, BadRequest) => "Some profile details are invalid.",
            (UpdateProfile, Conflict) => "That name is already taken.",
            (Upload, BadRequest) => "The file could not be uploaded. Check its type and size.",
            (CreatePost, BadRequest) => "The post could not be published. Check the highlighted fields.",
            (DeletePost, NotFound) => "This post has already been deleted.",
            (CreateComment, BadRequest) => "The comment could not be posted.",
            (CreateComment, NotFound) => "This post no longer exists.",
            (DeleteComment, NotFound) => "This comment has already been deleted.",
            (LoadChatHistory, NotFound) => "This room no longer exists.",
            (SubmitTicket, BadRequest) => "The ticket could not be submitted. Check the highlighted fields.",
            (SubmitTicket, Conflict) => "This ticket was already submitted.",
            (_, Unauthorized) => SESSION_EXPIRED,
            (_, Conflict) => "This change conflicts with a newer update. Reload and try again.",
            (_, NotFound) => "The requested item could not be found.",
            (LoadFeed | LoadComments | LoadRooms | LoadChatHistory | LoadTickets, _) => {
                "Could not load data. Please try again."
            }
            (LoadProfile, _) => "Could not load the profile. Please try again.",
            (Logout, _) => "Could not sign out cleanly.",
            _ => "Something went wrong. Please try again.",
        }
    }

    /// Failure for a transport-level error.
    pub fn transport_failure(self, error: &TransportError) -> Failure {
        match error {
            TransportError::Unreachable(_) | TransportError::Timeout { .. } => {
                Failure::offline(OFFLINE_MESSAGE)
            }
            TransportError::InvalidBody(_) => {
                Failure::status(StatusClass::Other, self.message(StatusClass::Other))
            }
        }
    }

    /// Failure for a non-success response. 400 bodies contribute field errors.
    pub fn status_failure(self, response: &HttpResponse) -> Failure {
        let class = response.class();
        let mut failure = Failure::status(class, self.message(class));
        if class == StatusClass::BadRequest {
            failure.field_errors = normalize::field_errors(response.data.as_ref());
            if failure.field_errors.is_empty() {
                if let Some(message) = response
                    .message
                    .clone()
                    .or_else(|| normalize::server_message(response.data.as_ref()))
                {
                    failure.message = message;
                }
            }
        }
        failure
    }

    /// Body of a single-entity response.
    pub fn entity(self, result: Result<HttpResponse, TransportError>) -> Result<Value, Failure> {
        let response = result.map_err(|e| self.transport_failure(&e))?;
        if response.class().is_success() {
            Ok(response.data.unwrap_or(Value::Null))
        } else {
            Err(self.status_failure(&response))
        }
    }

    /// Body of a list response. An empty body, 204 and 404 all mean "no items".
    pub fn list(self, result: Result<HttpResponse, TransportError>) -> Result<Option<Value>, Failure> {
        let response = result.map_err(|e| self.transport_failure(&e))?;
        match response.class() {
            StatusClass::Success => Ok(response.data.filter(|body| !is_empty_body(body))),
            StatusClass::NoContent | StatusClass::NotFound => Ok(None),
            _ => Err(self.status_failure(&response)),
        }
    }

    /// Completion of a call whose body is irrelevant.
    pub fn done(self, result: Result<HttpResponse, TransportError>) -> Result<(), Failure> {
        self.entity(result).map(|_| ())
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// True when the failure means the session is no longer valid.
pub fn is_unauthorized(failure: &Failure) -> bool {
    failure.kind == quill_core::types::FailureKind::Status(StatusClass::Unauthorized)
}
