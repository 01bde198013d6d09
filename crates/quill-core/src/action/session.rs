use super::ActionKind;
use crate::ids::CorrelationId;
use crate::types::{Failure, User};
use serde::{Deserialize, Serialize};

/// Login, registration and session lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionAction {
    LoginRequest {
        correlation: CorrelationId,
        email: String,
        password: String,
    },
    LoginSuccess {
        correlation: CorrelationId,
        user: User,
    },
    LoginFail {
        correlation: CorrelationId,
        failure: Failure,
    },
    RegisterRequest {
        correlation: CorrelationId,
        name: String,
        email: String,
        password: String,
    },
    RegisterSuccess {
        correlation: CorrelationId,
        user: User,
    },
    RegisterFail {
        correlation: CorrelationId,
        failure: Failure,
    },
    LogoutRequest {
        correlation: CorrelationId,
    },
    LogoutSuccess {
        correlation: CorrelationId,
    },
    /// A persisted, unexpired session was found at boot
    Restored { user: User },
    /// The server rejected our credentials; every session-aware store resets
    Invalidated,
}

impl SessionAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::LoginRequest { .. } => ActionKind::LoginRequest,
            Self::LoginSuccess { .. } => ActionKind::UserLoginSuccess,
            Self::LoginFail { .. } => ActionKind::UserLoginFail,
            Self::RegisterRequest { .. } => ActionKind::RegisterRequest,
            Self::RegisterSuccess { .. } => ActionKind::RegisterSuccess,
            Self::RegisterFail { .. } => ActionKind::RegisterFail,
            Self::LogoutRequest { .. } => ActionKind::LogoutRequest,
            Self::LogoutSuccess { .. } => ActionKind::LogoutSuccess,
            Self::Restored { .. } => ActionKind::SessionRestored,
            Self::Invalidated => ActionKind::SessionInvalidated,
        }
    }

    pub fn correlation(&self) -> Option<CorrelationId> {
        match self {
            Self::LoginRequest { correlation, .. }
            | Self::LoginSuccess { correlation, .. }
            | Self::LoginFail { correlation, .. }
            | Self::RegisterRequest { correlation, .. }
            | Self::RegisterSuccess { correlation, .. }
            | Self::RegisterFail { correlation, .. }
            | Self::LogoutRequest { correlation }
            | Self::LogoutSuccess { correlation } => Some(*correlation),
            Self::Restored { .. } | Self::Invalidated => None,
        }
    }
}
