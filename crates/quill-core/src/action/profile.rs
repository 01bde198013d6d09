use super::ActionKind;
use crate::ids::{CorrelationId, UserId};
use crate::types::{Failure, Profile, Upload};
use serde::{Deserialize, Serialize};

/// Profile viewing and editing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProfileAction {
    LoadRequest {
        correlation: CorrelationId,
        user_id: UserId,
    },
    LoadSuccess {
        correlation: CorrelationId,
        profile: Profile,
    },
    /// `failure.kind` is `Offline` when the server was unreachable
    LoadFail {
        correlation: CorrelationId,
        user_id: UserId,
        failure: Failure,
    },
    UpdateRequest {
        correlation: CorrelationId,
        user_id: UserId,
        name: String,
        bio: String,
        avatar: Option<Upload>,
    },
    UpdateSuccess {
        correlation: CorrelationId,
        profile: Profile,
    },
    UpdateFail {
        correlation: CorrelationId,
        failure: Failure,
    },
}

impl ProfileAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::LoadRequest { .. } => ActionKind::ProfileLoadRequest,
            Self::LoadSuccess { .. } => ActionKind::ProfileLoadSuccess,
            Self::LoadFail { .. } => ActionKind::ProfileLoadFail,
            Self::UpdateRequest { .. } => ActionKind::ProfileUpdateRequest,
            Self::UpdateSuccess { .. } => ActionKind::ProfileUpdateSuccess,
            Self::UpdateFail { .. } => ActionKind::ProfileUpdateFail,
        }
    }

    pub fn correlation(&self) -> CorrelationId {
        match self {
            Self::LoadRequest { correlation, .. }
            | Self::LoadSuccess { correlation, .. }
            | Self::LoadFail { correlation, .. }
            | Self::UpdateRequest { correlation, .. }
            | Self::UpdateSuccess { correlation, .. }
            | Self::UpdateFail { correlation, .. } => *correlation,
        }
    }
}
