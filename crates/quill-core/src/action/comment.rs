use super::ActionKind;
use crate::ids::{CommentId, CorrelationId, PostId};
use crate::types::{Comment, Failure, Upload};
use serde::{Deserialize, Serialize};

/// Comment threads under posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommentAction {
    LoadRequest {
        correlation: CorrelationId,
        post_id: PostId,
    },
    LoadSuccess {
        correlation: CorrelationId,
        post_id: PostId,
        comments: Vec<Comment>,
    },
    LoadFail {
        correlation: CorrelationId,
        post_id: PostId,
        failure: Failure,
    },
    /// The attachment, if any, is uploaded before the comment is created
    CreateRequest {
        correlation: CorrelationId,
        post_id: PostId,
        text: String,
        attachment: Option<Upload>,
    },
    CreateSuccess {
        correlation: CorrelationId,
        comment: Comment,
    },
    CreateFail {
        correlation: CorrelationId,
        post_id: PostId,
        failure: Failure,
    },
    DeleteRequest {
        correlation: CorrelationId,
        post_id: PostId,
        comment_id: CommentId,
    },
    DeleteSuccess {
        correlation: CorrelationId,
        post_id: PostId,
        comment_id: CommentId,
    },
    DeleteFail {
        correlation: CorrelationId,
        post_id: PostId,
        failure: Failure,
    },
}

impl CommentAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::LoadRequest { .. } => ActionKind::CommentsLoadRequest,
            Self::LoadSuccess { .. } => ActionKind::CommentsLoadSuccess,
            Self::LoadFail { .. } => ActionKind::CommentsLoadFail,
            Self::CreateRequest { .. } => ActionKind::CommentCreateRequest,
            Self::CreateSuccess { .. } => ActionKind::CommentCreateSuccess,
            Self::CreateFail { .. } => ActionKind::CommentCreateFail,
            Self::DeleteRequest { .. } => ActionKind::CommentDeleteRequest,
            Self::DeleteSuccess { .. } => ActionKind::CommentDeleteSuccess,
            Self::DeleteFail { .. } => ActionKind::CommentDeleteFail,
        }
    }

    pub fn correlation(&self) -> CorrelationId {
        match self {
            Self::LoadRequest { correlation, .. }
            | Self::LoadSuccess { correlation, .. }
            | Self::LoadFail { correlation, .. }
            | Self::CreateRequest { correlation, .. }
            | Self::CreateSuccess { correlation, .. }
            | Self::CreateFail { correlation, .. }
            | Self::DeleteRequest { correlation, .. }
            | Self::DeleteSuccess { correlation, .. }
            | Self::DeleteFail { correlation, .. } => *correlation,
        }
    }
}
