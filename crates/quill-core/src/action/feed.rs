use super::ActionKind;
use crate::ids::{CorrelationId, PostId};
use crate::types::{Failure, Post, Upload};
use serde::{Deserialize, Serialize};

/// Paginated, searchable post feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedAction {
    /// Page numbers start at 1; loading page 1 replaces the feed
    LoadRequest {
        correlation: CorrelationId,
        page: u32,
        query: Option<String>,
    },
    LoadSuccess {
        correlation: CorrelationId,
        page: u32,
        posts: Vec<Post>,
        has_more: bool,
    },
    LoadFail {
        correlation: CorrelationId,
        failure: Failure,
    },
    CreateRequest {
        correlation: CorrelationId,
        title: String,
        body: String,
        image: Option<Upload>,
    },
    CreateSuccess {
        correlation: CorrelationId,
        post: Post,
    },
    CreateFail {
        correlation: CorrelationId,
        failure: Failure,
    },
    DeleteRequest {
        correlation: CorrelationId,
        post_id: PostId,
    },
    DeleteSuccess {
        correlation: CorrelationId,
        post_id: PostId,
    },
    DeleteFail {
        correlation: CorrelationId,
        post_id: PostId,
        failure: Failure,
    },
}

impl FeedAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::LoadRequest { .. } => ActionKind::FeedLoadRequest,
            Self::LoadSuccess { .. } => ActionKind::FeedLoadSuccess,
            Self::LoadFail { .. } => ActionKind::FeedLoadFail,
            Self::CreateRequest { .. } => ActionKind::PostCreateRequest,
            Self::CreateSuccess { .. } => ActionKind::PostCreateSuccess,
            Self::CreateFail { .. } => ActionKind::PostCreateFail,
            Self::DeleteRequest { .. } => ActionKind::PostDeleteRequest,
            Self::DeleteSuccess { .. } => ActionKind::PostDeleteSuccess,
            Self::DeleteFail { .. } => ActionKind::PostDeleteFail,
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
