use super::User;
use crate::ids::{CommentId, PostId};
use serde::{Deserialize, Serialize};

/// A published post in the feed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: User,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub comment_count: u64,
}

/// A comment on a post, optionally with an uploaded attachment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: User,
    pub text: String,
    pub attachment_url: Option<String>,
    pub created_at: String,
}
