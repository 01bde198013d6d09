use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// Account as seen by the client
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    /// Server id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Avatar image path, never empty once normalized
    pub avatar: String,
}

/// Public profile page data
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Profile owner
    pub user: User,
    /// Free-form biography
    pub bio: String,
    /// Number of published posts
    pub post_count: u64,
    /// Number of followers
    pub follower_count: u64,
    /// Whether the session user follows this profile
    pub following: bool,
}
