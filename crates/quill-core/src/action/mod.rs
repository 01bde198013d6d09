//! # Actions
//!
//! The bus vocabulary. An `Action` is a closed tagged union with one nested
//! enum per feature area, so a payload can never disagree with its kind:
//!
//! ```text
//! Action::Session(SessionAction::LoginRequest { .. })  -> LOGIN_REQUEST
//! Action::Feed(FeedAction::LoadSuccess { .. })          -> FEED_LOAD_SUCCESS
//! ```
//!
//! Request actions carry a `CorrelationId`; the coordinator copies it onto
//! the matching success or failure action.

mod chat;
mod comment;
mod feed;
mod kind;
mod profile;
mod session;
mod support;

pub use chat::ChatAction;
pub use comment::CommentAction;
pub use feed::FeedAction;
pub use kind::ActionKind;
pub use profile::ProfileAction;
pub use session::SessionAction;
pub use support::SupportAction;

use crate::ids::CorrelationId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named event with its payload, the unit of communication on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Session(SessionAction),
    Profile(ProfileAction),
    Feed(FeedAction),
    Comment(CommentAction),
    Chat(ChatAction),
    Support(SupportAction),
}

impl Action {
    /// Routing kind
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Session(a) => a.kind(),
            Self::Profile(a) => a.kind(),
            Self::Feed(a) => a.kind(),
            Self::Comment(a) => a.kind(),
            Self::Chat(a) => a.kind(),
            Self::Support(a) => a.kind(),
        }
    }

    /// Stable token, e.g. `USER_LOGIN_SUCCESS`
    pub fn token(&self) -> &'static str {
        self.kind().token()
    }

    /// Correlation id, for request/outcome actions
    pub fn correlation(&self) -> Option<CorrelationId> {
        match self {
            Self::Session(a) => a.correlation(),
            Self::Profile(a) => Some(a.correlation()),
            Self::Feed(a) => Some(a.correlation()),
            Self::Comment(a) => Some(a.correlation()),
            Self::Chat(a) => a.correlation(),
            Self::Support(a) => Some(a.correlation()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.correlation() {
            Some(correlation) => write!(f, "{}#{}", self.token(), correlation),
            None => f.write_str(self.token()),
        }
    }
}

macro_rules! impl_from_feature {
    ($($feature:ident => $variant:ident),+ $(,)?) => {
        $(
            impl From<$feature> for Action {
                fn from(action: $feature) -> Self {
                    Action::$variant(action)
                }
            }
        )+
    };
}

impl_from_feature! {
    SessionAction => Session,
    ProfileAction => Profile,
    FeedAction => Feed,
    CommentAction => Comment,
    ChatAction => Chat,
    SupportAction => Support,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{PostId, RoomId};

    #[test]
    fn kind_follows_the_variant() {
        let action: Action = FeedAction::DeleteRequest {
            correlation: CorrelationId::from_u128(1),
            post_id: PostId(3),
        }
        .into();
        assert_eq!(action.kind(), ActionKind::PostDeleteRequest);
        assert_eq!(action.token(), "POST_DELETE_REQUEST");
        assert_eq!(action.correlation(), Some(CorrelationId::from_u128(1)));
    }

    #[test]
    fn uncorrelated_actions() {
        let action: Action = ChatAction::RoomSelect { room_id: RoomId(9) }.into();
        assert_eq!(action.correlation(), None);
        assert_eq!(action.to_string(), "ROOM_SELECT");

        let action: Action = SessionAction::Invalidated.into();
        assert_eq!(action.kind(), ActionKind::SessionInvalidated);
    }

    #[test]
    fn actions_serialize_for_diagnostics() {
        let action: Action = ChatAction::MessageSend {
            text: "hi".to_string(),
        }
        .into();
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
