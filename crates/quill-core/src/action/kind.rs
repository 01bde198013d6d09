//! Flat action kinds
//!
//! Every action variant maps to exactly one `ActionKind`. Kinds are what the
//! bus routes on, and each has a stable SCREAMING_SNAKE token used in logs
//! and by non-Rust collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! action_kinds {
    ($($(#[$meta:meta])* $variant:ident => $token:literal,)+) => {
        /// Routing key of an action
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ActionKind {
            $($(#[$meta])* $variant,)+
        }

        impl ActionKind {
            /// Every kind, in declaration order
            pub const ALL: &'static [ActionKind] = &[$(ActionKind::$variant,)+];

            /// Stable wire token for this kind
            pub fn token(self) -> &'static str {
                match self {
                    $(ActionKind::$variant => $token,)+
                }
            }

            /// Parse a wire token
            pub fn parse(token: &str) -> Option<Self> {
                Some(match token {
                    $($token => ActionKind::$variant,)+
                    _ => return None,
                })
            }
        }
    };
}

action_kinds! {
    // Session
    LoginRequest => "LOGIN_REQUEST",
    UserLoginSuccess => "USER_LOGIN_SUCCESS",
    UserLoginFail => "USER_LOGIN_FAIL",
    RegisterRequest => "REGISTER_REQUEST",
    RegisterSuccess => "REGISTER_SUCCESS",
    RegisterFail => "REGISTER_FAIL",
    LogoutRequest => "LOGOUT_REQUEST",
    LogoutSuccess => "LOGOUT_SUCCESS",
    SessionRestored => "SESSION_RESTORED",
    /// Global: any request came back 401
    SessionInvalidated => "SESSION_INVALIDATED",

    // Profile
    ProfileLoadRequest => "PROFILE_LOAD_REQUEST",
    ProfileLoadSuccess => "PROFILE_LOAD_SUCCESS",
    ProfileLoadFail => "PROFILE_LOAD_FAIL",
    ProfileUpdateRequest => "PROFILE_UPDATE_REQUEST",
    ProfileUpdateSuccess => "PROFILE_UPDATE_SUCCESS",
    ProfileUpdateFail => "PROFILE_UPDATE_FAIL",

    // Feed
    FeedLoadRequest => "FEED_LOAD_REQUEST",
    FeedLoadSuccess => "FEED_LOAD_SUCCESS",
    FeedLoadFail => "FEED_LOAD_FAIL",
    PostCreateRequest => "POST_CREATE_REQUEST",
    PostCreateSuccess => "POST_CREATE_SUCCESS",
    PostCreateFail => "POST_CREATE_FAIL",
    PostDeleteRequest => "POST_DELETE_REQUEST",
    PostDeleteSuccess => "POST_DELETE_SUCCESS",
    PostDeleteFail => "POST_DELETE_FAIL",

    // Comments
    CommentsLoadRequest => "COMMENTS_LOAD_REQUEST",
    CommentsLoadSuccess => "COMMENTS_LOAD_SUCCESS",
    CommentsLoadFail => "COMMENTS_LOAD_FAIL",
    CommentCreateRequest => "COMMENT_CREATE_REQUEST",
    CommentCreateSuccess => "COMMENT_CREATE_SUCCESS",
    CommentCreateFail => "COMMENT_CREATE_FAIL",
    CommentDeleteRequest => "COMMENT_DELETE_REQUEST",
    CommentDeleteSuccess => "COMMENT_DELETE_SUCCESS",
    CommentDeleteFail => "COMMENT_DELETE_FAIL",

    // Chat
    RoomsLoadRequest => "ROOMS_LOAD_REQUEST",
    RoomsLoadSuccess => "ROOMS_LOAD_SUCCESS",
    RoomsLoadFail => "ROOMS_LOAD_FAIL",
    RoomSelect => "ROOM_SELECT",
    ChatHistoryRequest => "CHAT_HISTORY_REQUEST",
    ChatHistorySuccess => "CHAT_HISTORY_SUCCESS",
    ChatHistoryFail => "CHAT_HISTORY_FAIL",
    MessageSend => "MESSAGE_SEND",
    MessageReceived => "MESSAGE_RECEIVED",
    ChannelStatusChanged => "CHANNEL_STATUS_CHANGED",

    // Support widget
    TicketSubmitRequest => "TICKET_SUBMIT_REQUEST",
    TicketSubmitSuccess => "TICKET_SUBMIT_SUCCESS",
    TicketSubmitFail => "TICKET_SUBMIT_FAIL",
    TicketHistoryRequest => "TICKET_HISTORY_REQUEST",
    TicketHistorySuccess => "TICKET_HISTORY_SUCCESS",
    TicketHistoryFail => "TICKET_HISTORY_FAIL",
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_kind_round_trips_through_its_token() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::parse(kind.token()), Some(*kind));
        }
    }

    #[test]
    fn tokens_are_unique() {
        let tokens: HashSet<_> = ActionKind::ALL.iter().map(|k| k.token()).collect();
        assert_eq!(tokens.len(), ActionKind::ALL.len());
    }

    #[test]
    fn unknown_token_is_rejected() {
        assert_eq!(ActionKind::parse("LOGIN_request"), None);
    }
}
