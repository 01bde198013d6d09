//! End-to-end coordinator workflows against a scripted transport.

mod common;

use common::{Harness, PLACEHOLDER};
use quill_app::stores::SESSION_USER_KEY;
use quill_core::action::{Action, ActionKind};
use quill_core::effects::{HttpMethod, KeyValueStorage, RequestBody, StatusClass, TransportError};
use quill_core::ids::{CorrelationId, PostId, RoomId, UserId};
use quill_core::types::{FailureKind, Upload};
use quill_core::{ChatAction, CommentAction, FeedAction, ProfileAction, SessionAction, SupportAction};
use serde_json::json;

fn login(h: &Harness) -> CorrelationId {
    let correlation = CorrelationId::new();
    h.core
        .dispatch(SessionAction::LoginRequest {
            correlation,
            email: "ada@example.com".into(),
            password: "correct horse".into(),
        })
        .unwrap();
    h.settle();
    correlation
}

#[test]
fn login_with_empty_avatar_yields_one_success_with_placeholder() {
    let h = Harness::new();
    h.transport.respond_json(
        HttpMethod::Post,
        "/auth/login",
        200,
        json!({"token": "t", "user": {"Id": 1, "displayName": "Ada", "email": "ada@example.com", "avatar": ""}}),
    );

    let correlation = login(&h);

    let successes = h.recorder.of_kind(ActionKind::UserLoginSuccess);
    assert_eq!(successes.len(), 1);
    let Action::Session(SessionAction::LoginSuccess { correlation: c, user }) = &successes[0] else {
        panic!("unexpected action {:?}", successes[0]);
    };
    assert_eq!(*c, correlation);
    assert_eq!(user.avatar, PLACEHOLDER);
    assert_eq!(user.name, "Ada");
    assert_eq!(h.core.session().current_user().unwrap().avatar, PLACEHOLDER);
    assert_eq!(
        h.recorder.kinds(),
        vec![ActionKind::LoginRequest, ActionKind::UserLoginSuccess]
    );
}

#[test]
fn unauthorized_invalidates_session_before_the_fail_action() {
    let h = Harness::new();
    h.transport
        .respond_json(HttpMethod::Post, "/auth/login", 200, json!({"id": 1, "name": "Ada"}));
    login(&h);
    assert!(h.core.session().state().is_signed_in());

    h.transport
        .respond_status(HttpMethod::Get, "/posts?page=1&limit=10", 401);
    h.recorder.clear();
    h.core
        .dispatch(FeedAction::LoadRequest {
            correlation: CorrelationId::new(),
            page: 1,
            query: None,
        })
        .unwrap();
    h.settle();

    let invalidated = h.recorder.position(ActionKind::SessionInvalidated).unwrap();
    let failed = h.recorder.position(ActionKind::FeedLoadFail).unwrap();
    assert!(invalidated < failed);
    assert_eq!(h.recorder.count(ActionKind::SessionInvalidated), 1);
    assert!(!h.core.session().state().is_signed_in());

    let Action::Feed(FeedAction::LoadFail { failure, .. }) = &h.recorder.of_kind(ActionKind::FeedLoadFail)[0] else {
        panic!("expected feed failure");
    };
    assert_eq!(failure.kind, FailureKind::Status(StatusClass::Unauthorized));
}

#[test]
fn rejected_login_reports_its_error_after_invalidation() {
    let h = Harness::new();
    h.transport
        .respond_json(HttpMethod::Post, "/auth/login", 200, json!({"id": 1, "name": "Ada"}));
    h.transport.respond_status(HttpMethod::Post, "/auth/login", 401);
    login(&h);
    assert!(h.storage.get(SESSION_USER_KEY).unwrap().is_some());

    h.recorder.clear();
    login(&h);

    assert_eq!(
        h.recorder.kinds(),
        vec![
            ActionKind::LoginRequest,
            ActionKind::SessionInvalidated,
            ActionKind::UserLoginFail,
        ]
    );
    let state = h.core.session().state();
    assert_eq!(state.error.as_deref(), Some("Incorrect email or password."));
    assert!(!state.is_busy());
    assert!(!state.is_signed_in());
    assert!(h.storage.get(SESSION_USER_KEY).unwrap().is_none());
}

#[test]
fn rejected_profile_update_reports_its_error_after_invalidation() {
    let h = Harness::new();
    h.transport
        .respond_json(HttpMethod::Post, "/auth/login", 200, json!({"id": 1, "name": "Ada"}));
    login(&h);
    h.transport.respond_status(HttpMethod::Patch, "/users/1", 401);

    h.core
        .dispatch(ProfileAction::UpdateRequest {
            correlation: CorrelationId::new(),
            user_id: UserId(1),
            name: "Ada Lovelace".into(),
            bio: "Analyst".into(),
            avatar: None,
        })
        .unwrap();
    h.settle();

    assert!(!h.core.session().state().is_signed_in());
    let state = h.core.profile().state();
    assert_eq!(
        state.error.as_deref(),
        Some("Your session has expired. Please sign in again.")
    );
    assert!(state.updating.is_none());
}

#[test]
fn validation_failure_follows_its_request_without_network() {
    let h = Harness::new();
    let correlation = CorrelationId::new();
    h.core
        .dispatch(SessionAction::LoginRequest {
            correlation,
            email: "not-an-email".into(),
            password: String::new(),
        })
        .unwrap();
    // Nothing is published synchronously.
    assert_eq!(h.recorder.kinds(), vec![ActionKind::LoginRequest]);
    h.settle();

    assert_eq!(h.transport.request_count(), 0);
    assert_eq!(
        h.recorder.kinds(),
        vec![ActionKind::LoginRequest, ActionKind::UserLoginFail]
    );
    let state = h.core.session().state();
    assert!(!state.is_busy());
    assert!(state.field_errors.get("email").is_some());
    assert!(state.field_errors.get("password").is_some());
}

#[test]
fn logout_succeeds_even_when_the_server_is_unreachable() {
    let h = Harness::new();
    h.transport
        .respond_json(HttpMethod::Post, "/auth/login", 200, json!({"id": 1}));
    login(&h);

    h.transport.offline(HttpMethod::Post, "/auth/logout");
    h.core
        .dispatch(SessionAction::LogoutRequest {
            correlation: CorrelationId::new(),
        })
        .unwrap();
    h.settle();

    assert_eq!(h.recorder.count(ActionKind::LogoutSuccess), 1);
    assert!(!h.core.session().state().is_signed_in());
}

#[test]
fn post_creation_uploads_first_then_reloads_page_one() {
    let h = Harness::new();
    h.transport
        .respond_json(HttpMethod::Post, "/uploads", 201, json!({"fileUrl": "/media/9.png"}));
    h.transport.respond_json(
        HttpMethod::Post,
        "/posts",
        201,
        json!({"post": {"id": 9, "title": "Hello", "body": "World", "imageUrl": "/media/9.png"}}),
    );
    h.transport.respond_json(
        HttpMethod::Get,
        "/posts?page=1&limit=10",
        200,
        json!({"posts": [{"id": 9, "title": "Hello"}, {"id": 8, "title": "Older"}], "hasMore": false}),
    );

    h.core
        .dispatch(FeedAction::CreateRequest {
            correlation: CorrelationId::new(),
            title: "Hello".into(),
            body: "World".into(),
            image: Some(Upload::new("cat.png", "image/png", vec![1, 2, 3])),
        })
        .unwrap();
    h.settle();

    assert_eq!(
        h.transport.request_lines(),
        vec!["POST /uploads", "POST /posts", "GET /posts?page=1&limit=10"]
    );
    let create = &h.transport.requests_to(HttpMethod::Post, "/posts")[0];
    let RequestBody::Json(body) = &create.body else {
        panic!("post body should be JSON");
    };
    assert_eq!(body["image_url"], "/media/9.png");

    assert_eq!(h.recorder.count(ActionKind::FeedLoadSuccess), 1);
    let feed = h.core.feed().state();
    let ids: Vec<_> = feed.posts.keys().copied().collect();
    assert_eq!(ids, vec![PostId(9), PostId(8)]);
    assert!(!feed.has_more);
}

#[test]
fn failed_upload_aborts_the_comment() {
    let h = Harness::new();
    h.transport.respond_status(HttpMethod::Post, "/uploads", 400);

    h.core
        .dispatch(CommentAction::CreateRequest {
            correlation: CorrelationId::new(),
            post_id: PostId(3),
            text: "see attached".into(),
            attachment: Some(Upload::new("log.txt", "text/plain", b"trace".to_vec())),
        })
        .unwrap();
    h.settle();

    assert_eq!(h.transport.request_lines(), vec!["POST /uploads"]);
    assert_eq!(h.recorder.count(ActionKind::CommentCreateFail), 1);
}

#[test]
fn comment_with_attachment_references_the_uploaded_file() {
    let h = Harness::new();
    h.transport
        .respond_json(HttpMethod::Post, "/uploads", 200, json!({"url": "/files/1"}));
    h.transport.respond_json(
        HttpMethod::Post,
        "/posts/3/comments",
        201,
        json!({"CommentId": 40, "Text": "see attached", "AttachmentUrl": "/files/1"}),
    );

    h.core
        .dispatch(CommentAction::CreateRequest {
            correlation: CorrelationId::new(),
            post_id: PostId(3),
            text: "see attached".into(),
            attachment: Some(Upload::new("log.txt", "text/plain", b"trace".to_vec())),
        })
        .unwrap();
    h.settle();

    let thread = h.core.comments().thread(PostId(3));
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].attachment_url.as_deref(), Some("/files/1"));
    assert_eq!(thread[0].post_id, PostId(3));
}

#[test]
fn list_endpoints_treat_missing_content_as_empty() {
    let h = Harness::new();
    h.transport.respond_status(HttpMethod::Get, "/rooms", 204);
    h.transport
        .respond_status(HttpMethod::Get, "/posts/5/comments", 404);
    h.transport
        .respond_status(HttpMethod::Get, "/support/tickets", 200);

    h.core
        .dispatch(ChatAction::RoomsLoadRequest {
            correlation: CorrelationId::new(),
        })
        .unwrap();
    h.core
        .dispatch(CommentAction::LoadRequest {
            correlation: CorrelationId::new(),
            post_id: PostId(5),
        })
        .unwrap();
    h.core
        .dispatch(SupportAction::HistoryRequest {
            correlation: CorrelationId::new(),
        })
        .unwrap();
    h.settle();

    assert_eq!(h.recorder.count(ActionKind::RoomsLoadSuccess), 1);
    assert_eq!(h.recorder.count(ActionKind::CommentsLoadSuccess), 1);
    assert_eq!(h.recorder.count(ActionKind::TicketHistorySuccess), 1);
    assert!(h.core.chat().state().rooms.is_empty());
    assert!(h.core.comments().thread(PostId(5)).is_empty());
}

#[test]
fn offline_profile_load_keeps_the_previous_profile() {
    let h = Harness::new();
    h.transport.respond_json(
        HttpMethod::Get,
        "/users/7",
        200,
        json!({"user": {"id": 7, "name": "Grace"}, "bio": "Compilers", "followersCount": "12"}),
    );
    h.transport.offline(HttpMethod::Get, "/users/7");

    for _ in 0..2 {
        h.core
            .dispatch(ProfileAction::LoadRequest {
                correlation: CorrelationId::new(),
                user_id: UserId(7),
            })
            .unwrap();
        h.settle();
    }

    let state = h.core.profile().state();
    let profile = state.profile.expect("first load kept");
    assert_eq!(profile.user.name, "Grace");
    assert_eq!(profile.follower_count, 12);
    assert!(state.offline);
    assert!(state.error.is_none());

    let Action::Profile(ProfileAction::LoadFail { failure, .. }) =
        &h.recorder.of_kind(ActionKind::ProfileLoadFail)[0]
    else {
        panic!("expected profile failure");
    };
    assert!(failure.is_offline());
}

#[test]
fn chat_history_fills_in_the_room_id() {
    let h = Harness::new();
    h.transport.respond_json(
        HttpMethod::Get,
        "/rooms/2/messages",
        200,
        json!([{"id": 1, "text": "hi", "userId": 4}]),
    );
    h.core.dispatch(ChatAction::RoomSelect { room_id: RoomId(2) }).unwrap();
    h.core
        .dispatch(ChatAction::HistoryRequest {
            correlation: CorrelationId::new(),
            room_id: RoomId(2),
        })
        .unwrap();
    h.settle();

    let chat = h.core.chat().state();
    let messages: Vec<_> = chat.messages().cloned().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].room_id, RoomId(2));
    assert_eq!(messages[0].avatar, PLACEHOLDER);
}

#[test]
fn timeout_counts_as_offline() {
    let h = Harness::new();
    h.transport.fail(
        HttpMethod::Post,
        "/support/tickets",
        TransportError::Timeout { timeout_ms: 5_000 },
    );
    h.core
        .dispatch(SupportAction::TicketSubmitRequest {
            correlation: CorrelationId::new(),
            subject: "Broken".into(),
            body: "It broke".into(),
        })
        .unwrap();
    h.settle();

    let Action::Support(SupportAction::TicketSubmitFail { failure, .. }) =
        &h.recorder.of_kind(ActionKind::TicketSubmitFail)[0]
    else {
        panic!("expected ticket failure");
    };
    assert!(failure.is_offline());
    assert!(h.core.support().state().error.is_some());
}

#[test]
fn shutdown_discards_in_flight_outcomes() {
    let h = Harness::new();
    h.transport.respond_json(HttpMethod::Get, "/rooms", 200, json!([{"id": 1}]));
    h.core
        .dispatch(ChatAction::RoomsLoadRequest {
            correlation: CorrelationId::new(),
        })
        .unwrap();
    h.core.shutdown();
    h.settle();

    assert_eq!(h.transport.request_count(), 1);
    assert_eq!(h.recorder.count(ActionKind::RoomsLoadSuccess), 0);
}
