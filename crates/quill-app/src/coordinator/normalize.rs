//! Server payload normalization
//!
//! The API is inconsistent about field naming: the same field may arrive as
//! `created_at`, `createdAt` or `CreatedAt`, ids may be numbers or numeric
//! strings, and single entities may or may not be wrapped in a `user` or
//! `data` envelope. Everything here is total: any JSON value yields a
//! canonical value, with defaults for whatever is missing.

use quill_core::ids::{CommentId, MessageId, PostId, RoomId, TicketId, UserId};
use quill_core::types::{
    Comment, FieldErrors, Message, Post, Profile, Room, Ticket, TicketStatus, User,
};
use serde_json::Value;

/// Keys under which list endpoints may nest their items
const LIST_KEYS: &[&str] = &["items", "data", "results"];

/// Converts raw server JSON into canonical domain types.
#[derive(Debug, Clone)]
pub struct Normalizer {
    placeholder_avatar: String,
}

impl Normalizer {
    pub fn new(placeholder_avatar: impl Into<String>) -> Self {
        Self {
            placeholder_avatar: placeholder_avatar.into(),
        }
    }

    pub fn placeholder_avatar(&self) -> &str {
        &self.placeholder_avatar
    }

    fn avatar(&self, raw: String) -> String {
        if raw.trim().is_empty() {
            self.placeholder_avatar.clone()
        } else {
            raw
        }
    }

    pub fn user(&self, value: &Value) -> User {
        let value = unwrap_entity(value, "user");
        User {
            id: UserId(id(value, &["id", "user_id"])),
            name: text(value, &["name", "display_name", "username"]),
            email: text(value, &["email"]),
            avatar: self.avatar(text(value, &["avatar", "avatar_url", "photo"])),
        }
    }

    /// Profile payloads either nest the user or inline its fields.
    pub fn profile(&self, value: &Value) -> Profile {
        let value = unwrap_entity(value, "profile");
        let user = match lookup(value, &["user"]) {
            Some(nested) if nested.is_object() => self.user(nested),
            _ => self.user(value),
        };
        Profile {
            user,
            bio: text(value, &["bio", "about"]),
            post_count: count(value, &["post_count", "posts_count"]),
            follower_count: count(value, &["follower_count", "followers_count", "followers"]),
            following: flag(value, &["following", "is_following"]),
        }
    }

    pub fn post(&self, value: &Value) -> Post {
        let value = unwrap_entity(value, "post");
        Post {
            id: PostId(id(value, &["id", "post_id"])),
            author: self.author(value),
            title: text(value, &["title"]),
            body: text(value, &["body", "content", "text"]),
            image_url: optional_text(value, &["image_url", "image"]),
            created_at: text(value, &["created_at", "created", "timestamp"]),
            comment_count: count(value, &["comment_count", "comments_count"]),
        }
    }

    pub fn comment(&self, value: &Value) -> Comment {
        let value = unwrap_entity(value, "comment");
        Comment {
            id: CommentId(id(value, &["id", "comment_id"])),
            post_id: PostId(id(value, &["post_id", "post"])),
            author: self.author(value),
            text: text(value, &["text", "body", "content"]),
            attachment_url: optional_text(value, &["attachment_url", "attachment", "file_url"]),
            created_at: text(value, &["created_at", "created", "timestamp"]),
        }
    }

    pub fn room(&self, value: &Value) -> Room {
        Room {
            id: RoomId(id(value, &["id", "room_id"])),
            name: text(value, &["name", "title"]),
        }
    }

    pub fn message(&self, value: &Value) -> Message {
        Message {
            id: MessageId(id(value, &["id", "message_id"])),
            room_id: RoomId(id(value, &["room_id", "room"])),
            user_id: UserId(id(value, &["user_id", "author_id"])),
            avatar: self.avatar(text(value, &["avatar", "avatar_url"])),
            text: text(value, &["text", "body", "content"]),
            created_at: text(value, &["created_at", "created", "timestamp"]),
        }
    }

    pub fn ticket(&self, value: &Value) -> Ticket {
        let value = unwrap_entity(value, "ticket");
        Ticket {
            id: TicketId(id(value, &["id", "ticket_id"])),
            subject: text(value, &["subject", "title"]),
            body: text(value, &["body", "message", "description"]),
            status: TicketStatus::parse_lenient(&text(value, &["status", "state"])),
            created_at: text(value, &["created_at", "created", "timestamp"]),
        }
    }

    /// Nested author object, or a bare author id with placeholder fields.
    fn author(&self, value: &Value) -> User {
        match lookup(value, &["author", "user"]) {
            Some(nested) if nested.is_object() => self.user(nested),
            _ => User {
                id: UserId(id(value, &["author_id", "user_id"])),
                name: text(value, &["author_name"]),
                email: String::new(),
                avatar: self.avatar(text(value, &["author_avatar"])),
            },
        }
    }

    pub fn posts(&self, body: Option<&Value>) -> Vec<Post> {
        list(body, &["posts"]).into_iter().map(|v| self.post(v)).collect()
    }

    pub fn comments(&self, body: Option<&Value>) -> Vec<Comment> {
        list(body, &["comments"])
            .into_iter()
            .map(|v| self.comment(v))
            .collect()
    }

    pub fn rooms(&self, body: Option<&Value>) -> Vec<Room> {
        list(body, &["rooms"]).into_iter().map(|v| self.room(v)).collect()
    }

    pub fn messages(&self, body: Option<&Value>) -> Vec<Message> {
        list(body, &["messages"])
            .into_iter()
            .map(|v| self.message(v))
            .collect()
    }

    pub fn tickets(&self, body: Option<&Value>) -> Vec<Ticket> {
        list(body, &["tickets"])
            .into_iter()
            .map(|v| self.ticket(v))
            .collect()
    }
}

/// Explicit pagination flag, if the server sent one.
pub fn has_more(body: Option<&Value>) -> Option<bool> {
    let body = body?;
    if let Some(value) = lookup(body, &["has_more", "more"]) {
        return Some(as_flag(value));
    }
    lookup(body, &["next_page", "next"]).map(|next| !next.is_null())
}

/// URL of a freshly uploaded file.
pub fn upload_url(body: Option<&Value>) -> Option<String> {
    let body = unwrap_entity(body?, "file");
    optional_text(body, &["url", "file_url", "location", "path"])
}

/// Human-readable message from an error body.
pub fn server_message(body: Option<&Value>) -> Option<String> {
    optional_text(body?, &["message", "error", "detail"])
}

/// Per-field messages from a 400 body.
///
/// Accepts `{"errors": {"field": "msg"}}`, `{"field_errors": {...}}` and
/// list values (`{"field": ["msg", ...]}`, first message wins).
pub fn field_errors(body: Option<&Value>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let Some(map) = body
        .and_then(|b| lookup(b, &["errors", "field_errors"]))
        .and_then(Value::as_object)
    else {
        return errors;
    };
    for (field, message) in map {
        let message = match message {
            Value::Array(items) => items.first().and_then(scalar_text),
            other => scalar_text(other),
        };
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            errors.add(snake_case(field), message);
        }
    }
    errors
}

fn unwrap_entity<'a>(value: &'a Value, key: &str) -> &'a Value {
    for wrapper in [key, "data"] {
        if let Some(inner) = lookup(value, &[wrapper]) {
            if inner.is_object() {
                return inner;
            }
        }
    }
    value
}

fn list<'a>(body: Option<&'a Value>, keys: &[&str]) -> Vec<&'a Value> {
    let Some(body) = body else {
        return Vec::new();
    };
    if let Value::Array(items) = body {
        return items.iter().collect();
    }
    keys.iter()
        .chain(LIST_KEYS)
        .find_map(|key| lookup(body, &[key]).and_then(Value::as_array))
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

/// First non-null value under any spelling of any of `names`.
fn lookup<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let object = value.as_object()?;
    names.iter().find_map(|name| {
        spellings(name)
            .iter()
            .find_map(|key| object.get(key).filter(|v| !v.is_null()))
    })
}

/// `snake_case`, `camelCase` and `PascalCase` forms of a snake_case name.
fn spellings(snake: &str) -> [String; 3] {
    let mut camel = String::with_capacity(snake.len());
    let mut upper_next = false;
    for c in snake.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            camel.extend(c.to_uppercase());
            upper_next = false;
        } else {
            camel.push(c);
        }
    }
    let mut chars = camel.chars();
    let pascal = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    [snake.to_string(), camel, pascal]
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text(value: &Value, names: &[&str]) -> String {
    lookup(value, names)
        .and_then(scalar_text)
        .unwrap_or_default()
}

fn optional_text(value: &Value, names: &[&str]) -> Option<String> {
    Some(text(value, names)).filter(|s| !s.trim().is_empty())
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn id(value: &Value, names: &[&str]) -> u64 {
    lookup(value, names).and_then(as_u64).unwrap_or_default()
}

fn count(value: &Value, names: &[&str]) -> u64 {
    id(value, names)
}

fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

fn flag(value: &Value, names: &[&str]) -> bool {
    lookup(value, names).is_some_and(as_flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const PLACEHOLDER: &str = "/images/avatar-placeholder.png";

    fn normalizer() -> Normalizer {
        Normalizer::new(PLACEHOLDER)
    }

    #[test]
    fn user_accepts_every_casing() {
        let n = normalizer();
        let snake = n.user(&json!({"id": 7, "display_name": "Ada", "email": "a@x.io", "avatar_url": "/a.png"}));
        let camel = n.user(&json!({"id": "7", "displayName": "Ada", "email": "a@x.io", "avatarUrl": "/a.png"}));
        let pascal = n.user(&json!({"Id": 7, "DisplayName": "Ada", "Email": "a@x.io", "AvatarUrl": "/a.png"}));
        assert_eq!(snake, camel);
        assert_eq!(camel, pascal);
        assert_eq!(snake.id, UserId(7));
        assert_eq!(snake.avatar, "/a.png");
    }

    #[test]
    fn empty_avatar_becomes_placeholder() {
        let n = normalizer();
        assert_eq!(n.user(&json!({"id": 1, "avatar": ""})).avatar, PLACEHOLDER);
        assert_eq!(n.user(&json!({"id": 1})).avatar, PLACEHOLDER);
        assert_eq!(n.message(&json!({"id": 1, "avatar": "  "})).avatar, PLACEHOLDER);
    }

    #[test]
    fn user_envelopes_are_unwrapped() {
        let n = normalizer();
        let wrapped = n.user(&json!({"token": "t", "user": {"id": 3, "name": "Bo"}}));
        let data = n.user(&json!({"data": {"id": 3, "name": "Bo"}}));
        assert_eq!(wrapped, data);
        assert_eq!(wrapped.name, "Bo");
    }

    #[test]
    fn post_author_falls_back_to_bare_id() {
        let n = normalizer();
        let post = n.post(&json!({"postId": "12", "Title": "Hi", "content": "body", "authorId": 4}));
        assert_eq!(post.id, PostId(12));
        assert_eq!(post.body, "body");
        assert_eq!(post.author.id, UserId(4));
        assert_eq!(post.author.avatar, PLACEHOLDER);
        assert_eq!(post.image_url, None);
    }

    #[test]
    fn lists_are_found_under_any_wrapper() {
        let n = normalizer();
        let bare = json!([{"id": 1}, {"id": 2}]);
        let named = json!({"posts": [{"id": 1}, {"id": 2}]});
        let results = json!({"results": [{"id": 1}, {"id": 2}]});
        assert_eq!(n.posts(Some(&bare)).len(), 2);
        assert_eq!(n.posts(Some(&named)), n.posts(Some(&bare)));
        assert_eq!(n.posts(Some(&results)), n.posts(Some(&bare)));
        assert!(n.posts(None).is_empty());
        assert!(n.posts(Some(&json!({"unexpected": true}))).is_empty());
    }

    #[test]
    fn pagination_flag() {
        assert_eq!(has_more(Some(&json!({"hasMore": true}))), Some(true));
        assert_eq!(has_more(Some(&json!({"next_page": 3}))), Some(true));
        assert_eq!(has_more(Some(&json!({"next": null}))), None);
        assert_eq!(has_more(Some(&json!([]))), None);
    }

    #[test]
    fn upload_url_spellings() {
        assert_eq!(upload_url(Some(&json!({"url": "/u/1.png"}))).as_deref(), Some("/u/1.png"));
        assert_eq!(upload_url(Some(&json!({"fileUrl": "/u/2.png"}))).as_deref(), Some("/u/2.png"));
        assert_eq!(upload_url(Some(&json!({"data": {"Location": "/u/3.png"}}))).as_deref(), Some("/u/3.png"));
        assert_eq!(upload_url(Some(&json!({"url": ""}))), None);
    }

    #[test]
    fn field_errors_from_bad_request_body() {
        let body = json!({"errors": {"email": ["taken", "invalid"], "displayName": "required"}});
        let errors = field_errors(Some(&body));
        assert_eq!(errors.get("email"), Some("taken"));
        assert_eq!(errors.get("display_name"), Some("required"));
    }

    #[test]
    fn ticket_status_is_lenient() {
        let ticket = normalizer().ticket(&json!({"TicketId": 5, "Status": "SOLVED"}));
        assert_eq!(ticket.id, TicketId(5));
        assert_eq!(ticket.status, TicketStatus::Resolved);
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<f64>().prop_map(|f| json!(f)),
            "[a-zA-Z0-9_ ]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::hash_map(
                    prop_oneof![
                        Just("id".to_string()),
                        Just("avatar".to_string()),
                        Just("user".to_string()),
                        Just("data".to_string()),
                        Just("posts".to_string()),
                        Just("createdAt".to_string()),
                        "[a-zA-Z_]{1,8}",
                    ],
                    inner,
                    0..5
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn normalization_is_total(value in arb_json()) {
            let n = normalizer();
            let user = n.user(&value);
            prop_assert!(!user.avatar.is_empty());
            let _ = n.profile(&value);
            let _ = n.post(&value);
            let _ = n.comment(&value);
            let _ = n.ticket(&value);
            let _ = n.posts(Some(&value));
            let _ = field_errors(Some(&value));
            for message in n.messages(Some(&value)) {
                prop_assert!(!message.avatar.is_empty());
            }
        }
    }
}
