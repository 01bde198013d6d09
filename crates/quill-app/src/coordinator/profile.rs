//! Profile load and update workflows.

use super::{Operation, WorkflowContext};
use quill_core::effects::{HttpMethod, HttpRequest};
use quill_core::ids::{CorrelationId, UserId};
use quill_core::types::Upload;
use quill_core::ProfileAction;
use quill_core::types::Failure;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub(super) fn load(ctx: &Arc<WorkflowContext>, correlation: CorrelationId, user_id: UserId) {
    ctx.run(|ctx| async move {
        let result = ctx.call(HttpRequest::get(format!("/users/{user_id}"))).await;
        match Operation::LoadProfile.entity(result) {
            Ok(body) => {
                let mut profile = ctx.normalize.profile(&body);
                if profile.user.id == UserId::default() {
                    profile.user.id = user_id;
                }
                ctx.emit(ProfileAction::LoadSuccess { correlation, profile });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                ProfileAction::LoadFail {
                    correlation,
                    user_id,
                    failure: failure.clone(),
                },
            ),
        }
    });
}

/// Upload the new avatar first, then patch the profile with its URL.
pub(super) fn update(
    ctx: &Arc<WorkflowContext>,
    correlation: CorrelationId,
    user_id: UserId,
    name: String,
    bio: String,
    avatar: Option<Upload>,
) {
    ctx.run(|ctx| async move {
        match patch(&ctx, user_id, &name, &bio, avatar).await {
            Ok(body) => {
                let mut profile = ctx.normalize.profile(&body);
                if profile.user.id == UserId::default() {
                    profile.user.id = user_id;
                }
                ctx.emit(ProfileAction::UpdateSuccess { correlation, profile });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                ProfileAction::UpdateFail { correlation, failure: failure.clone() },
            ),
        }
    });
}

async fn patch(
    ctx: &WorkflowContext,
    user_id: UserId,
    name: &str,
    bio: &str,
    avatar: Option<Upload>,
) -> Result<Value, Failure> {
    let avatar_url = ctx.upload(avatar).await?;
    let mut fields = Map::new();
    fields.insert("name".into(), json!(name.trim()));
    fields.insert("bio".into(), json!(bio.trim()));
    if let Some(url) = avatar_url {
        fields.insert("avatar".into(), json!(url));
    }
    let request = HttpRequest::json(
        HttpMethod::Patch,
        format!("/users/{user_id}"),
        Value::Object(fields),
    );
    Operation::UpdateProfile.entity(ctx.call(request).await)
}
