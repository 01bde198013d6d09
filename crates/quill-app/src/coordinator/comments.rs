//! Comment thread workflows.

use super::{Operation, WorkflowContext};
use quill_core::effects::{HttpMethod, HttpRequest};
use quill_core::ids::{CommentId, CorrelationId, PostId};
use quill_core::types::Upload;
use quill_core::CommentAction;
use quill_core::types::Failure;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub(super) fn load(ctx: &Arc<WorkflowContext>, correlation: CorrelationId, post_id: PostId) {
    ctx.run(|ctx| async move {
        let request = HttpRequest::get(format!("/posts/{post_id}/comments"));
        match Operation::LoadComments.list(ctx.call(request).await) {
            Ok(body) => {
                let comments = ctx
                    .normalize
                    .comments(body.as_ref())
                    .into_iter()
                    .map(|mut comment| {
                        if comment.post_id == PostId::default() {
                            comment.post_id = post_id;
                        }
                        comment
                    })
                    .collect();
                ctx.emit(CommentAction::LoadSuccess {
                    correlation,
                    post_id,
                    comments,
                });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                CommentAction::LoadFail {
                    correlation,
                    post_id,
                    failure: failure.clone(),
                },
            ),
        }
    });
}

/// Upload the attachment first, then create the comment referencing it.
pub(super) fn create(
    ctx: &Arc<WorkflowContext>,
    correlation: CorrelationId,
    post_id: PostId,
    text: String,
    attachment: Option<Upload>,
) {
    ctx.run(|ctx| async move {
        match post_comment(&ctx, post_id, &text, attachment).await {
            Ok(body) => {
                let mut comment = ctx.normalize.comment(&body);
                if comment.post_id == PostId::default() {
                    comment.post_id = post_id;
                }
                ctx.emit(CommentAction::CreateSuccess { correlation, comment });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                CommentAction::CreateFail {
                    correlation,
                    post_id,
                    failure: failure.clone(),
                },
            ),
        }
    });
}

async fn post_comment(
    ctx: &WorkflowContext,
    post_id: PostId,
    text: &str,
    attachment: Option<Upload>,
) -> Result<Value, Failure> {
    let attachment_url = ctx.upload(attachment).await?;
    let mut fields = Map::new();
    fields.insert("text".into(), json!(text.trim()));
    if let Some(url) = attachment_url {
        fields.insert("attachment_url".into(), json!(url));
    }
    let request = HttpRequest::json(
        HttpMethod::Post,
        format!("/posts/{post_id}/comments"),
        Value::Object(fields),
    );
    Operation::CreateComment.entity(ctx.call(request).await)
}

pub(super) fn delete(
    ctx: &Arc<WorkflowContext>,
    correlation: CorrelationId,
    post_id: PostId,
    comment_id: CommentId,
) {
    ctx.run(|ctx| async move {
        let request = HttpRequest::delete(format!("/comments/{comment_id}"));
        match Operation::DeleteComment.done(ctx.call(request).await) {
            Ok(()) => ctx.emit(CommentAction::DeleteSuccess {
                correlation,
                post_id,
                comment_id,
            }),
            Err(failure) => ctx.emit_failure(
                &failure,
                CommentAction::DeleteFail {
                    correlation,
                    post_id,
                    failure: failure.clone(),
                },
            ),
        }
    });
}
