//! Feed paging, post creation and deletion workflows.

use super::{normalize, Operation, WorkflowContext};
use quill_core::effects::{HttpMethod, HttpRequest};
use quill_core::ids::{CorrelationId, PostId};
use quill_core::types::Upload;
use quill_core::FeedAction;
use quill_core::types::Failure;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use url::form_urlencoded;

/// `/posts?page=..&limit=..[&q=..]`
pub(crate) fn feed_path(page: u32, limit: u32, query: Option<&str>) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params
        .append_pair("page", &page.to_string())
        .append_pair("limit", &limit.to_string());
    if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
        params.append_pair("q", q);
    }
    format!("/posts?{}", params.finish())
}

pub(super) fn load(ctx: &Arc<WorkflowContext>, correlation: CorrelationId, page: u32, query: Option<String>) {
    ctx.run(|ctx| async move {
        let page = page.max(1);
        let limit = ctx.feed_page_size;
        let request = HttpRequest::get(feed_path(page, limit, query.as_deref()));
        match Operation::LoadFeed.list(ctx.call(request).await) {
            Ok(body) => {
                let posts = ctx.normalize.posts(body.as_ref());
                // Without an explicit flag, a full page suggests more remain.
                let has_more = normalize::has_more(body.as_ref())
                    .unwrap_or(posts.len() >= limit as usize && limit > 0);
                tracing::debug!(page, count = posts.len(), has_more, "Feed page loaded");
                ctx.emit(FeedAction::LoadSuccess {
                    correlation,
                    page,
                    posts,
                    has_more,
                });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                FeedAction::LoadFail { correlation, failure: failure.clone() },
            ),
        }
    });
}

pub(super) fn create(
    ctx: &Arc<WorkflowContext>,
    correlation: CorrelationId,
    title: String,
    body: String,
    image: Option<Upload>,
) {
    ctx.run(|ctx| async move {
        match publish(&ctx, &title, &body, image).await {
            Ok(body) => {
                let post = ctx.normalize.post(&body);
                tracing::info!(post_id = %post.id, "Post created");
                ctx.emit(FeedAction::CreateSuccess { correlation, post });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                FeedAction::CreateFail { correlation, failure: failure.clone() },
            ),
        }
    });
}

async fn publish(
    ctx: &WorkflowContext,
    title: &str,
    body: &str,
    image: Option<Upload>,
) -> Result<Value, Failure> {
    let image_url = ctx.upload(image).await?;
    let mut fields = Map::new();
    fields.insert("title".into(), json!(title.trim()));
    fields.insert("body".into(), json!(body));
    if let Some(url) = image_url {
        fields.insert("image_url".into(), json!(url));
    }
    let request = HttpRequest::json(HttpMethod::Post, "/posts", Value::Object(fields));
    Operation::CreatePost.entity(ctx.call(request).await)
}

pub(super) fn delete(ctx: &Arc<WorkflowContext>, correlation: CorrelationId, post_id: PostId) {
    ctx.run(|ctx| async move {
        let request = HttpRequest::delete(format!("/posts/{post_id}"));
        match Operation::DeletePost.done(ctx.call(request).await) {
            Ok(()) => ctx.emit(FeedAction::DeleteSuccess { correlation, post_id }),
            Err(failure) => ctx.emit_failure(
                &failure,
                FeedAction::DeleteFail {
                    correlation,
                    post_id,
                    failure: failure.clone(),
                },
            ),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_path_encodes_the_query() {
        assert_eq!(feed_path(1, 10, None), "/posts?page=1&limit=10");
        assert_eq!(feed_path(2, 10, Some("   ")), "/posts?page=2&limit=10");
        assert_eq!(
            feed_path(1, 20, Some("rust & wasm")),
            "/posts?page=1&limit=20&q=rust+%26+wasm"
        );
    }
}
