//! Login, registration and logout workflows.

use super::{Operation, WorkflowContext};
use quill_core::effects::{HttpMethod, HttpRequest};
use quill_core::ids::CorrelationId;
use quill_core::SessionAction;
use serde_json::json;
use std::sync::Arc;

pub(super) fn login(ctx: &Arc<WorkflowContext>, correlation: CorrelationId, email: String, password: String) {
    ctx.run(|ctx| async move {
        let request = HttpRequest::json(
            HttpMethod::Post,
            "/auth/login",
            json!({ "email": email.trim(), "password": password }),
        );
        match Operation::Login.entity(ctx.call(request).await) {
            Ok(body) => {
                let user = ctx.normalize.user(&body);
                tracing::info!(user_id = %user.id, "Signed in");
                ctx.emit(SessionAction::LoginSuccess { correlation, user });
            }
            Err(failure) => {
                ctx.emit_failure(&failure, SessionAction::LoginFail { correlation, failure: failure.clone() })
            }
        }
    });
}

pub(super) fn register(
    ctx: &Arc<WorkflowContext>,
    correlation: CorrelationId,
    name: String,
    email: String,
    password: String,
) {
    ctx.run(|ctx| async move {
        let request = HttpRequest::json(
            HttpMethod::Post,
            "/auth/register",
            json!({ "name": name.trim(), "email": email.trim(), "password": password }),
        );
        match Operation::Register.entity(ctx.call(request).await) {
            Ok(body) => {
                let user = ctx.normalize.user(&body);
                tracing::info!(user_id = %user.id, "Registered");
                ctx.emit(SessionAction::RegisterSuccess { correlation, user });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                SessionAction::RegisterFail { correlation, failure: failure.clone() },
            ),
        }
    });
}

/// Best effort: the local session ends whatever the server says.
pub(super) fn logout(ctx: &Arc<WorkflowContext>, correlation: CorrelationId) {
    ctx.run(|ctx| async move {
        let request = HttpRequest::json(HttpMethod::Post, "/auth/logout", json!({}));
        if let Err(failure) = Operation::Logout.done(ctx.call(request).await) {
            tracing::debug!(message = %failure.message, "Server logout failed; clearing locally");
        }
        ctx.emit(SessionAction::LogoutSuccess { correlation });
    });
}
