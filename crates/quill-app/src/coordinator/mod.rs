//! # Side-Effect Coordinator
//!
//! The bus hands every action to [`Coordinator::on_action`] before any
//! handler sees it. Request actions start a workflow:
//!
//! 1. validate the request; a rejection becomes the feature's fail action
//! 2. spawn an async task issuing one or more sequential transport calls
//! 3. classify the response ([`status`]) and normalize the body
//!    ([`normalize`])
//! 4. dispatch exactly one outcome action carrying the request's correlation
//!
//! Outcomes are always dispatched from spawned tasks, never from inside
//! `on_action`, so a store sees a request before its outcome. A 401 from
//! any endpoint dispatches `SessionAction::Invalidated` ahead of the fail
//! action.

mod chat;
mod comments;
mod feed;
pub mod normalize;
mod profile;
mod session;
pub mod status;
mod support;
pub mod validate;

pub use normalize::Normalizer;
pub use status::Operation;

use quill_core::action::Action;
use quill_core::bus::{ActionEffects, BusHandle};
use quill_core::config::AppConfig;
use quill_core::effects::{
    HttpRequest, HttpResponse, HttpTransport, StatusClass, TaskSpawner, TransportError,
};
use quill_core::reactive::{LiveToken, Liveness};
use quill_core::types::{Failure, FieldErrors, Upload};
use quill_core::{
    ChatAction, CommentAction, FeedAction, ProfileAction, SessionAction, SupportAction,
};
use std::future::Future;
use std::sync::Arc;

/// Path of the file upload endpoint
pub const UPLOAD_PATH: &str = "/uploads";

/// Shared state of every workflow
pub(crate) struct WorkflowContext {
    transport: Arc<dyn HttpTransport>,
    spawner: Arc<dyn TaskSpawner>,
    bus: BusHandle,
    normalize: Normalizer,
    feed_page_size: u32,
    live: LiveToken,
}

impl WorkflowContext {
    /// Run a workflow in the background with its own handle on the context.
    fn run<F, Fut>(self: &Arc<Self>, workflow: F)
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.spawner.spawn(Box::pin(workflow(self.clone())));
    }

    async fn call(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(method = %request.method, path = %request.path, "Issuing request");
        let result = self.transport.request(request).await;
        match &result {
            Ok(response) => tracing::debug!(status = response.status, "Response received"),
            Err(error) => tracing::debug!(error = %error, "Transport failed"),
        }
        result
    }

    /// Upload `file`, if present, and return the URL the server assigned.
    async fn upload(&self, file: Option<Upload>) -> Result<Option<String>, Failure> {
        let Some(file) = file else {
            return Ok(None);
        };
        let body = Operation::Upload.entity(self.call(HttpRequest::upload(UPLOAD_PATH, file)).await)?;
        match normalize::upload_url(Some(&body)) {
            Some(url) => Ok(Some(url)),
            None => {
                tracing::warn!("Upload response carried no file URL");
                Err(Failure::status(
                    StatusClass::Other,
                    Operation::Upload.message(StatusClass::Other),
                ))
            }
        }
    }

    /// Publish an outcome, unless the coordinator has been shut down.
    fn emit(&self, action: impl Into<Action>) {
        let action = action.into();
        if !self.live.is_alive() {
            tracing::debug!(action = %action, "Coordinator stopped; outcome dropped");
            return;
        }
        if let Err(error) = self.bus.dispatch(action) {
            tracing::warn!(error = %error, "Outcome dispatch failed");
        }
    }

    /// Publish a fail action, invalidating the session first on 401.
    fn emit_failure(&self, failure: &Failure, action: impl Into<Action>) {
        if status::is_unauthorized(failure) {
            self.emit(SessionAction::Invalidated);
        }
        self.emit(action);
    }
}

/// Turns request actions into network workflows.
pub struct Coordinator {
    ctx: Arc<WorkflowContext>,
    liveness: Liveness,
}

impl Coordinator {
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn HttpTransport>,
        spawner: Arc<dyn TaskSpawner>,
        bus: BusHandle,
    ) -> Self {
        let liveness = Liveness::new();
        let ctx = WorkflowContext {
            transport,
            spawner,
            bus,
            normalize: Normalizer::new(config.placeholder_avatar.clone()),
            feed_page_size: config.feed_page_size,
            live: liveness.token(),
        };
        Self {
            ctx: Arc::new(ctx),
            liveness,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.ctx.normalize
    }

    /// Stop publishing outcomes. Workflows already in flight finish their
    /// network calls but their results are discarded.
    pub fn shutdown(&self) {
        self.liveness.kill();
    }

    pub fn is_running(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Dispatch a validation failure from a task so it lands after the
    /// request action has reached every store.
    fn reject(&self, errors: FieldErrors, build: impl FnOnce(Failure) -> Action + Send + 'static) {
        tracing::debug!(fields = errors.len(), "Request rejected by validation");
        self.ctx.run(|ctx| async move {
            ctx.emit(build(Failure::validation(validate::VALIDATION_MESSAGE, errors)));
        });
    }
}

impl ActionEffects for Coordinator {
    fn on_action(&self, action: &Action) {
        if !self.is_running() {
            return;
        }
        let ctx = &self.ctx;
        match action {
            Action::Session(SessionAction::LoginRequest {
                correlation,
                email,
                password,
            }) => match validate::login(email, password) {
                Ok(()) => session::login(ctx, *correlation, email.clone(), password.clone()),
                Err(errors) => {
                    let correlation = *correlation;
                    self.reject(errors, move |failure| {
                        SessionAction::LoginFail { correlation, failure }.into()
                    })
                }
            },
            Action::Session(SessionAction::RegisterRequest {
                correlation,
                name,
                email,
                password,
            }) => match validate::register(name, email, password) {
                Ok(()) => session::register(
                    ctx,
                    *correlation,
                    name.clone(),
                    email.clone(),
                    password.clone(),
                ),
                Err(errors) => {
                    let correlation = *correlation;
                    self.reject(errors, move |failure| {
                        SessionAction::RegisterFail { correlation, failure }.into()
                    })
                }
            },
            Action::Session(SessionAction::LogoutRequest { correlation }) => {
                session::logout(ctx, *correlation)
            }
            Action::Profile(ProfileAction::LoadRequest {
                correlation,
                user_id,
            }) => profile::load(ctx, *correlation, *user_id),
            Action::Profile(ProfileAction::UpdateRequest {
                correlation,
                user_id,
                name,
                bio,
                avatar,
            }) => match validate::profile_update(name, bio, avatar.as_ref()) {
                Ok(()) => profile::update(
                    ctx,
                    *correlation,
                    *user_id,
                    name.clone(),
                    bio.clone(),
                    avatar.clone(),
                ),
                Err(errors) => {
                    let correlation = *correlation;
                    self.reject(errors, move |failure| {
                        ProfileAction::UpdateFail { correlation, failure }.into()
                    })
                }
            },
            Action::Feed(FeedAction::LoadRequest {
                correlation,
                page,
                query,
            }) => feed::load(ctx, *correlation, *page, query.clone()),
            Action::Feed(FeedAction::CreateRequest {
                correlation,
                title,
                body,
                image,
            }) => match validate::post(title, body, image.as_ref()) {
                Ok(()) => feed::create(ctx, *correlation, title.clone(), body.clone(), image.clone()),
                Err(errors) => {
                    let correlation = *correlation;
                    self.reject(errors, move |failure| {
                        FeedAction::CreateFail { correlation, failure }.into()
                    })
                }
            },
            Action::Feed(FeedAction::DeleteRequest {
                correlation,
                post_id,
            }) => feed::delete(ctx, *correlation, *post_id),
            Action::Comment(CommentAction::LoadRequest {
                correlation,
                post_id,
            }) => comments::load(ctx, *correlation, *post_id),
            Action::Comment(CommentAction::CreateRequest {
                correlation,
                post_id,
                text,
                attachment,
            }) => match validate::comment(text, attachment.as_ref()) {
                Ok(()) => comments::create(
                    ctx,
                    *correlation,
                    *post_id,
                    text.clone(),
                    attachment.clone(),
                ),
                Err(errors) => {
                    let (correlation, post_id) = (*correlation, *post_id);
                    self.reject(errors, move |failure| {
                        CommentAction::CreateFail {
                            correlation,
                            post_id,
                            failure,
                        }
                        .into()
                    })
                }
            },
            Action::Comment(CommentAction::DeleteRequest {
                correlation,
                post_id,
                comment_id,
            }) => comments::delete(ctx, *correlation, *post_id, *comment_id),
            Action::Chat(ChatAction::RoomsLoadRequest { correlation }) => {
                chat::load_rooms(ctx, *correlation)
            }
            Action::Chat(ChatAction::HistoryRequest {
                correlation,
                room_id,
            }) => chat::load_history(ctx, *correlation, *room_id),
            Action::Support(SupportAction::TicketSubmitRequest {
                correlation,
                subject,
                body,
            }) => match validate::ticket(subject, body) {
                Ok(()) => support::submit(ctx, *correlation, subject.clone(), body.clone()),
                Err(errors) => {
                    let correlation = *correlation;
                    self.reject(errors, move |failure| {
                        SupportAction::TicketSubmitFail { correlation, failure }.into()
                    })
                }
            },
            Action::Support(SupportAction::HistoryRequest { correlation }) => {
                support::history(ctx, *correlation)
            }
            _ => {}
        }
    }
}
