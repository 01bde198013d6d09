//! Comment threads, keyed by post.

use super::{awaited, route};
use indexmap::IndexMap;
use quill_core::action::{Action, ActionKind};
use quill_core::bus::ActionBus;
use quill_core::ids::{CommentId, CorrelationId, PostId};
use quill_core::reactive::Store;
use quill_core::types::{Comment, FieldErrors};
use quill_core::CommentAction;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommentState {
    pub threads: HashMap<PostId, IndexMap<CommentId, Comment>>,
    /// Load in flight per post
    pub loading: HashMap<PostId, CorrelationId>,
    pub submitting: Option<CorrelationId>,
    pub error: Option<String>,
    pub field_errors: FieldErrors,
}

impl CommentState {
    /// Comments under `post_id`, oldest first
    pub fn thread(&self, post_id: PostId) -> Vec<Comment> {
        self.threads
            .get(&post_id)
            .map(|thread| thread.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_loading(&self, post_id: PostId) -> bool {
        self.loading.contains_key(&post_id)
    }
}

const KINDS: &[ActionKind] = &[
    ActionKind::CommentsLoadRequest,
    ActionKind::CommentsLoadSuccess,
    ActionKind::CommentsLoadFail,
    ActionKind::CommentCreateRequest,
    ActionKind::CommentCreateSuccess,
    ActionKind::CommentCreateFail,
    ActionKind::CommentDeleteSuccess,
    ActionKind::CommentDeleteFail,
];

fn reduce(state: &CommentState, action: &Action) -> Option<CommentState> {
    let Action::Comment(action) = action else {
        return None;
    };
    let mut next = state.clone();
    match action {
        CommentAction::LoadRequest {
            correlation,
            post_id,
        } => {
            next.loading.insert(*post_id, *correlation);
            next.error = None;
        }
        CommentAction::LoadSuccess {
            correlation,
            post_id,
            comments,
        } => {
            if !awaited(state.loading.get(post_id).copied(), *correlation) {
                return None;
            }
            next.loading.remove(post_id);
            let thread = comments.iter().map(|c| (c.id, c.clone())).collect();
            next.threads.insert(*post_id, thread);
        }
        CommentAction::LoadFail {
            correlation,
            post_id,
            failure,
        } => {
            if !awaited(state.loading.get(post_id).copied(), *correlation) {
                return None;
            }
            next.loading.remove(post_id);
            next.error = Some(failure.message.clone());
        }
        CommentAction::CreateRequest { correlation, .. } => {
            next.submitting = Some(*correlation);
            next.error = None;
            next.field_errors = FieldErrors::default();
        }
        CommentAction::CreateSuccess {
            correlation,
            comment,
        } => {
            if !awaited(state.submitting, *correlation) {
                return None;
            }
            next.submitting = None;
            next.threads
                .entry(comment.post_id)
                .or_default()
                .insert(comment.id, comment.clone());
        }
        CommentAction::CreateFail {
            correlation,
            failure,
            ..
        } => {
            if !awaited(state.submitting, *correlation) {
                return None;
            }
            next.submitting = None;
            next.error = Some(failure.message.clone());
            next.field_errors = failure.field_errors.clone();
        }
        CommentAction::DeleteSuccess {
            post_id,
            comment_id,
            ..
        } => {
            let removed = next
                .threads
                .get_mut(post_id)
                .and_then(|thread| thread.shift_remove(comment_id));
            removed?;
        }
        CommentAction::DeleteFail { failure, .. } => {
            next.error = Some(failure.message.clone());
        }
        CommentAction::DeleteRequest { .. } => return None,
    }
    Some(next)
}

#[derive(Clone)]
pub struct CommentStore {
    store: Store<CommentState>,
}

impl CommentStore {
    pub fn new(bus: &ActionBus) -> Self {
        let store = Store::new("comments", CommentState::default());
        route(&store, bus, KINDS, reduce);
        Self { store }
    }

    pub fn state(&self) -> CommentState {
        self.store.get_state()
    }

    pub fn store(&self) -> &Store<CommentState> {
        &self.store
    }

    pub fn thread(&self, post_id: PostId) -> Vec<Comment> {
        self.store.snapshot().thread(post_id)
    }
}
