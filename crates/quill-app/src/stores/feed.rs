//! Paged post feed.

use super::{awaited, route};
use indexmap::IndexMap;
use quill_core::action::{Action, ActionKind};
use quill_core::bus::{ActionBus, HandlerResult};
use quill_core::errors::QuillError;
use quill_core::ids::{CorrelationId, PostId};
use quill_core::reactive::Store;
use quill_core::types::{FieldErrors, Post};
use quill_core::FeedAction;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    /// Posts in display order, one entry per id
    pub posts: IndexMap<PostId, Post>,
    /// Last page loaded
    pub page: u32,
    pub has_more: bool,
    pub query: Option<String>,
    pub loading: Option<CorrelationId>,
    pub creating: Option<CorrelationId>,
    pub error: Option<String>,
    pub field_errors: FieldErrors,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            posts: IndexMap::new(),
            page: 0,
            has_more: true,
            query: None,
            loading: None,
            creating: None,
            error: None,
            field_errors: FieldErrors::default(),
        }
    }
}

impl FeedState {
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Page to request for "load more"
    pub fn next_page(&self) -> u32 {
        self.page + 1
    }
}

const KINDS: &[ActionKind] = &[
    ActionKind::FeedLoadRequest,
    ActionKind::FeedLoadSuccess,
    ActionKind::FeedLoadFail,
    ActionKind::PostCreateRequest,
    ActionKind::PostCreateSuccess,
    ActionKind::PostCreateFail,
    ActionKind::PostDeleteSuccess,
    ActionKind::PostDeleteFail,
];

fn reduce(state: &FeedState, action: &Action) -> Option<FeedState> {
    let Action::Feed(action) = action else {
        return None;
    };
    match action {
        FeedAction::LoadRequest {
            correlation, query, ..
        } => Some(FeedState {
            loading: Some(*correlation),
            query: query.clone(),
            error: None,
            ..state.clone()
        }),
        FeedAction::LoadSuccess {
            correlation,
            page,
            posts,
            has_more,
        } => awaited(state.loading, *correlation).then(|| {
            let mut next = state.clone();
            if *page <= 1 {
                next.posts.clear();
            }
            for post in posts {
                next.posts.insert(post.id, post.clone());
            }
            next.page = *page;
            next.has_more = *has_more;
            next.loading = None;
            next
        }),
        FeedAction::LoadFail {
            correlation,
            failure,
        } => awaited(state.loading, *correlation).then(|| FeedState {
            loading: None,
            error: Some(failure.message.clone()),
            ..state.clone()
        }),
        FeedAction::CreateRequest { correlation, .. } => Some(FeedState {
            creating: Some(*correlation),
            error: None,
            field_errors: FieldErrors::default(),
            ..state.clone()
        }),
        FeedAction::CreateSuccess { correlation, post } => {
            awaited(state.creating, *correlation).then(|| {
                let mut next = state.clone();
                next.posts.shift_insert(0, post.id, post.clone());
                next.creating = None;
                next
            })
        }
        FeedAction::CreateFail {
            correlation,
            failure,
        } => awaited(state.creating, *correlation).then(|| FeedState {
            creating: None,
            error: Some(failure.message.clone()),
            field_errors: failure.field_errors.clone(),
            ..state.clone()
        }),
        FeedAction::DeleteSuccess { post_id, .. } => state.posts.contains_key(post_id).then(|| {
            let mut next = state.clone();
            next.posts.shift_remove(post_id);
            next
        }),
        FeedAction::DeleteFail { failure, .. } => Some(FeedState {
            error: Some(failure.message.clone()),
            ..state.clone()
        }),
        FeedAction::DeleteRequest { .. } => None,
    }
}

#[derive(Clone)]
pub struct FeedStore {
    store: Store<FeedState>,
}

impl FeedStore {
    /// Also reloads page 1 whenever a post is created, so server-side
    /// ordering and counts replace the optimistic insert.
    pub fn new(bus: &ActionBus) -> Self {
        let store = Store::new("feed", FeedState::default());
        route(&store, bus, KINDS, reduce);

        let handle = bus.handle();
        let state = store.clone();
        bus.register_fn(ActionKind::PostCreateSuccess, move |_action: &Action| -> HandlerResult {
            let reload = FeedAction::LoadRequest {
                correlation: CorrelationId::new(),
                page: 1,
                query: state.snapshot().query.clone(),
            };
            handle
                .dispatch(reload)
                .map(|_| ())
                .map_err(|e| QuillError::internal(e.to_string()))
        });

        Self { store }
    }

    pub fn state(&self) -> FeedState {
        self.store.get_state()
    }

    pub fn store(&self) -> &Store<FeedState> {
        &self.store
    }
}
