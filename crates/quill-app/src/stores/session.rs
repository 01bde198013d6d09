//! Signed-in user and its persisted snapshot.

use super::{awaited, route};
use quill_core::action::{Action, ActionKind};
use quill_core::bus::ActionBus;
use quill_core::effects::{Clock, KeyValueStorage};
use quill_core::errors::QuillError;
use quill_core::ids::CorrelationId;
use quill_core::reactive::Store;
use quill_core::types::{FieldErrors, User};
use quill_core::SessionAction;
use std::sync::Arc;
use std::time::Duration;

/// Storage key of the persisted user JSON
pub const SESSION_USER_KEY: &str = "quill.session.user";
/// Storage key of the unix-ms timestamp the user was saved at
pub const SESSION_SAVED_AT_KEY: &str = "quill.session.saved_at";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub user: Option<User>,
    /// Login or registration in flight
    pub pending: Option<CorrelationId>,
    pub error: Option<String>,
    pub field_errors: FieldErrors,
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }
}

const KINDS: &[ActionKind] = &[
    ActionKind::LoginRequest,
    ActionKind::UserLoginSuccess,
    ActionKind::UserLoginFail,
    ActionKind::RegisterRequest,
    ActionKind::RegisterSuccess,
    ActionKind::RegisterFail,
    ActionKind::LogoutSuccess,
    ActionKind::SessionRestored,
    ActionKind::SessionInvalidated,
];

fn reduce(state: &SessionState, action: &Action) -> Option<SessionState> {
    let Action::Session(action) = action else {
        return None;
    };
    match action {
        SessionAction::LoginRequest { correlation, .. }
        | SessionAction::RegisterRequest { correlation, .. } => Some(SessionState {
            pending: Some(*correlation),
            error: None,
            field_errors: FieldErrors::default(),
            ..state.clone()
        }),
        SessionAction::LoginSuccess { correlation, user }
        | SessionAction::RegisterSuccess { correlation, user } => {
            awaited(state.pending, *correlation).then(|| SessionState {
                user: Some(user.clone()),
                ..SessionState::default()
            })
        }
        SessionAction::LoginFail {
            correlation,
            failure,
        }
        | SessionAction::RegisterFail {
            correlation,
            failure,
        } => awaited(state.pending, *correlation).then(|| SessionState {
            pending: None,
            error: Some(failure.message.clone()),
            field_errors: failure.field_errors.clone(),
            ..state.clone()
        }),
        SessionAction::Restored { user } => Some(SessionState {
            user: Some(user.clone()),
            ..state.clone()
        }),
        SessionAction::LogoutSuccess { .. } => {
            (*state != SessionState::default()).then(SessionState::default)
        }
        // Precedes the fail action of the rejected request; `pending` stays
        // so that outcome still lands.
        SessionAction::Invalidated => state.user.is_some().then(|| SessionState {
            user: None,
            ..state.clone()
        }),
        SessionAction::LogoutRequest { .. } => None,
    }
}

/// Writes and clears the persisted session in step with the store.
struct Persistence {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
}

impl Persistence {
    fn save(&self, user: &User) -> Result<(), QuillError> {
        let json = serde_json::to_string(user)
            .map_err(|e| QuillError::serialization(e.to_string()))?;
        self.storage
            .set(SESSION_USER_KEY, &json)
            .and_then(|()| {
                self.storage
                    .set(SESSION_SAVED_AT_KEY, &self.clock.now_ms().to_string())
            })
            .map_err(|e| QuillError::storage(e.to_string()))
    }

    fn clear(&self) -> Result<(), QuillError> {
        self.storage
            .remove(SESSION_USER_KEY)
            .and_then(|()| self.storage.remove(SESSION_SAVED_AT_KEY))
            .map_err(|e| QuillError::storage(e.to_string()))
    }

    /// The persisted user, if present, readable and younger than `max_age`.
    /// Anything else is cleared.
    fn load(&self) -> Option<User> {
        let user = self.storage.get(SESSION_USER_KEY).ok().flatten();
        let saved_at = self
            .storage
            .get(SESSION_SAVED_AT_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse::<u64>().ok());
        let (Some(user), Some(saved_at)) = (user, saved_at) else {
            let _ = self.clear();
            return None;
        };
        let age = self.clock.now_ms().saturating_sub(saved_at);
        if u128::from(age) >= self.max_age.as_millis() {
            tracing::info!(age_ms = age, "Persisted session expired");
            let _ = self.clear();
            return None;
        }
        match serde_json::from_str::<User>(&user) {
            Ok(user) => Some(user),
            Err(error) => {
                tracing::warn!(error = %error, "Persisted session unreadable");
                let _ = self.clear();
                None
            }
        }
    }
}

/// Session state plus its durable copy
#[derive(Clone)]
pub struct SessionStore {
    store: Store<SessionState>,
    persistence: Arc<Persistence>,
}

impl SessionStore {
    pub fn new(
        bus: &ActionBus,
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        max_age: Duration,
    ) -> Self {
        let store = Store::new("session", SessionState::default());
        route(&store, bus, KINDS, reduce);

        let persistence = Arc::new(Persistence {
            storage,
            clock,
            max_age,
        });
        // Registered after the reducer so storage follows the new state.
        for kind in [
            ActionKind::UserLoginSuccess,
            ActionKind::RegisterSuccess,
            ActionKind::LogoutSuccess,
            ActionKind::SessionInvalidated,
        ] {
            let persistence = persistence.clone();
            let state = store.clone();
            bus.register_fn(kind, move |_action: &Action| match &state.snapshot().user {
                Some(user) => persistence.save(user),
                None => persistence.clear(),
            });
        }

        Self { store, persistence }
    }

    /// Persisted user from a previous run, if still fresh.
    pub fn restore(&self) -> Option<User> {
        self.persistence.load()
    }

    pub fn state(&self) -> SessionState {
        self.store.get_state()
    }

    pub fn store(&self) -> &Store<SessionState> {
        &self.store
    }

    pub fn current_user(&self) -> Option<User> {
        self.store.snapshot().user.clone()
    }
}
