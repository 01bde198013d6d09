//! Profile page state.

use super::{awaited, route};
use quill_core::action::{Action, ActionKind};
use quill_core::bus::ActionBus;
use quill_core::ids::CorrelationId;
use quill_core::reactive::Store;
use quill_core::types::{FieldErrors, Profile};
use quill_core::ProfileAction;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileState {
    pub profile: Option<Profile>,
    pub loading: Option<CorrelationId>,
    pub updating: Option<CorrelationId>,
    /// Last load failed because the server was unreachable; `profile` is
    /// whatever was shown before.
    pub offline: bool,
    pub error: Option<String>,
    pub field_errors: FieldErrors,
}

const KINDS: &[ActionKind] = &[
    ActionKind::ProfileLoadRequest,
    ActionKind::ProfileLoadSuccess,
    ActionKind::ProfileLoadFail,
    ActionKind::ProfileUpdateRequest,
    ActionKind::ProfileUpdateSuccess,
    ActionKind::ProfileUpdateFail,
    ActionKind::SessionInvalidated,
    ActionKind::LogoutSuccess,
];

fn reduce(state: &ProfileState, action: &Action) -> Option<ProfileState> {
    let action = match action {
        Action::Profile(action) => action,
        // In-flight requests keep their slots so their outcomes still land.
        Action::Session(_) => {
            let signed_out = ProfileState {
                loading: state.loading,
                updating: state.updating,
                ..ProfileState::default()
            };
            return (*state != signed_out).then_some(signed_out);
        }
        _ => return None,
    };
    match action {
        ProfileAction::LoadRequest { correlation, .. } => Some(ProfileState {
            loading: Some(*correlation),
            error: None,
            ..state.clone()
        }),
        ProfileAction::LoadSuccess {
            correlation,
            profile,
        } => awaited(state.loading, *correlation).then(|| ProfileState {
            profile: Some(profile.clone()),
            loading: None,
            offline: false,
            error: None,
            ..state.clone()
        }),
        ProfileAction::LoadFail {
            correlation,
            failure,
            ..
        } => awaited(state.loading, *correlation).then(|| {
            if failure.is_offline() {
                ProfileState {
                    loading: None,
                    offline: true,
                    ..state.clone()
                }
            } else {
                ProfileState {
                    loading: None,
                    offline: false,
                    error: Some(failure.message.clone()),
                    ..state.clone()
                }
            }
        }),
        ProfileAction::UpdateRequest { correlation, .. } => Some(ProfileState {
            updating: Some(*correlation),
            error: None,
            field_errors: FieldErrors::default(),
            ..state.clone()
        }),
        ProfileAction::UpdateSuccess {
            correlation,
            profile,
        } => awaited(state.updating, *correlation).then(|| ProfileState {
            profile: Some(profile.clone()),
            updating: None,
            ..state.clone()
        }),
        ProfileAction::UpdateFail {
            correlation,
            failure,
        } => awaited(state.updating, *correlation).then(|| ProfileState {
            updating: None,
            error: Some(failure.message.clone()),
            field_errors: failure.field_errors.clone(),
            ..state.clone()
        }),
    }
}

#[derive(Clone)]
pub struct ProfileStore {
    store: Store<ProfileState>,
}

impl ProfileStore {
    pub fn new(bus: &ActionBus) -> Self {
        let store = Store::new("profile", ProfileState::default());
        route(&store, bus, KINDS, reduce);
        Self { store }
    }

    pub fn state(&self) -> ProfileState {
        self.store.get_state()
    }

    pub fn store(&self) -> &Store<ProfileState> {
        &self.store
    }
}
