//! Application context
//!
//! `AppCore` owns the bus and everything attached to it. It is built once
//! at startup and handed to the UI layer; nothing in the core is a global.

use crate::coordinator::Coordinator;
use crate::stores::{ChatStore, CommentStore, FeedStore, ProfileStore, SessionStore, SupportStore};
use parking_lot::Mutex;
use quill_core::action::Action;
use quill_core::bus::{ActionBus, BusError, DispatchReport};
use quill_core::config::AppConfig;
use quill_core::effects::{Clock, HttpTransport, KeyValueStorage, TaskSpawner};
use quill_core::errors::QuillResult;
use quill_core::SessionAction;
use quill_embed::{EmbedHost, HostConfig};
use quill_realtime::{ChannelBridge, ChannelConfig, SocketConnector};
use std::sync::Arc;
use std::time::Duration;

/// Host-provided effect implementations
#[derive(Clone)]
pub struct AppEffects {
    pub transport: Arc<dyn HttpTransport>,
    pub spawner: Arc<dyn TaskSpawner>,
    pub clock: Arc<dyn Clock>,
    pub storage: Arc<dyn KeyValueStorage>,
}

/// The client core: bus, coordinator, stores and bridges
pub struct AppCore {
    config: AppConfig,
    effects: AppEffects,
    bus: ActionBus,
    coordinator: Arc<Coordinator>,
    session: SessionStore,
    profile: ProfileStore,
    feed: FeedStore,
    comments: CommentStore,
    chat: ChatStore,
    support: SupportStore,
    embed: EmbedHost,
    realtime: Mutex<Option<ChannelBridge>>,
}

impl AppCore {
    /// Validate `config`, wire every component and restore a persisted
    /// session if one is still fresh.
    pub fn new(config: AppConfig, effects: AppEffects) -> QuillResult<Self> {
        config.validate()?;

        let bus = ActionBus::with_max_depth(config.max_dispatch_depth);
        let coordinator = Arc::new(Coordinator::new(
            &config,
            effects.transport.clone(),
            effects.spawner.clone(),
            bus.handle(),
        ));
        bus.install_effects(coordinator.clone());

        let session = SessionStore::new(
            &bus,
            effects.storage.clone(),
            effects.clock.clone(),
            Duration::from_millis(config.session_max_age_ms),
        );
        let profile = ProfileStore::new(&bus);
        let feed = FeedStore::new(&bus);
        let comments = CommentStore::new(&bus);
        let chat = ChatStore::new(&bus);
        let support = SupportStore::new(&bus);
        let embed = EmbedHost::new(
            HostConfig::from_app_config(&config),
            effects.clock.clone(),
            effects.spawner.clone(),
            &bus,
        );

        let core = Self {
            config,
            effects,
            bus,
            coordinator,
            session,
            profile,
            feed,
            comments,
            chat,
            support,
            embed,
            realtime: Mutex::new(None),
        };

        if let Some(user) = core.session.restore() {
            tracing::info!(user_id = %user.id, "Restoring persisted session");
            if let Err(error) = core.bus.dispatch(SessionAction::Restored { user }) {
                tracing::warn!(error = %error, "Session restore dispatch failed");
            }
        }
        tracing::info!(api_base = %core.config.api_base, "Client core ready");
        Ok(core)
    }

    pub fn dispatch(&self, action: impl Into<Action>) -> Result<DispatchReport, BusError> {
        self.bus.dispatch(action)
    }

    pub fn bus(&self) -> &ActionBus {
        &self.bus
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    pub fn feed(&self) -> &FeedStore {
        &self.feed
    }

    pub fn comments(&self) -> &CommentStore {
        &self.comments
    }

    pub fn chat(&self) -> &ChatStore {
        &self.chat
    }

    pub fn support(&self) -> &SupportStore {
        &self.support
    }

    /// Host side of the embedded support widget
    pub fn embed(&self) -> &EmbedHost {
        &self.embed
    }

    /// Connect the realtime channel through `connector`, replacing any
    /// previous channel.
    pub fn start_realtime(&self, connector: Arc<dyn SocketConnector>) -> ChannelBridge {
        let bridge = ChannelBridge::new(
            ChannelConfig::from_app_config(&self.config),
            connector,
            self.effects.spawner.clone(),
            &self.bus,
        );
        if let Some(previous) = self.realtime.lock().replace(bridge.clone()) {
            previous.shutdown();
        }
        bridge.start();
        bridge
    }

    pub fn realtime(&self) -> Option<ChannelBridge> {
        self.realtime.lock().clone()
    }

    /// Stop the realtime channel, tear down the embedded surface and
    /// discard the results of in-flight requests.
    pub fn shutdown(&self) {
        if let Some(bridge) = self.realtime.lock().take() {
            bridge.shutdown();
        }
        self.embed.close();
        self.coordinator.shutdown();
        tracing::info!("Client core shut down");
    }
}

impl std::fmt::Debug for AppCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCore")
            .field("api_base", &self.config.api_base)
            .field("bus", &self.bus)
            .field("signed_in", &self.session.state().is_signed_in())
            .finish()
    }
}
