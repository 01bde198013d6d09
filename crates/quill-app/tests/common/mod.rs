#![allow(dead_code)]

use quill_app::{AppCore, AppEffects};
use quill_core::config::AppConfig;
use quill_core::effects::KeyValueStorage;
use quill_testkit::{ActionRecorder, ManualScheduler, MemoryStorage, StubTransport};
use std::sync::Arc;

pub const PLACEHOLDER: &str = "/images/avatar-placeholder.png";

pub struct Harness {
    pub core: AppCore,
    pub transport: Arc<StubTransport>,
    pub scheduler: Arc<ManualScheduler>,
    pub storage: Arc<MemoryStorage>,
    pub recorder: ActionRecorder,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    pub fn with_storage(storage: Arc<MemoryStorage>) -> Self {
        Self::build(AppConfig::default(), Arc::new(ManualScheduler::new()), storage)
    }

    pub fn build(config: AppConfig, scheduler: Arc<ManualScheduler>, storage: Arc<MemoryStorage>) -> Self {
        quill_testkit::init_test_tracing();
        let transport = Arc::new(StubTransport::new());
        let effects = AppEffects {
            transport: transport.clone(),
            spawner: scheduler.clone(),
            clock: scheduler.clock(),
            storage: storage.clone() as Arc<dyn KeyValueStorage>,
        };
        let core = AppCore::new(config, effects).unwrap();
        let recorder = ActionRecorder::attach(core.bus());
        Self {
            core,
            transport,
            scheduler,
            storage,
            recorder,
        }
    }

    /// Drive every spawned workflow to completion.
    pub fn settle(&self) {
        self.scheduler.run_until_idle();
    }
}
