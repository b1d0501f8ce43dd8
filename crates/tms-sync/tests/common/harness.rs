//! Isolated engine environment for integration tests: a sandbox TMS, an
//! in-memory CMS and a metadata store wired into a dispatcher.

#![allow(dead_code)]

use std::sync::Arc;

use tms_sync::config::EngineConfig;
use tms_sync::dispatch::{BatchParams, BatchSummary, Dispatcher};
use tms_sync::{
    MemoryContentRepository, MemoryMetadataStore, MetadataStore, SandboxTms, SyncEngine,
    TmsClient, TranslationMetadata, Unit, UnitKey,
};

pub struct SyncHarness {
    pub tms: Arc<SandboxTms>,
    pub content: Arc<MemoryContentRepository>,
    pub store: Arc<dyn MetadataStore>,
    pub dispatcher: Dispatcher,
}

impl SyncHarness {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryMetadataStore::new()))
    }

    pub fn with_store(config: EngineConfig, store: Arc<dyn MetadataStore>) -> Self {
        Self::build(config, store, |sandbox| sandbox as Arc<dyn TmsClient>)
    }

    /// Puts `wrap(sandbox)` between the engine and the sandbox TMS. The
    /// `tms` field still reaches the sandbox for scripting and call counts.
    pub fn with_client<F>(config: EngineConfig, wrap: F) -> Self
    where
        F: FnOnce(Arc<SandboxTms>) -> Arc<dyn TmsClient>,
    {
        Self::build(config, Arc::new(MemoryMetadataStore::new()), wrap)
    }

    fn build<F>(config: EngineConfig, store: Arc<dyn MetadataStore>, wrap: F) -> Self
    where
        F: FnOnce(Arc<SandboxTms>) -> Arc<dyn TmsClient>,
    {
        let tms = Arc::new(SandboxTms::new());
        let content = Arc::new(MemoryContentRepository::new());
        let engine = SyncEngine::new(&config, wrap(tms.clone()), content.clone(), Arc::clone(&store))
            .expect("engine must build from a valid config");

        Self {
            tms,
            content,
            store,
            dispatcher: Dispatcher::new(Arc::new(engine)),
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        self.dispatcher.engine()
    }

    /// Adds a unit to the CMS and returns its key.
    pub fn add(&self, unit: Unit) -> UnitKey {
        let key = unit.key();
        self.content.insert(unit).expect("insert unit");
        key
    }

    pub fn run(&self, operation: &str, units: &[UnitKey]) -> BatchSummary {
        self.run_with(operation, units, &BatchParams::default())
    }

    pub fn run_with(&self, operation: &str, units: &[UnitKey], params: &BatchParams) -> BatchSummary {
        self.dispatcher
            .run_batch(operation, units, params)
            .unwrap_or_else(|e| panic!("operation {} failed to dispatch: {}", operation, e))
    }

    pub fn meta(&self, key: &UnitKey) -> TranslationMetadata {
        self.engine()
            .metadata(key)
            .expect("load metadata")
            .unwrap_or_else(|| panic!("no metadata for {}", key))
    }

    pub fn document_id(&self, key: &UnitKey) -> String {
        self.meta(key)
            .document_id
            .unwrap_or_else(|| panic!("{} has no document", key))
    }
}
