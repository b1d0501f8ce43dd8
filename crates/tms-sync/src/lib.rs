pub mod actions;
pub mod config;
pub mod content;
pub mod db;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod identity;
pub mod locale;
pub mod logging;
pub mod metadata;
pub mod profile;
pub mod status;
pub mod store;
pub mod tms;
pub mod unit;

pub use actions::{ActionKind, ActionReport, OutcomeStatus, UnitOutcome};
pub use config::{load_config, EngineConfig};
pub use content::{ContentRepository, MemoryContentRepository};
pub use db::{Database, DatabaseError};
pub use dispatch::{
    Batch, BatchParams, BatchProgressBroadcaster, BatchSummary, Dispatcher, ProgressReporter,
};
pub use engine::{SyncEngine, TargetView, UnitStatusView};
pub use error::{ConfigError, DispatchError, Result, SyncError, TmsError, TmsSyncError};
pub use identity::{DocumentRef, IdentityMapper};
pub use locale::LocaleMapper;
pub use logging::init_tracing;
pub use metadata::TranslationMetadata;
pub use profile::{Profile, ProfileGate};
pub use status::{SourceAction, SourceStatus, TargetAction, TargetStatus, TransitionPolicy};
pub use store::{MemoryMetadataStore, MetadataFilter, MetadataStore, SqliteMetadataStore};
pub use tms::{SandboxTms, TmsClient};
pub use unit::{Unit, UnitKey, UnitKind};
