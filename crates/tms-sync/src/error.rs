use std::path::PathBuf;
use thiserror::Error;

use crate::unit::UnitKey;

#[derive(Error, Debug)]
pub enum TmsSyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Synchronization error: {0}")]
    Sync(#[from] SyncError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid language '{langcode}': {reason}")]
    InvalidLanguage { langcode: String, reason: String },

    #[error("Invalid profile '{id}': {reason}")]
    InvalidProfile { id: String, reason: String },
}

/// Errors reported by the remote translation management service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TmsError {
    /// Account or billing problem. Never retried automatically.
    #[error("TMS account requires payment: {0}")]
    PaymentRequired(String),

    /// The remote document was archived; only a fresh upload helps.
    #[error("Document '{document_id}' has been archived")]
    DocumentArchived { document_id: String },

    /// The remote document was superseded by a newer version.
    #[error("Document '{document_id}' is locked, newer version is '{new_document_id}'")]
    DocumentLocked {
        document_id: String,
        new_document_id: String,
    },

    #[error("TMS API error: {0}")]
    Api(String),

    #[error("TMS unavailable: {0}")]
    Unavailable(String),
}

impl TmsError {
    /// Generic failures move upload/request state to `ERROR`; the typed
    /// account and document errors leave status alone.
    pub fn is_generic(&self) -> bool {
        matches!(self, TmsError::Api(_) | TmsError::Unavailable(_))
    }
}

/// A single target language that failed inside a multi-language action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub langcode: String,
    pub error: String,
}

/// Errors raised by unit-level actions and resolution.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Tms(#[from] TmsError),

    #[error("Illegal transition for {unit}: {reason}")]
    IllegalTransition { unit: String, reason: String },

    #[error("Unit not found: {0}")]
    NotFound(UnitKey),

    #[error("No locale mapping configured for '{0}'")]
    UnmappedLocale(String),

    #[error("Content repository error: {0}")]
    Content(String),

    #[error("Metadata store error: {0}")]
    Store(#[from] crate::db::DatabaseError),

    #[error("{}", format_target_failures(.0))]
    Targets(Vec<TargetFailure>),

    #[error("Step panicked: {0}")]
    Panicked(String),
}

impl SyncError {
    pub fn illegal(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        SyncError::IllegalTransition {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Returns the remote error behind this failure, if any. For
    /// multi-language failures only the typed remote errors of single calls
    /// are visible, so this returns `None`.
    pub fn tms(&self) -> Option<&TmsError> {
        match self {
            SyncError::Tms(e) => Some(e),
            _ => None,
        }
    }
}

fn format_target_failures(failures: &[TargetFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.langcode, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Programmer errors detected while preparing a batch. These abort the
/// whole batch before any unit is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("Operation '{operation}' requires a {parameter} parameter")]
    MissingParameter {
        operation: String,
        parameter: &'static str,
    },

    #[error("Operation '{0}' does not take a parameter")]
    UnexpectedParameter(String),

    #[error("Invalid {parameter} '{value}' for operation '{operation}'")]
    InvalidParameter {
        operation: String,
        parameter: &'static str,
        value: String,
    },

    #[error("Worker pool channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, TmsSyncError>;
