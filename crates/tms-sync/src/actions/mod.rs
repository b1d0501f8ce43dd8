//! Unit-level actions: one state transition and at most one kind of
//! remote call each, applied to a single unit's metadata record.

mod admin;
mod source;
mod target;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, TmsError};
use crate::unit::UnitKey;

/// The atomic operations a batch step can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Upload { job_id: Option<String> },
    CheckUpload,
    /// All enabled targets when `langcode` is `None`.
    RequestTranslations { langcode: Option<String> },
    CheckTranslations { langcode: Option<String> },
    Download { langcode: Option<String> },
    /// Cancels the whole document when `langcode` is `None`.
    Cancel { langcode: Option<String> },
    ChangeProfile { profile_id: String },
    AssignJob { job_id: String, notify: bool },
    ClearJob { notify: bool },
    Disassociate,
    DebugExport,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Upload { .. } => "upload",
            ActionKind::CheckUpload => "check_upload",
            ActionKind::RequestTranslations { .. } => "request_translation",
            ActionKind::CheckTranslations { .. } => "check_translation",
            ActionKind::Download { .. } => "download",
            ActionKind::Cancel { .. } => "cancel",
            ActionKind::ChangeProfile { .. } => "change_profile",
            ActionKind::AssignJob { .. } => "assign_job",
            ActionKind::ClearJob { .. } => "clear_job",
            ActionKind::Disassociate => "disassociate",
            ActionKind::DebugExport => "debug_export",
        }
    }

    /// Human-readable verb phrase used in outcome messages.
    pub fn describe(&self) -> String {
        fn scope(langcode: &Option<String>, all: &str) -> String {
            match langcode {
                Some(l) => format!("'{}' translation", l),
                None => all.to_string(),
            }
        }

        match self {
            ActionKind::Upload { .. } => "Upload".to_string(),
            ActionKind::CheckUpload => "Upload status check".to_string(),
            ActionKind::RequestTranslations { langcode } => {
                format!("Request of {}", scope(langcode, "translations"))
            }
            ActionKind::CheckTranslations { langcode } => {
                format!("Status check of {}", scope(langcode, "translations"))
            }
            ActionKind::Download { langcode } => {
                format!("Download of {}", scope(langcode, "translations"))
            }
            ActionKind::Cancel { langcode } => {
                format!("Cancellation of {}", scope(langcode, "document"))
            }
            ActionKind::ChangeProfile { profile_id } => {
                format!("Profile change to '{}'", profile_id)
            }
            ActionKind::AssignJob { job_id, .. } => format!("Job assignment '{}'", job_id),
            ActionKind::ClearJob { .. } => "Job removal".to_string(),
            ActionKind::Disassociate => "Disassociation".to_string(),
            ActionKind::DebugExport => "Debug export".to_string(),
        }
    }

    /// Actions that only read remote state.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            ActionKind::CheckUpload
                | ActionKind::CheckTranslations { .. }
                | ActionKind::DebugExport
        )
    }

    /// Remote-facing actions go through the profile gate; local
    /// bookkeeping does not.
    pub fn requires_gate(&self) -> bool {
        !matches!(
            self,
            ActionKind::ChangeProfile { .. }
                | ActionKind::AssignJob { .. }
                | ActionKind::ClearJob { .. }
                | ActionKind::Disassociate
                | ActionKind::DebugExport
        )
    }

    pub fn saves_metadata(&self) -> bool {
        !matches!(self, ActionKind::DebugExport)
    }
}

/// What a successful action reports back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionReport {
    pub message: String,
    pub artifact: Option<serde_json::Value>,
}

impl ActionReport {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            artifact: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
    /// Blocked by the profile gate.
    Skipped,
}

/// The single result of running one action against one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOutcome {
    pub unit: UnitKey,
    pub label: String,
    pub action: &'static str,
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<serde_json::Value>,
}

impl UnitOutcome {
    pub fn succeeded(key: &UnitKey, label: &str, action: &ActionKind, report: ActionReport) -> Self {
        Self {
            unit: key.clone(),
            label: label.to_string(),
            action: action.name(),
            status: OutcomeStatus::Succeeded,
            message: report.message,
            artifact: report.artifact,
        }
    }

    pub fn skipped(key: &UnitKey, label: &str, action: &ActionKind, message: String) -> Self {
        Self {
            unit: key.clone(),
            label: label.to_string(),
            action: action.name(),
            status: OutcomeStatus::Skipped,
            message,
            artifact: None,
        }
    }

    pub fn failed(key: &UnitKey, label: &str, action: &ActionKind, err: &SyncError) -> Self {
        Self {
            unit: key.clone(),
            label: label.to_string(),
            action: action.name(),
            status: OutcomeStatus::Failed,
            message: failure_message(label, action, err),
            artifact: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

/// One user-facing line naming the unit and the action.
fn failure_message(label: &str, action: &ActionKind, err: &SyncError) -> String {
    match err.tms() {
        Some(TmsError::PaymentRequired(_)) => format!(
            "{} failed for '{}': the TMS account requires payment. Contact the account owner.",
            action.describe(),
            label
        ),
        Some(TmsError::DocumentArchived { .. }) => format!(
            "{} failed for '{}': the document has been archived. Please re-upload it.",
            action.describe(),
            label
        ),
        Some(TmsError::DocumentLocked {
            new_document_id, ..
        }) => format!(
            "{} failed for '{}': the document was replaced by '{}'. Please try again.",
            action.describe(),
            label,
            new_document_id
        ),
        _ => format!("{} failed for '{}': {}", action.describe(), label, err),
    }
}
