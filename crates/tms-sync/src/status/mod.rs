//! Source and target status values, their transition rules and the
//! next-action categories derived from them.

pub mod transitions;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use transitions::{source_transition_allowed, target_transition_allowed};

/// Status of a unit's source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceStatus {
    /// Never uploaded.
    Untracked,
    /// Marked for upload.
    Request,
    /// Upload in flight at the TMS.
    Importing,
    /// Uploaded and matching the last-known local content.
    Current,
    /// Local content changed since the last successful upload.
    Edited,
    /// The last remote call failed.
    Error,
    /// Cancelled by the user.
    Cancelled,
    /// The profile forbids processing.
    Disabled,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Untracked => "UNTRACKED",
            SourceStatus::Request => "REQUEST",
            SourceStatus::Importing => "IMPORTING",
            SourceStatus::Current => "CURRENT",
            SourceStatus::Edited => "EDITED",
            SourceStatus::Error => "ERROR",
            SourceStatus::Cancelled => "CANCELLED",
            SourceStatus::Disabled => "DISABLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNTRACKED" => Some(SourceStatus::Untracked),
            "REQUEST" => Some(SourceStatus::Request),
            "IMPORTING" => Some(SourceStatus::Importing),
            "CURRENT" => Some(SourceStatus::Current),
            "EDITED" => Some(SourceStatus::Edited),
            "ERROR" => Some(SourceStatus::Error),
            "CANCELLED" => Some(SourceStatus::Cancelled),
            "DISABLED" => Some(SourceStatus::Disabled),
            _ => None,
        }
    }

    /// Side states are reachable from anywhere.
    pub fn is_side_state(&self) -> bool {
        matches!(
            self,
            SourceStatus::Error | SourceStatus::Cancelled | SourceStatus::Disabled
        )
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one target language of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetStatus {
    /// Not yet requested from the TMS.
    Request,
    /// A local translation exists that this engine does not manage.
    Untracked,
    /// Requested, translation in progress.
    Pending,
    /// Complete at the TMS, not yet downloaded.
    Ready,
    /// An interim translation was downloaded while work continues.
    Intermediate,
    /// Final translation downloaded.
    Current,
    /// The source changed after this target reached `Current`.
    Edited,
    Error,
    Cancelled,
    Disabled,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Request => "REQUEST",
            TargetStatus::Untracked => "UNTRACKED",
            TargetStatus::Pending => "PENDING",
            TargetStatus::Ready => "READY",
            TargetStatus::Intermediate => "INTERMEDIATE",
            TargetStatus::Current => "CURRENT",
            TargetStatus::Edited => "EDITED",
            TargetStatus::Error => "ERROR",
            TargetStatus::Cancelled => "CANCELLED",
            TargetStatus::Disabled => "DISABLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REQUEST" => Some(TargetStatus::Request),
            "UNTRACKED" => Some(TargetStatus::Untracked),
            "PENDING" => Some(TargetStatus::Pending),
            "READY" => Some(TargetStatus::Ready),
            "INTERMEDIATE" => Some(TargetStatus::Intermediate),
            "CURRENT" => Some(TargetStatus::Current),
            "EDITED" => Some(TargetStatus::Edited),
            "ERROR" => Some(TargetStatus::Error),
            "CANCELLED" => Some(TargetStatus::Cancelled),
            "DISABLED" => Some(TargetStatus::Disabled),
            _ => None,
        }
    }

    pub fn is_side_state(&self) -> bool {
        matches!(
            self,
            TargetStatus::Error
                | TargetStatus::Cancelled
                | TargetStatus::Disabled
                | TargetStatus::Untracked
        )
    }

    /// Whether a download may be attempted from this status.
    pub fn is_downloadable(&self) -> bool {
        matches!(
            self,
            TargetStatus::Ready
                | TargetStatus::Current
                | TargetStatus::Intermediate
                | TargetStatus::Error
        )
    }

    /// Whether a bulk "request all" should (re)request this target.
    pub fn is_requestable(&self) -> bool {
        matches!(
            self,
            TargetStatus::Request
                | TargetStatus::Untracked
                | TargetStatus::Edited
                | TargetStatus::Error
                | TargetStatus::Cancelled
        )
    }

    /// Statuses allowed while the unit has no uploaded document.
    pub fn allowed_without_document(&self) -> bool {
        matches!(
            self,
            TargetStatus::Request | TargetStatus::Untracked | TargetStatus::Disabled
        )
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which status a transition applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Axis {
    Source,
    Target(String),
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Source => f.write_str("source"),
            Axis::Target(langcode) => write!(f, "target '{}'", langcode),
        }
    }
}

/// Where a status change comes from. Remote values are re-assertions of
/// the TMS's truth and are accepted unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

/// How locally initiated illegal transitions are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Reject with `IllegalTransition`.
    Strict,
    /// Log a warning and apply the new status.
    #[default]
    Lenient,
}

/// Next TMS-facing action for a unit's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceAction {
    Upload,
    Reupload,
    CheckUpload,
    None,
}

/// Next TMS-facing action for one target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAction {
    Request,
    Check,
    Download,
    Workbench,
    None,
}

/// Derives the source action from the source status and document presence.
pub fn source_action(status: SourceStatus, has_document: bool) -> SourceAction {
    match (status, has_document) {
        (SourceStatus::Disabled, _) => SourceAction::None,
        (_, false) => SourceAction::Upload,
        (SourceStatus::Importing, true) => SourceAction::CheckUpload,
        (SourceStatus::Edited | SourceStatus::Error, true) => SourceAction::Reupload,
        (SourceStatus::Cancelled | SourceStatus::Untracked | SourceStatus::Request, true) => {
            SourceAction::Upload
        }
        (SourceStatus::Current, true) => SourceAction::None,
    }
}

/// Derives the target action from the target status alone; an absent
/// status means the target has not been considered yet.
pub fn target_action(status: Option<TargetStatus>) -> TargetAction {
    match status {
        None => TargetAction::Request,
        Some(s) if s.is_requestable() && s != TargetStatus::Error => TargetAction::Request,
        Some(TargetStatus::Pending | TargetStatus::Error) => TargetAction::Check,
        Some(TargetStatus::Ready | TargetStatus::Intermediate) => TargetAction::Download,
        Some(TargetStatus::Current) => TargetAction::Workbench,
        Some(_) => TargetAction::None,
    }
}
