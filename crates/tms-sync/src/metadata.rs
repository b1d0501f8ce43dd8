//! Per-unit translation metadata record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::status::{
    self, source_transition_allowed, target_transition_allowed, Axis, Origin, SourceAction,
    SourceStatus, TargetAction, TargetStatus, TransitionPolicy,
};
use crate::unit::UnitKey;

/// Translation metadata of one unit. Created lazily on first touch and
/// mutated only by unit-level actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMetadata {
    pub key: UnitKey,
    /// Remote document id; absent means never uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub source_langcode: String,
    pub source_status: SourceStatus,
    #[serde(default)]
    pub target_status: BTreeMap<String, TargetStatus>,
    /// Explicit profile; `None` falls back to the configured default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// The TMS reported `document_id` as archived. The next upload creates a
    /// new document instead of updating it.
    #[serde(default)]
    pub document_archived: bool,
    pub updated_at: DateTime<Utc>,
}

impl TranslationMetadata {
    pub fn new(key: UnitKey, source_langcode: impl Into<String>) -> Self {
        Self {
            key,
            document_id: None,
            source_langcode: source_langcode.into(),
            source_status: SourceStatus::Untracked,
            target_status: BTreeMap::new(),
            profile_id: None,
            job_id: None,
            document_archived: false,
            updated_at: Utc::now(),
        }
    }

    pub fn has_document(&self) -> bool {
        self.document_id.is_some()
    }

    pub fn target(&self, langcode: &str) -> Option<TargetStatus> {
        self.target_status.get(langcode).copied()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Checks a locally initiated source change without applying it.
    pub fn ensure_source_transition(
        &self,
        to: SourceStatus,
        policy: TransitionPolicy,
    ) -> Result<(), SyncError> {
        if source_transition_allowed(self.source_status, to) {
            return Ok(());
        }
        self.reject(&Axis::Source, self.source_status.as_str(), to.as_str(), policy)
    }

    /// Checks a locally initiated target change without applying it.
    pub fn ensure_target_transition(
        &self,
        langcode: &str,
        to: TargetStatus,
        policy: TransitionPolicy,
    ) -> Result<(), SyncError> {
        if langcode == self.source_langcode {
            return Err(SyncError::illegal(
                self.key.to_string(),
                format!("'{}' is the source language", langcode),
            ));
        }
        let from = self.target(langcode);
        if target_transition_allowed(from, to) {
            return Ok(());
        }
        let from = from.map(|s| s.as_str()).unwrap_or("NONE");
        self.reject(
            &Axis::Target(langcode.to_string()),
            from,
            to.as_str(),
            policy,
        )
    }

    fn reject(
        &self,
        axis: &Axis,
        from: &str,
        to: &str,
        policy: TransitionPolicy,
    ) -> Result<(), SyncError> {
        match policy {
            TransitionPolicy::Strict => Err(SyncError::illegal(
                self.key.to_string(),
                format!("{} cannot move from {} to {}", axis, from, to),
            )),
            TransitionPolicy::Lenient => {
                warn!(
                    "Unexpected {} transition {} -> {} for {}, applying anyway",
                    axis, from, to, self.key
                );
                Ok(())
            }
        }
    }

    /// Moves the source status. Remote values are accepted as reported.
    pub fn transition_source(
        &mut self,
        to: SourceStatus,
        origin: Origin,
        policy: TransitionPolicy,
    ) -> Result<(), SyncError> {
        if origin == Origin::Local {
            self.ensure_source_transition(to, policy)?;
        }
        self.source_status = to;
        Ok(())
    }

    /// Moves one target status. The source language can never be a target.
    pub fn transition_target(
        &mut self,
        langcode: &str,
        to: TargetStatus,
        origin: Origin,
        policy: TransitionPolicy,
    ) -> Result<(), SyncError> {
        match origin {
            Origin::Local => self.ensure_target_transition(langcode, to, policy)?,
            Origin::Remote if langcode == self.source_langcode => {
                return Err(SyncError::illegal(
                    self.key.to_string(),
                    format!("'{}' is the source language", langcode),
                ));
            }
            Origin::Remote => {}
        }
        self.target_status.insert(langcode.to_string(), to);
        Ok(())
    }

    /// Forces a target into a side state. Always legal.
    pub(crate) fn force_target(&mut self, langcode: &str, to: TargetStatus) {
        debug_assert!(to.is_side_state());
        if langcode != self.source_langcode {
            self.target_status.insert(langcode.to_string(), to);
        }
    }

    /// Resets everything but the identity and source language.
    pub fn reset(&mut self) {
        self.document_id = None;
        self.source_status = SourceStatus::Untracked;
        self.target_status.clear();
        self.profile_id = None;
        self.job_id = None;
        self.document_archived = false;
        self.touch();
    }

    pub fn is_upload_needed(&self) -> bool {
        self.document_archived
            || matches!(
                status::source_action(self.source_status, self.has_document()),
                SourceAction::Upload | SourceAction::Reupload
            )
    }

    /// True when a request, check or download is available for the target.
    pub fn is_target_actionable(&self, langcode: &str) -> bool {
        if !self.has_document()
            || self.document_archived
            || langcode == self.source_langcode
            || self.source_status == SourceStatus::Disabled
        {
            return false;
        }
        matches!(
            status::target_action(self.target(langcode)),
            TargetAction::Request | TargetAction::Check | TargetAction::Download
        )
    }

    /// Returns the invariant violations of this record, if any.
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if !self.has_document() {
            for (langcode, status) in &self.target_status {
                if !status.allowed_without_document() {
                    violations.push(format!(
                        "target '{}' is {} without an uploaded document",
                        langcode, status
                    ));
                }
            }
        }

        if self.target_status.contains_key(&self.source_langcode) {
            violations.push(format!(
                "source language '{}' is tracked as a target",
                self.source_langcode
            ));
        }

        violations
    }
}
