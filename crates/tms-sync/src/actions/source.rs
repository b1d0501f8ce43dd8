use log::info;

use super::ActionReport;
use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::metadata::TranslationMetadata;
use crate::profile::Profile;
use crate::status::{Origin, SourceStatus, TargetStatus};
use crate::tms::DocumentUpload;
use crate::unit::Unit;

impl SyncEngine {
    /// Returns the document id, failing before any remote call when the
    /// unit was never uploaded.
    pub(crate) fn require_document(
        &self,
        unit: &Unit,
        meta: &TranslationMetadata,
    ) -> Result<String, SyncError> {
        meta.document_id.clone().ok_or_else(|| {
            SyncError::illegal(
                meta.key.to_string(),
                format!("'{}' has not been uploaded yet", unit.label()),
            )
        })
    }

    pub(crate) fn upload(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
        profile: Option<&Profile>,
        job_id: Option<&str>,
    ) -> Result<ActionReport, SyncError> {
        if meta.source_status == SourceStatus::Disabled {
            return Err(SyncError::illegal(
                meta.key.to_string(),
                "translation is disabled for this unit",
            ));
        }
        meta.ensure_source_transition(SourceStatus::Importing, self.policy)?;

        let source_langcode = unit.source_langcode();
        let source_locale = self.identity.to_remote(source_langcode)?.to_string();
        if meta.source_langcode != source_langcode {
            meta.target_status.remove(source_langcode);
            meta.source_langcode = source_langcode.to_string();
        }
        if let Some(job_id) = job_id {
            meta.job_id = Some(job_id.to_string());
        }

        let document = DocumentUpload {
            title: unit.label(),
            content: unit.payload(),
            locale: &source_locale,
            job_id: meta.job_id.as_deref(),
        };
        let live_document = meta
            .document_id
            .clone()
            .filter(|_| meta.source_status != SourceStatus::Cancelled && !meta.document_archived);

        let result = match &live_document {
            Some(document_id) => self.tms.update_document(document_id, &document),
            None => self.tms.upload(&document),
        };
        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => {
                self.absorb_tms_error(meta, &e);
                if e.is_generic() {
                    meta.source_status = SourceStatus::Error;
                }
                return Err(e.into());
            }
        };

        let fresh = live_document.as_deref() != Some(receipt.document_id.as_str());
        meta.document_id = Some(receipt.document_id.clone());
        meta.document_archived = false;
        let status = if receipt.importing {
            SourceStatus::Importing
        } else {
            SourceStatus::Current
        };
        meta.transition_source(status, Origin::Remote, self.policy)?;

        let targets: Vec<String> = self.target_langcodes(meta).map(str::to_string).collect();
        for langcode in &targets {
            if profile.is_some_and(|p| p.is_target_disabled(langcode)) {
                meta.force_target(langcode, TargetStatus::Disabled);
            } else if fresh || meta.target(langcode).is_none() {
                meta.target_status
                    .insert(langcode.clone(), TargetStatus::Request);
            }
        }

        info!(
            "Uploaded {} as document {} ({})",
            meta.key, receipt.document_id, status
        );
        let mut message = format!(
            "Uploaded '{}' as document {}",
            unit.label(),
            receipt.document_id
        );

        // A failed auto-request fails the step; the upload itself stays recorded.
        if status == SourceStatus::Current && profile.is_some_and(|p| p.auto_request) {
            let report = self.request_translations(unit, meta, profile, None)?;
            message = format!("{}; {}", message, report.message);
        }

        Ok(ActionReport::message(message))
    }

    pub(crate) fn check_upload(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
    ) -> Result<ActionReport, SyncError> {
        let document_id = self.require_document(unit, meta)?;

        let status = match self.tms.get_source_status(&document_id) {
            Ok(status) => status,
            Err(e) => {
                self.absorb_tms_error(meta, &e);
                return Err(e.into());
            }
        };
        meta.transition_source(status, Origin::Remote, self.policy)?;

        Ok(ActionReport::message(format!(
            "Source of '{}' is {}",
            unit.label(),
            status
        )))
    }
}
