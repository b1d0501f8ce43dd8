use log::{info, warn};
use serde_json::json;

use super::ActionReport;
use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::metadata::TranslationMetadata;
use crate::profile::Profile;
use crate::status;
use crate::unit::Unit;

impl SyncEngine {
    /// Switches the unit's profile. The change is saved before the target
    /// refresh, so a failed refresh never undoes it.
    pub(crate) fn change_profile(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
        profile_id: &str,
    ) -> Result<ActionReport, SyncError> {
        let change = self
            .gate
            .apply_profile_change(meta, profile_id, &self.langcodes)?;
        meta.touch();
        self.store.save(meta)?;

        info!(
            "Profile of {} changed from {} to {}",
            meta.key,
            change.previous.as_deref().unwrap_or("default"),
            profile_id
        );
        let message = format!("Profile of '{}' changed to '{}'", unit.label(), profile_id);
        if !change.refresh_targets {
            return Ok(ActionReport::message(message));
        }

        let profile = self.gate.profile(profile_id);
        match self.check_translations(unit, meta, profile, None) {
            Ok(report) => Ok(ActionReport::message(format!("{}; {}", message, report.message))),
            Err(e) => {
                warn!("Status refresh after profile change of {} failed: {}", meta.key, e);
                Ok(ActionReport::message(format!(
                    "{}; refreshing translation statuses failed: {}",
                    message, e
                )))
            }
        }
    }

    /// Sets or clears the job id. The local value is kept even when the
    /// TMS notification fails.
    pub(crate) fn set_job(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
        job_id: Option<&str>,
        notify: bool,
    ) -> Result<ActionReport, SyncError> {
        meta.job_id = job_id.map(str::to_string);

        if notify {
            if let Some(document_id) = meta.document_id.clone() {
                if let Err(e) = self.tms.set_job_id(&document_id, job_id) {
                    self.absorb_tms_error(meta, &e);
                    return Err(e.into());
                }
            }
        }

        Ok(ActionReport::message(match job_id {
            Some(job_id) => format!("Assigned job '{}' to '{}'", job_id, unit.label()),
            None => format!("Cleared job of '{}'", unit.label()),
        }))
    }

    /// Forgets everything about the remote document. The local reset is
    /// applied even when the remote delete fails.
    pub(crate) fn disassociate(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
    ) -> Result<ActionReport, SyncError> {
        let remote = match meta.document_id.clone() {
            Some(document_id) => self.tms.delete_document(&document_id),
            None => Ok(()),
        };
        meta.reset();
        remote?;

        info!("Disassociated {}", meta.key);
        Ok(ActionReport::message(format!(
            "Disassociated '{}' from the TMS",
            unit.label()
        )))
    }

    pub(crate) fn debug_export(
        &self,
        unit: &Unit,
        meta: &TranslationMetadata,
        profile: Option<&Profile>,
    ) -> Result<ActionReport, SyncError> {
        let artifact = json!({
            "unit": meta.key,
            "label": unit.label(),
            "bundle": unit.bundle(),
            "profile": profile.map(|p| p.id.as_str()),
            "sourceAction": status::source_action(meta.source_status, meta.has_document()),
            "metadata": meta,
            "violations": meta.violations(),
        });

        Ok(ActionReport {
            message: format!("Exported debug information for '{}'", unit.label()),
            artifact: Some(artifact),
        })
    }
}
