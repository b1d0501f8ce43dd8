use log::{debug, info};

use super::ActionReport;
use crate::engine::SyncEngine;
use crate::error::{SyncError, TargetFailure};
use crate::metadata::TranslationMetadata;
use crate::profile::{Profile, ProfileGate};
use crate::status::{Origin, SourceStatus, TargetStatus};
use crate::unit::Unit;

/// Per-language results of a multi-language action.
#[derive(Default)]
struct TargetResults {
    done: Vec<String>,
    failures: Vec<TargetFailure>,
    /// The error of a single-language run, kept typed.
    single: Option<SyncError>,
}

impl TargetResults {
    fn fail(&mut self, langcode: &str, err: SyncError, single: bool) {
        if single {
            self.single = Some(err);
        } else {
            self.failures.push(TargetFailure {
                langcode: langcode.to_string(),
                error: err.to_string(),
            });
        }
    }

    fn finish(self, message: impl FnOnce(&[String]) -> String) -> Result<ActionReport, SyncError> {
        if let Some(err) = self.single {
            return Err(err);
        }
        if !self.failures.is_empty() {
            return Err(SyncError::Targets(self.failures));
        }
        Ok(ActionReport::message(message(&self.done)))
    }
}

impl SyncEngine {
    /// Validates an explicit target language before any remote call.
    fn check_target_langcode(
        &self,
        meta: &TranslationMetadata,
        profile: Option<&Profile>,
        langcode: &str,
    ) -> Result<(), SyncError> {
        if langcode == meta.source_langcode {
            return Err(SyncError::illegal(
                meta.key.to_string(),
                format!("'{}' is the source language", langcode),
            ));
        }
        if ProfileGate::is_target_disabled(profile, langcode) {
            return Err(SyncError::illegal(
                meta.key.to_string(),
                format!("translation to '{}' is disabled by the profile", langcode),
            ));
        }
        Ok(())
    }

    pub(crate) fn request_translations(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
        profile: Option<&Profile>,
        langcode: Option<&str>,
    ) -> Result<ActionReport, SyncError> {
        self.require_document(unit, meta)?;
        if !matches!(
            meta.source_status,
            SourceStatus::Current | SourceStatus::Importing
        ) {
            return Err(SyncError::illegal(
                meta.key.to_string(),
                format!(
                    "source of '{}' is {}, upload it before requesting translations",
                    unit.label(),
                    meta.source_status
                ),
            ));
        }

        let langcodes: Vec<String> = match langcode {
            Some(langcode) => {
                self.check_target_langcode(meta, profile, langcode)?;
                meta.ensure_target_transition(langcode, TargetStatus::Pending, self.policy)?;
                vec![langcode.to_string()]
            }
            None => {
                let mut selected = Vec::new();
                let all: Vec<String> = self.target_langcodes(meta).map(str::to_string).collect();
                for langcode in all {
                    if ProfileGate::is_target_disabled(profile, &langcode) {
                        meta.force_target(&langcode, TargetStatus::Disabled);
                    } else if meta.target(&langcode).map_or(true, |s| s.is_requestable()) {
                        selected.push(langcode);
                    }
                }
                selected
            }
        };
        let single = langcode.is_some();

        let mut results = TargetResults::default();
        for langcode in &langcodes {
            let locale = match self.identity.to_remote(langcode) {
                Ok(locale) => locale.to_string(),
                Err(e) => {
                    results.fail(langcode, e, single);
                    continue;
                }
            };
            let Some(document_id) = meta.document_id.clone() else {
                break;
            };

            match self.tms.request_target(&document_id, &locale) {
                Ok(true) => {
                    meta.transition_target(
                        langcode,
                        TargetStatus::Pending,
                        Origin::Local,
                        self.policy,
                    )?;
                    results.done.push(langcode.clone());
                }
                Ok(false) => {
                    debug!("TMS did not accept request of {} for {}", langcode, meta.key);
                    meta.transition_target(
                        langcode,
                        TargetStatus::Request,
                        Origin::Remote,
                        self.policy,
                    )?;
                    results.done.push(langcode.clone());
                }
                Err(e) => {
                    self.absorb_tms_error(meta, &e);
                    if e.is_generic() {
                        meta.force_target(langcode, TargetStatus::Error);
                    }
                    results.fail(langcode, e.into(), single);
                }
            }
        }

        let label = unit.label().to_string();
        results.finish(|done| {
            if done.is_empty() {
                format!("No translations to request for '{}'", label)
            } else {
                info!("Requested {} for {}", done.join(", "), label);
                format!("Requested {} for '{}'", done.join(", "), label)
            }
        })
    }

    pub(crate) fn check_translations(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
        profile: Option<&Profile>,
        langcode: Option<&str>,
    ) -> Result<ActionReport, SyncError> {
        self.require_document(unit, meta)?;

        let langcodes: Vec<String> = match langcode {
            Some(langcode) if langcode == meta.source_langcode => {
                return Err(SyncError::illegal(
                    meta.key.to_string(),
                    format!("'{}' is the source language", langcode),
                ));
            }
            Some(langcode) => vec![langcode.to_string()],
            None => self.target_langcodes(meta).map(str::to_string).collect(),
        };
        let single = langcode.is_some();

        let mut results = TargetResults::default();
        for langcode in &langcodes {
            if ProfileGate::is_target_disabled(profile, langcode) {
                meta.force_target(langcode, TargetStatus::Disabled);
                results.done.push(format!("{}: {}", langcode, TargetStatus::Disabled));
                continue;
            }
            let locale = match self.identity.to_remote(langcode) {
                Ok(locale) => locale.to_string(),
                Err(e) => {
                    results.fail(langcode, e, single);
                    continue;
                }
            };
            let Some(document_id) = meta.document_id.clone() else {
                break;
            };

            let reported = match self.tms.get_target_status(&document_id, &locale) {
                Ok(reported) => reported,
                Err(e) => {
                    self.absorb_tms_error(meta, &e);
                    results.fail(langcode, e.into(), single);
                    continue;
                }
            };
            let status = ProfileGate::effective_target_status(profile, langcode, reported);
            meta.transition_target(langcode, status, Origin::Remote, self.policy)?;

            let auto_download =
                status == TargetStatus::Ready && profile.is_some_and(|p| p.auto_downloads(langcode));
            if !auto_download {
                results.done.push(format!("{}: {}", langcode, status));
                continue;
            }
            match self.download_one(unit, meta, langcode) {
                Ok(()) => results.done.push(format!("{}: downloaded", langcode)),
                Err(e) => results.fail(langcode, e, single),
            }
        }

        let label = unit.label().to_string();
        results.finish(|done| {
            if done.is_empty() {
                format!("No translations to check for '{}'", label)
            } else {
                format!("'{}': {}", label, done.join(", "))
            }
        })
    }

    pub(crate) fn download(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
        profile: Option<&Profile>,
        langcode: Option<&str>,
    ) -> Result<ActionReport, SyncError> {
        self.require_document(unit, meta)?;

        let langcodes: Vec<String> = match langcode {
            Some(langcode) => {
                self.check_target_langcode(meta, profile, langcode)?;
                let status = meta.target(langcode);
                if !status.is_some_and(|s| s.is_downloadable()) {
                    return Err(SyncError::illegal(
                        meta.key.to_string(),
                        format!(
                            "translation '{}' is {}, nothing to download",
                            langcode,
                            status.map(|s| s.as_str()).unwrap_or("not requested")
                        ),
                    ));
                }
                vec![langcode.to_string()]
            }
            None => self
                .target_langcodes(meta)
                .filter(|l| !ProfileGate::is_target_disabled(profile, l))
                .filter(|l| meta.target(l).is_some_and(|s| s.is_downloadable()))
                .map(str::to_string)
                .collect(),
        };
        let single = langcode.is_some();

        let mut results = TargetResults::default();
        for langcode in &langcodes {
            match self.download_one(unit, meta, langcode) {
                Ok(()) => results.done.push(langcode.clone()),
                Err(e) => results.fail(langcode, e, single),
            }
        }

        let label = unit.label().to_string();
        results.finish(|done| {
            if done.is_empty() {
                format!("No translations ready for '{}'", label)
            } else {
                format!("Downloaded {} for '{}'", done.join(", "), label)
            }
        })
    }

    /// Downloads one target into the CMS. On failure the target status is
    /// left as it was.
    pub(crate) fn download_one(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
        langcode: &str,
    ) -> Result<(), SyncError> {
        let document_id = self.require_document(unit, meta)?;
        let locale = self.identity.to_remote(langcode)?.to_string();
        meta.ensure_target_transition(langcode, TargetStatus::Current, self.policy)?;

        let translation = match self.tms.download(&document_id, &locale) {
            Ok(translation) => translation,
            Err(e) => {
                self.absorb_tms_error(meta, &e);
                return Err(e.into());
            }
        };
        self.content
            .save_translation(&meta.key, langcode, &translation)?;
        meta.transition_target(langcode, TargetStatus::Current, Origin::Local, self.policy)?;

        info!("Downloaded {} translation of {}", langcode, meta.key);
        Ok(())
    }

    pub(crate) fn cancel(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
        langcode: Option<&str>,
    ) -> Result<ActionReport, SyncError> {
        let document_id = self.require_document(unit, meta)?;

        match langcode {
            None => {
                if let Err(e) = self.tms.cancel_document(&document_id) {
                    self.absorb_tms_error(meta, &e);
                    return Err(e.into());
                }
                meta.transition_source(SourceStatus::Cancelled, Origin::Local, self.policy)?;
                let live: Vec<String> = meta
                    .target_status
                    .iter()
                    .filter(|(_, s)| **s != TargetStatus::Disabled)
                    .map(|(l, _)| l.clone())
                    .collect();
                for langcode in &live {
                    meta.force_target(langcode, TargetStatus::Cancelled);
                }
                Ok(ActionReport::message(format!(
                    "Cancelled document of '{}'",
                    unit.label()
                )))
            }
            Some(langcode) => {
                if langcode == meta.source_langcode {
                    return Err(SyncError::illegal(
                        meta.key.to_string(),
                        format!("'{}' is the source language", langcode),
                    ));
                }
                let locale = self.identity.to_remote(langcode)?.to_string();
                if let Err(e) = self.tms.cancel_target(&document_id, &locale) {
                    self.absorb_tms_error(meta, &e);
                    return Err(e.into());
                }
                meta.force_target(langcode, TargetStatus::Cancelled);
                Ok(ActionReport::message(format!(
                    "Cancelled '{}' translation of '{}'",
                    langcode,
                    unit.label()
                )))
            }
        }
    }
}
