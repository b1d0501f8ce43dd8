//! The synchronization engine: owns the collaborators and runs one action
//! against one unit at a time.

use std::sync::{Arc, PoisonError};

use log::{error, warn};
use serde::Serialize;
use tracing::info_span;

use crate::actions::{ActionKind, ActionReport, UnitOutcome};
use crate::config::EngineConfig;
use crate::content::ContentRepository;
use crate::error::{ConfigError, SyncError, TmsError};
use crate::identity::IdentityMapper;
use crate::locale::{self, LocaleMapper};
use crate::metadata::TranslationMetadata;
use crate::profile::{GateDecision, Profile, ProfileGate};
use crate::status::{
    self, Origin, SourceAction, SourceStatus, TargetAction, TargetStatus, TransitionPolicy,
};
use crate::store::{MetadataFilter, MetadataStore, UnitLocks};
use crate::tms::TmsClient;
use crate::unit::{Unit, UnitKey};

/// Rendering surface of one target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetView {
    pub langcode: String,
    pub status: Option<TargetStatus>,
    pub action: TargetAction,
}

/// Rendering surface of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatusView {
    pub unit: UnitKey,
    pub label: String,
    pub profile_id: Option<String>,
    pub document_id: Option<String>,
    pub job_id: Option<String>,
    pub source_status: SourceStatus,
    pub source_action: SourceAction,
    pub targets: Vec<TargetView>,
}

pub struct SyncEngine {
    pub(crate) tms: Arc<dyn TmsClient>,
    pub(crate) content: Arc<dyn ContentRepository>,
    pub(crate) store: Arc<dyn MetadataStore>,
    pub(crate) identity: IdentityMapper,
    pub(crate) gate: ProfileGate,
    pub(crate) policy: TransitionPolicy,
    /// Enabled langcodes in configuration order.
    pub(crate) langcodes: Vec<String>,
    worker_count: usize,
    locks: UnitLocks,
}

impl SyncEngine {
    pub fn new(
        config: &EngineConfig,
        tms: Arc<dyn TmsClient>,
        content: Arc<dyn ContentRepository>,
        store: Arc<dyn MetadataStore>,
    ) -> Result<Self, ConfigError> {
        let locales = LocaleMapper::from_config(config)?;
        let gate = ProfileGate::new(&config.profiles, &config.default_profiles)?;

        Ok(Self {
            identity: IdentityMapper::new(Arc::clone(&content), Arc::clone(&store), locales),
            tms,
            content,
            store,
            gate,
            policy: config.transition_policy,
            langcodes: config.enabled_langcodes(),
            worker_count: config.worker_count.max(1),
            locks: UnitLocks::new(),
        })
    }

    pub fn langcodes(&self) -> &[String] {
        &self.langcodes
    }

    pub fn profiles(&self) -> &ProfileGate {
        &self.gate
    }

    pub fn identity(&self) -> &IdentityMapper {
        &self.identity
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Runs one action against one unit and reports exactly one outcome.
    /// Errors never propagate: every failure becomes a failed outcome. A
    /// panicking collaborator unwinds to the caller.
    pub fn execute(&self, key: &UnitKey, action: &ActionKind) -> UnitOutcome {
        let _span = info_span!("step", unit = %key, action = action.name()).entered();

        let lock = self.locks.lock_for(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let unit = match self.identity.resolve_unit(key) {
            Ok(unit) => unit,
            Err(e) => {
                warn!("Could not resolve {}: {}", key, e);
                return UnitOutcome::failed(key, &key.to_string(), action, &e);
            }
        };

        let mut meta = match self.load_or_create(&unit) {
            Ok(meta) => meta,
            Err(e) => {
                error!("Could not load metadata of {}: {}", key, e);
                return UnitOutcome::failed(key, unit.label(), action, &e);
            }
        };

        let profile = if action.requires_gate() {
            match self.gate.gate(&unit, &meta) {
                GateDecision::Proceed(profile) => profile,
                GateDecision::Blocked(message) => {
                    warn!("{}", message);
                    return UnitOutcome::skipped(key, unit.label(), action, message);
                }
            }
        } else {
            self.gate.resolve_profile(&unit, &meta)
        };

        let result = self.run_action(&unit, &mut meta, profile, action);

        if action.saves_metadata() {
            meta.touch();
            if let Err(e) = self.store.save(&meta) {
                error!("Failed to save metadata of {}: {}", key, e);
                return UnitOutcome::failed(key, unit.label(), action, &SyncError::Store(e));
            }
        }

        match result {
            Ok(report) => UnitOutcome::succeeded(key, unit.label(), action, report),
            Err(e) => {
                warn!("{} failed for {}: {}", action.name(), key, e);
                UnitOutcome::failed(key, unit.label(), action, &e)
            }
        }
    }

    fn run_action(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
        profile: Option<&Profile>,
        action: &ActionKind,
    ) -> Result<ActionReport, SyncError> {
        match action {
            ActionKind::Upload { job_id } => self.upload(unit, meta, profile, job_id.as_deref()),
            ActionKind::CheckUpload => self.check_upload(unit, meta),
            ActionKind::RequestTranslations { langcode } => {
                self.request_translations(unit, meta, profile, langcode.as_deref())
            }
            ActionKind::CheckTranslations { langcode } => {
                self.check_translations(unit, meta, profile, langcode.as_deref())
            }
            ActionKind::Download { langcode } => {
                self.download(unit, meta, profile, langcode.as_deref())
            }
            ActionKind::Cancel { langcode } => self.cancel(unit, meta, langcode.as_deref()),
            ActionKind::ChangeProfile { profile_id } => {
                self.change_profile(unit, meta, profile_id)
            }
            ActionKind::AssignJob { job_id, notify } => {
                self.set_job(unit, meta, Some(job_id), *notify)
            }
            ActionKind::ClearJob { notify } => self.set_job(unit, meta, None, *notify),
            ActionKind::Disassociate => self.disassociate(unit, meta),
            ActionKind::DebugExport => self.debug_export(unit, meta, profile),
        }
    }

    pub(crate) fn load_or_create(&self, unit: &Unit) -> Result<TranslationMetadata, SyncError> {
        let key = unit.key();
        Ok(self
            .store
            .load(&key)?
            .unwrap_or_else(|| TranslationMetadata::new(key, unit.source_langcode())))
    }

    /// Target langcodes of a unit: every enabled language but the source.
    pub(crate) fn target_langcodes<'a>(
        &'a self,
        meta: &'a TranslationMetadata,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.langcodes
            .iter()
            .map(String::as_str)
            .filter(move |l| *l != meta.source_langcode)
    }

    /// Marks a unit's local content as changed. A tracked source moves to
    /// `EDITED` together with every `CURRENT` target; on a profile with
    /// automatic upload the unit is re-uploaded right away.
    pub fn content_changed(&self, key: &UnitKey) -> UnitOutcome {
        let action = ActionKind::Upload { job_id: None };
        let _span = info_span!("content_changed", unit = %key).entered();

        let lock = self.locks.lock_for(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let unit = match self.identity.resolve_unit(key) {
            Ok(unit) => unit,
            Err(e) => return UnitOutcome::failed(key, &key.to_string(), &action, &e),
        };
        let mut meta = match self.store.load(key) {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                return UnitOutcome::skipped(
                    key,
                    unit.label(),
                    &action,
                    format!("'{}' is not tracked yet", unit.label()),
                )
            }
            Err(e) => return UnitOutcome::failed(key, unit.label(), &action, &SyncError::Store(e)),
        };

        let result = self.mark_edited(&unit, &mut meta);

        meta.touch();
        if let Err(e) = self.store.save(&meta) {
            return UnitOutcome::failed(key, unit.label(), &action, &SyncError::Store(e));
        }
        match result {
            Ok(report) => UnitOutcome::succeeded(key, unit.label(), &action, report),
            Err(e) => UnitOutcome::failed(key, unit.label(), &action, &e),
        }
    }

    fn mark_edited(
        &self,
        unit: &Unit,
        meta: &mut TranslationMetadata,
    ) -> Result<ActionReport, SyncError> {
        if matches!(
            meta.source_status,
            SourceStatus::Current | SourceStatus::Importing
        ) {
            meta.transition_source(SourceStatus::Edited, Origin::Local, self.policy)?;
        }
        let current: Vec<String> = meta
            .target_status
            .iter()
            .filter(|(_, s)| **s == TargetStatus::Current)
            .map(|(l, _)| l.clone())
            .collect();
        for langcode in &current {
            meta.transition_target(langcode, TargetStatus::Edited, Origin::Local, self.policy)?;
        }

        let auto_upload = match self.gate.gate(unit, meta) {
            GateDecision::Proceed(Some(profile)) if profile.auto_upload => Some(profile),
            _ => None,
        };
        match auto_upload {
            Some(profile) if meta.is_upload_needed() => {
                self.upload(unit, meta, Some(profile), None)
            }
            _ => Ok(ActionReport::message(format!(
                "'{}' marked as edited",
                unit.label()
            ))),
        }
    }

    pub fn metadata(&self, key: &UnitKey) -> Result<Option<TranslationMetadata>, SyncError> {
        Ok(self.store.load(key)?)
    }

    pub fn query(
        &self,
        filter: &MetadataFilter,
    ) -> Result<(Vec<TranslationMetadata>, u64), SyncError> {
        Ok(self.store.query(filter)?)
    }

    /// Source and per-target statuses with their next actions. Targets
    /// disabled by the unit's profile show as `DISABLED`.
    pub fn status_view(&self, key: &UnitKey) -> Result<UnitStatusView, SyncError> {
        let unit = self.identity.resolve_unit(key)?;
        let meta = self.load_or_create(&unit)?;
        let profile = self.gate.resolve_profile(&unit, &meta);

        let targets = self
            .target_langcodes(&meta)
            .map(|langcode| {
                let status = match meta.target(langcode) {
                    Some(reported) => Some(ProfileGate::effective_target_status(
                        profile, langcode, reported,
                    )),
                    None if ProfileGate::is_target_disabled(profile, langcode) => {
                        Some(TargetStatus::Disabled)
                    }
                    None => None,
                };
                TargetView {
                    langcode: langcode.to_string(),
                    status,
                    action: status::target_action(status),
                }
            })
            .collect();

        Ok(UnitStatusView {
            unit: meta.key.clone(),
            label: unit.label().to_string(),
            profile_id: profile.map(|p| p.id.clone()),
            document_id: meta.document_id.clone(),
            job_id: meta.job_id.clone(),
            source_status: meta.source_status,
            source_action: if meta.document_archived {
                SourceAction::Upload
            } else {
                status::source_action(meta.source_status, meta.has_document())
            },
            targets,
        })
    }

    /// Checks every configured locale against the TMS. Returns warnings;
    /// an unreachable TMS is a warning too.
    pub fn verify_locales(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for langcode in self.identity.locales().langcodes() {
            let Ok(locale) = self.identity.to_remote(langcode) else {
                continue;
            };
            match locale::validate_remote_locale(self.tms.as_ref(), locale) {
                Ok(true) => {}
                Ok(false) => warnings.push(format!(
                    "Locale '{}' for language '{}' is not available at the TMS",
                    locale, langcode
                )),
                Err(e) => {
                    warnings.push(format!("Could not verify locales: {}", e));
                    break;
                }
            }
        }
        for warning in &warnings {
            warn!("{}", warning);
        }
        warnings
    }

    /// Applies the self-healing side effects of a remote error.
    pub(crate) fn absorb_tms_error(&self, meta: &mut TranslationMetadata, err: &TmsError) {
        if let TmsError::DocumentLocked {
            document_id,
            new_document_id,
        } = err
        {
            warn!(
                "Document {} of {} was superseded by {}",
                document_id, meta.key, new_document_id
            );
            meta.document_id = Some(new_document_id.clone());
        }
        if let TmsError::DocumentArchived { document_id } = err {
            if meta.document_id.as_deref() == Some(document_id.as_str()) {
                warn!(
                    "Document {} of {} was archived, next upload starts a new one",
                    document_id, meta.key
                );
                meta.document_archived = true;
            }
        }
    }
}
