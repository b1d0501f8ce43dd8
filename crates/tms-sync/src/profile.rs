//! Translation profiles and the eligibility gate.
//!
//! A profile bundles the automation policy of a unit (auto upload, request
//! and download) with per-language overrides. Units without an explicit
//! profile fall back to the most specific configured default.

use std::collections::{BTreeMap, HashMap};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::DefaultProfileRule;
use crate::error::{ConfigError, SyncError};
use crate::metadata::TranslationMetadata;
use crate::status::{SourceStatus, TargetStatus};
use crate::unit::{Unit, UnitKind};

pub const AUTOMATIC_PROFILE: &str = "automatic";
pub const MANUAL_PROFILE: &str = "manual";
pub const DISABLED_PROFILE: &str = "disabled";

const BUILTIN_PROFILES: [&str; 3] = [AUTOMATIC_PROFILE, MANUAL_PROFILE, DISABLED_PROFILE];

/// Per-language override inside a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageOverride {
    #[default]
    Default,
    /// Never translated for units on this profile.
    Disabled,
    /// Translated, but never downloaded automatically.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub auto_upload: bool,
    #[serde(default)]
    pub auto_request: bool,
    #[serde(default)]
    pub auto_download: bool,
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageOverride>,
}

impl Profile {
    fn builtin(id: &str, label: &str, automatic: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            auto_upload: automatic,
            auto_request: automatic,
            auto_download: automatic,
            languages: BTreeMap::new(),
        }
    }

    pub fn automatic() -> Self {
        Self::builtin(AUTOMATIC_PROFILE, "Automatic", true)
    }

    pub fn manual() -> Self {
        Self::builtin(MANUAL_PROFILE, "Manual", false)
    }

    pub fn disabled() -> Self {
        Self::builtin(DISABLED_PROFILE, "Disabled", false)
    }

    pub fn is_disabled(&self) -> bool {
        self.id == DISABLED_PROFILE
    }

    pub fn is_target_disabled(&self, langcode: &str) -> bool {
        self.is_disabled()
            || self.languages.get(langcode) == Some(&LanguageOverride::Disabled)
    }

    /// Whether a target reported `READY` is downloaded without user action.
    pub fn auto_downloads(&self, langcode: &str) -> bool {
        self.auto_download
            && matches!(
                self.languages.get(langcode).copied().unwrap_or_default(),
                LanguageOverride::Default
            )
    }
}

/// Outcome of gating a unit before a remote action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision<'a> {
    /// The action may run. Configuration units may proceed without a profile.
    Proceed(Option<&'a Profile>),
    /// The unit is skipped with a warning.
    Blocked(String),
}

/// What a profile change did to the metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChange {
    pub previous: Option<String>,
    /// The unit left the disabled profile with a live document, so its
    /// target statuses should be refreshed from the TMS.
    pub refresh_targets: bool,
}

pub struct ProfileGate {
    profiles: HashMap<String, Profile>,
    defaults: Vec<DefaultProfileRule>,
}

impl ProfileGate {
    pub fn new(custom: &[Profile], defaults: &[DefaultProfileRule]) -> Result<Self, ConfigError> {
        let mut profiles: HashMap<String, Profile> = [
            Profile::automatic(),
            Profile::manual(),
            Profile::disabled(),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

        for profile in custom {
            if BUILTIN_PROFILES.contains(&profile.id.as_str()) {
                return Err(ConfigError::InvalidProfile {
                    id: profile.id.clone(),
                    reason: "Reserved built-in profile id".to_string(),
                });
            }
            if profiles.insert(profile.id.clone(), profile.clone()).is_some() {
                return Err(ConfigError::InvalidProfile {
                    id: profile.id.clone(),
                    reason: "Duplicate profile id".to_string(),
                });
            }
        }

        for rule in defaults {
            if !profiles.contains_key(&rule.profile) {
                return Err(ConfigError::InvalidProfile {
                    id: rule.profile.clone(),
                    reason: format!("Default profile for '{}' does not exist", rule.kind),
                });
            }
        }

        Ok(Self {
            profiles,
            defaults: defaults.to_vec(),
        })
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.profiles.contains_key(id)
    }

    fn default_for(&self, kind: UnitKind, bundle: Option<&str>) -> Option<&Profile> {
        let bundle_rule = bundle.and_then(|b| {
            self.defaults
                .iter()
                .find(|r| r.kind == kind && r.bundle.as_deref() == Some(b))
        });
        let rule = bundle_rule.or_else(|| {
            self.defaults
                .iter()
                .find(|r| r.kind == kind && r.bundle.is_none())
        })?;
        self.profiles.get(&rule.profile)
    }

    /// Resolves the profile governing a unit: the explicit metadata profile,
    /// then the configured default for its kind and bundle.
    pub fn resolve_profile(&self, unit: &Unit, meta: &TranslationMetadata) -> Option<&Profile> {
        if let Some(id) = &meta.profile_id {
            match self.profiles.get(id) {
                Some(profile) => return Some(profile),
                None => warn!(
                    "Unknown profile '{}' on {}, falling back to default",
                    id, meta.key
                ),
            }
        }
        self.default_for(unit.kind(), unit.bundle())
    }

    /// Decides whether a remote action may proceed for the unit.
    ///
    /// Content units without a profile are blocked; configuration units
    /// without one proceed. Units on the disabled profile are blocked.
    pub fn gate<'a>(&'a self, unit: &Unit, meta: &TranslationMetadata) -> GateDecision<'a> {
        match self.resolve_profile(unit, meta) {
            Some(profile) if profile.is_disabled() => GateDecision::Blocked(format!(
                "'{}' has translation disabled by its profile so it was not processed",
                unit.label()
            )),
            Some(profile) => GateDecision::Proceed(Some(profile)),
            None if unit.kind().is_configuration() => GateDecision::Proceed(None),
            None => GateDecision::Blocked(format!(
                "'{}' has no profile assigned so it was not processed",
                unit.label()
            )),
        }
    }

    pub fn is_target_disabled(profile: Option<&Profile>, langcode: &str) -> bool {
        profile.is_some_and(|p| p.is_target_disabled(langcode))
    }

    /// The status to record for a remotely reported target value.
    pub fn effective_target_status(
        profile: Option<&Profile>,
        langcode: &str,
        reported: TargetStatus,
    ) -> TargetStatus {
        if Self::is_target_disabled(profile, langcode) {
            TargetStatus::Disabled
        } else {
            reported
        }
    }

    /// Moves the record onto a new profile and applies the disable or
    /// re-activate side effects. Does not persist anything.
    pub fn apply_profile_change(
        &self,
        meta: &mut TranslationMetadata,
        new_profile_id: &str,
        langcodes: &[String],
    ) -> Result<ProfileChange, SyncError> {
        let profile = self.profiles.get(new_profile_id).ok_or_else(|| {
            SyncError::illegal(
                meta.key.to_string(),
                format!("unknown profile '{}'", new_profile_id),
            )
        })?;

        let previous = meta.profile_id.replace(new_profile_id.to_string());
        let was_disabled = meta.source_status == SourceStatus::Disabled;
        let targets = langcodes
            .iter()
            .filter(|l| **l != meta.source_langcode)
            .cloned()
            .chain(meta.target_status.keys().cloned())
            .collect::<std::collections::BTreeSet<_>>();

        if profile.is_disabled() {
            meta.source_status = SourceStatus::Disabled;
            for langcode in &targets {
                meta.force_target(langcode, TargetStatus::Disabled);
            }
            return Ok(ProfileChange {
                previous,
                refresh_targets: false,
            });
        }

        if was_disabled {
            meta.source_status = if meta.has_document() {
                SourceStatus::Current
            } else {
                SourceStatus::Untracked
            };
        }

        for langcode in &targets {
            if profile.is_target_disabled(langcode) {
                meta.force_target(langcode, TargetStatus::Disabled);
            } else if meta.target(langcode) == Some(TargetStatus::Disabled) {
                meta.target_status
                    .insert(langcode.clone(), TargetStatus::Request);
            }
        }

        Ok(ProfileChange {
            previous,
            refresh_targets: was_disabled && meta.has_document(),
        })
    }
}
