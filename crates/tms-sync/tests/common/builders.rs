//! Builders for engine configurations and CMS units used across the
//! integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use tms_sync::config::loader::validate_config;
use tms_sync::config::{DefaultProfileRule, EngineConfig, LanguageConfig};
use tms_sync::profile::{LanguageOverride, Profile};
use tms_sync::unit::{ConfigObject, ContentItem, Unit, UnitKind};
use tms_sync::TransitionPolicy;

/// Builder for `EngineConfig`. Starts with English, Spanish and German and
/// content on the `manual` profile.
pub struct ConfigBuilder {
    worker_count: usize,
    policy: TransitionPolicy,
    languages: Vec<LanguageConfig>,
    profiles: Vec<Profile>,
    default_profiles: Vec<DefaultProfileRule>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            worker_count: 2,
            policy: TransitionPolicy::Lenient,
            languages: vec![
                language("en", "en_US"),
                language("es", "es_ES"),
                language("de", "de_DE"),
            ],
            profiles: vec![],
            default_profiles: vec![DefaultProfileRule {
                kind: UnitKind::Content,
                bundle: None,
                profile: "manual".to_string(),
            }],
        }
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn strict(mut self) -> Self {
        self.policy = TransitionPolicy::Strict;
        self
    }

    pub fn languages(mut self, languages: &[(&str, &str)]) -> Self {
        self.languages = languages
            .iter()
            .map(|(langcode, locale)| language(langcode, locale))
            .collect();
        self
    }

    pub fn profile(mut self, profile: Profile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Replaces the default profile of content units.
    pub fn content_profile(mut self, profile_id: &str) -> Self {
        self.default_profiles
            .retain(|rule| rule.kind != UnitKind::Content || rule.bundle.is_some());
        self.default_profiles.push(DefaultProfileRule {
            kind: UnitKind::Content,
            bundle: None,
            profile: profile_id.to_string(),
        });
        self
    }

    pub fn no_default_profiles(mut self) -> Self {
        self.default_profiles.clear();
        self
    }

    pub fn bundle_profile(mut self, bundle: &str, profile_id: &str) -> Self {
        self.default_profiles.push(DefaultProfileRule {
            kind: UnitKind::Content,
            bundle: Some(bundle.to_string()),
            profile: profile_id.to_string(),
        });
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> EngineConfig {
        let config = EngineConfig {
            version: "1.0".to_string(),
            worker_count: self.worker_count,
            transition_policy: self.policy,
            languages: self.languages,
            profiles: self.profiles,
            default_profiles: self.default_profiles,
            database_path: None,
        };
        validate_config(&config).expect("test config must be valid");
        config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn language(langcode: &str, locale: &str) -> LanguageConfig {
    LanguageConfig {
        langcode: langcode.to_string(),
        locale: locale.to_string(),
        enabled: true,
    }
}

/// Builder for custom profiles.
pub struct ProfileBuilder {
    profile: Profile,
}

impl ProfileBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            profile: Profile {
                id: id.to_string(),
                label: id.to_string(),
                auto_upload: false,
                auto_request: false,
                auto_download: false,
                languages: BTreeMap::new(),
            },
        }
    }

    pub fn automatic(mut self) -> Self {
        self.profile.auto_upload = true;
        self.profile.auto_request = true;
        self.profile.auto_download = true;
        self
    }

    pub fn disable_language(mut self, langcode: &str) -> Self {
        self.profile
            .languages
            .insert(langcode.to_string(), LanguageOverride::Disabled);
        self
    }

    pub fn manual_language(mut self, langcode: &str) -> Self {
        self.profile
            .languages
            .insert(langcode.to_string(), LanguageOverride::Manual);
        self
    }

    pub fn build(self) -> Profile {
        self.profile
    }
}

pub fn page(id: &str, title: &str) -> Unit {
    article(id, "page", title)
}

pub fn article(id: &str, bundle: &str, title: &str) -> Unit {
    Unit::Content(ContentItem {
        id: id.to_string(),
        bundle: bundle.to_string(),
        title: title.to_string(),
        langcode: "en".to_string(),
        body: format!("<p>{}</p>", title),
    })
}

pub fn config_object(name: &str, label: &str) -> Unit {
    Unit::ConfigObject(ConfigObject {
        name: name.to_string(),
        label: label.to_string(),
        langcode: "en".to_string(),
        data: format!("{{\"name\": \"{}\"}}", label),
    })
}
