use serde::{Deserialize, Serialize};

use crate::profile::Profile;
use crate::status::TransitionPolicy;
use crate::unit::UnitKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub version: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub transition_policy: TransitionPolicy,
    #[serde(default)]
    pub languages: Vec<LanguageConfig>,
    /// Custom profiles on top of the built-in `automatic`, `manual` and
    /// `disabled` profiles.
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub default_profiles: Vec<DefaultProfileRule>,
    #[serde(default)]
    pub database_path: Option<String>,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

impl EngineConfig {
    /// Langcodes of enabled languages, in configuration order.
    pub fn enabled_langcodes(&self) -> Vec<String> {
        self.languages
            .iter()
            .filter(|l| l.enabled)
            .map(|l| l.langcode.clone())
            .collect()
    }
}

/// A local language and the remote locale it maps to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub langcode: String,
    pub locale: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Default profile for units without an explicit one. A rule with a bundle
/// wins over a rule for the whole kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultProfileRule {
    pub kind: UnitKind,
    #[serde(default)]
    pub bundle: Option<String>,
    pub profile: String,
}
