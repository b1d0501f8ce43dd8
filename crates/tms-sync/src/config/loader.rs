use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::schema::EngineConfig;
use crate::error::ConfigError;
use crate::locale::LocaleMapper;
use crate::profile::ProfileGate;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

static RE_LANGCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})*$").unwrap());
static RE_LOCALE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}([_-][A-Za-z0-9]{2,8})*$").unwrap());

/// Loads a configuration file. `.yaml`/`.yml` files are read as YAML,
/// anything else as JSON.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_config_from_yaml_str(&content),
        _ => load_config_from_str(&content),
    }
}

pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;
    load_config_from_value(json_value)
}

pub fn load_config_from_yaml_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let json_value: serde_json::Value = serde_yaml::from_str(content)?;
    load_config_from_value(json_value)
}

fn load_config_from_value(json_value: serde_json::Value) -> Result<EngineConfig, ConfigError> {
    validate_schema(&json_value)?;

    let config: EngineConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Semantic checks the schema cannot express.
pub fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    let mut langcodes = HashSet::new();
    for language in &config.languages {
        if !langcodes.insert(language.langcode.as_str()) {
            return Err(ConfigError::InvalidLanguage {
                langcode: language.langcode.clone(),
                reason: "Duplicate langcode".to_string(),
            });
        }
        if !RE_LANGCODE.is_match(&language.langcode) {
            return Err(ConfigError::InvalidLanguage {
                langcode: language.langcode.clone(),
                reason: "Not a valid langcode".to_string(),
            });
        }
        if !RE_LOCALE.is_match(&language.locale) {
            return Err(ConfigError::InvalidLanguage {
                langcode: language.langcode.clone(),
                reason: format!("'{}' is not a valid locale", language.locale),
            });
        }
    }

    LocaleMapper::from_config(config)?;
    ProfileGate::new(&config.profiles, &config.default_profiles)?;

    Ok(())
}
