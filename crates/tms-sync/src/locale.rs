//! Bidirectional mapping between local langcodes and remote locales.

use std::collections::{BTreeMap, HashMap};

use crate::config::EngineConfig;
use crate::error::{ConfigError, SyncError, TmsError};
use crate::tms::TmsClient;

#[derive(Debug, Clone, Default)]
pub struct LocaleMapper {
    to_remote: BTreeMap<String, String>,
    to_local: HashMap<String, String>,
}

impl LocaleMapper {
    /// Builds the mapper from `(langcode, locale)` pairs. Both directions
    /// must be injective.
    pub fn new<I, L, R>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        let mut mapper = Self::default();
        for (langcode, locale) in pairs {
            let langcode = langcode.into();
            let locale = locale.into();

            if mapper.to_remote.contains_key(&langcode) {
                return Err(ConfigError::InvalidLanguage {
                    langcode,
                    reason: "Mapped to more than one locale".to_string(),
                });
            }
            if let Some(other) = mapper.to_local.get(&locale) {
                return Err(ConfigError::InvalidLanguage {
                    langcode,
                    reason: format!("Locale '{}' is already mapped to '{}'", locale, other),
                });
            }

            mapper.to_local.insert(locale.clone(), langcode.clone());
            mapper.to_remote.insert(langcode, locale);
        }
        Ok(mapper)
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::new(
            config
                .languages
                .iter()
                .map(|l| (l.langcode.as_str(), l.locale.as_str())),
        )
    }

    pub fn to_remote(&self, langcode: &str) -> Result<&str, SyncError> {
        self.to_remote
            .get(langcode)
            .map(String::as_str)
            .ok_or_else(|| SyncError::UnmappedLocale(langcode.to_string()))
    }

    pub fn to_langcode(&self, locale: &str) -> Result<&str, SyncError> {
        self.to_local
            .get(locale)
            .map(String::as_str)
            .ok_or_else(|| SyncError::UnmappedLocale(locale.to_string()))
    }

    pub fn langcodes(&self) -> impl Iterator<Item = &str> {
        self.to_remote.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.to_remote.is_empty()
    }
}

/// Asks the TMS whether it knows `locale`.
pub fn validate_remote_locale(tms: &dyn TmsClient, locale: &str) -> Result<bool, TmsError> {
    Ok(tms.list_locales()?.iter().any(|l| l == locale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tms::SandboxTms;

    fn mapper() -> LocaleMapper {
        LocaleMapper::new([("en", "en_US"), ("es", "es_ES"), ("pt-br", "pt_BR")]).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let mapper = mapper();
        for langcode in ["en", "es", "pt-br"] {
            let locale = mapper.to_remote(langcode).unwrap();
            assert_eq!(mapper.to_langcode(locale).unwrap(), langcode);
        }
        assert_eq!(mapper.langcodes().collect::<Vec<_>>(), vec!["en", "es", "pt-br"]);
    }

    #[test]
    fn test_unmapped() {
        let mapper = mapper();
        assert!(matches!(
            mapper.to_remote("fr"),
            Err(SyncError::UnmappedLocale(l)) if l == "fr"
        ));
        assert!(mapper.to_langcode("fr_FR").is_err());
    }

    #[test]
    fn test_must_be_injective() {
        assert!(LocaleMapper::new([("pt", "pt_BR"), ("pt-br", "pt_BR")]).is_err());
        assert!(LocaleMapper::new([("en", "en_US"), ("en", "en_GB")]).is_err());
    }

    #[test]
    fn test_validate_remote_locale() {
        let tms = SandboxTms::new();
        tms.set_locales(&["en_US", "de_DE"]);
        assert!(validate_remote_locale(&tms, "de_DE").unwrap());
        assert!(!validate_remote_locale(&tms, "xx_XX").unwrap());
    }
}
