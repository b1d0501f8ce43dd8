//! Translatable units owned by the CMS.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a translatable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// A content item (article, page, ...).
    Content,
    /// A configuration object (site settings, a view, ...).
    ConfigObject,
    /// A group of configuration fields attached to an entity bundle.
    FieldGroup,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Content => "content",
            UnitKind::ConfigObject => "config_object",
            UnitKind::FieldGroup => "field_group",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "content" => Some(UnitKind::Content),
            "config_object" => Some(UnitKind::ConfigObject),
            "field_group" => Some(UnitKind::FieldGroup),
            _ => None,
        }
    }

    /// Configuration-backed kinds are eligible even without a profile.
    pub fn is_configuration(&self) -> bool {
        matches!(self, UnitKind::ConfigObject | UnitKind::FieldGroup)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a unit: `(kind, local id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitKey {
    pub kind: UnitKind,
    pub local_id: String,
}

impl UnitKey {
    pub fn new(kind: UnitKind, local_id: impl Into<String>) -> Self {
        Self {
            kind,
            local_id: local_id.into(),
        }
    }

    pub fn content(local_id: impl Into<String>) -> Self {
        Self::new(UnitKind::Content, local_id)
    }

    pub fn config_object(local_id: impl Into<String>) -> Self {
        Self::new(UnitKind::ConfigObject, local_id)
    }

    pub fn field_group(local_id: impl Into<String>) -> Self {
        Self::new(UnitKind::FieldGroup, local_id)
    }

    /// Parses the `kind:local_id` form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let (kind, local_id) = s.split_once(':')?;
        if local_id.is_empty() {
            return None;
        }
        Some(Self::new(UnitKind::parse(kind)?, local_id))
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.local_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    /// Content type, used for default profile lookup.
    pub bundle: String,
    pub title: String,
    pub langcode: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigObject {
    /// Configuration name, e.g. `system.site`.
    pub name: String,
    pub label: String,
    pub langcode: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroup {
    /// `entity_type.bundle.field` identifier.
    pub id: String,
    pub entity_type: String,
    pub bundle: String,
    pub label: String,
    pub langcode: String,
    pub data: String,
}

/// A resolved translatable unit. All actions go through these accessors
/// and never look at the concrete variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Content(ContentItem),
    ConfigObject(ConfigObject),
    FieldGroup(FieldGroup),
}

impl Unit {
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Content(_) => UnitKind::Content,
            Unit::ConfigObject(_) => UnitKind::ConfigObject,
            Unit::FieldGroup(_) => UnitKind::FieldGroup,
        }
    }

    pub fn key(&self) -> UnitKey {
        match self {
            Unit::Content(c) => UnitKey::content(&c.id),
            Unit::ConfigObject(c) => UnitKey::config_object(&c.name),
            Unit::FieldGroup(g) => UnitKey::field_group(&g.id),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Unit::Content(c) => &c.title,
            Unit::ConfigObject(c) => &c.label,
            Unit::FieldGroup(g) => &g.label,
        }
    }

    /// Bundle used for default profile lookup. Plain configuration objects
    /// have none.
    pub fn bundle(&self) -> Option<&str> {
        match self {
            Unit::Content(c) => Some(&c.bundle),
            Unit::ConfigObject(_) => None,
            Unit::FieldGroup(g) => Some(&g.bundle),
        }
    }

    pub fn source_langcode(&self) -> &str {
        match self {
            Unit::Content(c) => &c.langcode,
            Unit::ConfigObject(c) => &c.langcode,
            Unit::FieldGroup(g) => &g.langcode,
        }
    }

    /// The opaque translatable payload sent to the TMS.
    pub fn payload(&self) -> &str {
        match self {
            Unit::Content(c) => &c.body,
            Unit::ConfigObject(c) => &c.data,
            Unit::FieldGroup(g) => &g.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_key_display_and_parse() {
        let key = UnitKey::content("42");
        assert_eq!(key.to_string(), "content:42");
        assert_eq!(UnitKey::parse("content:42"), Some(key));

        let key = UnitKey::config_object("system.site");
        assert_eq!(UnitKey::parse(&key.to_string()), Some(key));
    }

    #[test]
    fn test_unit_key_parse_keeps_colons_in_id() {
        let key = UnitKey::parse("field_group:node.article:body").unwrap();
        assert_eq!(key.kind, UnitKind::FieldGroup);
        assert_eq!(key.local_id, "node.article:body");
    }

    #[test]
    fn test_unit_key_parse_rejects_garbage() {
        assert!(UnitKey::parse("content").is_none());
        assert!(UnitKey::parse("content:").is_none());
        assert!(UnitKey::parse("widget:1").is_none());
    }

    #[test]
    fn test_configuration_kinds() {
        assert!(!UnitKind::Content.is_configuration());
        assert!(UnitKind::ConfigObject.is_configuration());
        assert!(UnitKind::FieldGroup.is_configuration());
    }

    #[test]
    fn test_unit_accessors() {
        let unit = Unit::FieldGroup(FieldGroup {
            id: "node.article.body".to_string(),
            entity_type: "node".to_string(),
            bundle: "article".to_string(),
            label: "Body".to_string(),
            langcode: "en".to_string(),
            data: "{\"label\":\"Body\"}".to_string(),
        });
        assert_eq!(unit.kind(), UnitKind::FieldGroup);
        assert_eq!(unit.key(), UnitKey::field_group("node.article.body"));
        assert_eq!(unit.label(), "Body");
        assert_eq!(unit.bundle(), Some("article"));
        assert_eq!(unit.source_langcode(), "en");
        assert_eq!(unit.payload(), "{\"label\":\"Body\"}");

        let unit = Unit::ConfigObject(ConfigObject {
            name: "system.site".to_string(),
            label: "Site information".to_string(),
            langcode: "en".to_string(),
            data: "{}".to_string(),
        });
        assert!(unit.bundle().is_none());
    }
}
