use serde::{Deserialize, Deserializer, Serialize};

use super::types::GroupId;

/// Placeholder the source data uses for a missing cross-reference
pub const NOT_AVAILABLE: &str = "Not available";

/// Reactivity recorded when an entry does not provide one
pub const UNKNOWN_REACTIVITY: &str = "unknown";

fn default_reactivity() -> String {
    UNKNOWN_REACTIVITY.to_string()
}

/// Treat empty strings and the "Not available" placeholder as absent
fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(NOT_AVAILABLE)))
}

/// One functional group definition from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDefinition {
    #[serde(default)]
    pub id: GroupId,

    /// Unique name, the catalog's primary key
    pub name: String,

    /// Primary SMARTS pattern
    pub smarts: String,

    /// Simplified SMARTS tried when the primary pattern cannot be parsed
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub simplified: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub subcategories: Vec<String>,

    #[serde(default = "default_reactivity")]
    pub reactivity: String,

    #[serde(default)]
    pub examples: Vec<String>,

    #[serde(default)]
    pub common_reactions: Vec<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub chebi_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub chebi_description: Option<String>,

    /// Priority used when overlapping matches conflict; higher wins.
    /// Derived from the pattern size when the catalog omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specificity: Option<i32>,

    /// A broad pattern that may co-exist with more specific groups nested inside it
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub generic: bool,
}

impl PatternDefinition {
    pub fn new(name: impl Into<String>, smarts: impl Into<String>) -> Self {
        Self {
            id: GroupId::default(),
            name: name.into(),
            smarts: smarts.into(),
            simplified: None,
            description: String::new(),
            categories: Vec::new(),
            subcategories: Vec::new(),
            reactivity: default_reactivity(),
            examples: Vec::new(),
            common_reactions: Vec::new(),
            chebi_id: None,
            chebi_description: None,
            specificity: None,
            generic: false,
        }
    }

    #[must_use]
    pub fn with_simplified(mut self, simplified: impl Into<String>) -> Self {
        self.simplified = Some(simplified.into());
        self
    }

    #[must_use]
    pub fn with_specificity(mut self, specificity: i32) -> Self {
        self.specificity = Some(specificity);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| (*c).to_string()).collect();
        self
    }

    #[must_use]
    pub fn generic(mut self) -> Self {
        self.generic = true;
        self
    }

    /// Resolved specificity rank
    #[must_use]
    pub fn rank(&self) -> i32 {
        self.specificity.unwrap_or(0)
    }

    /// Fallback pattern, if one is present
    #[must_use]
    pub fn fallback(&self) -> Option<&str> {
        self.simplified.as_deref()
    }

    /// `categories > subcategories > name`
    #[must_use]
    pub fn hierarchical_path(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.categories.iter().map(String::as_str));
        parts.extend(self.subcategories.iter().map(String::as_str));
        parts.push(&self.name);
        parts.join(" > ")
    }

    #[must_use]
    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            categories: self.categories.clone(),
            subcategories: self.subcategories.clone(),
            reactivity: self.reactivity.clone(),
            smarts: self.smarts.clone(),
        }
    }
}

/// Compact view of a definition returned by catalog search and listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
    pub reactivity: String,
    pub smarts: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"name": "Hydroxyl", "smarts": "[OX2H]"}"#;
        let def: PatternDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.reactivity, UNKNOWN_REACTIVITY);
        assert!(def.simplified.is_none());
        assert!(def.chebi_id.is_none());
        assert!(def.specificity.is_none());
        assert!(!def.generic);
    }

    #[test]
    fn test_not_available_is_absent() {
        let json = r#"{
            "name": "Hydroxyl",
            "smarts": "[OX2H]",
            "simplified": "",
            "chebi_id": "Not available",
            "chebi_description": "  not available "
        }"#;
        let def: PatternDefinition = serde_json::from_str(json).unwrap();
        assert!(def.simplified.is_none());
        assert!(def.chebi_id.is_none());
        assert!(def.chebi_description.is_none());
    }

    #[test]
    fn test_hierarchical_path() {
        let mut def = PatternDefinition::new("Phenol", "[OX2H]c").with_categories(&["Oxygen"]);
        def.subcategories = vec!["Alcohols".to_string()];
        assert_eq!(def.hierarchical_path(), "Oxygen > Alcohols > Phenol");

        let bare = PatternDefinition::new("Nitrile", "C#N");
        assert_eq!(bare.hierarchical_path(), "Nitrile");
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let def = PatternDefinition::new("Nitrile", "C#N");
        let json = serde_json::to_string(&def).unwrap();
        assert!(!json.contains("chebi_id"));
        assert!(!json.contains("generic"));
        assert!(json.contains("\"reactivity\":\"unknown\""));
    }
}
