use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::core::pattern::{GroupSummary, PatternDefinition};
use crate::core::types::GroupId;
use crate::search::{SmartsSearch, SubstructureSearch};

use super::index::CatalogSearch;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Duplicate functional group name '{name}'")]
    DuplicateName { name: String },

    #[error("Catalog lists {dropped} functional groups but none has a usable pattern")]
    NoUsableEntries { dropped: usize },

    #[error("Functional group '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    InvalidEntry(#[from] PatternEntryError),
}

/// A single catalog entry that cannot be used
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PatternEntryError {
    #[error("Entry {index} has an empty name")]
    EmptyName { index: usize },

    #[error("Functional group '{name}' has no usable pattern: {reason}")]
    UnusablePattern { name: String, reason: String },
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogMetadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub total_groups: usize,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub metadata: CatalogMetadata,
    pub functional_groups: Vec<PatternDefinition>,
}

/// Which pattern string an entry is evaluated with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSource {
    Primary,
    /// The primary pattern did not parse at load; use `simplified`
    Fallback,
}

/// The functional group library with its lookup index.
///
/// Entries keep file order, which is the tie-break order for overlap resolution.
#[derive(Debug, Default)]
pub struct PatternCatalog {
    groups: Vec<PatternDefinition>,
    sources: Vec<PatternSource>,

    /// Index: name -> position in `groups`
    name_to_index: HashMap<String, usize>,

    metadata: CatalogMetadata,

    /// Entries dropped during load
    load_warnings: Vec<PatternEntryError>,
}

impl PatternCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the embedded default catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog is malformed.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        // Checked at compile time by build.rs
        const EMBEDDED_CATALOG: &str = include_str!("../../catalogs/functional_groups.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load a catalog from a JSON file, gzip-compressed or plain
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, decompressed or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let bytes = std::fs::read(path)?;
        let content = if bytes.starts_with(&GZIP_MAGIC) {
            let mut decoder = flate2::read::GzDecoder::new(bytes.as_slice());
            let mut text = String::new();
            decoder.read_to_string(&mut text)?;
            text
        } else {
            String::from_utf8(bytes)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?
        };
        Self::from_json(&content)
    }

    /// Parse a catalog from a JSON string, validating patterns with [`SmartsSearch`]
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, names repeat, or no entry is usable.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::from_json_with(json, &SmartsSearch::new())
    }

    /// Parse a catalog from a JSON string, validating patterns with `search`.
    ///
    /// Entries whose primary and simplified patterns both fail validation are
    /// dropped and recorded in [`load_warnings`](Self::load_warnings).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, names repeat, or no entry is usable.
    pub fn from_json_with(json: &str, search: &dyn SubstructureSearch) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if !data.metadata.version.is_empty() && data.metadata.version != CATALOG_VERSION {
            tracing::warn!(
                expected = CATALOG_VERSION,
                found = %data.metadata.version,
                "Catalog version mismatch"
            );
        }

        let mut seen = BTreeSet::new();
        for group in &data.functional_groups {
            if !group.name.trim().is_empty() && !seen.insert(group.name.as_str()) {
                return Err(CatalogError::DuplicateName {
                    name: group.name.clone(),
                });
            }
        }

        let listed = data.functional_groups.len();
        let mut catalog = Self {
            metadata: data.metadata,
            ..Self::default()
        };

        for (index, definition) in data.functional_groups.into_iter().enumerate() {
            match prepare_entry(definition, index, search) {
                Ok((definition, source)) => catalog.push(definition, source),
                Err(e) => {
                    tracing::warn!("Dropping catalog entry: {e}");
                    catalog.load_warnings.push(e);
                }
            }
        }

        if listed > 0 && catalog.groups.is_empty() {
            return Err(CatalogError::NoUsableEntries { dropped: listed });
        }

        catalog.assign_missing_ids();
        catalog.metadata.total_groups = catalog.groups.len();
        tracing::debug!(
            groups = catalog.groups.len(),
            dropped = catalog.load_warnings.len(),
            "Loaded functional group catalog"
        );
        Ok(catalog)
    }

    fn push(&mut self, definition: PatternDefinition, source: PatternSource) {
        self.name_to_index
            .insert(definition.name.clone(), self.groups.len());
        self.groups.push(definition);
        self.sources.push(source);
    }

    fn next_sequential_id(&self) -> GroupId {
        let highest = self
            .groups
            .iter()
            .filter_map(|g| g.id.0.strip_prefix("fg_"))
            .filter_map(|n| n.parse::<usize>().ok())
            .max()
            .unwrap_or(0);
        GroupId::sequential(highest + 1)
    }

    fn assign_missing_ids(&mut self) {
        for i in 0..self.groups.len() {
            if self.groups[i].id.is_empty() {
                self.groups[i].id = self.next_sequential_id();
            }
        }
    }

    /// Add a group at the end of the catalog.
    ///
    /// The group gets the next `fg_NNN` id when it has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already present or no pattern is usable.
    pub fn add_group(
        &mut self,
        definition: PatternDefinition,
        search: &dyn SubstructureSearch,
    ) -> Result<&PatternDefinition, CatalogError> {
        if self.name_to_index.contains_key(&definition.name) {
            return Err(CatalogError::DuplicateName {
                name: definition.name,
            });
        }

        let (mut definition, source) = prepare_entry(definition, self.groups.len(), search)?;
        if definition.id.is_empty() {
            definition.id = self.next_sequential_id();
        }
        let index = self.groups.len();
        self.push(definition, source);
        self.metadata.total_groups = self.groups.len();
        Ok(&self.groups[index])
    }

    /// Remove a group by name, returning it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no group has this name.
    pub fn remove_group(&mut self, name: &str) -> Result<PatternDefinition, CatalogError> {
        let index = self
            .name_to_index
            .remove(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;

        let removed = self.groups.remove(index);
        self.sources.remove(index);
        for position in self.name_to_index.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        self.metadata.total_groups = self.groups.len();
        Ok(removed)
    }

    /// Get a group by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PatternDefinition> {
        self.name_to_index.get(name).map(|&idx| &self.groups[idx])
    }

    /// Position of a group in catalog order
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// All groups in catalog order
    #[must_use]
    pub fn groups(&self) -> &[PatternDefinition] {
        &self.groups
    }

    /// Whether the entry at `index` is evaluated with its simplified pattern
    #[must_use]
    pub fn pattern_source(&self, index: usize) -> PatternSource {
        self.sources
            .get(index)
            .copied()
            .unwrap_or(PatternSource::Primary)
    }

    /// Entries dropped while loading
    #[must_use]
    pub fn load_warnings(&self) -> &[PatternEntryError] {
        &self.load_warnings
    }

    #[must_use]
    pub fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }

    /// Groups whose name, description, categories or common reactions contain
    /// `term`, ignoring case. Name and description hits come first.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<GroupSummary> {
        CatalogSearch::new(self)
            .find(term)
            .into_iter()
            .map(|idx| self.groups[idx].summary())
            .collect()
    }

    /// Groups with a category or subcategory containing `category`, ignoring case
    #[must_use]
    pub fn groups_by_category(&self, category: &str) -> Vec<&PatternDefinition> {
        let needle = category.to_lowercase();
        self.groups
            .iter()
            .filter(|g| {
                g.categories
                    .iter()
                    .chain(&g.subcategories)
                    .any(|c| c.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Groups whose reactivity contains `reactivity`, ignoring case
    #[must_use]
    pub fn groups_by_reactivity(&self, reactivity: &str) -> Vec<&PatternDefinition> {
        let needle = reactivity.to_lowercase();
        self.groups
            .iter()
            .filter(|g| g.reactivity.to_lowercase().contains(&needle))
            .collect()
    }

    /// Sorted union of every category and subcategory
    #[must_use]
    pub fn all_categories(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| g.categories.iter().chain(&g.subcategories))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `categories > subcategories > name` for a group
    #[must_use]
    pub fn hierarchical_path(&self, name: &str) -> Option<String> {
        self.get(name).map(PatternDefinition::hierarchical_path)
    }

    /// Export catalog to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = CatalogData {
            metadata: CatalogMetadata {
                version: CATALOG_VERSION.to_string(),
                total_groups: self.groups.len(),
                description: self.metadata.description.clone(),
                created_at: Some(chrono::Utc::now().to_rfc3339()),
            },
            functional_groups: self.groups.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of groups in catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Validate an entry's patterns and fill in a missing specificity rank
fn prepare_entry(
    mut definition: PatternDefinition,
    index: usize,
    search: &dyn SubstructureSearch,
) -> Result<(PatternDefinition, PatternSource), PatternEntryError> {
    if definition.name.trim().is_empty() {
        return Err(PatternEntryError::EmptyName { index });
    }

    let (source, atoms) = match search.validate(&definition.smarts) {
        Ok(atoms) => (PatternSource::Primary, atoms),
        Err(primary_err) => match definition.fallback().map(|f| search.validate(f)) {
            Some(Ok(atoms)) => {
                tracing::debug!(
                    group = %definition.name,
                    "Primary pattern rejected ({primary_err}); using simplified pattern"
                );
                (PatternSource::Fallback, atoms)
            }
            Some(Err(fallback_err)) => {
                return Err(PatternEntryError::UnusablePattern {
                    name: definition.name,
                    reason: format!("{primary_err}; simplified: {fallback_err}"),
                })
            }
            None => {
                return Err(PatternEntryError::UnusablePattern {
                    name: definition.name,
                    reason: primary_err.to_string(),
                })
            }
        },
    };

    definition
        .specificity
        .get_or_insert(i32::try_from(atoms).unwrap_or(i32::MAX));
    Ok((definition, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "metadata": {"version": "1.0.0", "total_groups": 3, "description": "test"},
        "functional_groups": [
            {"id": "fg_001", "name": "Hydroxyl", "smarts": "[OX2H]",
             "description": "An -OH group", "categories": ["Oxygen"], "subcategories": ["Alcohols"],
             "reactivity": "moderate", "common_reactions": ["Esterification"]},
            {"name": "Carbonyl", "smarts": "[CX3]=[OX1]", "specificity": 2,
             "description": "C=O", "categories": ["Oxygen"], "reactivity": "high",
             "chebi_id": "Not available"},
            {"name": "Amine", "smarts": "[NX3;H2", "simplified": "[NH2]",
             "categories": ["Nitrogen"]}
        ]
    }"#;

    #[test]
    fn test_load_embedded_catalog() {
        let catalog = PatternCatalog::load_embedded().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.load_warnings().is_empty());
        assert!(catalog.get("Carboxylic acid").is_some());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let catalog = PatternCatalog::from_json(SMALL).unwrap();
        assert_eq!(catalog.len(), 3);

        let hydroxyl = catalog.get("Hydroxyl").unwrap();
        assert_eq!(hydroxyl.specificity, Some(1));

        let carbonyl = catalog.get("Carbonyl").unwrap();
        assert_eq!(carbonyl.id, GroupId::new("fg_002"));
        assert_eq!(carbonyl.specificity, Some(2));
        assert!(carbonyl.chebi_id.is_none());

        let amine = catalog.index_of("Amine").unwrap();
        assert_eq!(catalog.pattern_source(amine), PatternSource::Fallback);
        assert_eq!(catalog.groups()[amine].reactivity, "unknown");
    }

    #[test]
    fn test_unusable_entry_dropped() {
        let json = r#"{"functional_groups": [
            {"name": "Good", "smarts": "[OX2H]"},
            {"name": "Broken", "smarts": "[C", "simplified": "C(("},
            {"name": "", "smarts": "C"}
        ]}"#;
        let catalog = PatternCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.load_warnings().len(), 2);
        assert!(matches!(
            catalog.load_warnings()[0],
            PatternEntryError::UnusablePattern { ref name, .. } if name == "Broken"
        ));
        assert_eq!(catalog.load_warnings()[1], PatternEntryError::EmptyName { index: 2 });
    }

    #[test]
    fn test_fatal_errors() {
        let dup = r#"{"functional_groups": [
            {"name": "A", "smarts": "C"}, {"name": "A", "smarts": "O"}
        ]}"#;
        assert!(matches!(
            PatternCatalog::from_json(dup),
            Err(CatalogError::DuplicateName { .. })
        ));

        let none = r#"{"functional_groups": [{"name": "A", "smarts": "[C"}]}"#;
        assert!(matches!(
            PatternCatalog::from_json(none),
            Err(CatalogError::NoUsableEntries { dropped: 1 })
        ));

        assert!(matches!(
            PatternCatalog::from_json("{not json"),
            Err(CatalogError::ParseError(_))
        ));
    }

    #[test]
    fn test_lookups() {
        let catalog = PatternCatalog::from_json(SMALL).unwrap();
        assert_eq!(catalog.groups_by_category("oxygen").len(), 2);
        assert_eq!(catalog.groups_by_category("alcohol").len(), 1);
        assert_eq!(catalog.groups_by_reactivity("HIGH").len(), 1);
        assert_eq!(
            catalog.all_categories(),
            vec!["Alcohols", "Nitrogen", "Oxygen"]
        );
        assert_eq!(
            catalog.hierarchical_path("Hydroxyl").unwrap(),
            "Oxygen > Alcohols > Hydroxyl"
        );
        assert!(catalog.hierarchical_path("Nitrile").is_none());
    }

    #[test]
    fn test_add_and_remove_group() {
        let mut catalog = PatternCatalog::from_json(SMALL).unwrap();
        let search = SmartsSearch::new();

        let added = catalog
            .add_group(PatternDefinition::new("Nitrile", "[NX1]#[CX2]"), &search)
            .unwrap();
        assert_eq!(added.id, GroupId::new("fg_004"));
        assert_eq!(added.specificity, Some(2));

        assert!(matches!(
            catalog.add_group(PatternDefinition::new("Nitrile", "C#N"), &search),
            Err(CatalogError::DuplicateName { .. })
        ));
        assert!(catalog
            .add_group(PatternDefinition::new("Bad", "[C"), &search)
            .is_err());

        let removed = catalog.remove_group("Carbonyl").unwrap();
        assert_eq!(removed.name, "Carbonyl");
        assert_eq!(catalog.index_of("Amine"), Some(1));
        assert_eq!(catalog.index_of("Nitrile"), Some(2));
        assert!(matches!(
            catalog.remove_group("Carbonyl"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_to_json_round_trip() {
        let catalog = PatternCatalog::from_json(SMALL).unwrap();
        let json = catalog.to_json().unwrap();
        assert!(json.contains("\"version\": \"1.0.0\""));
        assert!(json.contains("\"created_at\""));

        let reloaded = PatternCatalog::from_json(&json).unwrap();
        assert_eq!(reloaded.groups(), catalog.groups());
    }

    #[test]
    fn test_load_gzip_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SMALL.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let catalog = PatternCatalog::load_from_file(&path).unwrap();
        assert_eq!(catalog.len(), 3);
    }
}
