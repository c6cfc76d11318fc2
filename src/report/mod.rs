//! Analysis reports: resolved matches joined with catalog metadata and images.
//!
//! - [`AnalysisReport`]: the result of one analysis request
//! - [`ResultAssembler`]: builds reports and requests highlight images
//! - [`palette`]: the stable name-to-color mapping used for highlights

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::matches::{AtomSet, ResolvedMatch};
use crate::core::pattern::PatternDefinition;
use crate::core::types::{AnalysisWarning, GroupId, InputFormat};

pub mod assembler;
pub mod palette;

pub use assembler::ResultAssembler;

/// Result of analyzing one molecule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Notation of the input, when the molecule was parsed from text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_format: Option<InputFormat>,

    pub molecular_formula: String,
    pub atom_count: usize,

    /// Resolved group names, each listed once, in occurrence order
    pub matches: Vec<String>,

    /// Every surviving occurrence, ordered by lowest atom index then catalog order
    pub occurrences: Vec<ResolvedMatch>,

    /// Catalog metadata for each matched group
    pub groups: BTreeMap<String, GroupMetadata>,

    /// All resolved groups highlighted on one structure
    pub combined_image: Option<HighlightImage>,

    /// One image per matched group
    pub individual_images: BTreeMap<String, HighlightImage>,

    pub warnings: Vec<AnalysisWarning>,

    pub processing: ProcessingInfo,
}

impl AnalysisReport {
    /// Number of surviving occurrences
    #[must_use]
    pub fn total_matches(&self) -> usize {
        self.occurrences.len()
    }

    /// Whether any pattern evaluation or image failed
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Catalog details for a matched group, plus where it matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub id: GroupId,
    pub description: String,
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
    pub hierarchical_path: String,
    pub reactivity: String,
    pub examples: Vec<String>,
    pub common_reactions: Vec<String>,
    pub chebi_id: Option<String>,
    pub chebi_description: Option<String>,
    pub smarts: String,
    pub simplified: Option<String>,
    pub specificity: i32,
    pub generic: bool,
    /// `#rrggbb` highlight color
    pub color: String,
    pub atom_sets: Vec<AtomSet>,
}

impl GroupMetadata {
    #[must_use]
    pub fn from_definition(def: &PatternDefinition, color: String, atom_sets: Vec<AtomSet>) -> Self {
        Self {
            id: def.id.clone(),
            description: def.description.clone(),
            categories: def.categories.clone(),
            subcategories: def.subcategories.clone(),
            hierarchical_path: def.hierarchical_path(),
            reactivity: def.reactivity.clone(),
            examples: def.examples.clone(),
            common_reactions: def.common_reactions.clone(),
            chebi_id: def.chebi_id.clone(),
            chebi_description: def.chebi_description.clone(),
            smarts: def.smarts.clone(),
            simplified: def.simplified.clone(),
            specificity: def.rank(),
            generic: def.generic,
            color,
            atom_sets,
        }
    }
}

/// An encoded image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightImage {
    pub media_type: String,
    /// Base64-encoded image bytes
    pub data: String,
    pub width: u32,
    pub height: u32,
}

/// Counters and timing for one analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub patterns_evaluated: usize,
    pub patterns_skipped: usize,
    /// Catalog entries dropped at load because no pattern was usable
    pub patterns_dropped: usize,
    pub raw_matches: usize,
    pub resolved_matches: usize,
    pub elapsed_ms: u64,
    pub catalog_version: String,
}
