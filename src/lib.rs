//! # fg-analyzer
//!
//! A library for identifying functional groups in molecules.
//!
//! Given a molecule as SMILES, SMARTS or a MOL block, `fg-analyzer` evaluates
//! every pattern in a curated catalog of functional groups and reports which
//! groups are present, where, and how they are classified.
//!
//! Related patterns often match the same atoms: the carboxylic acid in acetic acid
//! is also a carbonyl and a hydroxyl. Overlapping matches are resolved with a
//! deterministic greedy rule, so the report names each part of the molecule once,
//! by its most specific group.
//!
//! ## Features
//!
//! - **SMARTS matching**: VF2 subgraph search with recursive SMARTS and per-pattern timeouts
//! - **Overlap resolution**: Specificity-ranked, order-independent and reproducible
//! - **Parallel evaluation**: Patterns are evaluated on a bounded rayon pool
//! - **Rich metadata**: Categories, reactivity, example molecules and reactions per group
//! - **Highlight images**: SVG structures with each group colored by name
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fg_analyzer::{AnalysisEngine, InputFormat, PatternCatalog};
//!
//! // Load the embedded catalog of functional groups
//! let catalog = Arc::new(PatternCatalog::load_embedded().unwrap());
//! let engine = AnalysisEngine::new(catalog);
//!
//! // Aspirin: an ester and a carboxylic acid on a benzene ring
//! let report = engine
//!     .analyze_input("CC(=O)Oc1ccccc1C(=O)O", InputFormat::Smiles)
//!     .unwrap();
//!
//! for name in &report.matches {
//!     let group = &report.groups[name];
//!     println!("{name}: atoms {:?} ({})", group.atom_sets, group.hierarchical_path);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Functional group catalog storage and search
//! - [`core`]: Molecules, pattern definitions and match types
//! - [`parsing`]: SMILES, SMARTS and MOL parsers
//! - [`search`]: Substructure search (VF2 over SMARTS queries)
//! - [`matching`]: Match collection, overlap resolution and the analysis engine
//! - [`report`]: Analysis reports and group colors
//! - [`render`]: Highlighted structure images
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: JSON API server

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod render;
pub mod report;
pub mod search;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use catalog::store::PatternCatalog;
pub use core::molecule::Molecule;
pub use core::pattern::PatternDefinition;
pub use core::types::*;
pub use matching::engine::{AnalysisConfig, AnalysisEngine, AnalysisError};
pub use parsing::{detect_input_format, parse_molecule};
pub use report::AnalysisReport;
