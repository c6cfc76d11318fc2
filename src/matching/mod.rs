//! Functional group matching and overlap resolution.
//!
//! This module provides the analysis pipeline:
//!
//! - [`MatchCollector`]: evaluates every catalog pattern, in parallel, into raw occurrences
//! - [`OverlapResolver`]: picks a deterministic, conflict-free subset of those occurrences
//! - [`AnalysisEngine`]: runs collection, resolution and report assembly per request
//!
//! ## Resolution
//!
//! Occurrences are ranked by:
//!
//! 1. **Specificity**: the catalog's rank for the pattern, higher first
//! 2. **Size**: atoms covered, larger first
//! 3. **Catalog order**: earlier entries first
//! 4. **Atom indices**: orders repeated occurrences of one pattern
//!
//! and admitted greedily. Two occurrences conflict when their atom sets
//! partially overlap or are equal, or when one contains the other, unless the
//! containing pattern is marked generic and ranks below the contained one.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fg_analyzer::{AnalysisConfig, AnalysisEngine, InputFormat, PatternCatalog};
//!
//! let catalog = Arc::new(PatternCatalog::load_embedded().unwrap());
//! let config = AnalysisConfig {
//!     render_images: false,
//!     ..AnalysisConfig::default()
//! };
//! let engine = AnalysisEngine::with_config(catalog, config);
//!
//! let report = engine.analyze_input("CC(=O)O", InputFormat::Smiles).unwrap();
//! assert_eq!(report.matches, vec!["Carboxylic acid"]);
//! ```

pub mod collector;
pub mod engine;
pub mod resolver;

pub use collector::{CollectedMatches, MatchCollector};
pub use engine::{AnalysisConfig, AnalysisEngine, AnalysisError};
pub use resolver::OverlapResolver;
