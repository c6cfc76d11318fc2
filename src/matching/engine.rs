use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::catalog::store::{PatternCatalog, PatternEntryError};
use crate::core::molecule::Molecule;
use crate::core::types::{AnalysisWarning, InputFormat, WarningKind};
use crate::matching::collector::MatchCollector;
use crate::matching::resolver::OverlapResolver;
use crate::parsing::{parse_molecule, MoleculeParseError};
use crate::render::{HighlightRenderer, ImageSize, SvgRenderer};
use crate::report::assembler::ImageOptions;
use crate::report::{AnalysisReport, ProcessingInfo, ResultAssembler};
use crate::search::{SmartsSearch, SubstructureSearch, DEFAULT_MAX_MATCHES};
use crate::utils::validation::{check_atom_limit, validate_input_text, ValidationError};

/// Default bound on evaluating a single pattern
pub const DEFAULT_PATTERN_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on drawing a single image
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure of a whole analysis request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error(transparent)]
    Parse(#[from] MoleculeParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Configuration for the analysis engine
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Time allowed for one pattern against one molecule
    pub pattern_timeout: Duration,
    /// Time allowed for one image
    pub render_timeout: Duration,
    /// Pattern evaluation threads; 0 uses the available parallelism
    pub worker_threads: usize,
    /// Distinct occurrences kept per pattern
    pub max_matches_per_pattern: usize,
    pub render_images: bool,
    pub combined_image_size: ImageSize,
    pub individual_image_size: ImageSize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pattern_timeout: DEFAULT_PATTERN_TIMEOUT,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            worker_threads: 0,
            max_matches_per_pattern: DEFAULT_MAX_MATCHES,
            render_images: true,
            combined_image_size: ImageSize::new(400, 400),
            individual_image_size: ImageSize::new(300, 300),
        }
    }
}

impl AnalysisConfig {
    /// Thread count after resolving 0 to the available parallelism
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        }
    }
}

/// The analysis pipeline: collect, resolve, assemble.
///
/// The catalog is shared read-only, so one engine can serve concurrent requests.
pub struct AnalysisEngine {
    catalog: Arc<PatternCatalog>,
    search: Arc<dyn SubstructureSearch>,
    renderer: Arc<dyn HighlightRenderer>,
    config: AnalysisConfig,
    pool: Option<rayon::ThreadPool>,
}

impl AnalysisEngine {
    /// Create an engine with default configuration
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self::with_config(catalog, AnalysisConfig::default())
    }

    /// Create an engine with the SMARTS matcher and SVG renderer configured from `config`
    pub fn with_config(catalog: Arc<PatternCatalog>, config: AnalysisConfig) -> Self {
        let search = SmartsSearch::new()
            .with_timeout(config.pattern_timeout)
            .with_max_matches(config.max_matches_per_pattern);
        let renderer = SvgRenderer::new().with_timeout(config.render_timeout);

        let threads = config.effective_threads();
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fg-worker-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!("Could not start {threads} worker threads ({e}); using the global pool");
                None
            }
        };

        Self {
            catalog,
            search: Arc::new(search),
            renderer: Arc::new(renderer),
            config,
            pool,
        }
    }

    /// Replace the matching primitive
    #[must_use]
    pub fn with_search(mut self, search: Arc<dyn SubstructureSearch>) -> Self {
        self.search = search;
        self
    }

    /// Replace the image renderer
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn HighlightRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a parsed molecule.
    ///
    /// Never fails: patterns that cannot be evaluated and images that cannot be
    /// drawn are reported in [`AnalysisReport::warnings`].
    pub fn analyze(&self, molecule: &Molecule) -> AnalysisReport {
        let start = Instant::now();

        let mut collector = MatchCollector::new(&self.catalog, self.search.as_ref());
        if let Some(pool) = &self.pool {
            collector = collector.with_pool(pool);
        }
        let mut collected = collector.collect(molecule);
        let raw_matches = collected.matches.len();
        let patterns_skipped = collected
            .warnings
            .iter()
            .filter(|w| matches!(w.kind, WarningKind::PatternSyntax | WarningKind::PatternTimeout))
            .count();

        // Entries lost at load are reported with every analysis
        let dropped = self.catalog.load_warnings();
        let mut warnings: Vec<AnalysisWarning> = dropped.iter().map(entry_warning).collect();
        warnings.append(&mut collected.warnings);
        collected.warnings = warnings;

        let resolved = OverlapResolver::resolve(collected.matches);
        tracing::debug!(
            raw = raw_matches,
            resolved = resolved.len(),
            skipped = patterns_skipped,
            "Resolved functional group matches"
        );

        let processing = ProcessingInfo {
            patterns_evaluated: self.catalog.len(),
            patterns_skipped,
            patterns_dropped: dropped.len(),
            raw_matches,
            resolved_matches: resolved.len(),
            elapsed_ms: 0,
            catalog_version: self.catalog.metadata().version.clone(),
        };

        let images = ImageOptions {
            enabled: self.config.render_images,
            combined: self.config.combined_image_size,
            individual: self.config.individual_image_size,
        };
        let mut report = ResultAssembler::new(&self.catalog, self.renderer.as_ref(), images).assemble(
            molecule,
            resolved,
            collected.warnings,
            processing,
        );

        report.processing.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(elapsed_ms = report.processing.elapsed_ms, "Analysis complete");
        report
    }

    /// Validate, parse and analyze molecule text.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Validation` if the text or molecule is outside the
    /// input limits, and `AnalysisError::Parse` if the text is not valid `format`.
    pub fn analyze_input(&self, input: &str, format: InputFormat) -> Result<AnalysisReport, AnalysisError> {
        validate_input_text(input)?;
        let molecule = parse_molecule(input, format)?;
        check_atom_limit(molecule.atom_count())?;

        let mut report = self.analyze(&molecule);
        report.input_format = Some(format);
        Ok(report)
    }
}

fn entry_warning(error: &PatternEntryError) -> AnalysisWarning {
    let group = match error {
        PatternEntryError::UnusablePattern { name, .. } => Some(name.as_str()),
        PatternEntryError::EmptyName { .. } => None,
    };
    AnalysisWarning::new(WarningKind::PatternEntry, group, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_engine() -> AnalysisEngine {
        let catalog = Arc::new(PatternCatalog::load_embedded().unwrap());
        AnalysisEngine::with_config(
            catalog,
            AnalysisConfig {
                worker_threads: 2,
                render_images: false,
                ..AnalysisConfig::default()
            },
        )
    }

    #[test]
    fn test_acetic_acid() {
        let report = make_engine().analyze_input("CC(=O)O", InputFormat::Smiles).unwrap();
        assert_eq!(report.matches, vec!["Carboxylic acid"]);
        assert_eq!(report.input_format, Some(InputFormat::Smiles));
        assert_eq!(report.molecular_formula, "C2H4O2");
        assert!(report.processing.raw_matches > report.processing.resolved_matches);
    }

    #[test]
    fn test_ethanol() {
        let report = make_engine().analyze_input("CCO", InputFormat::Smiles).unwrap();
        assert_eq!(report.matches, vec!["Primary alcohol"]);
    }

    #[test]
    fn test_phenol_suppresses_ring() {
        let report = make_engine().analyze_input("Oc1ccccc1", InputFormat::Smiles).unwrap();
        assert_eq!(report.matches, vec!["Phenol"]);
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = make_engine().analyze_input("C1CC(", InputFormat::Smiles).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));

        let err = make_engine().analyze_input("  ", InputFormat::Smiles).unwrap_err();
        assert_eq!(err, AnalysisError::Validation(ValidationError::EmptyInput));
    }

    #[test]
    fn test_dropped_entries_reported_with_each_analysis() {
        let json = r#"{"functional_groups": [
            {"name": "Broken", "smarts": "[C(", "simplified": "C)("},
            {"name": "Hydroxyl", "smarts": "[OX2H]"}
        ]}"#;
        let catalog = Arc::new(PatternCatalog::from_json(json).unwrap());
        let engine = AnalysisEngine::new(catalog);

        for smiles in ["CCO", "CCCC"] {
            let report = engine.analyze_input(smiles, InputFormat::Smiles).unwrap();
            assert_eq!(report.warnings[0].kind, WarningKind::PatternEntry);
            assert_eq!(report.warnings[0].group.as_deref(), Some("Broken"));
            assert_eq!(report.processing.patterns_dropped, 1);
            assert_eq!(report.processing.patterns_evaluated, 1);
        }
    }

    #[test]
    fn test_effective_threads() {
        let config = AnalysisConfig::default();
        assert!(config.effective_threads() >= 1);
        let config = AnalysisConfig {
            worker_threads: 3,
            ..AnalysisConfig::default()
        };
        assert_eq!(config.effective_threads(), 3);
    }
}
