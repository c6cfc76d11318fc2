//! Evaluation of every catalog pattern against one molecule.

use rayon::prelude::*;
use std::collections::BTreeSet;

use crate::catalog::store::{PatternCatalog, PatternSource};
use crate::core::matches::{AtomSet, RawMatch};
use crate::core::molecule::Molecule;
use crate::core::pattern::PatternDefinition;
use crate::core::types::{AnalysisWarning, WarningKind};
use crate::search::{SearchError, SearchHits, SubstructureSearch};

/// Raw occurrences plus the problems met while producing them
#[derive(Debug, Clone, Default)]
pub struct CollectedMatches {
    pub matches: Vec<RawMatch>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Result of evaluating a single pattern
struct PatternOutcome {
    matches: Vec<RawMatch>,
    warning: Option<AnalysisWarning>,
}

/// Runs the matching primitive for every catalog entry
pub struct MatchCollector<'a> {
    catalog: &'a PatternCatalog,
    search: &'a dyn SubstructureSearch,
    pool: Option<&'a rayon::ThreadPool>,
}

impl<'a> MatchCollector<'a> {
    pub fn new(catalog: &'a PatternCatalog, search: &'a dyn SubstructureSearch) -> Self {
        Self {
            catalog,
            search,
            pool: None,
        }
    }

    /// Evaluate patterns on `pool` instead of the global rayon pool
    #[must_use]
    pub fn with_pool(mut self, pool: &'a rayon::ThreadPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Evaluate every pattern in parallel.
    ///
    /// Failing patterns are skipped with a warning. Matches come back sorted by
    /// catalog index and atom set, so the output does not depend on which worker
    /// finished first.
    pub fn collect(&self, molecule: &Molecule) -> CollectedMatches {
        let evaluate_all = || -> Vec<PatternOutcome> {
            (0..self.catalog.len())
                .into_par_iter()
                .map(|index| self.evaluate(molecule, index))
                .collect()
        };
        let outcomes = match self.pool {
            Some(pool) => pool.install(evaluate_all),
            None => evaluate_all(),
        };

        let mut collected = CollectedMatches::default();
        for outcome in outcomes {
            collected.matches.extend(outcome.matches);
            collected.warnings.extend(outcome.warning);
        }
        collected.matches.sort_by(|a, b| {
            a.catalog_index
                .cmp(&b.catalog_index)
                .then_with(|| a.atoms.cmp(&b.atoms))
        });
        collected
    }

    fn evaluate(&self, molecule: &Molecule, index: usize) -> PatternOutcome {
        let Some(def) = self.catalog.groups().get(index) else {
            return PatternOutcome {
                matches: Vec::new(),
                warning: None,
            };
        };

        match self.run_pattern(molecule, def, self.catalog.pattern_source(index)) {
            Ok(hits) => {
                let warning = hits.truncated.then(|| {
                    let kept = hits.mappings.len();
                    tracing::warn!(group = %def.name, kept, "Pattern hit the occurrence cap");
                    AnalysisWarning::new(
                        WarningKind::PatternTruncated,
                        Some(&def.name),
                        format!("More than {kept} distinct occurrences; only the first {kept} are reported"),
                    )
                });
                PatternOutcome {
                    matches: to_raw_matches(def, index, &hits.mappings, molecule.atom_count()),
                    warning,
                }
            }
            Err(err) => {
                tracing::warn!(group = %def.name, error = %err, "Skipping pattern");
                let kind = if err.is_syntax() {
                    WarningKind::PatternSyntax
                } else {
                    WarningKind::PatternTimeout
                };
                PatternOutcome {
                    matches: Vec::new(),
                    warning: Some(AnalysisWarning::new(kind, Some(&def.name), err.to_string())),
                }
            }
        }
    }

    /// Primary pattern first, then the simplified one on a syntax failure
    fn run_pattern(
        &self,
        molecule: &Molecule,
        def: &PatternDefinition,
        source: PatternSource,
    ) -> Result<SearchHits, SearchError> {
        if let (PatternSource::Fallback, Some(fallback)) = (source, def.fallback()) {
            return self.search.find_matches(molecule, fallback);
        }

        match self.search.find_matches(molecule, &def.smarts) {
            Err(err) if err.is_syntax() => match def.fallback() {
                Some(fallback) => {
                    tracing::debug!(group = %def.name, "Primary pattern rejected, using simplified");
                    self.search.find_matches(molecule, fallback)
                }
                None => Err(err),
            },
            result => result,
        }
    }
}

/// One `RawMatch` per distinct atom set; empty or out-of-range tuples are dropped
fn to_raw_matches(
    def: &PatternDefinition,
    index: usize,
    tuples: &[Vec<usize>],
    atom_count: usize,
) -> Vec<RawMatch> {
    let sets: BTreeSet<AtomSet> = tuples
        .iter()
        .filter(|tuple| !tuple.is_empty() && tuple.iter().all(|&a| a < atom_count))
        .map(|tuple| AtomSet::from_tuple(tuple))
        .collect();

    sets.into_iter()
        .map(|atoms| RawMatch {
            name: def.name.clone(),
            catalog_index: index,
            specificity: def.rank(),
            generic: def.generic,
            atoms,
        })
        .collect()
}
