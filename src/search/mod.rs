//! Substructure search: the matching primitive behind pattern evaluation.
//!
//! [`SubstructureSearch`] is the seam between the analysis engine and the graph
//! matcher. The default implementation, [`SmartsSearch`], parses SMARTS text and
//! runs VF2 with a wall-clock deadline.

use std::time::{Duration, Instant};
use thiserror::Error;

use crate::core::molecule::Molecule;
use crate::parsing::smarts::parse_smarts;
use crate::parsing::PatternSyntaxError;

pub mod vf2;

pub use vf2::SearchHits;

/// Default cap on distinct occurrences reported per pattern
pub const DEFAULT_MAX_MATCHES: usize = 1000;

/// Failure to evaluate one pattern against one molecule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Invalid pattern: {0}")]
    PatternSyntax(#[from] PatternSyntaxError),

    #[error("Pattern evaluation exceeded {}ms", .limit.as_millis())]
    Timeout { limit: Duration },
}

impl SearchError {
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::PatternSyntax(_))
    }
}

/// Subgraph matching of pattern text against a molecule
pub trait SubstructureSearch: Send + Sync {
    /// Check pattern syntax, returning the number of query atoms.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::PatternSyntax` if the pattern is malformed.
    fn validate(&self, pattern: &str) -> Result<usize, SearchError>;

    /// Occurrences of `pattern` in `molecule`, as matched atom index tuples,
    /// flagged when a match cap cut the list short.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::PatternSyntax` for malformed patterns and
    /// `SearchError::Timeout` when the evaluation runs past its limit.
    fn find_matches(&self, molecule: &Molecule, pattern: &str) -> Result<SearchHits, SearchError>;
}

/// SMARTS matcher backed by VF2
#[derive(Debug, Clone)]
pub struct SmartsSearch {
    timeout: Option<Duration>,
    max_matches: usize,
}

impl Default for SmartsSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl SmartsSearch {
    /// Matcher with no time limit
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: None,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches;
        self
    }
}

impl SubstructureSearch for SmartsSearch {
    fn validate(&self, pattern: &str) -> Result<usize, SearchError> {
        Ok(parse_smarts(pattern)?.atom_count())
    }

    fn find_matches(&self, molecule: &Molecule, pattern: &str) -> Result<SearchHits, SearchError> {
        let query = parse_smarts(pattern)?;
        let deadline = self.timeout.map(|limit| Instant::now() + limit);
        let mut budget = vf2::SearchBudget::new(deadline);

        vf2::find_unique_mappings(&query, molecule, self.max_matches, &mut budget).map_err(|_| {
            SearchError::Timeout {
                limit: self.timeout.unwrap_or_default(),
            }
        })
    }
}
