use serde::{Deserialize, Serialize};

/// Catalog identifier for a functional group (e.g. `fg_001`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Sequential id in the catalog's `fg_NNN` style
    #[must_use]
    pub fn sequential(n: usize) -> Self {
        Self(format!("fg_{n:03}"))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notation a molecule is supplied in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// SMILES line notation
    Smiles,
    /// SMARTS query string, read as a molecule
    Smarts,
    /// MDL MOL block (V2000)
    #[serde(alias = "mol", alias = "sdf")]
    #[value(alias = "mol", alias = "sdf")]
    MolFile,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Smiles => write!(f, "smiles"),
            Self::Smarts => write!(f, "smarts"),
            Self::MolFile => write!(f, "mol_file"),
        }
    }
}

/// Category of a non-fatal problem recorded during an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Neither the primary nor the simplified pattern could be parsed
    PatternSyntax,
    /// Pattern evaluation exceeded the per-pattern time limit
    PatternTimeout,
    /// Pattern matched more distinct atom sets than the per-pattern cap
    PatternTruncated,
    /// Catalog entry dropped at load
    PatternEntry,
    /// A highlight image could not be produced
    Render,
}

/// A non-fatal problem attached to a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWarning {
    pub kind: WarningKind,
    /// Functional group the warning concerns, if any
    pub group: Option<String>,
    pub message: String,
}

impl AnalysisWarning {
    pub fn new(kind: WarningKind, group: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            group: group.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{group}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id_sequential() {
        assert_eq!(GroupId::sequential(7).to_string(), "fg_007");
        assert_eq!(GroupId::sequential(1234).to_string(), "fg_1234");
    }

    #[test]
    fn test_input_format_serde_aliases() {
        let f: InputFormat = serde_json::from_str("\"mol\"").unwrap();
        assert_eq!(f, InputFormat::MolFile);
        let f: InputFormat = serde_json::from_str("\"smiles\"").unwrap();
        assert_eq!(f, InputFormat::Smiles);
        assert_eq!(InputFormat::MolFile.to_string(), "mol_file");
    }

    #[test]
    fn test_warning_display() {
        let w = AnalysisWarning::new(WarningKind::PatternTimeout, Some("Amide"), "timed out");
        assert_eq!(w.to_string(), "Amide: timed out");
    }
}
