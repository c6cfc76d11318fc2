use serde::{Deserialize, Serialize};

use crate::core::types::InputFormat;
use crate::parsing::detect_input_format;

/// Input notation requested by an API client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedFormat {
    /// Detect from filename and content
    #[default]
    Auto,
    Smiles,
    Smarts,
    #[serde(alias = "sdf", alias = "mol_file")]
    Mol,
}

impl RequestedFormat {
    /// The concrete format to parse with
    #[must_use]
    pub fn resolve(self, content: &str, filename: Option<&str>) -> InputFormat {
        match self {
            Self::Auto => detect_input_format(content, filename),
            Self::Smiles => InputFormat::Smiles,
            Self::Smarts => InputFormat::Smarts,
            Self::Mol => InputFormat::MolFile,
        }
    }
}
