//! Parsers that turn molecule notations into a [`Molecule`].
//!
//! This module provides parsers for:
//!
//! - **SMILES**: organic subset, bracket atoms, branches, ring closures, aromatic atoms
//! - **SMARTS**: full query grammar used by the catalog (also readable as a molecule)
//! - **MOL files**: MDL V2000 connection tables, including SD files (first record)
//!
//! [`detect_input_format`] guesses the notation from a filename and the text itself.
//!
//! ## Example
//!
//! ```rust
//! use fg_analyzer::parsing::parse_molecule;
//! use fg_analyzer::core::types::InputFormat;
//!
//! let acetic_acid = parse_molecule("CC(=O)O", InputFormat::Smiles).unwrap();
//! assert_eq!(acetic_acid.atom_count(), 4);
//! assert_eq!(acetic_acid.molecular_formula(), "C2H4O2");
//! ```
//!
//! [`Molecule`]: crate::core::molecule::Molecule

use thiserror::Error;

use crate::core::molecule::{Molecule, MoleculeError};
use crate::core::types::InputFormat;

pub mod detect;
pub mod molfile;
pub mod smarts;
pub mod smiles;

pub use detect::detect_input_format;
pub use smarts::PatternSyntaxError;

/// Errors raised while reading an input molecule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoleculeParseError {
    #[error("Empty {format} input")]
    Empty { format: InputFormat },

    #[error("Invalid SMILES at position {position}: {message}")]
    Smiles { position: usize, message: String },

    #[error("Invalid SMARTS: {0}")]
    Smarts(#[from] PatternSyntaxError),

    #[error("Query atom {index} has no element and cannot be read as a molecule")]
    UnresolvedQueryAtom { index: usize },

    #[error("Invalid MOL block at line {line}: {message}")]
    MolBlock { line: usize, message: String },

    #[error("Invalid molecule graph: {0}")]
    Graph(#[from] MoleculeError),
}

/// Parse input text in the given notation into a molecule.
///
/// # Errors
///
/// Returns `MoleculeParseError` if the text is empty or malformed for `format`.
pub fn parse_molecule(input: &str, format: InputFormat) -> Result<Molecule, MoleculeParseError> {
    if input.trim().is_empty() {
        return Err(MoleculeParseError::Empty { format });
    }

    match format {
        InputFormat::Smiles => smiles::parse_smiles(input),
        InputFormat::Smarts => smarts::parse_smarts(input.trim())?.to_molecule(),
        InputFormat::MolFile => molfile::parse_mol_block(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_rejected() {
        for format in [InputFormat::Smiles, InputFormat::Smarts, InputFormat::MolFile] {
            let err = parse_molecule("   \n", format).unwrap_err();
            assert_eq!(err, MoleculeParseError::Empty { format });
        }
    }

    #[test]
    fn test_dispatch_by_format() {
        let smiles = parse_molecule("CCO", InputFormat::Smiles).unwrap();
        let smarts = parse_molecule("CCO", InputFormat::Smarts).unwrap();
        assert_eq!(smiles.atom_count(), smarts.atom_count());
        assert_eq!(smiles.molecular_formula(), smarts.molecular_formula());
    }
}
