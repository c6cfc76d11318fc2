//! MDL MOL block parser (V2000 connection tables).
//!
//! Only the first record of an SD file is read. Atom coordinates are kept so
//! highlight images can reuse the drawn layout.

use super::MoleculeParseError;
use crate::core::element;
use crate::core::molecule::{Atom, Bond, BondOrder, Molecule};

/// Header lines before the counts line
const HEADER_LINES: usize = 3;

/// Parse a V2000 MOL block.
///
/// # Errors
///
/// Returns `MoleculeParseError::MolBlock` naming the 1-based line of the first
/// problem, or `MoleculeParseError::Graph` if the bond table is inconsistent.
pub fn parse_mol_block(input: &str) -> Result<Molecule, MoleculeParseError> {
    let lines: Vec<&str> = input.lines().collect();

    let counts_line = lines
        .get(HEADER_LINES)
        .ok_or_else(|| mol_error(lines.len() + 1, "missing counts line"))?;
    if counts_line.contains("V3000") {
        return Err(mol_error(HEADER_LINES + 1, "V3000 MOL blocks are not supported"));
    }

    let atom_count = fixed_width_count(counts_line, 0, HEADER_LINES + 1, "atom count")?;
    let bond_count = fixed_width_count(counts_line, 3, HEADER_LINES + 1, "bond count")?;

    let atom_start = HEADER_LINES + 1;
    let mut atoms = Vec::with_capacity(atom_count);
    let mut coords = Vec::with_capacity(atom_count);
    for offset in 0..atom_count {
        let line_no = atom_start + offset;
        let line = lines
            .get(line_no)
            .ok_or_else(|| mol_error(line_no + 1, "atom block ends early"))?;
        let (atom, xy) = parse_atom_line(line, line_no + 1)?;
        atoms.push(atom);
        coords.push(xy);
    }

    let bond_start = atom_start + atom_count;
    let mut bonds = Vec::with_capacity(bond_count);
    for offset in 0..bond_count {
        let line_no = bond_start + offset;
        let line = lines
            .get(line_no)
            .ok_or_else(|| mol_error(line_no + 1, "bond block ends early"))?;
        let bond = parse_bond_line(line, line_no + 1, atom_count)?;
        if bond.order == BondOrder::Aromatic {
            atoms[bond.begin].aromatic = true;
            atoms[bond.end].aromatic = true;
        }
        bonds.push(bond);
    }

    for (offset, line) in lines.iter().enumerate().skip(bond_start + bond_count) {
        if line.starts_with("M  END") || line.starts_with("$$$$") {
            break;
        }
        if line.starts_with("M  CHG") {
            apply_charges(line, offset + 1, &mut atoms)?;
        }
    }

    let explicit = vec![false; atoms.len()];
    super::smiles::assign_implicit_hydrogens(&mut atoms, &bonds, &explicit);

    Ok(Molecule::new(atoms, bonds)?.with_coordinates(coords)?)
}

fn mol_error(line: usize, message: impl Into<String>) -> MoleculeParseError {
    MoleculeParseError::MolBlock {
        line,
        message: message.into(),
    }
}

/// Read a three-character right-aligned integer field
fn fixed_width_field(line: &str, start: usize) -> Option<&str> {
    let end = (start + 3).min(line.len());
    line.get(start..end).map(str::trim)
}

fn fixed_width_count(
    line: &str,
    start: usize,
    line_no: usize,
    what: &str,
) -> Result<usize, MoleculeParseError> {
    fixed_width_field(line, start)
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| mol_error(line_no, format!("invalid {what}")))
}

fn parse_atom_line(line: &str, line_no: usize) -> Result<(Atom, [f64; 2]), MoleculeParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(mol_error(line_no, "atom line needs coordinates and a symbol"));
    }

    let x: f64 = fields[0]
        .parse()
        .map_err(|_| mol_error(line_no, format!("invalid x coordinate '{}'", fields[0])))?;
    let y: f64 = fields[1]
        .parse()
        .map_err(|_| mol_error(line_no, format!("invalid y coordinate '{}'", fields[1])))?;

    let symbol = fields[3];
    let element = element::by_symbol(symbol)
        .ok_or_else(|| mol_error(line_no, format!("unknown element '{symbol}'")))?;

    // Field 5 is the mass difference, field 6 the charge code
    let charge = match fields.get(5).and_then(|c| c.parse::<u8>().ok()) {
        Some(1) => 3,
        Some(2) => 2,
        Some(3) => 1,
        Some(5) => -1,
        Some(6) => -2,
        Some(7) => -3,
        _ => 0,
    };

    Ok((Atom::new(element.atomic_number).with_charge(charge), [x, y]))
}

fn parse_bond_line(line: &str, line_no: usize, atom_count: usize) -> Result<Bond, MoleculeParseError> {
    let field = |start: usize, what: &str| -> Result<usize, MoleculeParseError> {
        fixed_width_field(line, start)
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| mol_error(line_no, format!("invalid {what}")))
    };

    let begin = field(0, "first bond atom")?;
    let end = field(3, "second bond atom")?;
    let kind = field(6, "bond type")?;

    for atom in [begin, end] {
        if atom == 0 || atom > atom_count {
            return Err(mol_error(
                line_no,
                format!("bond atom {atom} outside 1..={atom_count}"),
            ));
        }
    }

    let order = match kind {
        1 => BondOrder::Single,
        2 => BondOrder::Double,
        3 => BondOrder::Triple,
        4 => BondOrder::Aromatic,
        other => return Err(mol_error(line_no, format!("unsupported bond type {other}"))),
    };
    Ok(Bond::new(begin - 1, end - 1, order))
}

/// `M  CHGnn8 aaa vvv ...` property lines override atom-block charges
fn apply_charges(line: &str, line_no: usize, atoms: &mut [Atom]) -> Result<(), MoleculeParseError> {
    let fields: Vec<&str> = line.split_whitespace().skip(2).collect();
    let Some((count, pairs)) = fields.split_first() else {
        return Err(mol_error(line_no, "empty charge property"));
    };
    let count: usize = count
        .parse()
        .map_err(|_| mol_error(line_no, "invalid charge entry count"))?;
    if pairs.len() < count * 2 {
        return Err(mol_error(line_no, "charge property is truncated"));
    }

    for pair in pairs.chunks(2).take(count) {
        let atom: usize = pair[0]
            .parse()
            .map_err(|_| mol_error(line_no, format!("invalid atom number '{}'", pair[0])))?;
        let charge: i8 = pair[1]
            .parse()
            .map_err(|_| mol_error(line_no, format!("invalid charge '{}'", pair[1])))?;
        let target = atom
            .checked_sub(1)
            .and_then(|i| atoms.get_mut(i))
            .ok_or_else(|| mol_error(line_no, format!("charge on missing atom {atom}")))?;
        target.formal_charge = charge;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACETIC_ACID: &str = "\
acetic acid
  fg-analyzer

  4  3  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.2990    0.7500    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.2990    2.2500    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    2.5981    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  2  0
  2  4  1  0
M  END
";

    #[test]
    fn test_parse_acetic_acid() {
        let mol = parse_mol_block(ACETIC_ACID).unwrap();
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(mol.molecular_formula(), "C2H4O2");
        assert_eq!(mol.atoms()[3].implicit_hydrogens, 1);
        assert_eq!(mol.bond_between(1, 2).unwrap().order, BondOrder::Double);

        let coords = mol.coordinates().unwrap();
        assert!((coords[1][0] - 1.299).abs() < 1e-9);
    }

    #[test]
    fn test_charge_property_and_sd_terminator() {
        let block = "\
methoxide


  2  1  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0
    1.5000    0.0000    0.0000 O   0  0
  1  2  1  0
M  CHG  1   2  -1
$$$$
";
        let mol = parse_mol_block(block).unwrap();
        assert_eq!(mol.atoms()[1].formal_charge, -1);
        assert_eq!(mol.atoms()[1].implicit_hydrogens, 0);
    }

    #[test]
    fn test_errors_name_the_line() {
        let err = parse_mol_block("only\ntwo lines").unwrap_err();
        assert!(matches!(err, MoleculeParseError::MolBlock { line: 3, .. }));

        let truncated = "t\n\n\n  2  0  0  0  0  0  0  0  0  0999 V2000\n    0.0 0.0 0.0 C\n";
        let err = parse_mol_block(truncated).unwrap_err();
        assert!(matches!(err, MoleculeParseError::MolBlock { line: 6, .. }));

        let v3000 = "t\n\n\n  0  0  0     0  0            999 V3000\n";
        assert!(parse_mol_block(v3000).is_err());

        let bad_bond = "t\n\n\n  1  1  0  0  0  0  0  0  0  0999 V2000\n    0.0 0.0 0.0 C\n  1  2  1  0\n";
        let err = parse_mol_block(bad_bond).unwrap_err();
        assert!(matches!(err, MoleculeParseError::MolBlock { line: 6, .. }));
    }
}
