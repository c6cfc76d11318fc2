use std::collections::BTreeMap;

use crate::core::element;
use crate::core::molecule::{Atom, Bond, BondOrder, Molecule};

use super::MoleculeParseError;

/// Parse a SMILES string into a molecule.
///
/// Anything after the first whitespace (a title, as in `.smi` files) is ignored.
/// Stereo markers (`@`, `/`, `\`) are accepted and dropped.
///
/// # Errors
///
/// Returns `MoleculeParseError::Smiles` with the byte position of the problem.
pub fn parse_smiles(input: &str) -> Result<Molecule, MoleculeParseError> {
    let trimmed = input.trim();
    let smiles = trimmed.split_whitespace().next().unwrap_or("");
    let mut parser = SmilesParser::new(smiles);
    parser.parse()?;
    parser.finish()
}

struct SmilesParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    /// Bracket atoms carry their own hydrogen count
    bracketed: Vec<bool>,
    bonds: Vec<Bond>,
    branches: Vec<usize>,
    prev: Option<usize>,
    pending: Option<BondOrder>,
    open_rings: BTreeMap<u16, (usize, Option<BondOrder>)>,
}

impl<'a> SmilesParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bracketed: Vec::new(),
            bonds: Vec::new(),
            branches: Vec::new(),
            prev: None,
            pending: None,
            open_rings: BTreeMap::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> MoleculeParseError {
        MoleculeParseError::Smiles {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn parse(&mut self) -> Result<(), MoleculeParseError> {
        while let Some(c) = self.peek() {
            match c {
                b'(' => {
                    let Some(prev) = self.prev else {
                        return Err(self.error("branch opened before any atom"));
                    };
                    self.bump();
                    self.branches.push(prev);
                }
                b')' => {
                    if self.pending.is_some() {
                        return Err(self.error("bond symbol before ')'"));
                    }
                    let Some(top) = self.branches.pop() else {
                        return Err(self.error("unbalanced ')'"));
                    };
                    self.bump();
                    self.prev = Some(top);
                }
                b'-' | b'=' | b'#' | b':' | b'/' | b'\\' | b'$' => {
                    if self.pending.is_some() {
                        return Err(self.error("two consecutive bond symbols"));
                    }
                    let order = match c {
                        b'=' => BondOrder::Double,
                        b'#' => BondOrder::Triple,
                        b':' => BondOrder::Aromatic,
                        b'$' => return Err(self.error("quadruple bonds are not supported")),
                        _ => BondOrder::Single,
                    };
                    self.bump();
                    self.pending = Some(order);
                }
                b'.' => {
                    if self.pending.is_some() {
                        return Err(self.error("bond symbol before '.'"));
                    }
                    self.bump();
                    self.prev = None;
                }
                b'%' => {
                    self.bump();
                    let number = self.two_digit_ring_number()?;
                    self.ring_closure(number)?;
                }
                b'0'..=b'9' => {
                    self.bump();
                    self.ring_closure(u16::from(c - b'0'))?;
                }
                b'[' => {
                    self.bump();
                    let atom = self.bracket_atom()?;
                    self.add_atom(atom, true)?;
                }
                b'*' => {
                    self.bump();
                    self.add_atom(Atom::new(0), false)?;
                }
                _ if c.is_ascii_alphabetic() => {
                    let atom = self.organic_atom()?;
                    self.add_atom(atom, false)?;
                }
                _ => return Err(self.error(format!("unexpected character '{}'", c as char))),
            }
        }
        Ok(())
    }

    fn two_digit_ring_number(&mut self) -> Result<u16, MoleculeParseError> {
        let mut number = 0u16;
        for _ in 0..2 {
            match self.bump() {
                Some(d) if d.is_ascii_digit() => number = number * 10 + u16::from(d - b'0'),
                _ => return Err(self.error("expected two digits after '%'")),
            }
        }
        Ok(number)
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn add_atom(&mut self, atom: Atom, bracketed: bool) -> Result<(), MoleculeParseError> {
        let index = self.atoms.len();
        self.atoms.push(atom);
        self.bracketed.push(bracketed);

        match (self.prev, self.pending.take()) {
            (Some(prev), pending) => {
                let order = pending.unwrap_or_else(|| self.default_order(prev, index));
                self.bonds.push(Bond::new(prev, index, order));
            }
            (None, Some(_)) => return Err(self.error("bond symbol without a preceding atom")),
            (None, None) => {}
        }
        self.prev = Some(index);
        Ok(())
    }

    fn ring_closure(&mut self, number: u16) -> Result<(), MoleculeParseError> {
        let Some(current) = self.prev else {
            return Err(self.error("ring closure before any atom"));
        };
        let pending = self.pending.take();

        if let Some((partner, stored)) = self.open_rings.remove(&number) {
            if partner == current {
                return Err(self.error(format!("ring {number} closes on the same atom")));
            }
            if self
                .bonds
                .iter()
                .any(|b| (b.begin == partner && b.end == current) || (b.begin == current && b.end == partner))
            {
                return Err(self.error(format!("ring {number} duplicates an existing bond")));
            }
            let order = match (stored, pending) {
                (Some(a), Some(b)) if a != b => {
                    return Err(self.error(format!("conflicting bond orders on ring {number}")))
                }
                (Some(order), _) | (None, Some(order)) => order,
                (None, None) => self.default_order(partner, current),
            };
            self.bonds.push(Bond::new(partner, current, order));
        } else {
            self.open_rings.insert(number, (current, pending));
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, MoleculeParseError> {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Err(self.error("expected an atom"));
        };

        let (atomic_number, aromatic) = match c {
            b'B' if self.peek() == Some(b'r') => {
                self.bump();
                (35, false)
            }
            b'C' if self.peek() == Some(b'l') => {
                self.bump();
                (17, false)
            }
            b'B' => (5, false),
            b'C' => (6, false),
            b'N' => (7, false),
            b'O' => (8, false),
            b'P' => (15, false),
            b'S' => (16, false),
            b'F' => (9, false),
            b'I' => (53, false),
            b'b' => (5, true),
            b'c' => (6, true),
            b'n' => (7, true),
            b'o' => (8, true),
            b'p' => (15, true),
            b's' => (16, true),
            _ => {
                self.pos = start;
                return Err(self.error(format!(
                    "'{}' is not in the organic subset; use brackets",
                    c as char
                )));
            }
        };
        Ok(Atom::new(atomic_number).aromatic(aromatic))
    }

    /// Parse the inside of `[...]`; the opening bracket is already consumed
    fn bracket_atom(&mut self) -> Result<Atom, MoleculeParseError> {
        let isotope = self.number();

        let (atomic_number, aromatic) = self.bracket_symbol()?;
        let mut atom = Atom::new(atomic_number).aromatic(aromatic);
        atom.isotope = isotope.and_then(|n| u16::try_from(n).ok());

        // Chirality
        while self.peek() == Some(b'@') {
            self.bump();
        }

        if self.peek() == Some(b'H') {
            self.bump();
            let count = self.number().unwrap_or(1);
            atom.implicit_hydrogens =
                u8::try_from(count).map_err(|_| self.error("hydrogen count out of range"))?;
        }

        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            self.bump();
            let mut magnitude: u32 = 1;
            if let Some(n) = self.number() {
                magnitude = n;
            } else {
                while self.peek() == Some(sign) {
                    self.bump();
                    magnitude += 1;
                }
            }
            let magnitude =
                i8::try_from(magnitude).map_err(|_| self.error("charge out of range"))?;
            atom.formal_charge = if sign == b'+' { magnitude } else { -magnitude };
        }

        // Atom class
        if self.peek() == Some(b':') {
            self.bump();
            if self.number().is_none() {
                return Err(self.error("expected atom class number after ':'"));
            }
        }

        if self.bump() != Some(b']') {
            return Err(self.error("expected ']'"));
        }
        Ok(atom)
    }

    fn bracket_symbol(&mut self) -> Result<(u8, bool), MoleculeParseError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated bracket atom"));
        };

        if c == b'*' {
            return Ok((0, false));
        }

        if c.is_ascii_lowercase() {
            // Aromatic two-letter symbols first
            if let Some(n) = self.peek() {
                let two = [c.to_ascii_uppercase(), n];
                if matches!(&two, b"Se" | b"As") {
                    self.bump();
                    let symbol = std::str::from_utf8(&two).unwrap_or_default();
                    if let Some(e) = element::by_symbol(symbol) {
                        return Ok((e.atomic_number, true));
                    }
                }
            }
            let number = match c {
                b'b' => 5,
                b'c' => 6,
                b'n' => 7,
                b'o' => 8,
                b'p' => 15,
                b's' => 16,
                _ => return Err(self.error(format!("'{}' cannot be aromatic", c as char))),
            };
            return Ok((number, true));
        }

        if !c.is_ascii_uppercase() {
            return Err(self.error(format!("unexpected '{}' in bracket atom", c as char)));
        }

        if let Some(n) = self.peek().filter(u8::is_ascii_lowercase) {
            let two = [c, n];
            if let Some(e) = std::str::from_utf8(&two).ok().and_then(element::by_symbol) {
                self.bump();
                return Ok((e.atomic_number, false));
            }
        }
        let one = [c];
        std::str::from_utf8(&one)
            .ok()
            .and_then(element::by_symbol)
            .map(|e| (e.atomic_number, false))
            .ok_or_else(|| self.error(format!("unknown element '{}'", c as char)))
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(d) = self.peek().filter(u8::is_ascii_digit) {
            value = value.saturating_mul(10).saturating_add(u32::from(d - b'0'));
            self.bump();
        }
        (self.pos > start).then_some(value)
    }

    fn finish(mut self) -> Result<Molecule, MoleculeParseError> {
        if self.atoms.is_empty() {
            return Err(self.error("no atoms"));
        }
        if self.pending.is_some() {
            return Err(self.error("trailing bond symbol"));
        }
        if !self.branches.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if let Some(number) = self.open_rings.keys().next() {
            return Err(self.error(format!("unclosed ring {number}")));
        }

        assign_implicit_hydrogens(&mut self.atoms, &self.bonds, &self.bracketed);
        Ok(Molecule::new(self.atoms, self.bonds)?)
    }
}

/// Fill implicit hydrogens for atoms that did not state their own count
pub(crate) fn assign_implicit_hydrogens(atoms: &mut [Atom], bonds: &[Bond], explicit: &[bool]) {
    let mut bond_sums = vec![0u8; atoms.len()];
    for bond in bonds {
        let units = bond.order.valence_units();
        bond_sums[bond.begin] = bond_sums[bond.begin].saturating_add(units);
        bond_sums[bond.end] = bond_sums[bond.end].saturating_add(units);
    }

    for (i, atom) in atoms.iter_mut().enumerate() {
        if explicit.get(i).copied().unwrap_or(false) {
            continue;
        }
        let sum = bond_sums[i].saturating_add(u8::from(atom.aromatic));
        atom.implicit_hydrogens =
            element::implicit_hydrogens(atom.atomic_number, sum, atom.formal_charge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogens(mol: &Molecule) -> Vec<u8> {
        mol.atoms().iter().map(|a| a.implicit_hydrogens).collect()
    }

    #[test]
    fn test_acetic_acid() {
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(hydrogens(&mol), vec![3, 0, 0, 1]);
        assert_eq!(mol.bond_between(1, 2).unwrap().order, BondOrder::Double);
    }

    #[test]
    fn test_aromatic_ring() {
        let mol = parse_smiles("c1ccccc1O").unwrap();
        assert_eq!(mol.atom_count(), 7);
        assert_eq!(mol.rings().len(), 1);
        assert_eq!(mol.bond_between(0, 5).unwrap().order, BondOrder::Aromatic);
        assert_eq!(mol.bond_between(5, 6).unwrap().order, BondOrder::Single);
        assert_eq!(mol.atoms()[0].implicit_hydrogens, 1);
        assert_eq!(mol.atoms()[5].implicit_hydrogens, 0);
        assert_eq!(mol.atoms()[6].implicit_hydrogens, 1);
    }

    #[test]
    fn test_kekule_benzene_becomes_aromatic() {
        let mol = parse_smiles("C1=CC=CC=C1").unwrap();
        assert!(mol.atoms().iter().all(|a| a.aromatic));
        assert!(mol.atoms().iter().all(|a| a.implicit_hydrogens == 1));
    }

    #[test]
    fn test_bracket_atoms() {
        let mol = parse_smiles("[NH4+]").unwrap();
        assert_eq!(mol.atoms()[0].formal_charge, 1);
        assert_eq!(mol.atoms()[0].implicit_hydrogens, 4);

        let mol = parse_smiles("C[O-]").unwrap();
        assert_eq!(mol.atoms()[1].formal_charge, -1);
        assert_eq!(mol.atoms()[1].implicit_hydrogens, 0);

        let mol = parse_smiles("[13CH3][C@@H](Cl)Br").unwrap();
        assert_eq!(mol.atoms()[0].isotope, Some(13));
        assert_eq!(mol.atoms()[0].implicit_hydrogens, 3);
        assert_eq!(mol.atoms()[2].atomic_number, 17);
        assert_eq!(mol.atoms()[3].atomic_number, 35);

        let mol = parse_smiles("c1cc[nH]c1").unwrap();
        assert_eq!(mol.atoms()[3].implicit_hydrogens, 1);
    }

    #[test]
    fn test_disconnected_and_ring_numbers() {
        let mol = parse_smiles("[Na+].[Cl-]").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.bond_count(), 0);

        let mol = parse_smiles("C%10CCCCC%10").unwrap();
        assert_eq!(mol.rings().len(), 1);
    }

    #[test]
    fn test_title_is_ignored() {
        let mol = parse_smiles("  CCO ethanol").unwrap();
        assert_eq!(mol.atom_count(), 3);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_smiles("C(C").is_err());
        assert!(parse_smiles("CC)").is_err());
        assert!(parse_smiles("C1CC").is_err());
        assert!(parse_smiles("C=").is_err());
        assert!(parse_smiles("Xy").is_err());
        assert!(parse_smiles("[C").is_err());
        assert!(parse_smiles("C==C").is_err());
        assert!(parse_smiles("=C").is_err());

        match parse_smiles("CC?C") {
            Err(MoleculeParseError::Smiles { position, .. }) => assert_eq!(position, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
