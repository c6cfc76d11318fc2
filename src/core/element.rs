//! Periodic table data needed for parsing and valence checks.

/// One row of the element table
#[derive(Debug, Clone, Copy)]
pub struct Element {
    pub atomic_number: u8,
    pub symbol: &'static str,
    /// Allowed valences for implicit hydrogen calculation, smallest first.
    /// Empty for elements that never receive implicit hydrogens.
    pub valences: &'static [u8],
}

const ELEMENTS: &[Element] = &[
    Element { atomic_number: 1, symbol: "H", valences: &[1] },
    Element { atomic_number: 2, symbol: "He", valences: &[] },
    Element { atomic_number: 3, symbol: "Li", valences: &[] },
    Element { atomic_number: 4, symbol: "Be", valences: &[] },
    Element { atomic_number: 5, symbol: "B", valences: &[3] },
    Element { atomic_number: 6, symbol: "C", valences: &[4] },
    Element { atomic_number: 7, symbol: "N", valences: &[3, 5] },
    Element { atomic_number: 8, symbol: "O", valences: &[2] },
    Element { atomic_number: 9, symbol: "F", valences: &[1] },
    Element { atomic_number: 10, symbol: "Ne", valences: &[] },
    Element { atomic_number: 11, symbol: "Na", valences: &[] },
    Element { atomic_number: 12, symbol: "Mg", valences: &[] },
    Element { atomic_number: 13, symbol: "Al", valences: &[] },
    Element { atomic_number: 14, symbol: "Si", valences: &[4] },
    Element { atomic_number: 15, symbol: "P", valences: &[3, 5] },
    Element { atomic_number: 16, symbol: "S", valences: &[2, 4, 6] },
    Element { atomic_number: 17, symbol: "Cl", valences: &[1] },
    Element { atomic_number: 18, symbol: "Ar", valences: &[] },
    Element { atomic_number: 19, symbol: "K", valences: &[] },
    Element { atomic_number: 20, symbol: "Ca", valences: &[] },
    Element { atomic_number: 25, symbol: "Mn", valences: &[] },
    Element { atomic_number: 26, symbol: "Fe", valences: &[] },
    Element { atomic_number: 27, symbol: "Co", valences: &[] },
    Element { atomic_number: 28, symbol: "Ni", valences: &[] },
    Element { atomic_number: 29, symbol: "Cu", valences: &[] },
    Element { atomic_number: 30, symbol: "Zn", valences: &[] },
    Element { atomic_number: 33, symbol: "As", valences: &[3, 5] },
    Element { atomic_number: 34, symbol: "Se", valences: &[2, 4, 6] },
    Element { atomic_number: 35, symbol: "Br", valences: &[1] },
    Element { atomic_number: 47, symbol: "Ag", valences: &[] },
    Element { atomic_number: 50, symbol: "Sn", valences: &[] },
    Element { atomic_number: 53, symbol: "I", valences: &[1] },
    Element { atomic_number: 78, symbol: "Pt", valences: &[] },
    Element { atomic_number: 79, symbol: "Au", valences: &[] },
    Element { atomic_number: 80, symbol: "Hg", valences: &[] },
];

/// Look up an element by its symbol (case-sensitive, e.g. "Cl")
#[must_use]
pub fn by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an element by atomic number
#[must_use]
pub fn by_number(atomic_number: u8) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.atomic_number == atomic_number)
}

/// Symbol for an atomic number, `"*"` when unknown
#[must_use]
pub fn symbol_for(atomic_number: u8) -> &'static str {
    by_number(atomic_number).map_or("*", |e| e.symbol)
}

/// Implicit hydrogens for an atom given the sum of its explicit bond orders.
///
/// Picks the smallest allowed valence that accommodates `bond_sum`, adjusted by
/// formal charge the way N+ and O- behave (a positive charge on N/P raises the
/// usable valence by one, a negative charge on O/S lowers it by one).
#[must_use]
pub fn implicit_hydrogens(atomic_number: u8, bond_sum: u8, formal_charge: i8) -> u8 {
    let Some(element) = by_number(atomic_number) else {
        return 0;
    };

    let adjust = |v: u8| -> u8 {
        let shifted = match atomic_number {
            7 | 15 => i16::from(v) + i16::from(formal_charge),
            8 | 16 | 34 => i16::from(v) - i16::from(formal_charge).abs(),
            6 => i16::from(v) - i16::from(formal_charge).abs(),
            _ => i16::from(v),
        };
        u8::try_from(shifted.max(0)).unwrap_or(0)
    };

    element
        .valences
        .iter()
        .map(|&v| adjust(v))
        .find(|&v| v >= bond_sum)
        .map_or(0, |v| v - bond_sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_symbol_and_number() {
        assert_eq!(by_symbol("Cl").unwrap().atomic_number, 17);
        assert_eq!(by_number(6).unwrap().symbol, "C");
        assert!(by_symbol("Xx").is_none());
        assert_eq!(symbol_for(200), "*");
    }

    #[test]
    fn test_implicit_hydrogens_neutral() {
        assert_eq!(implicit_hydrogens(6, 1, 0), 3); // methyl carbon
        assert_eq!(implicit_hydrogens(8, 1, 0), 1); // hydroxyl oxygen
        assert_eq!(implicit_hydrogens(7, 3, 0), 0); // tertiary amine
        assert_eq!(implicit_hydrogens(16, 4, 0), 0); // sulfoxide-like sulfur
        assert_eq!(implicit_hydrogens(16, 3, 0), 1);
    }

    #[test]
    fn test_implicit_hydrogens_charged() {
        assert_eq!(implicit_hydrogens(7, 1, 1), 3); // ammonium
        assert_eq!(implicit_hydrogens(8, 1, -1), 0); // alkoxide
    }

    #[test]
    fn test_implicit_hydrogens_over_valence_is_zero() {
        assert_eq!(implicit_hydrogens(8, 3, 0), 0);
        assert_eq!(implicit_hydrogens(26, 2, 0), 0);
    }
}
