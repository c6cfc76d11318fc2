use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

use super::element;

/// Errors raised while assembling a molecular graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("Bond {index} references atom {atom} but the molecule has {atom_count} atoms")]
    BondOutOfRange {
        index: usize,
        atom: usize,
        atom_count: usize,
    },

    #[error("Bond {index} connects atom {atom} to itself")]
    SelfBond { index: usize, atom: usize },

    #[error("Atoms {begin} and {end} are bonded more than once")]
    DuplicateBond { begin: usize, end: usize },

    #[error("Coordinate count {found} does not match atom count {expected}")]
    CoordinateMismatch { expected: usize, found: usize },
}

/// Bond order between two atoms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to an atom's bond-order sum when computing implicit hydrogens.
    /// Aromatic bonds count one; aromatic atoms add their extra electron separately.
    #[must_use]
    pub fn valence_units(self) -> u8 {
        match self {
            Self::Single | Self::Aromatic => 1,
            Self::Double => 2,
            Self::Triple => 3,
        }
    }

    /// Twice the bond order, so aromatic bonds (1.5) stay integral
    #[must_use]
    pub fn doubled(self) -> u8 {
        match self {
            Self::Single => 2,
            Self::Aromatic => 3,
            Self::Double => 4,
            Self::Triple => 6,
        }
    }
}

/// A single atom in a molecule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    pub atomic_number: u8,
    pub aromatic: bool,
    pub formal_charge: i8,
    pub implicit_hydrogens: u8,
    pub isotope: Option<u16>,
}

impl Atom {
    #[must_use]
    pub fn new(atomic_number: u8) -> Self {
        Self {
            atomic_number,
            aromatic: false,
            formal_charge: 0,
            implicit_hydrogens: 0,
            isotope: None,
        }
    }

    #[must_use]
    pub fn aromatic(mut self, aromatic: bool) -> Self {
        self.aromatic = aromatic;
        self
    }

    #[must_use]
    pub fn with_charge(mut self, charge: i8) -> Self {
        self.formal_charge = charge;
        self
    }

    #[must_use]
    pub fn with_hydrogens(mut self, count: u8) -> Self {
        self.implicit_hydrogens = count;
        self
    }

    /// Element symbol, capitalised
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        element::symbol_for(self.atomic_number)
    }
}

/// A bond between two atoms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

impl Bond {
    #[must_use]
    pub fn new(begin: usize, end: usize, order: BondOrder) -> Self {
        Self { begin, end, order }
    }

    /// The atom at the other end of this bond
    #[must_use]
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// Ring membership computed once when the molecule is built
#[derive(Debug, Clone, Default)]
struct RingInfo {
    rings: Vec<Vec<usize>>,
    atom_rings: Vec<Vec<usize>>,
    ring_bonds: Vec<bool>,
}

/// An immutable molecular graph.
///
/// Atom indices are stable and zero-based; they are the indices reported in every
/// match. Ring perception (and aromaticity of alternating six-membered rings) is
/// done once at construction.
#[derive(Debug, Clone)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// atom -> (neighbor, bond index)
    adjacency: Vec<Vec<(usize, usize)>>,
    rings: RingInfo,
    coordinates: Option<Vec<[f64; 2]>>,
}

impl Molecule {
    /// Build a molecule, validating bonds and perceiving rings.
    ///
    /// # Errors
    ///
    /// Returns an error if a bond references a missing atom, bonds an atom to itself,
    /// or duplicates another bond.
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Result<Self, MoleculeError> {
        let mut adjacency = vec![Vec::new(); atoms.len()];

        for (index, bond) in bonds.iter().enumerate() {
            for atom in [bond.begin, bond.end] {
                if atom >= atoms.len() {
                    return Err(MoleculeError::BondOutOfRange {
                        index,
                        atom,
                        atom_count: atoms.len(),
                    });
                }
            }
            if bond.begin == bond.end {
                return Err(MoleculeError::SelfBond {
                    index,
                    atom: bond.begin,
                });
            }
            if adjacency[bond.begin]
                .iter()
                .any(|&(n, _): &(usize, usize)| n == bond.end)
            {
                return Err(MoleculeError::DuplicateBond {
                    begin: bond.begin.min(bond.end),
                    end: bond.begin.max(bond.end),
                });
            }
            adjacency[bond.begin].push((bond.end, index));
            adjacency[bond.end].push((bond.begin, index));
        }

        let mut molecule = Self {
            atoms,
            bonds,
            adjacency,
            rings: RingInfo::default(),
            coordinates: None,
        };
        molecule.rings = perceive_rings(&molecule);
        molecule.perceive_kekule_aromaticity();
        Ok(molecule)
    }

    /// Attach 2D coordinates (e.g. from a MOL file) for rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of coordinates differs from the atom count.
    pub fn with_coordinates(mut self, coords: Vec<[f64; 2]>) -> Result<Self, MoleculeError> {
        if coords.len() != self.atoms.len() {
            return Err(MoleculeError::CoordinateMismatch {
                expected: self.atoms.len(),
                found: coords.len(),
            });
        }
        self.coordinates = Some(coords);
        Ok(self)
    }

    #[must_use]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    #[must_use]
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    #[must_use]
    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[must_use]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<&[[f64; 2]]> {
        self.coordinates.as_deref()
    }

    /// Neighbors of an atom as (neighbor index, bond index) pairs
    #[must_use]
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    /// Number of explicit connections
    #[must_use]
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    #[must_use]
    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency[a]
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bi)| &self.bonds[bi])
    }

    /// Implicit hydrogens plus explicit hydrogen neighbors
    #[must_use]
    pub fn total_hydrogens(&self, atom: usize) -> usize {
        let explicit = self.adjacency[atom]
            .iter()
            .filter(|&&(n, _)| self.atoms[n].atomic_number == 1)
            .count();
        usize::from(self.atoms[atom].implicit_hydrogens) + explicit
    }

    /// Total connections including implicit hydrogens
    #[must_use]
    pub fn connectivity(&self, atom: usize) -> usize {
        self.degree(atom) + usize::from(self.atoms[atom].implicit_hydrogens)
    }

    /// Total bond order including implicit hydrogens (aromatic bonds count 1.5, rounded down)
    #[must_use]
    pub fn valence(&self, atom: usize) -> usize {
        let doubled: usize = self.adjacency[atom]
            .iter()
            .map(|&(_, bi)| usize::from(self.bonds[bi].order.doubled()))
            .sum();
        doubled / 2 + usize::from(self.atoms[atom].implicit_hydrogens)
    }

    #[must_use]
    pub fn is_ring_atom(&self, atom: usize) -> bool {
        !self.rings.atom_rings[atom].is_empty()
    }

    #[must_use]
    pub fn is_ring_bond(&self, bond: usize) -> bool {
        self.rings.ring_bonds[bond]
    }

    /// Number of perceived rings containing the atom
    #[must_use]
    pub fn ring_count(&self, atom: usize) -> usize {
        self.rings.atom_rings[atom].len()
    }

    /// Whether the atom lies in a perceived ring of exactly `size` atoms
    #[must_use]
    pub fn in_ring_of_size(&self, atom: usize, size: usize) -> bool {
        self.rings.atom_rings[atom]
            .iter()
            .any(|&r| self.rings.rings[r].len() == size)
    }

    /// Size of the smallest perceived ring containing the atom
    #[must_use]
    pub fn smallest_ring_size(&self, atom: usize) -> Option<usize> {
        self.rings.atom_rings[atom]
            .iter()
            .map(|&r| self.rings.rings[r].len())
            .min()
    }

    /// Number of ring bonds touching the atom
    #[must_use]
    pub fn ring_bond_count(&self, atom: usize) -> usize {
        self.adjacency[atom]
            .iter()
            .filter(|&&(_, bi)| self.rings.ring_bonds[bi])
            .count()
    }

    /// Perceived rings as ordered atom cycles
    #[must_use]
    pub fn rings(&self) -> &[Vec<usize>] {
        &self.rings.rings
    }

    /// Molecular formula in Hill order (C, H, then alphabetical)
    #[must_use]
    pub fn molecular_formula(&self) -> String {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut hydrogens = 0usize;
        for atom in &self.atoms {
            if atom.atomic_number == 1 {
                hydrogens += 1;
            } else {
                *counts.entry(atom.symbol()).or_default() += 1;
            }
            hydrogens += usize::from(atom.implicit_hydrogens);
        }

        let mut formula = String::new();
        let mut push = |symbol: &str, count: usize| {
            if count == 0 {
                return;
            }
            formula.push_str(symbol);
            if count > 1 {
                formula.push_str(&count.to_string());
            }
        };

        if let Some(carbons) = counts.remove("C") {
            push("C", carbons);
            push("H", hydrogens);
            for (symbol, count) in counts {
                push(symbol, count);
            }
        } else {
            counts.insert("H", hydrogens);
            for (symbol, count) in counts {
                push(symbol, count);
            }
        }
        formula
    }

    /// Mark six-membered rings of alternating single/double bonds between C/N atoms
    /// as aromatic, so Kekulé input matches aromatic patterns.
    fn perceive_kekule_aromaticity(&mut self) {
        let original: Vec<BondOrder> = self.bonds.iter().map(|b| b.order).collect();
        let mut aromatic_bonds = Vec::new();

        for ring in &self.rings.rings {
            if ring.len() != 6 {
                continue;
            }
            if !ring
                .iter()
                .all(|&a| matches!(self.atoms[a].atomic_number, 6 | 7) && self.atoms[a].formal_charge == 0)
            {
                continue;
            }

            let mut ring_bonds = Vec::with_capacity(6);
            for i in 0..ring.len() {
                let a = ring[i];
                let b = ring[(i + 1) % ring.len()];
                if let Some(&(_, bi)) = self.adjacency[a].iter().find(|&&(n, _)| n == b) {
                    ring_bonds.push(bi);
                }
            }
            if ring_bonds.len() != 6 {
                continue;
            }

            let orders: Vec<BondOrder> = ring_bonds.iter().map(|&bi| original[bi]).collect();
            if orders.iter().all(|&o| o == BondOrder::Aromatic) {
                continue;
            }
            let alternating = (0..6).all(|i| {
                let here = orders[i];
                let next = orders[(i + 1) % 6];
                matches!(
                    (here, next),
                    (BondOrder::Single, BondOrder::Double) | (BondOrder::Double, BondOrder::Single)
                )
            });
            if alternating {
                aromatic_bonds.extend(ring_bonds);
            }
        }

        for bi in aromatic_bonds {
            self.bonds[bi].order = BondOrder::Aromatic;
            let (a, b) = (self.bonds[bi].begin, self.bonds[bi].end);
            self.atoms[a].aromatic = true;
            self.atoms[b].aromatic = true;
        }
    }
}

/// Find the smallest ring through every ring bond, deduplicated.
fn perceive_rings(mol: &Molecule) -> RingInfo {
    let n = mol.atoms.len();
    let mut info = RingInfo {
        rings: Vec::new(),
        atom_rings: vec![Vec::new(); n],
        ring_bonds: vec![false; mol.bonds.len()],
    };
    if n == 0 || mol.bonds.is_empty() {
        return info;
    }

    let candidates = cyclic_atoms(mol);
    let mut rings: Vec<Vec<usize>> = Vec::new();

    for (bi, bond) in mol.bonds.iter().enumerate() {
        if !candidates[bond.begin] || !candidates[bond.end] {
            continue;
        }
        if let Some(mut path) = shortest_path_avoiding(mol, bond.begin, bond.end, bi, &candidates)
        {
            info.ring_bonds[bi] = true;
            normalize_ring(&mut path);
            if !rings.contains(&path) {
                rings.push(path);
            }
        }
    }

    rings.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    for (ri, ring) in rings.iter().enumerate() {
        for &atom in ring {
            info.atom_rings[atom].push(ri);
        }
    }
    info.rings = rings;
    info
}

/// Atoms left after repeatedly pruning terminal atoms; only these can be in rings
fn cyclic_atoms(mol: &Molecule) -> Vec<bool> {
    let n = mol.atoms.len();
    let mut degree: Vec<usize> = (0..n).map(|i| mol.adjacency[i].len()).collect();
    let mut removed = vec![false; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| degree[i] <= 1).collect();

    while let Some(atom) = queue.pop_front() {
        if removed[atom] {
            continue;
        }
        removed[atom] = true;
        for &(neighbor, _) in &mol.adjacency[atom] {
            if !removed[neighbor] {
                degree[neighbor] -= 1;
                if degree[neighbor] <= 1 {
                    queue.push_back(neighbor);
                }
            }
        }
    }

    removed.into_iter().map(|r| !r).collect()
}

fn shortest_path_avoiding(
    mol: &Molecule,
    start: usize,
    end: usize,
    excluded_bond: usize,
    allowed: &[bool],
) -> Option<Vec<usize>> {
    let mut parent = vec![usize::MAX; mol.atoms.len()];
    let mut visited = vec![false; mol.atoms.len()];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;

    while let Some(current) = queue.pop_front() {
        if current == end {
            let mut path = vec![end];
            let mut node = end;
            while node != start {
                node = parent[node];
                path.push(node);
            }
            path.reverse();
            return Some(path);
        }
        for &(neighbor, bi) in &mol.adjacency[current] {
            if bi == excluded_bond || visited[neighbor] || !allowed[neighbor] {
                continue;
            }
            visited[neighbor] = true;
            parent[neighbor] = current;
            queue.push_back(neighbor);
        }
    }
    None
}

/// Rotate so the smallest index is first, then pick the lexicographically smaller direction
fn normalize_ring(ring: &mut [usize]) {
    let Some(min_pos) = ring
        .iter()
        .enumerate()
        .min_by_key(|&(_, &v)| v)
        .map(|(i, _)| i)
    else {
        return;
    };
    ring.rotate_left(min_pos);
    let n = ring.len();
    if n > 2 && ring[n - 1] < ring[1] {
        ring[1..].reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> Molecule {
        let atoms = (0..n).map(|_| Atom::new(6)).collect();
        let bonds = (1..n).map(|i| Bond::new(i - 1, i, BondOrder::Single)).collect();
        Molecule::new(atoms, bonds).unwrap()
    }

    fn kekule_benzene() -> Molecule {
        let atoms = (0..6).map(|_| Atom::new(6).with_hydrogens(1)).collect();
        let bonds = (0..6)
            .map(|i| {
                let order = if i % 2 == 0 {
                    BondOrder::Double
                } else {
                    BondOrder::Single
                };
                Bond::new(i, (i + 1) % 6, order)
            })
            .collect();
        Molecule::new(atoms, bonds).unwrap()
    }

    #[test]
    fn test_adjacency_and_degree() {
        let mol = chain(3);
        assert_eq!(mol.degree(0), 1);
        assert_eq!(mol.degree(1), 2);
        assert!(mol.bond_between(0, 1).is_some());
        assert!(mol.bond_between(0, 2).is_none());
    }

    #[test]
    fn test_invalid_bonds_rejected() {
        let atoms = vec![Atom::new(6), Atom::new(8)];
        let err = Molecule::new(atoms.clone(), vec![Bond::new(0, 5, BondOrder::Single)]);
        assert!(matches!(err, Err(MoleculeError::BondOutOfRange { atom: 5, .. })));

        let err = Molecule::new(atoms.clone(), vec![Bond::new(1, 1, BondOrder::Single)]);
        assert!(matches!(err, Err(MoleculeError::SelfBond { .. })));

        let err = Molecule::new(
            atoms,
            vec![
                Bond::new(0, 1, BondOrder::Single),
                Bond::new(1, 0, BondOrder::Double),
            ],
        );
        assert!(matches!(err, Err(MoleculeError::DuplicateBond { .. })));
    }

    #[test]
    fn test_acyclic_has_no_rings() {
        let mol = chain(5);
        assert!(mol.rings().is_empty());
        assert!((0..5).all(|i| !mol.is_ring_atom(i)));
    }

    #[test]
    fn test_ring_perception_and_aromaticity() {
        let mol = kekule_benzene();
        assert_eq!(mol.rings().len(), 1);
        assert!(mol.in_ring_of_size(0, 6));
        assert_eq!(mol.smallest_ring_size(3), Some(6));
        assert!(mol.atoms().iter().all(|a| a.aromatic));
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
        assert_eq!(mol.valence(0), 4);
    }

    #[test]
    fn test_cyclohexane_not_aromatic() {
        let atoms = (0..6).map(|_| Atom::new(6).with_hydrogens(2)).collect();
        let bonds = (0..6).map(|i| Bond::new(i, (i + 1) % 6, BondOrder::Single)).collect();
        let mol = Molecule::new(atoms, bonds).unwrap();
        assert_eq!(mol.rings().len(), 1);
        assert!(mol.atoms().iter().all(|a| !a.aromatic));
        assert_eq!(mol.ring_bond_count(0), 2);
    }

    #[test]
    fn test_molecular_formula() {
        // ethanol: C C O with hydrogens
        let atoms = vec![
            Atom::new(6).with_hydrogens(3),
            Atom::new(6).with_hydrogens(2),
            Atom::new(8).with_hydrogens(1),
        ];
        let bonds = vec![
            Bond::new(0, 1, BondOrder::Single),
            Bond::new(1, 2, BondOrder::Single),
        ];
        let mol = Molecule::new(atoms, bonds).unwrap();
        assert_eq!(mol.molecular_formula(), "C2H6O");
    }

    #[test]
    fn test_coordinates_must_match_atoms() {
        let mol = chain(2);
        assert!(mol.clone().with_coordinates(vec![[0.0, 0.0]]).is_err());
        let mol = mol.with_coordinates(vec![[0.0, 0.0], [1.0, 0.0]]).unwrap();
        assert_eq!(mol.coordinates().unwrap().len(), 2);
    }
}
