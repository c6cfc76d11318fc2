//! VF2 subgraph matching of SMARTS query graphs against molecules.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::core::molecule::{BondOrder, Molecule};
use crate::parsing::smarts::{AtomExpr, AtomPrimitive, BondExpr, BondPrimitive, SmartsPattern};

/// Candidate checks between deadline polls
const STEPS_PER_CLOCK_CHECK: u32 = 1024;

/// The search ran past its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded;

/// Limits and memo shared by a top-level search and its recursive sub-searches
pub struct SearchBudget {
    deadline: Option<Instant>,
    steps: u32,
    /// (recursive pattern address, atom) -> rooted match result
    recursive_memo: HashMap<(usize, usize), bool>,
}

impl SearchBudget {
    #[must_use]
    pub fn new(deadline: Option<Instant>) -> Self {
        Self {
            deadline,
            steps: 0,
            recursive_memo: HashMap::new(),
        }
    }

    fn tick(&mut self) -> Result<(), DeadlineExceeded> {
        self.steps = self.steps.wrapping_add(1);
        if self.steps % STEPS_PER_CLOCK_CHECK == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(DeadlineExceeded);
                }
            }
        }
        Ok(())
    }
}

/// Mappings found for one pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    /// One mapping per distinct target atom set, target atoms in query atom order
    pub mappings: Vec<Vec<usize>>,
    /// More distinct atom sets exist than the limit allowed
    pub truncated: bool,
}

/// Find mappings of `pattern` into `molecule`, one per distinct target atom set.
///
/// At most `limit` mappings are returned. When another distinct set exists
/// beyond the limit, `truncated` is set.
///
/// # Errors
///
/// Returns `DeadlineExceeded` if the budget's deadline passes during the search.
pub fn find_unique_mappings(
    pattern: &SmartsPattern,
    molecule: &Molecule,
    limit: usize,
    budget: &mut SearchBudget,
) -> Result<SearchHits, DeadlineExceeded> {
    if pattern.atom_count() > molecule.atom_count() {
        return Ok(SearchHits::default());
    }
    let mut state = Vf2State::new(pattern, molecule, budget, limit);
    state.detect_truncation = true;
    state.extend(0)?;
    Ok(SearchHits {
        mappings: state.mappings,
        truncated: state.truncated,
    })
}

struct Vf2State<'a, 'b> {
    pattern: &'a SmartsPattern,
    molecule: &'a Molecule,
    budget: &'b mut SearchBudget,
    // core_pattern[p] = Some(t) when query atom p is mapped to target atom t
    core_pattern: Vec<Option<usize>>,
    // core_target[t] = Some(p) when target atom t is mapped to query atom p
    core_target: Vec<Option<usize>>,
    seen_sets: HashSet<Vec<usize>>,
    mappings: Vec<Vec<usize>>,
    limit: usize,
    // Keep searching past the limit until one more distinct set turns up
    detect_truncation: bool,
    truncated: bool,
}

impl<'a, 'b> Vf2State<'a, 'b> {
    fn new(
        pattern: &'a SmartsPattern,
        molecule: &'a Molecule,
        budget: &'b mut SearchBudget,
        limit: usize,
    ) -> Self {
        Self {
            pattern,
            molecule,
            budget,
            core_pattern: vec![None; pattern.atom_count()],
            core_target: vec![None; molecule.atom_count()],
            seen_sets: HashSet::new(),
            mappings: Vec::new(),
            limit,
            detect_truncation: false,
            truncated: false,
        }
    }

    fn done(&self) -> bool {
        if self.detect_truncation {
            self.truncated
        } else {
            self.mappings.len() >= self.limit
        }
    }

    fn extend(&mut self, depth: usize) -> Result<(), DeadlineExceeded> {
        if depth == self.pattern.atom_count() {
            self.record();
            return Ok(());
        }
        if self.core_pattern[depth].is_some() {
            // Pre-mapped root of a recursive match
            return self.extend(depth + 1);
        }

        for target in self.candidates(depth) {
            self.budget.tick()?;
            if self.core_target[target].is_some() || !self.is_feasible(depth, target)? {
                continue;
            }

            self.core_pattern[depth] = Some(target);
            self.core_target[target] = Some(depth);
            let result = self.extend(depth + 1);
            self.core_pattern[depth] = None;
            self.core_target[target] = None;

            result?;
            if self.done() {
                break;
            }
        }
        Ok(())
    }

    fn record(&mut self) {
        let mapping: Vec<usize> = self.core_pattern.iter().flatten().copied().collect();
        let mut key = mapping.clone();
        key.sort_unstable();
        if !self.seen_sets.contains(&key) {
            if self.mappings.len() < self.limit {
                self.seen_sets.insert(key);
                self.mappings.push(mapping);
            } else {
                self.truncated = true;
            }
        }
    }

    /// Unmapped target atoms adjacent to the images of already-mapped query neighbors,
    /// or every unmapped atom when the query atom starts a new component
    fn candidates(&self, query_atom: usize) -> Vec<usize> {
        let anchor = self
            .pattern
            .neighbors(query_atom)
            .iter()
            .find_map(|&(n, _)| self.core_pattern[n]);

        match anchor {
            Some(mapped) => self
                .molecule
                .neighbors(mapped)
                .iter()
                .map(|&(n, _)| n)
                .filter(|&n| self.core_target[n].is_none())
                .collect(),
            None => (0..self.molecule.atom_count())
                .filter(|&t| self.core_target[t].is_none())
                .collect(),
        }
    }

    fn is_feasible(&mut self, query_atom: usize, target: usize) -> Result<bool, DeadlineExceeded> {
        let pattern = self.pattern;

        for &(query_neighbor, query_bond) in pattern.neighbors(query_atom) {
            let Some(mapped) = self.core_pattern[query_neighbor] else {
                continue;
            };
            let Some(&(_, bond_index)) = self
                .molecule
                .neighbors(target)
                .iter()
                .find(|&&(n, _)| n == mapped)
            else {
                return Ok(false);
            };
            if !bond_matches(&pattern.bonds()[query_bond].expr, self.molecule, bond_index) {
                return Ok(false);
            }
        }

        self.atom_matches(&pattern.atoms()[query_atom], target)
    }

    fn atom_matches(&mut self, expr: &'a AtomExpr, atom: usize) -> Result<bool, DeadlineExceeded> {
        match expr {
            AtomExpr::Prim(AtomPrimitive::Recursive(inner)) => self.recursive_matches(inner, atom),
            AtomExpr::Prim(prim) => Ok(primitive_matches(prim, self.molecule, atom)),
            AtomExpr::Not(inner) => Ok(!self.atom_matches(inner, atom)?),
            AtomExpr::And(terms) => {
                for term in terms {
                    if !self.atom_matches(term, atom)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            AtomExpr::Or(terms) => {
                for term in terms {
                    if self.atom_matches(term, atom)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn recursive_matches(&mut self, inner: &SmartsPattern, atom: usize) -> Result<bool, DeadlineExceeded> {
        let key = (std::ptr::from_ref(inner) as usize, atom);
        if let Some(&known) = self.budget.recursive_memo.get(&key) {
            return Ok(known);
        }

        let mut rooted = Vf2State::new(inner, self.molecule, &mut *self.budget, 1);
        let root_ok = rooted.atom_matches_root(atom)?;
        let found = if root_ok {
            rooted.core_pattern[0] = Some(atom);
            rooted.core_target[atom] = Some(0);
            rooted.extend(1)?;
            !rooted.mappings.is_empty()
        } else {
            false
        };

        self.budget.recursive_memo.insert(key, found);
        Ok(found)
    }

    fn atom_matches_root(&mut self, atom: usize) -> Result<bool, DeadlineExceeded> {
        let pattern = self.pattern;
        match pattern.atoms().first() {
            Some(expr) => self.atom_matches(expr, atom),
            None => Ok(false),
        }
    }
}

fn primitive_matches(prim: &AtomPrimitive, molecule: &Molecule, index: usize) -> bool {
    let Some(atom) = molecule.atom(index) else {
        return false;
    };
    let count = |n: &u8| usize::from(*n);

    match prim {
        AtomPrimitive::Any => true,
        AtomPrimitive::AtomicNum(n) => atom.atomic_number == *n,
        AtomPrimitive::Aromatic => atom.aromatic,
        AtomPrimitive::Aliphatic => !atom.aromatic,
        AtomPrimitive::Degree(n) => molecule.degree(index) == count(n),
        AtomPrimitive::TotalHCount(n) => molecule.total_hydrogens(index) == count(n),
        AtomPrimitive::ImplicitHCount(Some(n)) => atom.implicit_hydrogens == *n,
        AtomPrimitive::ImplicitHCount(None) => atom.implicit_hydrogens > 0,
        AtomPrimitive::RingMember => molecule.is_ring_atom(index),
        AtomPrimitive::RingCount(n) => molecule.ring_count(index) == count(n),
        AtomPrimitive::RingSize(n) => molecule.in_ring_of_size(index, count(n)),
        AtomPrimitive::RingConnectivity(n) => molecule.ring_bond_count(index) == count(n),
        AtomPrimitive::Connectivity(n) => molecule.connectivity(index) == count(n),
        AtomPrimitive::Valence(n) => molecule.valence(index) == count(n),
        AtomPrimitive::Charge(c) => atom.formal_charge == *c,
        AtomPrimitive::Isotope(i) => atom.isotope == Some(*i),
        // Evaluated by the matcher, which owns the memo
        AtomPrimitive::Recursive(_) => false,
    }
}

fn bond_matches(expr: &BondExpr, molecule: &Molecule, bond_index: usize) -> bool {
    let order = molecule.bonds()[bond_index].order;
    match expr {
        BondExpr::Implicit => matches!(order, BondOrder::Single | BondOrder::Aromatic),
        BondExpr::Prim(prim) => match prim {
            BondPrimitive::Single => order == BondOrder::Single,
            BondPrimitive::Double => order == BondOrder::Double,
            BondPrimitive::Triple => order == BondOrder::Triple,
            BondPrimitive::Aromatic => order == BondOrder::Aromatic,
            BondPrimitive::Any => true,
            BondPrimitive::Ring => molecule.is_ring_bond(bond_index),
        },
        BondExpr::Not(inner) => !bond_matches(inner, molecule, bond_index),
        BondExpr::And(terms) => terms.iter().all(|t| bond_matches(t, molecule, bond_index)),
        BondExpr::Or(terms) => terms.iter().any(|t| bond_matches(t, molecule, bond_index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::smarts::parse_smarts;
    use crate::parsing::smiles::parse_smiles;

    fn sets(smarts: &str, smiles: &str) -> Vec<Vec<usize>> {
        let pattern = parse_smarts(smarts).unwrap();
        let molecule = parse_smiles(smiles).unwrap();
        let mut budget = SearchBudget::new(None);
        let mut found: Vec<Vec<usize>> = find_unique_mappings(&pattern, &molecule, usize::MAX, &mut budget)
            .unwrap()
            .mappings
            .into_iter()
            .map(|mut m| {
                m.sort_unstable();
                m
            })
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_carboxylic_acid_in_acetic_acid() {
        assert_eq!(sets("[#6][CX3](=O)[OX2H1]", "CC(=O)O"), vec![vec![0, 1, 2, 3]]);
        assert_eq!(sets("[CX3]=[OX1]", "CC(=O)O"), vec![vec![1, 2]]);
        assert_eq!(sets("[OX2H]", "CC(=O)O"), vec![vec![3]]);
    }

    #[test]
    fn test_symmetric_diol_has_two_hydroxyls() {
        assert_eq!(sets("[OX2H]", "OCCCO"), vec![vec![0], vec![4]]);
    }

    #[test]
    fn test_aromatic_ring_is_one_set() {
        assert_eq!(sets("c1ccccc1", "Oc1ccccc1"), vec![vec![1, 2, 3, 4, 5, 6]]);
        assert!(sets("c1ccccc1", "C1CCCCC1").is_empty());
        // Kekulé input is perceived as aromatic
        assert_eq!(sets("c1ccccc1", "C1=CC=CC=C1").len(), 1);
    }

    #[test]
    fn test_bond_and_ring_primitives() {
        assert_eq!(sets("C=C", "CC=CC"), vec![vec![1, 2]]);
        assert_eq!(sets("C~C", "CC=C").len(), 2);
        assert_eq!(sets("[CR]", "C1CC1C").len(), 3);
        assert_eq!(sets("[CR0]", "C1CC1C"), vec![vec![3]]);
        assert_eq!(sets("C@C", "C1CC1C").len(), 3);
        assert_eq!(sets("[N+](=O)[O-]", "C[N+](=O)[O-]"), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_recursive_smarts() {
        // Oxygen attached to an aromatic carbon
        assert_eq!(sets("[$([OH]c)]", "Oc1ccccc1"), vec![vec![0]]);
        assert!(sets("[$([OH]c)]", "CCO").is_empty());
        assert_eq!(sets("[$(C=O);!$(CO)]", "CC=O"), vec![vec![1]]);
    }

    #[test]
    fn test_limit_and_deadline() {
        let pattern = parse_smarts("C").unwrap();
        let molecule = parse_smiles("CCCCCC").unwrap();
        let mut budget = SearchBudget::new(None);
        let found = find_unique_mappings(&pattern, &molecule, 2, &mut budget).unwrap();
        assert_eq!(found.mappings.len(), 2);
        assert!(found.truncated);

        let exact = find_unique_mappings(&pattern, &molecule, 6, &mut budget).unwrap();
        assert_eq!(exact.mappings.len(), 6);
        assert!(!exact.truncated);

        let none = find_unique_mappings(&pattern, &molecule, 0, &mut budget).unwrap();
        assert!(none.mappings.is_empty());
        assert!(none.truncated);

        let big = parse_smiles(&"C".repeat(60)).unwrap();
        let chain = parse_smarts(&"C~".repeat(20).trim_end_matches('~').to_string()).unwrap();
        let mut expired = SearchBudget::new(Some(Instant::now()));
        let result = find_unique_mappings(&chain, &big, usize::MAX, &mut expired);
        assert_eq!(result, Err(DeadlineExceeded));
    }
}
