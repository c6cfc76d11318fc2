use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sorted, duplicate-free set of atom indices covered by one occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct AtomSet(Vec<usize>);

impl AtomSet {
    /// Build a set from a matched atom tuple, discarding order and repeats
    #[must_use]
    pub fn from_tuple(tuple: &[usize]) -> Self {
        let mut atoms = tuple.to_vec();
        atoms.sort_unstable();
        atoms.dedup();
        Self(atoms)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowest atom index, used for presentation order
    #[must_use]
    pub fn first(&self) -> Option<usize> {
        self.0.first().copied()
    }

    #[must_use]
    pub fn contains(&self, atom: usize) -> bool {
        self.0.binary_search(&atom).is_ok()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.0.iter()
    }

    /// Whether every atom of `self` is in `other` (non-strict)
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        let mut theirs = other.0.iter();
        'outer: for a in &self.0 {
            for b in theirs.by_ref() {
                match b.cmp(a) {
                    Ordering::Less => {}
                    Ordering::Equal => continue 'outer,
                    Ordering::Greater => return false,
                }
            }
            return false;
        }
        true
    }

    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].cmp(&other.0[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => return false,
            }
        }
        true
    }
}

impl FromIterator<usize> for AtomSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let atoms: Vec<usize> = iter.into_iter().collect();
        Self::from_tuple(&atoms)
    }
}

/// One occurrence of one pattern before overlap resolution.
///
/// Carries the pattern's rank, flag and catalog position so that resolution
/// depends on nothing but the list of raw matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawMatch {
    pub name: String,
    /// Position of the pattern in the catalog (declaration order)
    pub catalog_index: usize,
    pub specificity: i32,
    pub generic: bool,
    pub atoms: AtomSet,
}

impl RawMatch {
    #[must_use]
    pub fn priority(&self) -> MatchPriority {
        MatchPriority {
            specificity: self.specificity,
            atom_count: self.atoms.len(),
            catalog_index: self.catalog_index,
        }
    }
}

/// Score that decided whether a match survived resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchPriority {
    pub specificity: i32,
    pub atom_count: usize,
    pub catalog_index: usize,
}

impl MatchPriority {
    /// Ordering where the higher-priority value sorts first: specificity
    /// descending, atom count descending, catalog index ascending.
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .specificity
            .cmp(&self.specificity)
            .then_with(|| other.atom_count.cmp(&self.atom_count))
            .then_with(|| self.catalog_index.cmp(&other.catalog_index))
    }
}

/// A raw match that survived overlap resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedMatch {
    pub name: String,
    pub catalog_index: usize,
    pub atoms: AtomSet,
    pub priority: MatchPriority,
}

impl From<RawMatch> for ResolvedMatch {
    fn from(raw: RawMatch) -> Self {
        let priority = raw.priority();
        Self {
            name: raw.name,
            catalog_index: raw.catalog_index,
            atoms: raw.atoms,
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tuple_discards_order_and_repeats() {
        let set = AtomSet::from_tuple(&[3, 1, 3, 2]);
        assert_eq!(set.as_slice(), &[1, 2, 3]);
        assert_eq!(set.first(), Some(1));
        assert!(set.contains(2));
        assert!(!set.contains(4));
    }

    #[test]
    fn test_subset() {
        let small = AtomSet::from_tuple(&[1, 3]);
        let big = AtomSet::from_tuple(&[0, 1, 2, 3]);
        assert!(small.is_subset(&big));
        assert!(!big.is_subset(&small));
        assert!(big.is_subset(&big));
        assert!(!AtomSet::from_tuple(&[1, 4]).is_subset(&big));
        assert!(AtomSet::default().is_subset(&small));
    }

    #[test]
    fn test_disjoint() {
        let a = AtomSet::from_tuple(&[0, 2, 4]);
        let b = AtomSet::from_tuple(&[1, 3, 5]);
        let c = AtomSet::from_tuple(&[4, 5]);
        assert!(a.is_disjoint(&b));
        assert!(!a.is_disjoint(&c));
        assert!(!b.is_disjoint(&c));
    }

    #[test]
    fn test_priority_order() {
        let high = MatchPriority {
            specificity: 10,
            atom_count: 2,
            catalog_index: 5,
        };
        let larger = MatchPriority {
            specificity: 5,
            atom_count: 4,
            catalog_index: 0,
        };
        let earlier = MatchPriority {
            specificity: 5,
            atom_count: 4,
            catalog_index: 1,
        };
        assert_eq!(high.rank_cmp(&larger), Ordering::Less);
        assert_eq!(larger.rank_cmp(&earlier), Ordering::Less);
        assert_eq!(earlier.rank_cmp(&earlier), Ordering::Equal);
    }
}
