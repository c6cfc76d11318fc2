//! Overlap resolution: a greedy, deterministic pick of non-conflicting matches.

use crate::core::matches::{RawMatch, ResolvedMatch};

/// Turns raw occurrences into a conflict-free result set
pub struct OverlapResolver;

impl OverlapResolver {
    /// Resolve overlapping matches.
    ///
    /// Matches are ranked by specificity, then atom count, then catalog order,
    /// then atom indices, and admitted greedily unless they conflict with a
    /// match already admitted. The result is ordered by lowest atom index, then
    /// catalog order, then atom indices, and does not depend on input order.
    #[must_use]
    pub fn resolve(mut raw: Vec<RawMatch>) -> Vec<ResolvedMatch> {
        raw.sort_by(|a, b| {
            a.priority()
                .rank_cmp(&b.priority())
                .then_with(|| a.atoms.cmp(&b.atoms))
        });

        let mut admitted: Vec<RawMatch> = Vec::with_capacity(raw.len());
        for candidate in raw {
            if admitted.iter().all(|kept| !conflicts(kept, &candidate)) {
                admitted.push(candidate);
            }
        }

        admitted.sort_by(|a, b| {
            a.atoms
                .first()
                .cmp(&b.atoms.first())
                .then_with(|| a.catalog_index.cmp(&b.catalog_index))
                .then_with(|| a.atoms.cmp(&b.atoms))
        });
        admitted.into_iter().map(ResolvedMatch::from).collect()
    }
}

/// Whether two matches may not both appear in the result.
///
/// Disjoint matches never conflict. When one atom set contains the other, they
/// coexist only if the containing match is generic, strictly larger, and ranked
/// strictly below the contained one. Any other overlap is a conflict.
#[must_use]
pub fn conflicts(a: &RawMatch, b: &RawMatch) -> bool {
    if a.atoms.is_disjoint(&b.atoms) {
        return false;
    }

    let (inner, outer) = if a.atoms.is_subset(&b.atoms) {
        (a, b)
    } else if b.atoms.is_subset(&a.atoms) {
        (b, a)
    } else {
        return true;
    };

    let nested_in_generic = outer.generic
        && outer.atoms.len() > inner.atoms.len()
        && outer.specificity < inner.specificity;
    !nested_in_generic
}
