use std::collections::HashSet;

use crate::core::pattern::PatternDefinition;

use super::store::PatternCatalog;

/// Finds catalog entries matching a free-text term
pub struct CatalogSearch<'a> {
    catalog: &'a PatternCatalog,
}

impl<'a> CatalogSearch<'a> {
    #[must_use]
    pub fn new(catalog: &'a PatternCatalog) -> Self {
        Self { catalog }
    }

    /// Indices of groups whose name or description contain the (lowercased) term
    fn find_by_name_or_description(&self, needle: &str) -> Vec<usize> {
        self.matching(|g| {
            g.name.to_lowercase().contains(needle) || g.description.to_lowercase().contains(needle)
        })
    }

    /// Indices of groups whose categories, subcategories or common reactions contain the term
    fn find_by_classification(&self, needle: &str) -> Vec<usize> {
        self.matching(|g| {
            g.categories
                .iter()
                .chain(&g.subcategories)
                .chain(&g.common_reactions)
                .any(|text| text.to_lowercase().contains(needle))
        })
    }

    fn matching(&self, predicate: impl Fn(&PatternDefinition) -> bool) -> Vec<usize> {
        self.catalog
            .groups()
            .iter()
            .enumerate()
            .filter(|(_, g)| predicate(g))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Case-insensitive search. Name and description hits come first, then
    /// classification hits; catalog order within each tier.
    #[must_use]
    pub fn find(&self, term: &str) -> Vec<usize> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut seen: HashSet<usize> = HashSet::new();
        let mut result = Vec::new();

        // First add name/description hits (higher priority)
        for idx in self.find_by_name_or_description(&needle) {
            if seen.insert(idx) {
                result.push(idx);
            }
        }

        // Then add category/reaction hits
        for idx in self.find_by_classification(&needle) {
            if seen.insert(idx) {
                result.push(idx);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PatternCatalog {
        PatternCatalog::from_json(
            r#"{"functional_groups": [
                {"name": "Ester", "smarts": "[CX3](=O)[OX2][#6]", "categories": ["Carbonyl compounds"],
                 "common_reactions": ["Hydrolysis"]},
                {"name": "Ketone", "smarts": "[#6][CX3](=O)[#6]", "description": "A carbonyl between two carbons"},
                {"name": "Amide", "smarts": "[NX3][CX3]=[OX1]", "common_reactions": ["Hydrolysis"]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_name_and_description_hits_rank_first() {
        let catalog = catalog();
        let search = CatalogSearch::new(&catalog);
        // Ketone matches by description, Ester only by category
        assert_eq!(search.find("CARBONYL"), vec![1, 0]);
    }

    #[test]
    fn test_reaction_hits_keep_catalog_order() {
        let catalog = catalog();
        assert_eq!(CatalogSearch::new(&catalog).find("hydrolysis"), vec![0, 2]);
    }

    #[test]
    fn test_blank_and_missing_terms() {
        let catalog = catalog();
        let search = CatalogSearch::new(&catalog);
        assert!(search.find("  ").is_empty());
        assert!(search.find("sulfonamide").is_empty());
    }
}
