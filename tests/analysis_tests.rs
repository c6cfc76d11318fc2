//! End-to-end analysis behavior
//!
//! These tests run the full pipeline (catalog, collection, resolution and
//! report assembly) and check the properties callers rely on: deterministic
//! output, containment and overlap rules, and isolation of per-pattern and
//! per-image failures.

use std::sync::Arc;
use std::time::Duration;

use fg_analyzer::core::matches::{AtomSet, RawMatch};
use fg_analyzer::core::molecule::Molecule;
use fg_analyzer::matching::OverlapResolver;
use fg_analyzer::parsing::PatternSyntaxError;
use fg_analyzer::render::{Highlight, HighlightRenderer, ImageSize, RenderError};
use fg_analyzer::search::{SearchError, SearchHits, SmartsSearch, SubstructureSearch};
use fg_analyzer::{
    AnalysisConfig, AnalysisEngine, AnalysisReport, InputFormat, PatternCatalog, WarningKind,
};
use proptest::prelude::*;

const MOLECULES: [&str; 8] = [
    "CC(=O)O",
    "CC(=O)Oc1ccccc1C(=O)O",
    "OCCCO",
    "CN1C=NC2=C1C(=O)N(C(=O)N2C)C",
    "NCC(=O)NCC(=O)O",
    "c1ccc(cc1)[N+](=O)[O-]",
    "CCOC(=O)C=CC#N",
    "OC(CS)CBr",
];

fn embedded_engine(threads: usize) -> AnalysisEngine {
    let catalog = Arc::new(PatternCatalog::load_embedded().expect("embedded catalog"));
    AnalysisEngine::with_config(
        catalog,
        AnalysisConfig {
            worker_threads: threads,
            render_images: false,
            ..AnalysisConfig::default()
        },
    )
}

fn custom_engine(groups: &str) -> AnalysisEngine {
    let json = format!(r#"{{"metadata": {{"version": "1.0.0"}}, "functional_groups": [{groups}]}}"#);
    let catalog = Arc::new(PatternCatalog::from_json(&json).expect("test catalog"));
    AnalysisEngine::with_config(
        catalog,
        AnalysisConfig {
            worker_threads: 2,
            ..AnalysisConfig::default()
        },
    )
}

fn analyze(engine: &AnalysisEngine, smiles: &str) -> AnalysisReport {
    engine
        .analyze_input(smiles, InputFormat::Smiles)
        .unwrap_or_else(|e| panic!("{smiles}: {e}"))
}

fn atom_sets(report: &AnalysisReport) -> Vec<Vec<usize>> {
    report
        .occurrences
        .iter()
        .map(|m| m.atoms.as_slice().to_vec())
        .collect()
}

#[test]
fn test_determinism_across_thread_counts() {
    let single = embedded_engine(1);
    let parallel = embedded_engine(4);

    for smiles in MOLECULES {
        let expected = analyze(&single, smiles);
        for _ in 0..10 {
            let report = analyze(&parallel, smiles);
            assert_eq!(report.matches, expected.matches, "{smiles}");
            assert_eq!(report.occurrences, expected.occurrences, "{smiles}");
        }
    }
}

#[test]
fn test_carboxylic_acid_contains_carbonyl() {
    let report = analyze(&embedded_engine(2), "CC(=O)O");
    assert_eq!(report.matches, vec!["Carboxylic acid"]);
    assert_eq!(atom_sets(&report), vec![vec![1, 2, 3]]);
    assert!(!report.groups.contains_key("Carbonyl"));
    assert!(!report.groups.contains_key("Hydroxyl"));
}

#[test]
fn test_partial_overlap_higher_priority_wins() {
    let engine = custom_engine(
        r#"{"name": "CC", "smarts": "CC", "specificity": 1},
           {"name": "CO", "smarts": "CO", "specificity": 2}"#,
    );
    let report = analyze(&engine, "CCO");
    assert_eq!(report.matches, vec!["CO"]);
    assert_eq!(atom_sets(&report), vec![vec![1, 2]]);
}

#[test]
fn test_equal_sets_earlier_entry_wins() {
    let engine = custom_engine(
        r#"{"name": "Alcohol oxygen", "smarts": "[OX2H]", "specificity": 5},
           {"name": "Hydroxyl", "smarts": "[OH]", "specificity": 5}"#,
    );
    let report = analyze(&engine, "CCO");
    assert_eq!(report.matches, vec!["Alcohol oxygen"]);
}

#[test]
fn test_symmetric_diol_keeps_both_hydroxyls() {
    let engine = custom_engine(r#"{"name": "Hydroxyl", "smarts": "[OX2H]", "specificity": 5}"#);
    let report = analyze(&engine, "OCCCO");
    assert_eq!(report.matches, vec!["Hydroxyl"]);
    assert_eq!(atom_sets(&report), vec![vec![0], vec![4]]);
    assert_eq!(report.groups["Hydroxyl"].atom_sets.len(), 2);

    let report = analyze(&embedded_engine(2), "OCCCO");
    assert_eq!(report.matches, vec!["Primary alcohol"]);
    assert_eq!(atom_sets(&report), vec![vec![0, 1], vec![3, 4]]);
}

#[test]
fn test_resolved_sets_round_trip() {
    let engine = embedded_engine(2);
    let search = SmartsSearch::new();

    for smiles in MOLECULES {
        let molecule = fg_analyzer::parse_molecule(smiles, InputFormat::Smiles).unwrap();
        let report = engine.analyze(&molecule);

        for occurrence in &report.occurrences {
            assert!(occurrence
                .atoms
                .iter()
                .all(|&a| a < molecule.atom_count()));

            let def = engine.catalog().get(&occurrence.name).unwrap();
            let tuples = search
                .find_matches(&molecule, &def.smarts)
                .or_else(|_| search.find_matches(&molecule, def.fallback().unwrap_or("")))
                .unwrap()
                .mappings;
            assert!(
                tuples.iter().any(|t| AtomSet::from_tuple(t) == occurrence.atoms),
                "{smiles}: {} at {:?} not reproduced",
                occurrence.name,
                occurrence.atoms
            );
        }
    }
}

#[test]
fn test_corrupted_entry_dropped_at_load() {
    let engine = custom_engine(
        r#"{"name": "Broken", "smarts": "[C(", "simplified": "C)("},
           {"name": "Hydroxyl", "smarts": "[OX2H]", "specificity": 5}"#,
    );
    assert_eq!(engine.catalog().len(), 1);
    assert_eq!(engine.catalog().load_warnings().len(), 1);

    let report = analyze(&engine, "CCO");
    assert_eq!(report.matches, vec!["Hydroxyl"]);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::PatternEntry);
    assert_eq!(report.warnings[0].group.as_deref(), Some("Broken"));
    assert_eq!(report.processing.patterns_dropped, 1);
}

/// Delegates to SMARTS matching but fails chosen patterns
struct FaultySearch {
    inner: SmartsSearch,
    broken: &'static str,
    error: SearchError,
}

impl SubstructureSearch for FaultySearch {
    fn validate(&self, pattern: &str) -> Result<usize, SearchError> {
        self.inner.validate(pattern)
    }

    fn find_matches(&self, molecule: &Molecule, pattern: &str) -> Result<SearchHits, SearchError> {
        if pattern == self.broken {
            Err(self.error.clone())
        } else {
            self.inner.find_matches(molecule, pattern)
        }
    }
}

#[test]
fn test_pattern_failure_at_request_time_is_skipped() {
    let syntax = SearchError::PatternSyntax(PatternSyntaxError {
        pattern: "[CX3](=O)[OX2H1]".to_string(),
        position: 0,
        message: "injected".to_string(),
    });
    let engine = embedded_engine(2).with_search(Arc::new(FaultySearch {
        inner: SmartsSearch::new(),
        broken: "[CX3](=O)[OX2H1]",
        error: syntax,
    }));

    let report = analyze(&engine, "CC(=O)O");
    // Without the acid pattern the carbonyl and hydroxyl surface instead
    assert!(!report.matches.contains(&"Carboxylic acid".to_string()));
    assert!(report.matches.contains(&"Carbonyl".to_string()));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::PatternSyntax);
    assert_eq!(report.warnings[0].group.as_deref(), Some("Carboxylic acid"));
    assert_eq!(report.processing.patterns_skipped, 1);
}

#[test]
fn test_pattern_timeout_is_skipped() {
    let engine = embedded_engine(2).with_search(Arc::new(FaultySearch {
        inner: SmartsSearch::new(),
        broken: "c1ccccc1",
        error: SearchError::Timeout {
            limit: Duration::from_millis(5),
        },
    }));

    let report = analyze(&engine, "Cc1ccccc1");
    assert!(report.matches.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::PatternTimeout);
    assert_eq!(report.warnings[0].group.as_deref(), Some("Benzene ring"));
}

#[test]
fn test_occurrence_cap_is_a_warning() {
    let json = r#"{"functional_groups": [{"name": "Branch point", "smarts": "[#6]~[#6](~[#6])"}]}"#;
    let catalog = Arc::new(PatternCatalog::from_json(json).unwrap());
    let engine = AnalysisEngine::with_config(
        catalog,
        AnalysisConfig {
            render_images: false,
            pattern_timeout: Duration::from_secs(60),
            ..AnalysisConfig::default()
        },
    );

    // 400 branched backbone carbons, three distinct sets each
    let smiles = format!("C{}C", "C(C)".repeat(400));
    let report = analyze(&engine, &smiles);
    assert_eq!(report.processing.raw_matches, 1000);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::PatternTruncated);
    assert_eq!(report.warnings[0].group.as_deref(), Some("Branch point"));
    assert_eq!(report.processing.patterns_skipped, 0);
}

#[test]
fn test_real_timeout_skips_only_slow_pattern() {
    let json = r#"{"functional_groups": [
        {"name": "Long chain", "smarts": "C~C~C~C~C~C~C~C~C~C~C~C~C~C", "specificity": 1},
        {"name": "Hydroxyl", "smarts": "[OX2H]", "specificity": 5}
    ]}"#;
    let catalog = Arc::new(PatternCatalog::from_json(json).unwrap());
    let engine = AnalysisEngine::with_config(
        catalog,
        AnalysisConfig {
            pattern_timeout: Duration::ZERO,
            render_images: false,
            ..AnalysisConfig::default()
        },
    );

    let smiles = format!("{}O", "C(C)".repeat(40));
    let report = analyze(&engine, &smiles);
    assert!(report
        .warnings
        .iter()
        .all(|w| w.kind == WarningKind::PatternTimeout));
    assert!(report
        .warnings
        .iter()
        .any(|w| w.group.as_deref() == Some("Long chain")));
}

#[test]
fn test_no_matches_still_renders() {
    let engine = custom_engine(r#"{"name": "Hydroxyl", "smarts": "[OX2H]", "specificity": 5}"#);
    let report = analyze(&engine, "CCCC");
    assert!(report.matches.is_empty());
    assert!(report.occurrences.is_empty());
    assert!(report.warnings.is_empty());
    let image = report.combined_image.expect("combined image");
    assert_eq!(image.media_type, "image/svg+xml");
    assert!(report.individual_images.is_empty());
}

struct BrokenRenderer;

impl HighlightRenderer for BrokenRenderer {
    fn media_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn render(&self, _: &Molecule, _: &[Highlight], _: ImageSize) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Timeout {
            limit: Duration::from_millis(1),
        })
    }
}

#[test]
fn test_render_failure_leaves_text_intact() {
    let catalog = Arc::new(PatternCatalog::load_embedded().unwrap());
    let engine = AnalysisEngine::new(catalog).with_renderer(Arc::new(BrokenRenderer));

    let report = analyze(&engine, "CC(=O)O");
    assert_eq!(report.matches, vec!["Carboxylic acid"]);
    assert!(report.groups.contains_key("Carboxylic acid"));
    assert!(report.combined_image.is_none());
    assert!(report.individual_images.is_empty());
    assert!(report.warnings.iter().all(|w| w.kind == WarningKind::Render));
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn test_images_are_base64_svg() {
    use base64::Engine as _;

    let catalog = Arc::new(PatternCatalog::load_embedded().unwrap());
    let engine = AnalysisEngine::new(catalog);
    let report = analyze(&engine, "OCCCO");

    let image = report.combined_image.unwrap();
    let svg = base64::engine::general_purpose::STANDARD
        .decode(&image.data)
        .unwrap();
    let svg = String::from_utf8(svg).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(&report.groups["Primary alcohol"].color));
    assert!(report.individual_images.contains_key("Primary alcohol"));
}

#[test]
fn test_mol_block_input() {
    let block = "\
ethanol
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.2990    0.7500    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.5981    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  1  0
M  END
";
    let report = embedded_engine(2)
        .analyze_input(block, InputFormat::MolFile)
        .unwrap();
    assert_eq!(report.matches, vec!["Primary alcohol"]);
    assert_eq!(report.input_format, Some(InputFormat::MolFile));
}

fn raw_matches() -> impl Strategy<Value = Vec<RawMatch>> {
    let one = (0usize..6, prop::collection::vec(0usize..10, 1..5)).prop_map(|(index, atoms)| {
        RawMatch {
            name: format!("group_{index}"),
            catalog_index: index,
            specificity: i32::try_from(index % 3).unwrap_or(0) * 5,
            generic: index == 0,
            atoms: AtomSet::from_tuple(&atoms),
        }
    });
    prop::collection::vec(one, 0..12)
}

proptest! {
    #[test]
    fn prop_resolution_ignores_input_order(
        (original, shuffled) in raw_matches().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let expected = OverlapResolver::resolve(original);
        prop_assert_eq!(OverlapResolver::resolve(shuffled), expected);
    }

    #[test]
    fn prop_resolved_matches_never_conflict(raw in raw_matches()) {
        let resolved = OverlapResolver::resolve(raw.clone());
        let survivors: Vec<&RawMatch> = raw
            .iter()
            .filter(|r| resolved.iter().any(|m| m.catalog_index == r.catalog_index && m.atoms == r.atoms))
            .collect();
        for (i, a) in survivors.iter().enumerate() {
            for b in &survivors[i + 1..] {
                if a.catalog_index == b.catalog_index && a.atoms == b.atoms {
                    continue;
                }
                prop_assert!(!fg_analyzer::matching::resolver::conflicts(a, b));
            }
        }
    }
}
