//! Join resolved matches with catalog metadata and request highlight images.

use base64::Engine as _;
use std::collections::BTreeMap;

use crate::catalog::store::PatternCatalog;
use crate::core::matches::{AtomSet, ResolvedMatch};
use crate::core::molecule::Molecule;
use crate::core::types::{AnalysisWarning, WarningKind};
use crate::render::{Highlight, HighlightRenderer, ImageSize};

use super::palette::color_for;
use super::{AnalysisReport, GroupMetadata, HighlightImage, ProcessingInfo};

/// Image settings for one assembler
#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    pub enabled: bool,
    pub combined: ImageSize,
    pub individual: ImageSize,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            combined: ImageSize::new(400, 400),
            individual: ImageSize::new(300, 300),
        }
    }
}

/// Builds an [`AnalysisReport`] from a resolved match set
pub struct ResultAssembler<'a> {
    catalog: &'a PatternCatalog,
    renderer: &'a dyn HighlightRenderer,
    images: ImageOptions,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(
        catalog: &'a PatternCatalog,
        renderer: &'a dyn HighlightRenderer,
        images: ImageOptions,
    ) -> Self {
        Self {
            catalog,
            renderer,
            images,
        }
    }

    /// Assemble the report.
    ///
    /// Image failures are recorded in `warnings` and the image is left out; the
    /// rest of the report is unaffected.
    pub fn assemble(
        &self,
        molecule: &Molecule,
        resolved: Vec<ResolvedMatch>,
        mut warnings: Vec<AnalysisWarning>,
        processing: ProcessingInfo,
    ) -> AnalysisReport {
        let mut names: Vec<String> = Vec::new();
        let mut atom_sets: BTreeMap<String, Vec<AtomSet>> = BTreeMap::new();
        for occurrence in &resolved {
            let sets = atom_sets.entry(occurrence.name.clone()).or_default();
            if sets.is_empty() {
                names.push(occurrence.name.clone());
            }
            sets.push(occurrence.atoms.clone());
        }

        let mut groups = BTreeMap::new();
        for (name, sets) in &atom_sets {
            match self.catalog.get(name) {
                Some(def) => {
                    let metadata = GroupMetadata::from_definition(def, color_for(name).to_hex(), sets.clone());
                    groups.insert(name.clone(), metadata);
                }
                None => tracing::error!(group = %name, "Resolved group missing from catalog"),
            }
        }

        let (combined_image, individual_images) = if self.images.enabled {
            self.render_images(molecule, &resolved, &names, &mut warnings)
        } else {
            (None, BTreeMap::new())
        };

        AnalysisReport {
            input_format: None,
            molecular_formula: molecule.molecular_formula(),
            atom_count: molecule.atom_count(),
            matches: names,
            occurrences: resolved,
            groups,
            combined_image,
            individual_images,
            warnings,
            processing,
        }
    }

    fn render_images(
        &self,
        molecule: &Molecule,
        resolved: &[ResolvedMatch],
        names: &[String],
        warnings: &mut Vec<AnalysisWarning>,
    ) -> (Option<HighlightImage>, BTreeMap<String, HighlightImage>) {
        let combined: Vec<Highlight> = resolved
            .iter()
            .map(|m| Highlight {
                atoms: m.atoms.as_slice().to_vec(),
                color: color_for(&m.name),
            })
            .collect();
        let combined_image = self.render(molecule, &combined, self.images.combined, None, warnings);

        let mut individual_images = BTreeMap::new();
        for name in names {
            let highlights: Vec<Highlight> = combined
                .iter()
                .zip(resolved)
                .filter(|(_, m)| &m.name == name)
                .map(|(h, _)| h.clone())
                .collect();
            if let Some(image) = self.render(molecule, &highlights, self.images.individual, Some(name), warnings) {
                individual_images.insert(name.clone(), image);
            }
        }
        (combined_image, individual_images)
    }

    fn render(
        &self,
        molecule: &Molecule,
        highlights: &[Highlight],
        size: ImageSize,
        group: Option<&str>,
        warnings: &mut Vec<AnalysisWarning>,
    ) -> Option<HighlightImage> {
        match self.renderer.render(molecule, highlights, size) {
            Ok(bytes) => Some(HighlightImage {
                media_type: self.renderer.media_type().to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
                width: size.width,
                height: size.height,
            }),
            Err(e) => {
                tracing::warn!(group = group.unwrap_or("combined"), error = %e, "Image not rendered");
                warnings.push(AnalysisWarning::new(WarningKind::Render, group, e.to_string()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matches::MatchPriority;
    use crate::parsing::smiles::parse_smiles;
    use crate::render::{RenderError, SvgRenderer};

    fn resolved(name: &str, catalog: &PatternCatalog, atoms: &[usize]) -> ResolvedMatch {
        let index = catalog.index_of(name).unwrap();
        ResolvedMatch {
            name: name.to_string(),
            catalog_index: index,
            atoms: AtomSet::from_tuple(atoms),
            priority: MatchPriority {
                specificity: catalog.groups()[index].rank(),
                atom_count: atoms.len(),
                catalog_index: index,
            },
        }
    }

    struct FailingRenderer;

    impl HighlightRenderer for FailingRenderer {
        fn media_type(&self) -> &'static str {
            "image/png"
        }

        fn render(&self, _: &Molecule, _: &[Highlight], _: ImageSize) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::TooLarge { atoms: 1, max: 0 })
        }
    }

    #[test]
    fn test_metadata_joined() {
        let catalog = PatternCatalog::load_embedded().unwrap();
        let mol = parse_smiles("OCCCO").unwrap();
        let renderer = SvgRenderer::new();
        let assembler = ResultAssembler::new(&catalog, &renderer, ImageOptions::default());

        let report = assembler.assemble(
            &mol,
            vec![
                resolved("Primary alcohol", &catalog, &[0, 1]),
                resolved("Primary alcohol", &catalog, &[3, 4]),
            ],
            Vec::new(),
            ProcessingInfo::default(),
        );

        assert_eq!(report.matches, vec!["Primary alcohol"]);
        let group = &report.groups["Primary alcohol"];
        assert_eq!(group.atom_sets.len(), 2);
        assert_eq!(group.color, color_for("Primary alcohol").to_hex());
        assert!(group.hierarchical_path.ends_with("Primary alcohol"));

        let image = report.combined_image.unwrap();
        assert_eq!(image.media_type, "image/svg+xml");
        assert_eq!((image.width, image.height), (400, 400));
        assert_eq!(report.individual_images["Primary alcohol"].width, 300);
    }

    #[test]
    fn test_empty_result_still_has_image() {
        let catalog = PatternCatalog::load_embedded().unwrap();
        let mol = parse_smiles("CCCC").unwrap();
        let renderer = SvgRenderer::new();
        let report = ResultAssembler::new(&catalog, &renderer, ImageOptions::default()).assemble(
            &mol,
            Vec::new(),
            Vec::new(),
            ProcessingInfo::default(),
        );
        assert!(report.matches.is_empty());
        assert!(report.combined_image.is_some());
        assert!(report.individual_images.is_empty());
    }

    #[test]
    fn test_render_failure_is_a_warning() {
        let catalog = PatternCatalog::load_embedded().unwrap();
        let mol = parse_smiles("CC(=O)O").unwrap();
        let report = ResultAssembler::new(&catalog, &FailingRenderer, ImageOptions::default()).assemble(
            &mol,
            vec![resolved("Carboxylic acid", &catalog, &[1, 2, 3])],
            Vec::new(),
            ProcessingInfo::default(),
        );

        assert_eq!(report.matches, vec!["Carboxylic acid"]);
        assert!(report.combined_image.is_none());
        assert!(report.individual_images.is_empty());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().all(|w| w.kind == WarningKind::Render));
        assert_eq!(report.warnings[1].group.as_deref(), Some("Carboxylic acid"));
    }

    #[test]
    fn test_images_disabled() {
        let catalog = PatternCatalog::load_embedded().unwrap();
        let mol = parse_smiles("CC(=O)O").unwrap();
        let options = ImageOptions {
            enabled: false,
            ..ImageOptions::default()
        };
        let report = ResultAssembler::new(&catalog, &FailingRenderer, options).assemble(
            &mol,
            vec![resolved("Carboxylic acid", &catalog, &[1, 2, 3])],
            Vec::new(),
            ProcessingInfo::default(),
        );
        assert!(report.combined_image.is_none());
        assert!(report.warnings.is_empty());
    }
}
