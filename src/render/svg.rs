use std::time::{Duration, Instant};

use crate::core::molecule::{BondOrder, Molecule};

use super::layout::compute_layout;
use super::{HighlightRenderer, Highlight, ImageSize, RenderError, Rgb, MAX_RENDER_ATOMS, SVG_MEDIA_TYPE};

/// Canvas margin in pixels
const MARGIN: f64 = 24.0;

/// Upper bound on pixels per layout unit, so small molecules are not blown up
const MAX_SCALE: f64 = 48.0;

const HIGHLIGHT_OPACITY: f64 = 0.4;

/// Renders molecules as SVG documents
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    timeout: Option<Duration>,
}

impl SvgRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl HighlightRenderer for SvgRenderer {
    fn media_type(&self) -> &'static str {
        SVG_MEDIA_TYPE
    }

    fn render(
        &self,
        molecule: &Molecule,
        highlights: &[Highlight],
        size: ImageSize,
    ) -> Result<Vec<u8>, RenderError> {
        if size.width == 0 || size.height == 0 {
            return Err(RenderError::EmptyCanvas {
                width: size.width,
                height: size.height,
            });
        }
        if molecule.atom_count() > MAX_RENDER_ATOMS {
            return Err(RenderError::TooLarge {
                atoms: molecule.atom_count(),
                max: MAX_RENDER_ATOMS,
            });
        }

        let deadline = self.timeout.map(|limit| Instant::now() + limit);
        let positions = compute_layout(molecule, deadline).map_err(|_| RenderError::Timeout {
            limit: self.timeout.unwrap_or_default(),
        })?;

        let canvas = Canvas::fit(&positions, size);
        Ok(draw(molecule, highlights, &canvas).into_bytes())
    }
}

/// Maps layout coordinates onto the pixel canvas
struct Canvas {
    size: ImageSize,
    points: Vec<(f64, f64)>,
    scale: f64,
}

impl Canvas {
    fn fit(positions: &[[f64; 2]], size: ImageSize) -> Self {
        let width = f64::from(size.width);
        let height = f64::from(size.height);

        let (min_x, max_x, min_y, max_y) = positions.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(x0, x1, y0, y1), p| (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])),
        );
        let span_x = (max_x - min_x).max(1e-6);
        let span_y = (max_y - min_y).max(1e-6);

        let usable_w = (width - 2.0 * MARGIN).max(1.0);
        let usable_h = (height - 2.0 * MARGIN).max(1.0);
        let scale = (usable_w / span_x).min(usable_h / span_y).min(MAX_SCALE);

        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;
        // Layout y grows upward, SVG y grows downward
        let points = positions
            .iter()
            .map(|p| {
                (
                    width / 2.0 + (p[0] - center_x) * scale,
                    height / 2.0 - (p[1] - center_y) * scale,
                )
            })
            .collect();

        Self { size, points, scale }
    }
}

fn draw(molecule: &Molecule, highlights: &[Highlight], canvas: &Canvas) -> String {
    let (width, height) = (canvas.size.width, canvas.size.height);
    let atom_colors = atom_colors(molecule, highlights);
    let bond_colors = bond_colors(molecule, highlights);
    let font_size = (canvas.scale * 0.4).clamp(9.0, 16.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");

    svg.push_str("<g class=\"highlights\">\n");
    for (index, color) in bond_colors.iter().enumerate() {
        if let Some(color) = color {
            let bond = &molecule.bonds()[index];
            let (x1, y1) = canvas.points[bond.begin];
            let (x2, y2) = canvas.points[bond.end];
            svg.push_str(&format!(
                "<line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" stroke=\"{}\" stroke-opacity=\"{HIGHLIGHT_OPACITY}\" stroke-width=\"{:.1}\" stroke-linecap=\"round\"/>\n",
                color.to_hex(),
                font_size * 0.9
            ));
        }
    }
    for (index, color) in atom_colors.iter().enumerate() {
        if let Some(color) = color {
            let (x, y) = canvas.points[index];
            svg.push_str(&format!(
                "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"{:.1}\" fill=\"{}\" fill-opacity=\"{HIGHLIGHT_OPACITY}\"/>\n",
                font_size * 0.8,
                color.to_hex()
            ));
        }
    }
    svg.push_str("</g>\n");

    svg.push_str("<g class=\"bonds\" stroke=\"#000000\" stroke-width=\"1.5\">\n");
    for bond in molecule.bonds() {
        let from = canvas.points[bond.begin];
        let to = canvas.points[bond.end];
        draw_bond(&mut svg, from, to, bond.order);
    }
    svg.push_str("</g>\n");

    svg.push_str(&format!(
        "<g class=\"atoms\" font-family=\"sans-serif\" font-size=\"{font_size:.1}\" text-anchor=\"middle\" dominant-baseline=\"central\">\n"
    ));
    for index in 0..molecule.atom_count() {
        if let Some(label) = atom_label(molecule, index) {
            let (x, y) = canvas.points[index];
            svg.push_str(&format!(
                "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"{:.1}\" fill=\"#ffffff\" fill-opacity=\"0.85\"/>\n",
                font_size * 0.6
            ));
            svg.push_str(&format!(
                "<text x=\"{x:.1}\" y=\"{y:.1}\" fill=\"{}\">{label}</text>\n",
                element_color(molecule, index)
            ));
        }
    }
    svg.push_str("</g>\n</svg>\n");
    svg
}

fn draw_bond(svg: &mut String, from: (f64, f64), to: (f64, f64), order: BondOrder) {
    let line = |svg: &mut String, offset: f64, dashed: bool| {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = dx.hypot(dy).max(1e-6);
        let (nx, ny) = (-dy / length * offset, dx / length * offset);
        let dash = if dashed { " stroke-dasharray=\"3,2\"" } else { "" };
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\"{dash}/>\n",
            from.0 + nx,
            from.1 + ny,
            to.0 + nx,
            to.1 + ny
        ));
    };

    match order {
        BondOrder::Single => line(svg, 0.0, false),
        BondOrder::Double => {
            line(svg, -2.0, false);
            line(svg, 2.0, false);
        }
        BondOrder::Triple => {
            line(svg, -3.5, false);
            line(svg, 0.0, false);
            line(svg, 3.5, false);
        }
        BondOrder::Aromatic => {
            line(svg, 0.0, false);
            line(svg, 3.5, true);
        }
    }
}

/// Color of the first highlight containing each atom
fn atom_colors(molecule: &Molecule, highlights: &[Highlight]) -> Vec<Option<Rgb>> {
    let mut colors = vec![None; molecule.atom_count()];
    for highlight in highlights {
        for &atom in &highlight.atoms {
            if let Some(slot @ None) = colors.get_mut(atom) {
                *slot = Some(highlight.color);
            }
        }
    }
    colors
}

/// Color of the first highlight containing both ends of each bond
fn bond_colors(molecule: &Molecule, highlights: &[Highlight]) -> Vec<Option<Rgb>> {
    let mut colors = vec![None; molecule.bond_count()];
    for highlight in highlights {
        for (index, bond) in molecule.bonds().iter().enumerate() {
            if colors[index].is_none()
                && highlight.atoms.contains(&bond.begin)
                && highlight.atoms.contains(&bond.end)
            {
                colors[index] = Some(highlight.color);
            }
        }
    }
    colors
}

/// Label for heteroatoms, charged or isotopic atoms, and isolated carbons
fn atom_label(molecule: &Molecule, index: usize) -> Option<String> {
    let atom = molecule.atom(index)?;
    let show = atom.atomic_number != 6
        || atom.formal_charge != 0
        || atom.isotope.is_some()
        || molecule.degree(index) == 0;
    if !show {
        return None;
    }

    let mut label = String::new();
    if let Some(isotope) = atom.isotope {
        label.push_str(&isotope.to_string());
    }
    label.push_str(atom.symbol());
    match atom.implicit_hydrogens {
        0 => {}
        1 => label.push('H'),
        n => label.push_str(&format!("H{n}")),
    }
    match atom.formal_charge {
        0 => {}
        1 => label.push('+'),
        -1 => label.push('\u{2212}'),
        c if c > 0 => label.push_str(&format!("{c}+")),
        c => label.push_str(&format!("{}\u{2212}", c.unsigned_abs())),
    }
    Some(label)
}

fn element_color(molecule: &Molecule, index: usize) -> &'static str {
    match molecule.atom(index).map(|a| a.atomic_number) {
        Some(7) => "#3050f8",
        Some(8) => "#e00d0d",
        Some(9 | 17) => "#1fa01f",
        Some(16) => "#b8a000",
        Some(35) => "#a62929",
        Some(15) => "#ff8000",
        _ => "#000000",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::smiles::parse_smiles;

    fn render(smiles: &str, highlights: &[Highlight]) -> String {
        let mol = parse_smiles(smiles).unwrap();
        let bytes = SvgRenderer::new()
            .render(&mol, highlights, ImageSize::new(300, 300))
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_plain_image() {
        let svg = render("CC(=O)O", &[]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"300\""));
        assert!(svg.contains(">OH</text>"));
        assert!(!svg.contains("fill-opacity=\"0.4\""));
    }

    #[test]
    fn test_highlight_colors() {
        let red = Rgb::new(1.0, 0.0, 0.0);
        let blue = Rgb::new(0.0, 0.4, 1.0);
        let svg = render(
            "CC(=O)O",
            &[
                Highlight { atoms: vec![1, 2, 3], color: red },
                Highlight { atoms: vec![3], color: blue },
            ],
        );
        assert_eq!(svg.matches("fill=\"#ff0000\"").count(), 3);
        // Atom 3 keeps the first color
        assert!(!svg.contains("fill=\"#0066ff\""));
        assert_eq!(svg.matches("stroke=\"#ff0000\"").count(), 2);
    }

    #[test]
    fn test_charge_label() {
        let svg = render("C[N+](C)(C)C", &[]);
        assert!(svg.contains(">N+</text>"));
    }

    #[test]
    fn test_errors() {
        let mol = parse_smiles("CCO").unwrap();
        let renderer = SvgRenderer::new();
        assert_eq!(
            renderer.render(&mol, &[], ImageSize::new(0, 100)),
            Err(RenderError::EmptyCanvas { width: 0, height: 100 })
        );

        let big = parse_smiles(&"C".repeat(MAX_RENDER_ATOMS + 1)).unwrap();
        assert!(matches!(
            renderer.render(&big, &[], ImageSize::new(100, 100)),
            Err(RenderError::TooLarge { .. })
        ));

        let ring = parse_smiles("c1ccccc1").unwrap();
        let hurried = SvgRenderer::new().with_timeout(Duration::ZERO);
        assert!(matches!(
            hurried.render(&ring, &[], ImageSize::new(100, 100)),
            Err(RenderError::Timeout { .. })
        ));
    }
}
