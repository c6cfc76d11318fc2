//! Highlighted structure images.
//!
//! [`HighlightRenderer`] draws a molecule with colored atom groups. The default
//! implementation, [`SvgRenderer`], lays the molecule out in 2D (or reuses the
//! coordinates from a MOL file) and writes SVG.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::core::molecule::Molecule;

pub mod layout;
pub mod svg;

pub use svg::SvgRenderer;

/// Media type of the images [`SvgRenderer`] produces
pub const SVG_MEDIA_TYPE: &str = "image/svg+xml";

/// Largest molecule the renderer will lay out
pub const MAX_RENDER_ATOMS: usize = 500;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Rendering exceeded {}ms", .limit.as_millis())]
    Timeout { limit: Duration },

    #[error("Molecule has {atoms} atoms; at most {max} can be drawn")]
    TooLarge { atoms: usize, max: usize },

    #[error("Canvas {width}x{height} has no drawable area")]
    EmptyCanvas { width: u32, height: u32 },
}

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// RGB color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`
    #[must_use]
    pub fn to_hex(self) -> String {
        let channel = |v: f64| {
            // Clamped to 0..=255 before the cast
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let byte = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            byte
        };
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

/// A set of atoms to draw in one color; bonds inside the set are colored too
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub atoms: Vec<usize>,
    pub color: Rgb,
}

/// Draws molecules with highlighted atom groups
pub trait HighlightRenderer: Send + Sync {
    /// Media type of the returned bytes
    fn media_type(&self) -> &'static str;

    /// Draw `molecule` on a `size` canvas.
    ///
    /// When highlights overlap, the first one listed colors the shared atoms.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if the image cannot be produced.
    fn render(
        &self,
        molecule: &Molecule,
        highlights: &[Highlight],
        size: ImageSize,
    ) -> Result<Vec<u8>, RenderError>;
}
