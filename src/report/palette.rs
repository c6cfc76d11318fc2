//! Stable group colors.

use crate::render::Rgb;

/// Highlight colors, indexed by the group name's digest
pub const PALETTE: [Rgb; 8] = [
    Rgb::new(1.0, 0.0, 0.0), // red
    Rgb::new(0.0, 0.8, 0.0), // green
    Rgb::new(0.0, 0.4, 1.0), // blue
    Rgb::new(1.0, 0.6, 0.0), // orange
    Rgb::new(0.8, 0.0, 0.8), // magenta
    Rgb::new(0.0, 0.8, 0.8), // cyan
    Rgb::new(0.6, 0.4, 0.0), // brown
    Rgb::new(0.5, 0.0, 0.5), // purple
];

/// Color for a group name.
///
/// The MD5 digest read as a big-endian integer, modulo the palette size. Since
/// the palette has eight entries only the low bits of the last byte matter.
#[must_use]
pub fn color_for(name: &str) -> Rgb {
    let digest = md5::compute(name.as_bytes());
    PALETTE[usize::from(digest.0[15]) % PALETTE.len()]
}
