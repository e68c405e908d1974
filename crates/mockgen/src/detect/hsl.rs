//! RGB to HSL conversion and the marker-color classifier.

/// Hue of the marker color (magenta), in degrees.
pub const MARKER_HUE: f64 = 300.0;
/// Maximum circular hue distance from [`MARKER_HUE`].
pub const HUE_TOLERANCE: f64 = 15.0;
/// Saturation must exceed this.
pub const MIN_SATURATION: f64 = 0.4;
/// Lightness must exceed this. Keeps near-black fringes out.
pub const MIN_LIGHTNESS: f64 = 0.15;

/// A color in HSL space: hue in degrees `[0, 360)`, saturation and
/// lightness in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsl { h: h * 60.0, s, l }
}

/// Circular distance between two hues in degrees.
fn hue_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    diff.min(360.0 - diff)
}

/// Returns true when the color belongs to the marker region.
pub fn is_marker(color: Hsl) -> bool {
    hue_distance(color.h, MARKER_HUE) <= HUE_TOLERANCE
        && color.s > MIN_SATURATION
        && color.l > MIN_LIGHTNESS
}
