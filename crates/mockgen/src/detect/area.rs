use serde::{Deserialize, Serialize};

/// Normalized rectangle inside a rendered template image.
///
/// All fields are fractions of the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PrintArea {
    /// Used when the marker cannot be located in a rendered image.
    pub const FALLBACK: PrintArea = PrintArea {
        x: 0.12,
        y: 0.08,
        width: 0.76,
        height: 0.84,
    };

    /// Returns a copy constrained to the unit square.
    ///
    /// The origin is clamped to `[0, 1]` and the extent is shrunk so that
    /// `x + width <= 1` and `y + height <= 1`.
    pub fn clamped(&self) -> PrintArea {
        let x = self.x.clamp(0.0, 1.0);
        let y = self.y.clamp(0.0, 1.0);
        PrintArea {
            x,
            y,
            width: self.width.clamp(0.0, 1.0 - x),
            height: self.height.clamp(0.0, 1.0 - y),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
