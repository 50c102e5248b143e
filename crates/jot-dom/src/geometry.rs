//! Geometry
//!
//! Layout boxes as reported by the embedder.

/// Layout rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// A box with no area in both dimensions occupies no layout space
    pub fn is_zero_size(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}
