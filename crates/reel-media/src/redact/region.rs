//! Rectangles produced by face detection.

use serde::{Deserialize, Serialize};

/// Fraction of a face's own width/height added on each side before redaction,
/// so hair and chin are covered as well.
pub const DEFAULT_PADDING: f64 = 0.1;

/// A face rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionRegion {
    /// Left edge x-coordinate
    pub x: u32,
    /// Top edge y-coordinate
    pub y: u32,
    /// Region width
    pub width: u32,
    /// Region height
    pub height: u32,
}

impl RedactionRegion {
    /// Create a new region.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn x2(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn y2(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Region area in pixels.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Expand by `fraction` of the region's own size on every side and clamp
    /// to a `frame_width` × `frame_height` image.
    ///
    /// Returns `None` when nothing of the region remains inside the image.
    pub fn padded(&self, fraction: f64, frame_width: u32, frame_height: u32) -> Option<Self> {
        let pad_w = (self.width as f64 * fraction) as u32;
        let pad_h = (self.height as f64 * fraction) as u32;

        let x1 = self.x.saturating_sub(pad_w);
        let y1 = self.y.saturating_sub(pad_h);
        let x2 = self.x2().saturating_add(pad_w).min(frame_width);
        let y2 = self.y2().saturating_add(pad_h).min(frame_height);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(Self::new(x1, y1, x2 - x1, y2 - y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_expands_by_ten_percent() {
        let region = RedactionRegion::new(100, 100, 50, 80);
        let padded = region.padded(DEFAULT_PADDING, 1000, 1000).unwrap();
        assert_eq!(padded, RedactionRegion::new(95, 92, 60, 96));
    }

    #[test]
    fn test_padding_clamps_to_image() {
        let region = RedactionRegion::new(2, 0, 50, 50);
        let padded = region.padded(DEFAULT_PADDING, 54, 52).unwrap();
        assert_eq!(padded.x, 0);
        assert_eq!(padded.y, 0);
        assert_eq!(padded.x2(), 54);
        assert_eq!(padded.y2(), 52);
    }

    #[test]
    fn test_region_outside_image() {
        let region = RedactionRegion::new(500, 500, 10, 10);
        assert!(region.padded(DEFAULT_PADDING, 100, 100).is_none());
    }

    #[test]
    fn test_area_and_edges() {
        let region = RedactionRegion::new(10, 10, 5, 5);
        assert_eq!(region.x2(), 15);
        assert_eq!(region.y2(), 15);
        assert_eq!(region.area(), 25);
    }
}
