//! Slide text rendering.
//!
//! Lines are rasterized into a coverage mask cropped to the ink's bounding
//! box, so centering uses what was actually drawn rather than advance
//! widths. Typeface resolution never fails: a configured font file is tried
//! first, then common system fonts, and finally the built-in 8×8 bitmap
//! face.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use image::{RgbImage, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// System fonts tried when no font is configured, in preference order.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Name reported for the built-in bitmap face.
pub const BITMAP_FACE: &str = "builtin-8x8";

/// Glyph cell size of the bitmap face.
const BITMAP_CELL: u32 = 8;

/// Rasterized line of text: one coverage byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMask {
    width: u32,
    height: u32,
    coverage: Vec<u8>,
}

impl TextMask {
    fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            coverage: vec![0; width as usize * height as usize],
        }
    }

    /// Width of the ink bounding box.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the ink bounding box.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether nothing was drawn.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Coverage at `(x, y)`.
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        self.coverage[(y * self.width + x) as usize]
    }

    fn accumulate(&mut self, x: i64, y: i64, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as u32 * self.width + x as u32) as usize;
        self.coverage[idx] = self.coverage[idx].max(value);
    }

    /// Crop to the smallest rectangle containing non-zero coverage.
    fn trimmed(self) -> Self {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.coverage(x, y) > 0 {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if min_x == u32::MAX {
            return Self::blank(0, 0);
        }

        let mut out = Self::blank(max_x - min_x + 1, max_y - min_y + 1);
        for y in 0..out.height {
            for x in 0..out.width {
                out.coverage[(y * out.width + x) as usize] = self.coverage(min_x + x, min_y + y);
            }
        }
        out
    }

    /// Blend onto an RGB canvas with its top-left corner at `(x, y)`.
    ///
    /// `opacity` scales the coverage; pixels off the canvas are clipped.
    pub fn draw_rgb(&self, canvas: &mut RgbImage, x: i64, y: i64, color: [u8; 3], opacity: u8) {
        self.for_each_visible(canvas.width(), canvas.height(), x, y, opacity, |cx, cy, alpha| {
            let pixel = canvas.get_pixel_mut(cx, cy);
            for c in 0..3 {
                pixel.0[c] = blend(pixel.0[c], color[c], alpha);
            }
        });
    }

    /// Composite over an RGBA canvas ("over" operator).
    pub fn draw_rgba(&self, canvas: &mut RgbaImage, x: i64, y: i64, color: [u8; 3], opacity: u8) {
        self.for_each_visible(canvas.width(), canvas.height(), x, y, opacity, |cx, cy, alpha| {
            let pixel = canvas.get_pixel_mut(cx, cy);
            for c in 0..3 {
                pixel.0[c] = blend(pixel.0[c], color[c], alpha);
            }
            pixel.0[3] = blend(pixel.0[3], 255, alpha);
        });
    }

    fn for_each_visible<F>(&self, canvas_w: u32, canvas_h: u32, x: i64, y: i64, opacity: u8, mut f: F)
    where
        F: FnMut(u32, u32, u8),
    {
        for my in 0..self.height {
            let cy = y + my as i64;
            if cy < 0 || cy >= canvas_h as i64 {
                continue;
            }
            for mx in 0..self.width {
                let cx = x + mx as i64;
                if cx < 0 || cx >= canvas_w as i64 {
                    continue;
                }
                let coverage = self.coverage(mx, my);
                if coverage == 0 {
                    continue;
                }
                let alpha = ((coverage as u16 * opacity as u16) / 255) as u8;
                f(cx as u32, cy as u32, alpha);
            }
        }
    }
}

#[inline]
fn blend(under: u8, over: u8, alpha: u8) -> u8 {
    let a = alpha as u16;
    ((under as u16 * (255 - a) + over as u16 * a) / 255) as u8
}

enum Typeface {
    Outline { font: Box<Font>, name: String },
    Bitmap,
}

/// Renders single lines of slide text.
pub struct TextRenderer {
    face: Typeface,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer").field("face", &self.typeface_name()).finish()
    }
}

impl TextRenderer {
    /// Resolve a typeface, falling back instead of failing.
    pub fn load(preferred: Option<&Path>) -> Self {
        if let Some(path) = preferred {
            match Self::from_file(path) {
                Ok(renderer) => return renderer,
                Err(e) => warn!(path = %path.display(), "Configured font unusable, falling back: {}", e),
            }
        }

        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(renderer) => return renderer,
                Err(e) => debug!(path = %path.display(), "Skipping system font: {}", e),
            }
        }

        info!("No outline font available, using built-in bitmap face");
        Self::bitmap()
    }

    /// Load an outline font file (TTF/OTF).
    pub fn from_file(path: &Path) -> MediaResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| MediaError::TypefaceUnavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(bytes, path.display().to_string())
    }

    /// Parse an outline font from memory.
    pub fn from_bytes(bytes: Vec<u8>, name: impl Into<String>) -> MediaResult<Self> {
        let name = name.into();
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| MediaError::TypefaceUnavailable(format!("{}: {}", name, e)))?;
        Ok(Self {
            face: Typeface::Outline {
                font: Box::new(font),
                name,
            },
        })
    }

    /// The built-in bitmap face.
    pub fn bitmap() -> Self {
        Self { face: Typeface::Bitmap }
    }

    /// Font file path, or [`BITMAP_FACE`].
    pub fn typeface_name(&self) -> &str {
        match &self.face {
            Typeface::Outline { name, .. } => name,
            Typeface::Bitmap => BITMAP_FACE,
        }
    }

    /// Path of the font that [`TextRenderer::load`] would pick, if any.
    pub fn resolve_font_path(preferred: Option<&Path>) -> Option<PathBuf> {
        preferred
            .filter(|p| p.exists())
            .map(Path::to_path_buf)
            .or_else(|| {
                SYSTEM_FONT_CANDIDATES
                    .iter()
                    .map(PathBuf::from)
                    .find(|p| p.exists())
            })
    }

    /// Rasterize one line at `px` pixels.
    pub fn render_line(&self, text: &str, px: f32) -> TextMask {
        if text.trim().is_empty() || px <= 0.0 {
            return TextMask::blank(0, 0);
        }
        match &self.face {
            Typeface::Outline { font, .. } => render_outline(font, text, px),
            Typeface::Bitmap => render_bitmap(text, px),
        }
    }
}

fn render_outline(font: &Font, text: &str, px: f32) -> TextMask {
    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings::default());
    layout.append(&[font], &TextStyle::new(text, px, 0));

    let inked: Vec<_> = layout
        .glyphs()
        .iter()
        .filter(|g| g.width > 0 && g.height > 0)
        .collect();
    if inked.is_empty() {
        return TextMask::blank(0, 0);
    }

    let min_x = inked.iter().map(|g| g.x.round() as i64).min().unwrap_or(0);
    let min_y = inked.iter().map(|g| g.y.round() as i64).min().unwrap_or(0);
    let max_x = inked
        .iter()
        .map(|g| g.x.round() as i64 + g.width as i64)
        .max()
        .unwrap_or(0);
    let max_y = inked
        .iter()
        .map(|g| g.y.round() as i64 + g.height as i64)
        .max()
        .unwrap_or(0);

    let mut mask = TextMask::blank((max_x - min_x) as u32, (max_y - min_y) as u32);
    for glyph in inked {
        let (metrics, bitmap) = font.rasterize_config(glyph.key);
        let gx = glyph.x.round() as i64 - min_x;
        let gy = glyph.y.round() as i64 - min_y;
        for row in 0..metrics.height {
            for col in 0..metrics.width {
                let value = bitmap[row * metrics.width + col];
                if value > 0 {
                    mask.accumulate(gx + col as i64, gy + row as i64, value);
                }
            }
        }
    }

    // Anti-aliased edges can leave empty rows at the glyph box border
    mask.trimmed()
}

fn render_bitmap(text: &str, px: f32) -> TextMask {
    let scale = ((px / BITMAP_CELL as f32).round() as u32).max(1);
    let cell = BITMAP_CELL * scale;
    let chars: Vec<char> = text.chars().collect();

    let mut mask = TextMask::blank(cell * chars.len() as u32, cell);
    for (i, ch) in chars.iter().enumerate() {
        let Some(rows) = BASIC_FONTS.get(*ch).or_else(|| BASIC_FONTS.get('?')) else {
            continue;
        };
        let origin_x = i as u32 * cell;
        for (row, bits) in rows.iter().enumerate() {
            for bit in 0..BITMAP_CELL {
                // Bit 0 is the leftmost pixel
                if bits & (1 << bit) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        mask.accumulate(
                            (origin_x + bit * scale + dx) as i64,
                            (row as u32 * scale + dy) as i64,
                            255,
                        );
                    }
                }
            }
        }
    }

    mask.trimmed()
}
