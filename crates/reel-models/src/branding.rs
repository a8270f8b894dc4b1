//! Branding: palette, slide copy, and the quote rotation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `[r, g, b]` channel array.
    pub fn channels(&self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

/// Brand blue, title slide background (#00AEEF).
pub const BRAND_BLUE: Rgb = Rgb(0, 174, 239);
/// Brand green, call-to-action background (#A8E6CF).
pub const BRAND_GREEN: Rgb = Rgb(168, 230, 207);
/// Slate, photo slide background.
pub const BRAND_DARK_BLUE: Rgb = Rgb(30, 41, 59);

/// Quotes overlaid on every other photo, in order.
pub const DEFAULT_QUOTES: &[&str] = &[
    "Every mind blooms uniquely.",
    "Inclusion starts with understanding.",
    "Early steps, endless possibilities.",
    "Compassion builds communities.",
    "Celebrate neurodiversity.",
];

/// Slide copy, colors, and quotes for a generated video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Branding {
    /// Subtitle under the event name on the title slide
    pub title_subtitle: String,
    /// Closing message on the call-to-action slide
    pub cta_text: String,
    /// Subtitle under the closing message
    pub cta_subtitle: String,
    /// Title slide background
    pub title_background: Rgb,
    /// Photo slide background
    pub photo_background: Rgb,
    /// Call-to-action slide background
    pub cta_background: Rgb,
    /// Quote rotation
    pub quotes: Vec<String>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            title_subtitle: "Aaria's Blue Elephant".to_string(),
            cta_text: "Join Aaria's Blue Elephant".to_string(),
            cta_subtitle: "Foster Inclusion Today!".to_string(),
            title_background: BRAND_BLUE,
            photo_background: BRAND_DARK_BLUE,
            cta_background: BRAND_GREEN,
            quotes: DEFAULT_QUOTES.iter().map(|q| q.to_string()).collect(),
        }
    }
}

impl Branding {
    /// Quote for the `accepted_index`-th accepted photo.
    ///
    /// Even indices carry a quote; the rotation advances every second photo
    /// and sticks at the last quote once exhausted.
    pub fn quote_for(&self, accepted_index: usize) -> Option<&str> {
        if accepted_index % 2 != 0 || self.quotes.is_empty() {
            return None;
        }
        let slot = (accepted_index / 2).min(self.quotes.len() - 1);
        self.quotes.get(slot).map(String::as_str)
    }
}
