//! Slides: the timed visual units of a reel.
//!
//! Every slide is fully composed up front into a 1920×1080 RGB canvas.
//! Motion and fades are described declaratively ([`Zoom`], [`Fade`],
//! [`QuoteOverlay`]) and realized by the encoder's filter graph, so the
//! composer never renders individual frames.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use reel_models::encoding::{CANVAS_HEIGHT, CANVAS_WIDTH};
use reel_models::{Branding, Rgb as BrandColor};
use std::path::PathBuf;
use std::sync::Arc;

use crate::redact::RedactedImage;
use crate::text::{TextMask, TextRenderer};

/// Title slide length in seconds.
pub const TITLE_DURATION: f64 = 3.0;
/// Photo slide length in seconds.
pub const PHOTO_DURATION: f64 = 5.0;
/// Call-to-action slide length in seconds.
pub const CTA_DURATION: f64 = 4.0;
/// Fade-in and fade-out length for every slide and overlay.
pub const FADE_SECS: f64 = 1.0;
/// Zoom factor reached at the end of a photo slide.
pub const MAX_ZOOM: f64 = 1.15;

/// Event name size on the title slide.
pub const TITLE_FONT_PX: f32 = 100.0;
/// Closing message size on the call-to-action slide.
pub const CTA_FONT_PX: f32 = 80.0;
/// Quote size on photo overlays.
pub const QUOTE_FONT_PX: f32 = 50.0;

/// Top edge of the quote overlay.
pub const QUOTE_Y: u32 = 850;
/// How long a quote stays on screen.
pub const QUOTE_DURATION: f64 = 2.5;

const SUBTITLE_GAP: i64 = 20;
const SUBTITLE_OPACITY: u8 = 200;
const TEXT_COLOR: [u8; 3] = [255, 255, 255];

const QUOTE_PADDING_X: u32 = 40;
const QUOTE_PADDING_Y: u32 = 20;
const QUOTE_BACKDROP: Rgba<u8> = Rgba([0, 0, 0, 150]);

/// Fade timing in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub fade_in: f64,
    pub fade_out: f64,
}

impl Fade {
    /// Same length in and out.
    pub const fn symmetric(secs: f64) -> Self {
        Self {
            fade_in: secs,
            fade_out: secs,
        }
    }
}

/// Linear zoom over the slide's duration, centered on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    pub from: f64,
    pub to: f64,
}

impl Zoom {
    /// Zoom factor at `t` seconds into a slide of `duration` seconds.
    pub fn factor_at(&self, t: f64, duration: f64) -> f64 {
        if duration <= 0.0 {
            return self.to;
        }
        let progress = (t / duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * progress
    }
}

/// Quote banner drawn over the lower part of a photo slide.
#[derive(Debug, Clone)]
pub struct QuoteOverlay {
    pub text: String,
    /// Banner pixels, horizontally centered when composited
    pub image: RgbaImage,
    /// Top edge on the canvas
    pub y: u32,
    pub duration: f64,
    pub fade: Fade,
}

/// What a slide shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideKind {
    Title { text: String, subtext: String },
    Photo { source: PathBuf, quote: Option<String> },
    CallToAction { text: String, subtext: String },
}

impl SlideKind {
    /// Short label for logs and filter graph comments.
    pub fn label(&self) -> &'static str {
        match self {
            SlideKind::Title { .. } => "title",
            SlideKind::Photo { .. } => "photo",
            SlideKind::CallToAction { .. } => "call_to_action",
        }
    }
}

/// A composed, immutable slide.
#[derive(Debug, Clone)]
pub struct Slide {
    kind: SlideKind,
    canvas: RgbImage,
    duration: f64,
    fade: Fade,
    zoom: Option<Zoom>,
    overlay: Option<QuoteOverlay>,
}

impl Slide {
    pub fn kind(&self) -> &SlideKind {
        &self.kind
    }

    /// The composed 1920×1080 frame.
    pub fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn fade(&self) -> Fade {
        self.fade
    }

    pub fn zoom(&self) -> Option<Zoom> {
        self.zoom
    }

    pub fn overlay(&self) -> Option<&QuoteOverlay> {
        self.overlay.as_ref()
    }

    pub fn is_photo(&self) -> bool {
        matches!(self.kind, SlideKind::Photo { .. })
    }
}

/// Builds title, photo and call-to-action slides.
#[derive(Debug, Clone)]
pub struct SlideComposer {
    text: Arc<TextRenderer>,
    branding: Branding,
}

impl SlideComposer {
    pub fn new(text: Arc<TextRenderer>, branding: Branding) -> Self {
        Self { text, branding }
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    /// Event name over the brand subtitle.
    pub fn title_slide(&self, event_name: &str) -> Slide {
        let subtext = self.branding.title_subtitle.clone();
        let canvas = self.text_card(event_name, &subtext, TITLE_FONT_PX, self.branding.title_background);
        Slide {
            kind: SlideKind::Title {
                text: event_name.to_string(),
                subtext,
            },
            canvas,
            duration: TITLE_DURATION,
            fade: Fade::symmetric(FADE_SECS),
            zoom: None,
            overlay: None,
        }
    }

    /// Redacted photo fitted onto the canvas with a slow zoom and an
    /// optional quote.
    pub fn photo_slide(&self, image: &RedactedImage, quote: Option<&str>) -> Slide {
        let canvas = fit_onto_canvas(&image.pixels, self.branding.photo_background);
        let overlay = quote.map(|q| self.quote_overlay(q));

        Slide {
            kind: SlideKind::Photo {
                source: image.source.clone(),
                quote: quote.map(str::to_string),
            },
            canvas,
            duration: PHOTO_DURATION,
            fade: Fade::symmetric(FADE_SECS),
            zoom: Some(Zoom {
                from: 1.0,
                to: MAX_ZOOM,
            }),
            overlay,
        }
    }

    /// Closing message over its subtitle.
    pub fn call_to_action_slide(&self) -> Slide {
        let text = self.branding.cta_text.clone();
        let subtext = self.branding.cta_subtitle.clone();
        let canvas = self.text_card(&text, &subtext, CTA_FONT_PX, self.branding.cta_background);
        Slide {
            kind: SlideKind::CallToAction { text, subtext },
            canvas,
            duration: CTA_DURATION,
            fade: Fade::symmetric(FADE_SECS),
            zoom: None,
            overlay: None,
        }
    }

    /// Solid background with a centered main line and a half-size subtitle
    /// 20 px below it.
    fn text_card(&self, text: &str, subtext: &str, px: f32, background: BrandColor) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgb(background.channels()));

        let main = self.text.render_line(text, px);
        let (x, y) = centered(&main);
        main.draw_rgb(&mut canvas, x, y, TEXT_COLOR, 255);

        if !subtext.is_empty() {
            let sub = self.text.render_line(subtext, px / 2.0);
            let (sx, sy) = centered(&sub);
            sub.draw_rgb(
                &mut canvas,
                sx,
                sy + main.height() as i64 + SUBTITLE_GAP,
                TEXT_COLOR,
                SUBTITLE_OPACITY,
            );
        }

        canvas
    }

    fn quote_overlay(&self, quote: &str) -> QuoteOverlay {
        let mask = self.text.render_line(quote, QUOTE_FONT_PX);
        let width = (mask.width() + 2 * QUOTE_PADDING_X).min(CANVAS_WIDTH);
        let height = mask.height() + 2 * QUOTE_PADDING_Y;

        let mut banner = RgbaImage::from_pixel(width, height, QUOTE_BACKDROP);
        let x = (width as i64 - mask.width() as i64) / 2;
        mask.draw_rgba(&mut banner, x, QUOTE_PADDING_Y as i64, TEXT_COLOR, 255);

        QuoteOverlay {
            text: quote.to_string(),
            image: banner,
            y: QUOTE_Y.min(CANVAS_HEIGHT.saturating_sub(height)),
            duration: QUOTE_DURATION,
            fade: Fade::symmetric(FADE_SECS),
        }
    }
}

/// Top-left corner that centers `mask` on the canvas.
fn centered(mask: &TextMask) -> (i64, i64) {
    (
        (CANVAS_WIDTH as i64 - mask.width() as i64) / 2,
        (CANVAS_HEIGHT as i64 - mask.height() as i64) / 2,
    )
}

/// Target size for a `width`×`height` photo: scale to canvas height, and if
/// that is still too wide, scale to canvas width instead.
pub fn fitted_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let by_height_w = (width as f64 * CANVAS_HEIGHT as f64 / height as f64).round() as u32;
    if by_height_w <= CANVAS_WIDTH {
        return (by_height_w.max(1), CANVAS_HEIGHT);
    }

    let by_width_h = (height as f64 * CANVAS_WIDTH as f64 / width as f64).round() as u32;
    (CANVAS_WIDTH, by_width_h.max(1))
}

/// Scale `photo` to fit and center it on a background-colored canvas.
pub fn fit_onto_canvas(photo: &RgbImage, background: BrandColor) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgb(background.channels()));
    let (w, h) = fitted_size(photo.width(), photo.height());
    if w == 0 || h == 0 {
        return canvas;
    }

    let scaled = if (w, h) == photo.dimensions() {
        photo.clone()
    } else {
        imageops::resize(photo, w, h, FilterType::CatmullRom)
    };

    let x = (CANVAS_WIDTH - w) / 2;
    let y = (CANVAS_HEIGHT - h) / 2;
    imageops::replace(&mut canvas, &scaled, x as i64, y as i64);
    canvas
}
