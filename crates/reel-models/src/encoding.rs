//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset, tuned for same-session previews
pub const DEFAULT_PRESET: &str = "ultrafast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Default output frame rate
pub const DEFAULT_FPS: u32 = 24;
/// Pixel format accepted by every mainstream player
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// Output canvas width
pub const CANVAS_WIDTH: u32 = 1920;
/// Output canvas height
pub const CANVAS_HEIGHT: u32 = 1080;

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "ultrafast", "fast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Output pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            fps: DEFAULT_FPS,
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    /// Create a new encoding configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with an updated preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Returns a new config with an updated frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Video-only FFmpeg output arguments.
    pub fn video_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-r".to_string(),
            self.fps.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
        ];
        args.extend(self.extra_args.clone());
        args
    }

    /// Audio FFmpeg output arguments.
    pub fn audio_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}
