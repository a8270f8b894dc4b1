//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use reel_media::{DEFAULT_AUDIO_TIMEOUT_SECS, DEFAULT_AUDIO_URL};
use reel_models::EncodingConfig;

/// Most photo slides a single video carries.
pub const DEFAULT_MAX_PHOTOS: usize = 10;

/// File name of the cached music bed inside the work directory.
const AUDIO_CACHE_NAME: &str = "Inspiring-Story.mp3";

/// Reel generation configuration.
#[derive(Debug, Clone)]
pub struct ReelConfig {
    /// Scratch space for slide stills and the audio cache
    pub work_dir: PathBuf,
    /// Where videos are written (defaults to the photo folder)
    pub output_dir: Option<PathBuf>,
    /// Maximum accepted photos per video
    pub max_photos: usize,
    /// Photos redacted in parallel
    pub max_parallel_photos: usize,
    /// Preferred outline font
    pub font_path: Option<PathBuf>,
    /// Directory holding the Haar cascade XML files
    pub cascade_dir: Option<PathBuf>,
    /// Background music source (`None` disables audio)
    pub audio_url: Option<String>,
    /// Cached background music location
    pub audio_cache: PathBuf,
    /// Background music download timeout
    pub audio_timeout: Duration,
    /// Kill FFmpeg after this many seconds (`None` waits indefinitely)
    pub encode_timeout_secs: Option<u64>,
    /// Output encoding settings
    pub encoding: EncodingConfig,
}

impl Default for ReelConfig {
    fn default() -> Self {
        let work_dir = PathBuf::from("/tmp/reel");
        Self {
            audio_cache: work_dir.join("audio").join(AUDIO_CACHE_NAME),
            work_dir,
            output_dir: None,
            max_photos: DEFAULT_MAX_PHOTOS,
            max_parallel_photos: 4,
            font_path: None,
            cascade_dir: None,
            audio_url: Some(DEFAULT_AUDIO_URL.to_string()),
            audio_timeout: Duration::from_secs(DEFAULT_AUDIO_TIMEOUT_SECS),
            encode_timeout_secs: None,
            encoding: EncodingConfig::default(),
        }
    }
}

impl ReelConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let work_dir = std::env::var("REEL_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp/reel"));

        let mut encoding = EncodingConfig::default();
        if let Ok(preset) = std::env::var("REEL_ENCODE_PRESET") {
            encoding = encoding.with_preset(preset);
        }
        if let Some(fps) = std::env::var("REEL_FPS").ok().and_then(|s| s.parse().ok()) {
            encoding = encoding.with_fps(fps);
        }

        Self {
            output_dir: std::env::var("REEL_OUTPUT_DIR").ok().map(PathBuf::from),
            max_photos: std::env::var("REEL_MAX_PHOTOS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_PHOTOS)
                .max(1),
            max_parallel_photos: std::env::var("REEL_MAX_PARALLEL_PHOTOS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4)
                .max(1),
            font_path: std::env::var("REEL_FONT_PATH").ok().map(PathBuf::from),
            cascade_dir: std::env::var("REEL_CASCADE_DIR").ok().map(PathBuf::from),
            // An empty URL turns background music off
            audio_url: match std::env::var("REEL_AUDIO_URL") {
                Ok(url) if url.trim().is_empty() => None,
                Ok(url) => Some(url),
                Err(_) => Some(DEFAULT_AUDIO_URL.to_string()),
            },
            audio_cache: std::env::var("REEL_AUDIO_CACHE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| work_dir.join("audio").join(AUDIO_CACHE_NAME)),
            audio_timeout: Duration::from_secs(
                std::env::var("REEL_AUDIO_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_AUDIO_TIMEOUT_SECS),
            ),
            encode_timeout_secs: std::env::var("REEL_ENCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0),
            encoding,
            work_dir,
        }
    }

    /// Use `dir` for scratch files and the audio cache.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self.audio_cache = self.work_dir.join("audio").join(AUDIO_CACHE_NAME);
        self
    }

    /// Write videos to `dir` instead of the photo folder.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Disable background music.
    pub fn without_audio(mut self) -> Self {
        self.audio_url = None;
        self
    }

    /// Scratch directory for slide stills.
    pub fn frames_dir(&self) -> PathBuf {
        self.work_dir.join("frames")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReelConfig::default();
        assert_eq!(config.max_photos, 10);
        assert_eq!(config.max_parallel_photos, 4);
        assert_eq!(config.audio_url.as_deref(), Some(DEFAULT_AUDIO_URL));
        assert_eq!(config.encoding.preset, "ultrafast");
        assert_eq!(config.encoding.fps, 24);
        assert!(config.output_dir.is_none());
        assert!(config.encode_timeout_secs.is_none());
    }

    #[test]
    fn test_with_work_dir_moves_audio_cache() {
        let config = ReelConfig::default().with_work_dir("/srv/reel");
        assert_eq!(config.audio_cache, PathBuf::from("/srv/reel/audio/Inspiring-Story.mp3"));
        assert_eq!(config.frames_dir(), PathBuf::from("/srv/reel/frames"));
    }

    #[test]
    fn test_without_audio() {
        assert!(ReelConfig::default().without_audio().audio_url.is_none());
    }
}
