#![deny(unreachable_patterns)]
//! Media processing for event reels.
//!
//! This crate provides:
//! - Face redaction with frontal + profile Haar cascades (blur or exclude)
//! - Slide composition (title, photo with zoom and quote, call-to-action)
//! - Timeline assembly with a cached, duration-matched audio bed
//! - FFmpeg encoding with progress parsed from `-progress pipe:2`

pub mod audio;
pub mod command;
pub mod encoder;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod redact;
pub mod slide;
pub mod text;
pub mod timeline;

pub use audio::{BackgroundAudio, DEFAULT_AUDIO_TIMEOUT_SECS, DEFAULT_AUDIO_URL};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use encoder::{output_file_name, FfmpegEncoder, TimelineRenderer, OUTPUT_SUFFIX};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_media, MediaInfo};
pub use progress::{FfmpegProgress, RenderProgress};
pub use redact::{
    DetectorSet, FaceDetector, ImageRedactor, RedactedImage, RedactionOutcome, RedactionRegion,
};
pub use slide::{Fade, QuoteOverlay, Slide, SlideComposer, SlideKind, Zoom};
pub use text::TextRenderer;
pub use timeline::{AudioTrack, Timeline, TimelineAssembler};
