//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Typeface unavailable: {0}")]
    TypefaceUnavailable(String),

    #[error("Empty timeline")]
    EmptyTimeline,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Human-readable message including FFmpeg's own diagnostics when present.
    pub fn detailed_message(&self) -> String {
        match self {
            MediaError::FfmpegFailed {
                message,
                stderr: Some(stderr),
                ..
            } if !stderr.trim().is_empty() => format!("{}: {}", message, stderr.trim()),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detailed_message_includes_stderr() {
        let err = MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("Unknown encoder 'libx264'\n".to_string()),
            Some(1),
        );
        assert_eq!(
            err.detailed_message(),
            "FFmpeg exited with non-zero status: Unknown encoder 'libx264'"
        );
    }

    #[test]
    fn test_detailed_message_without_stderr() {
        let err = MediaError::ffmpeg_failed("boom", None, None);
        assert_eq!(err.detailed_message(), "FFmpeg command failed: boom");
    }
}
