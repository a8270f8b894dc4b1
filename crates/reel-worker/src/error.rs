//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failures that end a running job.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Generation cancelled")]
    Cancelled,

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),
}

impl WorkerError {
    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    /// Message shown in the job status.
    ///
    /// Media failures carry FFmpeg's own diagnostics.
    pub fn status_message(&self) -> String {
        match self {
            WorkerError::Media(e) => e.detailed_message(),
            other => other.to_string(),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Cancelled => "cancelled",
            WorkerError::ProcessingFailed(_) => "processing",
            WorkerError::Media(_) => "media",
        }
    }
}

/// Reasons a submission is rejected before any job exists.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Photo folder not found: {0}")]
    FolderNotFound(PathBuf),

    #[error("No photos found in directory: {0}")]
    NoPhotos(PathBuf),

    #[error("Event name must not be empty")]
    EmptyEventName,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
