//! Job status snapshots for progress polling.
//!
//! A [`JobStatus`] is an immutable snapshot: every transition builds a new
//! value from the previous one, and the registry swaps the whole record in a
//! single write. Readers therefore never observe a half-applied update.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::JobId;

/// Generation job state.
///
/// `Idle → Starting → Processing → {Done, Error}`. Terminal states are only
/// left by a brand-new submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// No job has been submitted
    #[default]
    Idle,
    /// Submission accepted, no photo touched yet
    Starting,
    /// Pipeline is running
    Processing,
    /// Video written successfully
    Done,
    /// Pipeline failed
    Error,
}

impl JobState {
    /// Get string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Starting => "starting",
            JobState::Processing => "processing",
            JobState::Done => "done",
            JobState::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Photo counters shown alongside the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PhotoCounts {
    /// Candidate photos examined so far
    pub current: u32,
    /// Candidate photos available for this job
    pub total: u32,
}

/// Snapshot of a generation job's externally visible status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobStatus {
    /// Job this snapshot belongs to (absent while idle)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    /// Current state
    pub state: JobState,
    /// Human-readable description of the current step
    pub message: String,
    /// Progress percentage (0-100), non-decreasing within a run
    pub progress: u8,
    /// Rendered video path, present only when `state == Done`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Photo counters
    pub photos: PhotoCounts,
    /// When the status was last updated
    pub updated_at: DateTime<Utc>,
    /// Sequence number for event ordering (monotonically increasing)
    pub event_seq: u64,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::idle()
    }
}

impl JobStatus {
    /// Status reported before any job ever ran.
    pub fn idle() -> Self {
        Self {
            job_id: None,
            state: JobState::Idle,
            message: String::new(),
            progress: 0,
            output_path: None,
            photos: PhotoCounts::default(),
            updated_at: Utc::now(),
            event_seq: 0,
        }
    }

    /// Status written the instant a submission is accepted.
    pub fn starting(job_id: JobId, total_photos: u32) -> Self {
        Self {
            job_id: Some(job_id),
            state: JobState::Starting,
            message: "Initializing...".to_string(),
            progress: 0,
            output_path: None,
            photos: PhotoCounts {
                current: 0,
                total: total_photos,
            },
            updated_at: Utc::now(),
            event_seq: 0,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Next snapshot for a progress update.
    ///
    /// Moves the job into `Processing`. Progress never goes backwards and
    /// terminal snapshots are returned unchanged.
    pub fn advanced(&self, progress: u8, message: impl Into<String>, photos: Option<PhotoCounts>) -> Self {
        if self.is_terminal() {
            return self.clone();
        }
        Self {
            job_id: self.job_id.clone(),
            state: JobState::Processing,
            message: message.into(),
            progress: self.progress.max(progress.min(100)),
            output_path: None,
            photos: photos.unwrap_or(self.photos),
            updated_at: Utc::now(),
            event_seq: self.event_seq + 1,
        }
    }

    /// Next snapshot once the video has been written.
    pub fn completed(&self, output_path: impl Into<PathBuf>) -> Self {
        if self.is_terminal() {
            return self.clone();
        }
        Self {
            job_id: self.job_id.clone(),
            state: JobState::Done,
            message: "Video generation complete!".to_string(),
            progress: 100,
            output_path: Some(output_path.into()),
            photos: self.photos,
            updated_at: Utc::now(),
            event_seq: self.event_seq + 1,
        }
    }

    /// Next snapshot after an unrecoverable failure.
    ///
    /// Progress is kept where it stopped so polls stay monotonic.
    pub fn failed(&self, error: impl AsRef<str>) -> Self {
        if self.is_terminal() {
            return self.clone();
        }
        Self {
            job_id: self.job_id.clone(),
            state: JobState::Error,
            message: format!("Generation failed: {}", error.as_ref()),
            progress: self.progress,
            output_path: None,
            photos: self.photos,
            updated_at: Utc::now(),
            event_seq: self.event_seq + 1,
        }
    }
}
