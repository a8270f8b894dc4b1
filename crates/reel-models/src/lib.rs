//! Shared data models for the event reel generator.
//!
//! This crate provides Serde-serializable types for:
//! - Generation jobs and their identifiers
//! - Job status snapshots and the job state machine
//! - Privacy modes for face redaction
//! - Encoding configuration
//! - Branding (colors, slide copy, quotes)

pub mod branding;
pub mod encoding;
pub mod job;
pub mod job_status;
pub mod privacy;

// Re-export common types
pub use branding::{Branding, Rgb};
pub use encoding::EncodingConfig;
pub use job::{GenerationRequest, JobId};
pub use job_status::{JobState, JobStatus, PhotoCounts};
pub use privacy::{ParsePrivacyModeError, PrivacyMode};
