//! Job and photo metrics.
//!
//! Recorded through the `metrics` facade; whichever recorder the host
//! process installs receives them (none by default).

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Job metrics
    pub const JOBS_STARTED_TOTAL: &str = "reel_jobs_started_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "reel_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "reel_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "reel_job_duration_seconds";

    // Photo metrics
    pub const PHOTOS_TOTAL: &str = "reel_photos_total";
    pub const FACES_REDACTED_TOTAL: &str = "reel_faces_redacted_total";
    pub const PHOTO_SLIDES_PER_VIDEO: &str = "reel_photo_slides_per_video";

    // Encoding metrics
    pub const ENCODE_DURATION_SECONDS: &str = "reel_encode_duration_seconds";
}

/// Record an accepted submission.
pub fn record_job_started() {
    counter!(names::JOBS_STARTED_TOTAL).increment(1);
}

/// Record a job that produced a video.
pub fn record_job_completed(duration_secs: f64, photo_slides: usize) {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS).record(duration_secs);
    histogram!(names::PHOTO_SLIDES_PER_VIDEO).record(photo_slides as f64);
}

/// Record a job that ended in error.
pub fn record_job_failed(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record one redaction outcome (`accepted`, `excluded`, `unreadable`).
pub fn record_photo(outcome: &'static str) {
    counter!(names::PHOTOS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record blurred face regions.
pub fn record_faces_redacted(count: usize) {
    if count > 0 {
        counter!(names::FACES_REDACTED_TOTAL).increment(count as u64);
    }
}

/// Record the encode stage duration.
pub fn record_encode_duration(duration_secs: f64) {
    histogram!(names::ENCODE_DURATION_SECONDS).record(duration_secs);
}
