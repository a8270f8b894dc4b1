//! Job definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::PrivacyMode;

/// Unique identifier for a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to turn a folder of photos into a promotional video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRequest {
    /// Folder containing the source photos
    pub source_folder: PathBuf,
    /// Event or album name shown on the title slide
    pub event_name: String,
    /// How detected faces are handled
    #[serde(default)]
    pub mode: PrivacyMode,
}

impl GenerationRequest {
    /// Create a new generation request.
    pub fn new(
        source_folder: impl Into<PathBuf>,
        event_name: impl Into<String>,
        mode: PrivacyMode,
    ) -> Self {
        Self {
            source_folder: source_folder.into(),
            event_name: event_name.into(),
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert_eq!(JobId::from_string(a.as_str()), a);
    }

    #[test]
    fn test_request_mode_defaults_to_blur() {
        let json = r#"{"source_folder": "/photos", "event_name": "Spring Picnic"}"#;
        let request: GenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.mode, PrivacyMode::Blur);
        assert_eq!(request.event_name, "Spring Picnic");
    }
}
