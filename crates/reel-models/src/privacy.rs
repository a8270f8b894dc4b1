//! Privacy modes for photos that contain faces.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What to do with a photo once a face has been detected in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyMode {
    /// Blur every detected face region
    #[default]
    Blur,
    /// Leave any photo with a detected face out of the video
    SelectNoFaces,
}

impl PrivacyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyMode::Blur => "blur",
            PrivacyMode::SelectNoFaces => "select_no_faces",
        }
    }
}

impl fmt::Display for PrivacyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown privacy mode '{0}' (expected 'blur' or 'select_no_faces')")]
pub struct ParsePrivacyModeError(pub String);

impl FromStr for PrivacyMode {
    type Err = ParsePrivacyModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blur" => Ok(PrivacyMode::Blur),
            "select_no_faces" => Ok(PrivacyMode::SelectNoFaces),
            other => Err(ParsePrivacyModeError(other.to_string())),
        }
    }
}
