//! OpenCV Haar cascade face detector.
//!
//! Two cascades are used side by side: `haarcascade_frontalface_default.xml`
//! for faces looking at the camera and `haarcascade_profileface.xml` for side
//! profiles. Both ship with every OpenCV install under `haarcascades/`.

use image::GrayImage;
use opencv::core::{Mat, Rect, Scalar, Size, Vector, CV_8UC1};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::detector::FaceDetector;
use super::pool::InstancePool;
use super::region::RedactionRegion;
use crate::error::{MediaError, MediaResult};

/// Frontal face cascade file name.
pub const FRONTAL_CASCADE: &str = "haarcascade_frontalface_default.xml";
/// Side profile cascade file name.
pub const PROFILE_CASCADE: &str = "haarcascade_profileface.xml";

/// Cascade directories in preference order.
pub(crate) const CASCADE_DIRS: &[&str] = &[
    // Container layout
    "/app/models/haarcascades",
    // Distro packages
    "/usr/share/opencv4/haarcascades",
    "/usr/share/opencv/haarcascades",
    "/usr/local/share/opencv4/haarcascades",
    // Homebrew
    "/opt/homebrew/share/opencv4/haarcascades",
    // Relative path for development
    "./models/haarcascades",
];

/// Image pyramid step between detection scales.
const SCALE_FACTOR: f64 = 1.1;

/// Neighbouring hits required to keep a detection.
const MIN_NEIGHBORS: i32 = 4;

/// Find a directory holding both cascades, preferring `preferred`.
pub fn find_cascade_dir(preferred: Option<&Path>) -> Option<PathBuf> {
    let has_both = |dir: &Path| dir.join(FRONTAL_CASCADE).exists() && dir.join(PROFILE_CASCADE).exists();

    if let Some(dir) = preferred {
        if has_both(dir) {
            return Some(dir.to_path_buf());
        }
        debug!(dir = %dir.display(), "Configured cascade directory is incomplete");
    }

    CASCADE_DIRS
        .iter()
        .map(PathBuf::from)
        .find(|dir| has_both(dir))
}

/// A single Haar cascade.
///
/// `detect_multi_scale` needs `&mut self`. Each concurrent caller checks out
/// its own classifier; extra copies are loaded from `path` on demand.
pub struct CascadeDetector {
    name: String,
    path: PathBuf,
    classifiers: InstancePool<CascadeClassifier>,
}

impl CascadeDetector {
    /// Load a cascade XML file.
    pub fn load(path: impl AsRef<Path>, name: impl Into<String>) -> MediaResult<Self> {
        let path = path.as_ref();
        let classifier = load_classifier(path)?;

        Ok(Self {
            name: name.into(),
            path: path.to_path_buf(),
            classifiers: InstancePool::new(classifier),
        })
    }
}

fn load_classifier(path: &Path) -> MediaResult<CascadeClassifier> {
    let path_str = path.to_string_lossy();

    let classifier = CascadeClassifier::new(&path_str)
        .map_err(|e| MediaError::detection_failed(format!("Failed to load {}: {}", path_str, e)))?;

    if classifier
        .empty()
        .map_err(|e| MediaError::detection_failed(e.to_string()))?
    {
        return Err(MediaError::model_not_found(path_str.to_string()));
    }

    Ok(classifier)
}

impl FaceDetector for CascadeDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, gray: &GrayImage) -> MediaResult<Vec<RedactionRegion>> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let mut frame = Mat::new_rows_cols_with_default(height as i32, width as i32, CV_8UC1, Scalar::all(0.0))
            .map_err(|e| MediaError::detection_failed(e.to_string()))?;
        frame
            .data_bytes_mut()
            .map_err(|e| MediaError::detection_failed(e.to_string()))?
            .copy_from_slice(gray.as_raw());

        let mut faces = Vector::<Rect>::new();
        self.classifiers
            .with(
                || {
                    debug!(cascade = %self.name, "Loading another classifier for a concurrent worker");
                    load_classifier(&self.path)
                },
                |classifier| {
                    classifier.detect_multi_scale(
                        &frame,
                        &mut faces,
                        SCALE_FACTOR,
                        MIN_NEIGHBORS,
                        0,
                        Size::new(0, 0),
                        Size::new(0, 0),
                    )
                },
            )?
            .map_err(|e| MediaError::detection_failed(format!("{} cascade: {}", self.name, e)))?;

        Ok(faces
            .iter()
            .filter(|r| r.width > 0 && r.height > 0)
            .map(|r| {
                RedactionRegion::new(
                    r.x.max(0) as u32,
                    r.y.max(0) as u32,
                    r.width as u32,
                    r.height as u32,
                )
            })
            .collect())
    }
}
