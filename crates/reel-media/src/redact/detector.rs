//! Face detector seam.
//!
//! A [`DetectorSet`] runs several independent detectors (frontal and profile
//! Haar cascades in production) and unions what they find. Regions are not
//! deduplicated: overlapping hits are simply redacted twice.

use image::GrayImage;
use std::path::Path;
use std::sync::Arc;

use super::region::RedactionRegion;
use crate::error::{MediaError, MediaResult};

/// Pluggable face detection backend.
pub trait FaceDetector: Send + Sync {
    /// Short name used in logs (e.g. "frontal", "profile").
    fn name(&self) -> &str;

    /// Detect faces in a grayscale image.
    fn detect(&self, gray: &GrayImage) -> MediaResult<Vec<RedactionRegion>>;
}

/// Ordered collection of detectors whose outputs are unioned.
#[derive(Clone)]
pub struct DetectorSet {
    detectors: Vec<Arc<dyn FaceDetector>>,
}

impl std::fmt::Debug for DetectorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.detectors.iter().map(|d| d.name()))
            .finish()
    }
}

impl DetectorSet {
    /// Build a set from explicit detectors.
    pub fn new(detectors: Vec<Arc<dyn FaceDetector>>) -> Self {
        Self { detectors }
    }

    /// Frontal + profile Haar cascades.
    ///
    /// `preferred_dir` is checked first, then the usual OpenCV install
    /// locations.
    #[cfg(feature = "opencv")]
    pub fn haar_cascades(preferred_dir: Option<&Path>) -> MediaResult<Self> {
        use super::cascade::{find_cascade_dir, CascadeDetector, FRONTAL_CASCADE, PROFILE_CASCADE};

        let dir = find_cascade_dir(preferred_dir).ok_or_else(|| {
            MediaError::model_not_found(format!(
                "{} / {} (set REEL_CASCADE_DIR)",
                FRONTAL_CASCADE, PROFILE_CASCADE
            ))
        })?;

        let frontal = CascadeDetector::load(dir.join(FRONTAL_CASCADE), "frontal")?;
        let profile = CascadeDetector::load(dir.join(PROFILE_CASCADE), "profile")?;

        tracing::info!(dir = %dir.display(), "Loaded frontal and profile face cascades");

        Ok(Self::new(vec![Arc::new(frontal), Arc::new(profile)]))
    }

    /// Without OpenCV there is no detector, and photos must never pass
    /// through unredacted, so this always fails.
    #[cfg(not(feature = "opencv"))]
    pub fn haar_cascades(_preferred_dir: Option<&Path>) -> MediaResult<Self> {
        Err(MediaError::model_not_found(
            "face cascades (built without the `opencv` feature)",
        ))
    }

    /// Number of detectors in the set.
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// Whether the set has no detectors.
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every detector and concatenate their regions in detector order.
    pub fn detect_all(&self, gray: &GrayImage) -> MediaResult<Vec<RedactionRegion>> {
        if self.detectors.is_empty() {
            return Err(MediaError::detection_failed("no face detectors configured"));
        }

        let mut regions = Vec::new();
        for detector in &self.detectors {
            let found = detector.detect(gray)?;
            tracing::trace!(detector = detector.name(), faces = found.len(), "Detector pass");
            regions.extend(found);
        }
        Ok(regions)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_union_keeps_overlaps() {
        let face = RedactionRegion::new(10, 10, 20, 20);
        let set = DetectorSet::new(vec![
            fixed("frontal", vec![face]),
            fixed("profile", vec![face, RedactionRegion::new(40, 5, 10, 10)]),
        ]);

        let gray = GrayImage::new(64, 64);
        let regions = set.detect_all(&gray).unwrap();
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0], face);
        assert_eq!(regions[1], face);
    }

    #[test]
    fn test_empty_set_is_an_error() {
        let set = DetectorSet::new(Vec::new());
        assert!(set.is_empty());
        assert!(set.detect_all(&GrayImage::new(4, 4)).is_err());
    }

    #[test]
    fn test_detector_error_propagates() {
        let set = DetectorSet::new(vec![fixed("frontal", Vec::new()), Arc::new(BrokenDetector)]);
        assert!(matches!(
            set.detect_all(&GrayImage::new(4, 4)),
            Err(MediaError::DetectionFailed(_))
        ));
    }
}
