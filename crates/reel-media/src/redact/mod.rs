//! Face redaction for event photos.
//!
//! Every photo goes through [`ImageRedactor::redact`] before it can reach a
//! slide. Faces found by the frontal and profile detectors are either
//! blurred beyond recognition ([`PrivacyMode::Blur`]) or cause the photo to
//! be dropped ([`PrivacyMode::SelectNoFaces`]).

pub mod blur;
#[cfg(feature = "opencv")]
pub mod cascade;
pub mod detector;
pub mod pool;
pub mod region;

pub use blur::{blur_region, blur_sigma, MIN_BLUR_SIGMA};
pub use detector::{DetectorSet, FaceDetector};
pub use region::{RedactionRegion, DEFAULT_PADDING};

use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use reel_models::PrivacyMode;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A photo cleared for use on a slide.
#[derive(Debug, Clone)]
pub struct RedactedImage {
    /// Source file the pixels came from
    pub source: PathBuf,
    /// RGB pixels, with any faces blurred
    pub pixels: RgbImage,
    /// Number of regions blurred (0 means the photo is untouched)
    pub regions_blurred: usize,
}

/// Result of redacting one photo.
#[derive(Debug, Clone)]
pub enum RedactionOutcome {
    /// Usable photo
    Accepted(RedactedImage),
    /// Faces found under [`PrivacyMode::SelectNoFaces`]
    Excluded { source: PathBuf, faces: usize },
    /// Could not be decoded or scanned; skipped
    Unreadable { source: PathBuf, reason: String },
}

impl RedactionOutcome {
    /// The accepted image, if any.
    pub fn accepted(self) -> Option<RedactedImage> {
        match self {
            RedactionOutcome::Accepted(image) => Some(image),
            _ => None,
        }
    }

    /// Whether the photo made it through.
    pub fn is_accepted(&self) -> bool {
        matches!(self, RedactionOutcome::Accepted(_))
    }
}

/// Applies a privacy mode to photos using a set of face detectors.
#[derive(Debug, Clone)]
pub struct ImageRedactor {
    detectors: DetectorSet,
    padding: f64,
}

impl ImageRedactor {
    /// Create a redactor with the default 10% padding.
    pub fn new(detectors: DetectorSet) -> Self {
        Self {
            detectors,
            padding: DEFAULT_PADDING,
        }
    }

    /// Load and redact one photo.
    ///
    /// Never fails: decode and detection problems become
    /// [`RedactionOutcome::Unreadable`] so one bad file cannot sink the job.
    pub fn redact(&self, path: &Path, mode: PrivacyMode) -> RedactionOutcome {
        match image::open(path) {
            Ok(decoded) => self.redact_image(path, decoded, mode),
            Err(e) => {
                warn!(path = %path.display(), "Skipping unreadable photo: {}", e);
                RedactionOutcome::Unreadable {
                    source: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Redact an already decoded photo.
    pub fn redact_image(&self, source: &Path, decoded: DynamicImage, mode: PrivacyMode) -> RedactionOutcome {
        let gray = decoded.to_luma8();
        let regions = match self.detectors.detect_all(&gray) {
            Ok(regions) => regions,
            Err(e) => {
                // A photo we could not scan is never shown
                warn!(path = %source.display(), "Face detection failed, skipping photo: {}", e);
                return RedactionOutcome::Unreadable {
                    source: source.to_path_buf(),
                    reason: e.to_string(),
                };
            }
        };
        drop(gray);

        let mut pixels = decoded.into_rgb8();

        if regions.is_empty() {
            return RedactionOutcome::Accepted(RedactedImage {
                source: source.to_path_buf(),
                pixels,
                regions_blurred: 0,
            });
        }

        match mode {
            PrivacyMode::SelectNoFaces => {
                debug!(path = %source.display(), faces = regions.len(), "Excluding photo with faces");
                RedactionOutcome::Excluded {
                    source: source.to_path_buf(),
                    faces: regions.len(),
                }
            }
            PrivacyMode::Blur => {
                let (width, height) = pixels.dimensions();
                let mut blurred = 0;
                for region in &regions {
                    if let Some(padded) = region.padded(self.padding, width, height) {
                        blur_region(&mut pixels, &padded);
                        blurred += 1;
                    }
                }
                debug!(path = %source.display(), regions = blurred, "Blurred faces");
                RedactionOutcome::Accepted(RedactedImage {
                    source: source.to_path_buf(),
                    pixels,
                    regions_blurred: blurred,
                })
            }
        }
    }

    /// Redact a batch in parallel, keeping input order in the output.
    pub fn redact_batch(&self, paths: &[PathBuf], mode: PrivacyMode) -> Vec<RedactionOutcome> {
        paths.par_iter().map(|path| self.redact(path, mode)).collect()
    }
}
