//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Fraction of the output written, in `[0.0, 1.0]`.
    pub fn fraction(&self, total_duration_ms: i64) -> f64 {
        if self.is_complete {
            return 1.0;
        }
        if total_duration_ms <= 0 {
            return 0.0;
        }
        (self.out_time_ms as f64 / total_duration_ms as f64).clamp(0.0, 1.0)
    }
}

/// Callback receiving the render fraction (`0.0..=1.0`) of the current encode.
pub type RenderProgress = Arc<dyn Fn(f64) + Send + Sync>;
