//! Pipeline progress reporting.
//!
//! The pipeline writes [`ProgressUpdate`]s into a channel; the registry
//! drains it into the job's status record. Stage-to-percentage mapping
//! lives here so the encoder only has to report a render fraction.
//!
//! | Stage            | Progress                      |
//! |------------------|-------------------------------|
//! | title slide      | 5                             |
//! | photo `i` of `n` | `5 + 65 * i / n`              |
//! | finalize         | 70                            |
//! | encoding         | `70 + 30 * fraction`          |

use std::sync::Arc;
use tokio::sync::mpsc;

use reel_media::RenderProgress;
use reel_models::PhotoCounts;

/// Progress once the title slide is being built.
pub const TITLE_PROGRESS: u8 = 5;
/// Progress at the end of the photo stage.
pub const PHOTOS_END_PROGRESS: u8 = 70;
/// Progress when encoding starts.
pub const ENCODE_START_PROGRESS: u8 = 70;

const PHOTO_SPAN: u32 = (PHOTOS_END_PROGRESS - TITLE_PROGRESS) as u32;
const ENCODE_SPAN: f64 = (100 - ENCODE_START_PROGRESS) as f64;

/// Progress channel capacity.
const CHANNEL_CAPACITY: usize = 64;

/// One step forward in the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub progress: u8,
    pub message: String,
    pub photos: Option<PhotoCounts>,
}

/// Progress for candidate photo `index` (0-based) of `total`.
pub fn photo_progress(index: usize, total: usize) -> u8 {
    if total == 0 {
        return TITLE_PROGRESS;
    }
    let index = index.min(total) as u32;
    TITLE_PROGRESS + (PHOTO_SPAN * index / total as u32) as u8
}

/// Overall progress for an encode that is `fraction` done.
pub fn encode_progress(fraction: f64) -> u8 {
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    ENCODE_START_PROGRESS + (fraction * ENCODE_SPAN) as u8
}

/// Sending half of a job's progress channel.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::Sender<ProgressUpdate>,
}

/// Create a progress channel pair.
pub fn channel() -> (ProgressReporter, mpsc::Receiver<ProgressUpdate>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    (ProgressReporter { tx }, rx)
}

impl ProgressReporter {
    async fn send(&self, progress: u8, message: String, photos: Option<PhotoCounts>) {
        // A closed channel means nobody is watching any more
        let _ = self
            .tx
            .send(ProgressUpdate {
                progress,
                message,
                photos,
            })
            .await;
    }

    /// Title slide stage.
    pub async fn title(&self) {
        self.send(TITLE_PROGRESS, "Creating title slide...".to_string(), None)
            .await;
    }

    /// About to process candidate `index` (0-based) of `total`.
    pub async fn photo(&self, index: usize, total: usize) {
        let counts = PhotoCounts {
            current: (index + 1).min(total) as u32,
            total: total as u32,
        };
        self.send(
            photo_progress(index, total),
            format!("Processing photo {} of {}...", index + 1, total),
            Some(counts),
        )
        .await;
    }

    /// Every candidate has been examined.
    pub async fn photos_done(&self, examined: usize, total: usize) {
        let counts = PhotoCounts {
            current: examined as u32,
            total: total as u32,
        };
        self.send(
            photo_progress(examined, total),
            format!("Processed {} of {} photos", examined, total),
            Some(counts),
        )
        .await;
    }

    /// Slides are ready; assembling the timeline.
    pub async fn finalizing(&self) {
        self.send(PHOTOS_END_PROGRESS, "Finalizing structure...".to_string(), None)
            .await;
    }

    /// Encode progress (`0.0..=1.0`).
    ///
    /// Called from FFmpeg's stderr reader, so it never waits: if the
    /// channel is full the tick is dropped and a later one supersedes it.
    pub fn encoding(&self, fraction: f64) {
        let progress = encode_progress(fraction);
        let _ = self.tx.try_send(ProgressUpdate {
            progress,
            message: format!("Encoding video: {}%", progress),
            photos: None,
        });
    }

    /// Callback handed to the encoder.
    pub fn render_progress(&self) -> RenderProgress {
        let reporter = self.clone();
        Arc::new(move |fraction| reporter.encoding(fraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_progress_is_linear() {
        assert_eq!(photo_progress(0, 10), 5);
        assert_eq!(photo_progress(5, 10), 37);
        assert_eq!(photo_progress(10, 10), 70);
        assert_eq!(photo_progress(0, 0), 5);
        // Never past the photo stage
        assert_eq!(photo_progress(50, 10), 70);
    }

    #[test]
    fn test_photo_progress_is_monotonic() {
        let total = 37;
        let values: Vec<u8> = (0..=total).map(|i| photo_progress(i, total)).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_encode_progress_range() {
        assert_eq!(encode_progress(0.0), 70);
        assert_eq!(encode_progress(0.5), 85);
        assert_eq!(encode_progress(1.0), 100);
        assert_eq!(encode_progress(7.0), 100);
        assert_eq!(encode_progress(f64::NAN), 70);
    }

    #[tokio::test]
    async fn test_channel_messages() {
        let (reporter, mut rx) = channel();

        reporter.title().await;
        reporter.photo(2, 4).await;
        reporter.finalizing().await;
        (reporter.render_progress())(0.5);
        drop(reporter);

        let title = rx.recv().await.unwrap();
        assert_eq!((title.progress, title.message.as_str()), (5, "Creating title slide..."));

        let photo = rx.recv().await.unwrap();
        assert_eq!(photo.message, "Processing photo 3 of 4...");
        assert_eq!(photo.progress, 37);
        assert_eq!(photo.photos, Some(PhotoCounts { current: 3, total: 4 }));

        let finalize = rx.recv().await.unwrap();
        assert_eq!((finalize.progress, finalize.message.as_str()), (70, "Finalizing structure..."));

        let encode = rx.recv().await.unwrap();
        assert_eq!((encode.progress, encode.message.as_str()), (85, "Encoding video: 85%"));

        assert!(rx.recv().await.is_none());
    }
}
