//! Shared fixtures: photo folders, fake detectors and a recording renderer.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{GrayImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reel_media::{
    output_file_name, DetectorSet, FaceDetector, ImageRedactor, MediaError, MediaResult, RedactionRegion,
    RenderProgress, SlideComposer, SlideKind, TextRenderer, Timeline, TimelineRenderer,
};
use reel_models::{Branding, JobId, JobStatus};
use reel_worker::{PipelineContext, ReelConfig, ReelService};

/// Photos of this size contain a "face" for [`SizeKeyedDetector`].
pub const FACE_PHOTO_SIZE: (u32, u32) = (80, 60);
/// Photos of this size contain nothing.
pub const PLAIN_PHOTO_SIZE: (u32, u32) = (64, 48);

/// Upper bound for any single test job.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(60);

/// Write a checkerboard PNG of the given size.
pub fn write_photo(dir: &Path, name: &str, (width, height): (u32, u32)) -> PathBuf {
    let img = RgbImage::from_fn(width, height, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgb([230, 120, 40])
        } else {
            Rgb([20, 60, 200])
        }
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// Folder with `plain` face-free photos followed by `faces` photos with a face.
pub fn photo_folder(dir: &Path, plain: usize, faces: usize) {
    for i in 0..plain {
        write_photo(dir, &format!("plain_{:02}.png", i), PLAIN_PHOTO_SIZE);
    }
    for i in 0..faces {
        write_photo(dir, &format!("zface_{:02}.png", i), FACE_PHOTO_SIZE);
    }
}

/// Face-first folder: `faces` photos with a face sorting ahead of `plain` ones.
pub fn faces_first_folder(dir: &Path, faces: usize, plain: usize) {
    for i in 0..faces {
        write_photo(dir, &format!("a_face_{:02}.png", i), FACE_PHOTO_SIZE);
    }
    for i in 0..plain {
        write_photo(dir, &format!("b_plain_{:02}.png", i), PLAIN_PHOTO_SIZE);
    }
}

/// Luma variance of `image` over `[x0, x1) × [y0, y1)`.
pub fn luma_variance(image: &RgbImage, (x0, y0): (u32, u32), (x1, y1): (u32, u32)) -> f64 {
    let values: Vec<f64> = (y0..y1)
        .flat_map(|y| (x0..x1).map(move |x| (x, y)))
        .map(|(x, y)| {
            let p = image.get_pixel(x, y).0;
            (p[0] as f64 + p[1] as f64 + p[2] as f64) / 3.0
        })
        .collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Reports one face in every image of [`FACE_PHOTO_SIZE`].
pub struct SizeKeyedDetector {
    pub delay: Duration,
}

impl FaceDetector for SizeKeyedDetector {
    fn name(&self) -> &str {
        "size-keyed"
    }

    fn detect(&self, gray: &GrayImage) -> MediaResult<Vec<RedactionRegion>> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if gray.dimensions() == FACE_PHOTO_SIZE {
            Ok(vec![RedactionRegion::new(20, 10, 30, 30)])
        } else {
            Ok(Vec::new())
        }
    }
}

/// What the renderer was asked to encode.
#[derive(Debug, Clone)]
pub struct RenderedTimeline {
    pub kinds: Vec<&'static str>,
    pub photo_sources: Vec<PathBuf>,
    pub quotes: Vec<Option<String>>,
    /// Composed canvas of each photo slide, in slide order
    pub photo_canvases: Vec<RgbImage>,
    pub total_duration: f64,
    pub has_audio: bool,
}

/// In-memory renderer that records timelines and writes a placeholder file.
#[derive(Default)]
pub struct RecordingRenderer {
    pub fail_with: Option<String>,
    pub calls: AtomicUsize,
    pub rendered: Mutex<Vec<RenderedTimeline>>,
}

impl RecordingRenderer {
    pub fn failing(stderr_tail: &str) -> Self {
        Self {
            fail_with: Some(stderr_tail.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<RenderedTimeline> {
        self.rendered.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TimelineRenderer for RecordingRenderer {
    async fn render(
        &self,
        timeline: Timeline,
        output_dir: &Path,
        event_name: &str,
        progress: RenderProgress,
    ) -> MediaResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut quotes = Vec::new();
        let mut photo_sources = Vec::new();
        let mut photo_canvases = Vec::new();
        for slide in timeline.slides() {
            if let SlideKind::Photo { source, quote } = slide.kind() {
                photo_sources.push(source.clone());
                quotes.push(quote.clone());
                photo_canvases.push(slide.canvas().clone());
            }
        }
        self.rendered.lock().unwrap().push(RenderedTimeline {
            kinds: timeline.slides().iter().map(|s| s.kind().label()).collect(),
            photo_sources,
            quotes,
            photo_canvases,
            total_duration: timeline.total_duration(),
            has_audio: timeline.audio().is_some(),
        });

        for fraction in [0.1, 0.4, 0.8] {
            progress(fraction);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        if let Some(tail) = &self.fail_with {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(tail.clone()),
                Some(1),
            ));
        }

        progress(1.0);
        let path = output_dir.join(output_file_name(event_name));
        tokio::fs::write(&path, b"not really an mp4").await?;
        Ok(path)
    }
}

/// Service wired with the fake detector and renderer.
pub fn service_with(
    work_dir: &Path,
    renderer: Arc<RecordingRenderer>,
    detector_delay: Duration,
) -> ReelService {
    let config = ReelConfig::default().with_work_dir(work_dir).without_audio();
    let detectors = DetectorSet::new(vec![Arc::new(SizeKeyedDetector {
        delay: detector_delay,
    })]);
    ReelService::new(PipelineContext {
        config,
        redactor: ImageRedactor::new(detectors),
        composer: SlideComposer::new(Arc::new(TextRenderer::bitmap()), Branding::default()),
        renderer,
        audio: None,
    })
}

/// Wait for a terminal status, failing the test on timeout.
pub async fn wait_for(service: &ReelService, job_id: &JobId) -> JobStatus {
    tokio::time::timeout(JOB_TIMEOUT, service.wait(job_id, Duration::from_millis(10)))
        .await
        .expect("job did not finish in time")
        .expect("job vanished from the registry")
}

/// Poll until terminal, collecting every observed snapshot.
pub async fn collect_statuses(service: &ReelService, job_id: &JobId) -> Vec<JobStatus> {
    let poll = async {
        let mut seen = Vec::new();
        loop {
            let status = service.status(job_id).await.expect("job registered");
            let done = status.is_terminal();
            seen.push(status);
            if done {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    };
    tokio::time::timeout(JOB_TIMEOUT, poll)
        .await
        .expect("job did not finish in time")
}

pub fn cascade_dir_from_env() -> Option<PathBuf> {
    std::env::var("REEL_CASCADE_DIR").ok().map(PathBuf::from)
}
