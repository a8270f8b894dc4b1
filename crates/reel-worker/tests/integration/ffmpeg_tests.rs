//! Real encodes. Run with `cargo test -- --ignored` on a machine with FFmpeg.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use reel_media::{probe_media, DetectorSet, FfmpegEncoder, ImageRedactor, SlideComposer, TextRenderer};
use reel_models::{Branding, EncodingConfig, GenerationRequest, JobState, PrivacyMode};
use reel_worker::{PipelineContext, ReelConfig, ReelService};

use crate::common::{cascade_dir_from_env, photo_folder, wait_for, SizeKeyedDetector};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires ffmpeg"]
async fn test_end_to_end_encode() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 2, 1);

    let config = ReelConfig::default().with_work_dir(work.path()).without_audio();
    let renderer = FfmpegEncoder::new(EncodingConfig::default()).with_scratch_dir(config.frames_dir());
    let detectors = DetectorSet::new(vec![Arc::new(SizeKeyedDetector {
        delay: Duration::ZERO,
    })]);
    let service = ReelService::new(PipelineContext {
        config,
        redactor: ImageRedactor::new(detectors),
        composer: SlideComposer::new(Arc::new(TextRenderer::load(None)), Branding::default()),
        renderer: Arc::new(renderer),
        audio: None,
    });

    let request = GenerationRequest::new(photos.path(), "Spring Picnic", PrivacyMode::Blur);
    let job_id = service.submit(request).await.unwrap();
    let status = wait_for(&service, &job_id).await;

    assert_eq!(status.state, JobState::Done, "message: {}", status.message);
    let output = status.output_path.unwrap();
    assert!(output.ends_with("Spring_Picnic_Inspiration.mp4"));

    let info = probe_media(&output).await.unwrap();
    assert!(info.has_video);
    // Title 3s + 3 photos x 5s + closing 4s
    assert!((info.duration - 22.0).abs() < 0.5, "duration {}", info.duration);

    // No scratch stills are left behind
    let leftovers = std::fs::read_dir(work.path().join("frames"))
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires ffmpeg and OpenCV haarcascades installed"]
async fn test_production_wiring() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 2, 0);

    let mut config = ReelConfig::default().with_work_dir(work.path()).without_audio();
    config.cascade_dir = cascade_dir_from_env();
    let service = ReelService::from_config(config).unwrap();

    let request = GenerationRequest::new(photos.path(), "Plain Shapes", PrivacyMode::SelectNoFaces);
    let job_id = service.submit(request).await.unwrap();
    let status = wait_for(&service, &job_id).await;

    assert_eq!(status.state, JobState::Done, "message: {}", status.message);
    assert!(status.output_path.unwrap().exists());
}
