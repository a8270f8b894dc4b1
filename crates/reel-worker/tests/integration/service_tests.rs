//! Job lifecycle through `ReelService` with the recording renderer.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use reel_models::{GenerationRequest, JobState, PrivacyMode};
use reel_worker::SubmitError;

use crate::common::{
    collect_statuses, faces_first_folder, luma_variance, photo_folder, service_with, wait_for,
    write_photo, RecordingRenderer, PLAIN_PHOTO_SIZE,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_three_photos_one_face_blur() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 2, 1);

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), Arc::clone(&renderer), Duration::ZERO);

    let request = GenerationRequest::new(photos.path(), "Spring Picnic", PrivacyMode::Blur);
    let job_id = service.submit(request).await.unwrap();
    let status = wait_for(&service, &job_id).await;

    assert_eq!(status.state, JobState::Done, "message: {}", status.message);
    assert_eq!(status.progress, 100);
    assert_eq!(status.message, "Video generation complete!");

    let output = status.output_path.clone().unwrap();
    assert_eq!(output, photos.path().join("Spring_Picnic_Inspiration.mp4"));
    assert!(output.exists());

    let rendered = renderer.last().unwrap();
    assert_eq!(
        rendered.kinds,
        vec!["title", "photo", "photo", "photo", "call_to_action"]
    );
    // Title 3s + 3 photos x 5s + closing 4s
    assert!((rendered.total_duration - 22.0).abs() < 1e-9);
    assert!(!rendered.has_audio);
    // Quotes on every second photo, starting with the first
    assert!(rendered.quotes[0].is_some());
    assert!(rendered.quotes[1].is_none());
    assert!(rendered.quotes[2].is_some());

    // Both photo sizes fit to 1440x1080 at x = 240. This window sits inside
    // the detected face (20, 10, 30, 30) of the 80x60 photo.
    let window = ((690, 270), (1050, 630));
    let plain = luma_variance(&rendered.photo_canvases[0], window.0, window.1);
    let face = luma_variance(&rendered.photo_canvases[2], window.0, window.1);
    assert!(plain > 100.0, "plain photo variance {}", plain);
    assert!(face < plain * 0.05, "face {} vs plain {}", face, plain);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_progress_never_goes_backwards() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 4, 2);

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), renderer, Duration::from_millis(15));

    let request = GenerationRequest::new(photos.path(), "Open Day", PrivacyMode::Blur);
    let job_id = service.submit(request).await.unwrap();
    let seen = collect_statuses(&service, &job_id).await;

    assert!(seen
        .windows(2)
        .all(|w| w[0].progress <= w[1].progress && w[0].event_seq <= w[1].event_seq));
    assert!(seen.iter().all(|s| !s.message.is_empty()));
    assert!(seen.iter().all(|s| s.photos.total == 6));

    let last = seen.last().unwrap();
    assert_eq!(last.state, JobState::Done);
    assert_eq!(last.progress, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_select_no_faces_excludes_photos() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 2, 3);

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), Arc::clone(&renderer), Duration::ZERO);

    let request = GenerationRequest::new(photos.path(), "Garden Party", PrivacyMode::SelectNoFaces);
    let job_id = service.submit(request).await.unwrap();
    let status = wait_for(&service, &job_id).await;
    assert_eq!(status.state, JobState::Done);

    let rendered = renderer.last().unwrap();
    assert_eq!(rendered.photo_sources.len(), 2);
    assert!(rendered
        .photo_sources
        .iter()
        .all(|p| p.file_name().unwrap().to_string_lossy().starts_with("plain_")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_only_faces_with_select_no_faces_renders_bookends() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 0, 2);

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), Arc::clone(&renderer), Duration::ZERO);

    let request = GenerationRequest::new(photos.path(), "Quiet Night", PrivacyMode::SelectNoFaces);
    let job_id = service.submit(request).await.unwrap();
    let status = wait_for(&service, &job_id).await;
    assert_eq!(status.state, JobState::Done);

    let rendered = renderer.last().unwrap();
    assert_eq!(rendered.kinds, vec!["title", "call_to_action"]);
    assert!((rendered.total_duration - 7.0).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_at_most_ten_photo_slides_in_name_order() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 13, 0);

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), Arc::clone(&renderer), Duration::ZERO);

    let request = GenerationRequest::new(photos.path(), "Field Day", PrivacyMode::Blur);
    let job_id = service.submit(request).await.unwrap();
    let status = wait_for(&service, &job_id).await;
    assert_eq!(status.state, JobState::Done);

    let rendered = renderer.last().unwrap();
    let names: Vec<String> = rendered
        .photo_sources
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    let expected: Vec<String> = (0..10).map(|i| format!("plain_{:02}.png", i)).collect();
    assert_eq!(names, expected);
    assert_eq!(rendered.kinds.first(), Some(&"title"));
    assert_eq!(rendered.kinds.last(), Some(&"call_to_action"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_photo_cap_applies_to_candidates_not_accepted() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    faces_first_folder(photos.path(), 10, 3);

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), Arc::clone(&renderer), Duration::ZERO);

    let request = GenerationRequest::new(photos.path(), "Team Portraits", PrivacyMode::SelectNoFaces);
    let job_id = service.submit(request).await.unwrap();
    let status = wait_for(&service, &job_id).await;
    assert_eq!(status.state, JobState::Done);
    assert_eq!(status.photos.total, 10);

    // The plain photos past the first ten are never looked at
    let rendered = renderer.last().unwrap();
    assert_eq!(rendered.kinds, vec!["title", "call_to_action"]);
    assert!(rendered.photo_sources.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreadable_photo_is_skipped() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_photo(photos.path(), "a.png", PLAIN_PHOTO_SIZE);
    std::fs::write(photos.path().join("b.jpg"), b"definitely not a jpeg").unwrap();
    write_photo(photos.path(), "c.png", PLAIN_PHOTO_SIZE);

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), Arc::clone(&renderer), Duration::ZERO);

    let request = GenerationRequest::new(photos.path(), "Bake Sale", PrivacyMode::Blur);
    let job_id = service.submit(request).await.unwrap();
    let status = wait_for(&service, &job_id).await;
    assert_eq!(status.state, JobState::Done);

    let rendered = renderer.last().unwrap();
    assert_eq!(rendered.photo_sources.len(), 2);
    assert_eq!(
        rendered.photo_sources,
        vec![photos.path().join("a.png"), photos.path().join("c.png")]
    );
}

#[tokio::test]
async fn test_empty_folder_is_rejected_without_status() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    std::fs::write(photos.path().join("notes.txt"), b"no photos here").unwrap();

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), Arc::clone(&renderer), Duration::ZERO);

    let request = GenerationRequest::new(photos.path(), "Empty", PrivacyMode::Blur);
    let err = service.submit(request).await.unwrap_err();
    assert!(matches!(err, SubmitError::NoPhotos(_)));

    assert_eq!(service.latest().await.state, JobState::Idle);
    assert!(service.registry().is_empty().await);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejection_keeps_previous_job_latest() {
    let photos = TempDir::new().unwrap();
    let empty = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 1, 0);

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), renderer, Duration::ZERO);

    let first = service
        .submit(GenerationRequest::new(photos.path(), "First", PrivacyMode::Blur))
        .await
        .unwrap();
    wait_for(&service, &first).await;

    let rejected = service
        .submit(GenerationRequest::new(empty.path(), "Second", PrivacyMode::Blur))
        .await;
    assert!(rejected.is_err());

    let blank = service
        .submit(GenerationRequest::new(photos.path(), "   ", PrivacyMode::Blur))
        .await;
    assert!(matches!(blank, Err(SubmitError::EmptyEventName)));

    let latest = service.latest().await;
    assert_eq!(latest.job_id, Some(first));
    assert_eq!(latest.state, JobState::Done);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_encode_failure_reports_ffmpeg_message() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 2, 0);

    let renderer = Arc::new(RecordingRenderer::failing("Conversion failed!"));
    let service = service_with(work.path(), Arc::clone(&renderer), Duration::ZERO);

    let request = GenerationRequest::new(photos.path(), "Broken Encoder", PrivacyMode::Blur);
    let job_id = service.submit(request).await.unwrap();
    let status = wait_for(&service, &job_id).await;

    assert_eq!(status.state, JobState::Error);
    assert!(status.message.starts_with("Generation failed: "));
    assert!(status.message.contains("Conversion failed!"));
    assert!(status.output_path.is_none());
    // Progress stays where encoding stopped
    assert!(status.progress >= 70 && status.progress < 100);
    assert!(!photos.path().join("Broken_Encoder_Inspiration.mp4").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_before_encoding() {
    let photos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    photo_folder(photos.path(), 8, 0);

    let renderer = Arc::new(RecordingRenderer::default());
    let service = service_with(work.path(), Arc::clone(&renderer), Duration::from_millis(50));

    let request = GenerationRequest::new(photos.path(), "Cancelled", PrivacyMode::Blur);
    let job_id = service.submit(request).await.unwrap();
    assert!(service.cancel(&job_id).await);

    let status = wait_for(&service, &job_id).await;
    assert_eq!(status.state, JobState::Error);
    assert_eq!(status.message, "Generation failed: Generation cancelled");
    assert!(status.output_path.is_none());
    assert_eq!(renderer.calls(), 0);

    // Finished jobs cannot be cancelled again
    assert!(!service.cancel(&job_id).await);
}
