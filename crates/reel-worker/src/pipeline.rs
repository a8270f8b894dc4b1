//! The generation pipeline for one job.
//!
//! Title slide, then candidate photos in batches (redacted in parallel,
//! accepted in enumeration order until the cap is reached), then the
//! call-to-action, background audio, and a single encode.

use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use reel_media::{
    BackgroundAudio, DetectorSet, FfmpegEncoder, ImageRedactor, RedactedImage, RedactionOutcome, Slide,
    SlideComposer, TextRenderer, TimelineAssembler, TimelineRenderer,
};
use reel_models::{Branding, GenerationRequest, JobId};

use crate::config::ReelConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::progress::ProgressReporter;

/// Long-lived collaborators shared by every job.
pub struct PipelineContext {
    pub config: ReelConfig,
    pub redactor: ImageRedactor,
    pub composer: SlideComposer,
    pub renderer: Arc<dyn TimelineRenderer>,
    pub audio: Option<Arc<BackgroundAudio>>,
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("config", &self.config)
            .field("redactor", &self.redactor)
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}

impl PipelineContext {
    /// Production wiring: Haar cascades, configured font, FFmpeg encoder.
    ///
    /// Fails when the face cascades cannot be loaded; photos are never
    /// processed without a detector.
    pub fn from_config(config: ReelConfig) -> WorkerResult<Self> {
        let detectors = DetectorSet::haar_cascades(config.cascade_dir.as_deref())?;
        let text = Arc::new(TextRenderer::load(config.font_path.as_deref()));
        tracing::info!(typeface = text.typeface_name(), "Text renderer ready");

        let renderer = encoder_for(&config);
        tracing::info!(timeout_secs = ?renderer.timeout_secs(), "FFmpeg encoder ready");
        let audio = config
            .audio_url
            .as_ref()
            .map(|url| Arc::new(BackgroundAudio::new(url.clone(), config.audio_cache.clone(), config.audio_timeout)));

        Ok(Self {
            redactor: ImageRedactor::new(detectors),
            composer: SlideComposer::new(text, Branding::default()),
            renderer: Arc::new(renderer),
            audio,
            config,
        })
    }
}

fn encoder_for(config: &ReelConfig) -> FfmpegEncoder {
    let encoder = FfmpegEncoder::new(config.encoding.clone()).with_scratch_dir(config.frames_dir());
    match config.encode_timeout_secs {
        Some(secs) => encoder.with_timeout(secs),
        None => encoder,
    }
}

/// What a finished job produced.
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub path: PathBuf,
    pub photo_slides: usize,
    pub elapsed_secs: f64,
}

/// One submitted job, ready to run.
pub struct GenerationJob {
    job_id: JobId,
    request: GenerationRequest,
    candidates: Vec<PathBuf>,
    ctx: Arc<PipelineContext>,
    progress: ProgressReporter,
    cancel: watch::Receiver<bool>,
    logger: JobLogger,
}

impl GenerationJob {
    pub fn new(
        job_id: JobId,
        request: GenerationRequest,
        candidates: Vec<PathBuf>,
        ctx: Arc<PipelineContext>,
        progress: ProgressReporter,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let logger = JobLogger::new(&job_id, &request.event_name);
        Self {
            job_id,
            request,
            candidates,
            ctx,
            progress,
            cancel,
            logger,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Run every stage and return the rendered file.
    pub async fn run(self) -> WorkerResult<JobOutput> {
        let started = Instant::now();
        self.logger.log_start(&format!(
            "{} candidate photos from {} (mode={})",
            self.candidates.len(),
            self.request.source_folder.display(),
            self.request.mode
        ));

        self.progress.title().await;
        let composer = self.ctx.composer.clone();
        let event_name = self.request.event_name.clone();
        let title = blocking(move || composer.title_slide(&event_name)).await?;

        let photos = self.photo_slides().await?;
        let photo_count = photos.len();
        if photo_count == 0 {
            self.logger
                .log_warning("No photos survived redaction; rendering title and closing slides only");
        }

        self.progress.finalizing().await;
        let composer = self.ctx.composer.clone();
        let cta = blocking(move || composer.call_to_action_slide()).await?;

        let audio = match &self.ctx.audio {
            Some(audio) => {
                let track = audio.fetch().await;
                if track.is_none() {
                    self.logger.log_warning("Background audio unavailable, rendering silently");
                }
                track
            }
            None => None,
        };

        let timeline = TimelineAssembler::assemble(title, photos, cta, audio);

        // Last point at which the job can still be stopped
        self.ensure_not_cancelled()?;

        let output_dir = self
            .ctx
            .config
            .output_dir
            .clone()
            .unwrap_or_else(|| self.request.source_folder.clone());

        let encode_started = Instant::now();
        let path = self
            .ctx
            .renderer
            .render(timeline, &output_dir, &self.request.event_name, self.progress.render_progress())
            .await?;
        metrics::record_encode_duration(encode_started.elapsed().as_secs_f64());

        Ok(JobOutput {
            path,
            photo_slides: photo_count,
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }

    /// Redact candidates batch by batch until `max_photos` are accepted.
    async fn photo_slides(&self) -> WorkerResult<Vec<Slide>> {
        let total = self.candidates.len();
        let max_photos = self.ctx.config.max_photos;
        let batch_size = self.ctx.config.max_parallel_photos.max(1);

        let mut slides: Vec<Slide> = Vec::with_capacity(max_photos.min(total));
        let mut cursor = 0;

        while cursor < total && slides.len() < max_photos {
            self.ensure_not_cancelled()?;

            // Never redact more photos than could still be accepted
            let end = (cursor + batch_size.min(max_photos - slides.len())).min(total);
            self.progress.photo(cursor, total).await;

            let batch = self.candidates[cursor..end].to_vec();
            let redactor = self.ctx.redactor.clone();
            let mode = self.request.mode;
            let outcomes = blocking(move || redactor.redact_batch(&batch, mode)).await?;

            let accepted = self.accept(outcomes, slides.len(), max_photos);
            let composer = self.ctx.composer.clone();
            let composed = blocking(move || {
                accepted
                    .into_par_iter()
                    .map(|(image, quote)| composer.photo_slide(&image, quote.as_deref()))
                    .collect::<Vec<_>>()
            })
            .await?;

            slides.extend(composed);
            cursor = end;
        }

        self.progress.photos_done(cursor, total).await;
        self.logger.log_progress(&format!(
            "{} photo slides from {} of {} candidates",
            slides.len(),
            cursor,
            total
        ));

        Ok(slides)
    }

    /// Keep accepted photos in order and pair them with their quotes.
    fn accept(
        &self,
        outcomes: Vec<RedactionOutcome>,
        already_accepted: usize,
        max_photos: usize,
    ) -> Vec<(RedactedImage, Option<String>)> {
        let branding = self.ctx.composer.branding();
        let mut accepted = Vec::new();

        for outcome in outcomes {
            match outcome {
                RedactionOutcome::Accepted(image) => {
                    let index = already_accepted + accepted.len();
                    if index >= max_photos {
                        continue;
                    }
                    metrics::record_photo("accepted");
                    metrics::record_faces_redacted(image.regions_blurred);
                    let quote = branding.quote_for(index).map(str::to_string);
                    accepted.push((image, quote));
                }
                RedactionOutcome::Excluded { source, faces } => {
                    metrics::record_photo("excluded");
                    self.logger.log_progress(&format!(
                        "Excluded {} ({} faces detected)",
                        source.display(),
                        faces
                    ));
                }
                RedactionOutcome::Unreadable { source, reason } => {
                    metrics::record_photo("unreadable");
                    self.logger
                        .log_warning(&format!("Skipped {}: {}", source.display(), reason));
                }
            }
        }

        accepted
    }

    fn ensure_not_cancelled(&self) -> WorkerResult<()> {
        if *self.cancel.borrow() {
            return Err(WorkerError::Cancelled);
        }
        Ok(())
    }
}

/// Run CPU-bound work on the blocking pool.
async fn blocking<T, F>(work: F) -> WorkerResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| WorkerError::processing_failed(format!("worker thread failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_timeout_follows_config() {
        let mut config = ReelConfig::default();
        assert_eq!(encoder_for(&config).timeout_secs(), None);

        config.encode_timeout_secs = Some(900);
        assert_eq!(encoder_for(&config).timeout_secs(), Some(900));
    }
}
