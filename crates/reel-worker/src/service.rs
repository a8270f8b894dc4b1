//! Job submission and status queries.
//!
//! `submit` validates the request, creates the job's `Starting` record and
//! hands the pipeline to a background task. Callers poll `status`/`latest`
//! while it runs; the terminal record is written only after every progress
//! update has been applied.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, Instrument};

use reel_models::{GenerationRequest, JobId, JobStatus};

use crate::assets::enumerate_photos;
use crate::config::ReelConfig;
use crate::error::{SubmitError, WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::{GenerationJob, PipelineContext};
use crate::progress::{self, ProgressUpdate};
use crate::registry::JobRegistry;

/// Entry point for generating event reels.
#[derive(Debug, Clone)]
pub struct ReelService {
    ctx: Arc<PipelineContext>,
    registry: Arc<JobRegistry>,
}

impl ReelService {
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            registry: Arc::new(JobRegistry::new()),
        }
    }

    /// Production wiring from configuration.
    pub fn from_config(config: ReelConfig) -> WorkerResult<Self> {
        Ok(Self::new(PipelineContext::from_config(config)?))
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Accept a request and start it in the background.
    ///
    /// Rejections happen before any status record is created, so the
    /// previously reported job stays the latest one.
    pub async fn submit(&self, request: GenerationRequest) -> Result<JobId, SubmitError> {
        if request.event_name.trim().is_empty() {
            return Err(SubmitError::EmptyEventName);
        }
        let mut candidates = enumerate_photos(&request.source_folder).await?;
        // Only the first photos in name order are ever considered
        candidates.truncate(self.ctx.config.max_photos);

        let job_id = JobId::new();
        let cancel = self
            .registry
            .register(job_id.clone(), candidates.len() as u32)
            .await;
        metrics::record_job_started();

        let logger = JobLogger::new(&job_id, &request.event_name);
        let span = logger.create_span();
        info!(
            job_id = %job_id,
            photos = candidates.len(),
            mode = %request.mode,
            "Accepted generation request"
        );

        let (reporter, updates) = progress::channel();
        let drain = tokio::spawn(drain_progress(
            Arc::clone(&self.registry),
            job_id.clone(),
            updates,
        ));

        let job = GenerationJob::new(
            job_id.clone(),
            request,
            candidates,
            Arc::clone(&self.ctx),
            reporter,
            cancel,
        );
        // Own task so a panic in the pipeline still ends in an error record
        let run = tokio::spawn(job.run().instrument(span.clone()));

        let registry = Arc::clone(&self.registry);
        let finished_id = job_id.clone();
        tokio::spawn(
            async move {
                let result = match run.await {
                    Ok(result) => result,
                    Err(e) => Err(WorkerError::processing_failed(format!("job task failed: {}", e))),
                };
                // Reporter is gone once the job finishes, so the drain ends
                if let Err(e) = drain.await {
                    error!("Progress drain for {} failed: {}", finished_id, e);
                }

                match result {
                    Ok(output) => {
                        registry
                            .update(&finished_id, |s| s.completed(output.path.clone()))
                            .await;
                        metrics::record_job_completed(output.elapsed_secs, output.photo_slides);
                        logger.log_completion(&format!(
                            "{} ({} photo slides, {:.1}s)",
                            output.path.display(),
                            output.photo_slides,
                            output.elapsed_secs
                        ));
                    }
                    Err(e) => {
                        let message = e.status_message();
                        registry.update(&finished_id, |s| s.failed(&message)).await;
                        metrics::record_job_failed(e.kind());
                        logger.log_error(&message);
                    }
                }
            }
            .instrument(span),
        );

        Ok(job_id)
    }

    /// Snapshot of one job.
    pub async fn status(&self, job_id: &JobId) -> Option<JobStatus> {
        self.registry.status(job_id).await
    }

    /// Snapshot of the most recently submitted job (`Idle` if none).
    pub async fn latest(&self) -> JobStatus {
        self.registry.latest().await
    }

    /// Request cancellation; honored only before encoding starts.
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        let accepted = self.registry.cancel(job_id).await;
        if accepted {
            info!(job_id = %job_id, "Cancellation requested");
        }
        accepted
    }

    /// Poll until the job reaches `Done` or `Error`.
    pub async fn wait(&self, job_id: &JobId, poll_interval: Duration) -> Option<JobStatus> {
        loop {
            let status = self.registry.status(job_id).await?;
            if status.is_terminal() {
                return Some(status);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// Apply progress updates to the job's record until the pipeline drops its
/// reporter.
async fn drain_progress(
    registry: Arc<JobRegistry>,
    job_id: JobId,
    mut updates: mpsc::Receiver<ProgressUpdate>,
) {
    while let Some(update) = updates.recv().await {
        registry
            .update(&job_id, |s| s.advanced(update.progress, update.message, update.photos))
            .await;
    }
}
