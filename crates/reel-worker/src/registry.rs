//! In-process job status registry.
//!
//! Each job's status is a [`JobStatus`] value that is only ever replaced
//! whole under the write lock, so a poll never observes a half-applied
//! transition. Jobs are keyed by [`JobId`]; a stale writer from an older run
//! can only touch its own record.
//!
//! Finished jobs are kept for polling until more than
//! [`RETAINED_FINISHED_JOBS`] of them pile up; the oldest go first. Running
//! jobs and the latest job are never evicted.

use std::collections::HashMap;
use tokio::sync::{watch, RwLock};

use reel_models::{JobId, JobStatus};

/// Finished jobs kept around for status queries.
pub const RETAINED_FINISHED_JOBS: usize = 32;

struct JobEntry {
    status: JobStatus,
    cancel: watch::Sender<bool>,
    /// Registration order
    seq: u64,
}

#[derive(Default)]
struct RegistryInner {
    jobs: HashMap<JobId, JobEntry>,
    latest: Option<JobId>,
    next_seq: u64,
}

impl RegistryInner {
    /// Drop the oldest finished jobs beyond the retention limit.
    fn evict_finished(&mut self) {
        let mut finished: Vec<(u64, JobId)> = self
            .jobs
            .iter()
            .filter(|(id, e)| e.status.is_terminal() && self.latest.as_ref() != Some(*id))
            .map(|(id, e)| (e.seq, id.clone()))
            .collect();
        if finished.len() <= RETAINED_FINISHED_JOBS {
            return;
        }

        finished.sort_unstable_by_key(|(seq, _)| *seq);
        let excess = finished.len() - RETAINED_FINISHED_JOBS;
        for (_, id) in finished.into_iter().take(excess) {
            self.jobs.remove(&id);
        }
        tracing::debug!(evicted = excess, "Evicted finished jobs from the registry");
    }
}

/// Status records for every job submitted to this process.
#[derive(Default)]
pub struct JobRegistry {
    inner: RwLock<RegistryInner>,
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRegistry").finish_non_exhaustive()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the `Starting` record for a new job and make it the latest.
    ///
    /// Returns the receiver the job polls for cancellation.
    pub async fn register(&self, job_id: JobId, total_photos: u32) -> watch::Receiver<bool> {
        let (cancel, cancel_rx) = watch::channel(false);
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(
            job_id.clone(),
            JobEntry {
                status: JobStatus::starting(job_id.clone(), total_photos),
                cancel,
                seq,
            },
        );
        inner.latest = Some(job_id);
        inner.evict_finished();
        cancel_rx
    }

    /// Replace a job's status with `next(current)`.
    ///
    /// Returns the new snapshot, or `None` for an unknown job.
    pub async fn update<F>(&self, job_id: &JobId, next: F) -> Option<JobStatus>
    where
        F: FnOnce(&JobStatus) -> JobStatus,
    {
        let mut inner = self.inner.write().await;
        let entry = inner.jobs.get_mut(job_id)?;
        entry.status = next(&entry.status);
        Some(entry.status.clone())
    }

    /// Snapshot of one job.
    pub async fn status(&self, job_id: &JobId) -> Option<JobStatus> {
        let inner = self.inner.read().await;
        inner.jobs.get(job_id).map(|e| e.status.clone())
    }

    /// Snapshot of the most recently submitted job, `Idle` if none.
    pub async fn latest(&self) -> JobStatus {
        let inner = self.inner.read().await;
        inner
            .latest
            .as_ref()
            .and_then(|id| inner.jobs.get(id))
            .map(|e| e.status.clone())
            .unwrap_or_else(JobStatus::idle)
    }

    /// Ask a job to stop before it starts encoding.
    ///
    /// Returns `false` for unknown or already finished jobs.
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        let inner = self.inner.read().await;
        match inner.jobs.get(job_id) {
            Some(entry) if !entry.status.is_terminal() => {
                entry.cancel.send_replace(true);
                true
            }
            _ => false,
        }
    }

    /// Number of jobs currently tracked.
    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::JobState;

    #[tokio::test]
    async fn test_latest_is_idle_before_any_job() {
        let registry = JobRegistry::new();
        let status = registry.latest().await;
        assert_eq!(status.state, JobState::Idle);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_and_update() {
        let registry = JobRegistry::new();
        let id = JobId::new();
        let _cancel = registry.register(id.clone(), 3).await;

        let status = registry.status(&id).await.unwrap();
        assert_eq!(status.state, JobState::Starting);
        assert_eq!(status.message, "Initializing...");
        assert_eq!(status.photos.total, 3);

        let next = registry
            .update(&id, |s| s.advanced(40, "Processing photo 2 of 3...", None))
            .await
            .unwrap();
        assert_eq!(next.state, JobState::Processing);
        assert_eq!(registry.latest().await, next);
    }

    #[tokio::test]
    async fn test_jobs_are_isolated() {
        let registry = JobRegistry::new();
        let first = JobId::new();
        let second = JobId::new();
        let _a = registry.register(first.clone(), 1).await;
        let _b = registry.register(second.clone(), 2).await;

        // A late write from the first job does not leak into the second
        registry.update(&first, |s| s.failed("boom")).await;

        assert_eq!(registry.status(&first).await.unwrap().state, JobState::Error);
        assert_eq!(registry.latest().await.state, JobState::Starting);
        assert_eq!(registry.latest().await.job_id, Some(second));
        assert!(registry.update(&JobId::new(), |s| s.clone()).await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_flips_flag_until_terminal() {
        let registry = JobRegistry::new();
        let id = JobId::new();
        let cancel = registry.register(id.clone(), 1).await;

        assert!(!*cancel.borrow());
        assert!(registry.cancel(&id).await);
        assert!(*cancel.borrow());

        registry.update(&id, |s| s.failed("Generation cancelled")).await;
        assert!(!registry.cancel(&id).await);
        assert!(!registry.cancel(&JobId::new()).await);
    }

    #[tokio::test]
    async fn test_old_finished_jobs_are_evicted() {
        let registry = JobRegistry::new();
        let running = JobId::new();
        let _running = registry.register(running.clone(), 1).await;

        let mut finished = Vec::new();
        for _ in 0..RETAINED_FINISHED_JOBS + 8 {
            let id = JobId::new();
            let _cancel = registry.register(id.clone(), 1).await;
            registry.update(&id, |s| s.failed("boom")).await;
            finished.push(id);
        }
        let last = JobId::new();
        let _last = registry.register(last.clone(), 1).await;

        // Retained finished jobs, plus the running one and the latest
        assert_eq!(registry.len().await, RETAINED_FINISHED_JOBS + 2);
        assert!(registry.status(&running).await.is_some());
        assert_eq!(registry.latest().await.job_id, Some(last));

        let (evicted, kept) = finished.split_at(8);
        for id in evicted {
            assert!(registry.status(id).await.is_none());
        }
        for id in kept {
            assert_eq!(registry.status(id).await.unwrap().state, JobState::Error);
        }
    }

    #[tokio::test]
    async fn test_finished_latest_is_never_evicted() {
        let registry = JobRegistry::new();
        for _ in 0..RETAINED_FINISHED_JOBS + 3 {
            let id = JobId::new();
            let _cancel = registry.register(id.clone(), 1).await;
            registry.update(&id, |s| s.failed("boom")).await;
        }

        let latest = registry.latest().await;
        assert_eq!(latest.state, JobState::Error);
        assert!(registry.len().await <= RETAINED_FINISHED_JOBS + 1);
    }
}
