//! Structured logging: subscriber setup and per-job logging.

use reel_models::JobId;
use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Info-level logging for the reel crates, added on top of `RUST_LOG`.
const DEFAULT_DIRECTIVES: &[&str] = &["reel_worker=info", "reel_media=info"];

/// Install the global subscriber.
///
/// `LOG_FORMAT=json` selects JSON lines; otherwise human-readable output.
/// `RUST_LOG` directives are honored on top of `reel_worker=info` and
/// `reel_media=info`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Job lifecycle logging with the job ID and event name attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    event_name: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, event_name: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            event_name: event_name.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            event = %self.event_name,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            event = %self.event_name,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            event = %self.event_name,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            event = %self.event_name,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            event = %self.event_name,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Span that every log line of the job runs inside.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "reel_job",
            job_id = %self.job_id,
            event = %self.event_name
        )
    }
}
