//! Event reel generation worker.
//!
//! Turns a folder of event photos into a short promotional video:
//! face redaction, slide composition, background audio and a single FFmpeg
//! encode, run as a background job whose status can be polled at any time.

pub mod assets;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod service;

pub use config::ReelConfig;
pub use error::{SubmitError, WorkerError, WorkerResult};
pub use logging::{init_tracing, JobLogger};
pub use pipeline::{GenerationJob, JobOutput, PipelineContext};
pub use progress::{ProgressReporter, ProgressUpdate};
pub use registry::JobRegistry;
pub use service::ReelService;
