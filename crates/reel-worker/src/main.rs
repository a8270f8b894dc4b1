//! Event reel generation binary.
//!
//! Reads one job from the environment, runs it, and logs status snapshots
//! until it finishes. The final snapshot is printed as JSON on stdout.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use reel_models::{GenerationRequest, JobState, PrivacyMode};
use reel_worker::{init_tracing, ReelConfig, ReelService};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();
    info!("Starting reel-worker");

    let config = ReelConfig::from_env();
    info!("Reel config: {:?}", config);

    let request = match request_from_env() {
        Ok(r) => r,
        Err(e) => {
            error!("Invalid job request: {}", e);
            std::process::exit(2);
        }
    };

    let service = match ReelService::from_config(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize reel service: {}", e);
            std::process::exit(1);
        }
    };

    let job_id = match service.submit(request).await {
        Ok(id) => id,
        Err(e) => {
            error!("Request rejected: {}", e);
            std::process::exit(2);
        }
    };

    // Log every status change until the job is terminal
    let mut last_seq = None;
    let status = loop {
        let Some(status) = service.status(&job_id).await else {
            error!("Job {} disappeared from the registry", job_id);
            std::process::exit(1);
        };
        if last_seq != Some(status.event_seq) {
            info!(
                job_id = %job_id,
                state = status.state.as_str(),
                progress = status.progress,
                "{}", status.message
            );
            last_seq = Some(status.event_seq);
        }
        if status.is_terminal() {
            break status;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    match serde_json::to_string_pretty(&status) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize final status: {}", e),
    }

    if status.state == JobState::Error {
        std::process::exit(1);
    }
    info!("reel-worker finished");
}

/// `REEL_SOURCE_DIR`, `REEL_EVENT_NAME` and optional `REEL_PRIVACY_MODE`.
fn request_from_env() -> Result<GenerationRequest, String> {
    let source = std::env::var("REEL_SOURCE_DIR")
        .map(PathBuf::from)
        .map_err(|_| "REEL_SOURCE_DIR is not set".to_string())?;
    let event_name =
        std::env::var("REEL_EVENT_NAME").map_err(|_| "REEL_EVENT_NAME is not set".to_string())?;
    let mode = match std::env::var("REEL_PRIVACY_MODE") {
        Ok(raw) => raw.parse::<PrivacyMode>().map_err(|e| e.to_string())?,
        Err(_) => PrivacyMode::default(),
    };
    Ok(GenerationRequest::new(source, event_name, mode))
}
