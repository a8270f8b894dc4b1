//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Upper bound on a single ffprobe invocation.
const PROBE_TIMEOUT_SECS: u64 = 15;

/// Media file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// First audio stream codec, if any
    pub audio_codec: Option<String>,
    /// Whether a video stream is present
    pub has_video: bool,
}

impl MediaInfo {
    /// Whether the file carries a decodable audio stream.
    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
}

/// Probe a media file for information.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let probe = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(Duration::from_secs(PROBE_TIMEOUT_SECS), probe)
        .await
        .map_err(|_| MediaError::Timeout(PROBE_TIMEOUT_SECS))??;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("ffprobe could not read {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

fn parse_probe_output(stdout: &[u8]) -> MediaResult<MediaInfo> {
    let parsed: FfprobeOutput = serde_json::from_slice(stdout)?;

    let duration = parsed
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let audio_codec = parsed
        .streams
        .iter()
        .find(|s| s.codec_type == "audio")
        .map(|s| s.codec_name.clone().unwrap_or_else(|| "unknown".to_string()));

    let has_video = parsed.streams.iter().any(|s| s.codec_type == "video");

    Ok(MediaInfo {
        duration,
        audio_codec,
        has_video,
    })
}
