//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// FFmpeg's own log verbosity; progress comes from `-progress` regardless.
const LOG_LEVEL: &str = "error";

/// Number of diagnostic stderr lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 12;

/// Keys FFmpeg emits on its `-progress` stream.
const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// One `-i` input together with the arguments that precede it.
#[derive(Debug, Clone)]
struct FfmpegInput {
    args: Vec<String>,
    path: PathBuf,
}

/// Builder for FFmpeg commands with any number of inputs.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs in `-i` order (index `n` is addressable as `[n:v]` / `[n:a]`)
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after all inputs)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add an input with no extra arguments.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(Vec::<String>::new(), path)
    }

    /// Add an input preceded by input arguments.
    pub fn input_with_args<I, S>(mut self, args: I, path: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(FfmpegInput {
            args: args.into_iter().map(Into::into).collect(),
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    /// Add a still image looped into a stream of `seconds` at `fps`.
    pub fn looped_image(self, path: impl AsRef<Path>, seconds: f64, fps: u32) -> Self {
        self.input_with_args(
            [
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                fps.to_string(),
                "-t".to_string(),
                format!("{:.3}", seconds),
            ],
            path,
        )
    }

    /// Add an audio input repeated indefinitely (trimmed by the filter graph).
    pub fn looped_audio(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(["-stream_loop", "-1"], path)
    }

    /// Number of inputs added so far.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream or filter label into the output.
    pub fn map(self, label: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(label)
    }

    /// Limit output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Force the output container format.
    pub fn format(self, format: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(format)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(LOG_LEVEL.to_string());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());
        args.push("-nostats".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking.
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command with progress callback.
    ///
    /// Non-progress stderr lines are kept and attached to the error when
    /// FFmpeg exits unsuccessfully.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        let stderr_handle = tokio::spawn(async move {
            let mut current_progress = FfmpegProgress::default();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                match parse_progress_line(&line, &mut current_progress) {
                    ProgressLine::Snapshot(progress) => progress_callback(progress),
                    ProgressLine::Field => {}
                    ProgressLine::Diagnostic => {
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line);
                    }
                }
            }

            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let status = self.wait_for_completion(&mut child).await;
        let diagnostics = stderr_handle.await.unwrap_or_default();

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(diagnostics).filter(|s| !s.trim().is_empty()),
                status.code(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Wait for child process with optional timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        let Some(timeout_secs) = self.timeout_secs else {
            return Ok(child.wait().await?);
        };

        let waited = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await;
        match waited {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(timeout_secs))
            }
        }
    }
}

/// Classification of one stderr line.
#[derive(Debug)]
enum ProgressLine {
    /// End of a progress block; carries the accumulated snapshot
    Snapshot(FfmpegProgress),
    /// A progress field folded into the running snapshot
    Field,
    /// Anything else FFmpeg printed
    Diagnostic,
}

/// Parse a progress line from FFmpeg's -progress output.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> ProgressLine {
    let line = line.trim();

    let Some((key, value)) = line.split_once('=') else {
        return ProgressLine::Diagnostic;
    };
    let key = key.trim();
    let value = value.trim();

    if !PROGRESS_KEYS.contains(&key) && !key.starts_with("stream_") {
        return ProgressLine::Diagnostic;
    }

    match key {
        "out_time_ms" | "out_time_us" => {
            // Both keys carry microseconds in current FFmpeg releases
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "out_time" => {
            current.out_time = value.to_string();
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "fps" => {
            if let Ok(fps) = value.parse() {
                current.fps = fps;
            }
        }
        "speed" => {
            // Format: "1.5x" or "N/A"
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            return ProgressLine::Snapshot(current.clone());
        }
        _ => {}
    }

    ProgressLine::Field
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
