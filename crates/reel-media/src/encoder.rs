//! Timeline encoding.
//!
//! Slides are written as PNG stills into a scratch directory and stitched
//! by a single FFmpeg invocation whose filter graph applies the zoom, quote
//! overlays and fades. The video is written under a hidden partial name and
//! only renamed to its final name once FFmpeg exits cleanly.

use async_trait::async_trait;
use reel_models::EncodingConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{audio_chain, concat_filter, slide_chain, SlideInputs};
use crate::fs_utils::{move_into_place, partial_path, remove_if_exists};
use crate::progress::RenderProgress;
use crate::slide::Slide;
use crate::timeline::Timeline;

/// Suffix appended to every output file name.
pub const OUTPUT_SUFFIX: &str = "_Inspiration.mp4";

/// Renders a timeline to a single video file.
#[async_trait]
pub trait TimelineRenderer: Send + Sync {
    /// Encode `timeline` into `output_dir` and return the file path.
    ///
    /// `progress` receives the fraction (`0.0..=1.0`) of the encode done.
    async fn render(
        &self,
        timeline: Timeline,
        output_dir: &Path,
        event_name: &str,
        progress: RenderProgress,
    ) -> MediaResult<PathBuf>;
}

/// `"Spring Picnic"` → `"Spring_Picnic_Inspiration.mp4"`.
///
/// Whitespace and path separators become underscores.
pub fn output_file_name(event_name: &str) -> String {
    let stem: String = event_name
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let stem = if stem.is_empty() { "Event".to_string() } else { stem };
    format!("{}{}", stem, OUTPUT_SUFFIX)
}

/// Still images backing one timeline.
#[derive(Debug, Clone)]
struct SlideFrames {
    canvas: PathBuf,
    overlay: Option<PathBuf>,
}

/// FFmpeg-backed [`TimelineRenderer`].
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    encoding: EncodingConfig,
    timeout_secs: Option<u64>,
    scratch_root: Option<PathBuf>,
}

impl FfmpegEncoder {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            encoding,
            timeout_secs: None,
            scratch_root: None,
        }
    }

    /// Kill FFmpeg if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        self.timeout_secs
    }

    /// Put slide stills under `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(dir.into());
        self
    }

    pub fn encoding(&self) -> &EncodingConfig {
        &self.encoding
    }

    fn scratch_dir(&self) -> MediaResult<TempDir> {
        let dir = match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                tempfile::Builder::new().prefix("reel-frames-").tempdir_in(root)?
            }
            None => tempfile::Builder::new().prefix("reel-frames-").tempdir()?,
        };
        Ok(dir)
    }

    /// Assemble the FFmpeg invocation for `timeline`.
    fn build_command(&self, timeline: &Timeline, frames: &[SlideFrames], output: &Path) -> MediaResult<FfmpegCommand> {
        if timeline.is_empty() {
            return Err(MediaError::EmptyTimeline);
        }
        if frames.len() != timeline.slides().len() {
            return Err(MediaError::internal("slide stills do not match timeline"));
        }

        let fps = self.encoding.fps;
        let mut cmd = FfmpegCommand::new(output);
        let mut chains = Vec::with_capacity(timeline.slides().len() + 2);

        for (n, (slide, still)) in timeline.slides().iter().zip(frames).enumerate() {
            let canvas = cmd.input_count();
            cmd = add_canvas_input(cmd, slide, &still.canvas, fps);

            let overlay = match (slide.overlay(), &still.overlay) {
                (Some(quote), Some(path)) => {
                    let index = cmd.input_count();
                    cmd = cmd.looped_image(path, quote.duration, fps);
                    Some(index)
                }
                _ => None,
            };

            chains.push(slide_chain(
                n,
                slide,
                SlideInputs { canvas, overlay },
                fps,
                &self.encoding.pixel_format,
            ));
        }
        chains.push(concat_filter(timeline.slides().len()));

        let total = timeline.total_duration();
        if let Some(audio) = timeline.audio() {
            let index = cmd.input_count();
            cmd = cmd.looped_audio(audio.path());
            chains.push(audio_chain(index, total, audio.fade_out()));
        }

        cmd = cmd.filter_complex(chains.join(";")).map("[vout]");
        if timeline.audio().is_some() {
            cmd = cmd.map("[aout]");
        }

        cmd = cmd.output_args(self.encoding.video_args());
        if timeline.audio().is_some() {
            cmd = cmd.output_args(self.encoding.audio_args());
        }

        Ok(cmd
            .output_args(["-movflags", "+faststart"])
            .duration(total)
            .format("mp4"))
    }
}

fn add_canvas_input(cmd: FfmpegCommand, slide: &Slide, path: &Path, fps: u32) -> FfmpegCommand {
    if slide.zoom().is_some() {
        // zoompan expands a single frame into the whole slide
        cmd.input(path)
    } else {
        cmd.looped_image(path, slide.duration(), fps)
    }
}

/// Write every slide (and quote banner) as PNG into `dir`.
fn write_frames(timeline: &Timeline, dir: &Path) -> MediaResult<Vec<SlideFrames>> {
    timeline
        .slides()
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            let canvas = dir.join(format!("slide_{:03}.png", i));
            slide.canvas().save(&canvas)?;

            let overlay = match slide.overlay() {
                Some(quote) => {
                    let path = dir.join(format!("quote_{:03}.png", i));
                    quote.image.save(&path)?;
                    Some(path)
                }
                None => None,
            };

            Ok(SlideFrames { canvas, overlay })
        })
        .collect()
}

#[async_trait]
impl TimelineRenderer for FfmpegEncoder {
    async fn render(
        &self,
        timeline: Timeline,
        output_dir: &Path,
        event_name: &str,
        progress: RenderProgress,
    ) -> MediaResult<PathBuf> {
        if timeline.is_empty() {
            return Err(MediaError::EmptyTimeline);
        }

        tokio::fs::create_dir_all(output_dir).await?;
        let output = output_dir.join(output_file_name(event_name));
        let partial = partial_path(&output);

        let scratch = self.scratch_dir()?;
        let scratch_path = scratch.path().to_path_buf();
        let (timeline, frames) = tokio::task::spawn_blocking(move || {
            write_frames(&timeline, &scratch_path).map(|frames| (timeline, frames))
        })
        .await
        .map_err(|e| MediaError::internal(format!("frame writer panicked: {}", e)))??;

        let cmd = self.build_command(&timeline, &frames, &partial)?;
        let total_ms = (timeline.total_duration() * 1000.0) as i64;

        info!(
            output = %output.display(),
            slides = timeline.slides().len(),
            duration_secs = timeline.total_duration(),
            audio = timeline.audio().is_some(),
            "Encoding timeline"
        );

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }

        let report = Arc::clone(&progress);
        let result = runner
            .run_with_progress(&cmd, move |p| report(p.fraction(total_ms)))
            .await;

        if let Err(e) = result {
            warn!(output = %output.display(), "Encoding failed: {}", e.detailed_message());
            if let Err(cleanup) = remove_if_exists(&partial).await {
                warn!(path = %partial.display(), "Failed to remove partial output: {}", cleanup);
            }
            return Err(e);
        }

        if let Err(e) = move_into_place(&partial, &output).await {
            let _ = remove_if_exists(&partial).await;
            return Err(e);
        }

        progress(1.0);
        debug!(output = %output.display(), "Encoding complete");
        drop(scratch);

        Ok(output)
    }
}
