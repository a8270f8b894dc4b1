//! Ordered slide sequence plus optional background audio.

use std::path::{Path, PathBuf};

use crate::slide::Slide;

/// Fade-out applied to the end of the background audio.
pub const AUDIO_FADE_OUT_SECS: f64 = 2.0;

/// Background music for a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    path: PathBuf,
    fade_out: f64,
}

impl AudioTrack {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fade-out length, never longer than the timeline itself.
    pub fn fade_out(&self) -> f64 {
        self.fade_out
    }
}

/// Slides in playback order: title, photos, call-to-action.
///
/// Built once by [`TimelineAssembler::assemble`] and handed to the encoder.
#[derive(Debug, Clone)]
pub struct Timeline {
    slides: Vec<Slide>,
    audio: Option<AudioTrack>,
}

impl Timeline {
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }

    /// Sum of all slide durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.slides.iter().map(Slide::duration).sum()
    }

    /// Number of photo slides.
    pub fn photo_count(&self) -> usize {
        self.slides.iter().filter(|s| s.is_photo()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// Concatenates slides and attaches the audio bed.
pub struct TimelineAssembler;

impl TimelineAssembler {
    /// `[title, photos…, cta]`, with `audio` held to the total duration.
    ///
    /// Photo slides keep exactly the order they were given in.
    pub fn assemble(title: Slide, photos: Vec<Slide>, cta: Slide, audio: Option<PathBuf>) -> Timeline {
        let mut slides = Vec::with_capacity(photos.len() + 2);
        slides.push(title);
        slides.extend(photos);
        slides.push(cta);

        let total: f64 = slides.iter().map(Slide::duration).sum();
        let audio = audio.map(|path| AudioTrack {
            path,
            fade_out: AUDIO_FADE_OUT_SECS.min(total),
        });

        Timeline { slides, audio }
    }
}
