//! FFmpeg filter graph fragments for slide timelines.
//!
//! Each slide becomes one chain ending in `[v{n}]`; the chains are
//! concatenated and the audio bed is trimmed and faded to match.

use reel_models::encoding::{CANVAS_HEIGHT, CANVAS_WIDTH};

use crate::slide::{Fade, QuoteOverlay, Slide, Zoom};

/// Supersampling factor for `zoompan`; avoids the visible stair-stepping
/// zoompan shows when cropping at canvas resolution.
const ZOOM_SUPERSAMPLE: u32 = 2;

/// Seconds formatted the way FFmpeg expressions expect.
fn secs(value: f64) -> String {
    format!("{:.3}", value.max(0.0))
}

/// Number of output frames for `duration` seconds.
pub fn frame_count(duration: f64, fps: u32) -> u32 {
    ((duration * fps as f64).round() as u32).max(1)
}

/// `fade` in and out for a segment of `duration` seconds.
pub fn fade_filters(fade: Fade, duration: f64, alpha: bool) -> String {
    let alpha = if alpha { ":alpha=1" } else { "" };
    let fade_in = fade.fade_in.min(duration);
    let fade_out = fade.fade_out.min(duration);
    format!(
        "fade=t=in:st=0:d={}{alpha},fade=t=out:st={}:d={}{alpha}",
        secs(fade_in),
        secs(duration - fade_out),
        secs(fade_out),
        alpha = alpha,
    )
}

/// Centered linear zoom over a still image input.
pub fn zoompan_filters(zoom: Zoom, duration: f64, fps: u32) -> String {
    let frames = frame_count(duration, fps);
    let last = frames.saturating_sub(1).max(1);
    format!(
        "scale={sw}:{sh},zoompan=z='{from}+{delta}*on/{last}':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d={frames}:s={w}x{h}:fps={fps}",
        sw = CANVAS_WIDTH * ZOOM_SUPERSAMPLE,
        sh = CANVAS_HEIGHT * ZOOM_SUPERSAMPLE,
        from = format!("{:.4}", zoom.from),
        delta = format!("{:.4}", zoom.to - zoom.from),
        last = last,
        frames = frames,
        w = CANVAS_WIDTH,
        h = CANVAS_HEIGHT,
        fps = fps,
    )
}

/// Input indices of one slide's streams.
#[derive(Debug, Clone, Copy)]
pub struct SlideInputs {
    pub canvas: usize,
    pub overlay: Option<usize>,
}

/// Full chain for slide `n`, ending in `[v{n}]`.
pub fn slide_chain(n: usize, slide: &Slide, inputs: SlideInputs, fps: u32, pixel_format: &str) -> String {
    let duration = slide.duration();
    let finish = format!(
        "{},setsar=1,format={}[v{}]",
        fade_filters(slide.fade(), duration, false),
        pixel_format,
        n
    );

    let base = match slide.zoom() {
        Some(zoom) => format!("[{}:v]{}", inputs.canvas, zoompan_filters(zoom, duration, fps)),
        None => format!("[{}:v]fps={}", inputs.canvas, fps),
    };

    match (slide.overlay(), inputs.overlay) {
        (Some(overlay), Some(index)) => format!(
            "{base}[base{n}];{quote};[base{n}][quote{n}]overlay=x=(W-w)/2:y={y}:eof_action=pass,{finish}",
            base = base,
            quote = quote_chain(n, index, overlay),
            y = overlay.y,
            finish = finish,
            n = n,
        ),
        _ => format!("{},{}", base, finish),
    }
}

fn quote_chain(n: usize, input: usize, overlay: &QuoteOverlay) -> String {
    format!(
        "[{}:v]format=rgba,{}[quote{}]",
        input,
        fade_filters(overlay.fade, overlay.duration, true),
        n
    )
}

/// `[v0]…[v{count-1}]concat=…[vout]`.
pub fn concat_filter(count: usize) -> String {
    let labels: String = (0..count).map(|i| format!("[v{}]", i)).collect();
    format!("{}concat=n={}:v=1:a=0[vout]", labels, count)
}

/// Trim a looped audio input to `total` seconds and fade out its tail.
pub fn audio_chain(input: usize, total: f64, fade_out: f64) -> String {
    format!(
        "[{}:a]atrim=duration={},asetpts=PTS-STARTPTS,afade=t=out:st={}:d={}[aout]",
        input,
        secs(total),
        secs(total - fade_out),
        secs(fade_out)
    )
}
