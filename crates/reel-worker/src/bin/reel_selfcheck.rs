use std::path::Path;

use reel_media::{check_ffmpeg, check_ffprobe, DetectorSet, TextRenderer};
use reel_worker::ReelConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ReelConfig::from_env();

    println!(
        "reel-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_tools()?;
    ensure_cascades(config.cascade_dir.as_deref())?;
    report_typeface(config.font_path.as_deref());

    match &config.audio_url {
        Some(url) => println!("reel-selfcheck: background audio from {}", url),
        None => println!("reel-selfcheck: background audio disabled"),
    }

    println!("reel-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path.join("frames")).await?;
    tokio::fs::create_dir_all(path.join("audio")).await?;
    Ok(())
}

fn ensure_tools() -> anyhow::Result<()> {
    check_ffmpeg().map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;
    check_ffprobe().map_err(|e| anyhow::anyhow!("ffprobe not available: {}", e))?;
    Ok(())
}

fn ensure_cascades(preferred: Option<&Path>) -> anyhow::Result<()> {
    let detectors = DetectorSet::haar_cascades(preferred)
        .map_err(|e| anyhow::anyhow!("face detection unavailable: {}", e))?;
    println!("reel-selfcheck: face detectors {:?}", detectors);
    Ok(())
}

fn report_typeface(preferred: Option<&Path>) {
    let text = TextRenderer::load(preferred);
    println!("reel-selfcheck: typeface {}", text.typeface_name());
}
