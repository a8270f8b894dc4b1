//! Background music retrieval.
//!
//! The track is downloaded once, cached on disk, and probed before use.
//! Nothing in here can fail a job: every problem is logged and turns into
//! "no audio".

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{move_into_place, partial_path, remove_if_exists};
use crate::probe::probe_media;

/// Default music bed.
pub const DEFAULT_AUDIO_URL: &str = "https://www.chosic.com/wp-content/uploads/2021/05/Inspiring-Story.mp3";

/// Default download timeout.
pub const DEFAULT_AUDIO_TIMEOUT_SECS: u64 = 30;

/// Cached, validated background audio.
pub struct BackgroundAudio {
    url: String,
    cache_path: PathBuf,
    timeout: Duration,
    client: reqwest::Client,
    /// Serializes downloads so concurrent jobs fetch at most once
    fetch_lock: Mutex<()>,
}

impl std::fmt::Debug for BackgroundAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundAudio")
            .field("url", &self.url)
            .field("cache_path", &self.cache_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BackgroundAudio {
    pub fn new(url: impl Into<String>, cache_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            cache_path: cache_path.into(),
            timeout,
            client: reqwest::Client::new(),
            fetch_lock: Mutex::new(()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Path to a playable track, or `None` when audio is unavailable.
    pub async fn fetch(&self) -> Option<PathBuf> {
        let path = match self.ensure_cached().await {
            Ok(path) => path,
            Err(e) => {
                warn!(url = %self.url, "Background audio unavailable, continuing silently: {}", e);
                return None;
            }
        };

        match probe_media(&path).await {
            Ok(info) if info.has_audio() => {
                debug!(path = %path.display(), duration = info.duration, "Background audio ready");
                Some(path)
            }
            Ok(_) => {
                warn!(path = %path.display(), "Cached audio has no audio stream, discarding");
                let _ = remove_if_exists(&path).await;
                None
            }
            Err(e) => {
                warn!(path = %path.display(), "Cached audio could not be probed, discarding: {}", e);
                let _ = remove_if_exists(&path).await;
                None
            }
        }
    }

    /// Download the track unless the cache already has it.
    pub async fn ensure_cached(&self) -> MediaResult<PathBuf> {
        let _guard = self.fetch_lock.lock().await;

        if tokio::fs::metadata(&self.cache_path)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false)
        {
            return Ok(self.cache_path.clone());
        }

        let partial = partial_path(&self.cache_path);
        match self.download(&partial).await {
            Ok(bytes) => {
                move_into_place(&partial, &self.cache_path).await?;
                info!(url = %self.url, bytes, "Cached background audio");
                Ok(self.cache_path.clone())
            }
            Err(e) => {
                let _ = remove_if_exists(&partial).await;
                Err(e)
            }
        }
    }

    async fn download(&self, dest: &Path) -> MediaResult<u64> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let timed_out = |_| MediaError::Timeout(self.timeout.as_secs());
        tokio::time::timeout(self.timeout, self.stream_to(dest))
            .await
            .map_err(timed_out)?
    }

    async fn stream_to(&self, dest: &Path) -> MediaResult<u64> {
        let mut response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!("HTTP {} from {}", status, self.url)));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MediaError::download_failed(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(MediaError::download_failed("empty response body"));
        }
        Ok(written)
    }
}
