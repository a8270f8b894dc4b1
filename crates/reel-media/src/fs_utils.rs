//! Filesystem helpers for publishing finished artifacts.
//!
//! Renders and downloads are written to a scratch name first and only moved
//! to their final name once complete, so a half-written file never carries
//! the name a caller is waiting for.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Hidden sibling path used while `final_path` is still being written.
///
/// The extension is preserved so tools that sniff it keep working.
pub fn partial_path(final_path: &Path) -> PathBuf {
    let file_name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    final_path.with_file_name(format!(".partial-{}", file_name))
}

/// Move `src` to `dst`, falling back to copy + delete across filesystems.
pub async fn move_into_place(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                src = %src.display(),
                dst = %dst.display(),
                "Cross-device rename, copying instead"
            );
            copy_then_remove(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Remove a file if it exists, ignoring "not found".
pub async fn remove_if_exists(path: impl AsRef<Path>) -> MediaResult<()> {
    match fs::remove_file(path.as_ref()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// EXDEV (cross-device link) is error code 18 on Linux and macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_then_remove(src: &Path, dst: &Path) -> MediaResult<()> {
    // Copy next to the destination so the final rename stays on one filesystem
    let staged = partial_path(dst);
    fs::copy(src, &staged).await?;

    if let Err(e) = fs::rename(&staged, dst).await {
        let _ = fs::remove_file(&staged).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(src = %src.display(), "Failed to remove source after copy: {}", e);
    }

    Ok(())
}
