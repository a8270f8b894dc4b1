//! Photo discovery.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::SubmitError;

/// Extensions accepted as photos (compared case-insensitively).
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Whether `path` has a photo extension.
pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PHOTO_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)))
        .unwrap_or(false)
}

/// Candidate photos in `folder`, ordered by file name.
///
/// Only direct children are considered. An empty result is a rejection:
/// no job is created for a folder without photos.
pub async fn enumerate_photos(folder: &Path) -> Result<Vec<PathBuf>, SubmitError> {
    let metadata = fs::metadata(folder)
        .await
        .map_err(|_| SubmitError::FolderNotFound(folder.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(SubmitError::FolderNotFound(folder.to_path_buf()));
    }

    let mut photos = Vec::new();
    let mut entries = fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_photo(&path) {
            continue;
        }
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }
        photos.push(path);
    }

    if photos.is_empty() {
        return Err(SubmitError::NoPhotos(folder.to_path_buf()));
    }

    photos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(photos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_photo() {
        assert!(is_photo(Path::new("a.jpg")));
        assert!(is_photo(Path::new("B.JPEG")));
        assert!(is_photo(Path::new("/x/c.Png")));
        assert!(!is_photo(Path::new("notes.txt")));
        assert!(!is_photo(Path::new("jpg")));
        assert!(!is_photo(Path::new("photo.heic")));
    }

    #[tokio::test]
    async fn test_enumerate_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["c.png", "a.JPG", "b.jpeg", "readme.md", "clip.mp4"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let photos = enumerate_photos(dir.path()).await.unwrap();
        let names: Vec<_> = photos
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.jpeg", "c.png"]);
    }

    #[tokio::test]
    async fn test_empty_folder_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        assert!(matches!(
            enumerate_photos(dir.path()).await,
            Err(SubmitError::NoPhotos(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_folder_is_rejected() {
        assert!(matches!(
            enumerate_photos(Path::new("/no/such/folder")).await,
            Err(SubmitError::FolderNotFound(_))
        ));
    }
}
