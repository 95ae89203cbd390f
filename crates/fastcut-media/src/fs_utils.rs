//! Local directory management for sources, temp files and rendered outputs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use fastcut_engine::traits::FileStore;

use crate::fetch::is_fetched_source;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm"];

fn is_video_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.to_string_lossy().to_lowercase().as_str()))
}

/// [`FileStore`] over one temp directory and one output tree with a
/// subdirectory per platform.
pub struct LocalFileStore {
    temp_dir: PathBuf,
    output_dir: PathBuf,
    platforms: Vec<String>,
}

impl LocalFileStore {
    pub fn new(
        temp_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        platforms: Vec<String>,
    ) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
            platforms,
        }
    }

    async fn remove_dir_contents(dir: &Path) -> u32 {
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return 0;
        };

        let mut removed = 0u32;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let result = if path.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }
        removed
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn existing_videos(&self) -> Vec<PathBuf> {
        let Ok(mut entries) = tokio::fs::read_dir(&self.temp_dir).await else {
            return Vec::new();
        };

        let mut videos = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.is_file() && is_video_file(&path) {
                videos.push(path);
            }
        }
        videos.sort();
        debug!("{} existing videos in {}", videos.len(), self.temp_dir.display());
        videos
    }

    async fn create_directories(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        for platform in &self.platforms {
            tokio::fs::create_dir_all(self.output_dir.join(platform)).await?;
        }
        Ok(())
    }

    async fn cleanup_temp_videos(&self) {
        let Ok(mut entries) = tokio::fs::read_dir(&self.temp_dir).await else {
            return;
        };

        let mut removed = 0u32;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.is_file()
                && is_fetched_source(&path)
                && tokio::fs::remove_file(&path).await.is_ok()
            {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Removed {} downloaded source videos", removed);
        }
    }

    async fn clear_outputs(&self) {
        let outputs = Self::remove_dir_contents(&self.output_dir).await;
        let temps = Self::remove_dir_contents(&self.temp_dir).await;
        info!("Cleared {} output entries and {} temp entries", outputs, temps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp: &TempDir, out: &TempDir) -> LocalFileStore {
        LocalFileStore::new(
            temp.path(),
            out.path(),
            vec!["tiktok".to_string(), "youtube_shorts".to_string()],
        )
    }

    #[tokio::test]
    async fn test_create_directories_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let store = store(&temp, &out);

        store.create_directories().await.unwrap();
        store.create_directories().await.unwrap();

        assert!(out.path().join("tiktok").is_dir());
        assert!(out.path().join("youtube_shorts").is_dir());
    }

    #[tokio::test]
    async fn test_existing_videos_filters_by_extension() {
        let temp = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(temp.path().join("b.MKV"), b"x").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"x").unwrap();

        let videos = store(&temp, &out).existing_videos().await;
        assert_eq!(videos.len(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_temp_videos_only_removes_fetched_sources() {
        let temp = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(temp.path().join("fastcut_original_abc.mp4"), b"x").unwrap();
        std::fs::write(temp.path().join("user_supplied.mp4"), b"x").unwrap();

        store(&temp, &out).cleanup_temp_videos().await;

        assert!(!temp.path().join("fastcut_original_abc.mp4").exists());
        assert!(temp.path().join("user_supplied.mp4").exists());
    }

    #[tokio::test]
    async fn test_clear_outputs_empties_both_trees() {
        let temp = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let store = store(&temp, &out);
        store.create_directories().await.unwrap();
        std::fs::write(out.path().join("tiktok").join("clip.mp4"), b"x").unwrap();
        std::fs::write(temp.path().join("left_over.mp4"), b"x").unwrap();

        store.clear_outputs().await;

        assert!(!out.path().join("tiktok").exists());
        assert!(!temp.path().join("left_over.mp4").exists());
    }
}
