//! Video acquisition via yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use fastcut_engine::traits::Fetcher;
use fastcut_models::VideoRef;

/// Sources shorter than this are skipped; they rarely contain enough
/// material to cut highlights from.
const MIN_SOURCE_DURATION_SECS: f64 = 120.0;

/// Filename prefix for fetched source videos in the temp directory.
const SOURCE_PREFIX: &str = "fastcut_original_";

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "avi", "mov"];

#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    #[serde(default)]
    entries: Vec<FlatEntry>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
}

/// Build the videos-tab URL for a channel identifier.
///
/// Accepts a full URL, an `@handle`, or a bare channel id.
fn channel_videos_url(channel: &str) -> String {
    if channel.starts_with("http://") || channel.starts_with("https://") {
        channel.to_string()
    } else if channel.starts_with('@') {
        format!("https://www.youtube.com/{channel}/videos")
    } else {
        format!("https://www.youtube.com/channel/{channel}/videos")
    }
}

fn parse_flat_playlist(raw: &[u8], channel: &str) -> Vec<VideoRef> {
    let playlist: FlatPlaylist = match serde_json::from_slice(raw) {
        Ok(p) => p,
        Err(e) => {
            warn!("Malformed playlist JSON for channel {}: {}", channel, e);
            return Vec::new();
        }
    };

    playlist
        .entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.id?;
            let url = entry
                .url
                .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={id}"));
            Some(VideoRef {
                title: entry.title.unwrap_or_else(|| id.clone()),
                id,
                url,
                duration: entry.duration,
                channel: channel.to_string(),
            })
        })
        .collect()
}

/// yt-dlp backed [`Fetcher`].
///
/// Downloads land in the temp directory under a recognizable prefix so the
/// file store can sweep them after a run.
pub struct YtDlpFetcher {
    temp_dir: PathBuf,
    /// yt-dlp format selector, e.g. "best[height<=720]/best".
    format: String,
}

impl YtDlpFetcher {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            format: "best[height<=720]/best".to_string(),
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Locate the downloaded file for a video id, whatever extension yt-dlp
    /// chose for it.
    async fn find_downloaded(&self, id: &str) -> Option<PathBuf> {
        let expected_stem = format!("{SOURCE_PREFIX}{id}");
        let mut entries = tokio::fs::read_dir(&self.temp_dir).await.ok()?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let stem_matches = path
                .file_stem()
                .is_some_and(|s| s.to_string_lossy() == expected_stem);
            let ext_matches = path
                .extension()
                .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.to_string_lossy().as_ref()));
            if stem_matches && ext_matches {
                return Some(path);
            }
        }
        None
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    async fn list_videos(&self, channel: &str, max_count: usize) -> Vec<VideoRef> {
        if which::which("yt-dlp").is_err() {
            warn!("yt-dlp not found in PATH, cannot list channel {}", channel);
            return Vec::new();
        }

        let url = channel_videos_url(channel);
        debug!("Listing up to {} videos from {}", max_count, url);

        let playlist_end = max_count.to_string();
        let output = Command::new("yt-dlp")
            .args([
                "-J",
                "--flat-playlist",
                "--playlist-end",
                playlist_end.as_str(),
                url.as_str(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                warn!("Failed to run yt-dlp for channel {}: {}", channel, e);
                return Vec::new();
            }
        };

        if !output.status.success() {
            warn!(
                "Listing channel {} failed: {}",
                channel,
                String::from_utf8_lossy(&output.stderr)
            );
            return Vec::new();
        }

        let videos = parse_flat_playlist(&output.stdout, channel);
        info!("Channel {}: {} videos listed", channel, videos.len());
        videos
    }

    async fn fetch_one(&self, video: &VideoRef) -> Option<PathBuf> {
        if let Some(duration) = video.duration {
            if duration < MIN_SOURCE_DURATION_SECS {
                info!(
                    "Skipping '{}': {}s is below the {}s minimum",
                    video.title, duration, MIN_SOURCE_DURATION_SECS
                );
                return None;
            }
        }

        if which::which("yt-dlp").is_err() {
            warn!("yt-dlp not found in PATH, cannot fetch '{}'", video.title);
            return None;
        }

        let id = if video.id.is_empty() { "adhoc" } else { video.id.as_str() };
        let template = self
            .temp_dir
            .join(format!("{SOURCE_PREFIX}%(id)s.%(ext)s"))
            .to_string_lossy()
            .to_string();

        info!("Fetching '{}' ({})", video.title, video.url);
        let output = Command::new("yt-dlp")
            .args([
                "-f",
                self.format.as_str(),
                "--no-playlist",
                "-o",
                template.as_str(),
                video.url.as_str(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                warn!("Failed to run yt-dlp for '{}': {}", video.title, e);
                return None;
            }
        };

        if !output.status.success() {
            warn!(
                "Fetching '{}' failed: {}",
                video.title,
                String::from_utf8_lossy(&output.stderr)
            );
            return None;
        }

        // Ad-hoc URLs carry no id; resolve %(id)s from what landed on disk.
        let found = if video.id.is_empty() {
            self.find_any_downloaded().await
        } else {
            self.find_downloaded(id).await
        };

        match found {
            Some(path) => {
                info!("Fetched '{}' to {}", video.title, path.display());
                Some(path)
            }
            None => {
                warn!("yt-dlp reported success but no file found for '{}'", video.title);
                None
            }
        }
    }

    async fn cleanup(&self) {
        let Ok(mut entries) = tokio::fs::read_dir(&self.temp_dir).await else {
            return;
        };

        let mut removed = 0u32;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_sidecar = name.ends_with(".info.json")
                || name.ends_with(".vtt")
                || name.ends_with(".srt")
                || name.ends_with(".part");
            if is_sidecar && tokio::fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Removed {} fetch sidecar files", removed);
        }
    }
}

impl YtDlpFetcher {
    /// Most recently modified fetched video, for downloads without a known id.
    async fn find_any_downloaded(&self) -> Option<PathBuf> {
        let mut entries = tokio::fs::read_dir(&self.temp_dir).await.ok()?;
        let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let prefixed = path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with(SOURCE_PREFIX));
            let ext_matches = path
                .extension()
                .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.to_string_lossy().as_ref()));
            if !prefixed || !ext_matches {
                continue;
            }

            let modified = entry
                .metadata()
                .await
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
                newest = Some((modified, path));
            }
        }

        newest.map(|(_, path)| path)
    }
}

/// Whether a path looks like a fetched source video.
pub fn is_fetched_source(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with(SOURCE_PREFIX))
}
