//! Capability traits consumed by the engine and pipeline.
//!
//! Every external collaborator (fetching, media probing, signal analysis,
//! rendering, transcription, local file management) sits behind one of these
//! traits so the pipeline can be wired with production adapters or in-memory
//! fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use fastcut_models::{
    Clip, PlatformSpec, SpeechSegment, TimelinePoint, VideoInfo, VideoRef, WordSpan,
};

/// Extracts the audio track of a video into a temporary file.
///
/// Extraction is the hard prerequisite of detection: failure here aborts the
/// whole video's analysis.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract_audio(&self, video: &Path) -> anyhow::Result<PathBuf>;
}

/// Produces a normalized audio-energy timeline from an extracted audio file.
#[async_trait]
pub trait EnergyAnalyzer: Send + Sync {
    async fn energy_timeline(&self, audio: &Path) -> anyhow::Result<Vec<TimelinePoint>>;
}

/// Detects non-silence intervals in an extracted audio file.
#[async_trait]
pub trait SpeechDetector: Send + Sync {
    async fn speech_segments(&self, audio: &Path) -> anyhow::Result<Vec<SpeechSegment>>;
}

/// Produces a normalized visual-activity timeline from a video file.
#[async_trait]
pub trait VisualAnalyzer: Send + Sync {
    async fn activity_timeline(&self, video: &Path) -> anyhow::Result<Vec<TimelinePoint>>;
}

/// Reads basic stream information from a local video file.
#[async_trait]
pub trait VideoProber: Send + Sync {
    async fn probe(&self, video: &Path) -> anyhow::Result<VideoInfo>;
}

/// Acquires source videos from a remote provider.
///
/// Implementations tolerate partial failure: a channel that cannot be listed
/// yields an empty list and a video that cannot be fetched yields `None`,
/// never an error that would take down the whole batch.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// List up to `max_count` recent videos of a channel.
    async fn list_videos(&self, channel: &str, max_count: usize) -> Vec<VideoRef>;

    /// Fetch one video to local storage. `None` on any failure or when the
    /// source is unsuitable (e.g. too short).
    async fn fetch_one(&self, video: &VideoRef) -> Option<PathBuf>;

    /// Remove fetch-phase temporary files.
    async fn cleanup(&self);
}

/// Renders one clip of a source video for one target platform.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Cut and re-encode `clip` from `source` according to `spec`.
    ///
    /// Returns the rendered file path. Failures (including transcode
    /// timeouts) are soft and isolated to this clip/platform pair.
    async fn render(
        &self,
        clip: &Clip,
        source: &Path,
        platform: &str,
        spec: &PlatformSpec,
    ) -> anyhow::Result<PathBuf>;

    /// Remove render-phase temporary files.
    async fn cleanup(&self);
}

/// Best-effort speech-to-text collaborator for subtitle tracks.
///
/// A failed or unavailable transcription degrades to "no subtitles"; it
/// never aborts a clip.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, file: &Path) -> Vec<WordSpan>;
}

/// Local file management for the shared output/temp directory trees.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Enumerate existing local source videos by extension.
    async fn existing_videos(&self) -> Vec<PathBuf>;

    /// Create the output/temp directory trees. Idempotent.
    async fn create_directories(&self) -> anyhow::Result<()>;

    /// Remove downloaded source videos left in the temp tree.
    async fn cleanup_temp_videos(&self);

    /// Clear all rendered outputs and temporary files.
    async fn clear_outputs(&self);
}
