//! Clip rendering for target platforms.
//!
//! Two FFmpeg passes: one cut pass per clip that re-encodes the clip window
//! out of the source, then one optimization pass per platform that scales
//! and crops to the platform resolution, applies the platform frame rate and
//! optionally burns a subtitle track. The cut and its transcript are shared
//! across platforms; only the optimization pass runs per platform.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use fastcut_engine::traits::{Renderer, Transcriber};
use fastcut_models::{Clip, PlatformSpec};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaError;
use crate::subtitle::write_ass;

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Shared temp directory for intermediate cut files.
    pub temp_dir: PathBuf,
    /// Root output directory; one subdirectory per platform.
    pub output_dir: PathBuf,
    /// Output audio bitrate, e.g. "128k".
    pub audio_bitrate: String,
    /// Hard timeout per FFmpeg invocation, in seconds.
    pub timeout_secs: u64,
}

/// FFmpeg-backed [`Renderer`] with optional subtitle burning.
///
/// Intermediate cut files and subtitle tracks are keyed by clip, not by
/// platform, so repeated per-platform render calls for the same clip reuse
/// them. [`cleanup`](Renderer::cleanup) sweeps them at the end of a run.
pub struct FfmpegRenderer {
    config: RendererConfig,
    transcriber: Option<Arc<dyn Transcriber>>,
    /// Subtitle track per cut file; `None` records "transcribed, nothing
    /// usable" so a silent clip is not re-transcribed per platform.
    subtitles: Mutex<HashMap<PathBuf, Option<PathBuf>>>,
}

/// Scale up to cover the target resolution, then center-crop to it.
fn platform_filter(spec: &PlatformSpec) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = spec.width(),
        h = spec.height()
    )
}

/// Stable per-clip key derived from the window start (centiseconds), so
/// concurrent workers never collide on intermediate paths.
fn clip_key(clip: &Clip) -> u64 {
    (clip.start_time * 100.0).round() as u64
}

fn source_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string())
}

impl FfmpegRenderer {
    pub fn new(config: RendererConfig, transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self {
            config,
            transcriber,
            subtitles: Mutex::new(HashMap::new()),
        }
    }

    fn temp_cut_path(&self, clip: &Clip, source: &Path) -> PathBuf {
        self.config.temp_dir.join(format!(
            "{}_clip_{}_temp.mp4",
            source_stem(source),
            clip_key(clip)
        ))
    }

    fn final_output_path(&self, clip: &Clip, source: &Path, platform: &str, spec: &PlatformSpec) -> PathBuf {
        self.config.output_dir.join(platform).join(format!(
            "{}_clip_{}_{}.{}",
            source_stem(source),
            clip_key(clip),
            platform,
            spec.format
        ))
    }

    /// Cut the clip window out of the source. A cut file that already
    /// exists (from another platform's render of the same clip) is reused.
    async fn cut_clip(&self, clip: &Clip, source: &Path, temp: &Path) -> anyhow::Result<()> {
        if temp.exists() {
            debug!("Reusing cut {}", temp.display());
            return Ok(());
        }

        let cmd = FfmpegCommand::new(source, temp)
            .seek(clip.start_time)
            .duration(clip.duration)
            .video_codec("libx264")
            .audio_codec("aac")
            .preset("fast")
            .crf(23);
        FfmpegRunner::new()
            .with_timeout(self.config.timeout_secs)
            .run(&cmd)
            .await?;

        if !temp.exists() {
            return Err(MediaError::OutputMissing(temp.to_path_buf()).into());
        }
        Ok(())
    }

    /// Transcribe the cut clip and write a subtitle track for it, once per
    /// cut. Best-effort: any failure means rendering continues without
    /// subtitles.
    async fn subtitle_track(&self, temp_cut: &Path, spec: &PlatformSpec) -> Option<PathBuf> {
        let transcriber = self.transcriber.as_ref()?;

        if let Ok(cache) = self.subtitles.lock() {
            if let Some(cached) = cache.get(temp_cut) {
                return cached.clone();
            }
        }

        let words = transcriber.transcribe(temp_cut).await;
        let track = if words.is_empty() {
            debug!("No transcript for {}, skipping subtitles", temp_cut.display());
            None
        } else {
            let ass_path = temp_cut.with_extension("ass");
            match write_ass(&words, &ass_path, (spec.width(), spec.height())) {
                Ok(()) => Some(ass_path),
                Err(e) => {
                    warn!("Failed to write subtitle track: {}", e);
                    None
                }
            }
        };

        if let Ok(mut cache) = self.subtitles.lock() {
            cache.insert(temp_cut.to_path_buf(), track.clone());
        }
        track
    }

    async fn optimize_for_platform(
        &self,
        clip: &Clip,
        temp_cut: &Path,
        output: &Path,
        spec: &PlatformSpec,
        subtitles: Option<&Path>,
    ) -> anyhow::Result<()> {
        let mut filter = platform_filter(spec);
        if let Some(ass) = subtitles {
            let escaped = ass.to_string_lossy().replace('\\', "/").replace(':', "\\:");
            filter.push_str(&format!(",ass='{escaped}'"));
        }

        let mut cmd = FfmpegCommand::new(temp_cut, output)
            .video_filter(filter)
            .fps(spec.fps)
            .video_codec("libx264")
            .preset("fast")
            .crf(23)
            .audio_codec("aac")
            .audio_bitrate(self.config.audio_bitrate.clone())
            .faststart();
        // Platforms cap clip length; the selector normally stays within it.
        if clip.duration > f64::from(spec.max_duration) {
            cmd = cmd.duration(f64::from(spec.max_duration));
        }
        FfmpegRunner::new()
            .with_timeout(self.config.timeout_secs)
            .run(&cmd)
            .await?;

        if !output.exists() {
            return Err(MediaError::OutputMissing(output.to_path_buf()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn render(
        &self,
        clip: &Clip,
        source: &Path,
        platform: &str,
        spec: &PlatformSpec,
    ) -> anyhow::Result<PathBuf> {
        let temp_cut = self.temp_cut_path(clip, source);
        self.cut_clip(clip, source, &temp_cut).await?;

        let subtitles = self.subtitle_track(&temp_cut, spec).await;

        let output = self.final_output_path(clip, source, platform, spec);
        self.optimize_for_platform(clip, &temp_cut, &output, spec, subtitles.as_deref())
            .await?;

        info!("Rendered {} for {}", output.display(), platform);
        Ok(output)
    }

    async fn cleanup(&self) {
        if let Ok(mut cache) = self.subtitles.lock() {
            cache.clear();
        }

        let Ok(mut entries) = tokio::fs::read_dir(&self.config.temp_dir).await else {
            return;
        };

        let mut removed = 0u32;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with("_temp.mp4")
                || name.ends_with("_temp.ass")
                || name.starts_with("temp-audio")
            {
                if tokio::fs::remove_file(entry.path()).await.is_ok() {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            info!("Removed {} render temp files", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastcut_models::WordSpan;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn renderer_at(temp_dir: &Path, transcriber: Option<Arc<dyn Transcriber>>) -> FfmpegRenderer {
        FfmpegRenderer::new(
            RendererConfig {
                temp_dir: temp_dir.to_path_buf(),
                output_dir: PathBuf::from("/out"),
                audio_bitrate: "128k".to_string(),
                timeout_secs: 300,
            },
            transcriber,
        )
    }

    fn spec() -> PlatformSpec {
        PlatformSpec {
            resolution: (1080, 1920),
            fps: 30,
            format: "mp4".to_string(),
            max_duration: 60,
        }
    }

    struct CountingTranscriber {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcriber for CountingTranscriber {
        async fn transcribe(&self, _file: &Path) -> Vec<WordSpan> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![WordSpan::new("hello", 0.0, 0.5)]
        }
    }

    #[test]
    fn test_platform_filter() {
        assert_eq!(
            platform_filter(&spec()),
            "scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920"
        );
    }

    #[test]
    fn test_cut_path_is_shared_across_platforms() {
        let r = renderer_at(Path::new("/tmp/fastcut"), None);
        let clip = Clip::new(12.5, 32.5, 1.0, "source.mp4");

        let temp = r.temp_cut_path(&clip, Path::new("/videos/episode one.mp4"));
        assert_eq!(
            temp,
            PathBuf::from("/tmp/fastcut/episode one_clip_1250_temp.mp4")
        );

        let out = r.final_output_path(&clip, Path::new("/videos/episode one.mp4"), "tiktok", &spec());
        assert_eq!(
            out,
            PathBuf::from("/out/tiktok/episode one_clip_1250_tiktok.mp4")
        );
    }

    #[test]
    fn test_distinct_clips_get_distinct_keys() {
        let a = Clip::new(10.0, 30.0, 1.0, "v.mp4");
        let b = Clip::new(10.01, 30.0, 1.0, "v.mp4");
        assert_ne!(clip_key(&a), clip_key(&b));
    }

    #[tokio::test]
    async fn test_existing_cut_is_reused_without_reencoding() {
        let dir = TempDir::new().unwrap();
        let r = renderer_at(dir.path(), None);
        let clip = Clip::new(10.0, 30.0, 1.0, "v.mp4");
        let source = Path::new("/videos/v.mp4");

        // A cut left by a previous platform's render of the same clip; no
        // encoder exists in this test, so reaching FFmpeg would fail.
        let temp = r.temp_cut_path(&clip, source);
        std::fs::write(&temp, b"cut").unwrap();

        assert!(r.cut_clip(&clip, source, &temp).await.is_ok());
    }

    #[tokio::test]
    async fn test_transcription_runs_once_per_cut() {
        let dir = TempDir::new().unwrap();
        let transcriber = Arc::new(CountingTranscriber {
            calls: AtomicUsize::new(0),
        });
        let r = renderer_at(dir.path(), Some(Arc::clone(&transcriber) as Arc<dyn Transcriber>));

        let temp_cut = dir.path().join("v_clip_1000_temp.mp4");
        let first = r.subtitle_track(&temp_cut, &spec()).await;
        let second = r.subtitle_track(&temp_cut, &spec()).await;

        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
