//! Highlight detection entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, warn};

use fastcut_models::{Clip, SpeechSegment, TimelinePoint};

use crate::error::{EngineError, EngineResult};
use crate::fusion::{fuse_signals, FusionConfig};
use crate::selector::{select_clips, SelectorConfig};
use crate::traits::{AudioExtractor, EnergyAnalyzer, SpeechDetector, VideoProber, VisualAnalyzer};

/// Detection configuration: fusion thresholds plus selection constraints.
#[derive(Debug, Clone, Default)]
pub struct DetectionConfig {
    pub fusion: FusionConfig,
    pub selector: SelectorConfig,
}

/// Removes the extracted temp audio on every exit path.
struct TempAudio(PathBuf);

impl Drop for TempAudio {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove temp audio {}: {}", self.0.display(), e);
            }
        }
    }
}

/// Composes the signal analyses, fusion and selection behind one call.
///
/// The three signal analyses are best-effort: a failing analyzer degrades
/// its signal to "no contribution". Only audio extraction and probing are
/// hard prerequisites.
pub struct HighlightDetector {
    extractor: Arc<dyn AudioExtractor>,
    energy: Arc<dyn EnergyAnalyzer>,
    speech: Arc<dyn SpeechDetector>,
    visual: Arc<dyn VisualAnalyzer>,
    prober: Arc<dyn VideoProber>,
    config: DetectionConfig,
}

impl HighlightDetector {
    pub fn new(
        extractor: Arc<dyn AudioExtractor>,
        energy: Arc<dyn EnergyAnalyzer>,
        speech: Arc<dyn SpeechDetector>,
        visual: Arc<dyn VisualAnalyzer>,
        prober: Arc<dyn VideoProber>,
        config: DetectionConfig,
    ) -> Self {
        Self {
            extractor,
            energy,
            speech,
            visual,
            prober,
            config,
        }
    }

    /// Detect the best clips in one source video.
    pub async fn detect(&self, video: &Path) -> EngineResult<Vec<Clip>> {
        let (candidates, duration) = self.analyze(video).await?;
        let mut rng = rand::rng();
        let clips = select_clips(&candidates, duration, video, &self.config.selector, &mut rng);
        info!("{} clips found in {}", clips.len(), video.display());
        Ok(clips)
    }

    /// Like [`detect`](Self::detect) but with an injected random source, so
    /// clip boundaries can be pinned.
    pub async fn detect_with_rng<R: Rng + Send>(
        &self,
        video: &Path,
        rng: &mut R,
    ) -> EngineResult<Vec<Clip>> {
        let (candidates, duration) = self.analyze(video).await?;
        Ok(select_clips(&candidates, duration, video, &self.config.selector, rng))
    }

    async fn analyze(&self, video: &Path) -> EngineResult<(Vec<fastcut_models::CandidateMoment>, f64)> {
        info!("Analyzing: {}", video.display());

        // Hard prerequisite: without the audio track there is nothing to score.
        let audio = self
            .extractor
            .extract_audio(video)
            .await
            .map_err(|e| EngineError::analysis(video.display().to_string(), format!("audio extraction failed: {e}")))?;
        let _audio_guard = TempAudio(audio.clone());

        let energy = self.energy_best_effort(&audio).await;
        let speech = self.speech_best_effort(&audio).await;
        let activity = self.activity_best_effort(video).await;

        let candidates = fuse_signals(&energy, &speech, &activity, &self.config.fusion);
        debug!("{} candidate moments after fusion", candidates.len());

        let info = self
            .prober
            .probe(video)
            .await
            .map_err(|e| EngineError::analysis(video.display().to_string(), format!("probe failed: {e}")))?;

        Ok((candidates, info.duration))
    }

    async fn energy_best_effort(&self, audio: &Path) -> Vec<TimelinePoint> {
        match self.energy.energy_timeline(audio).await {
            Ok(timeline) => timeline,
            Err(e) => {
                warn!("Energy analysis failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn speech_best_effort(&self, audio: &Path) -> Vec<SpeechSegment> {
        match self.speech.speech_segments(audio).await {
            Ok(segments) => segments,
            Err(e) => {
                warn!("Speech detection failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn activity_best_effort(&self, video: &Path) -> Vec<TimelinePoint> {
        match self.visual.activity_timeline(video).await {
            Ok(timeline) => timeline,
            Err(e) => {
                warn!("Visual analysis failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::*;
    use async_trait::async_trait;
    use fastcut_models::VideoInfo;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeExtractor {
        fail: bool,
        out: PathBuf,
    }

    #[async_trait]
    impl AudioExtractor for FakeExtractor {
        async fn extract_audio(&self, _video: &Path) -> anyhow::Result<PathBuf> {
            if self.fail {
                anyhow::bail!("no audio track");
            }
            std::fs::write(&self.out, b"wav").unwrap();
            Ok(self.out.clone())
        }
    }

    struct FakeEnergy(Vec<TimelinePoint>);

    #[async_trait]
    impl EnergyAnalyzer for FakeEnergy {
        async fn energy_timeline(&self, _audio: &Path) -> anyhow::Result<Vec<TimelinePoint>> {
            Ok(self.0.clone())
        }
    }

    struct FailingEnergy(AtomicBool);

    #[async_trait]
    impl EnergyAnalyzer for FailingEnergy {
        async fn energy_timeline(&self, _audio: &Path) -> anyhow::Result<Vec<TimelinePoint>> {
            self.0.store(true, Ordering::SeqCst);
            anyhow::bail!("decoder blew up");
        }
    }

    struct FakeSpeech(Vec<SpeechSegment>);

    #[async_trait]
    impl SpeechDetector for FakeSpeech {
        async fn speech_segments(&self, _audio: &Path) -> anyhow::Result<Vec<SpeechSegment>> {
            Ok(self.0.clone())
        }
    }

    struct FakeVisual(Vec<TimelinePoint>);

    #[async_trait]
    impl VisualAnalyzer for FakeVisual {
        async fn activity_timeline(&self, _video: &Path) -> anyhow::Result<Vec<TimelinePoint>> {
            Ok(self.0.clone())
        }
    }

    struct FakeProber(f64);

    #[async_trait]
    impl VideoProber for FakeProber {
        async fn probe(&self, _video: &Path) -> anyhow::Result<VideoInfo> {
            Ok(VideoInfo {
                duration: self.0,
                width: 1920,
                height: 1080,
                fps: 30.0,
            })
        }
    }

    fn temp_audio_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fastcut-test-{name}.wav"))
    }

    fn detector(
        extractor_fail: bool,
        audio_out: PathBuf,
        energy: Vec<TimelinePoint>,
        duration: f64,
        config: DetectionConfig,
    ) -> HighlightDetector {
        HighlightDetector::new(
            Arc::new(FakeExtractor {
                fail: extractor_fail,
                out: audio_out,
            }),
            Arc::new(FakeEnergy(energy)),
            Arc::new(FakeSpeech(vec![])),
            Arc::new(FakeVisual(vec![])),
            Arc::new(FakeProber(duration)),
            config,
        )
    }

    #[tokio::test]
    async fn test_extraction_failure_is_fatal() {
        let det = detector(
            true,
            temp_audio_path("fatal"),
            vec![TimelinePoint::new(0.0, 0.9)],
            120.0,
            DetectionConfig::default(),
        );

        let err = det.detect(Path::new("v.mp4")).await.unwrap_err();
        assert!(err.to_string().contains("audio extraction failed"));
    }

    #[tokio::test]
    async fn test_single_high_energy_moment_yields_clamped_clip() {
        // Energy spike at t=0 on a 120s video, 10s fixed duration: the
        // window clamps to [0, 10].
        let config = DetectionConfig {
            fusion: FusionConfig {
                energy_threshold: 0.5,
                ..FusionConfig::default()
            },
            selector: SelectorConfig {
                min_clip_duration: 10,
                max_clip_duration: 10,
                clips_per_video: 1,
            },
        };
        let det = detector(
            false,
            temp_audio_path("clamped"),
            vec![TimelinePoint::new(0.0, 0.9)],
            120.0,
            config,
        );

        let mut rng = StdRng::seed_from_u64(1);
        let clips = det.detect_with_rng(Path::new("v.mp4"), &mut rng).await.unwrap();

        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].start_time, 0.0);
        assert!((clips[0].duration - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failing_signal_degrades_to_no_contribution() {
        let audio = temp_audio_path("degrade");
        let called = Arc::new(FailingEnergy(AtomicBool::new(false)));
        let det = HighlightDetector::new(
            Arc::new(FakeExtractor {
                fail: false,
                out: audio,
            }),
            Arc::clone(&called) as Arc<dyn EnergyAnalyzer>,
            Arc::new(FakeSpeech(vec![SpeechSegment::new(0.0, 60.0)])),
            Arc::new(FakeVisual(vec![TimelinePoint::new(30.0, 0.8)])),
            Arc::new(FakeProber(120.0)),
            DetectionConfig::default(),
        );

        let mut rng = StdRng::seed_from_u64(1);
        let clips = det.detect_with_rng(Path::new("v.mp4"), &mut rng).await.unwrap();

        assert!(called.0.load(Ordering::SeqCst));
        // Visual activity alone (plus speech bonus) still produces a clip.
        assert_eq!(clips.len(), 1);
    }

    #[tokio::test]
    async fn test_temp_audio_removed_after_detection() {
        let audio = temp_audio_path("cleanup");
        let det = detector(
            false,
            audio.clone(),
            vec![TimelinePoint::new(10.0, 0.95)],
            300.0,
            DetectionConfig::default(),
        );

        det.detect(Path::new("v.mp4")).await.unwrap();
        assert!(!audio.exists());
    }

    #[tokio::test]
    async fn test_no_signals_yield_no_clips() {
        let det = detector(
            false,
            temp_audio_path("empty"),
            vec![],
            300.0,
            DetectionConfig::default(),
        );

        let clips = det.detect(Path::new("v.mp4")).await.unwrap();
        assert!(clips.is_empty());
    }
}
