//! Signal analysis adapters.
//!
//! The engine only consumes normalized timelines; these adapters obtain them
//! from FFmpeg filters instead of decoding media themselves:
//!
//! - audio energy from `astats` per-frame RMS levels,
//! - speech presence from `silencedetect` (inverted silence intervals),
//! - visual activity from `signalstats` luma-difference (YDIF) values.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use fastcut_engine::traits::{AudioExtractor, EnergyAnalyzer, SpeechDetector, VisualAnalyzer};
use fastcut_models::{SpeechSegment, TimelinePoint};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;

/// RMS floor substituted for silent (`-inf` dB) frames.
const RMS_FLOOR_DB: f64 = -96.0;

/// Extracts the audio track to `<stem>_temp_audio.wav` next to the source.
#[derive(Debug, Clone, Default)]
pub struct FfmpegAudioExtractor {
    runner: FfmpegRunner,
}

impl FfmpegAudioExtractor {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudioExtractor {
    async fn extract_audio(&self, video: &Path) -> anyhow::Result<PathBuf> {
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        let audio_path = video
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{stem}_temp_audio.wav"));

        let cmd = FfmpegCommand::new(video, &audio_path)
            .no_video()
            .audio_codec("pcm_s16le");
        self.runner.run(&cmd).await?;

        if !audio_path.exists() {
            return Err(MediaError::OutputMissing(audio_path).into());
        }
        Ok(audio_path)
    }
}

/// Escape a path for use inside an lavfi `movie=`/`amovie=` source.
fn escape_lavfi_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
}

/// Run ffprobe over an lavfi graph and return `(timestamp, tag value)`
/// pairs for one frame tag.
async fn lavfi_frame_values(graph: &str, tag: &str) -> MediaResult<Vec<(f64, f64)>> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let entries = format!("frame=pkt_pts_time,pts_time:frame_tags={tag}");
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-f",
            "lavfi",
            "-i",
            graph,
            "-show_entries",
            entries.as_str(),
            "-print_format",
            "json",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe lavfi graph failed: {graph}"),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_lavfi_frames(&output.stdout, tag)
}

/// Parse ffprobe `-print_format json` frame output for one tag.
fn parse_lavfi_frames(raw: &[u8], tag: &str) -> MediaResult<Vec<(f64, f64)>> {
    let value: serde_json::Value = serde_json::from_slice(raw)?;
    let mut samples = Vec::new();

    let Some(frames) = value.get("frames").and_then(|f| f.as_array()) else {
        return Ok(samples);
    };

    for frame in frames {
        let timestamp = ["pts_time", "pkt_pts_time", "best_effort_timestamp_time"]
            .iter()
            .find_map(|key| frame.get(key))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<f64>().ok());

        let tag_value = frame
            .get("tags")
            .and_then(|tags| tags.get(tag))
            .and_then(|v| v.as_str())
            .map(|s| s.parse::<f64>().unwrap_or(RMS_FLOOR_DB));

        if let (Some(timestamp), Some(value)) = (timestamp, tag_value) {
            let value = if value.is_finite() { value } else { RMS_FLOOR_DB };
            samples.push((timestamp, value));
        }
    }

    Ok(samples)
}

/// Min-max normalize sample values to [0, 1].
fn normalize(samples: Vec<(f64, f64)>) -> Vec<TimelinePoint> {
    let min = samples.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = samples
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);

    samples
        .into_iter()
        .map(|(timestamp, value)| {
            let normalized = if max > min { (value - min) / (max - min) } else { 0.0 };
            TimelinePoint::new(timestamp, normalized)
        })
        .collect()
}

/// Audio-energy timeline from `astats` per-frame RMS levels.
#[derive(Debug, Clone, Default)]
pub struct AstatsEnergyAnalyzer;

#[async_trait]
impl EnergyAnalyzer for AstatsEnergyAnalyzer {
    async fn energy_timeline(&self, audio: &Path) -> anyhow::Result<Vec<TimelinePoint>> {
        let graph = format!(
            "amovie={},astats=metadata=1:reset=1",
            escape_lavfi_path(audio)
        );
        let samples = lavfi_frame_values(&graph, "lavfi.astats.Overall.RMS_level").await?;
        debug!("{} energy samples from {}", samples.len(), audio.display());
        Ok(normalize(samples))
    }
}

/// Speech detection by inverting `silencedetect` intervals.
#[derive(Debug, Clone)]
pub struct SilenceSpeechDetector {
    /// Silence threshold in dBFS, e.g. -40.
    pub noise_db: i32,
    /// Minimum silence length in seconds before a gap counts as silence.
    pub min_silence: f64,
}

impl Default for SilenceSpeechDetector {
    fn default() -> Self {
        Self {
            noise_db: -40,
            min_silence: 0.5,
        }
    }
}

#[async_trait]
impl SpeechDetector for SilenceSpeechDetector {
    async fn speech_segments(&self, audio: &Path) -> anyhow::Result<Vec<SpeechSegment>> {
        let duration = probe_duration(audio).await?;

        let args = vec![
            "-i".to_string(),
            audio.to_string_lossy().to_string(),
            "-af".to_string(),
            format!("silencedetect=noise={}dB:d={}", self.noise_db, self.min_silence),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        let stderr = FfmpegRunner::new().run_capturing_stderr(&args).await?;

        let silences = parse_silencedetect(&stderr, duration);
        Ok(invert_silences(&silences, duration))
    }
}

/// Parse `silence_start:`/`silence_end:` markers from FFmpeg stderr.
///
/// An unmatched trailing `silence_start` runs to the end of the stream.
fn parse_silencedetect(stderr: &str, total_duration: f64) -> Vec<(f64, f64)> {
    let mut silences = Vec::new();
    let mut open_start: Option<f64> = None;

    for line in stderr.lines() {
        if let Some(rest) = line.split("silence_start:").nth(1) {
            if let Ok(start) = rest.trim().parse::<f64>() {
                open_start = Some(start);
            }
        } else if let Some(rest) = line.split("silence_end:").nth(1) {
            let end_str = rest.split('|').next().unwrap_or("").trim();
            if let (Some(start), Ok(end)) = (open_start.take(), end_str.parse::<f64>()) {
                silences.push((start, end));
            }
        }
    }

    if let Some(start) = open_start {
        silences.push((start, total_duration));
    }

    silences
}

/// Invert silence intervals into speech segments over `[0, total]`.
fn invert_silences(silences: &[(f64, f64)], total: f64) -> Vec<SpeechSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0.0;

    for &(start, end) in silences {
        if start > cursor {
            segments.push(SpeechSegment::new(cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < total {
        segments.push(SpeechSegment::new(cursor, total));
    }

    segments
}

/// Visual-activity timeline from `signalstats` luma-difference values,
/// sampled every `sample_every` frames.
#[derive(Debug, Clone)]
pub struct SignalStatsVisualAnalyzer {
    pub sample_every: u32,
}

impl Default for SignalStatsVisualAnalyzer {
    fn default() -> Self {
        Self { sample_every: 5 }
    }
}

#[async_trait]
impl VisualAnalyzer for SignalStatsVisualAnalyzer {
    async fn activity_timeline(&self, video: &Path) -> anyhow::Result<Vec<TimelinePoint>> {
        let graph = format!(
            "movie={},select=not(mod(n\\,{})),signalstats",
            escape_lavfi_path(video),
            self.sample_every
        );
        let samples = lavfi_frame_values(&graph, "lavfi.signalstats.YDIF").await?;
        debug!("{} activity samples from {}", samples.len(), video.display());
        Ok(normalize(samples))
    }
}
