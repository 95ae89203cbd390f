//! Pipeline configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::warn;

use fastcut_models::{default_platform_specs, load_platform_specs, PlatformSpec};

use crate::error::{PipelineError, PipelineResult};

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Channels videos may be fetched from.
    pub authorized_channels: Vec<String>,
    /// Root directory for rendered clips (one subdirectory per platform).
    pub output_dir: PathBuf,
    /// Directory for fetched sources and intermediate files.
    pub temp_dir: PathBuf,
    /// Minimum clip duration in whole seconds.
    pub min_clip_duration: u32,
    /// Maximum clip duration in whole seconds.
    pub max_clip_duration: u32,
    /// Maximum clips to generate per video.
    pub clips_per_video: usize,
    /// Audio-energy score threshold in [0, 1].
    pub energy_threshold: f64,
    /// Visual-activity score threshold in [0, 1].
    pub activity_threshold: f64,
    /// Silence threshold for speech detection, in dBFS.
    pub silence_threshold: i32,
    /// Output audio bitrate, e.g. "128k".
    pub audio_bitrate: String,
    /// Optional JSON file overriding the built-in platform specs.
    pub platforms_file: Option<PathBuf>,
    /// Burn word-level subtitles into rendered clips.
    pub subtitles: bool,
    /// External speech-to-text command for subtitle generation.
    pub transcriber_cmd: Option<String>,
    /// Maximum videos processed concurrently.
    pub process_pool_size: usize,
    /// Maximum videos fetched concurrently.
    pub fetch_pool_size: usize,
    /// Hard timeout per render invocation, in seconds.
    pub render_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            authorized_channels: Vec::new(),
            output_dir: PathBuf::from("./output"),
            temp_dir: PathBuf::from("./temp"),
            min_clip_duration: 15,
            max_clip_duration: 60,
            clips_per_video: 3,
            energy_threshold: 0.7,
            activity_threshold: 0.3,
            silence_threshold: -40,
            audio_bitrate: "128k".to_string(),
            platforms_file: None,
            subtitles: true,
            transcriber_cmd: None,
            process_pool_size: 2,
            fetch_pool_size: 3,
            render_timeout_secs: 300,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            authorized_channels: std::env::var("AUTHORIZED_CHANNELS")
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            temp_dir: std::env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            min_clip_duration: env_parsed("MIN_CLIP_DURATION", defaults.min_clip_duration),
            max_clip_duration: env_parsed("MAX_CLIP_DURATION", defaults.max_clip_duration),
            clips_per_video: env_parsed("CLIPS_PER_VIDEO", defaults.clips_per_video),
            energy_threshold: env_parsed("ENERGY_THRESHOLD", defaults.energy_threshold),
            activity_threshold: env_parsed("ACTIVITY_THRESHOLD", defaults.activity_threshold),
            silence_threshold: env_parsed("SILENCE_THRESHOLD", defaults.silence_threshold),
            audio_bitrate: std::env::var("AUDIO_BITRATE").unwrap_or(defaults.audio_bitrate),
            platforms_file: std::env::var("PLATFORMS_FILE").ok().map(PathBuf::from),
            subtitles: env_parsed("SUBTITLES", defaults.subtitles),
            transcriber_cmd: std::env::var("TRANSCRIBER_CMD").ok(),
            process_pool_size: env_parsed("PROCESS_POOL_SIZE", defaults.process_pool_size).max(1),
            fetch_pool_size: env_parsed("FETCH_POOL_SIZE", defaults.fetch_pool_size).max(1),
            render_timeout_secs: env_parsed("RENDER_TIMEOUT_SECS", defaults.render_timeout_secs),
        }
    }

    /// Validate the run-independent invariants.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.min_clip_duration == 0 {
            return Err(PipelineError::config("MIN_CLIP_DURATION must be positive"));
        }
        if self.min_clip_duration > self.max_clip_duration {
            return Err(PipelineError::config(format!(
                "MIN_CLIP_DURATION ({}) exceeds MAX_CLIP_DURATION ({})",
                self.min_clip_duration, self.max_clip_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.energy_threshold) {
            return Err(PipelineError::config("ENERGY_THRESHOLD must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.activity_threshold) {
            return Err(PipelineError::config("ACTIVITY_THRESHOLD must be in [0, 1]"));
        }
        Ok(())
    }

    /// Additional validation for channel-driven runs.
    pub fn validate_channels(&self) -> PipelineResult<()> {
        if self.authorized_channels.is_empty() {
            return Err(PipelineError::config(
                "AUTHORIZED_CHANNELS is empty; set it or pass --video",
            ));
        }
        Ok(())
    }

    /// Resolve the platform spec table, falling back to the built-in presets
    /// when the configured file is missing or malformed.
    pub fn platform_specs(&self) -> HashMap<String, PlatformSpec> {
        match &self.platforms_file {
            Some(path) => match load_platform_specs(path) {
                Ok(specs) if !specs.is_empty() => specs,
                Ok(_) => {
                    warn!(
                        "Platform file {} is empty, using built-in presets",
                        path.display()
                    );
                    default_platform_specs()
                }
                Err(e) => {
                    warn!(
                        "Could not load platform file {}: {}, using built-in presets",
                        path.display(),
                        e
                    );
                    default_platform_specs()
                }
            },
            None => default_platform_specs(),
        }
    }
}
