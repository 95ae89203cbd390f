//! External media tool adapters: FFmpeg/FFprobe wrappers, yt-dlp fetching,
//! signal analysis, clip rendering, subtitles and local file management.
//!
//! Everything here implements the capability traits from `fastcut-engine`,
//! so the pipeline never talks to a subprocess directly.

pub mod analysis;
pub mod command;
pub mod error;
pub mod fetch;
pub mod fs_utils;
pub mod probe;
pub mod renderer;
pub mod subtitle;
pub mod transcribe;

pub use analysis::{
    AstatsEnergyAnalyzer, FfmpegAudioExtractor, SignalStatsVisualAnalyzer, SilenceSpeechDetector,
};
pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fetch::YtDlpFetcher;
pub use fs_utils::LocalFileStore;
pub use probe::{probe_duration, probe_video, FfprobeProber};
pub use renderer::{FfmpegRenderer, RendererConfig};
pub use transcribe::CommandTranscriber;
