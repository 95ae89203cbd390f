//! FastCut binary: automatic highlight clipping for short-form platforms.

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fastcut_engine::traits::{Fetcher, FileStore, Renderer, Transcriber};
use fastcut_engine::{DetectionConfig, FusionConfig, HighlightDetector, SelectorConfig};
use fastcut_media::{
    check_ffmpeg, check_ffprobe, check_ytdlp, AstatsEnergyAnalyzer, CommandTranscriber,
    FfmpegAudioExtractor, FfmpegRenderer, FfmpegRunner, FfprobeProber, LocalFileStore,
    RendererConfig, SignalStatsVisualAnalyzer, SilenceSpeechDetector, YtDlpFetcher,
};
use fastcut_pipeline::{reporter, Orchestrator, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "fastcut", version, about = "Cut highlight clips from channel videos")]
struct Cli {
    /// Maximum videos to fetch per channel
    #[arg(long, default_value_t = 5)]
    max_videos: usize,

    /// Process videos already in the temp directory instead of fetching
    #[arg(long)]
    skip_download: bool,

    /// Process one local file or URL instead of the channel list
    #[arg(long)]
    video: Option<String>,

    /// Print the authorized channels and exit
    #[arg(long)]
    list_channels: bool,

    /// Remove all rendered clips and temp files, then exit
    #[arg(long)]
    clear: bool,

    /// Check external tools and configuration, then exit
    #[arg(long = "test")]
    self_test: bool,

    /// Disable subtitle burning
    #[arg(long)]
    no_subtitles: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default_level = if verbose { "fastcut=debug" } else { "fastcut=info" };
    let env_filter = EnvFilter::from_default_env().add_directive(default_level.parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn build_orchestrator(config: &PipelineConfig) -> Orchestrator {
    let platforms = config.platform_specs();

    let detection = DetectionConfig {
        fusion: FusionConfig {
            energy_threshold: config.energy_threshold,
            activity_threshold: config.activity_threshold,
            grid: None,
        },
        selector: SelectorConfig {
            min_clip_duration: config.min_clip_duration,
            max_clip_duration: config.max_clip_duration,
            clips_per_video: config.clips_per_video,
        },
    };

    let detector = Arc::new(HighlightDetector::new(
        Arc::new(FfmpegAudioExtractor::new(FfmpegRunner::new())),
        Arc::new(AstatsEnergyAnalyzer),
        Arc::new(SilenceSpeechDetector {
            noise_db: config.silence_threshold,
            min_silence: 0.5,
        }),
        Arc::new(SignalStatsVisualAnalyzer::default()),
        Arc::new(FfprobeProber),
        detection,
    ));

    let transcriber: Option<Arc<dyn Transcriber>> = match (&config.transcriber_cmd, config.subtitles)
    {
        (Some(cmd), true) => Some(Arc::new(CommandTranscriber::new(cmd.clone()))),
        _ => None,
    };

    let renderer = Arc::new(FfmpegRenderer::new(
        RendererConfig {
            temp_dir: config.temp_dir.clone(),
            output_dir: config.output_dir.clone(),
            audio_bitrate: config.audio_bitrate.clone(),
            timeout_secs: config.render_timeout_secs,
        },
        transcriber,
    ));

    let fetcher = Arc::new(YtDlpFetcher::new(config.temp_dir.clone()));

    let file_store = Arc::new(LocalFileStore::new(
        config.temp_dir.clone(),
        config.output_dir.clone(),
        platforms.keys().cloned().collect(),
    ));

    Orchestrator::new(
        config.clone(),
        platforms,
        detector,
        fetcher as Arc<dyn Fetcher>,
        renderer as Arc<dyn Renderer>,
        file_store as Arc<dyn FileStore>,
    )
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = PipelineConfig::from_env();
    if cli.no_subtitles {
        config.subtitles = false;
    }

    if cli.self_test {
        let passed = fastcut_pipeline::system::run_system_check(&config);
        std::process::exit(if passed { 0 } else { 1 });
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    if cli.list_channels {
        for channel in &config.authorized_channels {
            println!("{channel}");
        }
        return;
    }

    if cli.clear {
        let platforms = config.platform_specs();
        let store = LocalFileStore::new(
            config.temp_dir.clone(),
            config.output_dir.clone(),
            platforms.keys().cloned().collect(),
        );
        store.clear_outputs().await;
        info!("Outputs cleared");
        return;
    }

    if let Err(e) = check_ffmpeg() {
        error!("{}", e);
        std::process::exit(1);
    }
    if let Err(e) = check_ffprobe() {
        error!("{}", e);
        std::process::exit(1);
    }

    let needs_ytdlp = match &cli.video {
        Some(source) => !std::path::Path::new(source).exists(),
        None => !cli.skip_download,
    };
    if needs_ytdlp {
        if let Err(e) = check_ytdlp() {
            error!("{}", e);
            std::process::exit(1);
        }
    }

    if cli.video.is_none() && !cli.skip_download {
        if let Err(e) = config.validate_channels() {
            error!("{}", e);
            std::process::exit(1);
        }
    }

    reporter::log_header(&config);
    let orchestrator = build_orchestrator(&config);
    let started_at = Utc::now();

    let stats = match &cli.video {
        Some(source) => orchestrator.run_one(source).await,
        None => orchestrator.run(cli.max_videos, cli.skip_download).await,
    };

    reporter::log_report(&stats, started_at);

    // A run that produced nothing is a failure for callers (cron, CI).
    std::process::exit(if stats.generated_clips > 0 { 0 } else { 1 });
}
