//! Run reporting.

use chrono::{DateTime, Utc};
use tracing::info;

use fastcut_models::RunStats;

use crate::config::PipelineConfig;

/// How many recorded errors the final report prints before truncating.
const MAX_REPORTED_ERRORS: usize = 5;

/// Log the startup banner for a run.
pub fn log_header(config: &PipelineConfig) {
    info!("FastCut starting");
    info!(
        "Channels: {}",
        if config.authorized_channels.is_empty() {
            "(none)".to_string()
        } else {
            config.authorized_channels.join(", ")
        }
    );
    info!(
        "Clips: up to {} per video, {}-{}s each",
        config.clips_per_video, config.min_clip_duration, config.max_clip_duration
    );
    info!("Output: {}", config.output_dir.display());
}

/// Render the final run report as one multi-line string.
pub fn format_report(stats: &RunStats, started_at: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(started_at);
    let mut lines = vec![
        "=== Run report ===".to_string(),
        format!(
            "Elapsed: {}m {}s",
            elapsed.num_minutes(),
            elapsed.num_seconds() % 60
        ),
        format!("Downloaded videos: {}", stats.downloaded_videos),
        format!("Analyzed videos: {}", stats.analyzed_videos),
        format!("Generated clips: {}", stats.generated_clips),
    ];

    let mut platforms: Vec<_> = stats.clips_by_platform.iter().collect();
    platforms.sort_by(|a, b| a.0.cmp(b.0));
    for (platform, count) in platforms {
        lines.push(format!("  {platform}: {count}"));
    }

    if !stats.errors.is_empty() {
        lines.push(format!("Errors/notes ({}):", stats.errors.len()));
        for error in stats.errors.iter().take(MAX_REPORTED_ERRORS) {
            lines.push(format!("  - {error}"));
        }
        if stats.errors.len() > MAX_REPORTED_ERRORS {
            lines.push(format!(
                "  ... and {} more",
                stats.errors.len() - MAX_REPORTED_ERRORS
            ));
        }
    }

    // Acquired videos are the denominator; a run that acquired nothing has
    // no rate to report.
    if stats.downloaded_videos > 0 {
        lines.push(format!(
            "Success rate: {:.0}%",
            (stats.analyzed_videos as f64 / stats.downloaded_videos as f64) * 100.0
        ));
    }

    lines.join("\n")
}

/// Log the final run report.
pub fn log_report(stats: &RunStats, started_at: DateTime<Utc>) {
    for line in format_report(stats, started_at).lines() {
        info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn stats() -> RunStats {
        RunStats {
            downloaded_videos: 4,
            analyzed_videos: 3,
            generated_clips: 9,
            clips_by_platform: HashMap::from([
                ("tiktok".to_string(), 5),
                ("youtube_shorts".to_string(), 4),
            ]),
            errors: vec![],
        }
    }

    #[test]
    fn test_report_contains_counts_and_platforms() {
        let report = format_report(&stats(), Utc::now());

        assert!(report.contains("Downloaded videos: 4"));
        assert!(report.contains("Analyzed videos: 3"));
        assert!(report.contains("Generated clips: 9"));
        assert!(report.contains("tiktok: 5"));
        assert!(report.contains("youtube_shorts: 4"));
        assert!(report.contains("Success rate: 75%"));
    }

    #[test]
    fn test_success_rate_is_analyzed_over_downloaded() {
        let mut stats = stats();
        stats.downloaded_videos = 5;
        stats.analyzed_videos = 5;
        // Per-video notes do not lower the rate; failed analyses do.
        stats.errors = vec!["No interesting clip".to_string()];

        let report = format_report(&stats, Utc::now());
        assert!(report.contains("Success rate: 100%"));
    }

    #[test]
    fn test_report_truncates_long_error_lists() {
        let mut stats = stats();
        stats.errors = (0..8).map(|i| format!("error {i}")).collect();

        let report = format_report(&stats, Utc::now());

        assert!(report.contains("Errors/notes (8):"));
        assert!(report.contains("error 0"));
        assert!(report.contains("error 4"));
        assert!(!report.contains("error 5"));
        assert!(report.contains("... and 3 more"));
    }

    #[test]
    fn test_empty_run_has_no_error_section() {
        let report = format_report(&RunStats::default(), Utc::now());
        assert!(!report.contains("Errors/notes"));
        assert!(report.contains("Generated clips: 0"));
        assert!(!report.contains("Success rate"));
    }
}
