//! Run orchestration.
//!
//! One run has three phases: acquire sources, process them through bounded
//! per-video workers, then clean up. Workers compute a local
//! [`VideoOutcome`] each; only this module merges them into the run's
//! [`RunStats`], so the final report never depends on completion order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info};

use fastcut_engine::traits::{Fetcher, FileStore, Renderer};
use fastcut_engine::HighlightDetector;
use fastcut_models::{PlatformSpec, RunStats, VideoOutcome, VideoRef, WorkItem};

use crate::config::PipelineConfig;
use crate::dispatcher::WorkDispatcher;

/// Drives a full clipping run over the configured channels.
pub struct Orchestrator {
    config: PipelineConfig,
    platforms: Arc<HashMap<String, PlatformSpec>>,
    detector: Arc<HighlightDetector>,
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn Renderer>,
    file_store: Arc<dyn FileStore>,
}

impl Orchestrator {
    pub fn new(
        config: PipelineConfig,
        platforms: HashMap<String, PlatformSpec>,
        detector: Arc<HighlightDetector>,
        fetcher: Arc<dyn Fetcher>,
        renderer: Arc<dyn Renderer>,
        file_store: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            config,
            platforms: Arc::new(platforms),
            detector,
            fetcher,
            renderer,
            file_store,
        }
    }

    /// Run the pipeline over all authorized channels.
    ///
    /// Never fails: everything that goes wrong after startup is recorded in
    /// the returned stats. With `skip_acquire` the temp directory's existing
    /// videos are processed instead of fetching new ones.
    pub async fn run(&self, max_per_channel: usize, skip_acquire: bool) -> RunStats {
        let mut stats = self.new_stats();

        if let Err(e) = self.file_store.create_directories().await {
            error!("Could not create working directories: {}", e);
            stats.errors.push(format!("Could not create working directories: {e}"));
            return stats;
        }

        let sources = if skip_acquire {
            let existing = self.file_store.existing_videos().await;
            info!("Skipping downloads, {} local videos found", existing.len());
            // Existing local files are still acquired sources.
            stats.downloaded_videos = existing.len() as u64;
            existing
        } else {
            self.acquire(max_per_channel, &mut stats).await
        };

        if sources.is_empty() {
            info!("No videos to process");
            self.cleanup().await;
            return stats;
        }

        self.process(sources, &mut stats).await;
        self.cleanup().await;
        stats
    }

    /// Run the pipeline over a single local file or URL.
    pub async fn run_one(&self, source: &str) -> RunStats {
        let mut stats = self.new_stats();

        if let Err(e) = self.file_store.create_directories().await {
            error!("Could not create working directories: {}", e);
            stats.errors.push(format!("Could not create working directories: {e}"));
            return stats;
        }

        let path = Path::new(source);
        let local = if path.exists() {
            Some(path.to_path_buf())
        } else {
            match self.fetcher.fetch_one(&VideoRef::from_url(source)).await {
                Some(fetched) => {
                    stats.downloaded_videos += 1;
                    Some(fetched)
                }
                None => None,
            }
        };

        match local {
            Some(video) => self.process(vec![video], &mut stats).await,
            None => stats.errors.push(format!("Could not acquire '{source}'")),
        }

        self.cleanup().await;
        stats
    }

    fn new_stats(&self) -> RunStats {
        RunStats::for_platforms(self.platforms.keys().map(String::as_str))
    }

    /// List and fetch recent videos from every authorized channel, with
    /// bounded fetch concurrency.
    async fn acquire(&self, max_per_channel: usize, stats: &mut RunStats) -> Vec<PathBuf> {
        let mut listed = Vec::new();
        for channel in &self.config.authorized_channels {
            listed.extend(self.fetcher.list_videos(channel, max_per_channel).await);
        }
        info!("{} videos listed across {} channels", listed.len(), self.config.authorized_channels.len());

        let total = listed.len();
        let items = listed
            .into_iter()
            .enumerate()
            .map(|(i, video)| WorkItem::new(video, i + 1, total))
            .collect();

        let fetcher = Arc::clone(&self.fetcher);
        let results = WorkDispatcher::new(self.config.fetch_pool_size)
            .dispatch(items, move |item| {
                let fetcher = Arc::clone(&fetcher);
                async move { fetcher.fetch_one(&item.payload).await }
            })
            .await;

        let mut sources = Vec::new();
        for (item, result) in results {
            match result {
                Ok(Some(path)) => {
                    stats.downloaded_videos += 1;
                    sources.push(path);
                }
                // The fetcher already logged why it produced nothing.
                Ok(None) => {}
                Err(e) => stats
                    .errors
                    .push(format!("Fetch crashed for '{}': {e}", item.payload.title)),
            }
        }
        sources.sort();
        sources
    }

    /// Process all sources through bounded per-video workers and merge their
    /// outcomes.
    async fn process(&self, sources: Vec<PathBuf>, stats: &mut RunStats) {
        let total = sources.len();
        let items = sources
            .into_iter()
            .enumerate()
            .map(|(i, path)| WorkItem::new(path, i + 1, total))
            .collect();

        let detector = Arc::clone(&self.detector);
        let renderer = Arc::clone(&self.renderer);
        let platforms = Arc::clone(&self.platforms);
        let results = WorkDispatcher::new(self.config.process_pool_size)
            .dispatch(items, move |item| {
                process_video(
                    Arc::clone(&detector),
                    Arc::clone(&renderer),
                    Arc::clone(&platforms),
                    item,
                )
            })
            .await;

        for (item, result) in results {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => VideoOutcome::failed(format!(
                    "Processing crashed for {}: {e}",
                    item.payload.display()
                )),
            };
            stats.merge(outcome);
        }
    }

    async fn cleanup(&self) {
        self.fetcher.cleanup().await;
        self.renderer.cleanup().await;
        self.file_store.cleanup_temp_videos().await;
    }
}

/// Detect and render clips for one source video.
///
/// Runs inside a worker task and touches no shared state; all results and
/// failures land in the returned outcome.
async fn process_video(
    detector: Arc<HighlightDetector>,
    renderer: Arc<dyn Renderer>,
    platforms: Arc<HashMap<String, PlatformSpec>>,
    item: WorkItem<PathBuf>,
) -> VideoOutcome {
    let video = &item.payload;
    info!(
        "[{}/{} {:.0}%] Processing {}",
        item.index,
        item.total,
        item.progress_percent(),
        video.display()
    );

    let clips = match detector.detect(video).await {
        Ok(clips) => clips,
        Err(e) => return VideoOutcome::failed(e.to_string()),
    };

    if clips.is_empty() {
        return VideoOutcome::no_result(format!(
            "No interesting clip found in {}",
            video.display()
        ));
    }

    let mut outcome = VideoOutcome {
        analyzed: 1,
        ..VideoOutcome::default()
    };

    for clip in &clips {
        for (platform, spec) in platforms.iter() {
            match renderer.render(clip, video, platform, spec).await {
                Ok(rendered) => {
                    debug!("Rendered {}", rendered.display());
                    outcome.clips += 1;
                    *outcome.clips_by_platform.entry(platform.clone()).or_insert(0) += 1;
                }
                Err(e) => outcome.errors.push(format!(
                    "Render failed for {} ({platform}): {e}",
                    video.display()
                )),
            }
        }
    }

    outcome
}
