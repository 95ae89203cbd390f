//! Run-level statistics accumulation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Partial result computed locally by one per-video worker.
///
/// Workers never touch shared state; they hand one of these back and the
/// coordinating task merges it into the run's [`RunStats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoOutcome {
    /// 1 if the video was analyzed and yielded clips, 0 otherwise.
    pub analyzed: u64,
    /// Total clips rendered for this video across all platforms.
    pub clips: u64,
    /// Rendered clip count per platform.
    pub clips_by_platform: HashMap<String, u64>,
    /// Error and note strings recorded while processing this video.
    pub errors: Vec<String>,
}

impl VideoOutcome {
    /// Outcome for a video that produced no interesting clips.
    pub fn no_result(note: impl Into<String>) -> Self {
        Self {
            errors: vec![note.into()],
            ..Self::default()
        }
    }

    /// Outcome for a video whose processing failed outright.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }
}

/// The single mutable aggregate report object for one pipeline run.
///
/// Created once per run and mutated only by the orchestrator; merging is
/// commutative so final counts do not depend on worker completion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub downloaded_videos: u64,
    pub analyzed_videos: u64,
    pub generated_clips: u64,
    pub clips_by_platform: HashMap<String, u64>,
    pub errors: Vec<String>,
}

impl RunStats {
    /// Create stats with one zeroed counter per known platform.
    pub fn for_platforms<'a>(platforms: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            clips_by_platform: platforms.into_iter().map(|p| (p.to_string(), 0)).collect(),
            ..Self::default()
        }
    }

    /// Merge one worker's partial result. The sole synchronization point of
    /// the run; must be called from the coordinating task only.
    pub fn merge(&mut self, outcome: VideoOutcome) {
        self.analyzed_videos += outcome.analyzed;
        self.generated_clips += outcome.clips;
        for (platform, count) in outcome.clips_by_platform {
            *self.clips_by_platform.entry(platform).or_insert(0) += count;
        }
        self.errors.extend(outcome.errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(clips: u64, platform: &str) -> VideoOutcome {
        VideoOutcome {
            analyzed: 1,
            clips,
            clips_by_platform: HashMap::from([(platform.to_string(), clips)]),
            errors: vec![],
        }
    }

    #[test]
    fn test_merge_accumulates() {
        let mut stats = RunStats::for_platforms(["tiktok"]);
        stats.merge(outcome(3, "tiktok"));
        stats.merge(outcome(2, "tiktok"));

        assert_eq!(stats.analyzed_videos, 2);
        assert_eq!(stats.generated_clips, 5);
        assert_eq!(stats.clips_by_platform["tiktok"], 5);
    }

    #[test]
    fn test_merge_is_order_insensitive_for_counts() {
        let a = outcome(3, "tiktok");
        let mut b = outcome(2, "youtube_shorts");
        b.errors.push("boom".to_string());

        let mut forward = RunStats::default();
        forward.merge(a.clone());
        forward.merge(b.clone());

        let mut reverse = RunStats::default();
        reverse.merge(b);
        reverse.merge(a);

        assert_eq!(forward.generated_clips, reverse.generated_clips);
        assert_eq!(forward.analyzed_videos, reverse.analyzed_videos);
        assert_eq!(forward.clips_by_platform, reverse.clips_by_platform);
        assert_eq!(forward.errors.len(), reverse.errors.len());
    }

    #[test]
    fn test_merge_unknown_platform_creates_counter() {
        let mut stats = RunStats::for_platforms(["tiktok"]);
        stats.merge(outcome(1, "instagram_reels"));
        assert_eq!(stats.clips_by_platform["instagram_reels"], 1);
        assert_eq!(stats.clips_by_platform["tiktok"], 0);
    }
}
