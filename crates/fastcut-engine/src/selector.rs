//! Clip window selection.
//!
//! Turns ranked candidate moments into a bounded set of valid,
//! non-overlapping clip windows under duration constraints.

use std::path::Path;

use rand::Rng;

use fastcut_models::{CandidateMoment, Clip};

/// How many ranked candidates to consider per requested clip, to tolerate
/// rejections from overlap and duration constraints.
const CANDIDATE_OVERSAMPLE: usize = 3;

/// Duration and count constraints for selection.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Minimum clip duration in whole seconds.
    pub min_clip_duration: u32,
    /// Maximum clip duration in whole seconds.
    pub max_clip_duration: u32,
    /// Maximum clips to accept per video.
    pub clips_per_video: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_clip_duration: 15,
            max_clip_duration: 60,
            clips_per_video: 3,
        }
    }
}

/// Select at most `clips_per_video` non-overlapping clips from ranked
/// candidates.
///
/// Each candidate gets a duration drawn uniformly (inclusive) from the
/// configured range, centered on its timestamp and clamped to the video
/// bounds; windows clamped below the minimum duration are pulled backward
/// from the end. The randomized duration makes boundaries non-deterministic
/// by design, so callers that need reproducible output inject a seeded
/// `Rng`. Returned clips are sorted by score descending (stable).
pub fn select_clips<R: Rng>(
    candidates: &[CandidateMoment],
    video_duration: f64,
    source: &Path,
    config: &SelectorConfig,
    rng: &mut R,
) -> Vec<Clip> {
    let mut clips: Vec<Clip> = Vec::new();

    let considered = candidates
        .iter()
        .take(config.clips_per_video * CANDIDATE_OVERSAMPLE);

    for moment in considered {
        let duration =
            f64::from(rng.random_range(config.min_clip_duration..=config.max_clip_duration));

        let mut start = (moment.timestamp - duration / 2.0).max(0.0);
        let end = (start + duration).min(video_duration);

        // Clamped against the end of the video: pull the start backward to
        // restore the minimum duration.
        if end - start < f64::from(config.min_clip_duration) {
            start = (end - f64::from(config.min_clip_duration)).max(0.0);
        }

        let overlaps = clips
            .iter()
            .any(|accepted| !(end <= accepted.start_time || start >= accepted.end_time));

        if !overlaps && clips.len() < config.clips_per_video {
            let clip = Clip::new(start, end, moment.score, source);
            if clip.is_valid() {
                clips.push(clip);
            }
        }
    }

    clips.sort_by(|a, b| b.score.total_cmp(&a.score));
    clips
}
