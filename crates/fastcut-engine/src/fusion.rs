//! Signal fusion scoring.
//!
//! Combines an audio-energy timeline, detected speech segments and a
//! visual-activity timeline into a single ranked list of candidate moments.
//! Fusion is additive: each signal contributes a weighted amount to the score
//! of its own timestamps.

use std::collections::HashMap;

use fastcut_models::{CandidateMoment, SpeechSegment, TimelinePoint};

/// Weight applied to energy samples above the energy threshold.
const ENERGY_WEIGHT: f64 = 0.4;

/// Weight applied to visual-activity samples above the activity threshold.
const ACTIVITY_WEIGHT: f64 = 0.3;

/// Flat bonus for scored timestamps that fall inside a speech segment.
const SPEECH_BONUS: f64 = 0.3;

/// Fusion thresholds and options.
#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// Minimum normalized energy for a sample to contribute.
    pub energy_threshold: f64,
    /// Minimum normalized visual activity for a sample to contribute.
    pub activity_threshold: f64,
    /// Optional shared sampling grid (seconds). When set, timestamps are
    /// snapped to the nearest grid point before fusing, so samples from
    /// timelines with different hop sizes can reinforce each other.
    ///
    /// Caveat: the default (`None`) keys scores by the exact timestamp
    /// value, which means cross-timeline reinforcement only happens when
    /// two producers emit a bit-identical stamp. That matches the scoring
    /// output this engine has always produced; snapping is a deliberate,
    /// opt-in change to it.
    pub grid: Option<f64>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 0.7,
            activity_threshold: 0.3,
            grid: None,
        }
    }
}

/// Score accumulator keyed by exact timestamp, preserving first-seen order
/// so equal scores rank in input order after the final stable sort.
#[derive(Default)]
struct ScoreMap {
    order: Vec<f64>,
    scores: HashMap<u64, f64>,
}

impl ScoreMap {
    fn add(&mut self, timestamp: f64, delta: f64) {
        let key = timestamp.to_bits();
        match self.scores.get_mut(&key) {
            Some(score) => *score += delta,
            None => {
                self.scores.insert(key, delta);
                self.order.push(timestamp);
            }
        }
    }

    fn bump(&mut self, timestamp: f64, delta: f64) -> bool {
        if let Some(score) = self.scores.get_mut(&timestamp.to_bits()) {
            *score += delta;
            true
        } else {
            false
        }
    }

    fn into_moments(self) -> Vec<CandidateMoment> {
        let scores = self.scores;
        self.order
            .into_iter()
            .map(|timestamp| CandidateMoment {
                timestamp,
                score: scores[&timestamp.to_bits()],
            })
            .collect()
    }
}

fn snap(timestamp: f64, grid: Option<f64>) -> f64 {
    match grid {
        Some(step) if step > 0.0 => (timestamp / step).round() * step,
        _ => timestamp,
    }
}

/// Fuse the three signal timelines into candidate moments, ranked by score
/// descending.
///
/// Empty inputs yield an empty result. The speech bonus only applies to
/// timestamps that already scored through energy or activity; it never
/// introduces candidates of its own.
pub fn fuse_signals(
    energy: &[TimelinePoint],
    speech: &[SpeechSegment],
    activity: &[TimelinePoint],
    config: &FusionConfig,
) -> Vec<CandidateMoment> {
    let mut scores = ScoreMap::default();

    for point in energy {
        if point.value > config.energy_threshold {
            scores.add(snap(point.timestamp, config.grid), point.value * ENERGY_WEIGHT);
        }
    }

    for point in activity {
        if point.value > config.activity_threshold {
            scores.add(snap(point.timestamp, config.grid), point.value * ACTIVITY_WEIGHT);
        }
    }

    for segment in speech {
        let timestamps: Vec<f64> = scores
            .order
            .iter()
            .copied()
            .filter(|ts| segment.contains(*ts))
            .collect();
        for ts in timestamps {
            scores.bump(ts, SPEECH_BONUS);
        }
    }

    let mut moments = scores.into_moments();
    moments.sort_by(|a, b| b.score.total_cmp(&a.score));
    moments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(samples: &[(f64, f64)]) -> Vec<TimelinePoint> {
        samples
            .iter()
            .map(|&(t, v)| TimelinePoint::new(t, v))
            .collect()
    }

    #[test]
    fn test_empty_inputs_produce_empty_output() {
        let moments = fuse_signals(&[], &[], &[], &FusionConfig::default());
        assert!(moments.is_empty());
    }

    #[test]
    fn test_energy_below_threshold_is_ignored() {
        let energy = points(&[(1.0, 0.5), (2.0, 0.9)]);
        let moments = fuse_signals(&energy, &[], &[], &FusionConfig::default());

        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].timestamp, 2.0);
        assert!((moments[0].score - 0.9 * 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_identical_timestamps_reinforce() {
        let energy = points(&[(3.0, 0.8)]);
        let activity = points(&[(3.0, 0.5)]);
        let moments = fuse_signals(&energy, &[], &activity, &FusionConfig::default());

        assert_eq!(moments.len(), 1);
        assert!((moments[0].score - (0.8 * 0.4 + 0.5 * 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_independent_grids_do_not_reinforce() {
        // Different hop sizes: near-identical but not bit-identical stamps.
        let energy = points(&[(3.0, 0.8)]);
        let activity = points(&[(3.0000001, 0.5)]);
        let moments = fuse_signals(&energy, &[], &activity, &FusionConfig::default());

        assert_eq!(moments.len(), 2);
    }

    #[test]
    fn test_grid_snapping_is_opt_in() {
        let energy = points(&[(3.01, 0.8)]);
        let activity = points(&[(2.98, 0.5)]);
        let config = FusionConfig {
            grid: Some(0.5),
            ..FusionConfig::default()
        };
        let moments = fuse_signals(&energy, &[], &activity, &config);

        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].timestamp, 3.0);
    }

    #[test]
    fn test_speech_bonus_only_applies_to_scored_timestamps() {
        let energy = points(&[(5.0, 0.9)]);
        let speech = vec![SpeechSegment::new(0.0, 10.0)];
        let moments = fuse_signals(&energy, &speech, &[], &FusionConfig::default());

        // 5.0 gets the bonus; no new timestamps appear from speech alone.
        assert_eq!(moments.len(), 1);
        assert!((moments[0].score - (0.9 * 0.4 + 0.3)).abs() < 1e-9);

        let speech_only = fuse_signals(&[], &speech, &[], &FusionConfig::default());
        assert!(speech_only.is_empty());
    }

    #[test]
    fn test_speech_segment_bounds_are_inclusive() {
        let energy = points(&[(2.0, 0.8), (5.0, 0.8)]);
        let speech = vec![SpeechSegment::new(2.0, 5.0)];
        let moments = fuse_signals(&energy, &speech, &[], &FusionConfig::default());

        for moment in &moments {
            assert!((moment.score - (0.8 * 0.4 + 0.3)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_output_ranked_by_score_descending() {
        let energy = points(&[(1.0, 0.75), (2.0, 0.95), (3.0, 0.85)]);
        let moments = fuse_signals(&energy, &[], &[], &FusionConfig::default());

        let scores: Vec<f64> = moments.iter().map(|m| m.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(moments[0].timestamp, 2.0);
    }
}
