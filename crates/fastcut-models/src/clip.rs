//! Clip and candidate-moment models.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A (timestamp, fused score) pair produced by signal fusion, prior to
/// window construction.
///
/// Scores are additive and have no fixed upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateMoment {
    /// Position in the source video, in seconds.
    pub timestamp: f64,
    /// Fused score (>= 0).
    pub score: f64,
}

/// A validated highlight window of a source video.
///
/// Immutable once constructed; ownership stays with whoever built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Window start, in seconds from the beginning of the source.
    pub start_time: f64,
    /// Window end, in seconds.
    pub end_time: f64,
    /// Window length in seconds (`end_time - start_time`).
    pub duration: f64,
    /// Fused score of the moment this window was built around.
    pub score: f64,
    /// The source video this clip was selected from.
    pub source: PathBuf,
}

impl Clip {
    /// Build a clip from its window bounds.
    pub fn new(start_time: f64, end_time: f64, score: f64, source: impl Into<PathBuf>) -> Self {
        Self {
            start_time,
            end_time,
            duration: end_time - start_time,
            score,
            source: source.into(),
        }
    }

    /// A clip is valid iff it spans a strictly positive window.
    pub fn is_valid(&self) -> bool {
        self.duration > 0.0 && self.start_time < self.end_time
    }

    /// Whether this clip's window intersects another's (non-empty overlap).
    pub fn overlaps(&self, other: &Clip) -> bool {
        !(self.end_time <= other.start_time || self.start_time >= other.end_time)
    }
}
