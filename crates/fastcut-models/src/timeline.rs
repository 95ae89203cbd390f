//! Signal timeline primitives.

use serde::{Deserialize, Serialize};

/// One sample of a normalized signal timeline.
///
/// Producers normalize `value` to [0, 1]. Timelines are ordered by ascending
/// timestamp, but different producers sample on independent grids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    /// Sample position in seconds (>= 0).
    pub timestamp: f64,
    /// Normalized sample value in [0, 1].
    pub value: f64,
}

impl TimelinePoint {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A detected non-silence interval, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechSegment {
    pub start: f64,
    pub end: f64,
}

impl SpeechSegment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Whether a timestamp falls inside this segment (bounds inclusive).
    pub fn contains(&self, timestamp: f64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// A transcribed word with its time bounds, used for subtitle tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSpan {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordSpan {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }
}
