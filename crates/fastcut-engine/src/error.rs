//! Engine error types.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while detecting highlights in one source video.
///
/// Always scoped to a single video; the pipeline treats these as soft,
/// per-item failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("analysis failed for {video}: {message}")]
    Analysis { video: String, message: String },
}

impl EngineError {
    pub fn analysis(video: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analysis {
            video: video.into(),
            message: message.into(),
        }
    }
}
