//! Work units for the bounded dispatcher.

/// One unit of per-video work plus its position in the current run.
///
/// `index` is 1-based; `index`/`total` exist only for progress reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem<T> {
    pub payload: T,
    pub index: usize,
    pub total: usize,
}

impl<T> WorkItem<T> {
    pub fn new(payload: T, index: usize, total: usize) -> Self {
        Self {
            payload,
            index,
            total,
        }
    }

    /// Progress through the run as a percentage, for log lines.
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.index as f64 / self.total as f64) * 100.0
        }
    }
}
