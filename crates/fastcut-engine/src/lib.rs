//! Highlight detection engine.
//!
//! Turns independently sampled signal timelines (audio energy, speech
//! presence, visual motion) into ranked, non-overlapping clip windows:
//!
//! 1. [`fusion`] combines the timelines into scored candidate moments.
//! 2. [`selector`] builds bounded, duration-constrained windows from them.
//! 3. [`detector`] composes both behind one entry point and drives the
//!    analysis collaborators defined in [`traits`].

pub mod detector;
pub mod error;
pub mod fusion;
pub mod selector;
pub mod traits;

pub use detector::{DetectionConfig, HighlightDetector};
pub use error::{EngineError, EngineResult};
pub use fusion::{fuse_signals, FusionConfig};
pub use selector::{select_clips, SelectorConfig};
