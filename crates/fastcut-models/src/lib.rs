//! Shared data models for the FastCut pipeline.

pub mod clip;
pub mod platform;
pub mod stats;
pub mod timeline;
pub mod video;
pub mod work;

pub use clip::{CandidateMoment, Clip};
pub use platform::{default_platform_specs, load_platform_specs, PlatformFileError, PlatformSpec};
pub use stats::{RunStats, VideoOutcome};
pub use timeline::{SpeechSegment, TimelinePoint, WordSpan};
pub use video::{VideoInfo, VideoRef};
pub use work::WorkItem;
