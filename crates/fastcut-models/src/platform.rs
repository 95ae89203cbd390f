//! Target platform rendering specifications.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rendering parameters for one output destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSpec {
    /// Target resolution as (width, height).
    pub resolution: (u32, u32),
    /// Target frame rate.
    pub fps: u32,
    /// Container format, e.g. "mp4".
    pub format: String,
    /// Maximum clip duration accepted by the platform, in seconds.
    pub max_duration: u32,
}

impl PlatformSpec {
    pub fn width(&self) -> u32 {
        self.resolution.0
    }

    pub fn height(&self) -> u32 {
        self.resolution.1
    }
}

fn vertical_1080p() -> PlatformSpec {
    PlatformSpec {
        resolution: (1080, 1920),
        fps: 30,
        format: "mp4".to_string(),
        max_duration: 60,
    }
}

/// Built-in platform presets. Overridable via a JSON spec file.
pub fn default_platform_specs() -> HashMap<String, PlatformSpec> {
    HashMap::from([
        ("youtube_shorts".to_string(), vertical_1080p()),
        ("tiktok".to_string(), vertical_1080p()),
        ("instagram_reels".to_string(), vertical_1080p()),
    ])
}

/// Errors loading a platform spec file.
#[derive(Debug, Error)]
pub enum PlatformFileError {
    #[error("failed to read platform file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid platform file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load platform specs from a JSON file.
///
/// Expected shape:
/// ```json
/// { "tiktok": { "resolution": [1080, 1920], "fps": 30,
///               "format": "mp4", "max_duration": 60 } }
/// ```
pub fn load_platform_specs(path: &Path) -> Result<HashMap<String, PlatformSpec>, PlatformFileError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
