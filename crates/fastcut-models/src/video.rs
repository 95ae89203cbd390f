//! Source video descriptors.

use serde::{Deserialize, Serialize};

/// Basic stream information for a local video file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds.
    pub duration: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate.
    pub fps: f64,
}

impl VideoInfo {
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            f64::from(self.width) / f64::from(self.height)
        }
    }
}

/// Metadata for a remote video known to the fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    /// Provider-side video id.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Direct URL used for fetching.
    pub url: String,
    /// Duration in seconds when the listing exposes it.
    pub duration: Option<f64>,
    /// Channel this video was listed from (empty for ad-hoc URLs).
    pub channel: String,
}

impl VideoRef {
    /// Build a reference for an ad-hoc URL supplied directly by the user.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: String::new(),
            title: url.clone(),
            url,
            duration: None,
            channel: String::new(),
        }
    }
}
