//! Environment self-check for the `--test` command.
//!
//! Verifies the external tools and the configuration before any work is
//! attempted, so a broken host fails loudly instead of mid-run.

use std::path::PathBuf;

use tracing::{error, info};

use fastcut_media::{check_ffmpeg, check_ffprobe, check_ytdlp, MediaError};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;

/// Result of probing one external tool.
pub struct ToolCheck {
    pub name: &'static str,
    pub result: Result<PathBuf, MediaError>,
}

/// Probe every external tool the pipeline shells out to.
pub fn check_tools() -> Vec<ToolCheck> {
    vec![
        ToolCheck {
            name: "ffmpeg",
            result: check_ffmpeg(),
        },
        ToolCheck {
            name: "ffprobe",
            result: check_ffprobe(),
        },
        ToolCheck {
            name: "yt-dlp",
            result: check_ytdlp(),
        },
    ]
}

/// Log every check outcome and report whether all of them passed.
pub fn report_checks(tools: &[ToolCheck], config_check: PipelineResult<()>) -> bool {
    let mut ok = true;

    for tool in tools {
        match &tool.result {
            Ok(path) => info!("{}: ok ({})", tool.name, path.display()),
            Err(e) => {
                error!("{}: {}", tool.name, e);
                ok = false;
            }
        }
    }

    match config_check {
        Ok(()) => info!("configuration: ok"),
        Err(e) => {
            error!("configuration: {}", e);
            ok = false;
        }
    }

    ok
}

/// Run the full self-check against the loaded configuration.
pub fn run_system_check(config: &PipelineConfig) -> bool {
    let passed = report_checks(&check_tools(), config.validate());
    if passed {
        info!("System check passed");
    } else {
        error!("System check failed");
    }
    passed
}
