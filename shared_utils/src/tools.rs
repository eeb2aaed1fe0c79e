//! External tool detection
//!
//! The converter drives ImageMagick for still images and frame probing, and
//! FFmpeg for animated WebP. Both must be on PATH before any work starts.

use crate::app_error::AppError;
use std::path::PathBuf;
use tracing::{debug, info};

/// Still-image converter; also answers frame-count queries.
pub const IMAGE_CONVERTER: &str = "magick";
/// Media transcoder used for animated GIF → animated WebP.
pub const MEDIA_TRANSCODER: &str = "ffmpeg";

pub const REQUIRED_TOOLS: &[&str] = &[IMAGE_CONVERTER, MEDIA_TRANSCODER];

#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub path: Option<PathBuf>,
}

impl ToolInfo {
    pub fn available(&self) -> bool {
        self.path.is_some()
    }
}

pub fn check_tool(name: &str) -> ToolInfo {
    let path = which::which(name).ok();
    debug!(tool = name, path = ?path, "Tool lookup");
    ToolInfo {
        name: name.to_string(),
        path,
    }
}

/// Verify every tool in `names` resolves on PATH. All missing tools are
/// reported together in a single `AppError::ToolsMissing`.
pub fn require_tools(names: &[&str]) -> Result<Vec<ToolInfo>, AppError> {
    let infos: Vec<ToolInfo> = names.iter().map(|n| check_tool(n)).collect();
    let missing: Vec<String> = infos
        .iter()
        .filter(|t| !t.available())
        .map(|t| t.name.clone())
        .collect();

    if !missing.is_empty() {
        return Err(AppError::ToolsMissing { tools: missing });
    }

    for tool in &infos {
        info!(tool = %tool.name, path = ?tool.path, "External tool found");
    }
    Ok(infos)
}

pub fn install_hint(tool: &str) -> Option<&'static str> {
    match tool {
        IMAGE_CONVERTER => Some("install ImageMagick 7 built with JXL/AVIF/WebP delegates"),
        MEDIA_TRANSCODER => Some("install FFmpeg built with libwebp"),
        _ => None,
    }
}
