//! Conversion Policy
//!
//! Decides, per source file, which targets need (re)generation and how each
//! one is encoded. A target is required when its output is missing or when
//! force is set. WebP for an animated GIF goes through the transcoder; every
//! other target uses the still-image converter.

use crate::encoder::EncoderBackend;
use crate::error::{ConvertError, Result};
use crate::formats::TargetFormat;
use shared_utils::common_utils::{base_name, get_extension_lowercase};
use shared_utils::CancelToken;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Lowercase, without the dot.
    pub extension: String,
}

impl InputFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = get_extension_lowercase(&path);
        Self { path, extension }
    }

    /// Path minus extension; outputs are `base_name + "." + target`.
    pub fn base_name(&self) -> PathBuf {
        base_name(&self.path)
    }

    pub fn is_gif(&self) -> bool {
        self.extension == "gif"
    }

    pub fn output_path(&self, target: TargetFormat) -> PathBuf {
        target.output_path(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStrategy {
    /// Still-image converter, format inferred from the output extension.
    Still,
    /// Transcoder producing an animated WebP.
    AnimatedWebp,
}

#[derive(Debug)]
pub enum TargetAction {
    Encode(EncodeStrategy),
    /// The strategy could not be decided; the target fails without running
    /// an encoder.
    Fail(ConvertError),
}

#[derive(Debug)]
pub struct PlannedTarget {
    pub target: TargetFormat,
    pub output: PathBuf,
    pub action: TargetAction,
}

#[derive(Debug)]
pub struct ConversionJob {
    pub input: InputFile,
    pub targets: Vec<PlannedTarget>,
}

impl ConversionJob {
    /// Nothing to do: every output exists and force is off.
    pub fn is_up_to_date(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Targets whose output is missing, or all of them under `force`.
pub fn required_targets(input: &InputFile, force: bool) -> Vec<TargetFormat> {
    TargetFormat::ALL
        .into_iter()
        .filter(|t| force || !input.output_path(*t).exists())
        .collect()
}

/// Animated means more than one frame.
pub fn is_animated_gif<B: EncoderBackend + ?Sized>(
    input: &InputFile,
    backend: &B,
    cancel: &CancelToken,
) -> Result<bool> {
    if !input.is_gif() {
        return Ok(false);
    }
    let frames = backend.frame_count(&input.path, cancel)?;
    debug!(path = %input.path.display(), frames, "GIF frame count");
    Ok(frames > 1)
}

fn webp_action<B: EncoderBackend + ?Sized>(
    input: &InputFile,
    backend: &B,
    cancel: &CancelToken,
) -> TargetAction {
    match is_animated_gif(input, backend, cancel) {
        Ok(true) => TargetAction::Encode(EncodeStrategy::AnimatedWebp),
        Ok(false) => TargetAction::Encode(EncodeStrategy::Still),
        Err(e) => TargetAction::Fail(e),
    }
}

/// Build the job for one file. The frame probe runs only when WebP is
/// actually required.
pub fn plan_job<B: EncoderBackend + ?Sized>(
    path: &Path,
    force: bool,
    backend: &B,
    cancel: &CancelToken,
) -> ConversionJob {
    let input = InputFile::new(path);
    let targets = required_targets(&input, force)
        .into_iter()
        .map(|target| {
            let action = match target {
                TargetFormat::Webp => webp_action(&input, backend, cancel),
                _ => TargetAction::Encode(EncodeStrategy::Still),
            };
            PlannedTarget {
                target,
                output: input.output_path(target),
                action,
            }
        })
        .collect();

    ConversionJob { input, targets }
}
