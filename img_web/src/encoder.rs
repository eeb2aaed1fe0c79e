//! Encoder backends
//!
//! The converter never talks to a tool directly; it goes through
//! `EncoderBackend`. `ExternalEncoder` is the production backend:
//! ImageMagick for still images and frame probing, FFmpeg for animated WebP.

use crate::error::{ConvertError, Result};
use shared_utils::{run_tool, safe_path_arg, AppError, CancelToken, IMAGE_CONVERTER, MEDIA_TRANSCODER};
use std::path::Path;

/// Fixed FFmpeg parameters for animated GIF → animated WebP.
pub mod animated_webp {
    /// Round both dimensions down to even values.
    pub const EVEN_SCALE_FILTER: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";
    pub const CODEC: &str = "libwebp";
    /// 0 = loop forever
    pub const LOOP: &str = "0";
    pub const PRESET: &str = "picture";
    pub const QUALITY: &str = "80";
    pub const COMPRESSION_LEVEL: &str = "6";
}

pub trait EncoderBackend: Send + Sync {
    /// Convert with the still-image converter; format follows `output`'s extension.
    fn encode_still(&self, input: &Path, output: &Path, cancel: &CancelToken) -> Result<()>;

    /// Transcode an animated GIF to an animated, infinitely looping WebP.
    fn encode_animated_webp(&self, input: &Path, output: &Path, cancel: &CancelToken)
        -> Result<()>;

    /// Number of frames in `input`.
    fn frame_count(&self, input: &Path, cancel: &CancelToken) -> Result<u32>;
}

#[derive(Debug, Clone)]
pub struct ExternalEncoder {
    converter: String,
    transcoder: String,
}

impl Default for ExternalEncoder {
    fn default() -> Self {
        Self {
            converter: IMAGE_CONVERTER.to_string(),
            transcoder: MEDIA_TRANSCODER.to_string(),
        }
    }
}

impl ExternalEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn still_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        safe_path_arg(input).into_owned(),
        safe_path_arg(output).into_owned(),
    ]
}

pub fn animated_webp_args(input: &Path, output: &Path) -> Vec<String> {
    use animated_webp::*;
    [
        "-nostdin",
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-i",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(safe_path_arg(input).into_owned()))
    .chain(
        [
            "-vf",
            EVEN_SCALE_FILTER,
            "-c:v",
            CODEC,
            "-loop",
            LOOP,
            "-preset",
            PRESET,
            "-quality",
            QUALITY,
            "-compression_level",
            COMPRESSION_LEVEL,
            "-an",
        ]
        .iter()
        .map(|s| s.to_string()),
    )
    .chain(std::iter::once(safe_path_arg(output).into_owned()))
    .collect()
}

/// `%n` prints the sequence length once per frame.
pub fn identify_args(input: &Path) -> Vec<String> {
    vec![
        "identify".to_string(),
        "-format".to_string(),
        "%n\n".to_string(),
        safe_path_arg(input).into_owned(),
    ]
}

/// First non-empty line of `identify -format "%n\n"` output.
pub fn parse_frame_count(stdout: &str) -> Result<u32> {
    let first = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ConvertError::FrameProbe("empty identify output".to_string()))?;
    first
        .parse::<u32>()
        .map_err(|_| ConvertError::FrameProbe(format!("unexpected identify output: {:?}", first)))
}

impl EncoderBackend for ExternalEncoder {
    fn encode_still(&self, input: &Path, output: &Path, cancel: &CancelToken) -> Result<()> {
        run_tool(&self.converter, &still_args(input, output), cancel)?;
        Ok(())
    }

    fn encode_animated_webp(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancelToken,
    ) -> Result<()> {
        run_tool(&self.transcoder, &animated_webp_args(input, output), cancel)?;
        Ok(())
    }

    fn frame_count(&self, input: &Path, cancel: &CancelToken) -> Result<u32> {
        run_tool(&self.converter, &identify_args(input), cancel)
            .map_err(|e| probe_error(e, cancel))
            .and_then(|out| parse_frame_count(&out.stdout))
    }
}

/// A probe killed by the interrupt is a cancellation, not an unreadable GIF.
pub fn probe_error(err: AppError, cancel: &CancelToken) -> ConvertError {
    if matches!(err, AppError::Cancelled) || cancel.is_cancelled() {
        return ConvertError::Tool(AppError::Cancelled);
    }
    ConvertError::FrameProbe(ConvertError::Tool(err).short_message())
}
