use shared_utils::AppError;
use thiserror::Error;

/// Failure of a single target for a single file.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The GIF frame count could not be determined, so the WebP strategy is
    /// unknown. No WebP is produced for the file.
    #[error("frame count probe failed: {0}")]
    FrameProbe(String),

    #[error(transparent)]
    Tool(#[from] AppError),
}

impl ConvertError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConvertError::Tool(AppError::Cancelled))
    }

    /// One-line description for status lines and the summary.
    pub fn short_message(&self) -> String {
        match self {
            ConvertError::Tool(AppError::ToolFailed { stderr, .. }) => {
                match stderr.lines().map(str::trim).find(|l| !l.is_empty()) {
                    Some(first) => format!("{}: {}", self, first),
                    None => self.to_string(),
                }
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
