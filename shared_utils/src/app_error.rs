//! AppError - 统一的应用错误类型
//!
//! Startup errors (missing tools, bad input directory) are fatal and map to
//! exit status 1. Subprocess errors are recoverable at the job level.

use std::path::PathBuf;
use thiserror::Error;

/// Exit status for fatal startup errors.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status after an interrupt (128 + SIGINT).
pub const EXIT_CANCELLED: i32 = 130;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("required tools not found: {}", .tools.join(", "))]
    ToolsMissing { tools: Vec<String> },

    #[error("directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("cannot read directory {}: {source}", .path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed{}", exit_suffix(.exit_code))]
    ToolFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!(" (exit code {})", c),
        None => " (terminated by signal)".to_string(),
    }
}

impl AppError {
    /// Fatal errors abort the run before any conversion starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::ToolsMissing { .. }
                | AppError::DirectoryNotFound { .. }
                | AppError::NotADirectory { .. }
                | AppError::DirectoryUnreadable { .. }
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Cancelled => EXIT_CANCELLED,
            _ => EXIT_FAILURE,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AppError::ToolsMissing { tools } => {
                let mut msg = String::from("❌ Required tools are missing:");
                for tool in tools {
                    msg.push_str(&format!("\n   - {}", tool));
                    if let Some(hint) = crate::tools::install_hint(tool) {
                        msg.push_str(&format!("  (💡 {})", hint));
                    }
                }
                msg.push_str("\n💡 Please ensure they are installed and in PATH");
                msg
            }
            AppError::DirectoryNotFound { path } => {
                format!("❌ Directory not found: {}", path.display())
            }
            AppError::NotADirectory { path } => {
                format!("❌ Not a directory: {}", path.display())
            }
            AppError::DirectoryUnreadable { path, source } => {
                format!("❌ Cannot read directory {}: {}", path.display(), source)
            }
            AppError::ToolFailed { stderr, .. } => {
                let mut msg = format!("❌ {}", self);
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    msg.push_str(&format!("\n   Error output: {}", stderr));
                }
                msg
            }
            other => format!("❌ {}", other),
        }
    }
}
