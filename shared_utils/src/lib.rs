//! Shared Utilities for the img-web converter
//!
//! Batch plumbing that is independent of the target formats:
//! - File discovery and batch result tally
//! - External tool detection
//! - Subprocess supervision with cancellation
//! - Live progress tracking
//! - Worker pool sizing
//! - Logging and summary reporting

pub mod app_error;
pub mod batch;
pub mod cancel;
pub mod common_utils;
pub mod external_process;
pub mod logging;
pub mod progress;
pub mod report;
pub mod thread_manager;
pub mod tools;

pub use app_error::{AppError, EXIT_CANCELLED, EXIT_FAILURE};
pub use batch::{
    base_name_collisions, collect_files, collect_source_images, BatchResult, SOURCE_IMAGE_EXTENSIONS,
};
pub use cancel::{install_ctrlc_handler, CancelToken};
pub use common_utils::{safe_path_arg, sibling_with_extension};
pub use external_process::{run_tool, ToolOutput, ToolProcess};
pub use progress::{percentage, ProgressDisplay, ProgressTracker, DISPLAY_INTERVAL};
pub use report::{format_bytes, format_duration, print_summary_report, SummaryReport};
pub use thread_manager::resolve_worker_count;
pub use tools::{require_tools, ToolInfo, IMAGE_CONVERTER, MEDIA_TRANSCODER, REQUIRED_TOOLS};
