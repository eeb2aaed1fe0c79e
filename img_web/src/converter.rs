//! Per-file conversion
//!
//! Runs the planned targets of one source file in order (jxl, avif, webp),
//! classifies the result and reports it on the progress tracker. A failing
//! target never stops the remaining targets of the same file.

use crate::conversion_api::{plan_job, EncodeStrategy, PlannedTarget, TargetAction};
use crate::encoder::EncoderBackend;
use crate::error::ConvertError;
use crate::formats::TargetFormat;
use console::style;
use shared_utils::{CancelToken, ProgressTracker};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Regenerate outputs that already exist.
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Every required target was produced.
    Converted,
    /// Some targets produced, at least one failed.
    PartiallyConverted,
    /// Targets were required and none was produced.
    Failed,
    /// All outputs already existed.
    Skipped,
    /// Interrupted before the file finished.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct TargetFailure {
    pub target: TargetFormat,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub converted: Vec<TargetFormat>,
    pub failures: Vec<TargetFailure>,
    /// Combined size of the outputs written for this file.
    pub output_bytes: u64,
}

impl FileResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            outcome: FileOutcome::Skipped,
            converted: Vec::new(),
            failures: Vec::new(),
            output_bytes: 0,
        }
    }

    fn classify(&mut self) {
        self.outcome = match (self.converted.is_empty(), self.failures.is_empty()) {
            (_, true) => FileOutcome::Converted,
            (false, false) => FileOutcome::PartiallyConverted,
            (true, false) => FileOutcome::Failed,
        };
    }

    fn failed_targets(&self) -> String {
        self.failures
            .iter()
            .map(|f| f.target.extension())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Failure messages joined into one line, `None` when nothing failed.
    pub fn error_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(|f| format!("{}: {}", f.target, f.message))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// The line printed once the file is done. Cancelled files print nothing.
    pub fn status_line(&self) -> Option<String> {
        let path = self.path.display();
        match self.outcome {
            FileOutcome::Converted => Some(format!("Converted: {}", path)),
            FileOutcome::Skipped => Some(format!("Skipped (already converted): {}", path)),
            FileOutcome::PartiallyConverted => Some(format!(
                "Partially converted: {} (failed: {})",
                path,
                self.failed_targets()
            )),
            FileOutcome::Failed => Some(format!("Failed: {}", path)),
            FileOutcome::Cancelled => None,
        }
    }

    /// `status_line` with terminal colors; console drops them when stdout is
    /// not a terminal.
    pub fn styled_status_line(&self) -> Option<String> {
        let line = self.status_line()?;
        Some(match self.outcome {
            FileOutcome::Converted => style(line).green().to_string(),
            FileOutcome::Skipped => style(line).dim().to_string(),
            FileOutcome::PartiallyConverted => style(line).yellow().to_string(),
            FileOutcome::Failed => style(line).red().to_string(),
            FileOutcome::Cancelled => line,
        })
    }
}

fn encode_target<B: EncoderBackend + ?Sized>(
    input: &Path,
    output: &Path,
    strategy: EncodeStrategy,
    backend: &B,
    cancel: &CancelToken,
) -> Result<(), ConvertError> {
    let existed = output.exists();
    let result = match strategy {
        EncodeStrategy::Still => backend.encode_still(input, output, cancel),
        EncodeStrategy::AnimatedWebp => backend.encode_animated_webp(input, output, cancel),
    };
    if result.is_err() && !existed {
        remove_partial_output(output);
    }
    result
}

/// A failed or interrupted encoder may leave a truncated file behind, which
/// a later run would take as already converted.
fn remove_partial_output(output: &Path) {
    if output.exists() {
        match fs::remove_file(output) {
            Ok(()) => debug!(path = %output.display(), "Removed partial output"),
            Err(e) => warn!(path = %output.display(), error = %e, "Could not remove partial output"),
        }
    }
}

/// Convert one source file. Never panics on tool failure; everything is
/// folded into the returned `FileResult`.
pub fn convert_file<B: EncoderBackend + ?Sized>(
    path: &Path,
    options: ConvertOptions,
    backend: &B,
    cancel: &CancelToken,
) -> FileResult {
    let mut result = FileResult::new(path);
    if cancel.is_cancelled() {
        result.outcome = FileOutcome::Cancelled;
        return result;
    }

    let job = plan_job(path, options.force, backend, cancel);
    if job.is_up_to_date() {
        debug!(path = %path.display(), "All outputs present");
        return result;
    }

    for PlannedTarget { target, output, action } in job.targets {
        if cancel.is_cancelled() {
            result.outcome = FileOutcome::Cancelled;
            return result;
        }

        let outcome = match action {
            TargetAction::Encode(strategy) => encode_target(path, &output, strategy, backend, cancel),
            TargetAction::Fail(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                result.output_bytes += fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
                result.converted.push(target);
            }
            // an interrupt reaches the child's process group too, so a tool
            // killed by the signal shows up as a failure before the token is read
            Err(e) if e.is_cancelled() || cancel.is_cancelled() => {
                debug!(path = %path.display(), target = %target, error = %e, "Target interrupted");
                result.outcome = FileOutcome::Cancelled;
                return result;
            }
            Err(e) => {
                let message = e.short_message();
                warn!(
                    path = %path.display(),
                    target = %target,
                    error = %message,
                    "Target conversion failed"
                );
                result.failures.push(TargetFailure { target, message });
            }
        }
    }

    result.classify();
    info!(
        path = %path.display(),
        outcome = ?result.outcome,
        converted = result.converted.len(),
        failed = result.failures.len(),
        "File processed"
    );
    result
}

/// `convert_file` plus reporting: prints the status line and counts the file
/// on `tracker` exactly once.
pub fn process_file<B: EncoderBackend + ?Sized>(
    path: &Path,
    options: ConvertOptions,
    backend: &B,
    cancel: &CancelToken,
    tracker: &ProgressTracker,
    quiet: bool,
) -> FileResult {
    let result = convert_file(path, options, backend, cancel);
    if !quiet {
        if let Some(line) = result.styled_status_line() {
            tracker.println(&line);
        }
    }
    tracker.increment();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use shared_utils::AppError;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes outputs; fails the targets listed in `fail`.
    #[derive(Default)]
    struct Scripted {
        frames: u32,
        fail: Vec<&'static str>,
        cancel_on: Option<&'static str>,
        partial_on_fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn run(&self, kind: &str, output: &Path, cancel: &CancelToken) -> Result<()> {
            let ext = output.extension().unwrap().to_str().unwrap().to_string();
            self.calls.lock().unwrap().push(format!("{}:{}", kind, ext));
            if self.cancel_on == Some(ext.as_str()) {
                cancel.cancel();
                fs::write(output, b"half").unwrap();
                return Err(AppError::Cancelled.into());
            }
            if self.fail.iter().any(|f| *f == ext) {
                if self.partial_on_fail {
                    fs::write(output, b"half").unwrap();
                }
                return Err(AppError::ToolFailed {
                    tool: "magick".into(),
                    exit_code: Some(1),
                    stderr: "no decode delegate".into(),
                }
                .into());
            }
            fs::write(output, b"encoded").unwrap();
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl EncoderBackend for Scripted {
        fn encode_still(&self, _: &Path, output: &Path, cancel: &CancelToken) -> Result<()> {
            self.run("still", output, cancel)
        }
        fn encode_animated_webp(&self, _: &Path, output: &Path, cancel: &CancelToken) -> Result<()> {
            self.run("anim", output, cancel)
        }
        fn frame_count(&self, _: &Path, _: &CancelToken) -> Result<u32> {
            if self.frames == 0 {
                Err(ConvertError::FrameProbe("no frames".into()))
            } else {
                Ok(self.frames)
            }
        }
    }

    fn source(dir: &TempDir, name: &str) -> PathBuf {
        let p = dir.path().join(name);
        fs::write(&p, b"source").unwrap();
        p
    }

    #[test]
    fn test_converts_all_targets() {
        let dir = TempDir::new().unwrap();
        let png = source(&dir, "a.png");
        let backend = Scripted::default();

        let result = convert_file(&png, ConvertOptions::default(), &backend, &CancelToken::new());
        assert_eq!(result.outcome, FileOutcome::Converted);
        assert_eq!(result.converted, TargetFormat::ALL.to_vec());
        assert_eq!(result.output_bytes, 3 * "encoded".len() as u64);
        assert_eq!(backend.calls(), vec!["still:jxl", "still:avif", "still:webp"]);
        assert_eq!(result.status_line().unwrap(), format!("Converted: {}", png.display()));
    }

    #[test]
    fn test_skipped_when_all_outputs_exist() {
        let dir = TempDir::new().unwrap();
        let png = source(&dir, "a.png");
        for t in TargetFormat::ALL {
            fs::write(t.output_path(&png), b"old").unwrap();
        }
        let backend = Scripted::default();

        let result = convert_file(&png, ConvertOptions::default(), &backend, &CancelToken::new());
        assert_eq!(result.outcome, FileOutcome::Skipped);
        assert!(backend.calls().is_empty());
        assert_eq!(
            result.status_line().unwrap(),
            format!("Skipped (already converted): {}", png.display())
        );
    }

    #[test]
    fn test_one_failure_does_not_stop_other_targets() {
        let dir = TempDir::new().unwrap();
        let png = source(&dir, "a.png");
        let backend = Scripted {
            fail: vec!["avif"],
            partial_on_fail: true,
            ..Default::default()
        };

        let result = convert_file(&png, ConvertOptions::default(), &backend, &CancelToken::new());
        assert_eq!(result.outcome, FileOutcome::PartiallyConverted);
        assert_eq!(result.converted, vec![TargetFormat::Jxl, TargetFormat::Webp]);
        assert!(!TargetFormat::Avif.output_path(&png).exists());
        assert_eq!(
            result.status_line().unwrap(),
            format!("Partially converted: {} (failed: avif)", png.display())
        );
        assert!(result.error_summary().unwrap().contains("no decode delegate"));
    }

    #[test]
    fn test_all_targets_failing_is_failed() {
        let dir = TempDir::new().unwrap();
        let jpg = source(&dir, "a.jpg");
        let backend = Scripted {
            fail: vec!["jxl", "avif", "webp"],
            ..Default::default()
        };

        let result = convert_file(&jpg, ConvertOptions::default(), &backend, &CancelToken::new());
        assert_eq!(result.outcome, FileOutcome::Failed);
        assert_eq!(result.failures.len(), 3);
        assert_eq!(result.status_line().unwrap(), format!("Failed: {}", jpg.display()));
    }

    #[test]
    fn test_failed_forced_rewrite_keeps_previous_output() {
        let dir = TempDir::new().unwrap();
        let png = source(&dir, "a.png");
        let jxl = TargetFormat::Jxl.output_path(&png);
        fs::write(&jxl, b"previous").unwrap();
        let backend = Scripted {
            fail: vec!["jxl"],
            ..Default::default()
        };

        let result = convert_file(&png, ConvertOptions { force: true }, &backend, &CancelToken::new());
        assert_eq!(result.outcome, FileOutcome::PartiallyConverted);
        assert_eq!(fs::read(&jxl).unwrap(), b"previous");
    }

    #[test]
    fn test_animated_gif_webp_goes_through_transcoder() {
        let dir = TempDir::new().unwrap();
        let gif = source(&dir, "anim.gif");
        let backend = Scripted {
            frames: 8,
            ..Default::default()
        };

        let result = convert_file(&gif, ConvertOptions::default(), &backend, &CancelToken::new());
        assert_eq!(result.outcome, FileOutcome::Converted);
        assert_eq!(backend.calls(), vec!["still:jxl", "still:avif", "anim:webp"]);
    }

    #[test]
    fn test_probe_failure_only_loses_webp() {
        let dir = TempDir::new().unwrap();
        let gif = source(&dir, "broken.gif");
        let backend = Scripted::default();

        let result = convert_file(&gif, ConvertOptions::default(), &backend, &CancelToken::new());
        assert_eq!(result.outcome, FileOutcome::PartiallyConverted);
        assert_eq!(backend.calls(), vec!["still:jxl", "still:avif"]);
        assert_eq!(result.failures[0].target, TargetFormat::Webp);
    }

    #[test]
    fn test_cancel_mid_file_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let png = source(&dir, "a.png");
        let backend = Scripted {
            cancel_on: Some("avif"),
            ..Default::default()
        };
        let cancel = CancelToken::new();

        let result = convert_file(&png, ConvertOptions::default(), &backend, &cancel);
        assert_eq!(result.outcome, FileOutcome::Cancelled);
        assert!(result.status_line().is_none());
        assert!(TargetFormat::Jxl.output_path(&png).exists());
        assert!(!TargetFormat::Avif.output_path(&png).exists());
        assert!(!TargetFormat::Webp.output_path(&png).exists());
    }

    /// Tool dies from the same interrupt that trips the token.
    struct KilledBySignal;

    impl EncoderBackend for KilledBySignal {
        fn encode_still(&self, _: &Path, output: &Path, cancel: &CancelToken) -> Result<()> {
            if output.extension().map_or(false, |e| e == "webp") {
                cancel.cancel();
                return Err(AppError::ToolFailed {
                    tool: "magick".into(),
                    exit_code: None,
                    stderr: String::new(),
                }
                .into());
            }
            fs::write(output, b"encoded").unwrap();
            Ok(())
        }
        fn encode_animated_webp(&self, _: &Path, _: &Path, _: &CancelToken) -> Result<()> {
            unreachable!("png input")
        }
        fn frame_count(&self, _: &Path, _: &CancelToken) -> Result<u32> {
            Ok(1)
        }
    }

    #[test]
    fn test_tool_killed_by_interrupt_is_cancelled_not_failed() {
        let dir = TempDir::new().unwrap();
        let png = source(&dir, "a.png");
        let cancel = CancelToken::new();

        let result = convert_file(&png, ConvertOptions::default(), &KilledBySignal, &cancel);
        assert!(cancel.is_cancelled());
        assert_eq!(result.outcome, FileOutcome::Cancelled);
        assert!(result.failures.is_empty());
        assert!(result.status_line().is_none());
        assert!(result.error_summary().is_none());
    }

    #[test]
    fn test_cancelled_before_start_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let png = source(&dir, "a.png");
        let backend = Scripted::default();
        let cancel = CancelToken::new();
        cancel.cancel();

        let tracker = ProgressTracker::hidden(1);
        let result = process_file(&png, ConvertOptions::default(), &backend, &cancel, &tracker, true);
        assert_eq!(result.outcome, FileOutcome::Cancelled);
        assert!(backend.calls().is_empty());
        assert_eq!(tracker.processed(), 1);
    }

    #[test]
    fn test_process_file_counts_once() {
        let dir = TempDir::new().unwrap();
        let png = source(&dir, "a.png");
        let tracker = ProgressTracker::hidden(2);

        process_file(&png, ConvertOptions::default(), &Scripted::default(), &CancelToken::new(), &tracker, true);
        assert_eq!(tracker.processed(), 1);
        process_file(&png, ConvertOptions::default(), &Scripted::default(), &CancelToken::new(), &tracker, true);
        assert_eq!(tracker.processed(), 2);
    }
}
