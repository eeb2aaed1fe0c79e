//! External process supervision
//!
//! Encoders run as child processes. Both pipes are drained on dedicated
//! threads (a tool writing more than the pipe buffer to stderr would otherwise
//! block forever), and the wait loop polls a `CancelToken` so an interrupt
//! kills the child instead of waiting for it.

use crate::app_error::AppError;
use crate::cancel::CancelToken;
use crate::common_utils::format_command_string;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How often the supervisor checks the child and the cancel flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// A spawned tool with its output pipes being drained in the background.
pub struct ToolProcess {
    tool: String,
    child: Child,
    stdout_thread: Option<JoinHandle<String>>,
    stderr_thread: Option<JoinHandle<String>>,
    started: Instant,
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

impl ToolProcess {
    pub fn spawn(tool: &str, args: &[String]) -> Result<Self, AppError> {
        debug!(command = %format_command_string(tool, args), "Executing external command");

        let mut child = Command::new(tool)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AppError::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        let stdout_thread = child.stdout.take().map(drain);
        let stderr_thread = child.stderr.take().map(drain);

        Ok(Self {
            tool: tool.to_string(),
            child,
            stdout_thread,
            stderr_thread,
            started: Instant::now(),
        })
    }

    /// Wait for the child, killing it if `cancel` trips first.
    pub fn wait(mut self, cancel: &CancelToken) -> Result<ToolOutput, AppError> {
        let status = loop {
            if let Some(status) = self.child.try_wait()? {
                break status;
            }
            if cancel.is_cancelled() {
                if let Err(e) = self.child.kill() {
                    warn!(tool = %self.tool, error = %e, "Failed to kill child process");
                }
                let _ = self.child.wait();
                self.join_pipes();
                return Err(AppError::Cancelled);
            }
            thread::sleep(POLL_INTERVAL);
        };

        let (stdout, stderr) = self.join_pipes();
        Ok(ToolOutput {
            status,
            stdout,
            stderr,
            duration: self.started.elapsed(),
        })
    }

    fn join_pipes(&mut self) -> (String, String) {
        let join = |h: Option<JoinHandle<String>>| {
            h.map(|t| t.join().unwrap_or_default()).unwrap_or_default()
        };
        (join(self.stdout_thread.take()), join(self.stderr_thread.take()))
    }
}

/// Run `tool` to completion. A non-zero exit becomes `AppError::ToolFailed`
/// carrying the captured stderr.
pub fn run_tool(tool: &str, args: &[String], cancel: &CancelToken) -> Result<ToolOutput, AppError> {
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled);
    }

    let output = ToolProcess::spawn(tool, args)?.wait(cancel)?;
    crate::logging::log_external_tool(
        tool,
        args,
        &output.stderr,
        output.status.code(),
        output.duration,
    );

    if output.status.success() {
        Ok(output)
    } else {
        Err(AppError::ToolFailed {
            tool: tool.to_string(),
            exit_code: output.status.code(),
            stderr: output.stderr,
        })
    }
}
