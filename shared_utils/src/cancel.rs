//! Run-wide cancellation flag.
//!
//! Set once from the Ctrl-C handler; read by workers, the subprocess
//! supervisor and the progress display loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Install a SIGINT/SIGTERM handler that trips `token`.
///
/// A second interrupt while the first is still being honoured exits
/// immediately.
pub fn install_ctrlc_handler(token: &CancelToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        if token.is_cancelled() {
            std::process::exit(crate::app_error::EXIT_CANCELLED);
        }
        eprintln!("\n⚠️  Interrupted, stopping encoders...");
        token.cancel();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancel_visible_across_threads() {
        let token = CancelToken::new();
        let worker = {
            let token = token.clone();
            std::thread::spawn(move || {
                while !token.is_cancelled() {
                    std::thread::yield_now();
                }
                true
            })
        };
        token.cancel();
        assert!(worker.join().unwrap());
    }
}
