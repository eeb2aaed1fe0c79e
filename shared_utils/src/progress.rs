//! Batch progress tracking
//!
//! Workers bump a shared atomic counter once per finished file. A single
//! display thread polls that counter on a fixed interval and redraws one
//! status line (`42% (21/50)`) until every file is accounted for or the run
//! is cancelled.

use crate::cancel::CancelToken;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Poll interval of the display loop.
pub const DISPLAY_INTERVAL: Duration = Duration::from_secs(1);

pub mod templates {
    pub const BATCH: &str = "{spinner:.green} {prefix:.cyan.bold} ▕{bar:35.green/black}▏ {msg}";
    pub const PROGRESS_CHARS: &str = "█▓░";
    pub const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
}

/// `floor(count * 100 / total)`, clamped to 100. An empty batch is complete.
pub fn percentage(count: usize, total: usize) -> usize {
    if total == 0 {
        return 100;
    }
    count.min(total) * 100 / total
}

pub fn render_status(count: usize, total: usize) -> String {
    format!("{}% ({}/{})", percentage(count, total), count, total)
}

struct Inner {
    processed: AtomicUsize,
    total: usize,
    bar: ProgressBar,
    /// Print the final status as plain text when the bar cannot draw.
    plain_fallback: bool,
}

/// Shared progress state. Cheap to clone; all clones see the same counter.
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Inner>,
}

impl ProgressTracker {
    /// Tracker drawing to stdout. Terminal detection is left to indicatif:
    /// a non-tty stdout gets no redraws, only the final `P% (c/t)` line.
    pub fn new(total: usize, label: &str) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stdout());
        let style = ProgressStyle::with_template(templates::BATCH)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(templates::PROGRESS_CHARS)
            .tick_chars(templates::SPINNER_CHARS);
        bar.set_style(style);
        bar.set_prefix(label.to_string());
        bar.set_message(render_status(0, total));
        Self::with_bar(total, bar, true)
    }

    /// Tracker that counts but never prints.
    pub fn hidden(total: usize) -> Self {
        Self::with_bar(total, ProgressBar::hidden(), false)
    }

    fn with_bar(total: usize, bar: ProgressBar, plain_fallback: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                processed: AtomicUsize::new(0),
                total,
                bar,
                plain_fallback,
            }),
        }
    }

    pub fn total(&self) -> usize {
        self.inner.total
    }

    pub fn processed(&self) -> usize {
        self.inner.processed.load(Ordering::SeqCst)
    }

    pub fn percentage(&self) -> usize {
        percentage(self.processed(), self.total())
    }

    pub fn is_complete(&self) -> bool {
        self.processed() >= self.total()
    }

    /// Count one finished file and return the new count. Never exceeds the
    /// total: extra increments are dropped and logged.
    pub fn increment(&self) -> usize {
        let total = self.inner.total;
        match self
            .inner
            .processed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < total).then_some(n + 1)
            }) {
            Ok(prev) => prev + 1,
            Err(current) => {
                debug!(current, total, "Progress increment beyond total ignored");
                current
            }
        }
    }

    /// Print a line above the status line without tearing it.
    pub fn println(&self, line: &str) {
        self.inner.bar.suspend(|| println!("{}", line));
    }

    fn redraw(&self) -> usize {
        let count = self.processed();
        self.inner.bar.set_position(count as u64);
        self.inner.bar.set_message(render_status(count, self.total()));
        count
    }

    /// Line to print once the loop ends, for a bar that never drew.
    fn final_plain_line(&self) -> Option<String> {
        (self.inner.plain_fallback && self.inner.bar.is_hidden())
            .then(|| render_status(self.processed(), self.total()))
    }

    /// Start the display loop on its own thread.
    pub fn spawn_display(&self, cancel: CancelToken, interval: Duration) -> ProgressDisplay {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let tracker = self.clone();

        let handle = std::thread::spawn(move || {
            loop {
                let count = tracker.redraw();
                if count >= tracker.total() || cancel.is_cancelled() {
                    break;
                }
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        tracker.redraw();
                        break;
                    }
                }
            }
            tracker.inner.bar.finish();
            if let Some(line) = tracker.final_plain_line() {
                println!("{}", line);
            }
            tracker.processed()
        });

        ProgressDisplay {
            stop: stop_tx,
            handle,
        }
    }
}

/// Handle to the running display loop.
pub struct ProgressDisplay {
    stop: Sender<()>,
    handle: JoinHandle<usize>,
}

impl ProgressDisplay {
    /// Stop the loop after a final redraw and return the last count seen.
    pub fn finish(self) -> usize {
        let _ = self.stop.send(());
        self.handle.join().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Instant;

    #[test]
    fn test_percentage_examples() {
        assert_eq!(percentage(0, 3), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 66);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(render_status(1, 4), "25% (1/4)");
    }

    #[test]
    fn test_zero_total_is_complete() {
        assert_eq!(percentage(0, 0), 100);
        let tracker = ProgressTracker::hidden(0);
        assert!(tracker.is_complete());
        assert_eq!(tracker.percentage(), 100);
    }

    #[test]
    fn test_increment_saturates_at_total() {
        let tracker = ProgressTracker::hidden(2);
        assert_eq!(tracker.increment(), 1);
        assert_eq!(tracker.increment(), 2);
        assert_eq!(tracker.increment(), 2);
        assert_eq!(tracker.processed(), 2);
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let total = 8 * 500;
        let tracker = ProgressTracker::hidden(total);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let t = tracker.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        t.increment();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.processed(), total);
        assert_eq!(tracker.percentage(), 100);
    }

    #[test]
    fn test_final_plain_line_only_for_undrawable_visible_tracker() {
        let piped = ProgressTracker::with_bar(3, ProgressBar::hidden(), true);
        for _ in 0..3 {
            piped.increment();
        }
        assert_eq!(piped.final_plain_line().as_deref(), Some("100% (3/3)"));

        let quiet = ProgressTracker::hidden(3);
        quiet.increment();
        assert_eq!(quiet.final_plain_line(), None);

        let empty = ProgressTracker::with_bar(0, ProgressBar::hidden(), true);
        assert_eq!(empty.final_plain_line().as_deref(), Some("100% (0/0)"));
    }

    #[test]
    fn test_display_exits_immediately_for_empty_batch() {
        let tracker = ProgressTracker::hidden(0);
        let started = Instant::now();
        let display = tracker.spawn_display(CancelToken::new(), Duration::from_secs(60));
        assert_eq!(display.finish(), 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_display_stops_when_counter_reaches_total() {
        let tracker = ProgressTracker::hidden(3);
        let display = tracker.spawn_display(CancelToken::new(), Duration::from_millis(10));
        for _ in 0..3 {
            tracker.increment();
        }
        assert_eq!(display.finish(), 3);
    }

    #[test]
    fn test_display_stops_on_cancel() {
        let tracker = ProgressTracker::hidden(10);
        let cancel = CancelToken::new();
        let display = tracker.spawn_display(cancel.clone(), Duration::from_millis(10));
        tracker.increment();
        cancel.cancel();
        let started = Instant::now();
        assert_eq!(display.finish(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn percentage_is_floor_and_bounded(total in 1usize..10_000, count in 0usize..20_000) {
            let pct = percentage(count, total);
            prop_assert!(pct <= 100);
            let clamped = count.min(total);
            prop_assert_eq!(pct, clamped * 100 / total);
            prop_assert_eq!(pct == 100, clamped == total);
        }

        #[test]
        fn percentage_is_monotonic(total in 1usize..1_000, a in 0usize..1_000, b in 0usize..1_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(percentage(lo, total) <= percentage(hi, total));
        }
    }
}
