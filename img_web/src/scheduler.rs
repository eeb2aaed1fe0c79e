//! Batch scheduler
//!
//! Fans the discovered files out over a fixed-size rayon pool while a
//! separate display thread polls the shared counter once per interval.

use crate::converter::{process_file, ConvertOptions, FileOutcome, FileResult};
use crate::encoder::EncoderBackend;
use anyhow::Context;
use rayon::prelude::*;
use shared_utils::{BatchResult, CancelToken, ProgressTracker, DISPLAY_INTERVAL};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub force: bool,
    pub workers: usize,
    /// Draw the live `P% (c/t)` line.
    pub show_progress: bool,
    /// Suppress per-file status lines.
    pub quiet: bool,
    pub display_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            force: false,
            workers: 1,
            show_progress: true,
            quiet: false,
            display_interval: DISPLAY_INTERVAL,
        }
    }
}

#[derive(Debug)]
pub struct BatchRun {
    /// One entry per input file, in input order.
    pub results: Vec<FileResult>,
    /// Final value of the shared progress counter.
    pub processed: usize,
    pub total: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

impl BatchRun {
    pub fn batch_result(&self) -> BatchResult {
        let mut tally = BatchResult::new();
        for r in &self.results {
            match r.outcome {
                FileOutcome::Converted => tally.success(),
                FileOutcome::Skipped => tally.skip(),
                FileOutcome::Cancelled => tally.cancel(),
                FileOutcome::PartiallyConverted => {
                    tally.partial(r.path.clone(), r.error_summary().unwrap_or_default())
                }
                FileOutcome::Failed => {
                    tally.fail(r.path.clone(), r.error_summary().unwrap_or_default())
                }
            }
        }
        tally
    }

    pub fn outputs_written(&self) -> usize {
        self.results.iter().map(|r| r.converted.len()).sum()
    }

    pub fn output_bytes(&self) -> u64 {
        self.results.iter().map(|r| r.output_bytes).sum()
    }

    pub fn count(&self, outcome: FileOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// Process every file on a pool of `config.workers` threads. Returns once
/// all workers are done and the display loop has stopped.
pub fn run_batch(
    files: &[PathBuf],
    config: &BatchConfig,
    backend: &dyn EncoderBackend,
    cancel: &CancelToken,
) -> anyhow::Result<BatchRun> {
    let workers = config.workers.max(1);
    let total = files.len();
    let started = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("img-web-worker-{}", i))
        .build()
        .context("Failed to create worker pool")?;

    let tracker = if config.show_progress {
        ProgressTracker::new(total, "Converting")
    } else {
        ProgressTracker::hidden(total)
    };
    let display = tracker.spawn_display(cancel.clone(), config.display_interval);

    info!(total, workers, force = config.force, "Batch started");

    let options = ConvertOptions {
        force: config.force,
    };
    let results: Vec<FileResult> = pool.install(|| {
        files
            .par_iter()
            .map(|path| process_file(path, options, backend, cancel, &tracker, config.quiet))
            .collect()
    });

    let processed = display.finish();
    let elapsed = started.elapsed();
    info!(
        total,
        processed,
        elapsed_ms = elapsed.as_millis() as u64,
        cancelled = cancel.is_cancelled(),
        "Batch finished"
    );

    Ok(BatchRun {
        results,
        processed: tracker.processed().max(processed),
        total,
        workers,
        elapsed,
    })
}
