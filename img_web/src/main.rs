use anyhow::Context;
use clap::Parser;
use console::style;
use img_web::{run_batch, BatchConfig, ExternalEncoder};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::{
    collect_source_images, install_ctrlc_handler, print_summary_report, require_tools,
    resolve_worker_count, AppError, CancelToken, SummaryReport, DISPLAY_INTERVAL, EXIT_CANCELLED,
    EXIT_FAILURE, REQUIRED_TOOLS,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn, Level};

#[derive(Parser)]
#[command(name = "img-web")]
#[command(
    version,
    about = "Convert every GIF/PNG/JPEG under a directory to JXL, AVIF and WebP siblings",
    long_about = None
)]
struct Cli {
    /// Directory to scan recursively
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Regenerate outputs that already exist
    #[arg(short, long)]
    force: bool,

    /// Parallel workers (0 = all cores; default: IMG_WEB_JOBS or all cores)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// No live progress line and no per-file lines
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging on the console
    #[arg(short, long)]
    verbose: bool,

    /// Write a JSON summary to FILE
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_FAILURE as u8)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let console_level = if cli.verbose { Level::DEBUG } else { Level::ERROR };
    if let Err(e) = init_logging("img_web", LogConfig::default().with_console_level(console_level)) {
        eprintln!("⚠️  Logging disabled: {:#}", e);
    }

    match run(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            let detail = format!("{:#}", e);
            debug!(error = %detail, "Run aborted");
            match e.downcast_ref::<AppError>() {
                Some(app) => {
                    eprintln!("{}", app.user_message());
                    ExitCode::from(app.exit_code() as u8)
                }
                None => {
                    eprintln!("❌ {:#}", e);
                    ExitCode::from(EXIT_FAILURE as u8)
                }
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    require_tools(REQUIRED_TOOLS)?;

    let files = collect_source_images(&cli.directory)?;
    println!("Total files to process: {}", files.len());

    let cancel = CancelToken::new();
    if let Err(e) = install_ctrlc_handler(&cancel) {
        warn!(error = %e, "Could not install interrupt handler");
    }

    let config = BatchConfig {
        force: cli.force,
        workers: resolve_worker_count(cli.jobs),
        show_progress: !cli.quiet,
        quiet: cli.quiet,
        display_interval: DISPLAY_INTERVAL,
    };
    let backend = ExternalEncoder::new();
    let batch = run_batch(&files, &config, &backend, &cancel)?;
    let tally = batch.batch_result();

    let cancelled = cancel.is_cancelled();
    if cancelled {
        println!("{}", style("⚠️  Conversion interrupted").yellow());
    } else {
        println!("Conversion complete!");
    }

    print_summary_report(
        &tally,
        batch.elapsed,
        batch.outputs_written(),
        batch.output_bytes(),
        "Image Conversion",
    );

    if let Some(path) = &cli.report {
        SummaryReport::from_batch(
            &cli.directory,
            cli.force,
            batch.workers,
            &tally,
            batch.outputs_written(),
            batch.output_bytes(),
            batch.elapsed,
        )
        .write_json(path)
        .with_context(|| format!("Failed to write summary report to {}", path.display()))?;
        info!(path = %path.display(), "Summary report written");
    }

    Ok(if cancelled { EXIT_CANCELLED } else { 0 })
}
