//! Blocky Batch CLI
//!
//! Convert every `.blockymodel` under a directory to OBJ or GLB.

use blocky_batch::{
    scan, BatchConfig, BatchOutcome, BatchReport, BatchRun, BatchSink, CancelToken, Converter,
    ExportTarget,
};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "blocky-batch")]
#[command(author, version, long_about = None)]
#[command(about = "Batch-convert .blockymodel files to OBJ or GLB")]
struct Cli {
    /// Directory scanned (recursively) for .blockymodel files
    source: PathBuf,

    /// Directory the converted tree is written to
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "glb")]
    format: OutputFormat,

    /// Copy each model's texture next to its outputs (OBJ always copies)
    #[arg(long)]
    copy_textures: bool,

    /// More log output (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Binary glTF format
    Glb,
    /// Wavefront OBJ format
    Obj,
}

impl From<OutputFormat> for ExportTarget {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Glb => ExportTarget::Glb,
            OutputFormat::Obj => ExportTarget::Obj,
        }
    }
}

/// Progress bar over the batch.
struct ProgressSink {
    bar: ProgressBar,
    total: u64,
}

impl BatchSink for ProgressSink {
    fn progress(&mut self, fraction: f32) {
        self.bar
            .set_position((f64::from(fraction) * self.total as f64).round() as u64);
    }

    fn finished(&mut self, _report: &BatchReport) {
        self.bar.finish_and_clear();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(report) => {
            println!("{}", report);
            if report.failed > 0 {
                for path in &report.failed_items {
                    println!("  failed: {}", path.display());
                }
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<BatchReport, Box<dyn std::error::Error>> {
    let target = ExportTarget::from(cli.format);
    let config = BatchConfig::new(&cli.source, &cli.output)
        .with_target(target)
        .with_copy_textures(cli.copy_textures);

    let converter = Converter::standard();
    let items = scan(&config.source_root);
    let total = items.len() as u64;

    let cancel = CancelToken::new();
    let batch = BatchRun::new(&converter, &config, items, cancel.clone())?;

    if total > 0 {
        spawn_cancel_listener(cancel);
        eprintln!("Converting {} models to {} (type q + Enter to stop)", total, target);
    }

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]")?
            .progress_chars("=> "),
    );
    let mut sink = ProgressSink { bar, total };

    let report = batch.run(&mut sink);

    if report.outcome == BatchOutcome::Cancelled {
        eprintln!("Stopped on request");
    }
    Ok(report)
}

/// Cancel the run when the user enters `q` on stdin.
fn spawn_cancel_listener(cancel: CancelToken) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("q") {
                cancel.cancel();
                break;
            }
        }
    });
}
