use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zawgyi_sweep::converter::{ConversionRequest, ConversionService, Detector, TrainedModel};
use zawgyi_sweep::discovery::{collect_discovered_files, DiscoveryConfig};
use zawgyi_sweep::processing::{process_files_parallel, ProcessOptions};
use zawgyi_sweep::reader::{AsyncFileReader, ReaderConfig};
use zawgyi_sweep::settings::Settings;
use zawgyi_sweep::stats::{FileStats, RunStats};
use zawgyi_sweep::ExecutionMode;

#[derive(Parser, Debug)]
#[command(name = "zawgyi-sweep")]
#[command(about = "Detect Zawgyi-encoded Myanmar text and convert it to standard Unicode")]
#[command(version)]
struct Args {
    /// Settings file (JSON); missing or unreadable files fall back to defaults
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert Zawgyi lines in text files
    Convert {
        /// Files or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Rewrite files in place instead of printing the converted text
        #[arg(long)]
        in_place: bool,

        /// Only report detections, never rewrite
        #[arg(long)]
        detect_only: bool,

        /// Convert on the calling thread instead of the worker thread
        #[arg(long)]
        inline: bool,

        /// Stats output file path
        #[arg(long)]
        stats_out: Option<PathBuf>,

        /// Suppress console progress bars
        #[arg(long)]
        no_progress: bool,

        /// Abort on first error
        #[arg(long)]
        fail_fast: bool,
    },
    /// Print the detectAndConvert response for each argument
    Detect {
        #[arg(required = true)]
        texts: Vec<String>,

        /// Classify only
        #[arg(long)]
        no_convert: bool,
    },
    /// Train a detection model from one-sample-per-line corpora
    Train {
        #[arg(long)]
        zawgyi: PathBuf,

        #[arg(long)]
        unicode: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },
}

async fn load_settings(path: Option<&PathBuf>) -> Settings {
    match path {
        Some(path) => Settings::load(path).await,
        None => Settings::default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // WHY: structured JSON logging on stderr keeps stdout free for converted text
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!(?args, "Parsed CLI arguments");
    let mut settings = load_settings(args.settings.as_ref()).await;

    match args.command {
        Command::Convert {
            patterns,
            in_place,
            detect_only,
            inline,
            stats_out,
            no_progress,
            fail_fast,
        } => {
            if in_place && detect_only {
                bail!("--in-place and --detect-only cannot be combined");
            }
            if detect_only {
                settings.convert_to_unicode = false;
            }
            if inline {
                settings.execution = ExecutionMode::Inline;
            }
            if !settings.should_run_on(None) {
                info!("Conversion disabled in settings, nothing to do");
                return Ok(());
            }
            run_convert(settings, patterns, in_place, stats_out, no_progress, fail_fast).await
        }
        Command::Detect { texts, no_convert } => {
            let detector = Detector::resolve(settings.model_path.as_deref(), settings.detection_threshold);
            let service = ConversionService::with_detector(detector);
            let request = ConversionRequest::detect_and_convert(1, texts, !no_convert);
            let response = service.handle(&request);
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Train { zawgyi, unicode, out } => run_train(zawgyi, unicode, out).await,
    }
}

async fn run_convert(
    settings: Settings,
    patterns: Vec<String>,
    in_place: bool,
    stats_out: Option<PathBuf>,
    no_progress: bool,
    fail_fast: bool,
) -> Result<()> {
    let run_start = std::time::Instant::now();

    let discovered = collect_discovered_files(patterns, DiscoveryConfig { fail_fast }).await?;
    let mut run_stats = RunStats::default();
    let mut valid = Vec::new();
    for file in discovered {
        match file.error {
            Some(_) if fail_fast => bail!("Invalid input {}", file.path.display()),
            Some(_) => run_stats.push(FileStats::skipped(&file.path)),
            None => valid.push(file.path),
        }
    }
    if valid.is_empty() {
        bail!("No readable input files");
    }

    let detector = Detector::resolve(settings.model_path.as_deref(), settings.detection_threshold);
    let service = Arc::new(ConversionService::with_detector(detector));
    let options = ProcessOptions {
        in_place,
        fail_fast,
        reader: ReaderConfig::default(),
    };

    let progress = if no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(valid.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let print_output = !in_place && settings.convert_to_unicode;
    let outcomes = process_files_parallel(valid, &settings, service, &options, num_cpus::get(), |outcome| {
        progress.inc(1);
        progress.set_message(outcome.path.display().to_string());
    })
    .await?;
    progress.finish_and_clear();

    // outcomes come back in input order; several files get a header each, as `head` prints them
    let with_headers = outcomes.len() > 1;
    for outcome in outcomes {
        if print_output && outcome.stats.status == "success" {
            if with_headers {
                println!("==> {} <==", outcome.path.display());
            }
            for line in &outcome.lines {
                println!("{line}");
            }
        }
        if !settings.convert_to_unicode {
            println!(
                "{}\t{} of {} candidate lines detected as Zawgyi",
                outcome.path.display(),
                outcome.stats.units_detected,
                outcome.stats.units_scanned
            );
        }
        run_stats.push(outcome.stats);
    }

    run_stats.run_time_ms = run_start.elapsed().as_millis() as u64;
    info!(
        "Run complete: {} files, {} failed, {} units converted",
        run_stats.files_processed, run_stats.files_failed, run_stats.units_converted
    );
    if let Some(path) = stats_out {
        run_stats.save(&path).await?;
    }
    Ok(())
}

async fn run_train(zawgyi: PathBuf, unicode: PathBuf, out: PathBuf) -> Result<()> {
    let reader = AsyncFileReader::new(ReaderConfig {
        fail_fast: true,
        ..ReaderConfig::default()
    });
    let (zawgyi_lines, _) = reader.read_file_lines(&zawgyi).await?;
    let (unicode_lines, _) = reader.read_file_lines(&unicode).await?;

    let keep = |line: &&String| !line.trim().is_empty();
    let model = TrainedModel::train(
        zawgyi_lines.iter().filter(keep),
        unicode_lines.iter().filter(keep),
    )?;
    model.save(&out)?;
    println!("Saved model to {}", out.display());
    Ok(())
}
