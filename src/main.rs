//! hashwatch - a file integrity monitor.
//!
//! Usage:
//!   hashwatch                  Resume the stored baseline and watch
//!   hashwatch watch --fresh    Rebuild the baseline, then watch
//!   hashwatch baseline         Rebuild the baseline and exit
//!   hashwatch check            Run one round against the stored baseline
//!   hashwatch --help           Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hashwatch_core::{ChangeKind, DEFAULT_CONFIG_FILE, ScanEvent, ScanWarning};
use hashwatch_scan::{
    DiffEngine, DigestAlgorithm, Monitor, MonitorConfig, ResumeOutcome, StartMode, StartOutcome,
};
use hashwatch_store::{AlertLog, BaselineFile};

#[derive(Parser)]
#[command(
    name = "hashwatch",
    version,
    about = "A file integrity monitor",
    long_about = "hashwatch records a cryptographic baseline of a directory tree and \
                  then rescans it on a fixed interval, reporting every file that was \
                  created, modified or deleted.\n\n\
                  Running `hashwatch` with no subcommand resumes the stored baseline \
                  (building one if none is usable) and starts watching."
)]
struct Cli {
    /// Directory to watch (defaults to current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Config file (defaults to ./hashwatch.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Baseline file
    #[arg(long, global = true)]
    baseline: Option<PathBuf>,

    /// Alert log file
    #[arg(long, global = true)]
    alerts: Option<PathBuf>,

    /// Seconds between rounds
    #[arg(short, long, global = true)]
    interval: Option<u64>,

    /// Digest algorithm (sha3-512, sha512, blake3)
    #[arg(long, global = true)]
    algorithm: Option<DigestAlgorithm>,

    /// Additional file name to ignore (repeatable)
    #[arg(long = "ignore", global = true)]
    ignore: Vec<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the tree until interrupted
    Watch {
        /// Discard the stored baseline and build a new one
        #[arg(long, conflicts_with = "resume")]
        fresh: bool,

        /// Resume the stored baseline, rebuilding it if unusable (default)
        #[arg(long)]
        resume: bool,

        /// Stop after this many rounds
        #[arg(short = 'n', long)]
        rounds: Option<u64>,

        /// Write alerts to the log only, not to stdout
        #[arg(short, long)]
        quiet: bool,
    },

    /// Build a fresh baseline and exit
    Baseline,

    /// Run a single round against the stored baseline and print changes
    Check {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = load_config(&cli)?;

    match cli.command {
        Some(Command::Watch {
            fresh,
            resume: _,
            rounds,
            quiet,
        }) => {
            let mode = if fresh {
                StartMode::Fresh
            } else {
                StartMode::Resume
            };
            let mut config = config;
            if rounds.is_some() {
                config.max_rounds = rounds;
            }
            if quiet {
                config.mirror_alerts = false;
            }
            run_watch(&config, mode).await?;
        }
        Some(Command::Baseline) => {
            run_baseline(&config)?;
        }
        Some(Command::Check { format }) => {
            run_check(&config, format)?;
        }
        None => {
            run_watch(&config, StartMode::Resume).await?;
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Resolve the config file, then apply command-line overrides.
fn load_config(cli: &Cli) -> Result<MonitorConfig> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            MonitorConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => MonitorConfig::default(),
    };

    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(baseline) = &cli.baseline {
        config.baseline_path = baseline.clone();
    }
    if let Some(alerts) = &cli.alerts {
        config.alert_path = alerts.clone();
    }
    if let Some(interval) = cli.interval {
        config.round_delay_secs = interval;
    }
    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    config.ignore.extend(cli.ignore.iter().cloned());

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Start from the stored or a fresh baseline and poll until interrupted.
async fn run_watch(config: &MonitorConfig, mode: StartMode) -> Result<()> {
    let mut store = BaselineFile::new(&config.baseline_path);
    let alerts = AlertLog::new(&config.alert_path).with_mirror(config.mirror_alerts);
    let mut monitor = Monitor::new(config, alerts);

    let (mut baseline, outcome) = monitor
        .engine()
        .start(mode, &mut store)
        .context("Failed to start monitor")?;

    match outcome {
        StartOutcome::Fresh => eprintln!("Created new baseline of {} files", baseline.len()),
        StartOutcome::Resumed => eprintln!("Resumed baseline of {} files", baseline.len()),
        StartOutcome::Rebuilt(reason) => eprintln!(
            "Stored baseline unusable ({reason}); created new baseline of {} files",
            baseline.len()
        ),
    }
    eprintln!(
        "Watching {} every {}s (Ctrl-C to stop)",
        config.root.display(),
        config.round_delay_secs
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let summary = monitor
        .run(&mut baseline, cancel)
        .await
        .context("Monitor failed")?;

    eprintln!(
        "Stopped after {} round(s), {} change(s) reported",
        summary.rounds, summary.events
    );
    Ok(())
}

/// Build a fresh baseline and print a summary.
fn run_baseline(config: &MonitorConfig) -> Result<()> {
    let engine = DiffEngine::new(config);
    let mut store = BaselineFile::new(&config.baseline_path);

    eprintln!("Hashing {}...", config.root.display());

    let (baseline, stats) = engine
        .build_baseline(&mut store)
        .context("Failed to build baseline")?;

    println!(
        "Recorded {} files ({} unreadable) to {} in {:.2}s ({:.0} files/s)",
        baseline.len(),
        stats.unreadable,
        config.baseline_path.display(),
        stats.elapsed.as_secs_f64(),
        stats.files_per_second()
    );
    Ok(())
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    root: &'a Path,
    files_scanned: u64,
    unreadable: u64,
    events: &'a [ScanEvent],
    warnings: &'a [ScanWarning],
}

/// Run one round against the stored baseline without rewriting it.
fn run_check(config: &MonitorConfig, format: OutputFormat) -> Result<()> {
    let engine = DiffEngine::new(config);
    let mut store = BaselineFile::new(&config.baseline_path);

    let mut baseline = match engine
        .load_baseline(&mut store)
        .context("Failed to read baseline")?
    {
        ResumeOutcome::Loaded(baseline) => baseline,
        ResumeOutcome::Unusable(reason) => bail!(
            "No usable baseline at {} ({reason}); run `hashwatch baseline` first",
            config.baseline_path.display()
        ),
    };

    let report = engine.run_round(&mut baseline).context("Scan failed")?;

    match format {
        OutputFormat::Text => {
            if report.has_changes() {
                for event in &report.events {
                    print!("{}", event.alert_line());
                }
                println!(
                    "{} created, {} modified, {} deleted",
                    report.count(ChangeKind::Created),
                    report.count(ChangeKind::Modified),
                    report.count(ChangeKind::Deleted)
                );
            } else {
                println!("No changes detected ({} files checked)", report.stats.files_scanned);
            }
            if report.stats.unreadable > 0 {
                eprintln!("{} file(s) could not be read", report.stats.unreadable);
            }
        }
        OutputFormat::Json => {
            let output = CheckOutput {
                root: &config.root,
                files_scanned: report.stats.files_scanned,
                unreadable: report.stats.unreadable,
                events: &report.events,
                warnings: &report.stats.warnings,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
