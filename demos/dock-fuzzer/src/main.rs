//! dock-fuzzer - fuzz the simulated docking host from the command line
//!
//! # Usage
//!
//! ```sh
//! # Ten tests of fifty operations with a random seed
//! cargo run -p dock-fuzzer -- run
//!
//! # Reproducible campaign, failures dumped to ./dumps
//! cargo run -p dock-fuzzer -- run --seed 42 --tests 100 --dump-dir dumps
//!
//! # Replay a dump, logging only docking operations
//! RUST_LOG=debug cargo run -p dock-fuzzer -- replay dumps/fuzz-42-3.json --log-include 'Add*'
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dock_fuzz::prelude::*;
use tracing_subscriber::EnvFilter;

/// Randomized, replayable fuzzing of a docking layout
#[derive(Parser, Debug)]
#[command(name = "dock-fuzzer")]
#[command(about = "Fuzz a docking layout with random, replayable operations")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only record operation kinds matching these globs (comma-separated)
    #[arg(long, global = true)]
    log_include: Option<String>,

    /// Skip operation kinds matching these globs (comma-separated)
    #[arg(long, global = true)]
    log_exclude: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a fuzz campaign
    Run(RunArgs),
    /// Replay a recorded log
    Replay {
        /// Replay log written by a previous run
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// PRNG seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of tests
    #[arg(long, default_value = "10")]
    tests: usize,

    /// Operations per test
    #[arg(long, default_value = "50")]
    operations: usize,

    /// Upper bound on main windows per test
    #[arg(long, default_value = "2")]
    main_windows: usize,

    /// Upper bound on dock widgets per test
    #[arg(long, default_value = "8")]
    dock_widgets: usize,

    /// Directory for failure dumps
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// How long to wait for a floating window to be deleted
    #[arg(long, default_value = "5000")]
    teardown_timeout_ms: u64,
}

impl RunArgs {
    fn into_config(self, log: OperationLogConfig) -> FuzzerConfig {
        let mut config = FuzzerConfig::default()
            .with_tests(self.tests)
            .with_operations_per_test(self.operations)
            .with_max_main_windows(self.main_windows)
            .with_max_dock_widgets(self.dock_widgets)
            .with_teardown_timeout(Duration::from_millis(self.teardown_timeout_ms))
            .with_log(log);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(dir) = self.dump_dir {
            config = config.with_dump_dir(dir);
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping after the current step");
            token.cancel();
        }
    });

    let filter = OperationLogFilter::new(cli.log_include.as_deref(), cli.log_exclude.as_deref());
    let log = OperationLogConfig {
        filter,
        ..OperationLogConfig::default()
    };

    match cli.command {
        Command::Run(args) => run(args.into_config(log), &cancel).await,
        Command::Replay { file } => replay(file, log, &cancel).await,
    }
}

async fn run(config: FuzzerConfig, cancel: &CancellationToken) -> ExitCode {
    let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);

    match fuzzer.fuzz(cancel).await {
        Ok(summary) => {
            println!(
                "seed {}: {} tests, {} operations executed, {} skipped{}",
                summary.seed,
                summary.tests,
                summary.executed,
                summary.skipped,
                if summary.cancelled { " (cancelled)" } else { "" }
            );
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("seed {}: {failure}", fuzzer.seed());
            ExitCode::FAILURE
        }
    }
}

async fn replay(file: PathBuf, log: OperationLogConfig, cancel: &CancellationToken) -> ExitCode {
    let recorded = match ReplayLog::load(&file) {
        Ok(recorded) => recorded,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = FuzzerConfig::default().with_log(log);
    let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);

    match fuzzer.replay(&recorded, cancel).await {
        Ok(report) => {
            println!(
                "replayed {} operations ({} skipped){}",
                report.executed,
                report.skipped,
                if report.cancelled { " (cancelled)" } else { "" }
            );
            if let Some(expected) = &recorded.final_layout {
                if fuzzer.host().serialize_layout() == *expected {
                    println!("final layout matches the recording");
                } else {
                    println!("final layout differs from the recording");
                }
            }
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("reproduced: {failure}");
            ExitCode::FAILURE
        }
    }
}
