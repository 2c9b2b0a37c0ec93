//! gedprune CLI
//!
//! Entry point for the `gedprune` command-line tool. `run` prunes a corpus
//! of graph pairs with cheap lower bounds and sends the survivors to an
//! external GED solver; `estimate` writes heuristic tables for later runs.

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
/// Global allocator using jemalloc for better performance in parallel workloads.
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod args;

use std::process::ExitCode;

use clap::Parser;
use gedprune_cli::{CliError, RunReport, run_estimate, run_pipeline};
use tracing_subscriber::EnvFilter;

use args::{Args, Command};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match execute(&args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &Args) -> Result<u8, CliError> {
    match &args.command {
        Command::Run(run) => {
            let config = run.to_config()?;
            let report = run_pipeline(&config)?;
            match &report {
                RunReport::Completed(summary) | RunReport::Interrupted(summary) => {
                    println!("{summary}");
                }
                RunReport::DryRun(prune) => println!("{prune}"),
            }
            Ok(report.exit_code())
        }
        Command::Estimate(estimate) => {
            let config = estimate.to_config()?;
            let rows = run_estimate(&config)?;
            println!("{rows} estimates written to {}", config.output.display());
            Ok(0)
        }
    }
}
