//! Wealthscape CLI - run wealth distribution simulations from the command line.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Wealthscape - a deterministic wealth distribution simulation
#[derive(Parser, Debug)]
#[command(name = "wealthscape")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulation and write per-tick records
    Run {
        #[command(flatten)]
        config: cli::ConfigArgs,

        /// Record format: csv or json (one object per line)
        #[arg(short, long, default_value = "csv")]
        format: cli::OutputFormat,

        /// Record file [default: wealthscape.csv, or wealthscape.jsonl for json]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,

        /// Log at debug level
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the effective configuration as JSON
    Config {
        #[command(flatten)]
        config: cli::ConfigArgs,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            config,
            format,
            output,
            progress,
            verbose,
        } => {
            init_tracing(verbose);
            let output = output.unwrap_or_else(|| format.default_output());
            config
                .resolve()
                .and_then(|config| cli::run::execute(config, format, &output, progress))
        }

        Commands::Config { config } => {
            init_tracing(false);
            config.resolve().and_then(|config| cli::show_config(&config))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
