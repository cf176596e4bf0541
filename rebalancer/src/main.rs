//! CLI entry point for the driftbook rebalancer.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use driftbook_rebalancer::check::{self, CheckOptions, CheckSource};
use driftbook_rebalancer::config::Config;

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Portfolio drift check: snapshot or broker holdings → rebalance decision")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate drift and print the rebalance decision
    Check {
        #[command(flatten)]
        input: InputArgs,

        /// Fetch prices the input doesn't supply from the broker
        #[arg(long)]
        live_prices: bool,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current broker positions
    Positions,

    /// Check broker connection
    Status,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// Snapshot JSON with holdings and allocations
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Targets JSON; holdings come from the broker
    #[arg(long)]
    targets: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Check {
            input,
            live_prices,
            json,
        } => {
            let source = match (input.snapshot, input.targets) {
                (Some(path), _) => CheckSource::Snapshot(path),
                (None, Some(path)) => CheckSource::Targets(path),
                (None, None) => {
                    eprintln!("Error: one of --snapshot or --targets is required");
                    process::exit(1);
                }
            };
            let opts = CheckOptions {
                source,
                live_prices,
            };
            let report = match check::run_check(&config, &opts) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(s) => println!("{s}"),
                    Err(e) => {
                        eprintln!("Error rendering report: {e}");
                        process::exit(1);
                    }
                }
            } else {
                print!("{report}");
            }
            process::exit(report.exit_code());
        }
        Command::Positions => check::show_positions(&config),
        Command::Status => check::check_status(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
