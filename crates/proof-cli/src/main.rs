use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use proof_cli::commands::{self, run::RunArgs};
use proof_cli::CancelToken;
use tracing::warn;

#[derive(Parser)]
#[command(name = "proof")]
#[command(about = "Audit published category listings against the expected rosters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every category page, reconcile it, and write the report
    Run {
        /// Dataset workbook (.xlsx, .xls, .ods) or export (.csv, or .tsv for tab-delimited)
        #[arg(long)]
        input: PathBuf,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Report CSV path (default: proof_results_<date>.csv)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also write a JSON run summary here
        #[arg(long)]
        summary_json: Option<PathBuf>,

        /// Only list categories with findings
        #[arg(long, default_value_t = false)]
        failing_only: bool,

        /// Fetch backend (http | browser)
        #[arg(long)]
        backend: Option<String>,

        /// Concurrent fetches (1 = sequential)
        #[arg(long)]
        workers: Option<usize>,

        /// Minimum delay between requests, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Disable request pacing
        #[arg(long, default_value_t = false)]
        no_rate_limit: bool,

        /// Fail on config keys nothing reads
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Build and print the ranked rosters without fetching
    Roster {
        #[arg(long)]
        input: PathBuf,

        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience); silent otherwise.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run {
            input,
            config_paths,
            out,
            summary_json,
            failing_only,
            backend,
            workers,
            delay_ms,
            no_rate_limit,
            strict_config,
        } => {
            let args = RunArgs {
                input,
                config_paths,
                out,
                summary_json,
                failing_only,
                backend,
                workers,
                delay_ms,
                no_rate_limit,
                strict_config,
            };

            let cancel = CancelToken::new();
            spawn_ctrl_c_handler(cancel.clone());

            let result = commands::run::execute(args, cancel).await?;
            commands::run::print(&result);
            if result.summary.cancelled {
                std::process::exit(130);
            }
        }

        Commands::Roster {
            input,
            config_paths,
            strict_config,
        } => {
            let set = commands::roster::build(&input, &config_paths, strict_config)?;
            commands::roster::print(&set);
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = proof_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// First Ctrl-C stops new fetches; in-flight categories still get reported.
fn spawn_ctrl_c_handler(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing in-flight categories");
            cancel.cancel();
        }
    });
}
