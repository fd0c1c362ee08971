//! Airspace CLI binary.
//!
//! Refreshes the cached airspace dataset when it is stale or missing and
//! rewrites the processed dataset for the map front end.

mod integration;

use airspace::data::cache::format_timedelta;
use airspace::data::fetch::HttpFetcher;
use airspace::{AirspaceConfig, FreshnessSource, Pipeline, RunOutcome};
use clap::Parser;
use integration::cache_manager;
use integration::progress::SpinnerFetcher;
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "airspace")]
#[command(about = "Refresh the airspace dataset and keep the relevant airspaces", long_about = None)]
#[command(version)]
struct Cli {
    /// Force download and processing of the airspace dataset
    #[arg(long)]
    force: bool,

    /// TOML configuration file (built-in defaults when omitted)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable logging
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    debug!(?cli, "parsed arguments");

    let config = match &cli.config {
        Some(path) => AirspaceConfig::load_from_file(path)?,
        None => AirspaceConfig::default(),
    };

    println!("Verifying '{}'...", config.raw_path.display());
    println!("Relevant areas: {:?}", config.relevant_areas);

    let fetcher = SpinnerFetcher::new(HttpFetcher::with_timeout(config.fetch_timeout())?);
    let mut pipeline = Pipeline::new(config, fetcher)?;
    if pipeline.config().freshness_source == FreshnessSource::FetchLog {
        let log = cache_manager::open_fetch_log(pipeline.config().fetch_log_path.as_deref())?;
        pipeline = pipeline.with_fetch_log(log);
    }

    match pipeline.run(cli.force).await? {
        RunOutcome::StillFresh { remaining } => {
            println!(
                "JSON still within acceptable timedelta: {}",
                format_timedelta(remaining)
            );
        }
        RunOutcome::Processed {
            refetch, summary, ..
        } => {
            match refetch {
                Some(reason) => println!("Refreshed airspaces JSON ({})", reason),
                None => println!("Not downloading airspaces JSON!"),
            }
            println!(
                "Done processing: kept {} of {} airspaces in '{}'",
                summary.retained,
                summary.total,
                pipeline.config().processed_path.display()
            );
        }
    }

    Ok(())
}

/// Install the stderr subscriber; `RUST_LOG` overrides the verbosity flags.
fn init_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "airspace=warn",
            1 => "airspace=info",
            2 => "airspace=debug",
            3.. => "airspace=trace",
        })
    });

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();
}
