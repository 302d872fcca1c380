//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initializes logging
//! - parses CLI arguments
//! - picks a data source (OECD API or a saved payload)
//! - runs the extraction pipeline per country
//! - prints summaries

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FetchArgs, RequestArgs};
use crate::data::{Fetch, OecdClient};
use crate::error::{AppError, EXIT_CONFIG};
use crate::io::PayloadFile;

pub mod pipeline;

use pipeline::{Extraction, Pipeline};

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "econ_indices=info";

/// Entry point for the `indices` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fetch(args) => handle_fetch(args),
        Command::Dimensions(args) => handle_dimensions(args),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Offline payload if given, otherwise the OECD API.
fn fetcher_for(args: &RequestArgs) -> Box<dyn Fetch> {
    match &args.payload {
        Some(path) => Box::new(PayloadFile::new(path)),
        None => Box::new(OecdClient::from_env(args.base_url.clone())),
    }
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let config = args.to_config();
    let countries = config.selectors.location.clone();
    let fetcher = fetcher_for(&args.request);
    let pipeline = Pipeline::new(fetcher.as_ref(), config)?;

    let mut first_error: Option<AppError> = None;
    for (country, result) in pipeline.run_batch(&countries, args.save_payload) {
        match result {
            Ok(run) => {
                println!("{}", crate::report::format_run_summary(&run));
                if let (Some(n), Extraction::Data(table)) = (args.preview, &run.extraction) {
                    println!("{}", crate::report::format_preview(table, n));
                }
            }
            Err(err) => {
                error!(country = %country, "{err}");
                first_error.get_or_insert(AppError::from(err));
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_dimensions(args: RequestArgs) -> Result<(), AppError> {
    let config = args.to_config();
    if config.selectors.location.len() > 1 {
        return Err(AppError::new(EXIT_CONFIG, "dimensions takes a single --country"));
    }
    let fetcher = fetcher_for(&args);
    let pipeline = Pipeline::new(fetcher.as_ref(), config)?;
    let axes = pipeline.fetch_dimensions()?;
    print!("{}", crate::report::format_dimensions(&axes));
    Ok(())
}
