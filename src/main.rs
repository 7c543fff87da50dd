//! multisearch console front-end
//!
//! Prints each provider's results as soon as that provider completes.

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use multisearch::{config, Aggregator, Mode, OutcomeResults, ProviderId, ProviderOutcome, Query};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Search several providers at once
#[derive(Parser, Debug)]
#[command(name = "multisearch")]
#[command(version, about = "Search DuckDuckGo, Bing and Google concurrently")]
#[command(long_about = r#"
Runs one query against every selected provider at the same time and prints each
provider's results as soon as they arrive.

Settings are loaded from (in priority order):
1. --config <path>
2. $MULTISEARCH_SETTINGS_PATH
3. ./settings.yml or ./config/settings.yml
4. ~/.config/multisearch/settings.yml

Example:
  multisearch rust async runtimes
  multisearch --images --providers ddg "northern lights"
"#)]
struct Cli {
    /// Search terms, joined with spaces
    #[arg(required = true)]
    query: Vec<String>,

    /// Search for images instead of text
    #[arg(short, long)]
    images: bool,

    /// Comma-separated providers (duckduckgo, bing, google)
    #[arg(short, long, value_name = "LIST")]
    providers: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load(cli.config.as_deref())?;

    // RUST_LOG wins over -v and general.debug
    let verbose = cli.verbose.max(u8::from(settings.general.debug));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting multisearch v{}", multisearch::VERSION);

    let mode = if cli.images {
        Mode::Images
    } else {
        settings.search.default_mode
    };

    let providers = match cli.providers {
        Some(ref list) => ProviderId::parse_list(list)?,
        None => settings.search.default_providers.clone(),
    };

    let query = Query::new(cli.query.join(" "))?;
    let aggregator = Aggregator::from_settings(&settings)?;

    let mut run = aggregator.run(query.clone(), mode, &providers)?;
    info!("Run {} started for '{}'", run.run_id(), query);

    while let Some(outcome) = run.next().await {
        print_outcome(&outcome);
    }

    Ok(())
}

fn print_outcome(outcome: &ProviderOutcome) {
    println!("{} results:", outcome.provider);

    match outcome.results {
        OutcomeResults::Text(ref items) => {
            for item in items {
                println!("{}", item);
            }
        }
        OutcomeResults::Images(ref images) => {
            for image in images {
                println!("  {} ({}x{})", image.url, image.width(), image.height());
            }
            println!("Loaded {} images", images.len());
        }
    }

    println!();
}
