//! Ostomate command-line front end
//!
//! Runs food search, barcode lookup and log extraction against the configured
//! providers and prints the results as JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use clap::{Parser, Subcommand};
use ostomate_core::{
    init_logging, load_env, parse_provider_list, CoreConfig, Ostomate, OstomateBuilder,
};
use ostomate_provider_anthropic::AnthropicClient;
use ostomate_provider_openfoodfacts::OpenFoodFactsProvider;
use ostomate_provider_spoonacular::SpoonacularProvider;
use ostomate_provider_usda::UsdaProvider;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Curated table only: no remote providers and no language model
    #[arg(long, global = true)]
    offline: bool,

    /// Compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search foods across providers
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results (capped at 50)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Comma-separated provider ids, e.g. `crowd,local`
        #[arg(short, long)]
        providers: Option<String>,

        /// Attach condition annotations and rank by friendliness
        #[arg(short, long)]
        annotate: bool,
    },

    /// Look a product up by EAN/UPC barcode
    Barcode {
        /// Digits only
        code: String,
    },

    /// Split a daily-log description into typed entries
    Extract {
        /// What happened, in plain words
        text: String,

        /// Reference time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },
}

fn build_pipeline(config: CoreConfig, offline: bool) -> Ostomate {
    let mut builder = OstomateBuilder::new(config);
    if offline {
        return builder.build();
    }

    builder = builder
        .provider(Arc::new(OpenFoodFactsProvider::from_env()))
        .provider(Arc::new(UsdaProvider::from_env()));
    match SpoonacularProvider::from_env() {
        Some(provider) => builder = builder.provider(Arc::new(provider)),
        None => info!("SPOONACULAR_API_KEY not set; premium provider disabled"),
    }
    match AnthropicClient::from_env() {
        Some(client) => builder = builder.model(Arc::new(client)),
        None => info!("ANTHROPIC_API_KEY not set; extraction runs locally"),
    }
    builder.build()
}

fn parse_reference(at: Option<&str>) -> Result<DateTime<FixedOffset>> {
    match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --at timestamp '{}'", raw)),
        None => Ok(Local::now().fixed_offset()),
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env()?;
    init_logging();

    let cli = Cli::parse();
    let config = CoreConfig::from_env().context("loading configuration")?;
    let ostomate = build_pipeline(config, cli.offline);

    match cli.command {
        Command::Search {
            query,
            limit,
            providers,
            annotate,
        } => {
            let mut options = ostomate.default_search_options();
            if let Some(raw) = providers {
                options = options.with_providers(parse_provider_list(&raw)?);
            }
            if let Some(limit) = limit {
                options = options.with_limit(limit);
            }

            if annotate {
                print_json(&ostomate.search_annotated(&query, &options).await, cli.compact)?;
            } else {
                print_json(&ostomate.search(&query, &options).await, cli.compact)?;
            }
        }
        Command::Barcode { code } => {
            let record = ostomate.lookup_barcode(&code).await;
            if record.is_none() {
                info!(code = %code, "no provider knows this barcode");
            }
            print_json(&record, cli.compact)?;
        }
        Command::Extract { text, at } => {
            let reference = parse_reference(at.as_deref())?;
            let extraction = ostomate.extract_with_source(&text, reference).await;
            if extraction.entries.is_empty() {
                info!("nothing detected; enter the log manually");
            }
            print_json(&extraction, cli.compact)?;
        }
    }

    Ok(())
}
