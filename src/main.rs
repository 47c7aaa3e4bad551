//! # News Digest
//!
//! Reads a news feed, renders the linked articles in a headless browser,
//! asks a language model to translate and summarize them, and publishes the
//! result as JSON and as a static HTML page.
//!
//! ## Usage
//!
//! ```sh
//! # HTTP server: GET /, GET /api/articles, GET /export
//! GEMINI_API_KEY=... news_digest --port 3000
//!
//! # One-shot export into ./public, exit status reflects success
//! GEMINI_API_KEY=... news_digest --export
//! ```
//!
//! ## Architecture
//!
//! Each run is a strictly sequential pipeline:
//! 1. **Feed**: fetch the RSS feed and keep the first `limit` items
//! 2. **Scrape**: visit each link in one browser session, one page at a time
//! 3. **Enrich**: send all articles to the model in a single prompt
//! 4. **Merge**: pair articles with model output by position, with defaults
//! 5. **Output**: write `articles.json` and `index.html` (export only)
//!
//! Scheduling periodic exports is left to cron or a similar tool.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod enrich;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod server;
mod utils;

use cli::Cli;
use config::DigestConfig;
use pipeline::DigestPipeline;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("news_digest starting up");

    let args = Cli::parse();
    debug!(export = args.export, config = ?args.config, "Parsed CLI arguments");

    let config = DigestConfig::load(&args)?;

    if args.export {
        if let Err(e) = export_once(&config).await {
            error!(error = %e, "Export failed");
            return Err(e);
        }
        Ok(())
    } else {
        server::serve(config).await
    }
}

/// Run the pipeline once and write the digest to disk.
#[instrument(level = "info", skip_all, fields(output_dir = %config.output_dir))]
async fn export_once(config: &DigestConfig) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();

    let pipeline = DigestPipeline::from_config(config)?;
    let entries = pipeline.run(config.article_limit).await?;
    let paths = outputs::export(&entries, &config.output_dir).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = entries.len(),
        json = %paths.json.display(),
        html = %paths.html.display(),
        "Execution complete"
    );
    Ok(())
}
