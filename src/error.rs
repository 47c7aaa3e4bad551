//! Error types for each pipeline stage.
//!
//! The stages fail differently on purpose: a [`FeedError`] ends the run, a
//! [`ScrapeError`] only degrades one article, an [`EnrichmentError`] is
//! absorbed by the orchestrator, and an [`ExportError`] fails the export.

use thiserror::Error;

/// Failure to obtain the list of links from the feed. Fatal to a run.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned HTTP {status}")]
    Status { status: u16 },

    #[error("feed is not valid RSS: {0}")]
    Parse(#[from] quick_xml::DeError),
}

/// Failure to scrape a single page. Never escapes the page scraper.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("browser unavailable: {0}")]
    Browser(String),

    #[error("navigation timed out after {0}s")]
    NavigationTimeout(u64),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timed out after {secs}s waiting for `{selector}`")]
    SelectorTimeout { selector: String, secs: u64 },

    #[error("could not read page content: {0}")]
    Content(String),
}

/// Failure of the language-model enrichment step.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("no API key configured for the language model")]
    MissingApiKey,

    #[error("language model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("language model returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("language model returned no text")]
    EmptyResponse,

    #[error("no JSON array found in model response")]
    MissingJsonArray,

    #[error("model response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Failure writing the digest to disk.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize digest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not render HTML page: {0}")]
    Render(#[from] std::fmt::Error),
}

/// Failure building the runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid boilerplate pattern: {0}")]
    Pattern(#[from] regex::Error),
}
