//! Command-line interface definitions for News Digest.
//!
//! Every option can be given as a flag or through the environment. Options
//! that are also present in the YAML config file override it.

use clap::Parser;

/// Command-line arguments for the News Digest application.
///
/// # Examples
///
/// ```sh
/// # Serve the digest on port 3000
/// GEMINI_API_KEY=... news_digest
///
/// # Export once to ./public and exit
/// news_digest --export --limit 5
///
/// # Use a config file for the feed and selectors
/// news_digest --export -c digest.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Run one export (JSON + HTML) and exit instead of starting the server
    #[arg(long)]
    pub export: bool,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// API key for the Gemini language model
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the Chrome/Chromium executable
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<String>,

    /// Port for the HTTP server
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Echo internal error details in HTTP error responses
    #[arg(long, env = "DIGEST_DEV")]
    pub dev: bool,

    /// Number of feed items to scrape per run (taken from the top of the feed)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Directory the JSON and HTML digest are written to
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Feed URL to read
    #[arg(long, env = "FEED_URL")]
    pub feed_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_server_mode() {
        let cli = Cli::parse_from(["news_digest"]);
        assert!(!cli.export);
        assert!(cli.config.is_none());
        assert!(cli.limit.is_none());
    }

    #[test]
    fn test_cli_export_flags() {
        let cli = Cli::parse_from([
            "news_digest",
            "--export",
            "--limit",
            "5",
            "-o",
            "/tmp/public",
            "-c",
            "digest.yaml",
        ]);

        assert!(cli.export);
        assert_eq!(cli.limit, Some(5));
        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/public"));
        assert_eq!(cli.config.as_deref(), Some("digest.yaml"));
    }

    #[test]
    fn test_cli_port_and_dev() {
        let cli = Cli::parse_from(["news_digest", "-p", "8080", "--dev"]);
        assert_eq!(cli.port, Some(8080));
        assert!(cli.dev);
    }
}
