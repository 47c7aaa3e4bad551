//! Runtime configuration.
//!
//! [`DigestConfig`] is built once in `main` from an optional YAML file and
//! the command line (which includes the environment), then passed by
//! reference to every component. Nothing below `main` reads the environment.
//!
//! ```yaml
//! feed_url: https://www.yna.co.kr/rss/news.xml
//! article_limit: 3
//! output_dir: public
//! scraper:
//!   title_selector: h1.tit
//!   content_selector: article.story-news
//! model:
//!   model: gemini-1.5-flash
//!   target_language: English
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use tracing::{info, instrument};

pub const DEFAULT_FEED_URL: &str = "https://www.yna.co.kr/rss/news.xml";
pub const DEFAULT_PORT: u16 = 3000;

/// Number of feed items scraped per run.
///
/// Items are taken from the top of the feed in source order and the rest
/// are skipped; nothing records which items were already processed.
pub const DEFAULT_ARTICLE_LIMIT: usize = 2;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub feed_url: String,
    pub article_limit: usize,
    pub output_dir: String,
    pub port: u16,
    /// Echo internal error details in HTTP error bodies.
    pub development: bool,
    pub scraper: ScraperConfig,
    pub model: ModelConfig,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            article_limit: DEFAULT_ARTICLE_LIMIT,
            output_dir: "public".to_string(),
            port: DEFAULT_PORT,
            development: false,
            scraper: ScraperConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

/// Browser and extraction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub chrome_path: Option<String>,
    pub navigation_timeout_secs: u64,
    pub selector_timeout_secs: u64,
    pub title_selector: String,
    /// Element whose presence means the article body has rendered.
    pub content_marker: String,
    pub content_selector: String,
    pub paragraph_selector: String,
    /// Regexes; a paragraph matching any of them is dropped.
    pub boilerplate_patterns: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            navigation_timeout_secs: 30,
            selector_timeout_secs: 30,
            title_selector: "h1.tit".to_string(),
            content_marker: "article.story-news".to_string(),
            content_selector: "article.story-news".to_string(),
            paragraph_selector: "p".to_string(),
            boilerplate_patterns: default_boilerplate_patterns(),
        }
    }
}

/// Lines stripped from article bodies before they are sent to the model.
pub fn default_boilerplate_patterns() -> Vec<String> {
    [
        // agency attribution, e.g. "(서울=연합뉴스) 홍길동 기자 ="
        r"^\(.{1,30}=\s*연합뉴스\)",
        // bare URL
        r"^https?://\S+$",
        // reporter email
        r"@yna\.co\.kr",
        // copyright / redistribution notice
        r"저작권자|무단 전재|재배포 금지",
        // leading date stamp, e.g. "2025/05/06 10:00 송고"
        r"^\d{4}[./-]\d{1,2}[./-]\d{1,2}",
        // tip-line footer
        r"카카오톡 okjebo",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Language model settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub target_language: String,
    pub max_retries: usize,
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            target_language: "English".to_string(),
            max_retries: 2,
            request_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("target_language", &self.target_language)
            .field("max_retries", &self.max_retries)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl DigestConfig {
    /// Build the configuration: YAML file first (if given), then CLI/env on top.
    #[instrument(level = "info", skip_all, fields(config = ?cli.config))]
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let base = match &cli.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        let config = base.with_cli(cli);
        info!(
            feed_url = %config.feed_url,
            article_limit = config.article_limit,
            output_dir = %config.output_dir,
            port = config.port,
            development = config.development,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Overlay values given on the command line or through the environment.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(key) = &cli.api_key {
            self.model.api_key = Some(key.clone());
        }
        if let Some(path) = &cli.chrome_path {
            self.scraper.chrome_path = Some(path.clone());
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if cli.dev {
            self.development = true;
        }
        if let Some(limit) = cli.limit {
            self.article_limit = limit;
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(url) = &cli.feed_url {
            self.feed_url = url.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = DigestConfig::default();
        assert_eq!(config.article_limit, 2);
        assert_eq!(config.port, 3000);
        assert_eq!(config.output_dir, "public");
        assert_eq!(config.scraper.navigation_timeout_secs, 30);
        assert_eq!(config.scraper.selector_timeout_secs, 30);
        assert_eq!(config.scraper.boilerplate_patterns.len(), 6);
        assert!(!config.development);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
article_limit: 5
scraper:
  title_selector: "h1.headline"
model:
  target_language: German
"#;
        let config = DigestConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.article_limit, 5);
        assert_eq!(config.scraper.title_selector, "h1.headline");
        assert_eq!(config.scraper.paragraph_selector, "p");
        assert_eq!(config.model.target_language, "German");
        assert_eq!(config.model.model, "gemini-1.5-flash");
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    fn test_cli_overrides_file() {
        let base = DigestConfig::from_yaml_str("article_limit: 5\noutput_dir: out\n").unwrap();
        let cli = Cli::parse_from(["news_digest", "--limit", "1", "--api-key", "secret", "--dev"]);
        let config = base.with_cli(&cli);
        assert_eq!(config.article_limit, 1);
        assert_eq!(config.output_dir, "out");
        assert_eq!(config.model.api_key.as_deref(), Some("secret"));
        assert!(config.development);
    }

    #[test]
    fn test_api_key_is_redacted_in_debug() {
        let model = ModelConfig {
            api_key: Some("secret".to_string()),
            ..ModelConfig::default()
        };
        let rendered = format!("{:?}", model);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = DigestConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
