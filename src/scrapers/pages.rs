//! Article extraction from rendered pages.
//!
//! The browser only hands back rendered HTML through [`PageSource`]; turning
//! that HTML into a [`RawArticle`] happens here with `scraper`, so the
//! extraction rules are testable without a browser.

use crate::config::ScraperConfig;
use crate::error::{ConfigError, ScrapeError};
use crate::models::{LinkRecord, RawArticle, ScrapeOutcome};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

/// Something that can render a URL and return the resulting HTML.
pub trait PageSource {
    async fn render(&mut self, url: &str) -> Result<String, ScrapeError>;
}

/// Drops boilerplate paragraphs (attributions, footers, bare links...).
#[derive(Debug, Clone)]
pub struct ContentFilter {
    patterns: Vec<Regex>,
}

impl ContentFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// `true` if the line is real article text.
    pub fn keeps(&self, line: &str) -> bool {
        !line.is_empty() && !self.patterns.iter().any(|re| re.is_match(line))
    }
}

/// Selectors and filters used to pull an article out of a page.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    title: Selector,
    container: Selector,
    paragraph: Selector,
    filter: ContentFilter,
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl PageExtractor {
    pub fn from_config(config: &ScraperConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: parse_selector(&config.title_selector)?,
            container: parse_selector(&config.content_selector)?,
            paragraph: parse_selector(&config.paragraph_selector)?,
            filter: ContentFilter::new(&config.boilerplate_patterns)?,
        })
    }

    /// Build a [`RawArticle`] from rendered HTML.
    ///
    /// The feed title stands in when the page has no (non-blank) title element.
    pub fn extract(&self, html: &str, link: &LinkRecord) -> RawArticle {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .map(element_text)
            .find(|t| !t.is_empty())
            .unwrap_or_else(|| link.title.clone());

        let content = document
            .select(&self.container)
            .flat_map(|container| container.select(&self.paragraph))
            .map(element_text)
            .filter(|line| self.filter.keeps(line))
            .collect::<Vec<_>>()
            .join("\n");

        RawArticle {
            title,
            content,
            url: link.url.clone(),
            date: link.published_at.clone(),
        }
    }
}

/// Visit every link in order, one after another.
///
/// Failures are recorded per link and never stop the loop, so the result
/// always has one outcome per input link.
#[instrument(level = "info", skip_all, fields(count = links.len()))]
pub async fn scrape_with<S: PageSource>(
    source: &mut S,
    extractor: &PageExtractor,
    links: &[LinkRecord],
) -> Vec<ScrapeOutcome> {
    let mut outcomes = Vec::with_capacity(links.len());

    for (index, link) in links.iter().enumerate() {
        debug!(index, url = %link.url, "Scraping page");
        match source.render(&link.url).await {
            Ok(html) => {
                let article = extractor.extract(&html, link);
                info!(index, url = %link.url, bytes = article.content.len(), "Scraped page");
                outcomes.push(ScrapeOutcome::Scraped(article));
            }
            Err(e) => {
                warn!(index, url = %link.url, error = %e, "Scrape failed; using placeholder");
                outcomes.push(ScrapeOutcome::Failed {
                    link: link.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    outcomes
}

/// Flatten outcomes into articles, logging how many pages failed.
pub fn into_articles(outcomes: Vec<ScrapeOutcome>) -> Vec<RawArticle> {
    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    info!(total = outcomes.len(), failed, "Scrape batch finished");
    outcomes.into_iter().map(ScrapeOutcome::into_article).collect()
}
