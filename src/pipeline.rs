//! Pipeline orchestration: feed → scrape → enrich → merge.
//!
//! Each stage sits behind a small trait so the orchestrator can be run
//! against fakes. [`DigestPipeline`] wires the production implementations.

use crate::config::DigestConfig;
use crate::enrich::GeminiEnricher;
use crate::error::{ConfigError, EnrichmentError, FeedError};
use crate::models::{DigestEntry, EnrichmentResult, LinkRecord, RawArticle};
use crate::scrapers::browser::BrowserScraper;
use crate::scrapers::feed::RssFeed;
use itertools::Itertools;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Separator placed between articles in the enrichment prompt.
pub const ARTICLE_SEPARATOR: &str = "\n\n---\n\n";

/// Source of article links.
pub trait LinkSource {
    async fn fetch_links(&self) -> Result<Vec<LinkRecord>, FeedError>;
}

/// Turns links into raw articles, one per link and in the same order.
pub trait ArticleScraper {
    async fn scrape_pages(&self, links: &[LinkRecord]) -> Vec<RawArticle>;
}

/// Translates and summarizes a batch of articles.
pub trait Enricher {
    async fn enrich(&self, combined_text: &str) -> Result<Vec<EnrichmentResult>, EnrichmentError>;
}

pub struct Pipeline<F, S, E> {
    feed: F,
    scraper: S,
    enricher: E,
}

pub type DigestPipeline = Pipeline<RssFeed, BrowserScraper, GeminiEnricher>;

impl DigestPipeline {
    /// Wire the production feed reader, browser scraper and Gemini enricher.
    pub fn from_config(config: &DigestConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::new();
        Ok(Pipeline::new(
            RssFeed::new(client.clone(), config.feed_url.clone()),
            BrowserScraper::new(&config.scraper)?,
            GeminiEnricher::gemini(client, &config.model),
        ))
    }
}

impl<F, S, E> Pipeline<F, S, E>
where
    F: LinkSource,
    S: ArticleScraper,
    E: Enricher,
{
    pub fn new(feed: F, scraper: S, enricher: E) -> Self {
        Self {
            feed,
            scraper,
            enricher,
        }
    }

    /// Produce the digest for the first `limit` feed items.
    ///
    /// Only a feed failure aborts the run. Page failures become placeholder
    /// articles and an enrichment failure becomes "summary generation
    /// failed" entries.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self, limit: usize) -> Result<Vec<DigestEntry>, FeedError> {
        let t0 = Instant::now();

        let mut links = self.feed.fetch_links().await?;
        let available = links.len();
        links.truncate(limit);
        info!(available, selected = links.len(), "Selected feed items");

        let articles = self.scraper.scrape_pages(&links).await;
        let combined = combine_articles(&articles);

        let enrichment = match self.enricher.enrich(&combined).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "Enrichment failed; using fallback summaries");
                fallback_enrichment(&articles)
            }
        };

        let entries = merge_entries(&articles, &enrichment);
        info!(
            count = entries.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Pipeline run complete"
        );
        Ok(entries)
    }
}

/// Join articles into the text block sent to the model.
pub fn combine_articles(articles: &[RawArticle]) -> String {
    articles
        .iter()
        .map(|a| format!("Title: {}\n{}", a.title, a.content))
        .join(ARTICLE_SEPARATOR)
}

/// One "summary generation failed" record per article.
pub fn fallback_enrichment(articles: &[RawArticle]) -> Vec<EnrichmentResult> {
    articles
        .iter()
        .map(|a| EnrichmentResult::fallback(&a.title))
        .collect()
}

/// Pair each article with the enrichment at the same index.
///
/// Missing indices get defaults; surplus enrichment entries are ignored.
pub fn merge_entries(articles: &[RawArticle], enrichment: &[EnrichmentResult]) -> Vec<DigestEntry> {
    articles
        .iter()
        .enumerate()
        .map(|(i, raw)| DigestEntry::merge(raw, enrichment.get(i)))
        .collect()
}
