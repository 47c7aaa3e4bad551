//! Data models flowing through the digest pipeline.
//!
//! - [`LinkRecord`]: one feed item, as read from the RSS document
//! - [`RawArticle`] / [`ScrapeOutcome`]: what the browser extracted for a link
//! - [`EnrichmentResult`]: the model's translation and summary, untrusted
//! - [`DigestEntry`] / [`Digest`]: the final records that are served and exported
//!
//! JSON field names are camelCase to match the schema the model is asked for
//! and the shape consumed by the HTML page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The lowest interest rating, also used whenever a rating is unknown.
pub const LOWEST_RATING: &str = "⭐️";

/// Marker used when the whole enrichment step failed.
pub const SUMMARY_FAILED: &str = "Summary generation failed";

/// Marker used when the model returned nothing usable for one article.
pub const SUMMARY_UNAVAILABLE: &str = "Summary not available";

/// A link discovered in the feed.
///
/// Duplicates are kept; the URL is the only identity a link has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub url: String,
    pub title: String,
    /// Raw `pubDate` text as published by the feed.
    pub published_at: String,
}

/// The text scraped from one article page.
///
/// When scraping failed, `content` holds a human-readable failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArticle {
    pub title: String,
    /// Newline-joined paragraphs.
    pub content: String,
    pub url: String,
    pub date: String,
}

/// Result of visiting a single link.
///
/// Every outcome still becomes a [`RawArticle`], so one bad page never
/// shortens the batch.
#[derive(Debug)]
pub enum ScrapeOutcome {
    Scraped(RawArticle),
    Failed { link: LinkRecord, reason: String },
}

impl ScrapeOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ScrapeOutcome::Failed { .. })
    }

    pub fn into_article(self) -> RawArticle {
        match self {
            ScrapeOutcome::Scraped(article) => article,
            ScrapeOutcome::Failed { link, reason } => RawArticle {
                content: format!("Failed to scrape article at {}: {}", link.url, reason),
                title: link.title,
                url: link.url,
                date: link.published_at,
            },
        }
    }
}

/// Translation and summary for one article as returned by the model.
///
/// Every field is optional: the model output is untrusted and the merge
/// step fills in defaults field by field.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentResult {
    pub translatedTitle: Option<String>,
    pub summary: Option<SummaryDraft>,
}

/// The summary block of an [`EnrichmentResult`].
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryDraft {
    pub quote: Option<String>,
    pub text: Option<String>,
    pub interestLevel: Option<String>,
}

impl EnrichmentResult {
    /// Read one element of the model's reply.
    ///
    /// Fields are taken one at a time; a field with the wrong type is
    /// treated as missing without discarding its siblings.
    pub fn from_value(value: &Value) -> Self {
        Self {
            translatedTitle: string_field(value, "translatedTitle"),
            summary: value
                .get("summary")
                .filter(|summary| summary.is_object())
                .map(SummaryDraft::from_value),
        }
    }

    /// The record substituted for every article when enrichment fails.
    pub fn fallback(original_title: &str) -> Self {
        Self {
            translatedTitle: Some(original_title.to_string()),
            summary: Some(SummaryDraft {
                quote: Some(String::new()),
                text: Some(SUMMARY_FAILED.to_string()),
                interestLevel: Some(LOWEST_RATING.to_string()),
            }),
        }
    }
}

impl SummaryDraft {
    pub fn from_value(value: &Value) -> Self {
        Self {
            quote: string_field(value, "quote"),
            text: string_field(value, "text"),
            interestLevel: value.get("interestLevel").and_then(normalize_rating),
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Render a 1-5 rating as repeated star glyphs, clamping out-of-range values.
pub fn rating_glyphs(rating: i64) -> String {
    LOWEST_RATING.repeat(rating.clamp(1, 5) as usize)
}

/// Normalize a model-supplied `interestLevel`.
///
/// Numbers are clamped to 1-5. Strings must be 1 to 5 star glyphs (with or
/// without the emoji variation selector) or a digit from 1 to 5; anything
/// else is unknown.
pub fn normalize_rating(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .map(rating_glyphs),
        Value::String(s) => {
            let s = s.trim();
            let stars = match s.parse::<i64>() {
                Ok(n) => n,
                Err(_) if s.chars().all(|c| c == '⭐' || c == '\u{FE0F}' || c.is_whitespace()) => {
                    s.chars().filter(|&c| c == '⭐').count() as i64
                }
                Err(_) => return None,
            };
            (1..=5).contains(&stars).then(|| rating_glyphs(stars))
        }
        _ => None,
    }
}

/// Final summary shown to readers.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Summary {
    pub quote: String,
    pub text: String,
    pub interestLevel: String,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            quote: String::new(),
            text: SUMMARY_UNAVAILABLE.to_string(),
            interestLevel: LOWEST_RATING.to_string(),
        }
    }
}

/// One article of the published digest.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DigestEntry {
    pub originalTitle: String,
    pub translatedTitle: String,
    pub summary: Summary,
    pub url: String,
    pub date: String,
}

impl DigestEntry {
    /// Merge a raw article with whatever the model returned for it.
    ///
    /// Missing or blank fields fall back to the original title and the
    /// "not available" summary defaults.
    pub fn merge(raw: &RawArticle, enrichment: Option<&EnrichmentResult>) -> Self {
        let defaults = Summary::default();
        let non_blank = |s: &Option<String>| s.as_ref().filter(|v| !v.trim().is_empty()).cloned();

        let translated_title = enrichment
            .and_then(|e| non_blank(&e.translatedTitle))
            .unwrap_or_else(|| raw.title.clone());

        let summary = match enrichment.and_then(|e| e.summary.as_ref()) {
            Some(draft) => Summary {
                quote: draft.quote.clone().unwrap_or(defaults.quote),
                text: non_blank(&draft.text).unwrap_or(defaults.text),
                interestLevel: non_blank(&draft.interestLevel).unwrap_or(defaults.interestLevel),
            },
            None => defaults,
        };

        DigestEntry {
            originalTitle: raw.title.clone(),
            translatedTitle: translated_title,
            summary,
            url: raw.url.clone(),
            date: raw.date.clone(),
        }
    }
}

/// The document served by the API and written to `articles.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Digest {
    pub articles: Vec<DigestEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(title: &str) -> RawArticle {
        RawArticle {
            title: title.to_string(),
            content: "Body".to_string(),
            url: "https://example.com/a".to_string(),
            date: "Mon, 06 May 2025 14:30:00 +0000".to_string(),
        }
    }

    #[test]
    fn test_failed_outcome_becomes_placeholder() {
        let outcome = ScrapeOutcome::Failed {
            link: LinkRecord {
                url: "https://example.com/broken".to_string(),
                title: "Broken".to_string(),
                published_at: "today".to_string(),
            },
            reason: "navigation timed out after 30s".to_string(),
        };
        assert!(outcome.is_failed());

        let article = outcome.into_article();
        assert_eq!(article.title, "Broken");
        assert_eq!(article.date, "today");
        assert!(article.content.contains("https://example.com/broken"));
        assert!(article.content.contains("navigation timed out after 30s"));
    }

    #[test]
    fn test_merge_without_enrichment_uses_defaults() {
        let entry = DigestEntry::merge(&raw("Original"), None);
        assert_eq!(entry.translatedTitle, "Original");
        assert_eq!(entry.originalTitle, "Original");
        assert_eq!(entry.summary.text, SUMMARY_UNAVAILABLE);
        assert_eq!(entry.summary.interestLevel, LOWEST_RATING);
        assert_eq!(entry.summary.quote, "");
    }

    #[test]
    fn test_merge_fills_missing_fields_individually() {
        let enrichment = EnrichmentResult {
            translatedTitle: Some("  ".to_string()),
            summary: Some(SummaryDraft {
                quote: None,
                text: Some("A short summary".to_string()),
                interestLevel: None,
            }),
        };
        let entry = DigestEntry::merge(&raw("Original"), Some(&enrichment));
        assert_eq!(entry.translatedTitle, "Original");
        assert_eq!(entry.summary.text, "A short summary");
        assert_eq!(entry.summary.quote, "");
        assert_eq!(entry.summary.interestLevel, LOWEST_RATING);
    }

    #[test]
    fn test_fallback_enrichment_marks_failure() {
        let entry = DigestEntry::merge(&raw("Original"), Some(&EnrichmentResult::fallback("Original")));
        assert_eq!(entry.translatedTitle, "Original");
        assert_eq!(entry.summary.text, SUMMARY_FAILED);
        assert_eq!(entry.summary.interestLevel, "⭐️");
    }

    #[test]
    fn test_rating_accepts_numbers_and_glyphs() {
        let draft = SummaryDraft::from_value(&json!({"quote": "q", "text": "t", "interestLevel": 3}));
        assert_eq!(draft.interestLevel.as_deref(), Some("⭐️⭐️⭐️"));

        let draft = SummaryDraft::from_value(&json!({"interestLevel": "⭐️⭐️"}));
        assert_eq!(draft.interestLevel.as_deref(), Some("⭐️⭐️"));
        assert_eq!(draft.text, None);

        let draft = SummaryDraft::from_value(&json!({"interestLevel": 42}));
        assert_eq!(draft.interestLevel, Some(rating_glyphs(5)));
    }

    #[test]
    fn test_rating_rejects_free_text() {
        assert_eq!(normalize_rating(&json!("high")), None);
        assert_eq!(normalize_rating(&json!("⭐️ very interesting")), None);
        assert_eq!(normalize_rating(&json!("⭐️⭐️⭐️⭐️⭐️⭐️")), None);
        assert_eq!(normalize_rating(&json!("")), None);
        assert_eq!(normalize_rating(&json!("0")), None);
        assert_eq!(normalize_rating(&json!(["⭐️"])), None);

        // Bare stars without the variation selector are normalized.
        assert_eq!(normalize_rating(&json!("⭐⭐")), Some(rating_glyphs(2)));
        assert_eq!(normalize_rating(&json!(" 4 ")), Some(rating_glyphs(4)));
    }

    #[test]
    fn test_free_text_rating_merges_as_lowest() {
        let enrichment = EnrichmentResult::from_value(&json!({
            "translatedTitle": "Title",
            "summary": {"text": "Body", "interestLevel": "high"}
        }));
        let entry = DigestEntry::merge(&raw("Original"), Some(&enrichment));
        assert_eq!(entry.summary.interestLevel, LOWEST_RATING);
        assert_eq!(entry.summary.text, "Body");
    }

    #[test]
    fn test_wrong_typed_fields_keep_their_siblings() {
        let result = EnrichmentResult::from_value(&json!({
            "translatedTitle": "Hello",
            "summary": "just a string"
        }));
        assert_eq!(result.translatedTitle.as_deref(), Some("Hello"));
        assert_eq!(result.summary, None);

        let result = EnrichmentResult::from_value(&json!({
            "translatedTitle": 12,
            "summary": {"quote": 7, "text": "ok text", "interestLevel": "⭐️⭐️⭐️"}
        }));
        assert_eq!(result.translatedTitle, None);
        let summary = result.summary.unwrap();
        assert_eq!(summary.quote, None);
        assert_eq!(summary.text.as_deref(), Some("ok text"));
        assert_eq!(summary.interestLevel.as_deref(), Some("⭐️⭐️⭐️"));

        assert_eq!(EnrichmentResult::from_value(&json!(42)), EnrichmentResult::default());
    }

    #[test]
    fn test_digest_entry_serializes_camel_case() {
        let entry = DigestEntry::merge(&raw("Original"), None);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"originalTitle\""));
        assert!(json.contains("\"translatedTitle\""));
        assert!(json.contains("\"interestLevel\""));
    }
}
