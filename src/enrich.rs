//! Translation and summarization of a scraped batch through the model.
//!
//! The whole batch goes out in one prompt; the reply is free text that
//! should contain a JSON array with one object per article, in order.

use crate::api::{AskAsync, GeminiClient, ask_with_backoff};
use crate::config::ModelConfig;
use crate::error::EnrichmentError;
use crate::models::EnrichmentResult;
use crate::pipeline::Enricher;
use crate::utils::truncate_for_log;
use serde_json::Value;
use std::fmt;
use tracing::{info, instrument, warn};

/// Build the instruction prompt for a batch of articles.
///
/// `combined_text` holds the articles separated by `---` lines.
pub fn build_prompt(combined_text: &str, target_language: &str) -> String {
    format!(
        r#"You are a news editor preparing a digest for {language}-speaking readers.

Below are news articles separated by lines containing only "---".
For EACH article, in the same order, produce:
- "translatedTitle": the headline translated into natural {language}.
- "summary": an object with
  - "quote": the single most telling sentence from the article, translated into {language}, or "" if there is none.
  - "text": a 2-3 sentence summary in {language}.
  - "interestLevel": a rating written as 1 to 5 "⭐️" characters, using this rubric:
      ⭐️ routine or local item with little wider impact
      ⭐️⭐️ minor update on an ongoing story
      ⭐️⭐️⭐️ notable development for the country or an industry
      ⭐️⭐️⭐️⭐️ major national news or significant international implications
      ⭐️⭐️⭐️⭐️⭐️ historic or breaking news with broad global impact

Output format rules:
- Respond with a JSON array ONLY, one object per article, in input order.
- No prose before or after the array. No markdown. No code fences.
- Each object must look exactly like:
  {{"translatedTitle": "...", "summary": {{"quote": "...", "text": "...", "interestLevel": "⭐️⭐️⭐️"}}}}

Articles:

{articles}"#,
        language = target_language,
        articles = combined_text,
    )
}

/// The substring from the first `[` to the last `]`, if both exist in order.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the model reply into per-article results.
///
/// Each element is read field by field. Elements that are not objects
/// become empty results, so the positions of the remaining elements are
/// preserved.
pub fn parse_enrichment(reply: &str) -> Result<Vec<EnrichmentResult>, EnrichmentError> {
    let json = extract_json_array(reply).ok_or(EnrichmentError::MissingJsonArray)?;
    let values: Vec<Value> = serde_json::from_str(json)?;

    Ok(values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            if !value.is_object() {
                warn!(index, "Enrichment entry is not an object; using defaults");
            }
            EnrichmentResult::from_value(value)
        })
        .collect())
}

/// Enricher that prompts a language model once per batch.
#[derive(Debug, Clone)]
pub struct ModelEnricher<A> {
    asker: A,
    target_language: String,
    max_retries: usize,
}

pub type GeminiEnricher = ModelEnricher<GeminiClient>;

impl GeminiEnricher {
    pub fn gemini(client: reqwest::Client, config: &ModelConfig) -> Self {
        ModelEnricher::new(
            GeminiClient::new(client, config),
            &config.target_language,
            config.max_retries,
        )
    }
}

impl<A> ModelEnricher<A> {
    pub fn new(asker: A, target_language: &str, max_retries: usize) -> Self {
        Self {
            asker,
            target_language: target_language.to_string(),
            max_retries,
        }
    }
}

impl<A> Enricher for ModelEnricher<A>
where
    A: AskAsync<Response = String> + Clone + fmt::Debug,
{
    #[instrument(level = "info", skip_all, fields(bytes = combined_text.len()))]
    async fn enrich(&self, combined_text: &str) -> Result<Vec<EnrichmentResult>, EnrichmentError> {
        if combined_text.trim().is_empty() {
            info!("Nothing to enrich");
            return Ok(Vec::new());
        }

        let prompt = build_prompt(combined_text, &self.target_language);
        let reply = ask_with_backoff(self.asker.clone(), &prompt, self.max_retries).await?;

        let results = parse_enrichment(&reply).inspect_err(|e| {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&reply, 300),
                "Model returned non-conforming output"
            );
        })?;
        info!(count = results.len(), "Parsed enrichment results");
        Ok(results)
    }
}
