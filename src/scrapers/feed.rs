//! RSS feed reader.
//!
//! Fetches the configured feed and maps every `channel/item` into a
//! [`LinkRecord`], keeping the order the feed publishes them in.

use crate::error::FeedError;
use crate::models::LinkRecord;
use crate::pipeline::LinkSource;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

/// Items may be interleaved with other channel elements; the
/// `overlapped-lists` feature of quick-xml collects them all.
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
}

/// Reads links from a single RSS feed.
#[derive(Debug, Clone)]
pub struct RssFeed {
    client: reqwest::Client,
    url: String,
}

impl RssFeed {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl LinkSource for RssFeed {
    #[instrument(level = "info", skip_all, fields(feed = %self.url))]
    async fn fetch_links(&self) -> Result<Vec<LinkRecord>, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Feed request rejected");
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }

        let xml = response.text().await?;
        let links = parse_feed(&xml, Url::parse(&self.url).ok().as_ref())?;
        info!(count = links.len(), "Indexed feed items");
        debug!(urls = ?links.iter().map(|l| l.url.as_str()).collect::<Vec<_>>(), "Feed URLs");
        Ok(links)
    }
}

/// Parse an RSS document into link records.
///
/// Relative item links are resolved against `base` when one is given.
/// Missing fields become empty strings; items are never dropped.
pub fn parse_feed(xml: &str, base: Option<&Url>) -> Result<Vec<LinkRecord>, FeedError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;

    let links = rss
        .channel
        .items
        .into_iter()
        .map(|item| {
            let raw_link = item.link.unwrap_or_default().trim().to_string();
            let url = match base {
                Some(base) if !raw_link.is_empty() => base
                    .join(&raw_link)
                    .map(|u| u.to_string())
                    .unwrap_or(raw_link),
                _ => raw_link,
            };
            LinkRecord {
                url,
                title: item.title.unwrap_or_default().trim().to_string(),
                published_at: item.pub_date.unwrap_or_default().trim().to_string(),
            }
        })
        .collect();

    Ok(links)
}
