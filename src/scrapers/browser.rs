//! Headless Chromium session used to render article pages.
//!
//! One [`BrowserSession`] (one browser process, one tab) serves a whole
//! batch. It is closed explicitly after the batch; if it is dropped on any
//! other path the guard aborts the CDP handler task and the dropped
//! `Browser` takes the child process down with it.

use super::pages::{PageExtractor, PageSource, into_articles, scrape_with};
use crate::config::ScraperConfig;
use crate::error::{ConfigError, ScrapeError};
use crate::models::{LinkRecord, RawArticle, ScrapeOutcome};
use crate::pipeline::ArticleScraper;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct BrowserSession {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
    selector_timeout: Duration,
    content_marker: String,
}

impl BrowserSession {
    /// Launch Chromium and open the tab the batch will reuse.
    #[instrument(level = "info", skip_all, fields(chrome_path = ?config.chrome_path))]
    pub async fn launch(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(ScrapeError::Browser)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(ScrapeError::Browser(e.to_string()));
            }
        };

        info!("Browser session started");
        Ok(Self {
            browser: Some(browser),
            page,
            handler,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            selector_timeout: Duration::from_secs(config.selector_timeout_secs),
            content_marker: config.content_marker.clone(),
        })
    }

    async fn wait_for_marker(&self) -> Result<(), ScrapeError> {
        let poll = async {
            while self.page.find_element(self.content_marker.as_str()).await.is_err() {
                sleep(MARKER_POLL_INTERVAL).await;
            }
        };
        timeout(self.selector_timeout, poll)
            .await
            .map_err(|_| ScrapeError::SelectorTimeout {
                selector: self.content_marker.clone(),
                secs: self.selector_timeout.as_secs(),
            })
    }

    /// Close the tab and the browser process.
    pub async fn close(mut self) {
        let _ = self.page.clone().close().await;
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "Browser did not close cleanly");
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
        info!("Browser session closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            warn!("Browser session dropped without close; killing browser");
        }
        self.handler.abort();
    }
}

impl PageSource for BrowserSession {
    async fn render(&mut self, url: &str) -> Result<String, ScrapeError> {
        match timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ScrapeError::Navigation(e.to_string())),
            Err(_) => {
                return Err(ScrapeError::NavigationTimeout(
                    self.navigation_timeout.as_secs(),
                ));
            }
        }

        self.wait_for_marker().await?;

        self.page
            .content()
            .await
            .map_err(|e| ScrapeError::Content(e.to_string()))
    }
}

/// Page scraper backed by a fresh browser session per batch.
#[derive(Debug, Clone)]
pub struct BrowserScraper {
    config: ScraperConfig,
    extractor: PageExtractor,
}

impl BrowserScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config: config.clone(),
            extractor: PageExtractor::from_config(config)?,
        })
    }
}

impl ArticleScraper for BrowserScraper {
    #[instrument(level = "info", skip_all, fields(count = links.len()))]
    async fn scrape_pages(&self, links: &[LinkRecord]) -> Vec<RawArticle> {
        if links.is_empty() {
            return Vec::new();
        }

        let outcomes = match BrowserSession::launch(&self.config).await {
            Ok(mut session) => {
                let outcomes = scrape_with(&mut session, &self.extractor, links).await;
                session.close().await;
                outcomes
            }
            Err(e) => {
                error!(error = %e, "Could not start browser; every page will be a placeholder");
                let reason = e.to_string();
                links
                    .iter()
                    .map(|link| ScrapeOutcome::Failed {
                        link: link.clone(),
                        reason: reason.clone(),
                    })
                    .collect()
            }
        };

        into_articles(outcomes)
    }
}
