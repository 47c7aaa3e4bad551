//! Article discovery and scraping.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing** ([`feed`]): read the RSS feed into ordered link records
//! 2. **Fetching** ([`browser`] + [`pages`]): render each link in a headless
//!    browser and extract title and body text
//!
//! Pages are visited strictly one after another in a single browser
//! session. A page that fails to load becomes a placeholder article instead
//! of failing the batch.

pub mod browser;
pub mod feed;
pub mod pages;
