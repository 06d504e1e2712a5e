// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blocking client for a Custom-Search-style JSON image search API.
//
// One request returns one page of results:
//
//   GET {endpoint}?q=<term>&start=<offset>&num=<page size>
//                 &key=<api key>&cx=<engine id>&searchType=image[&imgSize=...]
//
// `start` is the 1-based offset of the first result, so page N begins at
// (N - 1) * page_size + 1.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use stegapix_core::config::SearchConfig;
use stegapix_core::error::{Result, StegapixError};
use stegapix_core::types::ImageDescriptor;

/// Longest slice of an error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 300;

/// One page of search results, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub items: Vec<ImageDescriptor>,
    /// Items the provider sent, including ones dropped while parsing.
    pub raw_len: usize,
}

impl SearchPage {
    /// A page where every provider item was usable.
    pub fn new(items: Vec<ImageDescriptor>) -> Self {
        Self {
            raw_len: items.len(),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The provider returned no items at all, so there are no further pages.
    pub fn is_exhausted(&self) -> bool {
        self.raw_len == 0
    }
}

/// A paginated image search.
pub trait SearchClient {
    /// Fetch page `page_index` (1-based) of results for `term`.
    fn fetch_page(&self, term: &str, page_index: u32) -> Result<SearchPage>;
}

/// [`SearchClient`] for the Google Custom Search JSON API.
pub struct GoogleImageSearch {
    client: Client,
    config: SearchConfig,
}

impl GoogleImageSearch {
    /// Build a client from the search settings.
    pub fn new(config: SearchConfig, timeout: Duration) -> Result<Self> {
        if config.api_key.trim().is_empty() || config.cx_id.trim().is_empty() {
            return Err(StegapixError::InvalidConfiguration(
                "search.api_key and search.cx_id are required".into(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stegapix/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StegapixError::ProviderUnavailable(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(config, client))
    }

    /// Use an already configured HTTP client.
    pub fn with_client(config: SearchConfig, client: Client) -> Self {
        Self { client, config }
    }
}

impl SearchClient for GoogleImageSearch {
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    fn fetch_page(&self, term: &str, page_index: u32) -> Result<SearchPage> {
        let start = start_offset(page_index, self.config.page_size);
        let mut query: Vec<(&str, String)> = vec![
            ("q", term.to_owned()),
            ("start", start.to_string()),
            ("num", self.config.page_size.to_string()),
            ("key", self.config.api_key.clone()),
            ("cx", self.config.cx_id.clone()),
            ("searchType", "image".to_owned()),
        ];
        if let Some(size) = &self.config.image_size {
            query.push(("imgSize", size.clone()));
        }

        debug!(start, "requesting search page");
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&query)
            .send()
            .map_err(|e| StegapixError::ProviderUnavailable(format!("search request: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| StegapixError::ProviderUnavailable(format!("search body: {e}")))?;

        if !status.is_success() {
            error!(status = status.as_u16(), "search request failed");
            return Err(StegapixError::ProviderUnavailable(format!(
                "search returned status {}: {}",
                status.as_u16(),
                truncate(&body, ERROR_BODY_LIMIT)
            )));
        }

        let page = parse_search_page(&body)?;
        info!(items = page.items.len(), "search page received");
        Ok(page)
    }
}

/// 1-based offset of the first result on `page_index`.
pub fn start_offset(page_index: u32, page_size: u32) -> u32 {
    page_index
        .max(1)
        .saturating_sub(1)
        .saturating_mul(page_size)
        .saturating_add(1)
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    link: Option<String>,
    image: Option<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse a search response body.
///
/// A response without an `items` array is an empty page. Items missing a link
/// or dimensions are dropped.
pub fn parse_search_page(body: &str) -> Result<SearchPage> {
    let raw: RawResponse = serde_json::from_str(body)
        .map_err(|e| StegapixError::MalformedResponse(format!("search JSON: {e}")))?;

    let raw_len = raw.items.len();
    let mut items = Vec::with_capacity(raw_len);
    for item in raw.items {
        let (Some(link), Some(image)) = (item.link, item.image) else {
            warn!("search item without link or image block dropped");
            continue;
        };
        match (image.width, image.height) {
            (Some(width), Some(height)) => items.push(ImageDescriptor::new(link, width, height)),
            _ => warn!(url = %link, "search item without dimensions dropped"),
        }
    }
    Ok(SearchPage { items, raw_len })
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
