// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StegapixError};

/// Default number of low bits overwritten in each veil channel.
pub const DEFAULT_LSB_BITS: u8 = 2;

/// Google Custom Search JSON API endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The provider refuses page sizes above this.
pub const MAX_PAGE_SIZE: u32 = 10;

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search term for the image that gets hidden.
    pub message_search_term: String,
    /// Search term for the carrier image.
    pub veil_search_term: String,
    /// Start each discovery session at the last persisted page for its term.
    pub resume_from_last_index: bool,
    /// Low bits per veil channel that carry message data (1..=7).
    pub lsb_bits: u8,
    /// Timeout applied to every outbound HTTP request.
    pub http_timeout_secs: u64,
    pub search: SearchConfig,
    pub publish: PublishConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            message_search_term: "snow the rapper".into(),
            veil_search_term: "snow".into(),
            resume_from_last_index: false,
            lsb_bits: DEFAULT_LSB_BITS,
            http_timeout_secs: 30,
            search: SearchConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.message_search_term.trim().is_empty() {
            return Err(StegapixError::InvalidConfiguration(
                "message_search_term must not be empty".into(),
            ));
        }
        if self.veil_search_term.trim().is_empty() {
            return Err(StegapixError::InvalidConfiguration(
                "veil_search_term must not be empty".into(),
            ));
        }
        validate_lsb_bits(self.lsb_bits)?;
        if self.http_timeout_secs == 0 {
            return Err(StegapixError::InvalidConfiguration(
                "http_timeout_secs must be at least 1".into(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.search.page_size) {
            return Err(StegapixError::InvalidConfiguration(format!(
                "search.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.search.page_size
            )));
        }
        Ok(())
    }
}

/// Check that `bits` is a usable LSB depth.
pub fn validate_lsb_bits(bits: u8) -> Result<()> {
    if (1..=7).contains(&bits) {
        Ok(())
    } else {
        Err(StegapixError::InvalidConfiguration(format!(
            "lsb_bits must be between 1 and 7, got {bits}"
        )))
    }
}

/// Image search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    /// API key (usually supplied through `STEGAPIX_GOOGLE_API_KEY`).
    pub api_key: String,
    /// Custom search engine id (usually supplied through `STEGAPIX_GOOGLE_CX`).
    pub cx_id: String,
    /// Results per page, 1..=10.
    pub page_size: u32,
    /// Optional `imgSize` filter passed to the provider.
    pub image_size: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.into(),
            api_key: String::new(),
            cx_id: String::new(),
            page_size: MAX_PAGE_SIZE,
            image_size: Some("large".into()),
        }
    }
}

/// Where finished images go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PublishConfig {
    /// Write PNGs into a local directory (relative paths resolve against the
    /// data directory).
    Directory { path: PathBuf },
    /// Upload to Imgur, then optionally announce the link on a webhook.
    Imgur {
        #[serde(default)]
        client_id: String,
        #[serde(default = "default_imgur_endpoint")]
        endpoint: String,
        #[serde(default)]
        announce_webhook: Option<String>,
    },
}

fn default_imgur_endpoint() -> String {
    "https://api.imgur.com".into()
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self::Directory {
            path: PathBuf::from("published"),
        }
    }
}
