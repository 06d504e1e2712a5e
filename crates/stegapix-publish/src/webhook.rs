// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Announce hosted images by POSTing a small JSON message to a webhook.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{error, info, instrument};

use stegapix_core::error::{Result, StegapixError};

use crate::traits::{Announcer, HostedImage};

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

/// [`Announcer`] that posts `{"content": "<link>"}` to a URL.
pub struct WebhookAnnouncer {
    client: Client,
    url: String,
}

impl WebhookAnnouncer {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(StegapixError::InvalidConfiguration(
                "announce webhook URL is empty".into(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StegapixError::PublishFailure(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }
}

impl Announcer for WebhookAnnouncer {
    #[instrument(skip_all, fields(id = %image.id))]
    fn announce(&self, image: &HostedImage) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookMessage {
                content: &image.link,
            })
            .send()
            .map_err(|e| StegapixError::PublishFailure(format!("webhook: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "webhook rejected the announcement");
            return Err(StegapixError::PublishFailure(format!(
                "webhook returned status {}",
                status.as_u16()
            )));
        }
        info!(link = %image.link, "announced");
        Ok(())
    }
}
