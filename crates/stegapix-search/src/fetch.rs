// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain HTTP GET of candidate image URLs.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use stegapix_core::error::{Result, StegapixError};
use stegapix_core::types::FetchedContent;

/// Downloads the content behind a URL.
///
/// Non-2xx responses are returned as data so the caller can decide what a
/// failed status means; only transport failures are errors.
pub trait ContentFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedContent>;
}

/// [`ContentFetcher`] over a blocking `reqwest` client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stegapix/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StegapixError::ProviderUnavailable(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(client))
    }

    /// Use an already configured HTTP client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl ContentFetcher for HttpFetcher {
    #[instrument(skip(self))]
    fn fetch(&self, url: &str) -> Result<FetchedContent> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| StegapixError::ProviderUnavailable(format!("GET {url}: {e}")))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .bytes()
            .map_err(|e| StegapixError::ProviderUnavailable(format!("GET {url} body: {e}")))?
            .to_vec();

        debug!(
            status,
            content_type = content_type.as_deref().unwrap_or("-"),
            len = bytes.len(),
            "content fetched"
        );
        Ok(FetchedContent {
            status,
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{CannedServer, direct_client};

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];

    #[test]
    fn captures_status_type_and_body() {
        let server = CannedServer::start("200 OK", "image/png", PNG_SIGNATURE.to_vec());
        let url = format!("{}/pics/a.png", server.url);

        let content = HttpFetcher::with_client(direct_client()).fetch(&url).expect("fetch");
        assert_eq!(content.status, 200);
        assert_eq!(content.content_type.as_deref(), Some("image/png"));
        assert_eq!(content.bytes, PNG_SIGNATURE);

        let head = server.request_head();
        assert!(head.starts_with("GET /pics/a.png HTTP/1.1"), "{head}");
    }

    #[test]
    fn failed_status_is_data_not_error() {
        let server = CannedServer::start("404 Not Found", "text/html", b"gone".to_vec());
        let url = format!("{}/missing.jpg", server.url);

        let content = HttpFetcher::with_client(direct_client()).fetch(&url).expect("fetch");
        server.request_head();
        assert_eq!(content.status, 404);
        assert!(!content.is_success());
        assert_eq!(content.bytes, b"gone");
    }

    #[test]
    fn refused_connection_is_provider_unavailable() {
        // Bind then drop, so nothing listens on the port.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .expect("addr");
        let result = HttpFetcher::with_client(direct_client()).fetch(&format!("http://{addr}/x.png"));
        assert!(matches!(result, Err(StegapixError::ProviderUnavailable(_))));
    }
}
