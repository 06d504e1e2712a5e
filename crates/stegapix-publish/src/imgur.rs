// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Anonymous Imgur uploads.
//
//   POST {endpoint}/3/image
//   Authorization: Client-ID <client id>
//   image=<base64 bytes>&type=base64
//
// Success bodies look like {"data": {"id": "...", "link": "..."}, "success": true}.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use stegapix_core::error::{Result, StegapixError};

use crate::traits::{HostedImage, ImageHost};

/// [`ImageHost`] backed by the Imgur v3 API.
pub struct ImgurHost {
    client: Client,
    endpoint: String,
    client_id: String,
}

impl ImgurHost {
    pub fn new(endpoint: &str, client_id: &str, timeout: Duration) -> Result<Self> {
        if client_id.trim().is_empty() {
            return Err(StegapixError::InvalidConfiguration(
                "publish.client_id is required for Imgur uploads".into(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stegapix/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StegapixError::PublishFailure(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            client_id: client_id.to_owned(),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/3/image", self.endpoint)
    }
}

impl ImageHost for ImgurHost {
    #[instrument(skip_all, fields(len = image_bytes.len()))]
    fn host(&self, image_bytes: &[u8]) -> Result<HostedImage> {
        let encoded = STANDARD.encode(image_bytes);
        let response = self
            .client
            .post(self.upload_url())
            .header(AUTHORIZATION, format!("Client-ID {}", self.client_id))
            .form(&[("image", encoded.as_str()), ("type", "base64")])
            .send()
            .map_err(|e| StegapixError::PublishFailure(format!("imgur upload: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| StegapixError::PublishFailure(format!("imgur body: {e}")))?;
        if !status.is_success() {
            error!(status = status.as_u16(), "imgur rejected the upload");
            return Err(StegapixError::PublishFailure(format!(
                "imgur returned status {}",
                status.as_u16()
            )));
        }

        let hosted = parse_upload_response(&body)?;
        debug!(id = %hosted.id, "imgur upload complete");
        Ok(hosted)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
    #[serde(default = "default_success")]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    id: Option<String>,
    link: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Pull the hosted id and link out of an upload response body.
pub fn parse_upload_response(body: &str) -> Result<HostedImage> {
    let raw: UploadResponse = serde_json::from_str(body)
        .map_err(|e| StegapixError::PublishFailure(format!("imgur JSON: {e}")))?;
    if !raw.success {
        return Err(StegapixError::PublishFailure(
            "imgur reported success=false".into(),
        ));
    }
    match raw.data {
        Some(UploadData {
            id: Some(id),
            link: Some(link),
        }) => Ok(HostedImage { id, link }),
        _ => Err(StegapixError::PublishFailure(
            "imgur response missing data.id or data.link".into(),
        )),
    }
}
