// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Stegapix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one publishing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which part an image plays in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageRole {
    /// The payload hidden inside the veil.
    Message,
    /// The carrier whose low bits are overwritten.
    Veil,
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message => f.write_str("message"),
            Self::Veil => f.write_str("veil"),
        }
    }
}

/// One search hit: where the image lives and the size the provider reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl ImageDescriptor {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }
}

/// Resumable pagination marker for a single search term.
///
/// `page_index` is 1-based and never decreases for a given term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCursor {
    pub term: String,
    pub page_index: u32,
}

impl SearchCursor {
    /// A cursor positioned on the first page.
    pub fn first_page(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            page_index: 1,
        }
    }

    /// A cursor at `page_index`, clamped so it is never below 1.
    pub fn at(term: impl Into<String>, page_index: u32) -> Self {
        Self {
            term: term.into(),
            page_index: page_index.max(1),
        }
    }

    /// Move to the next page.
    pub fn advance(&mut self) {
        self.page_index = self.page_index.saturating_add(1);
    }
}

/// The response to a plain GET of a candidate image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Content-Type` header, parameters included.
    pub content_type: Option<String>,
    /// Response body.
    pub bytes: Vec<u8>,
}

impl FetchedContent {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `type/subtype` part of the content type, lowercased, without
    /// parameters such as `; charset=...`.
    pub fn mime_essence(&self) -> Option<String> {
        let raw = self.content_type.as_deref()?;
        let essence = raw.split(';').next().unwrap_or("").trim();
        if essence.is_empty() {
            None
        } else {
            Some(essence.to_ascii_lowercase())
        }
    }

    /// Suggested file extension, taken from the MIME subtype.
    pub fn extension(&self) -> &'static str {
        match self.mime_essence().as_deref() {
            Some("image/png") => "png",
            Some("image/jpeg") | Some("image/jpg") | Some("image/pjpeg") => "jpg",
            Some("image/webp") => "webp",
            Some("image/bmp") => "bmp",
            Some("image/tiff") => "tiff",
            _ => "bin",
        }
    }
}

/// A descriptor that passed duplicate and content checks, together with the
/// body that was fetched while validating it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub descriptor: ImageDescriptor,
    pub content: FetchedContent,
}

impl Candidate {
    pub fn url(&self) -> &str {
        &self.descriptor.url
    }
}

/// The outcome of a successful publishing cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub cycle_id: CycleId,
    /// Identifier handed back by the publisher.
    pub artifact_id: String,
    pub message_url: String,
    pub veil_url: String,
    /// SHA-256 hex digest of the published PNG.
    pub sha256: String,
    pub width: u32,
    pub height: u32,
    pub published_at: DateTime<Utc>,
}
