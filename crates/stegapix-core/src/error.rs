// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Stegapix.

use thiserror::Error;

/// Top-level error type for all Stegapix operations.
#[derive(Debug, Error)]
pub enum StegapixError {
    // -- Discovery errors --
    #[error("search provider has no more results for '{term}' (page {page_index})")]
    ProviderExhausted { term: String, page_index: u32 },

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("malformed search response: {0}")]
    MalformedResponse(String),

    #[error("invalid content at {url}: {reason}")]
    InvalidContent { url: String, reason: String },

    // -- Codec errors --
    #[error(
        "dimension mismatch: veil is {veil_width}x{veil_height}, message is {message_width}x{message_height}"
    )]
    DimensionMismatch {
        veil_width: u32,
        veil_height: u32,
        message_width: u32,
        message_height: u32,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Publishing --
    #[error("publish failed: {0}")]
    PublishFailure(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StegapixError {
    /// Whether the discovery loop may skip past this error and keep going.
    ///
    /// Only content problems with a single candidate qualify; everything
    /// else ends the current cycle.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::InvalidContent { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StegapixError>;
