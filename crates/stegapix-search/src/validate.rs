// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content checks applied to every candidate before it is yielded.

use stegapix_core::error::{Result, StegapixError};
use stegapix_core::types::FetchedContent;

/// Accept only successful responses whose content type is a non-GIF image.
pub fn validate_content(url: &str, content: &FetchedContent) -> Result<()> {
    let reject = |reason: String| {
        Err(StegapixError::InvalidContent {
            url: url.to_owned(),
            reason,
        })
    };

    if !content.is_success() {
        return reject(format!("HTTP status {}", content.status));
    }

    let Some(essence) = content.mime_essence() else {
        return reject("no content type".into());
    };
    let (kind, subtype) = essence.split_once('/').unwrap_or((essence.as_str(), ""));

    if kind != "image" {
        return reject(format!("{essence} is not an image"));
    }
    if subtype == "gif" {
        return reject("image/gif is excluded".into());
    }
    Ok(())
}
