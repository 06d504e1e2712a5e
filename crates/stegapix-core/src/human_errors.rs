// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to a one-line summary and a suggestion the
// operator can act on before the next run.

use crate::error::StegapixError;

/// How the operator should react to a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Likely to succeed if the run is repeated later.
    Transient,
    /// Settings, credentials, or the environment need fixing first.
    ActionRequired,
    /// A bug or a state that repeating will not change.
    Permanent,
}

/// A technical error restated for the person running the tool.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What to try next.
    pub suggestion: String,
    /// Whether simply running again is reasonable.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `StegapixError` into a `HumanError`.
pub fn humanize_error(err: &StegapixError) -> HumanError {
    match err {
        // -- Discovery --
        StegapixError::ProviderExhausted { term, page_index } => HumanError {
            message: format!("The image search ran out of results for \"{term}\"."),
            suggestion: format!(
                "Every result up to page {page_index} has been used or rejected. Pick a different search term, or turn off resume_from_last_index to rescan from page 1."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        StegapixError::ProviderUnavailable(detail) => humanize_provider_error(detail),
        StegapixError::MalformedResponse(_) => HumanError {
            message: "The image search answered with something unexpected.".into(),
            suggestion: "Check that search.endpoint points at a Custom Search JSON API endpoint.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        StegapixError::InvalidContent { url, .. } => HumanError {
            message: "A downloaded file was not a usable image.".into(),
            suggestion: format!("It will be skipped on the next run. ({url})"),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Codec --
        StegapixError::DimensionMismatch { .. } => HumanError {
            message: "The two images are not the same size.".into(),
            suggestion: "Resize the veil image to the message image's dimensions before embedding.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        StegapixError::InvalidConfiguration(detail) => HumanError {
            message: "The configuration is not usable.".into(),
            suggestion: format!("Fix the setting and run again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        StegapixError::ImageError(_) => HumanError {
            message: "An image could not be decoded or encoded.".into(),
            suggestion: "The file may be damaged or in an unusual format. Try a PNG or JPEG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Publishing --
        StegapixError::PublishFailure(detail) => HumanError {
            message: "The finished image could not be published.".into(),
            suggestion: format!(
                "Nothing was recorded, so the same images will be tried again next run. Check the publishing credentials. ({detail})"
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        StegapixError::Database(_) => HumanError {
            message: "The history database had a problem.".into(),
            suggestion: "If an image was just published it may be posted again on the next run. Check the data directory is writable.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        StegapixError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file couldn't be found.".into(),
                suggestion: "Check the path and try again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied while reading or writing a file.".into(),
                suggestion: "Check the permissions of the data directory.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },
        StegapixError::Serialization(_) => HumanError {
            message: "A settings or response file could not be parsed.".into(),
            suggestion: "Check the configuration file is valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// Parse provider error details into human-readable messages.
fn humanize_provider_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("status 403") || lower.contains("status 401") {
        HumanError {
            message: "The image search rejected our credentials.".into(),
            suggestion: "Check STEGAPIX_GOOGLE_API_KEY and STEGAPIX_GOOGLE_CX.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("status 429") {
        HumanError {
            message: "The image search quota is used up.".into(),
            suggestion: "Wait for the daily quota to reset, then run again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("status 400") {
        HumanError {
            message: "The image search refused the request.".into(),
            suggestion: "The provider only serves the first 100 results per term. Try a different term.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("timed out") {
        HumanError {
            message: "The image search didn't respond in time.".into(),
            suggestion: "Check the network connection or raise http_timeout_secs.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "The image search is not reachable right now.".into(),
            suggestion: format!("Try again later. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
