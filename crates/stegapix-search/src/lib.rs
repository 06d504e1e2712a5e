// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stegapix Search — paged image search, plain content fetching, and the
// discovery state machine that turns both into a stream of unseen, usable
// image candidates.

pub mod client;
pub mod discovery;
pub mod fetch;
pub mod validate;

#[cfg(test)]
mod test_server;

pub use client::{GoogleImageSearch, SearchClient, SearchPage};
pub use discovery::{CandidateDiscovery, DiscoveryState, SessionSnapshot};
pub use fetch::{ContentFetcher, HttpFetcher};
pub use validate::validate_content;
