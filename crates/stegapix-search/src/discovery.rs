// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate discovery — a pull-driven state machine over one search term.
//
//   Fetching ──page──▶ Filtering ──unseen──▶ Validating ──ok──▶ Yielding
//      ▲                  │  seen               │ rejected          │
//      │                  ▼                     ▼                   │
//      └──── page consumed, cursor + 1 ◀──── next item ◀────────────┘
//
//   Fetching ──empty page / provider error──▶ Exhausted (terminal)
//
// The session buffers at most one page. Candidates come out in page order,
// then in-page order. The cursor it advances is only staged here; the
// orchestrator persists it together with the consumed URLs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use stegapix_core::error::{Result, StegapixError};
use stegapix_core::types::{Candidate, ImageDescriptor, SearchCursor};
use stegapix_store::DuplicateStore;

use crate::client::SearchClient;
use crate::fetch::ContentFetcher;
use crate::validate::validate_content;

/// Where a discovery session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryState {
    /// Requesting the page at the cursor.
    Fetching,
    /// Checking the next descriptor against the seen set.
    Filtering,
    /// Downloading the next descriptor and checking its content type.
    Validating,
    /// A candidate was just handed out.
    Yielding,
    /// The provider ran dry or failed. No further requests are made.
    Exhausted,
}

/// Inspectable, serialisable view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub term: String,
    pub page_index: u32,
    /// Index of the next unprocessed item on the buffered page.
    pub offset: usize,
    pub state: DiscoveryState,
    pub pages_consumed: u32,
}

/// Why a session stopped, kept so later calls can report it again.
#[derive(Debug, Clone)]
enum Terminal {
    Exhausted,
    Unavailable(String),
    Malformed(String),
}

/// Lazily produces validated, never-before-seen candidates for one term.
pub struct CandidateDiscovery<'a> {
    cursor: SearchCursor,
    start_page: u32,
    page: Option<Vec<ImageDescriptor>>,
    offset: usize,
    state: DiscoveryState,
    terminal: Option<Terminal>,
    finished: bool,
    search: &'a dyn SearchClient,
    fetcher: &'a dyn ContentFetcher,
    store: &'a dyn DuplicateStore,
}

impl<'a> CandidateDiscovery<'a> {
    /// Open a session for `term`.
    ///
    /// With `resume` set and a stored cursor for the term, the session starts
    /// on that page; otherwise on page 1. This is decided here, once.
    #[instrument(skip(search, fetcher, store))]
    pub fn start(
        term: &str,
        resume: bool,
        search: &'a dyn SearchClient,
        fetcher: &'a dyn ContentFetcher,
        store: &'a dyn DuplicateStore,
    ) -> Result<Self> {
        let stored = if resume { store.get_cursor(term)? } else { None };
        let cursor = match stored {
            Some(page_index) => SearchCursor::at(term, page_index),
            None => SearchCursor::first_page(term),
        };
        info!(page_index = cursor.page_index, resumed = stored.is_some(), "discovery session started");

        Ok(Self {
            start_page: cursor.page_index,
            cursor,
            page: None,
            offset: 0,
            state: DiscoveryState::Fetching,
            terminal: None,
            finished: false,
            search,
            fetcher,
            store,
        })
    }

    pub fn term(&self) -> &str {
        &self.cursor.term
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// The cursor as it should be persisted if the cycle succeeds.
    pub fn cursor(&self) -> &SearchCursor {
        &self.cursor
    }

    /// Pages fully consumed since the session started.
    pub fn pages_consumed(&self) -> u32 {
        self.cursor.page_index - self.start_page
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            term: self.cursor.term.clone(),
            page_index: self.cursor.page_index,
            offset: self.offset,
            state: self.state,
            pages_consumed: self.pages_consumed(),
        }
    }

    /// Return the next candidate that is not in the seen set and whose
    /// content checks out.
    ///
    /// Skips seen URLs, failed downloads, non-images and GIFs, fetching new
    /// pages as needed. A download that fails at the transport level is
    /// skipped like a failed status rather than ending the session; only page
    /// requests are fatal. Fails with `ProviderExhausted` when the provider
    /// sends a page with no items and with the provider's error when a page
    /// request fails; after either, every call fails the same way without
    /// touching the network.
    pub fn next_candidate(&mut self) -> Result<Candidate> {
        loop {
            if let Some(terminal) = &self.terminal {
                return Err(self.terminal_error(terminal));
            }

            let next = self
                .page
                .as_ref()
                .and_then(|items| items.get(self.offset))
                .cloned();
            let Some(descriptor) = next else {
                if self.page.take().is_some() {
                    self.offset = 0;
                    self.cursor.advance();
                    debug!(page_index = self.cursor.page_index, "page consumed, cursor advanced");
                }
                self.fetch_page()?;
                continue;
            };

            self.state = DiscoveryState::Filtering;
            let seen = self.store.contains(&descriptor.url)?;
            self.offset += 1;
            if seen {
                debug!(url = %descriptor.url, "already used, skipping");
                continue;
            }

            self.state = DiscoveryState::Validating;
            let content = match self.fetcher.fetch(&descriptor.url) {
                Ok(content) => content,
                Err(e) => {
                    warn!(url = %descriptor.url, error = %e, "download failed, skipping");
                    continue;
                }
            };
            if let Err(e) = validate_content(&descriptor.url, &content) {
                warn!(error = %e, "candidate rejected");
                continue;
            }

            self.state = DiscoveryState::Yielding;
            info!(
                url = %descriptor.url,
                page_index = self.cursor.page_index,
                "candidate found"
            );
            return Ok(Candidate {
                descriptor,
                content,
            });
        }
    }

    /// Request the page at the cursor and buffer it, or go terminal.
    #[instrument(skip(self), fields(term = %self.cursor.term, page_index = self.cursor.page_index))]
    fn fetch_page(&mut self) -> Result<()> {
        self.state = DiscoveryState::Fetching;
        match self.search.fetch_page(&self.cursor.term, self.cursor.page_index) {
            Ok(page) if page.is_exhausted() => {
                warn!("provider returned an empty page");
                self.go_terminal(Terminal::Exhausted);
                Err(self.terminal_error(&Terminal::Exhausted))
            }
            Ok(page) => {
                if page.is_empty() {
                    warn!(raw_len = page.raw_len, "no usable items on page, moving on");
                }
                debug!(items = page.items.len(), "page buffered");
                self.page = Some(page.items);
                self.offset = 0;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "page request failed, session ends");
                let terminal = match &e {
                    StegapixError::ProviderExhausted { .. } => Terminal::Exhausted,
                    StegapixError::MalformedResponse(detail) => Terminal::Malformed(detail.clone()),
                    other => Terminal::Unavailable(other.to_string()),
                };
                self.go_terminal(terminal);
                Err(e)
            }
        }
    }

    fn go_terminal(&mut self, terminal: Terminal) {
        self.state = DiscoveryState::Exhausted;
        self.terminal = Some(terminal);
    }

    fn terminal_error(&self, terminal: &Terminal) -> StegapixError {
        match terminal {
            Terminal::Exhausted => StegapixError::ProviderExhausted {
                term: self.cursor.term.clone(),
                page_index: self.cursor.page_index,
            },
            Terminal::Unavailable(detail) => StegapixError::ProviderUnavailable(detail.clone()),
            Terminal::Malformed(detail) => StegapixError::MalformedResponse(detail.clone()),
        }
    }
}

/// Yields candidates until the first error, reports that error once, then
/// ends.
impl Iterator for CandidateDiscovery<'_> {
    type Item = Result<Candidate>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_candidate();
        self.finished = result.is_err();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use stegapix_core::types::FetchedContent;
    use stegapix_store::SqliteStore;

    use super::*;
    use crate::client::SearchPage;

    /// Serves canned pages and records which pages were requested.
    #[derive(Default)]
    struct FakeSearch {
        pages: HashMap<u32, Vec<ImageDescriptor>>,
        failing_page: Option<u32>,
        /// Pages whose provider items were all unusable, by raw item count.
        unusable: HashMap<u32, usize>,
        requests: RefCell<Vec<u32>>,
    }

    impl FakeSearch {
        fn with_page(mut self, page_index: u32, urls: &[&str]) -> Self {
            let items = urls
                .iter()
                .map(|url| ImageDescriptor::new(*url, 64, 48))
                .collect();
            self.pages.insert(page_index, items);
            self
        }

        fn requested(&self) -> Vec<u32> {
            self.requests.borrow().clone()
        }
    }

    impl SearchClient for FakeSearch {
        fn fetch_page(&self, _term: &str, page_index: u32) -> Result<SearchPage> {
            self.requests.borrow_mut().push(page_index);
            if let Some(&raw_len) = self.unusable.get(&page_index) {
                return Ok(SearchPage {
                    items: Vec::new(),
                    raw_len,
                });
            }
            if self.failing_page == Some(page_index) {
                return Err(StegapixError::ProviderUnavailable(
                    "search returned status 500".into(),
                ));
            }
            Ok(SearchPage::new(
                self.pages.get(&page_index).cloned().unwrap_or_default(),
            ))
        }
    }

    /// Answers every URL with a JPEG unless told otherwise.
    #[derive(Default)]
    struct FakeFetcher {
        overrides: HashMap<String, FetchedContent>,
        unreachable: Vec<String>,
        fetched: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn respond(mut self, url: &str, status: u16, content_type: &str) -> Self {
            self.overrides.insert(
                url.to_owned(),
                FetchedContent {
                    status,
                    content_type: Some(content_type.to_owned()),
                    bytes: Vec::new(),
                },
            );
            self
        }

        fn unreachable(mut self, url: &str) -> Self {
            self.unreachable.push(url.to_owned());
            self
        }
    }

    impl ContentFetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<FetchedContent> {
            self.fetched.borrow_mut().push(url.to_owned());
            if self.unreachable.iter().any(|u| u == url) {
                return Err(StegapixError::ProviderUnavailable(format!("GET {url}: refused")));
            }
            Ok(self.overrides.get(url).cloned().unwrap_or(FetchedContent {
                status: 200,
                content_type: Some("image/jpeg".into()),
                bytes: url.as_bytes().to_vec(),
            }))
        }
    }

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("store")
    }

    #[test]
    fn cats_scenario_skips_seen_and_missing() {
        let search = FakeSearch::default()
            .with_page(1, &["cat1", "cat2", "cat3"])
            .with_page(2, &["cat4"]);
        let fetcher = FakeFetcher::default().respond("cat3", 404, "text/html");
        let store = store();
        store.mark_seen(&["cat2"]).unwrap();

        let mut discovery = CandidateDiscovery::start("cats", false, &search, &fetcher, &store).unwrap();

        let first = discovery.next_candidate().unwrap();
        assert_eq!(first.url(), "cat1");
        assert_eq!(search.requested(), vec![1]);
        assert_eq!(discovery.cursor().page_index, 1);

        let second = discovery.next_candidate().unwrap();
        assert_eq!(second.url(), "cat4");
        assert_eq!(search.requested(), vec![1, 2]);
        assert_eq!(discovery.cursor().page_index, 2);
        // The seen URL is never downloaded.
        assert!(!fetcher.fetched.borrow().iter().any(|u| u == "cat2"));
    }

    #[test]
    fn gif_is_never_yielded() {
        let search = FakeSearch::default()
            .with_page(1, &["a.gif", "b.jpg"])
            .with_page(2, &["c.gif"]);
        let fetcher = FakeFetcher::default()
            .respond("a.gif", 200, "image/gif")
            .respond("c.gif", 200, "IMAGE/GIF");
        let store = store();

        let urls: Vec<String> = CandidateDiscovery::start("t", false, &search, &fetcher, &store)
            .unwrap()
            .filter_map(|r| r.ok())
            .map(|c| c.descriptor.url)
            .collect();
        assert_eq!(urls, vec!["b.jpg".to_owned()]);
    }

    #[test]
    fn non_images_and_unreachable_urls_are_skipped() {
        let search = FakeSearch::default().with_page(1, &["page.html", "down", "ok.png"]);
        let fetcher = FakeFetcher::default()
            .respond("page.html", 200, "text/html; charset=utf-8")
            .unreachable("down");
        let store = store();

        let mut discovery = CandidateDiscovery::start("t", false, &search, &fetcher, &store).unwrap();
        assert_eq!(discovery.next_candidate().unwrap().url(), "ok.png");
    }

    #[test]
    fn seen_urls_are_never_yielded() {
        let search = FakeSearch::default()
            .with_page(1, &["u1", "u2", "u3"])
            .with_page(2, &["u2", "u4", "u1"])
            .with_page(3, &["u5"]);
        let fetcher = FakeFetcher::default();
        let store = store();
        store.mark_seen(&["u1", "u2", "u5"]).unwrap();

        let results: Vec<Result<Candidate>> =
            CandidateDiscovery::start("t", false, &search, &fetcher, &store)
                .unwrap()
                .collect();

        let urls: Vec<&str> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|c| c.url())
            .collect();
        assert_eq!(urls, vec!["u3", "u4"]);
        assert!(matches!(
            results.last(),
            Some(Err(StegapixError::ProviderExhausted { page_index: 4, .. }))
        ));
    }

    #[test]
    fn empty_page_is_terminal() {
        let search = FakeSearch::default();
        let fetcher = FakeFetcher::default();
        let store = store();

        let mut discovery = CandidateDiscovery::start("t", false, &search, &fetcher, &store).unwrap();
        assert!(matches!(
            discovery.next_candidate(),
            Err(StegapixError::ProviderExhausted { page_index: 1, .. })
        ));
        assert_eq!(discovery.state(), DiscoveryState::Exhausted);

        // Repeated calls report the same failure without new requests.
        assert!(discovery.next_candidate().is_err());
        assert_eq!(search.requested(), vec![1]);
    }

    #[test]
    fn provider_error_is_terminal() {
        let search = FakeSearch {
            failing_page: Some(2),
            ..FakeSearch::default().with_page(1, &["only"])
        };
        let fetcher = FakeFetcher::default();
        let store = store();

        let mut discovery = CandidateDiscovery::start("t", false, &search, &fetcher, &store).unwrap();
        assert_eq!(discovery.next_candidate().unwrap().url(), "only");
        assert!(matches!(
            discovery.next_candidate(),
            Err(StegapixError::ProviderUnavailable(_))
        ));
        assert!(matches!(
            discovery.next_candidate(),
            Err(StegapixError::ProviderUnavailable(_))
        ));
        assert_eq!(search.requested(), vec![1, 2]);
    }

    #[test]
    fn iterator_reports_terminal_error_once() {
        let search = FakeSearch::default().with_page(1, &["x"]);
        let fetcher = FakeFetcher::default();
        let store = store();

        let mut discovery = CandidateDiscovery::start("t", false, &search, &fetcher, &store).unwrap();
        assert!(matches!(discovery.next(), Some(Ok(_))));
        assert!(matches!(discovery.next(), Some(Err(_))));
        assert!(discovery.next().is_none());
    }

    #[test]
    fn cursor_counts_consumed_pages() {
        let search = FakeSearch::default()
            .with_page(3, &["s1", "s2"])
            .with_page(4, &["s3"])
            .with_page(5, &["s4", "s5"])
            .with_page(6, &["fresh"]);
        let fetcher = FakeFetcher::default();
        let store = store();
        store.set_cursor("t", 3).unwrap();
        store.mark_seen(&["s1", "s2", "s3", "s4", "s5"]).unwrap();

        let mut discovery = CandidateDiscovery::start("t", true, &search, &fetcher, &store).unwrap();
        assert_eq!(discovery.next_candidate().unwrap().url(), "fresh");
        assert_eq!(discovery.pages_consumed(), 3);
        assert_eq!(discovery.cursor().page_index, 3 + 3);

        // Persisting the staged cursor lets a resumed session start there.
        let cursor = discovery.cursor().clone();
        store.set_cursor(&cursor.term, cursor.page_index).unwrap();
        let resumed = CandidateDiscovery::start("t", true, &search, &fetcher, &store).unwrap();
        assert_eq!(resumed.cursor().page_index, 6);
    }

    #[test]
    fn resume_disabled_starts_at_page_one() {
        let search = FakeSearch::default().with_page(1, &["p1"]).with_page(9, &["p9"]);
        let fetcher = FakeFetcher::default();
        let store = store();
        store.set_cursor("t", 9).unwrap();

        let mut discovery = CandidateDiscovery::start("t", false, &search, &fetcher, &store).unwrap();
        assert_eq!(discovery.next_candidate().unwrap().url(), "p1");
        assert_eq!(search.requested(), vec![1]);
    }

    #[test]
    fn resume_without_stored_cursor_starts_at_page_one() {
        let search = FakeSearch::default().with_page(1, &["p1"]);
        let fetcher = FakeFetcher::default();
        let store = store();

        let discovery = CandidateDiscovery::start("new term", true, &search, &fetcher, &store).unwrap();
        assert_eq!(discovery.cursor().page_index, 1);
    }

    #[test]
    fn resume_is_decided_once_per_session() {
        let search = FakeSearch::default()
            .with_page(2, &["a", "b"])
            .with_page(3, &["c"]);
        let fetcher = FakeFetcher::default();
        let store = store();
        store.set_cursor("t", 2).unwrap();

        let mut discovery = CandidateDiscovery::start("t", true, &search, &fetcher, &store).unwrap();
        assert_eq!(discovery.next_candidate().unwrap().url(), "a");

        // A cursor written mid-session does not make the session jump.
        store.set_cursor("t", 50).unwrap();
        assert_eq!(discovery.next_candidate().unwrap().url(), "b");
        assert_eq!(discovery.next_candidate().unwrap().url(), "c");
        assert_eq!(search.requested(), vec![2, 3]);
    }

    #[test]
    fn snapshot_tracks_position() {
        let search = FakeSearch::default().with_page(1, &["a", "b", "c"]);
        let fetcher = FakeFetcher::default();
        let store = store();

        let mut discovery = CandidateDiscovery::start("t", false, &search, &fetcher, &store).unwrap();
        discovery.next_candidate().unwrap();
        let snapshot = discovery.snapshot();
        assert_eq!(
            snapshot,
            SessionSnapshot {
                term: "t".into(),
                page_index: 1,
                offset: 1,
                state: DiscoveryState::Yielding,
                pages_consumed: 0,
            }
        );
    }

    #[test]
    fn yielded_candidate_carries_fetched_body() {
        let search = FakeSearch::default().with_page(1, &["body"]);
        let fetcher = FakeFetcher::default();
        let store = store();

        let mut discovery = CandidateDiscovery::start("t", false, &search, &fetcher, &store).unwrap();
        let candidate = discovery.next_candidate().unwrap();
        assert_eq!(candidate.content.bytes, b"body".to_vec());
        assert_eq!(candidate.descriptor.width, 64);
    }

    #[test]
    fn page_of_unusable_items_moves_to_next_page() {
        let mut search = FakeSearch::default().with_page(2, &["usable"]);
        search.unusable.insert(1, 3);
        let fetcher = FakeFetcher::default();
        let store = store();

        let mut discovery = CandidateDiscovery::start("t", false, &search, &fetcher, &store).unwrap();
        assert_eq!(discovery.next_candidate().unwrap().url(), "usable");
        assert_eq!(search.requested(), vec![1, 2]);
        assert_eq!(discovery.pages_consumed(), 1);
    }

    /// A store whose every read fails.
    struct BrokenStore;

    impl DuplicateStore for BrokenStore {
        fn contains(&self, _url: &str) -> Result<bool> {
            Err(StegapixError::Database("disk I/O error".into()))
        }
        fn mark_seen(&self, _urls: &[&str]) -> Result<()> {
            Ok(())
        }
        fn get_cursor(&self, _term: &str) -> Result<Option<u32>> {
            Ok(None)
        }
        fn set_cursor(&self, _term: &str, _page_index: u32) -> Result<()> {
            Ok(())
        }
        fn commit_cycle(&self, _commit: &stegapix_store::CycleCommit) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn iterator_stops_after_store_error() {
        let search = FakeSearch::default().with_page(1, &["a", "b", "c"]);
        let fetcher = FakeFetcher::default();
        let store = BrokenStore;

        let results: Vec<Result<Candidate>> =
            CandidateDiscovery::start("t", false, &search, &fetcher, &store)
                .unwrap()
                .collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(StegapixError::Database(_))));
    }
}
