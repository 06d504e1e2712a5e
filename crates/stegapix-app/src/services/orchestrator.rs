// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One publishing cycle, end to end:
//
//   message term ─▶ discovery ─▶ decode ─────────────────┐
//   veil term    ─▶ discovery ─▶ decode ─▶ resize ───────┤
//                                                        ▼
//                                   embed ─▶ PNG ─▶ publish ─▶ commit
//
// Nothing is written to the store until the publisher has accepted the image.
// Downloads and the composed PNG live in a per-cycle temporary directory that
// is removed however the cycle ends.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, error, info, info_span, instrument, warn};

use stegapix_core::AppConfig;
use stegapix_core::error::{Result, StegapixError};
use stegapix_core::types::{Candidate, CycleId, ImageRole, PublishedArtifact};
use stegapix_image::{ImageProcessor, LsbCodec};
use stegapix_publish::Publisher;
use stegapix_search::{CandidateDiscovery, ContentFetcher, SearchClient};
use stegapix_store::{CycleCommit, DuplicateStore, hash_bytes};

/// Drives discovery, embedding, publishing and persistence for one cycle at
/// a time.
pub struct Orchestrator<S, F, D, P> {
    search: S,
    fetcher: F,
    store: D,
    publisher: P,
    codec: LsbCodec,
    resume: bool,
    message_term: String,
    veil_term: String,
    work_dir: PathBuf,
}

impl<S, F, D, P> Orchestrator<S, F, D, P>
where
    S: SearchClient,
    F: ContentFetcher,
    D: DuplicateStore,
    P: Publisher,
{
    /// Build an orchestrator from validated settings.
    ///
    /// `work_dir` must exist; each cycle creates and removes its own
    /// subdirectory inside it.
    pub fn new(
        config: &AppConfig,
        work_dir: impl Into<PathBuf>,
        search: S,
        fetcher: F,
        store: D,
        publisher: P,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            search,
            fetcher,
            store,
            publisher,
            codec: LsbCodec::new(config.lsb_bits)?,
            resume: config.resume_from_last_index,
            message_term: config.message_search_term.clone(),
            veil_term: config.veil_search_term.clone(),
            work_dir: work_dir.into(),
        })
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Run a cycle with the configured search terms.
    pub fn run_one_publishing_cycle(&self) -> Result<PublishedArtifact> {
        self.run_cycle(&self.message_term, &self.veil_term)
    }

    /// Find a message and a veil, hide one in the other, publish the result,
    /// and record what was used.
    ///
    /// Any failure before the final commit leaves the store as it was, so the
    /// same candidates can be found again by a later cycle.
    pub fn run_cycle(&self, message_term: &str, veil_term: &str) -> Result<PublishedArtifact> {
        let cycle_id = CycleId::new();
        let span = info_span!("cycle", cycle_id = %cycle_id);
        let _guard = span.enter();
        info!(message_term, veil_term, "publishing cycle started");

        let work = tempfile::Builder::new()
            .prefix("cycle-")
            .tempdir_in(&self.work_dir)?;

        let mut message_session = CandidateDiscovery::start(
            message_term,
            self.resume,
            &self.search,
            &self.fetcher,
            &self.store,
        )?;
        let (message, message_image) =
            acquire(&mut message_session, ImageRole::Message, work.path())?;

        let mut veil_session = CandidateDiscovery::start(
            veil_term,
            self.resume,
            &self.search,
            &self.fetcher,
            &self.store,
        )?;
        let (veil, veil_image) = acquire(&mut veil_session, ImageRole::Veil, work.path())?;

        let (width, height) = (message_image.width(), message_image.height());
        let veil_image = veil_image.resize_exact(width, height);

        let composed = self
            .codec
            .embed(&veil_image.to_rgb_grid(), &message_image.to_rgb_grid())?;
        let png = ImageProcessor::from_grid(composed)?.to_png_bytes()?;
        fs::write(work.path().join("composed.png"), &png)?;
        debug!(width, height, len = png.len(), "composed image encoded");

        let artifact_id = self.publisher.publish(&png).inspect_err(|e| {
            error!(error = %e, "publish failed, nothing recorded");
        })?;

        let artifact = PublishedArtifact {
            cycle_id,
            artifact_id,
            message_url: message.descriptor.url.clone(),
            veil_url: veil.descriptor.url.clone(),
            sha256: hash_bytes(&png),
            width,
            height,
            published_at: Utc::now(),
        };
        let commit = CycleCommit {
            seen_urls: vec![artifact.message_url.clone(), artifact.veil_url.clone()],
            cursors: vec![message_session.cursor().clone(), veil_session.cursor().clone()],
            artifact: Some(artifact.clone()),
        };
        self.store.commit_cycle(&commit).inspect_err(|e| {
            error!(
                error = %e,
                artifact_id = %artifact.artifact_id,
                "image was published but could not be recorded"
            );
        })?;

        work.close()?;
        info!(artifact_id = %artifact.artifact_id, "publishing cycle complete");
        Ok(artifact)
    }
}

/// Pull candidates until one decodes. The body is kept in the work directory
/// while the cycle runs.
#[instrument(skip(session, work_dir), fields(term = %session.term()))]
fn acquire(
    session: &mut CandidateDiscovery<'_>,
    role: ImageRole,
    work_dir: &Path,
) -> Result<(Candidate, ImageProcessor)> {
    loop {
        let candidate = session.next_candidate()?;
        let path = work_dir.join(format!("{role}.{}", candidate.content.extension()));
        fs::write(&path, &candidate.content.bytes)?;

        match ImageProcessor::from_bytes(&candidate.content.bytes) {
            Ok(image) => {
                info!(
                    url = %candidate.url(),
                    width = image.width(),
                    height = image.height(),
                    "candidate decoded"
                );
                return Ok((candidate, image));
            }
            Err(e) => {
                let skipped = StegapixError::InvalidContent {
                    url: candidate.url().to_owned(),
                    reason: e.to_string(),
                };
                warn!(error = %skipped, "candidate does not decode, skipping");
            }
        }
    }
}
