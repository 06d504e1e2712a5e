// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local publishing for offline runs and tests.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use stegapix_core::error::Result;
use stegapix_store::hash_bytes;

use crate::traits::{Announcer, HostedImage, Publisher};

/// Writes each image to `<dir>/<sha256>.png`. The artifact id is the digest.
pub struct DirectoryPublisher {
    dir: PathBuf,
}

impl DirectoryPublisher {
    /// Create the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Publisher for DirectoryPublisher {
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    fn publish(&self, image_bytes: &[u8]) -> Result<String> {
        let digest = hash_bytes(image_bytes);
        let path = self.dir.join(format!("{digest}.png"));
        fs::write(&path, image_bytes)?;
        info!(path = %path.display(), "image written");
        Ok(digest)
    }
}

/// Announces into the log and nowhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, image: &HostedImage) -> Result<()> {
        info!(id = %image.id, link = %image.link, "new image published");
        Ok(())
    }
}
