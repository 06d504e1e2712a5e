// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait definitions for getting a finished image out of the process.
//
// Remote publishing is two calls: host the bytes somewhere, then announce the
// hosted link. `HostAndAnnounce` glues any host to any announcer.

use tracing::{info, instrument};

use stegapix_core::error::{Result, StegapixError};

/// Anything that can take PNG bytes and make them public.
pub trait Publisher {
    /// Publish the image and return an identifier for the published artifact.
    fn publish(&self, image_bytes: &[u8]) -> Result<String>;
}

/// An image that now lives somewhere addressable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    pub id: String,
    pub link: String,
}

/// Stores image bytes and hands back where they went.
pub trait ImageHost {
    fn host(&self, image_bytes: &[u8]) -> Result<HostedImage>;
}

/// Tells the world about a hosted image.
pub trait Announcer {
    fn announce(&self, image: &HostedImage) -> Result<()>;
}

/// Host first, announce second.
///
/// The artifact id is the host's id. A failure in either step is reported as
/// `PublishFailure`; if announcing fails the image stays hosted.
pub struct HostAndAnnounce<H, A> {
    host: H,
    announcer: A,
}

impl<H: ImageHost, A: Announcer> HostAndAnnounce<H, A> {
    pub fn new(host: H, announcer: A) -> Self {
        Self { host, announcer }
    }
}

impl<H: ImageHost, A: Announcer> Publisher for HostAndAnnounce<H, A> {
    #[instrument(skip_all, fields(len = image_bytes.len()))]
    fn publish(&self, image_bytes: &[u8]) -> Result<String> {
        let hosted = self.host.host(image_bytes).map_err(as_publish_failure)?;
        info!(id = %hosted.id, link = %hosted.link, "image hosted");

        self.announcer
            .announce(&hosted)
            .map_err(as_publish_failure)?;
        info!(id = %hosted.id, "image announced");

        Ok(hosted.id)
    }
}

/// Boxed publishers publish like the thing they box.
impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&self, image_bytes: &[u8]) -> Result<String> {
        (**self).publish(image_bytes)
    }
}

/// Boxed announcers too, so the announcer can be chosen at runtime.
impl<A: Announcer + ?Sized> Announcer for Box<A> {
    fn announce(&self, image: &HostedImage) -> Result<()> {
        (**self).announce(image)
    }
}

fn as_publish_failure(err: StegapixError) -> StegapixError {
    match err {
        StegapixError::PublishFailure(_) => err,
        other => StegapixError::PublishFailure(other.to_string()),
    }
}
