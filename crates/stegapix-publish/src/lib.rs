// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Stegapix publishing backends.
//!
//! A finished PNG leaves the process through a [`Publisher`]. The stock
//! publishers either write into a local directory or host the image remotely
//! and then announce the hosted link.

pub mod imgur;
pub mod local;
pub mod traits;
pub mod webhook;

pub use imgur::ImgurHost;
pub use local::{DirectoryPublisher, LogAnnouncer};
pub use traits::{Announcer, HostAndAnnounce, HostedImage, ImageHost, Publisher};
pub use webhook::WebhookAnnouncer;
