// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! stegapix-store — What Stegapix has already used.
//!
//! A SQLite-backed record of every image URL that went into a published
//! artifact, the last search page reached for each term, and a log of the
//! artifacts themselves. The end-of-cycle writes are applied as one
//! transaction so a crash can never leave them half done.

pub mod integrity;
pub mod store;

// PUBLIC API: Re-export the store and its seam
pub use integrity::hash_bytes;
pub use store::{CycleCommit, DuplicateStore, SqliteStore};
