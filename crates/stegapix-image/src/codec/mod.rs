// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Codec module — least-significant-bit embedding and extraction.

pub mod lsb;

pub use lsb::{LsbCodec, embed_channel, extract_channel};
