// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// stegapix-image — Pixel-level work for Stegapix.
//
// Provides the interleaved pixel grid, the least-significant-bit codec that
// hides one grid inside another, and an image processor for decoding,
// exact-size resampling, and lossless PNG output.

pub mod codec;
pub mod grid;
pub mod image;

// Re-export the primary structs so callers can use `stegapix_image::LsbCodec` etc.
pub use self::codec::lsb::LsbCodec;
pub use self::grid::PixelGrid;
pub use self::image::processor::ImageProcessor;
