// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Least-significant-bit codec.
//
// Embedding scales each 8-bit message channel down to `bits` bits and writes
// it into the low bits of the matching veil channel:
//
//   mask    = (1 << bits) - 1
//   payload = floor(message * mask / 255)
//   steg    = (veil & !mask) | payload
//
// Extraction scales the low bits back up:
//
//   message ~= floor(255 * (steg & mask) / mask)
//
// The downscale is lossy. A round trip is only accurate to within
// ceil(255 / mask) per channel.

use stegapix_core::config::validate_lsb_bits;
use stegapix_core::error::{Result, StegapixError};
use tracing::{debug, instrument};

use crate::grid::PixelGrid;

/// Full-scale value of an 8-bit channel.
const CHANNEL_MAX: u32 = 255;

/// Embeds and extracts image data in the low bits of pixel channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LsbCodec {
    bits: u8,
}

impl Default for LsbCodec {
    fn default() -> Self {
        Self {
            bits: stegapix_core::config::DEFAULT_LSB_BITS,
        }
    }
}

impl LsbCodec {
    /// Create a codec using `bits` low bits per channel (1..=7).
    pub fn new(bits: u8) -> Result<Self> {
        validate_lsb_bits(bits)?;
        Ok(Self { bits })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Bit mask covering the payload bits.
    pub fn mask(&self) -> u8 {
        mask_for(self.bits)
    }

    /// Largest per-channel error a round trip can introduce.
    ///
    /// This is `ceil(255 / mask)`. Both scalings floor, so when the mask does
    /// not divide 255 (3, 5, 6 and 7 bits) the error can exceed `255 / mask`
    /// by a fraction and lands on the next integer.
    pub fn tolerance(&self) -> u8 {
        let mask = u32::from(self.mask());
        CHANNEL_MAX.div_ceil(mask) as u8
    }

    /// Hide `message` in the low bits of `veil`.
    ///
    /// Both grids must have the same width and height, and the veil must have
    /// at least as many channels as the message. Channels the message lacks
    /// (an RGBA veil carrying an RGB message) are copied from the veil as-is.
    #[instrument(skip_all, fields(bits = self.bits, width = veil.width(), height = veil.height()))]
    pub fn embed(&self, veil: &PixelGrid, message: &PixelGrid) -> Result<PixelGrid> {
        if !veil.same_dimensions(message) {
            return Err(StegapixError::DimensionMismatch {
                veil_width: veil.width(),
                veil_height: veil.height(),
                message_width: message.width(),
                message_height: message.height(),
            });
        }
        if veil.channels() < message.channels() {
            return Err(StegapixError::InvalidConfiguration(format!(
                "veil has {} channels but the message has {}",
                veil.channels(),
                message.channels()
            )));
        }

        let message_channels = message.channels() as usize;
        let mut data = Vec::with_capacity(veil.as_bytes().len());
        for (veil_px, message_px) in veil.pixels().zip(message.pixels()) {
            for (c, &veil_value) in veil_px.iter().enumerate() {
                if c < message_channels {
                    data.push(embed_channel(veil_value, message_px[c], self.bits));
                } else {
                    data.push(veil_value);
                }
            }
        }

        debug!(pixels = veil.pixel_count(), "message embedded");
        PixelGrid::new(veil.width(), veil.height(), veil.channels(), data)
    }

    /// Recover the hidden image from the low bits of every channel.
    #[instrument(skip_all, fields(bits = self.bits, width = steg.width(), height = steg.height()))]
    pub fn extract(&self, steg: &PixelGrid) -> Result<PixelGrid> {
        let data = steg
            .as_bytes()
            .iter()
            .map(|&value| extract_channel(value, self.bits))
            .collect();

        debug!(pixels = steg.pixel_count(), "message extracted");
        PixelGrid::new(steg.width(), steg.height(), steg.channels(), data)
    }
}

fn mask_for(bits: u8) -> u8 {
    ((1u16 << bits) - 1) as u8
}

/// Write the downscaled `message` value into the low `bits` bits of `veil`.
///
/// `bits` must already be validated to lie in 1..=7.
pub fn embed_channel(veil: u8, message: u8, bits: u8) -> u8 {
    let mask = mask_for(bits);
    let payload = (u32::from(message) * u32::from(mask) / CHANNEL_MAX) as u8;
    (veil & !mask) | payload
}

/// Scale the low `bits` bits of `steg` back up to the 0..=255 range.
///
/// `bits` must already be validated to lie in 1..=7.
pub fn extract_channel(steg: u8, bits: u8) -> u8 {
    let mask = mask_for(bits);
    (CHANNEL_MAX * u32::from(steg & mask) / u32::from(mask)) as u8
}
