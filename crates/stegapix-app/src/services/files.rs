// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Offline embed and extract on image files.

use std::fs;
use std::path::Path;

use tracing::{info, instrument, warn};

use stegapix_core::error::Result;
use stegapix_image::{ImageProcessor, LsbCodec};

/// Hide `message` inside `veil` and write the result to `output` as PNG.
///
/// The veil is resized to the message's dimensions first. Returns the output
/// dimensions.
#[instrument(skip_all, fields(veil = %veil.display(), message = %message.display()))]
pub fn embed_files(veil: &Path, message: &Path, output: &Path, bits: u8) -> Result<(u32, u32)> {
    let codec = LsbCodec::new(bits)?;
    let message = ImageProcessor::open(message)?;
    let (width, height) = (message.width(), message.height());
    let veil = ImageProcessor::open(veil)?.resize_exact(width, height);

    let composed = codec.embed(&veil.to_rgb_grid(), &message.to_rgb_grid())?;
    write_png(ImageProcessor::from_grid(composed)?, output)?;
    info!(output = %output.display(), width, height, "message embedded");
    Ok((width, height))
}

/// Recover the hidden image from `input` and write it to `output` as PNG.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn extract_file(input: &Path, output: &Path, bits: u8) -> Result<(u32, u32)> {
    let codec = LsbCodec::new(bits)?;
    let steg = ImageProcessor::open(input)?;
    let recovered = codec.extract(&steg.to_grid())?;
    let image = ImageProcessor::from_grid(recovered)?;
    let dims = (image.width(), image.height());
    write_png(image, output)?;
    info!(output = %output.display(), "message extracted");
    Ok(dims)
}

fn write_png(image: ImageProcessor, output: &Path) -> Result<()> {
    let is_png = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if !is_png {
        warn!(output = %output.display(), "output is always PNG regardless of extension");
    }
    fs::write(output, image.to_png_bytes()?)?;
    Ok(())
}
