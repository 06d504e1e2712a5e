// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode downloaded bytes, resample the veil to the
// message's exact size, and write lossless PNG output. Operates on in-memory
// images using the `image` crate.

use ::image::{DynamicImage, ImageFormat};
use stegapix_core::error::{Result, StegapixError};
use tracing::{debug, info, instrument};

use crate::grid::PixelGrid;

/// Image pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so calls
/// chain:
///
/// ```ignore
/// let veil = ImageProcessor::from_bytes(&bytes)?
///     .resize_exact(message.width(), message.height())
///     .to_rgb_grid();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = ::image::open(path.as_ref()).map_err(|err| {
            StegapixError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, WebP, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = ::image::load_from_memory(data).map_err(|err| {
            StegapixError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Wrap a pixel grid.
    pub fn from_grid(grid: PixelGrid) -> Result<Self> {
        Ok(Self {
            image: grid.into_dynamic()?,
        })
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// The pixels as a three-channel grid, dropping any alpha.
    pub fn to_rgb_grid(&self) -> PixelGrid {
        PixelGrid::from_rgb(self.image.to_rgb8())
    }

    /// The pixels as a grid, keeping alpha when the image has it.
    pub fn to_grid(&self) -> PixelGrid {
        PixelGrid::from_dynamic(&self.image)
    }

    // -- Transformations ------------------------------------------------------

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    /// Uses Lanczos3 filtering.
    #[instrument(skip(self), fields(width, height))]
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            width,
            height,
            "Resizing image"
        );
        let resized =
            self.image
                .resize_exact(width, height, ::image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    ///
    /// PNG is lossless, so embedded low bits survive the encode.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            StegapixError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| StegapixError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
