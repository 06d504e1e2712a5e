// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel grid — an interleaved RGB or RGBA byte buffer with its dimensions.

use ::image::{DynamicImage, RgbImage, RgbaImage};
use stegapix_core::error::{Result, StegapixError};

/// Interleaved 8-bit pixels in row-major order.
///
/// `data.len()` is always `width * height * channels`, and `channels` is 3
/// (RGB) or 4 (RGBA).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Build a grid from raw interleaved bytes, checking the length invariant.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(StegapixError::InvalidConfiguration(format!(
                "pixel grids hold 3 or 4 channels, got {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(StegapixError::ImageError(format!(
                "{width}x{height}x{channels} grid needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A grid with every channel of every pixel set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Result<Self> {
        let len = width as usize * height as usize * channels as usize;
        Self::new(width, height, channels, vec![value; len])
    }

    /// Take the pixels of a decoded image, keeping alpha when it has one.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        if image.color().has_alpha() {
            Self::from_rgba(image.to_rgba8())
        } else {
            Self::from_rgb(image.to_rgb8())
        }
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 3,
            data: image.into_raw(),
        }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 4,
            data: image.into_raw(),
        }
    }

    /// Convert back into a `DynamicImage` of the matching colour type.
    pub fn into_dynamic(self) -> Result<DynamicImage> {
        let (width, height) = (self.width, self.height);
        let image = match self.channels {
            3 => RgbImage::from_raw(width, height, self.data).map(DynamicImage::ImageRgb8),
            _ => RgbaImage::from_raw(width, height, self.data).map(DynamicImage::ImageRgba8),
        };
        image.ok_or_else(|| {
            StegapixError::ImageError(format!("pixel buffer does not fit {width}x{height}"))
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn same_dimensions(&self, other: &PixelGrid) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Raw interleaved bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Channels of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let stride = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * stride;
        self.data.get(start..start + stride)
    }

    /// Iterate over pixels in row-major order.
    pub fn pixels(&self) -> std::slice::Chunks<'_, u8> {
        self.data.chunks(self.channels as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let result = PixelGrid::new(2, 2, 3, vec![0; 11]);
        assert!(matches!(result, Err(StegapixError::ImageError(_))));
    }

    #[test]
    fn rejects_unsupported_channel_count() {
        let result = PixelGrid::new(1, 1, 2, vec![0; 2]);
        assert!(matches!(result, Err(StegapixError::InvalidConfiguration(_))));
    }

    #[test]
    fn pixel_lookup_is_row_major() {
        let data: Vec<u8> = (0..12).collect();
        let grid = PixelGrid::new(2, 2, 3, data).expect("grid");
        assert_eq!(grid.pixel(0, 0), Some(&[0u8, 1, 2][..]));
        assert_eq!(grid.pixel(1, 0), Some(&[3u8, 4, 5][..]));
        assert_eq!(grid.pixel(0, 1), Some(&[6u8, 7, 8][..]));
        assert_eq!(grid.pixel(2, 0), None);
        assert_eq!(grid.pixels().count(), grid.pixel_count());
    }

    #[test]
    fn dynamic_conversion_keeps_alpha() {
        let rgba = RgbaImage::from_pixel(3, 2, ::image::Rgba([10, 20, 30, 40]));
        let grid = PixelGrid::from_dynamic(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(grid.channels(), 4);
        assert_eq!(grid.pixel(2, 1), Some(&[10u8, 20, 30, 40][..]));

        let back = grid.into_dynamic().expect("into dynamic");
        assert!(back.color().has_alpha());
        assert_eq!((back.width(), back.height()), (3, 2));
    }

    #[test]
    fn rgb_image_becomes_three_channels() {
        let rgb = RgbImage::from_pixel(4, 4, ::image::Rgb([1, 2, 3]));
        let grid = PixelGrid::from_dynamic(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(grid.channels(), 3);
        assert_eq!(grid.as_bytes().len(), 48);
    }
}
