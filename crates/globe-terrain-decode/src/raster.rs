//! Raster image decoding.
//!
//! Elevation services return their rasters as encoded images (TIFF from an
//! `exportImage` endpoint, PNG from most tile caches). This module decodes
//! them into a flat RGBA pixel buffer that [`crate::decode_heightmap`] can
//! read with a 4-byte stride.

use crate::error::{DecodeError, DecodeResult};

/// Bytes per pixel of a decoded [`RasterImage`].
pub const RGBA_STRIDE: usize = 4;

/// Pixel dimensions of a requested raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

impl RasterSize {
    /// The fixed 256x256 raster fetched for every tile.
    pub const DEFAULT: Self = Self::new(256, 256);

    /// Create a raster size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for RasterSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A decoded raster with RGBA pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// RGBA pixel data (4 bytes per pixel), rows from north to south.
    pub pixels: Vec<u8>,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

impl RasterImage {
    /// Create a raster from RGBA pixel data.
    #[must_use]
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Check if the pixel buffer size matches the dimensions.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == (self.width as usize) * (self.height as usize) * RGBA_STRIDE
    }

    /// Pixel dimensions.
    #[must_use]
    pub fn size(&self) -> RasterSize {
        RasterSize::new(self.width, self.height)
    }
}

/// Decode an encoded image (TIFF or PNG) into RGBA pixels.
///
/// # Errors
///
/// Returns an error if the data is not a recognizable, well-formed image.
pub fn decode_raster(data: &[u8]) -> DecodeResult<RasterImage> {
    let image = image::load_from_memory(data).map_err(|e| DecodeError::InvalidFormat {
        context: "raster",
        detail: e.to_string(),
    })?;

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(RasterImage::new(rgba.into_raw(), width, height))
}
