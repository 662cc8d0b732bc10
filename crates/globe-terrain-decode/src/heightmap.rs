//! Heightmap decoding.
//!
//! Elevation rasters pack each height into the color channels of a pixel.
//! The first `bytes_per_sample` bytes of every `stride_bytes`-wide pixel are
//! combined into an unsigned integer, digit by digit in base
//! `element_multiplier`, and mapped to meters via
//! `offset + scale * packed`.

use crate::error::{DecodeError, DecodeResult};

/// Byte order of the packed sample bytes within a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    /// The first byte is the most significant digit.
    #[default]
    Big,
    /// The first byte is the least significant digit.
    Little,
}

/// Description of how heights are packed into raster pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightmapLayout {
    /// Bytes that make up one height (1-4).
    pub bytes_per_sample: usize,
    /// Bytes between the starts of consecutive pixels.
    pub stride_bytes: usize,
    /// Byte order of the packed digits.
    pub endianness: Endianness,
    /// Base of each packed digit (256 for full bytes).
    pub element_multiplier: f64,
    /// Meters per packed unit.
    pub scale: f64,
    /// Meters added after scaling.
    pub offset: f64,
}

impl HeightmapLayout {
    /// Packing used by ArcGIS ImageServer elevation exports: a 24-bit
    /// big-endian value in RGB, in millimeters offset by -1000 m.
    pub const ARCGIS: Self = Self {
        bytes_per_sample: 3,
        stride_bytes: 4,
        endianness: Endianness::Big,
        element_multiplier: 256.0,
        scale: 0.001,
        offset: -1000.0,
    };

    /// Same layout with a different scale and offset.
    #[must_use]
    pub fn with_scale_and_offset(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    /// Check that the layout can unpack finite heights.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidLayout`] naming the offending field.
    pub fn validate(&self) -> DecodeResult<()> {
        if !(1..=4).contains(&self.bytes_per_sample) {
            return Err(DecodeError::InvalidLayout {
                detail: format!("{} bytes per sample, expected 1-4", self.bytes_per_sample),
            });
        }
        if self.stride_bytes < self.bytes_per_sample {
            return Err(DecodeError::InvalidLayout {
                detail: format!(
                    "stride of {} bytes is smaller than a {}-byte sample",
                    self.stride_bytes, self.bytes_per_sample
                ),
            });
        }
        if !(self.element_multiplier.is_finite() && self.element_multiplier > 0.0) {
            return Err(DecodeError::InvalidLayout {
                detail: format!(
                    "element multiplier {} must be positive and finite",
                    self.element_multiplier
                ),
            });
        }
        if !(self.scale.is_finite() && self.offset.is_finite()) {
            return Err(DecodeError::InvalidLayout {
                detail: format!(
                    "scale {} and offset {} must be finite",
                    self.scale, self.offset
                ),
            });
        }
        Ok(())
    }

    fn unpack(&self, sample: &[u8]) -> f64 {
        let digits = sample.iter().map(|&b| f64::from(b));
        let packed = match self.endianness {
            Endianness::Big => digits.fold(0.0, |acc, d| acc * self.element_multiplier + d),
            Endianness::Little => digits
                .rev()
                .fold(0.0, |acc, d| acc * self.element_multiplier + d),
        };
        self.offset + self.scale * packed
    }
}

impl Default for HeightmapLayout {
    fn default() -> Self {
        Self::ARCGIS
    }
}

/// A row-major grid of elevations in meters.
///
/// Row 0 is the northern edge of the tile, column 0 the western edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Elevations, `width * height` of them.
    pub heights: Vec<f64>,
}

impl SampleGrid {
    /// Create a grid from row-major heights.
    #[must_use]
    pub fn new(width: u32, height: u32, heights: Vec<f64>) -> Self {
        Self {
            width,
            height,
            heights,
        }
    }

    /// Elevation at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.heights
            .get(row as usize * self.width as usize + col as usize)
            .copied()
    }

    /// Smallest and largest elevation, or `None` for an empty grid.
    #[must_use]
    pub fn height_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.heights.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), h| (lo.min(h), hi.max(h))))
    }
}

/// Unpack height-encoded pixels into a [`SampleGrid`].
///
/// `pixels` must hold exactly `width * height * layout.stride_bytes` bytes.
///
/// # Errors
///
/// Returns an error if the layout is invalid, the dimensions are zero, or
/// the buffer length disagrees with the declared dimensions.
pub fn decode_heightmap(
    pixels: &[u8],
    width: u32,
    height: u32,
    layout: &HeightmapLayout,
) -> DecodeResult<SampleGrid> {
    layout.validate()?;

    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidLayout {
            detail: format!("empty {width}x{height} raster"),
        });
    }

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(layout.stride_bytes))
        .ok_or_else(|| DecodeError::InvalidLayout {
            detail: format!("{width}x{height} raster overflows the address space"),
        })?;

    if pixels.len() != expected {
        return Err(DecodeError::BufferSizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }

    let heights = pixels
        .chunks_exact(layout.stride_bytes)
        .map(|pixel| layout.unpack(&pixel[..layout.bytes_per_sample]))
        .collect();

    Ok(SampleGrid::new(width, height, heights))
}
