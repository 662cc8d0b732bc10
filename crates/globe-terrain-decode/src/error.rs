//! Error types for decoding and tessellation.

use std::fmt;

/// Errors that can occur while decoding raster or heightmap data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Pixel buffer length disagrees with the declared dimensions.
    BufferSizeMismatch { expected: usize, actual: usize },
    /// The sample packing description cannot be applied.
    InvalidLayout { detail: String },
    /// Invalid data format or structure.
    InvalidFormat {
        context: &'static str,
        detail: String,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "pixel buffer size mismatch: expected {expected} bytes, got {actual}"
                )
            }
            Self::InvalidLayout { detail } => write!(f, "invalid heightmap layout: {detail}"),
            Self::InvalidFormat { context, detail } => {
                write!(f, "invalid format in {context}: {detail}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while tessellating a sample grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TessellationError {
    /// The grid cannot form a single triangle.
    DegenerateGrid { width: u32, height: u32 },
    /// The grid's sample count disagrees with its dimensions.
    SampleCountMismatch { expected: usize, actual: usize },
    /// More vertices than a `u32` index buffer can address.
    TooManyVertices { count: usize },
}

impl fmt::Display for TessellationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateGrid { width, height } => {
                write!(
                    f,
                    "sample grid of {width}x{height} needs at least 2 rows and 2 columns"
                )
            }
            Self::SampleCountMismatch { expected, actual } => {
                write!(f, "sample grid holds {actual} samples, expected {expected}")
            }
            Self::TooManyVertices { count } => {
                write!(f, "{count} vertices cannot be addressed by u32 indices")
            }
        }
    }
}

impl std::error::Error for TessellationError {}
