//! Decode elevation rasters and tessellate them into globe tile meshes.
//!
//! This crate provides pure synchronous functions for turning the pixels of
//! an elevation raster into a triangulated tile mesh on an ellipsoid. All
//! functions are designed to be called from any threading context - the
//! library user controls parallelism.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **User-controlled parallelism**: Client decides where decoding runs
//! - **Web-compatible**: Compiles to WASM
//!
//! # Key functions
//!
//! - [`decode_raster`]: Decode a TIFF/PNG raster into RGBA pixels
//! - [`decode_heightmap`]: Unpack height-encoded pixels into a [`SampleGrid`]
//! - [`tessellate`]: Build a relative-to-center [`TileMesh`] from a grid
//! - [`desired_resolution`]: Angular tessellation target for a level

mod error;

pub mod ellipsoid;
pub mod extent;
pub mod heightmap;
pub mod mesh;
pub mod raster;
pub mod tiling;

pub use ellipsoid::Ellipsoid;
pub use error::{DecodeError, DecodeResult, TessellationError};
pub use extent::Extent;
pub use heightmap::{Endianness, HeightmapLayout, SampleGrid, decode_heightmap};
pub use mesh::{MeshOptions, TileMesh, VertexData, VertexLayout, tessellate};
pub use raster::{RasterImage, RasterSize, decode_raster};
pub use tiling::{GeographicTilingScheme, TileKey, TilingScheme, desired_resolution};
