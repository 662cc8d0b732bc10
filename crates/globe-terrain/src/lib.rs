//! Async terrain provider that builds globe tile geometry from an elevation
//! image service.
//!
//! This crate fetches elevation rasters from an `ImageServer` endpoint,
//! unpacks them into height grids and tessellates them into meshes on the
//! WGS84 ellipsoid, one tile of a geographic tiling scheme at a time.
//!
//! # Design principles
//!
//! - **Runtime-agnostic**: Returns `impl Future`, works with any executor
//! - **Sync decoding**: Decode and tessellation are synchronous; the client
//!   decides where they run (see [`Provider::build_tile_mesh`])
//! - **Single assignment**: A tile's mesh is published at most once, so
//!   overlapping requests never mix geometry
//!
//! # Example
//!
//! ```ignore
//! use globe_terrain::{Provider, ProviderOptions, TileKey, TileSet};
//!
//! let provider = Provider::new(
//!     ProviderOptions::new("https://example.com/arcgis/rest/services/Elevation/ImageServer")
//!         .with_token("secret"),
//! )?;
//!
//! let mut tiles = TileSet::new();
//! let tile = tiles
//!     .get_or_create(provider.tiling_scheme(), TileKey::new(0, 0, 0))
//!     .unwrap();
//! provider.populate_tile_geometry(&tile).await?;
//!
//! // Draw the tile, or its nearest ready ancestor.
//! if let Some(drawable) = tiles.fallback_for(TileKey::new(1, 0, 0)) {
//!     let mesh = drawable.mesh().unwrap();
//! }
//! ```

pub mod config;
mod error;
pub mod lod;
pub mod metadata;
mod provider;
pub mod raster;
pub mod tile;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::{Endpoint, PrefixProxy, ProviderOptions, Proxy};
pub use error::{Error, ErrorKind, Result};
pub use lod::LodMetrics;
pub use metadata::{Attribution, ServiceMetadata};
pub use provider::{Projection, Provider, ProviderStatus};
pub use raster::RasterSource;
pub use tile::{RequestTicket, Tile, TileSet, TileState};
pub use transport::{FetchFuture, HttpTransport, Transport};

// Re-export decode types for convenience.
pub use globe_terrain_decode::{
    Ellipsoid, Extent, HeightmapLayout, MeshOptions, RasterImage, RasterSize, TileKey, TileMesh,
    TilingScheme, VertexData,
};
