//! Terrain provider.
//!
//! The provider owns the tiling scheme and the raster source, and drives
//! each tile through fetch, decode, tessellate and publish.

use std::sync::OnceLock;

use globe_terrain_decode::raster::RGBA_STRIDE;
use globe_terrain_decode::{
    Ellipsoid, Extent, GeographicTilingScheme, HeightmapLayout, MeshOptions, RasterImage,
    RasterSize, SampleGrid, TileKey, TileMesh, TilingScheme, decode_heightmap,
    desired_resolution, tessellate,
};

use crate::config::ProviderOptions;
use crate::error::{Error, Result};
use crate::metadata::{Attribution, ServiceMetadata};
use crate::raster::RasterSource;
use crate::tile::{RequestTicket, Tile, TileState};
use crate::transport::{HttpTransport, Transport};

/// Map projection a tile's geometry is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    /// Longitude/latitude on the ellipsoid.
    #[default]
    Geographic,
    /// Spherical Web Mercator.
    WebMercator,
}

/// Initialization status of a [`Provider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Constructed; service metadata not yet loaded.
    Created,
    /// Service metadata loaded and attribution available.
    Initialized,
}

/// Builds globe tile geometry from an elevation image service.
///
/// Tile requests do not depend on [`Provider::initialize`]; they can be
/// issued straight after construction.
///
/// # Example
///
/// ```ignore
/// use globe_terrain::{Provider, ProviderOptions, TileKey};
///
/// let provider = Provider::new(ProviderOptions::new(
///     "https://elevation.arcgis.com/arcgis/rest/services/WorldElevation/Terrain/ImageServer",
/// ))?;
///
/// let tile = provider.create_tile(TileKey::new(0, 0, 0)).unwrap();
/// provider.populate_tile_geometry(&tile).await?;
/// assert!(tile.is_ready());
/// ```
#[derive(Debug)]
pub struct Provider<T: Transport = HttpTransport> {
    source: RasterSource<T>,
    scheme: GeographicTilingScheme,
    projection: Projection,
    raster_size: RasterSize,
    layout: HeightmapLayout,
    mesh_options: MeshOptions,
    service: OnceLock<(ServiceMetadata, Attribution)>,
}

impl Provider<HttpTransport> {
    /// Create a provider that fetches over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the options are invalid.
    pub fn new(options: ProviderOptions) -> Result<Self> {
        Self::with_transport(options, HttpTransport::new())
    }
}

impl<T: Transport> Provider<T> {
    /// Create a provider that fetches through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the options are invalid.
    pub fn with_transport(options: ProviderOptions, transport: T) -> Result<Self> {
        let endpoint = options.validate().inspect_err(|e| {
            tracing::warn!(error = %e, "rejected provider options");
        })?;
        tracing::info!(url = endpoint.base_url(), "created terrain provider");

        let raster_size = RasterSize::DEFAULT;
        Ok(Self {
            source: RasterSource::new(endpoint, transport),
            scheme: GeographicTilingScheme::new(Ellipsoid::WGS84, 2, 1, raster_size),
            raster_size,
            projection: Projection::Geographic,
            layout: HeightmapLayout::ARCGIS,
            mesh_options: MeshOptions::default(),
            service: OnceLock::new(),
        })
    }

    /// Replace the pixel layout used to unpack heights.
    ///
    /// Rasters are always decoded to RGBA, so the layout must use a
    /// [`RGBA_STRIDE`]-byte stride.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the layout is invalid or does not
    /// match RGBA pixels.
    pub fn with_heightmap_layout(mut self, layout: HeightmapLayout) -> Result<Self> {
        layout.validate().map_err(|e| Error::Configuration {
            detail: format!("heightmap layout: {e}"),
        })?;
        if layout.stride_bytes != RGBA_STRIDE {
            return Err(Error::Configuration {
                detail: format!(
                    "heightmap layout stride of {} bytes does not match {RGBA_STRIDE}-byte RGBA pixels",
                    layout.stride_bytes
                ),
            });
        }
        self.layout = layout;
        Ok(self)
    }

    /// Replace the vertex attributes the tessellator emits.
    #[must_use]
    pub fn with_mesh_options(mut self, options: MeshOptions) -> Self {
        self.mesh_options = options;
        self
    }

    /// Current initialization status.
    #[must_use]
    pub fn status(&self) -> ProviderStatus {
        if self.service.get().is_some() {
            ProviderStatus::Initialized
        } else {
            ProviderStatus::Created
        }
    }

    /// Whether [`Provider::initialize`] has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status() == ProviderStatus::Initialized
    }

    /// The tiling scheme all tiles are addressed in.
    #[must_use]
    pub fn tiling_scheme(&self) -> &dyn TilingScheme {
        &self.scheme
    }

    /// The projection tile geometry is built in.
    #[must_use]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Credit for the service, once initialized.
    #[must_use]
    pub fn attribution(&self) -> Option<&Attribution> {
        self.service.get().map(|(_, attribution)| attribution)
    }

    /// Service description, once initialized.
    #[must_use]
    pub fn metadata(&self) -> Option<&ServiceMetadata> {
        self.service.get().map(|(metadata, _)| metadata)
    }

    /// Create the tile at `key`, or `None` if the key is outside the scheme.
    #[must_use]
    pub fn create_tile(&self, key: TileKey) -> Option<Tile> {
        Tile::new(&self.scheme, key)
    }

    /// Geographic extent of the tile at `key`, or `None` if outside the
    /// scheme.
    #[must_use]
    pub fn tile_extent(&self, key: TileKey) -> Option<Extent> {
        self.scheme.tile_key_to_extent(key)
    }

    /// Maximum geometric error in meters of a tile at `level`.
    #[must_use]
    pub fn level_maximum_geometric_error(&self, level: u32) -> f64 {
        self.scheme.level_maximum_geometric_error(level)
    }

    /// Target angular spacing between samples at `level`.
    #[must_use]
    pub fn desired_resolution(&self, level: u32) -> f64 {
        desired_resolution(&self.scheme, level)
    }

    /// Load the service description and attribution.
    ///
    /// Safe to call concurrently with tile requests. On failure the status
    /// stays [`ProviderStatus::Created`].
    ///
    /// # Errors
    ///
    /// Returns an error if the description cannot be fetched or parsed.
    pub async fn initialize(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        let metadata = self.source.fetch_metadata().await.inspect_err(|e| {
            tracing::warn!(error = %e, "failed to load service metadata");
        })?;

        if let Some(reference) = metadata.spatial_reference {
            if !reference.is_geographic() {
                tracing::info!(
                    wkid = ?reference.latest_wkid.or(reference.wkid),
                    "service is not geographic; requesting geographic rasters anyway"
                );
            }
        }

        let attribution = Attribution::from(&metadata);
        // Concurrent initializations race; the first to finish wins.
        let _ = self.service.set((metadata, attribution));
        tracing::info!(
            url = self.source.endpoint().base_url(),
            "terrain provider initialized"
        );
        Ok(())
    }

    /// Fetch the elevation raster covering `tile`.
    ///
    /// # Errors
    ///
    /// Returns a fetch error if the request fails or the body is not an
    /// image.
    pub async fn fetch_tile_raster(&self, tile: &Tile) -> Result<RasterImage> {
        self.source.fetch_raster(tile.extent(), self.raster_size).await
    }

    /// Decode `raster` and tessellate it over `tile`.
    ///
    /// Synchronous and CPU-bound, so callers may run it on a worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] or [`Error::Tessellation`].
    pub fn build_tile_mesh(&self, tile: &Tile, raster: &RasterImage) -> Result<TileMesh> {
        let grid = self.decode_heights(raster)?;
        self.tessellate_tile(tile, &grid)
    }

    /// Fetch, decode and tessellate `tile`, then publish its mesh.
    ///
    /// Returns `Ok(true)` if this call published the mesh, and `Ok(false)`
    /// if the tile was already `Ready` or `Failed`, or another request
    /// published first. Any error from the newest request for the tile
    /// leaves it `Failed`.
    ///
    /// # Errors
    ///
    /// Returns an error of kind `Fetch`, `Decode` or `Tessellation`.
    pub async fn populate_tile_geometry(&self, tile: &Tile) -> Result<bool> {
        let Some(ticket) = tile.begin_request() else {
            tracing::debug!(key = ?tile.key(), state = ?tile.state(), "tile already settled");
            return Ok(false);
        };

        match self.run_pipeline(tile, &ticket).await {
            Ok(mesh) => {
                let published = tile.publish(&ticket, mesh);
                if published {
                    tracing::debug!(
                        key = ?tile.key(),
                        generation = ticket.generation(),
                        "tile ready"
                    );
                } else {
                    tracing::debug!(
                        key = ?tile.key(),
                        generation = ticket.generation(),
                        "discarding mesh for settled tile"
                    );
                }
                Ok(published)
            }
            Err(e) => {
                if tile.fail(&ticket) {
                    tracing::warn!(key = ?tile.key(), error = %e, "tile geometry failed");
                } else {
                    tracing::debug!(key = ?tile.key(), error = %e, "superseded request failed");
                }
                Err(e)
            }
        }
    }

    /// Build geometry for `tile` in a flat map projection.
    ///
    /// Not supported; the tile is left untouched.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::UnsupportedOperation`].
    #[allow(clippy::unused_self)]
    pub fn populate_tile_plane_geometry(
        &self,
        tile: &Tile,
        projection: Projection,
    ) -> Result<bool> {
        tracing::debug!(key = ?tile.key(), ?projection, "plane geometry requested");
        Err(Error::UnsupportedOperation {
            operation: "populate_tile_plane_geometry",
        })
    }

    async fn run_pipeline(&self, tile: &Tile, ticket: &RequestTicket) -> Result<TileMesh> {
        let raster = self.fetch_tile_raster(tile).await?;

        tile.advance(ticket, TileState::Decoding);
        let grid = self.decode_heights(&raster)?;
        drop(raster);

        tile.advance(ticket, TileState::Tessellating);
        self.tessellate_tile(tile, &grid)
    }

    fn decode_heights(&self, raster: &RasterImage) -> Result<SampleGrid> {
        Ok(decode_heightmap(
            &raster.pixels,
            raster.width,
            raster.height,
            &self.layout,
        )?)
    }

    fn tessellate_tile(&self, tile: &Tile, grid: &SampleGrid) -> Result<TileMesh> {
        Ok(tessellate(
            grid,
            tile.extent(),
            self.scheme.ellipsoid(),
            tile.center(),
            &self.mesh_options,
        )?)
    }
}
