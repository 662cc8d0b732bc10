//! Tiles and their geometry lifecycle.
//!
//! A [`Tile`] moves through
//! `Unrequested -> Requesting -> Decoding -> Tessellating -> Ready`, or ends
//! in `Failed`. `Ready` and `Failed` are terminal.
//!
//! Requests for the same tile may overlap. Each one holds a
//! [`RequestTicket`] tagged with a generation; only the newest generation
//! reports intermediate phases or failure. The mesh itself is published at
//! most once: the first request to finish successfully wins and every later
//! completion is rejected, so a tile never mixes geometry from two fetches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use glam::DVec3;
use globe_terrain_decode::{Extent, TileKey, TileMesh, TilingScheme};

/// Geometry phase of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// No request has been issued.
    Unrequested,
    /// Waiting for the raster.
    Requesting,
    /// Unpacking raster pixels into heights.
    Decoding,
    /// Building the mesh.
    Tessellating,
    /// Mesh published.
    Ready,
    /// The newest request failed; the tile will never become ready.
    Failed,
}

impl TileState {
    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TileState::Ready | TileState::Failed)
    }
}

/// Proof of an in-flight geometry request.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    /// Generation of the request, starting at 1 for a tile's first request.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
struct Progress {
    state: TileState,
    latest_generation: u64,
    ready_generation: Option<u64>,
}

/// One cell of the tiling hierarchy.
#[derive(Debug)]
pub struct Tile {
    key: TileKey,
    extent: Extent,
    center: DVec3,
    progress: Mutex<Progress>,
    mesh: OnceLock<Arc<TileMesh>>,
}

impl Tile {
    /// Create the tile at `key`, or `None` if the key lies outside `scheme`.
    ///
    /// The center is the bounding-sphere center of the extent's surface,
    /// used as the origin for the mesh's relative positions.
    #[must_use]
    pub fn new(scheme: &dyn TilingScheme, key: TileKey) -> Option<Self> {
        let extent = scheme.tile_key_to_extent(key)?;
        let center = extent.bounding_sphere_center(scheme.ellipsoid());

        Some(Self {
            key,
            extent,
            center,
            progress: Mutex::new(Progress {
                state: TileState::Unrequested,
                latest_generation: 0,
                ready_generation: None,
            }),
            mesh: OnceLock::new(),
        })
    }

    /// Address of the tile.
    #[must_use]
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Geographic footprint in radians.
    #[must_use]
    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// Earth-centered origin the mesh positions are relative to.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Current geometry phase.
    #[must_use]
    pub fn state(&self) -> TileState {
        self.progress().state
    }

    /// Whether the mesh has been published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.mesh.get().is_some()
    }

    /// The published mesh, if any.
    #[must_use]
    pub fn mesh(&self) -> Option<Arc<TileMesh>> {
        self.mesh.get().cloned()
    }

    /// Generation of the request whose mesh was published.
    #[must_use]
    pub fn ready_generation(&self) -> Option<u64> {
        self.progress().ready_generation
    }

    /// Start a new request, superseding any in flight.
    ///
    /// Returns `None` if the tile is already `Ready` or `Failed`.
    pub fn begin_request(&self) -> Option<RequestTicket> {
        let mut progress = self.progress();
        if progress.state.is_terminal() {
            return None;
        }
        progress.latest_generation += 1;
        progress.state = TileState::Requesting;
        Some(RequestTicket {
            generation: progress.latest_generation,
        })
    }

    /// Move to `state` on behalf of `ticket`.
    ///
    /// Ignored unless `ticket` is the newest request and the tile is not in
    /// a terminal state. Returns whether the transition was applied.
    pub fn advance(&self, ticket: &RequestTicket, state: TileState) -> bool {
        debug_assert!(matches!(
            state,
            TileState::Decoding | TileState::Tessellating
        ));
        let mut progress = self.progress();
        if progress.state.is_terminal() || ticket.generation != progress.latest_generation {
            return false;
        }
        progress.state = state;
        true
    }

    /// Publish `mesh` on behalf of `ticket`.
    ///
    /// Succeeds for the first request to finish, even a superseded one, as
    /// long as the tile has not failed. Returns whether the mesh was
    /// published; a rejected mesh is dropped.
    pub fn publish(&self, ticket: &RequestTicket, mesh: TileMesh) -> bool {
        let mut progress = self.progress();
        if progress.state.is_terminal() {
            return false;
        }
        if self.mesh.set(Arc::new(mesh)).is_err() {
            return false;
        }
        progress.state = TileState::Ready;
        progress.ready_generation = Some(ticket.generation);
        true
    }

    /// Record a failure on behalf of `ticket`.
    ///
    /// Only the newest request can fail the tile. Returns whether the tile
    /// moved to `Failed`.
    pub fn fail(&self, ticket: &RequestTicket) -> bool {
        let mut progress = self.progress();
        if progress.state.is_terminal() || ticket.generation != progress.latest_generation {
            return false;
        }
        progress.state = TileState::Failed;
        true
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tiles of one tiling scheme, keyed by address.
#[derive(Debug, Default)]
pub struct TileSet {
    tiles: HashMap<TileKey, Arc<Tile>>,
}

impl TileSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tile at `key`, creating it if needed. `None` if the key lies
    /// outside `scheme`.
    pub fn get_or_create(&mut self, scheme: &dyn TilingScheme, key: TileKey) -> Option<Arc<Tile>> {
        if let Some(tile) = self.tiles.get(&key) {
            return Some(Arc::clone(tile));
        }
        let tile = Arc::new(Tile::new(scheme, key)?);
        self.tiles.insert(key, Arc::clone(&tile));
        Some(tile)
    }

    /// The tile at `key`, if created.
    #[must_use]
    pub fn get(&self, key: TileKey) -> Option<&Arc<Tile>> {
        self.tiles.get(&key)
    }

    /// Drop the tile at `key`.
    pub fn remove(&mut self, key: TileKey) -> Option<Arc<Tile>> {
        self.tiles.remove(&key)
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the set holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// The tile to draw for `key`: the tile itself if ready, otherwise its
    /// nearest ready ancestor. `None` means the subtree should not be drawn.
    #[must_use]
    pub fn fallback_for(&self, key: TileKey) -> Option<Arc<Tile>> {
        let mut current = Some(key);
        while let Some(candidate) = current {
            if let Some(tile) = self.tiles.get(&candidate).filter(|t| t.is_ready()) {
                return Some(Arc::clone(tile));
            }
            current = candidate.parent();
        }
        None
    }
}
