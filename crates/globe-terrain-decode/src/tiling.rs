//! Tiling schemes and geometric error budgets.
//!
//! A tiling scheme maps a `(level, x, y)` tile address to a geographic
//! extent and assigns each level the largest geometric error (in meters) a
//! tile at that level may carry.
//!
//! Tile addresses use a south-up convention: `y = 0` is the southern-most
//! row. The scheme's own extent function, [`TilingScheme::tile_xy_to_extent`],
//! counts rows from the north, so [`TilingScheme::tile_key_to_extent`] flips
//! the row index before delegating.

use std::f64::consts::PI;

use crate::{ellipsoid::Ellipsoid, extent::Extent, raster::RasterSize};

/// Fraction of a heightmap sample spacing accepted as geometric error.
const HEIGHTMAP_TERRAIN_QUALITY: f64 = 0.25;

/// Address of a tile within a tiling scheme, with a south-up row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    /// Create a tile key.
    #[must_use]
    pub const fn new(level: u32, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }

    /// The tile one level up that covers this one, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        (self.level > 0).then(|| Self::new(self.level - 1, self.x / 2, self.y / 2))
    }

    /// The four tiles one level down that this tile covers.
    #[must_use]
    pub fn children(&self) -> [Self; 4] {
        let (x, y, level) = (self.x * 2, self.y * 2, self.level + 1);
        [
            Self::new(level, x, y),
            Self::new(level, x + 1, y),
            Self::new(level, x, y + 1),
            Self::new(level, x + 1, y + 1),
        ]
    }
}

/// A rule mapping tile addresses to extents and error budgets.
pub trait TilingScheme: Send + Sync {
    /// Ellipsoid the tiles are draped over.
    fn ellipsoid(&self) -> &Ellipsoid;

    /// Overall extent covered by the scheme.
    fn extent(&self) -> Extent;

    /// Number of tile columns at `level`.
    fn number_of_x_tiles_at_level(&self, level: u32) -> u32;

    /// Number of tile rows at `level`.
    fn number_of_y_tiles_at_level(&self, level: u32) -> u32;

    /// Extent of the tile at column `x`, row `y` counted from the north.
    fn tile_xy_to_extent(&self, x: u32, y: u32, level: u32) -> Extent;

    /// Largest geometric error, in meters, permitted at `level`.
    fn level_maximum_geometric_error(&self, level: u32) -> f64;

    /// Extent of a south-up addressed tile, or `None` if the key lies
    /// outside the scheme.
    fn tile_key_to_extent(&self, key: TileKey) -> Option<Extent> {
        let tiles_x = self.number_of_x_tiles_at_level(key.level);
        let tiles_y = self.number_of_y_tiles_at_level(key.level);
        if key.x >= tiles_x || key.y >= tiles_y {
            return None;
        }
        Some(self.tile_xy_to_extent(key.x, tiles_y - key.y - 1, key.level))
    }
}

/// Convert a level's geometric error budget into an angular tessellation
/// target, in radians.
///
/// Divides by the equatorial radius, so latitude-dependent foreshortening is
/// ignored and tiles near the poles are tessellated denser than their true
/// ground resolution requires.
#[must_use]
pub fn desired_resolution(scheme: &dyn TilingScheme, level: u32) -> f64 {
    scheme.level_maximum_geometric_error(level) / scheme.ellipsoid().equatorial_radius()
}

/// Equirectangular scheme over longitude/latitude.
#[derive(Debug, Clone)]
pub struct GeographicTilingScheme {
    ellipsoid: Ellipsoid,
    extent: Extent,
    level_zero_tiles_x: u32,
    level_zero_tiles_y: u32,
    level_zero_maximum_error: f64,
}

impl GeographicTilingScheme {
    /// Create a whole-globe scheme.
    ///
    /// `heightmap_size` is the raster resolution fetched per tile; it sets
    /// the level-zero error budget.
    #[must_use]
    pub fn new(
        ellipsoid: Ellipsoid,
        level_zero_tiles_x: u32,
        level_zero_tiles_y: u32,
        heightmap_size: RasterSize,
    ) -> Self {
        let level_zero_tiles_x = level_zero_tiles_x.max(1);
        let level_zero_tiles_y = level_zero_tiles_y.max(1);
        let level_zero_maximum_error = estimated_level_zero_error(
            &ellipsoid,
            heightmap_size.width,
            level_zero_tiles_x,
        );
        Self {
            ellipsoid,
            extent: Extent::MAX_VALUE,
            level_zero_tiles_x,
            level_zero_tiles_y,
            level_zero_maximum_error,
        }
    }
}

impl Default for GeographicTilingScheme {
    /// Two level-zero tiles (western and eastern hemisphere) on WGS84.
    fn default() -> Self {
        Self::new(Ellipsoid::WGS84, 2, 1, RasterSize::DEFAULT)
    }
}

impl TilingScheme for GeographicTilingScheme {
    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    fn extent(&self) -> Extent {
        self.extent
    }

    fn number_of_x_tiles_at_level(&self, level: u32) -> u32 {
        tiles_at_level(self.level_zero_tiles_x, level)
    }

    fn number_of_y_tiles_at_level(&self, level: u32) -> u32 {
        tiles_at_level(self.level_zero_tiles_y, level)
    }

    fn tile_xy_to_extent(&self, x: u32, y: u32, level: u32) -> Extent {
        let tile_width = self.extent.width() / f64::from(self.number_of_x_tiles_at_level(level));
        let tile_height = self.extent.height() / f64::from(self.number_of_y_tiles_at_level(level));

        Extent::new(
            self.extent.west + f64::from(x) * tile_width,
            self.extent.north - f64::from(y + 1) * tile_height,
            self.extent.west + f64::from(x + 1) * tile_width,
            self.extent.north - f64::from(y) * tile_height,
        )
    }

    fn level_maximum_geometric_error(&self, level: u32) -> f64 {
        self.level_zero_maximum_error * 0.5f64.powf(f64::from(level))
    }
}

/// Saturates at `u32::MAX` for levels too deep to address.
fn tiles_at_level(level_zero_tiles: u32, level: u32) -> u32 {
    u32::try_from(u64::from(level_zero_tiles) << level.min(32)).unwrap_or(u32::MAX)
}

/// Error of a heightmap tile at level zero: a quarter of the ground spacing
/// between adjacent samples along the equator.
fn estimated_level_zero_error(ellipsoid: &Ellipsoid, heightmap_width: u32, tiles_x: u32) -> f64 {
    ellipsoid.maximum_radius() * 2.0 * PI * HEIGHTMAP_TERRAIN_QUALITY
        / (f64::from(heightmap_width) * f64::from(tiles_x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_zero_extents() {
        let scheme = GeographicTilingScheme::default();
        let west = scheme.tile_key_to_extent(TileKey::new(0, 0, 0)).unwrap();
        for (actual, expected) in west.to_degrees().iter().zip([-180.0, -90.0, 0.0, 90.0]) {
            assert!((actual - expected).abs() < 1e-9);
        }

        let east = scheme.tile_key_to_extent(TileKey::new(0, 1, 0)).unwrap();
        assert!((east.west).abs() < 1e-12);
        assert!((east.east - PI).abs() < 1e-12);
    }

    #[test]
    fn test_south_up_row_flip() {
        let scheme = GeographicTilingScheme::default();

        // Row 0 at level 1 is the southern hemisphere.
        let south = scheme.tile_key_to_extent(TileKey::new(1, 0, 0)).unwrap();
        assert!((south.south + PI / 2.0).abs() < 1e-12);
        assert!(south.north.abs() < 1e-12);

        let north = scheme.tile_key_to_extent(TileKey::new(1, 0, 1)).unwrap();
        assert!(north.south.abs() < 1e-12);
        assert!((north.north - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_key() {
        let scheme = GeographicTilingScheme::default();
        assert!(scheme.tile_key_to_extent(TileKey::new(0, 2, 0)).is_none());
        assert!(scheme.tile_key_to_extent(TileKey::new(0, 0, 1)).is_none());
    }

    #[test]
    fn test_level_zero_error() {
        let scheme = GeographicTilingScheme::default();
        let expected = 6_378_137.0 * 2.0 * PI * 0.25 / (256.0 * 2.0);
        assert!((scheme.level_maximum_geometric_error(0) - expected).abs() < 1e-6);
        assert!((scheme.level_maximum_geometric_error(3) - expected / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_deep_levels_keep_shrinking_error() {
        let scheme = GeographicTilingScheme::default();
        let levels = [30, 1 << 30, (1 << 31) - 1, 1 << 31, u32::MAX];
        for pair in levels.windows(2) {
            let (shallow, deep) = (pair[0], pair[1]);
            let shallow_error = scheme.level_maximum_geometric_error(shallow);
            let deep_error = scheme.level_maximum_geometric_error(deep);
            assert!(deep_error.is_finite() && deep_error >= 0.0, "level {deep}");
            assert!(deep_error <= shallow_error, "level {deep} vs {shallow}");
        }
        assert!(desired_resolution(&scheme, u32::MAX) <= desired_resolution(&scheme, 1 << 31));
    }

    #[test]
    fn test_desired_resolution_is_error_over_radius() {
        let scheme = GeographicTilingScheme::default();
        let resolution = desired_resolution(&scheme, 0);
        let expected = scheme.level_maximum_geometric_error(0) / 6_378_137.0;
        assert!((resolution - expected).abs() < 1e-15);
    }

    #[test]
    fn test_parent_and_children() {
        let key = TileKey::new(2, 3, 1);
        assert_eq!(key.parent(), Some(TileKey::new(1, 1, 0)));
        assert!(key.children().iter().all(|c| c.parent() == Some(key)));
        assert_eq!(TileKey::new(0, 1, 0).parent(), None);
    }

    proptest! {
        #[test]
        fn prop_extent_within_scheme(level in 0u32..12, fx in 0.0f64..1.0, fy in 0.0f64..1.0) {
            let scheme = GeographicTilingScheme::default();
            let tiles_x = scheme.number_of_x_tiles_at_level(level);
            let tiles_y = scheme.number_of_y_tiles_at_level(level);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let key = TileKey::new(
                level,
                ((fx * f64::from(tiles_x)) as u32).min(tiles_x - 1),
                ((fy * f64::from(tiles_y)) as u32).min(tiles_y - 1),
            );

            let extent = scheme.tile_key_to_extent(key).unwrap();
            prop_assert!(extent.west < extent.east);
            prop_assert!(extent.south < extent.north);
            prop_assert!(scheme.extent().contains_extent(&extent, 1e-12));
        }

        #[test]
        fn prop_desired_resolution_non_increasing(level in 0u32..24) {
            let scheme = GeographicTilingScheme::default();
            let coarse = desired_resolution(&scheme, level);
            prop_assert!(desired_resolution(&scheme, level + 1) <= coarse);
        }
    }
}
