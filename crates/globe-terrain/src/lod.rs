//! Screen-space error metric for choosing tile levels.

use glam::DVec3;

/// Default refinement threshold in pixels.
pub const DEFAULT_MAXIMUM_SCREEN_SPACE_ERROR: f64 = 2.0;

/// Screen-space error metric for LOD decisions.
#[derive(Debug, Clone, Copy)]
pub struct LodMetrics {
    /// Camera position in earth-centered coordinates.
    pub camera_position: DVec3,
    /// Pixels per meter at distance 1 from camera.
    pub pixels_per_meter: f64,
    /// Pixel error above which a tile is refined.
    pub maximum_screen_space_error: f64,
}

impl LodMetrics {
    /// Create LOD metrics from camera parameters.
    #[must_use]
    pub fn new(camera_position: DVec3, fov_y: f64, screen_height: f64) -> Self {
        let pixels_per_meter = screen_height / (2.0 * (fov_y / 2.0).tan());
        Self {
            camera_position,
            pixels_per_meter,
            maximum_screen_space_error: DEFAULT_MAXIMUM_SCREEN_SPACE_ERROR,
        }
    }

    /// Replace the refinement threshold.
    #[must_use]
    pub fn with_maximum_screen_space_error(mut self, pixels: f64) -> Self {
        self.maximum_screen_space_error = pixels;
        self
    }

    /// Projected size in pixels of `geometric_error` meters at `tile_center`.
    ///
    /// Infinite when the camera sits on the center.
    #[must_use]
    pub fn screen_space_error(&self, tile_center: DVec3, geometric_error: f64) -> f64 {
        let distance = self.camera_position.distance(tile_center);
        if distance <= 0.0 {
            return f64::INFINITY;
        }
        geometric_error * self.pixels_per_meter / distance
    }

    /// Whether a tile with `geometric_error` at `tile_center` should be
    /// replaced by its children.
    #[must_use]
    pub fn should_refine(&self, tile_center: DVec3, geometric_error: f64) -> bool {
        self.screen_space_error(tile_center, geometric_error) > self.maximum_screen_space_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globe_terrain_decode::{GeographicTilingScheme, TilingScheme};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_pixels_per_meter() {
        // tan(45 degrees) is 1, so half the screen height.
        let metrics = LodMetrics::new(DVec3::ZERO, FRAC_PI_2, 1080.0);
        assert!((metrics.pixels_per_meter - 540.0).abs() < 1e-9);
    }

    #[test]
    fn test_should_refine() {
        let metrics = LodMetrics::new(DVec3::ZERO, FRAC_PI_2, 1080.0);

        // Close tile with a large error should refine.
        assert!(metrics.should_refine(DVec3::new(1000.0, 0.0, 0.0), 100.0));

        // Far tile with a small error should not.
        assert!(!metrics.should_refine(DVec3::new(1.0e7, 0.0, 0.0), 1.0));
    }

    #[test]
    fn test_camera_at_center_refines() {
        let metrics = LodMetrics::new(DVec3::ONE, FRAC_PI_2, 1080.0);
        assert!(metrics.should_refine(DVec3::ONE, 0.0));
    }

    #[test]
    fn test_deeper_levels_stop_refining() {
        let scheme = GeographicTilingScheme::default();
        let metrics = LodMetrics::new(DVec3::new(1.0e7, 0.0, 0.0), FRAC_PI_2, 1080.0)
            .with_maximum_screen_space_error(DEFAULT_MAXIMUM_SCREEN_SPACE_ERROR);
        let target = DVec3::new(6_378_137.0, 0.0, 0.0);

        assert!(metrics.should_refine(target, scheme.level_maximum_geometric_error(0)));
        assert!(!metrics.should_refine(target, scheme.level_maximum_geometric_error(20)));
    }
}
