//! Reference ellipsoid and geodetic conversions.

use glam::DVec3;

/// A triaxial ellipsoid centered at the origin, in meters.
///
/// Only oblate ellipsoids of revolution are used for globes, so `radii.x`
/// and `radii.y` are equal and form the equatorial radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    radii: DVec3,
    radii_squared: DVec3,
}

impl Ellipsoid {
    /// The WGS84 ellipsoid.
    pub const WGS84: Self =
        Self::from_radii(DVec3::new(6_378_137.0, 6_378_137.0, 6_356_752.314_245_179));

    /// A unit sphere, mostly useful for tests.
    pub const UNIT_SPHERE: Self = Self::from_radii(DVec3::ONE);

    /// Create an ellipsoid from its three semi-axes.
    #[must_use]
    pub const fn from_radii(radii: DVec3) -> Self {
        Self {
            radii,
            radii_squared: DVec3::new(radii.x * radii.x, radii.y * radii.y, radii.z * radii.z),
        }
    }

    /// Create a sphere of the given radius.
    #[must_use]
    pub const fn sphere(radius: f64) -> Self {
        Self::from_radii(DVec3::splat(radius))
    }

    /// Semi-axes of the ellipsoid.
    #[must_use]
    pub fn radii(&self) -> DVec3 {
        self.radii
    }

    /// Equatorial radius (the x semi-axis).
    #[must_use]
    pub fn equatorial_radius(&self) -> f64 {
        self.radii.x
    }

    /// Largest of the three semi-axes.
    #[must_use]
    pub fn maximum_radius(&self) -> f64 {
        self.radii.max_element()
    }

    /// Unit normal to the ellipsoid surface at a geodetic longitude/latitude
    /// (radians).
    #[must_use]
    pub fn geodetic_surface_normal(&self, longitude: f64, latitude: f64) -> DVec3 {
        let cos_lat = latitude.cos();
        DVec3::new(
            cos_lat * longitude.cos(),
            cos_lat * longitude.sin(),
            latitude.sin(),
        )
        .normalize()
    }

    /// Convert geodetic longitude/latitude (radians) and height above the
    /// surface (meters) to an Earth-centered Cartesian position.
    #[must_use]
    pub fn cartographic_to_cartesian(&self, longitude: f64, latitude: f64, height: f64) -> DVec3 {
        let normal = self.geodetic_surface_normal(longitude, latitude);
        let k = self.radii_squared * normal;
        let gamma = normal.dot(k).sqrt();
        k / gamma + normal * height
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_equator_prime_meridian() {
        let p = Ellipsoid::WGS84.cartographic_to_cartesian(0.0, 0.0, 0.0);
        assert!((p.x - 6_378_137.0).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
        assert!(p.z.abs() < 1e-6);
    }

    #[test]
    fn test_north_pole() {
        let p = Ellipsoid::WGS84.cartographic_to_cartesian(0.0, FRAC_PI_2, 0.0);
        assert!(p.x.abs() < 1e-6);
        assert!((p.z - 6_356_752.314_245_179).abs() < 1e-6);
    }

    #[test]
    fn test_height_moves_along_normal() {
        let e = Ellipsoid::WGS84;
        let base = e.cartographic_to_cartesian(0.3, 0.7, 0.0);
        let raised = e.cartographic_to_cartesian(0.3, 0.7, 1000.0);
        let normal = e.geodetic_surface_normal(0.3, 0.7);
        assert!(((raised - base) - normal * 1000.0).length() < 1e-6);
    }

    #[test]
    fn test_sphere_matches_spherical_formula() {
        let e = Ellipsoid::sphere(10.0);
        let p = e.cartographic_to_cartesian(FRAC_PI_2, 0.0, 0.0);
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_radii_accessors() {
        let e = Ellipsoid::WGS84;
        assert!((e.equatorial_radius() - 6_378_137.0).abs() < f64::EPSILON);
        assert!((e.maximum_radius() - 6_378_137.0).abs() < f64::EPSILON);
    }
}
