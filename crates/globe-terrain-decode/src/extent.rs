//! Geographic extents.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec3;

use crate::ellipsoid::Ellipsoid;

/// Samples per edge when bounding an extent's surface.
const BOUNDING_SAMPLES: u32 = 5;

/// A geographic rectangle in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Extent {
    /// The whole globe.
    pub const MAX_VALUE: Self = Self {
        west: -PI,
        south: -FRAC_PI_2,
        east: PI,
        north: FRAC_PI_2,
    };

    /// Create an extent from its edges in radians.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Create an extent from its edges in degrees.
    #[must_use]
    pub fn from_degrees(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self::new(
            west.to_radians(),
            south.to_radians(),
            east.to_radians(),
            north.to_radians(),
        )
    }

    /// Angular width in radians.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Angular height in radians.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Center as `(longitude, latitude)` in radians.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) * 0.5,
            (self.south + self.north) * 0.5,
        )
    }

    /// Whether `other` lies entirely within this extent, allowing `epsilon`
    /// of slack on every edge.
    #[must_use]
    pub fn contains_extent(&self, other: &Extent, epsilon: f64) -> bool {
        other.west >= self.west - epsilon
            && other.east <= self.east + epsilon
            && other.south >= self.south - epsilon
            && other.north <= self.north + epsilon
    }

    /// Edges as `[west, south, east, north]` in degrees.
    #[must_use]
    pub fn to_degrees(&self) -> [f64; 4] {
        [
            self.west.to_degrees(),
            self.south.to_degrees(),
            self.east.to_degrees(),
            self.north.to_degrees(),
        ]
    }

    /// Center of a sphere bounding the extent's surface on `ellipsoid` at
    /// zero height.
    ///
    /// This is the midpoint of the axis-aligned box around a grid of surface
    /// samples, so for small extents it lies slightly below the surface.
    #[must_use]
    pub fn bounding_sphere_center(&self, ellipsoid: &Ellipsoid) -> DVec3 {
        let steps = f64::from(BOUNDING_SAMPLES - 1);
        let mut min = DVec3::splat(f64::INFINITY);
        let mut max = DVec3::splat(f64::NEG_INFINITY);

        for row in 0..BOUNDING_SAMPLES {
            let latitude = self.south + self.height() * f64::from(row) / steps;
            for col in 0..BOUNDING_SAMPLES {
                let longitude = self.west + self.width() * f64::from(col) / steps;
                let point = ellipsoid.cartographic_to_cartesian(longitude, latitude, 0.0);
                min = min.min(point);
                max = max.max(point);
            }
        }

        (min + max) * 0.5
    }
}
