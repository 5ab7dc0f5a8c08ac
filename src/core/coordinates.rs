//! Core coordinate utilities
//!
//! Geographic points and the angle helpers shared by the geodesic model,
//! the overlay builder and the projection pipeline.
//!
//! Conventions:
//! - Points are (longitude, latitude) in degrees, f64.
//! - Bearings are degrees clockwise from geographic north.

use bevy::math::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

// ========================= Geographic coordinates and helpers =========================

#[derive(Debug, Clone, PartialEq)]
pub struct CoordError {
    pub msg: String,
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

impl std::error::Error for CoordError {}

/// A geographic point on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Validating constructor: latitude must lie in [-90, 90] and both
    /// components must be finite. Longitude is wrapped into [-180, 180).
    pub fn from_degrees(lon: f64, lat: f64) -> Result<Self, CoordError> {
        if !lon.is_finite() {
            return Err(CoordError {
                msg: format!("Invalid longitude: {:?}", lon),
            });
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordError {
                msg: format!("Invalid latitude: {:?}", lat),
            });
        }
        Ok(Self {
            lon: normalize_longitude(lon),
            lat,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat)
    }

    pub fn as_dvec2(&self) -> DVec2 {
        DVec2::new(self.lon, self.lat)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lon, self.lat)
    }
}

/// Reduce any bearing into [0, 360).
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if b >= 360.0 { 0.0 } else { b }
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_longitude(deg: f64) -> f64 {
    let l = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if l >= 180.0 { -180.0 } else { l }
}

/// Unit vector of a bearing in a local east/north frame.
pub fn bearing_to_unit(bearing_deg: f64) -> DVec2 {
    let (s, c) = bearing_deg.to_radians().sin_cos();
    DVec2::new(s, c)
}

// =================================== Tests ===================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_from_degrees_valid() {
        let p = GeoPoint::from_degrees(7.0, 47.0).unwrap();
        assert!((p.lon - 7.0).abs() < EPSILON);
        assert!((p.lat - 47.0).abs() < EPSILON);
    }

    #[test]
    fn test_from_degrees_boundary_values() {
        assert!(GeoPoint::from_degrees(180.0, 90.0).is_ok());
        assert!(GeoPoint::from_degrees(-180.0, -90.0).is_ok());
        assert!(GeoPoint::from_degrees(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_from_degrees_invalid_latitude() {
        assert!(GeoPoint::from_degrees(0.0, 90.5).is_err());
        assert!(GeoPoint::from_degrees(0.0, -91.0).is_err());
        assert!(GeoPoint::from_degrees(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_from_degrees_invalid_longitude() {
        assert!(GeoPoint::from_degrees(f64::INFINITY, 0.0).is_err());
        assert!(GeoPoint::from_degrees(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_from_degrees_wraps_longitude() {
        let p = GeoPoint::from_degrees(190.0, 10.0).unwrap();
        assert!((p.lon + 170.0).abs() < EPSILON);
    }

    #[test]
    fn test_normalize_bearing() {
        assert!((normalize_bearing(0.0) - 0.0).abs() < EPSILON);
        assert!((normalize_bearing(360.0) - 0.0).abs() < EPSILON);
        assert!((normalize_bearing(-90.0) - 270.0).abs() < EPSILON);
        assert!((normalize_bearing(725.0) - 5.0).abs() < EPSILON);
        assert!(normalize_bearing(-1e-18) < 360.0);
    }

    #[test]
    fn test_normalize_longitude() {
        assert!((normalize_longitude(180.0) + 180.0).abs() < EPSILON);
        assert!((normalize_longitude(-181.0) - 179.0).abs() < EPSILON);
        assert!((normalize_longitude(7.0) - 7.0).abs() < EPSILON);
    }

    #[test]
    fn test_bearing_to_unit() {
        let north = bearing_to_unit(0.0);
        assert!(north.x.abs() < EPSILON && (north.y - 1.0).abs() < EPSILON);
        let east = bearing_to_unit(90.0);
        assert!((east.x - 1.0).abs() < EPSILON && east.y.abs() < EPSILON);
    }

    #[test]
    fn test_coord_error_display() {
        let err = GeoPoint::from_degrees(0.0, 100.0).unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }
}
