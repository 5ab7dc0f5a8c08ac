//! Geodesic model
//!
//! Ellipsoidal forward/inverse geodesic math used by the overlay builder.
//! Pure functions over `Copy` values, no caches.

pub mod ellipsoid;
pub mod geodesic;

pub use ellipsoid::Ellipsoid;
pub use geodesic::{MAX_PATH_STEPS, Direct, Geodesic, GeodesicLine, GeodesicPath, Inverse, PathSample};

use crate::core::coordinates::GeoPoint;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeodesicError {
    #[error("invalid distance {0} m")]
    InvalidDistance(f64),
    #[error("invalid bearing {0}°")]
    InvalidBearing(f64),
    #[error("invalid coordinate {0}")]
    InvalidCoordinate(GeoPoint),
    #[error("cannot build a geodesic line between coincident points at {0}")]
    CoincidentPoints(GeoPoint),
    #[error("inverse geodesic between {from} and {to} did not converge (nearly antipodal)")]
    Antipodal { from: GeoPoint, to: GeoPoint },
    #[error("forward geodesic from {0} did not converge")]
    NoConvergence(GeoPoint),
    #[error("path needs {steps} steps, more than the limit of {max}")]
    TooManySteps { steps: f64, max: usize },
}
