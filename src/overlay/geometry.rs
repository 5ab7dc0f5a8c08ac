//! Overlay geometry model
//!
//! Everything here is in geographic (lon, lat) degrees. Pixel-space data is
//! only derived later, against a projection pipeline.

use crate::core::coordinates::{GeoPoint, bearing_to_unit};
use bevy::math::DVec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Ring,
    MainAxis,
    FlightLine,
    Tick,
}

impl PathKind {
    /// Only the ring is stroked as a closed polygon.
    pub fn is_closed(self) -> bool {
        matches!(self, PathKind::Ring)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPath {
    pub kind: PathKind,
    pub points: Vec<GeoPoint>,
}

impl OverlayPath {
    pub fn new(kind: PathKind, points: Vec<GeoPoint>) -> Self {
        Self { kind, points }
    }
}

/// Distance label attached to the outer end of a tick stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLabel {
    /// Tick endpoint the text is placed beyond
    pub anchor: GeoPoint,
    /// Opposite tick endpoint; `anchor - tail` gives the reading direction
    pub tail: GeoPoint,
    /// Bearing from the tick point toward the anchor, degrees
    pub outward_bearing: f64,
    pub text: String,
}

impl OverlayLabel {
    /// Unit tangent in the local east/north frame at the anchor.
    pub fn local_tangent(&self) -> DVec2 {
        bearing_to_unit(self.outward_bearing)
    }
}

/// Geographic bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl GeoBounds {
    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.min.lon..=self.max.lon).contains(&p.lon) && (self.min.lat..=self.max.lat).contains(&p.lat)
    }
}

/// Complete output of one build, in emission order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayGeometry {
    pub paths: Vec<OverlayPath>,
    pub labels: Vec<OverlayLabel>,
}

impl OverlayGeometry {
    pub fn paths_of(&self, kind: PathKind) -> impl Iterator<Item = &OverlayPath> {
        self.paths.iter().filter(move |p| p.kind == kind)
    }

    pub fn point_count(&self) -> usize {
        self.paths.iter().map(|p| p.points.len()).sum()
    }

    /// Bounding box of every path point; `None` for empty geometry.
    ///
    /// Longitudes are compared as-is, so an overlay straddling the
    /// antimeridian yields a box spanning the whole globe in longitude.
    pub fn bounds(&self) -> Option<GeoBounds> {
        let mut points = self.paths.iter().flat_map(|p| p.points.iter());
        let first = *points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min.lon = min.lon.min(p.lon);
            min.lat = min.lat.min(p.lat);
            max.lon = max.lon.max(p.lon);
            max.lat = max.lat.max(p.lat);
        }
        Some(GeoBounds { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ring_is_closed() {
        assert!(PathKind::Ring.is_closed());
        assert!(!PathKind::MainAxis.is_closed());
        assert!(!PathKind::FlightLine.is_closed());
        assert!(!PathKind::Tick.is_closed());
    }

    #[test]
    fn test_bounds() {
        let geometry = OverlayGeometry {
            paths: vec![
                OverlayPath::new(
                    PathKind::MainAxis,
                    vec![GeoPoint::new(7.0, 47.0), GeoPoint::new(7.1, 47.2)],
                ),
                OverlayPath::new(PathKind::Tick, vec![GeoPoint::new(6.9, 47.1)]),
            ],
            labels: vec![],
        };
        let b = geometry.bounds().unwrap();
        assert_eq!(b.min, GeoPoint::new(6.9, 47.0));
        assert_eq!(b.max, GeoPoint::new(7.1, 47.2));
        assert!(b.contains(GeoPoint::new(7.0, 47.1)));
        assert_eq!(geometry.point_count(), 3);
        assert_eq!(geometry.paths_of(PathKind::Tick).count(), 1);
    }

    #[test]
    fn test_empty_geometry_has_no_bounds() {
        assert!(OverlayGeometry::default().bounds().is_none());
    }
}
