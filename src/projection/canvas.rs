//! Reference projection pipeline: layer CRS -> WGS84 -> display CRS -> pixels

use bevy::math::DVec2;

use crate::core::coordinates::GeoPoint;
use crate::projection::crs::Crs;
use crate::projection::{ProjectionError, ProjectionPipeline};

/// Affine display-CRS -> device-pixel transform of a canvas.
///
/// Pixels have their origin at the top-left corner with y pointing down.
/// `rotation_deg` turns the map clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapToPixel {
    /// Display-CRS coordinate shown at the viewport center
    pub center: DVec2,
    pub map_units_per_pixel: f64,
    pub rotation_deg: f64,
    pub width_px: f64,
    pub height_px: f64,
}

impl MapToPixel {
    pub fn new(center: DVec2, map_units_per_pixel: f64, width_px: f64, height_px: f64) -> Self {
        Self {
            center,
            map_units_per_pixel,
            rotation_deg: 0.0,
            width_px,
            height_px,
        }
    }

    pub fn viewport(&self) -> DVec2 {
        DVec2::new(self.width_px, self.height_px)
    }

    fn check(&self) -> Result<(), ProjectionError> {
        if !(self.map_units_per_pixel.is_finite() && self.map_units_per_pixel > 0.0) {
            return Err(ProjectionError::DegenerateTransform(format!(
                "map units per pixel must be positive, got {}",
                self.map_units_per_pixel
            )));
        }
        if !self.center.is_finite() || !self.rotation_deg.is_finite() {
            return Err(ProjectionError::DegenerateTransform(
                "center and rotation must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn transform(&self, p: DVec2) -> Result<DVec2, ProjectionError> {
        self.check()?;
        let d = p - self.center;
        let (s, c) = self.rotation_deg.to_radians().sin_cos();
        // clockwise rotation on screen
        let r = DVec2::new(d.x * c + d.y * s, -d.x * s + d.y * c);
        Ok(DVec2::new(
            0.5 * self.width_px + r.x / self.map_units_per_pixel,
            0.5 * self.height_px - r.y / self.map_units_per_pixel,
        ))
    }
}

/// Pipeline of one canvas state.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasProjection {
    pub layer_crs: Crs,
    pub display_crs: Crs,
    pub map_to_pixel: MapToPixel,
}

impl CanvasProjection {
    pub fn new(layer_crs: Crs, display_crs: Crs, map_to_pixel: MapToPixel) -> Self {
        Self {
            layer_crs,
            display_crs,
            map_to_pixel,
        }
    }

    /// Canvas in `display_crs` centered on a geographic point.
    pub fn centered_on(
        center: GeoPoint,
        layer_crs: Crs,
        display_crs: Crs,
        map_units_per_pixel: f64,
        viewport: DVec2,
    ) -> Result<Self, ProjectionError> {
        let c = display_crs.from_wgs84(center)?;
        Ok(Self::new(
            layer_crs,
            display_crs,
            MapToPixel::new(c, map_units_per_pixel, viewport.x, viewport.y),
        ))
    }
}

impl ProjectionPipeline for CanvasProjection {
    fn to_wgs84(&self, layer_point: DVec2) -> Result<GeoPoint, ProjectionError> {
        self.layer_crs.to_wgs84(layer_point)
    }

    fn to_display_crs(&self, geo: GeoPoint) -> Result<DVec2, ProjectionError> {
        self.display_crs.from_wgs84(geo)
    }

    fn project(&self, display_point: DVec2) -> Result<DVec2, ProjectionError> {
        self.map_to_pixel.transform(display_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_center_maps_to_viewport_center() {
        let m = MapToPixel::new(DVec2::new(100.0, 200.0), 2.0, 800.0, 600.0);
        let px = m.transform(DVec2::new(100.0, 200.0)).unwrap();
        assert!((px - DVec2::new(400.0, 300.0)).length() < EPS);
    }

    #[test]
    fn test_north_is_up_east_is_right() {
        let m = MapToPixel::new(DVec2::ZERO, 10.0, 800.0, 600.0);
        let north = m.transform(DVec2::new(0.0, 100.0)).unwrap();
        assert!((north - DVec2::new(400.0, 290.0)).length() < EPS);
        let east = m.transform(DVec2::new(100.0, 0.0)).unwrap();
        assert!((east - DVec2::new(410.0, 300.0)).length() < EPS);
    }

    #[test]
    fn test_rotation_turns_map_clockwise() {
        let mut m = MapToPixel::new(DVec2::ZERO, 1.0, 200.0, 200.0);
        m.rotation_deg = 90.0;
        // north now points to the right of the screen
        let north = m.transform(DVec2::new(0.0, 10.0)).unwrap();
        assert!((north - DVec2::new(110.0, 100.0)).length() < 1e-9);
    }

    #[test]
    fn test_degenerate_scale_rejected() {
        let m = MapToPixel::new(DVec2::ZERO, 0.0, 100.0, 100.0);
        assert!(matches!(
            m.transform(DVec2::ZERO),
            Err(ProjectionError::DegenerateTransform(_))
        ));
    }

    #[test]
    fn test_pipeline_chains_transforms() {
        let center = GeoPoint::new(7.0, 47.0);
        let projection = CanvasProjection::centered_on(
            center,
            Crs::Wgs84,
            Crs::WebMercator,
            10.0,
            DVec2::new(1000.0, 800.0),
        )
        .unwrap();
        let px = projection.geo_to_pixel(center).unwrap();
        assert!((px - DVec2::new(500.0, 400.0)).length() < 1e-6);
        let geo = projection.to_wgs84(DVec2::new(7.0, 47.0)).unwrap();
        assert_eq!(geo, center);
    }
}
