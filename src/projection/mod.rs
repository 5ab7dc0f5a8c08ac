//! Projection pipeline
//!
//! The engine never projects on its own: hosts inject a [`ProjectionPipeline`]
//! that carries geographic points into their display frame. A reference
//! implementation for EPSG:4326 / EPSG:3857 canvases lives in [`canvas`].

pub mod canvas;
pub mod crs;

pub use canvas::{CanvasProjection, MapToPixel};
pub use crs::Crs;

use bevy::math::DVec2;

use crate::core::coordinates::GeoPoint;
use crate::overlay::geometry::{OverlayGeometry, OverlayLabel, PathKind};

/// Shortest pixel stroke whose direction is trusted as-is
const MIN_TANGENT_PX: f64 = 1e-6;
/// Pixel reach of the stretched stroke before its direction is read
const STRETCH_REACH_PX: f64 = 1.0;
const MAX_STRETCH_STEPS: usize = 64;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("unsupported CRS `{0}`")]
    UnsupportedCrs(String),
    #[error("point ({x}, {y}) lies outside the domain of {crs}")]
    OutOfDomain { crs: String, x: f64, y: f64 },
    #[error("degenerate map-to-pixel transform: {0}")]
    DegenerateTransform(String),
}

/// Host-supplied chain layer CRS -> WGS84 -> display CRS -> device pixels.
///
/// Implementations must be deterministic for a fixed canvas state.
pub trait ProjectionPipeline {
    fn to_wgs84(&self, layer_point: DVec2) -> Result<GeoPoint, ProjectionError>;

    fn to_display_crs(&self, geo: GeoPoint) -> Result<DVec2, ProjectionError>;

    fn project(&self, display_point: DVec2) -> Result<DVec2, ProjectionError>;

    fn geo_to_pixel(&self, geo: GeoPoint) -> Result<DVec2, ProjectionError> {
        self.project(self.to_display_crs(geo)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPath {
    pub kind: PathKind,
    pub points: Vec<DVec2>,
}

impl ProjectedPath {
    pub fn is_closed(&self) -> bool {
        self.kind.is_closed()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLabel {
    /// Outer tick endpoint in pixels
    pub anchor: DVec2,
    /// Unit vector pointing away from the tick stroke, pixel space
    pub tangent: DVec2,
    pub text: String,
}

impl ProjectedLabel {
    /// Where to center text of the given rendered width so it clears the stroke.
    pub fn text_center(&self, text_width_px: f64) -> DVec2 {
        self.anchor + self.tangent * 0.6 * text_width_px
    }
}

/// Pixel-space overlay for one render pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectedGeometry {
    pub paths: Vec<ProjectedPath>,
    pub labels: Vec<ProjectedLabel>,
}

/// Project every path and label, or fail on the first point that cannot be
/// projected. No partial output is returned.
pub fn project_geometry<P: ProjectionPipeline + ?Sized>(
    geometry: &OverlayGeometry,
    projection: &P,
) -> Result<ProjectedGeometry, ProjectionError> {
    let paths = geometry
        .paths
        .iter()
        .map(|path| {
            let points = path
                .points
                .iter()
                .map(|p| projection.geo_to_pixel(*p))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ProjectedPath {
                kind: path.kind,
                points,
            })
        })
        .collect::<Result<Vec<_>, ProjectionError>>()?;

    let labels = geometry
        .labels
        .iter()
        .map(|label| project_label(label, projection))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProjectedGeometry { paths, labels })
}

fn project_label<P: ProjectionPipeline + ?Sized>(
    label: &OverlayLabel,
    projection: &P,
) -> Result<ProjectedLabel, ProjectionError> {
    let anchor = projection.geo_to_pixel(label.anchor)?;
    let tail = projection.geo_to_pixel(label.tail)?;
    let d = anchor - tail;
    let tangent = if d.length() > MIN_TANGENT_PX {
        d.normalize()
    } else {
        collapsed_tangent(label, projection, anchor)?
    };
    Ok(ProjectedLabel {
        anchor,
        tangent,
        text: label.text.clone(),
    })
}

/// Pixel direction of a stroke too short to resolve at this scale.
///
/// The stroke direction is taken in display units, then stretched until
/// `project` separates it from the anchor, so canvas rotation and scale
/// both apply.
fn collapsed_tangent<P: ProjectionPipeline + ?Sized>(
    label: &OverlayLabel,
    projection: &P,
    anchor_px: DVec2,
) -> Result<DVec2, ProjectionError> {
    let anchor = projection.to_display_crs(label.anchor)?;
    let tail = projection.to_display_crs(label.tail)?;
    let stroke = anchor - tail;
    if stroke.length() > 0.0 {
        let dir = stroke.normalize();
        let mut reach = 1.0;
        for _ in 0..MAX_STRETCH_STEPS {
            let d = projection.project(anchor + dir * reach)? - anchor_px;
            if !d.is_finite() {
                break;
            }
            if d.length() >= STRETCH_REACH_PX {
                return Ok(d.normalize());
            }
            reach *= 16.0;
        }
    }
    // unrotated east/north frame, flipped into y-down pixels
    let t = label.local_tangent();
    Ok(DVec2::new(t.x, -t.y))
}
