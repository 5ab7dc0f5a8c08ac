//! Rendering adapter
//!
//! [`render_overlay`] projects a built overlay through the host pipeline and
//! hands pixel-space strokes and labels to an [`OverlayCanvas`]. The Bevy
//! adapter in [`gizmo`] and [`plugin`] is one such canvas.

pub mod gizmo;
pub mod plugin;

pub use gizmo::{GizmoCanvas, PlacedLabel};
pub use plugin::{ActiveOverlay, CanvasView, OverlayGeometryCache, OverlayPsPlugin};

use bevy::math::DVec2;

use crate::error::OverlayError;
use crate::overlay::geometry::OverlayGeometry;
use crate::overlay::style::OverlayStyle;
use crate::projection::{ProjectionPipeline, project_geometry};

/// Average glyph advance as a fraction of the font size
const GLYPH_ADVANCE: f64 = 0.6;

/// Drawing surface in device pixels (origin top-left, y down).
pub trait OverlayCanvas {
    fn stroke(&mut self, points: &[DVec2], closed: bool, style: &OverlayStyle);

    /// Draw `text` centered on `center`.
    fn text(&mut self, center: DVec2, text: &str, style: &OverlayStyle);

    /// Rendered width of `text` in pixels.
    fn text_width(&self, text: &str, style: &OverlayStyle) -> f64 {
        GLYPH_ADVANCE * style.font_size as f64 * text.chars().count() as f64
    }
}

/// Draw `geometry` onto `canvas`.
///
/// Every point is projected before anything is drawn, so a projection
/// failure leaves the canvas untouched.
pub fn render_overlay<C, P>(
    canvas: &mut C,
    geometry: &OverlayGeometry,
    projection: &P,
    style: &OverlayStyle,
) -> Result<(), OverlayError>
where
    C: OverlayCanvas + ?Sized,
    P: ProjectionPipeline + ?Sized,
{
    let projected = project_geometry(geometry, projection)?;

    for path in &projected.paths {
        canvas.stroke(&path.points, path.is_closed(), style);
    }
    for label in &projected.labels {
        let width = canvas.text_width(&label.text, style);
        canvas.text(label.text_center(width), &label.text, style);
    }
    Ok(())
}
