//! Coordinate space boundaries between device pixels and Bevy 2D world space.

use bevy::math::{DVec2, Vec2};

/// Convert a device pixel (origin top-left, y down, f64) to Bevy 2D world
/// units (origin at viewport center, y up, f32).
/// Mapping: world = (px.x - w/2, h/2 - px.y)
pub fn pixel_to_world(pixel: DVec2, viewport_px: DVec2) -> Vec2 {
    Vec2::new(
        (pixel.x - 0.5 * viewport_px.x) as f32,
        (0.5 * viewport_px.y - pixel.y) as f32,
    )
}
