//! Bevy gizmo canvas
//!
//! Strokes go straight to immediate-mode gizmo linestrips. Gizmos cannot draw
//! text, so labels are collected as [`PlacedLabel`]s and turned into `Text2d`
//! entities by the plugin.

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::core::space::pixel_to_world;
use crate::overlay::style::OverlayStyle;
use crate::render::OverlayCanvas;

/// Label position and look in Bevy 2D world units
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub position: Vec2,
    pub text: String,
    pub font_size: f32,
    pub color: Color,
}

pub struct GizmoCanvas<'a, 'w, 's> {
    gizmos: &'a mut Gizmos<'w, 's>,
    viewport: DVec2,
    labels: Vec<PlacedLabel>,
}

impl<'a, 'w, 's> GizmoCanvas<'a, 'w, 's> {
    /// `viewport` is the window size in pixels; the 2D camera is assumed to
    /// sit at the origin with unit scale.
    pub fn new(gizmos: &'a mut Gizmos<'w, 's>, viewport: DVec2) -> Self {
        Self {
            gizmos,
            viewport,
            labels: Vec::new(),
        }
    }

    pub fn into_labels(self) -> Vec<PlacedLabel> {
        self.labels
    }
}

impl OverlayCanvas for GizmoCanvas<'_, '_, '_> {
    fn stroke(&mut self, points: &[DVec2], closed: bool, style: &OverlayStyle) {
        if points.len() < 2 {
            return;
        }
        self.gizmos
            .linestrip_2d(world_strip(points, closed, self.viewport), style.color());
    }

    fn text(&mut self, center: DVec2, text: &str, style: &OverlayStyle) {
        self.labels.push(PlacedLabel {
            position: pixel_to_world(center, self.viewport),
            text: text.to_string(),
            font_size: style.font_size as f32,
            color: style.color(),
        });
    }
}

/// Pixel polyline to world-space strip; closed strips repeat the first point.
fn world_strip(points: &[DVec2], closed: bool, viewport: DVec2) -> Vec<Vec2> {
    let mut strip: Vec<Vec2> = points
        .iter()
        .map(|p| pixel_to_world(*p, viewport))
        .collect();
    if closed && let Some(first) = strip.first().copied() {
        strip.push(first);
    }
    strip
}
