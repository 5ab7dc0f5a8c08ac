//! Bevy plugin drawing the active overlay layer

use bevy::math::DVec2;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::layer::OverlayLayerState;
use crate::overlay::builder::build;
use crate::overlay::geometry::OverlayGeometry;
use crate::projection::CanvasProjection;
use crate::render::gizmo::{GizmoCanvas, PlacedLabel};
use crate::render::render_overlay;

/// Plugin for overlay rebuild and gizmo rendering
pub struct OverlayPsPlugin;

impl Plugin for OverlayPsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OverlayConfig>()
            .init_resource::<OverlayGeometryCache>()
            .init_resource::<PlacedLabels>()
            .add_systems(Startup, init_overlay_system)
            .add_systems(
                Update,
                (
                    sync_viewport_system,
                    rebuild_overlay_system,
                    apply_gizmo_style_system,
                    draw_overlay_system,
                    sync_label_text_system,
                )
                    .chain(),
            );
    }
}

/// The layer currently shown
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ActiveOverlay(pub OverlayLayerState);

/// Canvas state the overlay is projected onto
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CanvasView {
    pub projection: CanvasProjection,
}

/// Last build result; `geometry` is `None` while the layer cannot be built.
#[derive(Resource, Debug, Default)]
pub struct OverlayGeometryCache {
    pub geometry: Option<OverlayGeometry>,
    pub last_error: Option<OverlayError>,
}

/// Labels placed by the last draw, in world units
#[derive(Resource, Debug, Default, PartialEq)]
pub struct PlacedLabels(pub Vec<PlacedLabel>);

/// Marker for label text entities owned by the plugin
#[derive(Component)]
pub struct OverlayLabelText;

/// Insert the startup layer and a canvas centered on it, unless the app
/// already provided them.
fn init_overlay_system(
    mut commands: Commands,
    config: Res<OverlayConfig>,
    overlay: Option<Res<ActiveOverlay>>,
    view: Option<Res<CanvasView>>,
) {
    let state = overlay
        .map(|o| o.0.clone())
        .unwrap_or_else(|| config.initial_layer());

    if view.is_none() {
        let projection = state
            .crs
            .to_wgs84(state.center)
            .and_then(|center| config.canvas.projection(state.crs.clone(), center))
            .unwrap_or_else(|e| {
                warn!("Cannot center canvas on overlay `{}`: {}", state.title, e);
                config.canvas.fallback_projection(state.crs.clone())
            });
        commands.insert_resource(CanvasView { projection });
    }

    info!(
        "[INIT] Overlay `{}` at {:?} ({}), azimuth {}°",
        state.title, state.center, state.crs, state.azimuth
    );
    commands.insert_resource(ActiveOverlay(state));
}

/// Keep the canvas viewport in step with the primary window size
fn sync_viewport_system(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut view: ResMut<CanvasView>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let size = DVec2::new(window.width() as f64, window.height() as f64);
    if size.x <= 0.0 || size.y <= 0.0 {
        return;
    }
    if view.projection.map_to_pixel.viewport() != size {
        let m = &mut view.projection.map_to_pixel;
        m.width_px = size.x;
        m.height_px = size.y;
    }
}

/// Rebuild geometry whenever the layer, the canvas or the config changes.
///
/// The canvas pipeline is re-bound to the layer CRS first, so the layer
/// center is always read in the units it was stored in.
pub fn rebuild_overlay_system(
    overlay: Res<ActiveOverlay>,
    config: Res<OverlayConfig>,
    mut view: ResMut<CanvasView>,
    mut cache: ResMut<OverlayGeometryCache>,
) {
    if !overlay.is_changed() && !config.is_changed() && !view.is_changed() {
        return;
    }

    if view.projection.layer_crs != overlay.0.crs {
        debug!(
            "Re-binding canvas layer CRS {} -> {}",
            view.projection.layer_crs, overlay.0.crs
        );
        view.projection.layer_crs = overlay.0.crs.clone();
    }

    let result = overlay
        .0
        .to_params(&view.projection, &config)
        .and_then(|params| build(&params));
    match result {
        Ok(geometry) => {
            info!(
                "Rebuilt overlay `{}`: {} paths, {} labels",
                overlay.0.title,
                geometry.paths.len(),
                geometry.labels.len()
            );
            cache.geometry = Some(geometry);
            cache.last_error = None;
        }
        Err(e) => {
            warn!("Failed to build overlay `{}`: {}", overlay.0.title, e);
            cache.geometry = None;
            cache.last_error = Some(e);
        }
    }
}

/// Push the layer line width into the default gizmo config
fn apply_gizmo_style_system(
    overlay: Res<ActiveOverlay>,
    mut config_store: ResMut<GizmoConfigStore>,
) {
    if !overlay.is_changed() {
        return;
    }
    let (gizmo_config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    gizmo_config.line.width = overlay.0.line_width.max(1) as f32;
}

/// Draw the cached geometry every frame
fn draw_overlay_system(
    mut gizmos: Gizmos,
    overlay: Res<ActiveOverlay>,
    view: Res<CanvasView>,
    mut cache: ResMut<OverlayGeometryCache>,
    mut placed: ResMut<PlacedLabels>,
) {
    let cache = &mut *cache;
    let Some(geometry) = cache.geometry.as_ref() else {
        if !placed.0.is_empty() {
            placed.0.clear();
        }
        return;
    };

    let style = overlay.0.style();
    let viewport = view.projection.map_to_pixel.viewport();
    let mut canvas = GizmoCanvas::new(&mut gizmos, viewport);
    let labels = match render_overlay(&mut canvas, geometry, &view.projection, &style) {
        Ok(()) => {
            if cache.last_error.is_some() {
                cache.last_error = None;
            }
            canvas.into_labels()
        }
        Err(e) => {
            if cache.last_error.as_ref() != Some(&e) {
                warn!("Failed to render overlay `{}`: {}", overlay.0.title, e);
                cache.last_error = Some(e);
            }
            Vec::new()
        }
    };
    if placed.0 != labels {
        placed.0 = labels;
    }
}

/// Respawn label text entities when the placed labels change
fn sync_label_text_system(
    mut commands: Commands,
    placed: Res<PlacedLabels>,
    existing: Query<Entity, With<OverlayLabelText>>,
) {
    if !placed.is_changed() {
        return;
    }
    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }
    for label in &placed.0 {
        commands.spawn((
            Text2d::new(label.text.clone()),
            TextFont {
                font_size: label.font_size,
                ..default()
            },
            TextColor(label.color),
            Transform::from_translation(label.position.extend(1.0)),
            OverlayLabelText,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coordinates::GeoPoint;
    use crate::projection::Crs;

    fn app_with(state: OverlayLayerState) -> App {
        let config = OverlayConfig::default();
        let projection = config
            .canvas
            .projection(Crs::Wgs84, GeoPoint::new(7.0, 47.0))
            .unwrap();
        let mut app = App::new();
        app.insert_resource(config)
            .insert_resource(ActiveOverlay(state))
            .insert_resource(CanvasView { projection })
            .init_resource::<OverlayGeometryCache>()
            .add_systems(Update, rebuild_overlay_system);
        app
    }

    #[test]
    fn test_rebuild_fills_cache() {
        let mut app = app_with(OverlayLayerState::setup(
            DVec2::new(7.0, 47.0),
            Crs::Wgs84,
            22.5,
        ));
        app.update();

        let cache = app.world().resource::<OverlayGeometryCache>();
        let geometry = cache.geometry.as_ref().expect("geometry after first update");
        assert_eq!(geometry.paths.len(), 35);
        assert!(cache.last_error.is_none());
    }

    #[test]
    fn test_rebuild_records_error() {
        let mut state = OverlayLayerState::setup(DVec2::new(7.0, 47.0), Crs::Wgs84, 0.0);
        state.azimuth = f64::NAN;
        let mut app = app_with(state);
        app.update();

        let cache = app.world().resource::<OverlayGeometryCache>();
        assert!(cache.geometry.is_none());
        assert!(matches!(
            cache.last_error,
            Some(OverlayError::InvalidParams { .. })
        ));
    }

    #[test]
    fn test_rebuild_follows_layer_changes() {
        let mut app = app_with(OverlayLayerState::setup(
            DVec2::new(7.0, 47.0),
            Crs::Wgs84,
            0.0,
        ));
        app.update();
        let before = app
            .world()
            .resource::<OverlayGeometryCache>()
            .geometry
            .clone();

        app.world_mut().resource_mut::<ActiveOverlay>().0.azimuth = 45.0;
        app.update();
        let after = app
            .world()
            .resource::<OverlayGeometryCache>()
            .geometry
            .clone();
        assert!(before.is_some() && after.is_some());
        assert_ne!(before, after);
    }

    #[test]
    fn test_rebuild_follows_layer_crs_change() {
        let mut app = app_with(OverlayLayerState::setup(
            DVec2::new(7.0, 47.0),
            Crs::Wgs84,
            0.0,
        ));
        app.update();

        let mercator = Crs::WebMercator
            .from_wgs84(GeoPoint::new(7.0, 47.0))
            .unwrap();
        {
            let mut overlay = app.world_mut().resource_mut::<ActiveOverlay>();
            overlay.0.crs = Crs::WebMercator;
            overlay.0.center = mercator;
        }
        app.update();

        let world = app.world();
        assert_eq!(
            world.resource::<CanvasView>().projection.layer_crs,
            Crs::WebMercator
        );
        let cache = world.resource::<OverlayGeometryCache>();
        assert!(cache.last_error.is_none(), "{:?}", cache.last_error);
        let geometry = cache.geometry.as_ref().expect("geometry after CRS change");
        // main axis still starts at (7, 47)
        let start = geometry.paths[1].points[0];
        assert!((start.lon - 7.0).abs() < 1e-9);
        assert!((start.lat - 47.0).abs() < 1e-9);
    }

    #[test]
    fn test_degree_center_not_read_as_meters_after_crs_change() {
        let mercator = Crs::WebMercator
            .from_wgs84(GeoPoint::new(7.0, 47.0))
            .unwrap();
        let mut app = app_with(OverlayLayerState::setup(mercator, Crs::WebMercator, 0.0));
        app.update();

        {
            let mut overlay = app.world_mut().resource_mut::<ActiveOverlay>();
            overlay.0.crs = Crs::Wgs84;
            overlay.0.center = DVec2::new(7.0, 47.0);
        }
        app.update();

        let cache = app.world().resource::<OverlayGeometryCache>();
        let geometry = cache.geometry.as_ref().expect("geometry after CRS change");
        let start = geometry.paths[1].points[0];
        assert!((start.lon - 7.0).abs() < 1e-9);
        assert!((start.lat - 47.0).abs() < 1e-9);
    }
}
