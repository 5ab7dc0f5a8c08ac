//! Overlay configuration
//!
//! Loaded once at startup from the platform config directory:
//! - macOS: ~/Library/Application Support/overlayps/config.json
//! - Linux: ~/.config/overlayps/config.json
//! - Windows: %APPDATA%\overlayps\config\config.json
//!
//! Every field has a default, so a partial file (or none at all) is fine.

use bevy::math::DVec2;
use bevy::prelude::Resource;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::coordinates::GeoPoint;
use crate::layer::OverlayLayerState;
use crate::overlay::params::{
    DEFAULT_FLIGHT_LINE_LENGTH_M, DEFAULT_MAIN_AXIS_LENGTH_M, DEFAULT_RING_RADIUS_M,
    DEFAULT_TICK_HALF_LENGTH_M, LegFamily, OverlayParams, RING_SAMPLES,
};
use crate::overlay::style::OverlayStyle;
use crate::projection::{CanvasProjection, Crs, MapToPixel, ProjectionError};

const CONFIG_FILE: &str = "config.json";

/// Pattern dimensions applied to every build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub ring_radius_m: f64,
    pub ring_samples: usize,
    pub main_axis_length_m: f64,
    pub flight_line_length_m: f64,
    pub tick_half_length_m: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            ring_radius_m: DEFAULT_RING_RADIUS_M,
            ring_samples: RING_SAMPLES,
            main_axis_length_m: DEFAULT_MAIN_AXIS_LENGTH_M,
            flight_line_length_m: DEFAULT_FLIGHT_LINE_LENGTH_M,
            tick_half_length_m: DEFAULT_TICK_HALF_LENGTH_M,
        }
    }
}

/// Layer created when the viewer starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub title: String,
    /// Center in `crs` units
    pub x: f64,
    pub y: f64,
    pub azimuth: f64,
    pub crs: Crs,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            title: "OverlayPS".to_string(),
            x: 7.0,
            y: 47.0,
            azimuth: 22.5,
            crs: Crs::Wgs84,
        }
    }
}

/// Map canvas the overlay is drawn on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub display_crs: Crs,
    pub map_units_per_pixel: f64,
    pub rotation_deg: f64,
    pub width_px: f64,
    pub height_px: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            display_crs: Crs::WebMercator,
            // ~14 km pattern over ~700 px at mid latitudes
            map_units_per_pixel: 30.0,
            rotation_deg: 0.0,
            width_px: 1280.0,
            height_px: 720.0,
        }
    }
}

impl CanvasConfig {
    /// Canvas centered on `center`, transforming from `layer_crs`.
    pub fn projection(
        &self,
        layer_crs: Crs,
        center: GeoPoint,
    ) -> Result<CanvasProjection, ProjectionError> {
        let mut projection = CanvasProjection::centered_on(
            center,
            layer_crs,
            self.display_crs.clone(),
            self.map_units_per_pixel,
            DVec2::new(self.width_px, self.height_px),
        )?;
        projection.map_to_pixel.rotation_deg = self.rotation_deg;
        Ok(projection)
    }

    /// Canvas centered on the display CRS origin.
    pub fn fallback_projection(&self, layer_crs: Crs) -> CanvasProjection {
        let mut map_to_pixel = MapToPixel::new(
            DVec2::ZERO,
            self.map_units_per_pixel,
            self.width_px,
            self.height_px,
        );
        map_to_pixel.rotation_deg = self.rotation_deg;
        CanvasProjection::new(layer_crs, self.display_crs.clone(), map_to_pixel)
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub geometry: GeometryConfig,
    /// Style given to newly created layers
    pub style: OverlayStyle,
    pub layer: LayerConfig,
    pub canvas: CanvasConfig,
}

impl OverlayConfig {
    /// Resolve the platform config file path.
    pub fn default_path() -> Result<PathBuf, anyhow::Error> {
        let proj_dirs = ProjectDirs::from("", "", "overlayps")
            .ok_or_else(|| anyhow::anyhow!("Failed to resolve config directory"))?;
        Ok(proj_dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from the platform config directory, or defaults if no file exists.
    pub fn load() -> Result<Self, anyhow::Error> {
        Self::load_or_default(&Self::default_path()?)
    }

    /// Load from `path`, or defaults if the file does not exist.
    ///
    /// A file that exists but cannot be parsed is an error.
    pub fn load_or_default(path: &Path) -> Result<Self, anyhow::Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self, anyhow::Error> {
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: OverlayConfig = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), anyhow::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Build parameters for a pattern at `center`, with this config's
    /// dimensions and default style.
    pub fn params(&self, center: GeoPoint, azimuth: f64) -> OverlayParams {
        let g = &self.geometry;
        let mut params = OverlayParams::new(center, azimuth).with_style(self.style.clone());
        params.ring.radius_m = g.ring_radius_m;
        params.ring.samples = g.ring_samples;
        params.main_axis = LegFamily::main_axis(g.main_axis_length_m);
        params.flight_lines = LegFamily::flight_lines(g.flight_line_length_m);
        params.tick_half_length_m = g.tick_half_length_m;
        params
    }

    /// Layer state for the configured startup layer.
    pub fn initial_layer(&self) -> OverlayLayerState {
        let mut state = OverlayLayerState::setup(
            DVec2::new(self.layer.x, self.layer.y),
            self.layer.crs.clone(),
            self.layer.azimuth,
        );
        state.title = self.layer.title.clone();
        state.set_style(&self.style);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::style::Rgba;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(test_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "overlayps-config-{}-{}-{}",
            test_name,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = unique_temp_dir("missing").join(CONFIG_FILE);
        let config = OverlayConfig::load_or_default(&path).expect("load should succeed");
        assert_eq!(config, OverlayConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = unique_temp_dir("partial");
        fs::create_dir_all(&dir).expect("Failed to create dir");
        let path = dir.join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{ "geometry": { "ring_radius_m": 2000.0 }, "canvas": { "display_crs": "EPSG:4326" } }"#,
        )
        .expect("Failed to write config");

        let config = OverlayConfig::load_from(&path).expect("load should succeed");
        assert_eq!(config.geometry.ring_radius_m, 2000.0);
        assert_eq!(config.geometry.main_axis_length_m, 7000.0);
        assert_eq!(config.canvas.display_crs, Crs::Wgs84);
        assert_eq!(config.layer.title, "OverlayPS");
    }

    #[test]
    fn test_save_and_load() {
        let path = unique_temp_dir("save").join("nested").join(CONFIG_FILE);
        let mut config = OverlayConfig::default();
        config.style.color = Rgba::new(200, 0, 0, 255);
        config.layer.azimuth = 45.0;
        config.save_to(&path).expect("save should succeed");

        let loaded = OverlayConfig::load_or_default(&path).expect("load should succeed");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = unique_temp_dir("malformed");
        fs::create_dir_all(&dir).expect("Failed to create dir");
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, "{ not json").expect("Failed to write config");
        assert!(OverlayConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn test_params_apply_dimensions() {
        let mut config = OverlayConfig::default();
        config.geometry.flight_line_length_m = 4000.0;
        config.geometry.tick_half_length_m = 100.0;
        let params = config.params(GeoPoint::new(7.0, 47.0), 10.0);
        assert_eq!(params.flight_lines.length_m, 4000.0);
        assert_eq!(params.flight_lines.step_m, 500.0);
        assert_eq!(params.tick_half_length_m, 100.0);
        assert_eq!(params.ring.samples, 301);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_canvas_projection_centers_layer() {
        let config = OverlayConfig::default();
        let center = GeoPoint::new(7.0, 47.0);
        let projection = config.canvas.projection(Crs::Wgs84, center).unwrap();
        let px = crate::projection::ProjectionPipeline::geo_to_pixel(&projection, center).unwrap();
        assert!((px - DVec2::new(640.0, 360.0)).length() < 1e-6);
    }
}
