//! Persisted state of one overlay layer
//!
//! The host stores layers as flat key/value attributes. This module owns the
//! attribute names and their encoding; the host owns where they are kept.

use bevy::log::debug;
use bevy::math::DVec2;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::overlay::builder::GeometryBuilder;
use crate::overlay::geometry::GeoBounds;
use crate::overlay::params::OverlayParams;
use crate::overlay::style::{OverlayStyle, Rgba};
use crate::projection::{Crs, ProjectionPipeline};

/// Layer type id written to the `name` attribute
pub const LAYER_TYPE: &str = "overlayps";

pub const ATTR_TYPE: &str = "type";
pub const ATTR_NAME: &str = "name";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_TRANSPARENCY: &str = "transparency";
pub const ATTR_X: &str = "x";
pub const ATTR_Y: &str = "y";
pub const ATTR_AZIMUTH: &str = "azimut";
pub const ATTR_CRS: &str = "crs";
pub const ATTR_COLOR: &str = "color";
pub const ATTR_LINE_WIDTH: &str = "lineWidth";
pub const ATTR_FONT_SIZE: &str = "fontSize";

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayerState {
    pub title: String,
    /// 0 (opaque) to 100 (invisible)
    pub transparency: u8,
    /// Center in `crs` units
    pub center: DVec2,
    pub azimuth: f64,
    pub crs: Crs,
    pub color: Rgba,
    pub line_width: u32,
    pub font_size: u32,
}

impl Default for OverlayLayerState {
    fn default() -> Self {
        let style = OverlayStyle::default();
        Self {
            title: "OverlayPS".to_string(),
            transparency: style.transparency,
            center: DVec2::ZERO,
            azimuth: 22.5,
            crs: Crs::Wgs84,
            color: style.color,
            line_width: style.line_width,
            font_size: style.font_size,
        }
    }
}

impl OverlayLayerState {
    /// Place a fresh layer; style and title keep their defaults.
    pub fn setup(center: DVec2, crs: Crs, azimuth: f64) -> Self {
        Self {
            center,
            crs,
            azimuth,
            ..Self::default()
        }
    }

    pub fn style(&self) -> OverlayStyle {
        OverlayStyle {
            color: self.color,
            line_width: self.line_width,
            font_size: self.font_size,
            transparency: self.transparency,
        }
    }

    pub fn set_style(&mut self, style: &OverlayStyle) {
        self.color = style.color;
        self.line_width = style.line_width;
        self.font_size = style.font_size;
        self.transparency = style.transparency;
    }

    pub fn opacity(&self) -> f32 {
        self.style().opacity()
    }

    /// Build parameters for this layer, with the center carried to WGS84
    /// through the host pipeline.
    pub fn to_params<P: ProjectionPipeline + ?Sized>(
        &self,
        pipeline: &P,
        config: &OverlayConfig,
    ) -> Result<OverlayParams, OverlayError> {
        let center = pipeline.to_wgs84(self.center)?;
        Ok(config
            .params(center, self.azimuth)
            .with_style(self.style()))
    }

    /// Geographic extent of the drawn pattern.
    pub fn extent<B: GeometryBuilder + ?Sized, P: ProjectionPipeline + ?Sized>(
        &self,
        builder: &B,
        pipeline: &P,
        config: &OverlayConfig,
    ) -> Result<GeoBounds, OverlayError> {
        let geometry = builder.build(&self.to_params(pipeline, config)?)?;
        geometry
            .bounds()
            .ok_or_else(|| OverlayError::invalid_params("overlay produced no geometry"))
    }

    /// Flat attribute form, including the layer `type` and `name` tags.
    pub fn to_attributes(&self) -> BTreeMap<String, String> {
        [
            (ATTR_TYPE, "plugin".to_string()),
            (ATTR_NAME, LAYER_TYPE.to_string()),
            (ATTR_TITLE, self.title.clone()),
            (ATTR_TRANSPARENCY, self.transparency.to_string()),
            (ATTR_X, self.center.x.to_string()),
            (ATTR_Y, self.center.y.to_string()),
            (ATTR_AZIMUTH, self.azimuth.to_string()),
            (ATTR_CRS, self.crs.authid().to_string()),
            (ATTR_COLOR, self.color.encode()),
            (ATTR_LINE_WIDTH, self.line_width.to_string()),
            (ATTR_FONT_SIZE, self.font_size.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Restore from attributes written by [`Self::to_attributes`].
    ///
    /// `type` is ignored; a `name` other than [`LAYER_TYPE`] is rejected.
    pub fn from_attributes(attrs: &BTreeMap<String, String>) -> Result<Self, OverlayError> {
        if let Some(name) = attrs.get(ATTR_NAME)
            && name != LAYER_TYPE
        {
            return Err(invalid(ATTR_NAME, name));
        }

        let transparency: u8 = parse(attrs, ATTR_TRANSPARENCY)?;
        if transparency > 100 {
            return Err(invalid(ATTR_TRANSPARENCY, &transparency.to_string()));
        }
        let x: f64 = parse_finite(attrs, ATTR_X)?;
        let y: f64 = parse_finite(attrs, ATTR_Y)?;
        let azimuth: f64 = parse_finite(attrs, ATTR_AZIMUTH)?;
        let crs_id = require(attrs, ATTR_CRS)?;
        if crs_id.trim().is_empty() {
            return Err(invalid(ATTR_CRS, crs_id));
        }

        let state = Self {
            title: require(attrs, ATTR_TITLE)?.clone(),
            transparency,
            center: DVec2::new(x, y),
            azimuth,
            crs: Crs::from_authid(crs_id),
            color: parse(attrs, ATTR_COLOR)?,
            line_width: parse(attrs, ATTR_LINE_WIDTH)?,
            font_size: parse(attrs, ATTR_FONT_SIZE)?,
        };
        debug!("Restored overlay layer `{}` at {:?} ({})", state.title, state.center, state.crs);
        Ok(state)
    }
}

fn require<'a>(attrs: &'a BTreeMap<String, String>, key: &str) -> Result<&'a String, OverlayError> {
    attrs
        .get(key)
        .ok_or_else(|| OverlayError::MissingAttribute(key.to_string()))
}

fn invalid(key: &str, value: &str) -> OverlayError {
    OverlayError::InvalidAttribute {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(attrs: &BTreeMap<String, String>, key: &str) -> Result<T, OverlayError> {
    let raw = require(attrs, key)?;
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn parse_finite(attrs: &BTreeMap<String, String>, key: &str) -> Result<f64, OverlayError> {
    let value: f64 = parse(attrs, key)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(key, &require(attrs, key)?.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coordinates::GeoPoint;
    use crate::overlay::builder::PsOverlayBuilder;
    use crate::projection::{CanvasProjection, MapToPixel};

    fn sample_state() -> OverlayLayerState {
        OverlayLayerState {
            title: "Sector Alpha".to_string(),
            transparency: 40,
            center: DVec2::new(7.4474, 46.9480),
            azimuth: 123.25,
            crs: Crs::Wgs84,
            color: Rgba::new(255, 0, 0, 255),
            line_width: 2,
            font_size: 12,
        }
    }

    fn wgs84_canvas() -> CanvasProjection {
        CanvasProjection::new(
            Crs::Wgs84,
            Crs::Wgs84,
            MapToPixel::new(DVec2::ZERO, 1.0, 100.0, 100.0),
        )
    }

    #[test]
    fn test_defaults() {
        let state = OverlayLayerState::setup(DVec2::new(7.0, 47.0), Crs::Wgs84, 10.0);
        assert_eq!(state.title, "OverlayPS");
        assert_eq!(state.azimuth, 10.0);
        assert_eq!(state.color, Rgba::BLACK);
        assert_eq!(state.line_width, 3);
        assert_eq!(state.font_size, 10);
        assert_eq!(state.transparency, 0);
        assert_eq!(OverlayLayerState::default().azimuth, 22.5);
    }

    #[test]
    fn test_attributes_roundtrip() {
        let state = sample_state();
        let attrs = state.to_attributes();
        assert_eq!(attrs["type"], "plugin");
        assert_eq!(attrs["name"], "overlayps");
        assert_eq!(attrs["azimut"], "123.25");
        assert_eq!(attrs["color"], "255,0,0,255");
        assert_eq!(attrs["crs"], "EPSG:4326");
        assert_eq!(attrs["lineWidth"], "2");
        assert_eq!(attrs["fontSize"], "12");
        assert_eq!(attrs.len(), 11);

        let restored = OverlayLayerState::from_attributes(&attrs).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_unknown_crs_survives_roundtrip() {
        let mut state = sample_state();
        state.crs = Crs::from_authid("EPSG:2056");
        state.center = DVec2::new(2_600_000.0, 1_200_000.0);
        let restored = OverlayLayerState::from_attributes(&state.to_attributes()).unwrap();
        assert_eq!(restored.crs.authid(), "EPSG:2056");
        assert_eq!(restored.center, state.center);
    }

    #[test]
    fn test_missing_attribute() {
        let mut attrs = sample_state().to_attributes();
        attrs.remove("fontSize");
        assert_eq!(
            OverlayLayerState::from_attributes(&attrs).unwrap_err(),
            OverlayError::MissingAttribute("fontSize".to_string())
        );
    }

    #[test]
    fn test_invalid_attributes() {
        let cases = [
            ("azimut", "north"),
            ("x", "NaN"),
            ("transparency", "101"),
            ("color", "0,0"),
            ("lineWidth", "-1"),
            ("name", "otherlayer"),
        ];
        for (key, value) in cases {
            let mut attrs = sample_state().to_attributes();
            attrs.insert(key.to_string(), value.to_string());
            match OverlayLayerState::from_attributes(&attrs) {
                Err(OverlayError::InvalidAttribute { key: k, .. }) => assert_eq!(k, key),
                other => panic!("expected invalid `{key}`, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_to_params_uses_pipeline_and_style() {
        let state = sample_state();
        let params = state
            .to_params(&wgs84_canvas(), &OverlayConfig::default())
            .unwrap();
        assert!((params.center.lon - 7.4474).abs() < 1e-12);
        assert!((params.center.lat - 46.9480).abs() < 1e-12);
        assert_eq!(params.azimuth, 123.25);
        assert_eq!(params.style, state.style());
        assert!((state.opacity() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_to_params_propagates_projection_failure() {
        let mut state = sample_state();
        state.crs = Crs::from_authid("EPSG:2056");
        let pipeline = CanvasProjection::new(
            state.crs.clone(),
            Crs::Wgs84,
            MapToPixel::new(DVec2::ZERO, 1.0, 100.0, 100.0),
        );
        assert!(matches!(
            state.to_params(&pipeline, &OverlayConfig::default()),
            Err(OverlayError::ProjectionFailure(_))
        ));
    }

    #[test]
    fn test_extent_covers_pattern() {
        let state = OverlayLayerState::setup(DVec2::new(7.0, 47.0), Crs::Wgs84, 0.0);
        let bounds: GeoBounds = state
            .extent(&PsOverlayBuilder::default(), &wgs84_canvas(), &OverlayConfig::default())
            .unwrap();
        assert!(bounds.contains(GeoPoint::new(7.0, 47.0)));
        // 7 km main axis north and south: ~0.063° of latitude each way
        assert!(bounds.max.lat > 47.06 && bounds.min.lat < 46.94);
    }
}
