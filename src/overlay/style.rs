//! Overlay style attributes
//!
//! Carried through the builder untouched; only the render adapter reads them.

use bevy::prelude::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 8-bit RGBA color, encoded on layer descriptors as `"r,g,b,a"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Encoded `"r,g,b,a"` form
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Bevy color with the layer opacity folded into alpha.
    pub fn to_color(self, opacity: f32) -> Color {
        let alpha = (self.a as f32 / 255.0) * opacity.clamp(0.0, 1.0);
        Color::srgba_u8(self.r, self.g, self.b, (alpha * 255.0).round() as u8)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.r, self.g, self.b, self.a)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color `{0}`")]
pub struct ColorParseError(pub String);

impl FromStr for Rgba {
    type Err = ColorParseError;

    /// Accepts `"r,g,b,a"` and `"r,g,b"` (opaque).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ColorParseError(s.to_string()))?;
        match parts.as_slice() {
            [r, g, b] => Ok(Rgba::new(*r, *g, *b, 255)),
            [r, g, b, a] => Ok(Rgba::new(*r, *g, *b, *a)),
            _ => Err(ColorParseError(s.to_string())),
        }
    }
}

/// Stroke and text style for one overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub color: Rgba,
    /// Stroke width in pixels
    pub line_width: u32,
    /// Label font size in pixels
    pub font_size: u32,
    /// 0 (opaque) to 100 (invisible)
    pub transparency: u8,
}

impl OverlayStyle {
    pub fn opacity(&self) -> f32 {
        (100.0 - self.transparency.min(100) as f32) / 100.0
    }

    pub fn color(&self) -> Color {
        self.color.to_color(self.opacity())
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            line_width: 3,
            font_size: 10,
            transparency: 0,
        }
    }
}
