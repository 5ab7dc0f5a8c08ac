//! Search pattern ("PS") overlay for map canvases.
//!
//! Builds a ring, a main axis and a flight-line grid around a center point
//! from WGS84 geodesics, projects them through a host-supplied pipeline and
//! draws them with Bevy gizmos.

pub mod config;
pub mod core;
pub mod error;
pub mod geodesy;
pub mod layer;
pub mod overlay;
pub mod projection;
pub mod render;

pub use config::OverlayConfig;
pub use error::OverlayError;
pub use layer::OverlayLayerState;
pub use overlay::{GeometryBuilder, OverlayGeometry, OverlayParams, PsOverlayBuilder, build};
pub use projection::ProjectionPipeline;
pub use render::OverlayPsPlugin;
