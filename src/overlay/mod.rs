//! PS overlay geometry: parameters in, geographic paths and labels out.

pub mod builder;
pub mod geometry;
pub mod params;
pub mod style;

pub use builder::{GeometryBuilder, PsOverlayBuilder, build, format_km};
pub use geometry::{GeoBounds, OverlayGeometry, OverlayLabel, OverlayPath, PathKind};
pub use params::{LegFamily, LegSpec, OverlayParams, RingSpec, TickRule};
pub use style::{OverlayStyle, Rgba};
