//! Core types shared across the crate: geographic points, angle helpers and
//! the boundary between device pixels and Bevy world space.

pub mod coordinates;
pub mod space;

pub use coordinates::{
    CoordError, GeoPoint, bearing_to_unit, normalize_bearing, normalize_longitude,
};
pub use space::pixel_to_world;
