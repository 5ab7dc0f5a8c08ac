pub mod state;

pub use state::{LAYER_TYPE, OverlayLayerState};
