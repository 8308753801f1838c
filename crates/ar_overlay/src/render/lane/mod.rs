//! AR lane overlay
//!
//! Styling parameters, ribbon mesh generation and the layer that draws the
//! lit lane over the camera background.

pub mod layer;
pub mod params;
pub mod ribbon;

pub use layer::LaneLayer;
pub use params::{Color, LaneVisualParams};
pub use ribbon::build_ribbon;
