//! # AR Overlay
//!
//! Augmented-reality lane overlay renderer for in-vehicle guidance.
//!
//! ## Features
//!
//! - **Camera Projection**: view-projection matrices from camera FOV, pose and display aspect
//! - **Route Transform**: vehicle-frame route points remapped into the Y-up render frame
//! - **Frame Composition**: textured video background plus a lit, depth-tested lane ribbon
//! - **Backend Abstraction**: any [`render::RenderBackend`] can host the pipeline; a headless
//!   software rasterizer ships in [`backends::software`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ar_overlay::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OverlayConfig::default();
//!     let provider = Arc::new(SharedArData::new());
//!     let mut renderer = ArRenderer::new(SoftwareBackend::new(), provider.clone(), &config)?;
//!
//!     renderer.on_surface_created()?;
//!     renderer.on_surface_changed(1280, 720);
//!
//!     let outcome = renderer.on_draw_frame()?;
//!     log::info!("frame: {:?}", outcome);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod render;
pub mod backends;

/// Common imports for overlay users
pub mod prelude {
    pub use crate::{
        backends::software::SoftwareBackend,
        config::{Config, ConfigError, OverlayConfig},
        foundation::math::{Mat3, Mat4, Rotation, Vec3},
        render::{
            ArCamera, ArDataProvider, ArRenderer, ArSnapshot, CameraParameters, ClipPlanes, Color,
            ConfigurationError, FrameOutcome, LaneVisualParams, RenderBackend, RenderError,
            RenderResult, RenderSetupError, RendererState, SharedArData, VideoFrameSink, VideoStats,
        },
    };
}
