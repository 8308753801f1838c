//! Rendering system
//!
//! The AR overlay pipeline: camera projection, route coordinate transform, the
//! video background layer, the lit lane layer, and the orchestrator that
//! composites them once per frame.
//!
//! All GPU work goes through the [`RenderBackend`] trait, so the pipeline itself
//! never touches a concrete graphics API.

pub mod api;
pub mod background;
pub mod camera;
pub mod coordinates;
pub mod lane;
pub mod mesh;
pub mod provider;
pub mod renderer;
pub mod video;

pub use api::{
    BackendResult, ClearFlags, DepthFunc, DrawBindings, DrawCommand, LaneUniforms, MeshHandle,
    ProgramHandle, ProgramKind, RenderBackend, TextureHandle,
};
pub use background::BackgroundLayer;
pub use camera::{build_view_projection, ArCamera, CameraParameters, ClipPlanes};
pub use coordinates::{route_to_render_frame, to_render_frame, CoordinateError};
pub use lane::{Color, LaneLayer, LaneVisualParams};
pub use mesh::{Mesh, Vertex};
pub use provider::{ArDataProvider, ArSnapshot, SharedArData};
pub use renderer::{ArRenderer, FrameOutcome, RendererState};
pub use video::{VideoFrameSink, VideoStats};

pub use crate::config::ConfigurationError;

use thiserror::Error;

/// Failure while setting up the rendering pipeline
///
/// Setup errors end the current rendering session. There is no automatic retry:
/// the host recreates the rendering context and starts again from
/// [`RendererState::Uninitialized`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderSetupError {
    /// A shader program could not be built
    #[error("failed to create {kind:?} program: {reason}")]
    ProgramCreation {
        /// Program that failed
        kind: ProgramKind,
        /// Backend-provided reason
        reason: String,
    },

    /// A texture or buffer could not be allocated
    #[error("failed to create resource: {0}")]
    ResourceCreation(String),

    /// The rendering context went away
    #[error("rendering context lost")]
    ContextLost,
}

/// High-level rendering error types
///
/// Missing frame inputs (no camera pose, no route, unknown surface size) are not
/// errors; they are reported through [`FrameOutcome`].
#[derive(Error, Debug)]
pub enum RenderError {
    /// Pipeline setup failed
    #[error("render setup failed: {0}")]
    Setup(#[from] RenderSetupError),

    /// Route data could not be transformed
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    /// A video frame does not match the size agreed at construction
    #[error("video frame has {actual} bytes, expected {expected}")]
    FrameSizeMismatch {
        /// Bytes required for `width * height` RGBA pixels
        expected: usize,
        /// Bytes received
        actual: usize,
    },

    /// A layer was used before `initialize`
    #[error("{0} used before initialization")]
    NotInitialized(&'static str),

    /// A backend operation failed during a frame
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
