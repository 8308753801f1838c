//! Public rendering API
//!
//! This module contains the backend abstraction the overlay layers draw through.

pub mod render_backend;

#[cfg(test)]
pub(crate) mod recording;

// Re-export commonly used types
pub use render_backend::{
    BackendResult, ClearFlags, DepthFunc, DrawBindings, DrawCommand, LaneUniforms, MeshHandle,
    ProgramHandle, ProgramKind, RenderBackend, TextureHandle,
};
