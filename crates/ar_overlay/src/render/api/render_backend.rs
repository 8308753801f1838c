//! Backend abstraction traits for the rendering system
//!
//! This module defines the trait that rendering backends must implement
//! to host the overlay layers. Every method is called from the rendering
//! thread only; resources must be destroyed on the same backend that made them.

use bitflags::bitflags;

use crate::foundation::math::{Mat3, Mat4, Vec3, Vec4};
use crate::render::{RenderError, Vertex};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to a shader program stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Handle to a texture resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Handle to a vertex/index buffer pair stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

bitflags! {
    /// Buffers affected by [`RenderBackend::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color attachment
        const COLOR = 0b01;
        /// Depth attachment
        const DEPTH = 0b10;
    }
}

/// Depth comparison used when depth testing is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthFunc {
    /// Pass when the incoming depth is strictly closer
    Less,
    /// Pass when the incoming depth is closer or equal
    #[default]
    LessEqual,
    /// Always pass
    Always,
}

impl DepthFunc {
    /// Evaluate the comparison for an incoming and a stored depth
    pub fn passes(self, incoming: f32, stored: f32) -> bool {
        match self {
            Self::Less => incoming < stored,
            Self::LessEqual => incoming <= stored,
            Self::Always => true,
        }
    }
}

/// The two programs the overlay needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Unlit textured full-screen quad; vertex positions are already in NDC
    Background,
    /// Lit, alpha-blended lane geometry transformed by the camera
    LitLane,
}

/// Per-draw uniform block of the lit lane program
///
/// Light position and all vectors are in the render frame (X right, Y up, Z toward viewer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneUniforms {
    /// Combined projection x view
    pub view_projection: Mat4,
    /// Model transform
    pub model: Mat4,
    /// Inverse-transpose of the model's linear part
    pub normal: Mat3,
    /// Base lane color
    pub color: Vec4,
    /// Point light position, `None` disables the diffuse term
    pub light_position: Option<Vec3>,
    /// Light color
    pub light_color: Vec4,
    /// Ambient color
    pub ambient_color: Vec4,
}

/// Resources bound for a draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawBindings {
    /// Background program: sample this texture
    Textured {
        /// Texture to sample
        texture: TextureHandle,
    },
    /// Lit lane program uniforms
    Lit(LaneUniforms),
}

/// A single draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Program to run
    pub program: ProgramHandle,
    /// Geometry to draw (indexed triangle list)
    pub mesh: MeshHandle,
    /// Bound resources
    pub bindings: DrawBindings,
}

/// Main rendering backend trait
///
/// Abstracts over graphics APIs so the overlay layers can issue state changes,
/// uploads and draws without knowing what executes them. The pipeline state
/// mirrors the small subset of a GL-style context the overlay uses.
pub trait RenderBackend {
    /// Set the color used by [`RenderBackend::clear`]
    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Resize the drawable area
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Enable or disable depth testing (and depth writes)
    fn set_depth_test(&mut self, enabled: bool);

    /// Choose the depth comparison
    fn set_depth_func(&mut self, func: DepthFunc);

    /// Clear the selected buffers
    fn clear(&mut self, flags: ClearFlags);

    /// Build one of the overlay programs
    fn create_program(&mut self, kind: ProgramKind) -> BackendResult<ProgramHandle>;

    /// Allocate an RGBA8 texture of the given size, filled with one color
    fn create_texture(&mut self, width: u32, height: u32, fill: [u8; 4]) -> BackendResult<TextureHandle>;

    /// Overwrite a texture's pixels; `pixels` must match the allocated size exactly
    fn update_texture(&mut self, texture: TextureHandle, pixels: &[u8]) -> BackendResult<()>;

    /// Upload geometry into a new mesh
    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<MeshHandle>;

    /// Replace a mesh's geometry in place
    fn update_mesh(&mut self, mesh: MeshHandle, vertices: &[Vertex], indices: &[u32]) -> BackendResult<()>;

    /// Execute a draw call with the current depth state
    fn draw(&mut self, command: &DrawCommand) -> BackendResult<()>;

    /// Release a program
    fn destroy_program(&mut self, program: ProgramHandle);

    /// Release a texture
    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Release a mesh
    fn destroy_mesh(&mut self, mesh: MeshHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_func_comparisons() {
        assert!(DepthFunc::Less.passes(0.2, 0.5));
        assert!(!DepthFunc::Less.passes(0.5, 0.5));
        assert!(DepthFunc::LessEqual.passes(0.5, 0.5));
        assert!(!DepthFunc::LessEqual.passes(0.6, 0.5));
        assert!(DepthFunc::Always.passes(1.0, 0.0));
    }

    #[test]
    fn test_clear_flags_combine() {
        let both = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert!(both.contains(ClearFlags::COLOR));
        assert!(both.contains(ClearFlags::DEPTH));
        assert_eq!(ClearFlags::all(), both);
    }
}
