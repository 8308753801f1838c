//! Rendering backends
//!
//! Implementations of [`RenderBackend`](crate::render::RenderBackend). Hosts with
//! a GPU context plug in their own; the software rasterizer here renders headless.

pub mod software;

pub use software::SoftwareBackend;
