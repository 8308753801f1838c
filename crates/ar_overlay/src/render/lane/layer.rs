//! Lane overlay layer
//!
//! Owns the lit lane program and a single mesh buffer that is rewritten in
//! place every frame from the latest route points.

use crate::foundation::math::{Mat3, Mat4, Vec3};
use crate::render::api::{DrawBindings, DrawCommand, LaneUniforms, MeshHandle, ProgramHandle, ProgramKind, RenderBackend};
use crate::render::coordinates::to_render_frame;
use crate::render::lane::{build_ribbon, LaneVisualParams};
use crate::render::{RenderError, RenderResult};

/// GPU resources held by an initialized layer
#[derive(Debug, Clone, Copy)]
struct LaneResources {
    program: ProgramHandle,
    mesh: MeshHandle,
}

/// Draws the lane ribbon with per-fragment lighting
#[derive(Debug, Default)]
pub struct LaneLayer {
    resources: Option<LaneResources>,
}

impl LaneLayer {
    /// Create an uninitialized layer
    pub fn new() -> Self {
        Self::default()
    }

    /// True once [`LaneLayer::initialize`] succeeded
    pub const fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// Build the lit program and an empty mesh buffer
    ///
    /// Re-initializing releases nothing: call [`LaneLayer::release`] first when
    /// the old resources are still alive.
    pub fn initialize<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> RenderResult<()> {
        let program = backend.create_program(ProgramKind::LitLane)?;
        let mesh = match backend.create_mesh(&[], &[]) {
            Ok(mesh) => mesh,
            Err(e) => {
                backend.destroy_program(program);
                return Err(e);
            }
        };

        self.resources = Some(LaneResources { program, mesh });
        log::debug!("Lane layer initialized");
        Ok(())
    }

    /// Draw the lane for render-frame `points`
    ///
    /// Returns `Ok(false)` without touching the backend when the points yield
    /// no geometry (fewer than two distinct points, or zero width).
    pub fn draw<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        view_projection: &Mat4,
        model: &Mat4,
        normal: &Mat3,
        points: &[Vec3],
        params: &LaneVisualParams,
    ) -> RenderResult<bool> {
        let resources = self.resources.ok_or(RenderError::NotInitialized("lane layer"))?;

        let mesh = build_ribbon(points, params.width() as f32, params.miter_limit());
        if mesh.is_empty() {
            log::trace!("Lane skipped: {} points produced no geometry", points.len());
            return Ok(false);
        }

        backend.update_mesh(resources.mesh, &mesh.vertices, &mesh.indices)?;

        let uniforms = LaneUniforms {
            view_projection: *view_projection,
            model: *model,
            normal: *normal,
            color: params.color().to_vec4(),
            light_position: params.light().map(to_render_frame),
            light_color: params.light_color().to_vec4(),
            ambient_color: params.ambient_color().to_vec4(),
        };

        backend.set_depth_test(true);
        backend.draw(&DrawCommand {
            program: resources.program,
            mesh: resources.mesh,
            bindings: DrawBindings::Lit(uniforms),
        })?;

        Ok(true)
    }

    /// Destroy the layer's backend resources
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(resources) = self.resources.take() {
            backend.destroy_mesh(resources.mesh);
            backend.destroy_program(resources.program);
            log::debug!("Lane layer released");
        }
    }

    /// Drop resource handles without destroying them (the context is already gone)
    pub fn forget(&mut self) {
        self.resources = None;
    }
}
