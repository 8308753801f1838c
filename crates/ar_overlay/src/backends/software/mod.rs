//! Headless software rendering backend
//!
//! A CPU rasterizer implementing [`RenderBackend`] into an in-memory RGBA8
//! framebuffer. Used by the demo binary to produce images without a GPU and
//! by the end-to-end tests to check what actually lands on screen.
//!
//! Resources live in `slotmap` arenas; the handles given out are the keys'
//! FFI form, so a stale handle is detected instead of aliasing a new resource.

pub mod framebuffer;
pub mod raster;
pub mod shading;

use slotmap::{new_key_type, Key, KeyData, SlotMap};

use crate::render::api::{
    BackendResult, ClearFlags, DepthFunc, DrawBindings, DrawCommand, LaneUniforms, MeshHandle,
    ProgramHandle, ProgramKind, RenderBackend, TextureHandle,
};
use crate::render::{Mesh, RenderError, Vertex};

pub use framebuffer::{DepthState, Fragment, Framebuffer};
pub use shading::Texture;

new_key_type! {
    struct ProgramKey;
    struct TextureKey;
    struct MeshKey;
}

/// Draw calls issued since the last color clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draws with the background program
    pub background_draws: u32,
    /// Draws with the lit lane program
    pub lane_draws: u32,
    /// Fragments that passed the depth test and were written
    pub fragments_written: u64,
}

/// CPU rasterizer backend
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    target: Framebuffer,
    clear_color: [f32; 4],
    depth: DepthState,
    programs: SlotMap<ProgramKey, ProgramKind>,
    textures: SlotMap<TextureKey, Texture>,
    meshes: SlotMap<MeshKey, Mesh>,
    stats: FrameStats,
}

impl SoftwareBackend {
    /// Create a backend with an empty target; call `set_viewport` before drawing
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with a target of the given size
    pub fn with_size(width: u32, height: u32) -> Self {
        Self { target: Framebuffer::new(width, height), ..Self::default() }
    }

    /// Rendered color and depth attachments
    pub const fn framebuffer(&self) -> &Framebuffer {
        &self.target
    }

    /// Rendered color buffer as RGBA8 bytes
    pub fn color_buffer(&self) -> &[u8] {
        self.target.color_bytes()
    }

    /// Color at `(x, y)`, row 0 at the top
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.target.pixel(x, y)
    }

    /// Copy the color buffer into an image
    pub fn to_image(&self) -> BackendResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.target.width(), self.target.height(), self.color_buffer().to_vec())
            .ok_or_else(|| RenderError::Backend("color buffer does not match target size".into()))
    }

    /// Draw statistics since the last color clear
    pub const fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Number of live programs, textures and meshes
    pub fn resource_counts(&self) -> (usize, usize, usize) {
        (self.programs.len(), self.textures.len(), self.meshes.len())
    }

    fn program(&self, handle: ProgramHandle) -> BackendResult<ProgramKind> {
        self.programs
            .get(ProgramKey::from(KeyData::from_ffi(handle.0)))
            .copied()
            .ok_or_else(|| RenderError::Backend(format!("unknown program {handle:?}")))
    }

    fn draw_background(&mut self, mesh: MeshKey, texture: TextureHandle) -> BackendResult<u64> {
        let texture = self
            .textures
            .get(TextureKey::from(KeyData::from_ffi(texture.0)))
            .ok_or_else(|| RenderError::Backend(format!("unknown texture {texture:?}")))?;
        let mesh = lookup_mesh(&self.meshes, mesh)?;

        Ok(draw_mesh(
            &mut self.target,
            self.depth,
            mesh,
            shading::background_vertex,
            |varyings| shading::background_fragment(texture, varyings),
        ))
    }

    fn draw_lane(&mut self, mesh: MeshKey, uniforms: &LaneUniforms) -> BackendResult<u64> {
        let mesh = lookup_mesh(&self.meshes, mesh)?;

        Ok(draw_mesh(
            &mut self.target,
            self.depth,
            mesh,
            |vertex| shading::lane_vertex(uniforms, vertex),
            |varyings| shading::lane_fragment(uniforms, varyings),
        ))
    }
}

fn lookup_mesh(meshes: &SlotMap<MeshKey, Mesh>, key: MeshKey) -> BackendResult<&Mesh> {
    meshes.get(key).ok_or_else(|| RenderError::Backend(format!("unknown mesh {:?}", MeshHandle(key.data().as_ffi()))))
}

/// Run one program over an indexed mesh; returns the number of fragments written
fn draw_mesh<const N: usize>(
    target: &mut Framebuffer,
    depth: DepthState,
    mesh: &Mesh,
    vertex_stage: impl Fn(&Vertex) -> raster::ClipVertex<N>,
    fragment_stage: impl Fn([f32; N]) -> Fragment,
) -> u64 {
    let clip: Vec<_> = mesh.vertices.iter().map(vertex_stage).collect();
    let (width, height) = (target.width(), target.height());
    let mut written = 0;

    for triangle in mesh.indices.chunks_exact(3) {
        let corners = [clip[triangle[0] as usize], clip[triangle[1] as usize], clip[triangle[2] as usize]];
        for clipped in raster::clip_near(&corners) {
            raster::rasterize(width, height, &clipped, |x, y, z, varyings| {
                let Some(index) = target.index(x, y) else {
                    return;
                };
                if target.depth_test(index, z, depth) {
                    target.write(index, fragment_stage(varyings));
                    written += 1;
                }
            });
        }
    }
    written
}

fn check_mesh(vertices: &[Vertex], indices: &[u32]) -> BackendResult<Mesh> {
    let mesh = Mesh::new(vertices.to_vec(), indices.to_vec());
    if mesh.is_well_formed() {
        Ok(mesh)
    } else {
        Err(RenderError::Backend(format!(
            "malformed mesh: {} indices over {} vertices",
            indices.len(),
            vertices.len()
        )))
    }
}

impl RenderBackend for SoftwareBackend {
    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        log::debug!("Software target resized to {}x{}", width, height);
        self.target.resize(width, height);
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth.enabled = enabled;
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.depth.func = func;
    }

    fn clear(&mut self, flags: ClearFlags) {
        if flags.contains(ClearFlags::COLOR) {
            self.target.clear_color(self.clear_color);
            self.stats = FrameStats::default();
        }
        if flags.contains(ClearFlags::DEPTH) {
            self.target.clear_depth();
        }
    }

    fn create_program(&mut self, kind: ProgramKind) -> BackendResult<ProgramHandle> {
        let key = self.programs.insert(kind);
        log::debug!("Created {:?} program", kind);
        Ok(ProgramHandle(key.data().as_ffi()))
    }

    fn create_texture(&mut self, width: u32, height: u32, fill: [u8; 4]) -> BackendResult<TextureHandle> {
        let key = self.textures.insert(Texture::filled(width, height, fill));
        Ok(TextureHandle(key.data().as_ffi()))
    }

    fn update_texture(&mut self, texture: TextureHandle, pixels: &[u8]) -> BackendResult<()> {
        let stored = self
            .textures
            .get_mut(TextureKey::from(KeyData::from_ffi(texture.0)))
            .ok_or_else(|| RenderError::Backend(format!("unknown texture {texture:?}")))?;
        if stored.pixels.len() != pixels.len() {
            return Err(RenderError::FrameSizeMismatch { expected: stored.pixels.len(), actual: pixels.len() });
        }
        stored.pixels.copy_from_slice(pixels);
        Ok(())
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<MeshHandle> {
        let key = self.meshes.insert(check_mesh(vertices, indices)?);
        Ok(MeshHandle(key.data().as_ffi()))
    }

    fn update_mesh(&mut self, mesh: MeshHandle, vertices: &[Vertex], indices: &[u32]) -> BackendResult<()> {
        let replacement = check_mesh(vertices, indices)?;
        let stored = self
            .meshes
            .get_mut(MeshKey::from(KeyData::from_ffi(mesh.0)))
            .ok_or_else(|| RenderError::Backend(format!("unknown mesh {mesh:?}")))?;
        *stored = replacement;
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> BackendResult<()> {
        let kind = self.program(command.program)?;
        let mesh = MeshKey::from(KeyData::from_ffi(command.mesh.0));

        let written = match (kind, &command.bindings) {
            (ProgramKind::Background, DrawBindings::Textured { texture }) => {
                self.stats.background_draws += 1;
                self.draw_background(mesh, *texture)?
            }
            (ProgramKind::LitLane, DrawBindings::Lit(uniforms)) => {
                self.stats.lane_draws += 1;
                self.draw_lane(mesh, uniforms)?
            }
            (kind, bindings) => {
                return Err(RenderError::Backend(format!("{kind:?} program cannot use bindings {bindings:?}")));
            }
        };

        self.stats.fragments_written += written;
        log::trace!("{:?} draw wrote {} fragments", kind, written);
        Ok(())
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(ProgramKey::from(KeyData::from_ffi(program.0)));
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(TextureKey::from(KeyData::from_ffi(texture.0)));
    }

    fn destroy_mesh(&mut self, mesh: MeshHandle) {
        self.meshes.remove(MeshKey::from(KeyData::from_ffi(mesh.0)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat3, Mat4, Vec4};
    use crate::render::BackgroundLayer;

    fn lit(view_projection: Mat4, color: Vec4) -> LaneUniforms {
        LaneUniforms {
            view_projection,
            model: Mat4::identity(),
            normal: Mat3::identity(),
            color,
            light_position: None,
            light_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            ambient_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }

    /// Quad in NDC at depth `z` covering `[x0, x1]` horizontally
    fn ndc_quad(x0: f32, x1: f32, z: f32) -> (Vec<Vertex>, Vec<u32>) {
        let up = [0.0, 1.0, 0.0];
        let vertices = vec![
            Vertex::new([x0, -1.0, z], up, [0.0, 0.0]),
            Vertex::new([x1, -1.0, z], up, [0.0, 0.0]),
            Vertex::new([x1, 1.0, z], up, [0.0, 0.0]),
            Vertex::new([x0, 1.0, z], up, [0.0, 0.0]),
        ];
        (vertices, vec![0, 1, 2, 0, 2, 3])
    }

    fn draw_lit(backend: &mut SoftwareBackend, program: ProgramHandle, quad: &(Vec<Vertex>, Vec<u32>), color: Vec4) {
        let mesh = backend.create_mesh(&quad.0, &quad.1).unwrap();
        backend
            .draw(&DrawCommand { program, mesh, bindings: DrawBindings::Lit(lit(Mat4::identity(), color)) })
            .unwrap();
    }

    #[test]
    fn test_clear_fills_target_and_resets_stats() {
        let mut backend = SoftwareBackend::with_size(4, 3);
        backend.set_clear_color([0.0, 1.0, 0.0, 1.0]);
        backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        assert_eq!(backend.pixel(3, 2), Some([0, 255, 0, 255]));
        assert_eq!(backend.frame_stats(), FrameStats::default());
        assert_eq!(backend.color_buffer().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_background_quad_shows_texture_upright() {
        let mut backend = SoftwareBackend::with_size(4, 4);
        let program = backend.create_program(ProgramKind::Background).unwrap();
        let quad = BackgroundLayer::quad();
        let mesh = backend.create_mesh(&quad.vertices, &quad.indices).unwrap();
        let texture = backend.create_texture(1, 2, [0, 0, 0, 255]).unwrap();
        // Top row red, bottom row blue.
        backend.update_texture(texture, &[255, 0, 0, 255, 0, 0, 255, 255]).unwrap();

        backend.draw(&DrawCommand { program, mesh, bindings: DrawBindings::Textured { texture } }).unwrap();

        assert_eq!(backend.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(backend.pixel(3, 3), Some([0, 0, 255, 255]));
        assert_eq!(backend.frame_stats().background_draws, 1);
        assert_eq!(backend.frame_stats().fragments_written, 16);
    }

    #[test]
    fn test_depth_test_hides_farther_geometry() {
        let mut backend = SoftwareBackend::with_size(4, 4);
        backend.set_depth_test(true);
        backend.set_depth_func(DepthFunc::LessEqual);
        backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        let program = backend.create_program(ProgramKind::LitLane).unwrap();

        draw_lit(&mut backend, program, &ndc_quad(-1.0, 1.0, -0.5), Vec4::new(1.0, 0.0, 0.0, 1.0));
        draw_lit(&mut backend, program, &ndc_quad(-1.0, 1.0, 0.5), Vec4::new(0.0, 0.0, 1.0, 1.0));

        assert_eq!(backend.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(backend.frame_stats().lane_draws, 2);
    }

    #[test]
    fn test_disabled_depth_test_draws_in_order() {
        let mut backend = SoftwareBackend::with_size(4, 4);
        backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        let program = backend.create_program(ProgramKind::LitLane).unwrap();

        draw_lit(&mut backend, program, &ndc_quad(-1.0, 1.0, -0.5), Vec4::new(1.0, 0.0, 0.0, 1.0));
        draw_lit(&mut backend, program, &ndc_quad(-1.0, 1.0, 0.5), Vec4::new(0.0, 0.0, 1.0, 1.0));

        assert_eq!(backend.pixel(1, 1), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_lane_blends_over_background() {
        let mut backend = SoftwareBackend::with_size(4, 4);
        backend.set_clear_color([0.0, 0.0, 0.0, 1.0]);
        backend.clear(ClearFlags::COLOR);
        let program = backend.create_program(ProgramKind::LitLane).unwrap();

        // Covers only the left half.
        draw_lit(&mut backend, program, &ndc_quad(-1.0, 0.0, 0.0), Vec4::new(1.0, 1.0, 1.0, 0.5));

        assert_eq!(backend.pixel(0, 2), Some([128, 128, 128, 255]));
        assert_eq!(backend.pixel(3, 2), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_mismatched_bindings_are_rejected() {
        let mut backend = SoftwareBackend::with_size(2, 2);
        let program = backend.create_program(ProgramKind::Background).unwrap();
        let quad = ndc_quad(-1.0, 1.0, 0.0);
        let mesh = backend.create_mesh(&quad.0, &quad.1).unwrap();

        let result = backend.draw(&DrawCommand {
            program,
            mesh,
            bindings: DrawBindings::Lit(lit(Mat4::identity(), Vec4::zeros())),
        });
        assert!(matches!(result, Err(RenderError::Backend(_))));
    }

    #[test]
    fn test_stale_handles_are_detected() {
        let mut backend = SoftwareBackend::with_size(2, 2);
        let texture = backend.create_texture(1, 1, [0; 4]).unwrap();
        backend.destroy_texture(texture);
        // The slot is reused with a new version.
        let _replacement = backend.create_texture(1, 1, [0; 4]).unwrap();

        assert!(matches!(backend.update_texture(texture, &[1; 4]), Err(RenderError::Backend(_))));
    }

    #[test]
    fn test_malformed_mesh_is_rejected() {
        let mut backend = SoftwareBackend::new();
        let result = backend.create_mesh(&[Vertex::default(); 2], &[0, 1, 2]);
        assert!(matches!(result, Err(RenderError::Backend(_))));
    }

    #[test]
    fn test_texture_size_is_enforced() {
        let mut backend = SoftwareBackend::new();
        let texture = backend.create_texture(2, 2, [0; 4]).unwrap();
        let result = backend.update_texture(texture, &[0; 15]);
        assert!(matches!(result, Err(RenderError::FrameSizeMismatch { expected: 16, actual: 15 })));
    }

    #[test]
    fn test_to_image_matches_target() {
        let mut backend = SoftwareBackend::with_size(3, 2);
        backend.set_clear_color([1.0, 0.0, 0.0, 1.0]);
        backend.clear(ClearFlags::COLOR);

        let image = backend.to_image().unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [255, 0, 0, 255]);
    }
}
