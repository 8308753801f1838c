//! Camera background layer
//!
//! A screen-filling textured quad showing the most recent camera frame. The
//! texture is allocated once at the video frame size and overwritten in place
//! for every new frame.

use crate::render::api::{DrawBindings, DrawCommand, MeshHandle, ProgramHandle, ProgramKind, RenderBackend, TextureHandle};
use crate::render::mesh::{Mesh, Vertex};
use crate::render::{RenderError, RenderResult};

/// Color shown until the first camera frame arrives (opaque black)
pub const BLANK_FRAME_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Bytes per RGBA8 pixel
const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, Copy)]
struct BackgroundResources {
    program: ProgramHandle,
    mesh: MeshHandle,
    texture: TextureHandle,
}

/// Full-screen video background
#[derive(Debug)]
pub struct BackgroundLayer {
    width: u32,
    height: u32,
    resources: Option<BackgroundResources>,
}

impl BackgroundLayer {
    /// Create a layer for video frames of `width` x `height` pixels
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height, resources: None }
    }

    /// Video frame size in pixels
    pub const fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes expected by [`BackgroundLayer::update_texture`]
    pub const fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    /// True once [`BackgroundLayer::initialize`] succeeded
    pub const fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// Screen-filling quad in NDC
    ///
    /// UVs span the whole texture; V is flipped so the first row of the pixel
    /// buffer lands at the top of the screen.
    pub fn quad() -> Mesh {
        let normal = [0.0, 0.0, 1.0];
        Mesh::new(
            vec![
                Vertex::new([-1.0, -1.0, 0.0], normal, [0.0, 1.0]),
                Vertex::new([1.0, -1.0, 0.0], normal, [1.0, 1.0]),
                Vertex::new([1.0, 1.0, 0.0], normal, [1.0, 0.0]),
                Vertex::new([-1.0, 1.0, 0.0], normal, [0.0, 0.0]),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    /// Build the quad, the background program and the frame texture
    pub fn initialize<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> RenderResult<()> {
        let program = backend.create_program(ProgramKind::Background)?;

        let quad = Self::quad();
        let mesh = match backend.create_mesh(&quad.vertices, &quad.indices) {
            Ok(mesh) => mesh,
            Err(e) => {
                backend.destroy_program(program);
                return Err(e);
            }
        };

        let texture = match backend.create_texture(self.width, self.height, BLANK_FRAME_COLOR) {
            Ok(texture) => texture,
            Err(e) => {
                backend.destroy_mesh(mesh);
                backend.destroy_program(program);
                return Err(e);
            }
        };

        self.resources = Some(BackgroundResources { program, mesh, texture });
        log::debug!("Background layer initialized for {}x{} frames", self.width, self.height);
        Ok(())
    }

    /// Overwrite the frame texture with a new RGBA8 pixel buffer
    ///
    /// The buffer must hold exactly `width * height` pixels. The most recent
    /// upload is what the next [`BackgroundLayer::draw`] shows.
    pub fn update_texture<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, pixels: &[u8]) -> RenderResult<()> {
        let resources = self.resources.ok_or(RenderError::NotInitialized("background layer"))?;
        if pixels.len() != self.frame_len() {
            return Err(RenderError::FrameSizeMismatch { expected: self.frame_len(), actual: pixels.len() });
        }
        backend.update_texture(resources.texture, pixels)
    }

    /// Draw the background; the caller disables depth testing first
    pub fn draw<B: RenderBackend + ?Sized>(&self, backend: &mut B) -> RenderResult<()> {
        let resources = self.resources.ok_or(RenderError::NotInitialized("background layer"))?;
        backend.draw(&DrawCommand {
            program: resources.program,
            mesh: resources.mesh,
            bindings: DrawBindings::Textured { texture: resources.texture },
        })
    }

    /// Destroy the layer's backend resources
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(resources) = self.resources.take() {
            backend.destroy_texture(resources.texture);
            backend.destroy_mesh(resources.mesh);
            backend.destroy_program(resources.program);
            log::debug!("Background layer released");
        }
    }

    /// Drop resource handles without destroying them (the context is already gone)
    pub fn forget(&mut self) {
        self.resources = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::recording::{BackendCall, RecordingBackend};
    use crate::render::RenderSetupError;

    #[test]
    fn test_initialize_allocates_frame_sized_texture() {
        let mut backend = RecordingBackend::new();
        let mut layer = BackgroundLayer::new(4, 2);
        layer.initialize(&mut backend).unwrap();

        assert!(backend.calls.contains(&BackendCall::CreateTexture { width: 4, height: 2 }));
        assert!(backend.calls.contains(&BackendCall::CreateMesh { vertex_count: 4, index_count: 6 }));

        // Blank frame until the first upload.
        let texture = backend.textures.values().next().unwrap();
        assert_eq!(texture.len(), 4 * 2 * 4);
        assert!(texture.chunks(4).all(|pixel| pixel == BLANK_FRAME_COLOR));
    }

    #[test]
    fn test_quad_covers_screen_with_flipped_v() {
        let quad = BackgroundLayer::quad();
        assert_eq!(quad.triangle_count(), 2);

        let top_left = quad.vertices.iter().find(|v| v.position[0] < 0.0 && v.position[1] > 0.0).unwrap();
        assert_eq!(top_left.tex_coord, [0.0, 0.0]);
        let bottom_right = quad.vertices.iter().find(|v| v.position[0] > 0.0 && v.position[1] < 0.0).unwrap();
        assert_eq!(bottom_right.tex_coord, [1.0, 1.0]);
    }

    #[test]
    fn test_latest_upload_wins() {
        let mut backend = RecordingBackend::new();
        let mut layer = BackgroundLayer::new(2, 1);
        layer.initialize(&mut backend).unwrap();

        layer.update_texture(&mut backend, &[1; 8]).unwrap();
        layer.update_texture(&mut backend, &[2; 8]).unwrap();
        layer.draw(&mut backend).unwrap();

        let DrawBindings::Textured { texture } = backend.draws_of(ProgramKind::Background)[0].bindings else {
            panic!("background draw must bind its texture");
        };
        assert_eq!(backend.textures[&texture], vec![2; 8]);
    }

    #[test]
    fn test_wrong_frame_size_is_rejected() {
        let mut backend = RecordingBackend::new();
        let mut layer = BackgroundLayer::new(2, 2);
        layer.initialize(&mut backend).unwrap();

        let result = layer.update_texture(&mut backend, &[0; 12]);
        assert!(matches!(result, Err(RenderError::FrameSizeMismatch { expected: 16, actual: 12 })));
    }

    #[test]
    fn test_use_before_initialize() {
        let mut backend = RecordingBackend::new();
        let mut layer = BackgroundLayer::new(2, 2);

        assert!(matches!(layer.draw(&mut backend), Err(RenderError::NotInitialized(_))));
        assert!(matches!(layer.update_texture(&mut backend, &[0; 16]), Err(RenderError::NotInitialized(_))));
    }

    #[test]
    fn test_program_failure_leaves_layer_uninitialized() {
        let mut backend = RecordingBackend::new();
        backend.fail_program = Some(ProgramKind::Background);
        let mut layer = BackgroundLayer::new(2, 2);

        let result = layer.initialize(&mut backend);
        assert!(matches!(
            result,
            Err(RenderError::Setup(RenderSetupError::ProgramCreation { kind: ProgramKind::Background, .. }))
        ));
        assert!(!layer.is_initialized());
    }

    #[test]
    fn test_release_destroys_everything() {
        let mut backend = RecordingBackend::new();
        let mut layer = BackgroundLayer::new(2, 2);
        layer.initialize(&mut backend).unwrap();
        layer.release(&mut backend);

        assert!(backend.textures.is_empty());
        assert!(backend.meshes.is_empty());
        assert!(backend.programs.is_empty());
    }
}
