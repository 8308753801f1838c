//! Recording backend for unit tests
//!
//! Executes nothing; every call is appended to a log so tests can assert on
//! state changes, uploads and draw order.

use std::collections::HashMap;

use super::render_backend::{
    BackendResult, ClearFlags, DepthFunc, DrawCommand, MeshHandle, ProgramHandle, ProgramKind,
    RenderBackend, TextureHandle,
};
use crate::render::{RenderError, RenderSetupError, Vertex};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BackendCall {
    SetClearColor([f32; 4]),
    SetViewport(u32, u32),
    SetDepthTest(bool),
    SetDepthFunc(DepthFunc),
    Clear(ClearFlags),
    CreateProgram(ProgramKind),
    CreateTexture { width: u32, height: u32 },
    UpdateTexture(TextureHandle),
    CreateMesh { vertex_count: usize, index_count: usize },
    UpdateMesh { mesh: MeshHandle, vertex_count: usize, index_count: usize },
    Draw(DrawCommand),
    DestroyProgram(ProgramHandle),
    DestroyTexture(TextureHandle),
    DestroyMesh(MeshHandle),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    pub programs: HashMap<ProgramHandle, ProgramKind>,
    pub textures: HashMap<TextureHandle, Vec<u8>>,
    pub meshes: HashMap<MeshHandle, (Vec<Vertex>, Vec<u32>)>,
    pub fail_program: Option<ProgramKind>,
    pub fail_texture_upload: bool,
    pub context_lost: bool,
    next_handle: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Draw calls that used a program of `kind`
    pub fn draws_of(&self, kind: ProgramKind) -> Vec<&DrawCommand> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Draw(command) if self.programs.get(&command.program) == Some(&kind) => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Position of the first call matching `predicate`
    pub fn position(&self, predicate: impl Fn(&BackendCall) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }

    /// Depth-test state in effect just before call `index`
    pub fn depth_test_before(&self, index: usize) -> Option<bool> {
        self.calls[..index].iter().rev().find_map(|call| match call {
            BackendCall::SetDepthTest(enabled) => Some(*enabled),
            _ => None,
        })
    }
}

impl RenderBackend for RecordingBackend {
    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.calls.push(BackendCall::SetClearColor(color));
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(BackendCall::SetViewport(width, height));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.calls.push(BackendCall::SetDepthTest(enabled));
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.calls.push(BackendCall::SetDepthFunc(func));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.calls.push(BackendCall::Clear(flags));
    }

    fn create_program(&mut self, kind: ProgramKind) -> BackendResult<ProgramHandle> {
        if self.fail_program == Some(kind) {
            return Err(RenderSetupError::ProgramCreation { kind, reason: "injected failure".into() }.into());
        }
        self.calls.push(BackendCall::CreateProgram(kind));
        let handle = ProgramHandle(self.next());
        self.programs.insert(handle, kind);
        Ok(handle)
    }

    fn create_texture(&mut self, width: u32, height: u32, fill: [u8; 4]) -> BackendResult<TextureHandle> {
        self.calls.push(BackendCall::CreateTexture { width, height });
        let handle = TextureHandle(self.next());
        self.textures.insert(handle, fill.repeat((width * height) as usize));
        Ok(handle)
    }

    fn update_texture(&mut self, texture: TextureHandle, pixels: &[u8]) -> BackendResult<()> {
        if self.context_lost {
            return Err(RenderSetupError::ContextLost.into());
        }
        if self.fail_texture_upload {
            return Err(RenderError::Backend("injected upload failure".into()));
        }
        let contents = self
            .textures
            .get_mut(&texture)
            .ok_or_else(|| RenderError::Backend(format!("unknown texture {texture:?}")))?;
        if contents.len() != pixels.len() {
            return Err(RenderError::FrameSizeMismatch { expected: contents.len(), actual: pixels.len() });
        }
        contents.copy_from_slice(pixels);
        self.calls.push(BackendCall::UpdateTexture(texture));
        Ok(())
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<MeshHandle> {
        self.calls.push(BackendCall::CreateMesh { vertex_count: vertices.len(), index_count: indices.len() });
        let handle = MeshHandle(self.next());
        self.meshes.insert(handle, (vertices.to_vec(), indices.to_vec()));
        Ok(handle)
    }

    fn update_mesh(&mut self, mesh: MeshHandle, vertices: &[Vertex], indices: &[u32]) -> BackendResult<()> {
        let entry = self
            .meshes
            .get_mut(&mesh)
            .ok_or_else(|| RenderError::Backend(format!("unknown mesh {mesh:?}")))?;
        *entry = (vertices.to_vec(), indices.to_vec());
        self.calls.push(BackendCall::UpdateMesh { mesh, vertex_count: vertices.len(), index_count: indices.len() });
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> BackendResult<()> {
        if self.context_lost {
            return Err(RenderSetupError::ContextLost.into());
        }
        self.calls.push(BackendCall::Draw(*command));
        Ok(())
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.calls.push(BackendCall::DestroyProgram(program));
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
        self.calls.push(BackendCall::DestroyTexture(texture));
    }

    fn destroy_mesh(&mut self, mesh: MeshHandle) {
        self.meshes.remove(&mesh);
        self.calls.push(BackendCall::DestroyMesh(mesh));
    }
}
