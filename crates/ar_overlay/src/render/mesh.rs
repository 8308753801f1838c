//! Mesh representation for overlay geometry
//!
//! Plain vertex/index data with no backend dependencies. Backends upload it
//! through [`RenderBackend::create_mesh`](crate::render::RenderBackend::create_mesh).

use bytemuck::{Pod, Zeroable};

/// Vertex data structure with position, normal, and texture coordinates
///
/// The `#[repr(C)]` layout is what a GPU vertex buffer would receive, so the
/// vertex slice can be handed to an upload as raw bytes via [`bytemuck`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space (NDC for the background quad, render frame for the lane)
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }
}

/// Indexed triangle list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Triangle indices, three per triangle
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Mesh with no geometry
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check the index list forms whole triangles that reference existing vertices
    pub fn is_well_formed(&self) -> bool {
        self.indices.len() % 3 == 0
            && self.indices.iter().all(|&index| (index as usize) < self.vertices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);

        let vertices = vec![Vertex::default(); 3];
        assert_eq!(bytemuck::cast_slice::<Vertex, u8>(&vertices).len(), 96);
    }

    #[test]
    fn test_well_formed_checks() {
        let mesh = Mesh::new(vec![Vertex::default(); 3], vec![0, 1, 2]);
        assert!(mesh.is_well_formed());
        assert_eq!(mesh.triangle_count(), 1);

        let dangling = Mesh::new(vec![Vertex::default(); 2], vec![0, 1, 2]);
        assert!(!dangling.is_well_formed());

        assert!(Mesh::empty().is_empty());
    }
}
