//! Vertex and fragment stages of the two overlay programs

use crate::backends::software::framebuffer::Fragment;
use crate::backends::software::raster::ClipVertex;
use crate::foundation::math::{Vec3, Vec4};
use crate::render::api::LaneUniforms;
use crate::render::Vertex;

/// CPU-side RGBA8 texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major RGBA8 pixels, row 0 first
    pub pixels: Vec<u8>,
}

impl Texture {
    /// Texture filled with a single color
    pub fn filled(width: u32, height: u32, fill: [u8; 4]) -> Self {
        Self { width, height, pixels: fill.repeat(width as usize * height as usize) }
    }

    /// Nearest-neighbour sample with clamp-to-edge addressing
    pub fn sample_nearest(&self, u: f32, v: f32) -> [u8; 4] {
        if self.width == 0 || self.height == 0 {
            return [0; 4];
        }
        let texel = |coord: f32, size: u32| ((coord.clamp(0.0, 1.0) * size as f32) as u32).min(size - 1) as usize;
        let (x, y) = (texel(u, self.width), texel(v, self.height));
        let offset = (y * self.width as usize + x) * 4;
        [self.pixels[offset], self.pixels[offset + 1], self.pixels[offset + 2], self.pixels[offset + 3]]
    }
}

/// Background vertex stage: positions are already NDC, UV is the only varying
pub fn background_vertex(vertex: &Vertex) -> ClipVertex<2> {
    let [x, y, z] = vertex.position;
    ClipVertex::new(Vec4::new(x, y, z, 1.0), vertex.tex_coord)
}

/// Background fragment stage
pub fn background_fragment(texture: &Texture, varyings: [f32; 2]) -> Fragment {
    Fragment::Opaque(texture.sample_nearest(varyings[0], varyings[1]))
}

/// Lane vertex stage: world position and world normal go to the fragment stage
pub fn lane_vertex(uniforms: &LaneUniforms, vertex: &Vertex) -> ClipVertex<6> {
    let world = uniforms.model * Vec3::from(vertex.position).push(1.0);
    let normal = uniforms.normal * Vec3::from(vertex.normal);
    ClipVertex::new(
        uniforms.view_projection * world,
        [world.x, world.y, world.z, normal.x, normal.y, normal.z],
    )
}

/// Lane fragment stage
pub fn lane_fragment(uniforms: &LaneUniforms, varyings: [f32; 6]) -> Fragment {
    let [px, py, pz, nx, ny, nz] = varyings;
    Fragment::Blended(shade_lane(uniforms, Vec3::new(px, py, pz), Vec3::new(nx, ny, nz)))
}

/// Per-fragment lighting of the lane
///
/// ```text
/// rgb   = color.rgb * (ambient.rgb + light_color.rgb * max(0, n . l))
/// alpha = color.a
/// ```
///
/// Without a light the diffuse term is zero.
pub fn shade_lane(uniforms: &LaneUniforms, position: Vec3, normal: Vec3) -> [f32; 4] {
    let diffuse = uniforms.light_position.map_or(0.0, |light| {
        let n = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
        (light - position).try_normalize(f32::EPSILON).map_or(0.0, |l| n.dot(&l).max(0.0))
    });

    let color = uniforms.color;
    let shade = |i: usize| (color[i] * (uniforms.ambient_color[i] + uniforms.light_color[i] * diffuse)).clamp(0.0, 1.0);
    [shade(0), shade(1), shade(2), color.w]
}
