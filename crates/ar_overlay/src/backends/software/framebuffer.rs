//! Color and depth attachments of the software backend

use crate::render::api::DepthFunc;

/// Depth pipeline state captured for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    /// Depth test (and depth writes) enabled
    pub enabled: bool,
    /// Comparison applied when enabled
    pub func: DepthFunc,
}

impl Default for DepthState {
    /// Matches a fresh GL context: testing off, `Less`
    fn default() -> Self {
        Self { enabled: false, func: DepthFunc::Less }
    }
}

/// Shaded fragment ready for the output merger
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fragment {
    /// Replace the stored color
    Opaque([u8; 4]),
    /// Source-over blend a linear RGBA color onto the stored color
    Blended([f32; 4]),
}

/// RGBA8 color buffer plus `f32` depth buffer, row 0 at the top
#[derive(Debug, Clone, Default)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<[u8; 4]>,
    depth: Vec<f32>,
}

impl Framebuffer {
    /// Depth value of a cleared buffer (the far plane)
    pub const CLEAR_DEPTH: f32 = 1.0;

    /// Allocate cleared attachments
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self { width, height, color: vec![[0; 4]; len], depth: vec![Self::CLEAR_DEPTH; len] }
    }

    /// Reallocate for a new size; contents are cleared
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Fill the color buffer
    pub fn clear_color(&mut self, color: [f32; 4]) {
        self.color.fill(color.map(to_unorm8));
    }

    /// Reset every depth value to the far plane
    pub fn clear_depth(&mut self) {
        self.depth.fill(Self::CLEAR_DEPTH);
    }

    /// Linear index of pixel `(x, y)`
    pub fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Color at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.index(x, y).map(|i| self.color[i])
    }

    /// Depth at `(x, y)`
    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    /// Color buffer as tightly packed RGBA8 bytes
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.color)
    }

    /// Run the depth test for pixel `index`, writing the depth when it passes
    ///
    /// With depth testing disabled every fragment passes and nothing is written.
    pub fn depth_test(&mut self, index: usize, depth: f32, state: DepthState) -> bool {
        if !state.enabled {
            return true;
        }
        let stored = &mut self.depth[index];
        if state.func.passes(depth, *stored) {
            *stored = depth;
            true
        } else {
            false
        }
    }

    /// Merge a fragment into pixel `index`
    pub fn write(&mut self, index: usize, fragment: Fragment) {
        let dst = &mut self.color[index];
        *dst = match fragment {
            Fragment::Opaque(color) => color,
            Fragment::Blended(src) => blend_over(*dst, src),
        };
    }
}

/// Convert a `[0, 1]` channel to `u8`, clamping out-of-range values
pub fn to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Source-over: `out = src * a + dst * (1 - a)`, alpha accumulates the same way
pub fn blend_over(dst: [u8; 4], src: [f32; 4]) -> [u8; 4] {
    let alpha = src[3].clamp(0.0, 1.0);
    let mix = |s: f32, d: u8| to_unorm8(s.clamp(0.0, 1.0) * alpha + f32::from(d) / 255.0 * (1.0 - alpha));
    [
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        to_unorm8(alpha + f32::from(dst[3]) / 255.0 * (1.0 - alpha)),
    ]
}
