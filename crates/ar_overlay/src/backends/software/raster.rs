//! Triangle setup and scan conversion
//!
//! Clip-space triangles are clipped against the near plane, projected to
//! screen space (row 0 at the top) and scanned with edge functions. Coverage
//! follows the top-left rule so triangles sharing an edge never touch the same
//! pixel twice. Attributes are interpolated perspective-correctly; depth is
//! interpolated linearly in screen space and mapped to `[0, 1]`.

use crate::foundation::math::Vec4;

/// Clip-space vertex carrying `N` attributes to interpolate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex<const N: usize> {
    /// Homogeneous clip-space position
    pub position: Vec4,
    /// Attributes interpolated across the triangle
    pub varyings: [f32; N],
}

impl<const N: usize> ClipVertex<N> {
    /// Create a vertex
    pub const fn new(position: Vec4, varyings: [f32; N]) -> Self {
        Self { position, varyings }
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut varyings = self.varyings;
        for (value, target) in varyings.iter_mut().zip(other.varyings) {
            *value += (target - *value) * t;
        }
        Self { position: self.position.lerp(&other.position, t), varyings }
    }

    /// Signed distance to the near plane `z = -w`; inside when non-negative
    fn near_distance(&self) -> f32 {
        self.position.z + self.position.w
    }
}

/// Clip a triangle against the near plane
///
/// Returns no triangle when it lies fully behind the plane, the input when it
/// lies fully in front, and one or two triangles otherwise.
pub fn clip_near<const N: usize>(triangle: &[ClipVertex<N>; 3]) -> Vec<[ClipVertex<N>; 3]> {
    if triangle.iter().all(|v| v.near_distance() >= 0.0) {
        return vec![*triangle];
    }

    let mut polygon = Vec::with_capacity(4);
    for (i, current) in triangle.iter().enumerate() {
        let next = &triangle[(i + 1) % 3];
        let (d_current, d_next) = (current.near_distance(), next.near_distance());

        if d_current >= 0.0 {
            polygon.push(*current);
        }
        if (d_current >= 0.0) != (d_next >= 0.0) {
            polygon.push(current.lerp(next, d_current / (d_current - d_next)));
        }
    }

    if polygon.len() < 3 {
        return Vec::new();
    }
    (1..polygon.len() - 1).map(|i| [polygon[0], polygon[i], polygon[i + 1]]).collect()
}

#[derive(Debug, Clone, Copy)]
struct ScreenVertex<const N: usize> {
    x: f32,
    y: f32,
    depth: f32,
    inv_w: f32,
    /// Attributes pre-divided by w
    varyings: [f32; N],
}

impl<const N: usize> ScreenVertex<N> {
    fn project(vertex: &ClipVertex<N>, width: f32, height: f32) -> Self {
        let inv_w = 1.0 / vertex.position.w;
        let ndc = vertex.position.xyz() * inv_w;
        Self {
            x: (ndc.x + 1.0) * 0.5 * width,
            y: (1.0 - ndc.y) * 0.5 * height,
            depth: ndc.z * 0.5 + 0.5,
            inv_w,
            varyings: vertex.varyings.map(|v| v * inv_w),
        }
    }
}

/// Twice the signed area of `(a, b, p)`; positive when `p` is inside for the
/// winding used after setup
fn edge<const N: usize>(a: &ScreenVertex<N>, b: &ScreenVertex<N>, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

fn is_top_left<const N: usize>(from: &ScreenVertex<N>, to: &ScreenVertex<N>) -> bool {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    (dy == 0.0 && dx > 0.0) || dy < 0.0
}

fn covers<const N: usize>(weight: f32, from: &ScreenVertex<N>, to: &ScreenVertex<N>) -> bool {
    weight > 0.0 || (weight == 0.0 && is_top_left(from, to))
}

/// Scan-convert one clip-space triangle into a `width` x `height` target
///
/// `emit` receives the pixel, its depth in `[0, 1]` and the interpolated
/// attributes. Fragments outside the depth range are discarded.
pub fn rasterize<const N: usize>(
    width: u32,
    height: u32,
    triangle: &[ClipVertex<N>; 3],
    mut emit: impl FnMut(u32, u32, f32, [f32; N]),
) {
    let (w, h) = (width as f32, height as f32);
    let [a, mut b, mut c] = (*triangle).map(|v| ScreenVertex::project(&v, w, h));

    let mut area = edge(&a, &b, c.x, c.y);
    if area == 0.0 || !area.is_finite() {
        return;
    }
    if area < 0.0 {
        std::mem::swap(&mut b, &mut c);
        area = -area;
    }

    let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
    let max_x = a.x.max(b.x).max(c.x).ceil().min(w) as u32;
    let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
    let max_y = a.y.max(b.y).max(c.y).ceil().min(h) as u32;

    for y in min_y..max_y {
        let py = y as f32 + 0.5;
        for x in min_x..max_x {
            let px = x as f32 + 0.5;

            let w0 = edge(&b, &c, px, py);
            let w1 = edge(&c, &a, px, py);
            let w2 = edge(&a, &b, px, py);
            if !(covers(w0, &b, &c) && covers(w1, &c, &a) && covers(w2, &a, &b)) {
                continue;
            }

            let (l0, l1, l2) = (w0 / area, w1 / area, w2 / area);
            let depth = l0 * a.depth + l1 * b.depth + l2 * c.depth;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }

            let inv_w = l0 * a.inv_w + l1 * b.inv_w + l2 * c.inv_w;
            let mut varyings = [0.0; N];
            for (k, value) in varyings.iter_mut().enumerate() {
                *value = (l0 * a.varyings[k] + l1 * b.varyings[k] + l2 * c.varyings[k]) / inv_w;
            }

            emit(x, y, depth, varyings);
        }
    }
}
