//! Lane ribbon mesh generation
//!
//! Turns an ordered render-frame polyline into a flat strip of the configured
//! width. Each point contributes a left/right vertex pair offset across the
//! path in the ground (XZ) plane; each segment contributes one quad.
//!
//! Interior points use a miter join so consecutive quads share an edge instead
//! of overlapping. The miter is clamped to `miter_limit * half_width`, which
//! keeps hairpin turns from producing long spikes.

use crate::foundation::math::Vec3;
use crate::render::mesh::{Mesh, Vertex};

/// Consecutive points closer than this are merged
const MIN_SEGMENT_LENGTH: f32 = 1e-4;

/// Below this the two neighbouring sides are treated as opposite
const DEGENERATE_MITER: f32 = 1e-4;

/// Build the lane ribbon for `points`
///
/// Returns an empty mesh when fewer than two distinct points remain or the
/// width is zero.
pub fn build_ribbon(points: &[Vec3], width: f32, miter_limit: f32) -> Mesh {
    let path = dedup_points(points);
    let half_width = width * 0.5;
    if path.len() < 2 || half_width <= 0.0 {
        return Mesh::empty();
    }

    let segments: Vec<Segment> = path
        .windows(2)
        .scan(Vec3::x(), |last_side, pair| {
            let segment = Segment::new(pair[0], pair[1], *last_side);
            *last_side = segment.side;
            Some(segment)
        })
        .collect();

    let mut vertices = Vec::with_capacity(path.len() * 2);
    let mut distance = 0.0;

    for (i, point) in path.iter().enumerate() {
        let before = i.checked_sub(1).map(|s| &segments[s]);
        let after = segments.get(i);

        let (offset, normal) = match (before, after) {
            (Some(before), Some(after)) => (
                miter_offset(before.side, after.side, half_width, miter_limit),
                (before.normal + after.normal).normalize(),
            ),
            (Some(only), None) | (None, Some(only)) => (only.side * half_width, only.normal),
            (None, None) => continue,
        };

        if let Some(before) = before {
            distance += before.length;
        }

        let normal: [f32; 3] = normal.into();
        vertices.push(Vertex::new((point - offset).into(), normal, [0.0, distance]));
        vertices.push(Vertex::new((point + offset).into(), normal, [1.0, distance]));
    }

    let mut indices = Vec::with_capacity(segments.len() * 6);
    for i in 0..segments.len() as u32 {
        let (left, right) = (2 * i, 2 * i + 1);
        let (next_left, next_right) = (left + 2, right + 2);
        indices.extend_from_slice(&[left, right, next_left, right, next_right, next_left]);
    }

    log::trace!("lane ribbon: {} points -> {} triangles", path.len(), indices.len() / 3);
    Mesh::new(vertices, indices)
}

/// One path segment with its across-path direction and surface normal
struct Segment {
    /// Unit vector pointing to the right of travel, in the ground plane
    side: Vec3,
    /// Unit surface normal, oriented upward
    normal: Vec3,
    length: f32,
}

impl Segment {
    fn new(from: Vec3, to: Vec3, fallback_side: Vec3) -> Self {
        let direction = to - from;
        let length = direction.norm();
        let ground = Vec3::new(direction.x, 0.0, direction.z);

        // A purely vertical segment has no ground heading; keep the previous side.
        let side = if ground.norm() > MIN_SEGMENT_LENGTH {
            let heading = ground.normalize();
            Vec3::new(-heading.z, 0.0, heading.x)
        } else {
            fallback_side
        };

        let mut normal = side.cross(&(direction / length));
        if normal.norm() <= f32::EPSILON {
            normal = Vec3::y();
        }
        let normal = normal.normalize();
        let normal = if normal.y < 0.0 { -normal } else { normal };

        Self { side, normal, length }
    }
}

/// Offset from the centerline at a join between two segments
fn miter_offset(before: Vec3, after: Vec3, half_width: f32, miter_limit: f32) -> Vec3 {
    let sum = before + after;
    if sum.norm() < DEGENERATE_MITER {
        // The path doubles back on itself; a plain perpendicular is the best we can do.
        return after * half_width;
    }

    let miter = sum.normalize();
    let cos_half_angle = miter.dot(&after).max(DEGENERATE_MITER);
    let length = (half_width / cos_half_angle).min(half_width * miter_limit);
    miter * length
}

fn dedup_points(points: &[Vec3]) -> Vec<Vec3> {
    let mut path: Vec<Vec3> = Vec::with_capacity(points.len());
    for point in points {
        match path.last() {
            Some(last) if (point - last).norm() < MIN_SEGMENT_LENGTH => {}
            _ => path.push(*point),
        }
    }
    path
}
