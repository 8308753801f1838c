//! Coordinate system conversion for route data
//!
//! Route points arrive in the vehicle frame (X right, Y forward, Z up). The
//! renderer works in a right-handed Y-up frame (X right, Y up, Z toward the
//! viewer). The conversion is a fixed axis permutation with one sign flip:
//!
//! ```text
//! render.x =  vehicle.x
//! render.y =  vehicle.z
//! render.z = -vehicle.y
//! ```

use thiserror::Error;

use crate::foundation::math::Vec3;

/// Route data could not be interpreted as point triples
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateError {
    /// Buffer length is not a multiple of three
    #[error("route buffer of {len} values is not a sequence of (x, y, z) triples")]
    MalformedBuffer {
        /// Number of values received
        len: usize,
    },
}

/// Remap a single vehicle-frame point into the render frame
///
/// This is not an involution: applying it twice gives `(x, -y, -z)`.
pub fn to_render_frame(vehicle: Vec3) -> Vec3 {
    Vec3::new(vehicle.x, vehicle.z, -vehicle.y)
}

/// Remap a flattened vehicle-frame route buffer into render-frame points
///
/// Order and count are preserved exactly. A buffer whose length is not a
/// multiple of three is rejected rather than truncated.
pub fn route_to_render_frame(buffer: &[f64]) -> Result<Vec<Vec3>, CoordinateError> {
    if buffer.len() % 3 != 0 {
        return Err(CoordinateError::MalformedBuffer { len: buffer.len() });
    }

    Ok(buffer
        .chunks_exact(3)
        .map(|triple| to_render_frame(Vec3::new(triple[0] as f32, triple[1] as f32, triple[2] as f32)))
        .collect())
}
