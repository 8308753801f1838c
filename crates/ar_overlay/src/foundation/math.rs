//! Math utilities and types
//!
//! Provides the vector and matrix types used by the camera model, the route
//! transform and the lane mesh builder.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Camera orientation as three Euler angles in radians
///
/// The angles are applied in the render frame (X right, Y up, Z toward the viewer)
/// with the fixed composition order
///
/// ```text
/// R = Ry(yaw) * Rx(pitch) * Rz(roll)
/// ```
///
/// so a vector is rolled about the viewing axis first, then pitched about the
/// camera's right axis, then yawed about the world up axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    /// Rotation about +Z (the viewing axis)
    pub roll: f32,
    /// Rotation about +X (positive tilts the view up)
    pub pitch: f32,
    /// Rotation about +Y (positive turns the view left)
    pub yaw: f32,
}

impl Rotation {
    /// Create a rotation from roll, pitch and yaw in radians
    pub const fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    /// No rotation
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Homogeneous rotation matrix `Ry(yaw) * Rx(pitch) * Rz(roll)`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::rotation_y(self.yaw) * Mat4::rotation_x(self.pitch) * Mat4::rotation_z(self.roll)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Pi / 4
    pub const QUARTER_PI: f32 = PI * 0.25;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

/// Derive the matrix that transforms surface normals for a given model matrix
///
/// This is the inverse-transpose of the model's upper 3x3 block, which removes
/// translation and undoes non-uniform scale. Returns `None` for a singular model.
pub fn normal_matrix(model: &Mat4) -> Option<Mat3> {
    let linear: Mat3 = model.fixed_view::<3, 3>(0, 0).into_owned();
    linear.try_inverse().map(|inverse| inverse.transpose())
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a translation matrix
    fn translation(offset: &Vec3) -> Mat4;

    /// Create a right-handed perspective projection with clip-space depth in `[-w, w]`
    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn translation(offset: &Vec3) -> Mat4 {
        Mat4::new_translation(offset)
    }

    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // P = [f/a  0   0            0          ]
        //     [0    f   0            0          ]
        //     [0    0   (f+n)/(n-f)  2fn/(n-f)  ]
        //     [0    0   -1           0          ]   with f = 1/tan(fov/2)
        let focal = 1.0 / (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = focal / aspect;
        result[(1, 1)] = focal;
        result[(2, 2)] = (far + near) / (near - far);
        result[(2, 3)] = (2.0 * far * near) / (near - far);
        result[(3, 2)] = -1.0;

        result
    }
}
