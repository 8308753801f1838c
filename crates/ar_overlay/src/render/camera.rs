//! # AR Camera Model
//!
//! Builds the view-projection matrix that places route geometry over the live
//! camera image.
//!
//! ## Design Principles
//! - **Library-agnostic**: no backend types in camera math
//! - **No caching**: the pose changes every frame, so every matrix is derived fresh
//! - **Display aspect drives projection**: the sensor aspect ratio is kept for
//!   reference only; the surface the frame is shown on decides horizontal extent

use crate::config::ConfigurationError;
use crate::foundation::math::{Mat4, Mat4Ext, Rotation, Vec3};

/// Camera intrinsics and pose for one frame, as reported by the data provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParameters {
    /// Vertical field of view in radians
    pub vertical_fov_radians: f32,
    /// Width / height of the camera sensor
    pub sensor_aspect_ratio: f32,
    /// Roll in radians
    pub roll: f32,
    /// Pitch in radians
    pub pitch: f32,
    /// Yaw in radians
    pub yaw: f32,
    /// Camera displacement along the up axis in meters
    pub vertical_offset: f32,
}

impl CameraParameters {
    /// Number of floats in the packed provider layout
    pub const PACKED_LEN: usize = 6;

    /// Decode the packed `[fov, aspect, roll, pitch, yaw, offset]` layout
    ///
    /// Returns `None` when the slice is too short. Extra trailing values are ignored.
    pub fn from_raw(raw: &[f32]) -> Option<Self> {
        match *raw {
            [vertical_fov_radians, sensor_aspect_ratio, roll, pitch, yaw, vertical_offset, ..] => Some(Self {
                vertical_fov_radians,
                sensor_aspect_ratio,
                roll,
                pitch,
                yaw,
                vertical_offset,
            }),
            _ => None,
        }
    }

    /// Camera orientation
    pub const fn rotation(&self) -> Rotation {
        Rotation::new(self.roll, self.pitch, self.yaw)
    }

    /// Camera translation in the render frame
    pub fn translation(&self) -> Vec3 {
        Vec3::new(0.0, self.vertical_offset, 0.0)
    }
}

/// Near and far clipping distances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlanes {
    near: f32,
    far: f32,
}

impl ClipPlanes {
    /// Validate and create clip planes; requires `0 < near < far`, both finite
    pub fn new(near: f32, far: f32) -> Result<Self, ConfigurationError> {
        if near.is_finite() && far.is_finite() && near > 0.0 && near < far {
            Ok(Self { near, far })
        } else {
            Err(ConfigurationError::InvalidClipPlanes { near, far })
        }
    }

    /// Near plane distance
    pub const fn near(&self) -> f32 {
        self.near
    }

    /// Far plane distance
    pub const fn far(&self) -> f32 {
        self.far
    }
}

impl Default for ClipPlanes {
    fn default() -> Self {
        Self { near: 0.1, far: 1000.0 }
    }
}

/// Per-frame AR camera
///
/// # Coordinate System
/// Right-handed, Y-up render frame:
/// - X+ = Right
/// - Y+ = Up
/// - Z+ = Toward the viewer (the camera looks down -Z)
///
/// The camera-to-world transform is `T(translation) * R(rotation)`; the view
/// matrix is its inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArCamera {
    /// Vertical field of view in radians
    pub vertical_fov: f32,
    /// Camera sensor aspect ratio
    pub sensor_aspect: f32,
    /// Display surface aspect ratio
    pub view_aspect: f32,
    /// Camera orientation
    pub rotation: Rotation,
    /// Camera position in the render frame
    pub translation: Vec3,
    /// Clipping distances
    pub clip: ClipPlanes,
}

impl ArCamera {
    /// Create a camera from provider parameters and the current surface aspect
    pub fn new(params: &CameraParameters, view_aspect: f32, clip: ClipPlanes) -> Self {
        Self {
            vertical_fov: params.vertical_fov_radians,
            sensor_aspect: params.sensor_aspect_ratio,
            view_aspect,
            rotation: params.rotation(),
            translation: params.translation(),
            clip,
        }
    }

    /// Perspective projection for the display surface
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_gl(self.vertical_fov, self.view_aspect, self.clip.near(), self.clip.far())
    }

    /// World-to-camera transform
    ///
    /// Computed as `R^T * T(-t)`, the closed-form inverse of the rigid
    /// camera-to-world transform.
    pub fn view_matrix(&self) -> Mat4 {
        let inverse_rotation = self.rotation.to_matrix().transpose();
        inverse_rotation * Mat4::translation(&-self.translation)
    }

    /// Combined `projection * view`
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Horizontal field of view seen on the display surface
    pub fn horizontal_fov(&self) -> f32 {
        horizontal_fov(self.vertical_fov, self.view_aspect)
    }

    /// Horizontal field of view of the sensor itself
    pub fn sensor_horizontal_fov(&self) -> f32 {
        horizontal_fov(self.vertical_fov, self.sensor_aspect)
    }
}

/// Horizontal FOV for a vertical FOV and aspect ratio
fn horizontal_fov(vertical_fov: f32, aspect: f32) -> f32 {
    2.0 * (aspect * (vertical_fov * 0.5).tan()).atan()
}

/// Build the combined view-projection matrix for one frame
///
/// `view_aspect` must be positive; the renderer only calls this once the
/// surface size is known.
pub fn build_view_projection(
    vertical_fov: f32,
    sensor_aspect: f32,
    view_aspect: f32,
    rotation: Rotation,
    translation: Vec3,
    clip: ClipPlanes,
) -> Mat4 {
    debug_assert!(view_aspect > 0.0, "view aspect must be known before projecting");
    ArCamera {
        vertical_fov,
        sensor_aspect,
        view_aspect,
        rotation,
        translation,
        clip,
    }
    .view_projection_matrix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Vec4};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn project(matrix: &Mat4, point: Vec3) -> Vec3 {
        let clip = matrix * Vec4::new(point.x, point.y, point.z, 1.0);
        Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    /// Horizontal FOV recovered from the projection matrix itself
    fn matrix_horizontal_fov(projection: &Mat4) -> f32 {
        2.0 * (1.0 / projection[(0, 0)]).atan()
    }

    fn params(fov: f32, aspect: f32) -> CameraParameters {
        CameraParameters {
            vertical_fov_radians: fov,
            sensor_aspect_ratio: aspect,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            vertical_offset: 0.0,
        }
    }

    #[test]
    fn test_point_ahead_projects_to_center() {
        let aspect = 16.0 / 9.0;
        let matrix = build_view_projection(
            0.785,
            aspect,
            aspect,
            Rotation::identity(),
            Vec3::zeros(),
            ClipPlanes::default(),
        );

        let ndc = project(&matrix, Vec3::new(0.0, 0.0, -10.0));
        assert_relative_eq!(ndc.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(ndc.y, 0.0, epsilon = EPSILON);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_horizontal_fov_matches_perspective_relation() {
        let cases = [(0.785_f32, 16.0_f32 / 9.0), (1.0, 4.0 / 3.0), (0.5, 1.0)];
        for (fov, aspect) in cases {
            let camera = ArCamera::new(&params(fov, aspect), aspect, ClipPlanes::default());
            let expected = 2.0 * (aspect * (fov / 2.0).tan()).atan();

            assert_relative_eq!(matrix_horizontal_fov(&camera.projection_matrix()), expected, epsilon = EPSILON);
            assert_relative_eq!(camera.horizontal_fov(), expected, epsilon = EPSILON);
            assert_relative_eq!(camera.sensor_horizontal_fov(), expected, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_view_aspect_drives_horizontal_extent() {
        let fov = 0.785;
        let sensor = 4.0 / 3.0;
        let view = 16.0 / 9.0;
        let camera = ArCamera::new(&params(fov, sensor), view, ClipPlanes::default());

        let expected = 2.0 * (view * (fov / 2.0).tan()).atan();
        assert_relative_eq!(matrix_horizontal_fov(&camera.projection_matrix()), expected, epsilon = EPSILON);
        assert!(camera.horizontal_fov() > camera.sensor_horizontal_fov());

        // A point on the edge of the view frustum lands on the NDC edge.
        let half_width_at_10m = 10.0 * (expected / 2.0).tan();
        let ndc = project(&camera.view_projection_matrix(), Vec3::new(half_width_at_10m, 0.0, -10.0));
        assert_relative_eq!(ndc.x, 1.0, epsilon = EPSILON);

        // Vertical extent does not depend on either aspect ratio.
        assert_relative_eq!(camera.projection_matrix()[(1, 1)], 1.0 / (fov / 2.0).tan(), epsilon = EPSILON);
    }

    #[test]
    fn test_vertical_offset_moves_road_below_center() {
        let mut camera_params = params(0.785, 16.0 / 9.0);
        camera_params.vertical_offset = 1.5;
        let camera = ArCamera::new(&camera_params, 16.0 / 9.0, ClipPlanes::default());

        let ndc = project(&camera.view_projection_matrix(), Vec3::new(0.0, 0.0, -10.0));
        assert!(ndc.y < 0.0);
        assert_relative_eq!(ndc.x, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_view_matrix_inverts_camera_to_world() {
        let camera = ArCamera {
            vertical_fov: 0.9,
            sensor_aspect: 1.5,
            view_aspect: 1.5,
            rotation: Rotation::new(0.05, -0.1, 0.3),
            translation: Vec3::new(0.0, 1.4, 0.0),
            clip: ClipPlanes::default(),
        };
        let camera_to_world = Mat4::translation(&camera.translation) * camera.rotation.to_matrix();

        assert_relative_eq!(camera.view_matrix() * camera_to_world, Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_yaw_turns_view_toward_point() {
        // Yawing left by 90 degrees makes a point on -X appear straight ahead.
        let camera = ArCamera {
            vertical_fov: 0.785,
            sensor_aspect: 1.0,
            view_aspect: 1.0,
            rotation: Rotation::new(0.0, 0.0, constants::HALF_PI),
            translation: Vec3::zeros(),
            clip: ClipPlanes::default(),
        };

        let ndc = project(&camera.view_projection_matrix(), Vec3::new(-10.0, 0.0, 0.0));
        assert_relative_eq!(ndc.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(ndc.y, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_from_raw_layout() {
        let raw = [0.8, 1.5, 0.01, -0.02, 0.03, 1.2];
        let decoded = CameraParameters::from_raw(&raw).unwrap();

        assert_eq!(decoded.vertical_fov_radians, 0.8);
        assert_eq!(decoded.sensor_aspect_ratio, 1.5);
        assert_eq!(decoded.rotation(), Rotation::new(0.01, -0.02, 0.03));
        assert_eq!(decoded.translation(), Vec3::new(0.0, 1.2, 0.0));

        assert!(CameraParameters::from_raw(&raw[..5]).is_none());
    }

    #[test]
    fn test_clip_plane_validation() {
        assert!(ClipPlanes::new(0.1, 100.0).is_ok());
        assert!(ClipPlanes::new(0.0, 100.0).is_err());
        assert!(ClipPlanes::new(5.0, 5.0).is_err());
        assert!(ClipPlanes::new(0.1, f32::INFINITY).is_err());
    }
}
