//! Lane styling parameters
//!
//! [`LaneVisualParams`] can only be obtained through its validating
//! constructor, so every instance the renderer sees satisfies the range
//! invariants.

use crate::config::ConfigurationError;
use crate::foundation::math::{Vec3, Vec4};

/// RGBA color with channels in `[0, 1]` once validated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Create a color
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Transparent black
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// True when every channel lies in `[0, 1]`
    pub fn is_valid(&self) -> bool {
        self.validate("color").is_ok()
    }

    /// Check every channel lies in `[0, 1]`; NaN is rejected
    pub fn validate(&self, field: &'static str) -> Result<(), ConfigurationError> {
        for (channel, value) in [('r', self.r), ('g', self.g), ('b', self.b), ('a', self.a)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::ColorChannelOutOfRange { field, channel, value });
            }
        }
        Ok(())
    }

    /// Channels as a vector
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

/// Visual parameters for the AR lane
///
/// * `color` - lane RGBA color
/// * `width` - lane width in meters
/// * `light` - light position in the vehicle frame; `None` disables diffuse lighting
/// * `light_color` - RGBA color of the light
/// * `ambient_color` - ambient RGBA color
#[derive(Debug, Clone, PartialEq)]
pub struct LaneVisualParams {
    color: Color,
    width: f64,
    light: Option<Vec3>,
    light_color: Color,
    ambient_color: Color,
    miter_limit: f32,
}

impl LaneVisualParams {
    /// Default longest miter, as a multiple of half the lane width
    pub const DEFAULT_MITER_LIMIT: f32 = 4.0;

    /// Validate and build lane parameters
    ///
    /// Fails with [`ConfigurationError`] when any color channel is outside
    /// `[0, 1]`, the width is negative or not finite, or the light position is
    /// not finite.
    pub fn new(
        color: Color,
        width: f64,
        light: Option<Vec3>,
        light_color: Color,
        ambient_color: Color,
    ) -> Result<Self, ConfigurationError> {
        color.validate("color")?;
        if !Self::is_valid_width(width) {
            return Err(ConfigurationError::InvalidWidth(width));
        }
        if let Some(position) = light {
            if !position.iter().all(|c| c.is_finite()) {
                return Err(ConfigurationError::InvalidLightPosition([position.x, position.y, position.z]));
            }
        }
        light_color.validate("light_color")?;
        ambient_color.validate("ambient_color")?;

        Ok(Self {
            color,
            width,
            light,
            light_color,
            ambient_color,
            miter_limit: Self::DEFAULT_MITER_LIMIT,
        })
    }

    /// Replace the miter limit; must be finite and at least 1
    pub fn with_miter_limit(mut self, miter_limit: f32) -> Result<Self, ConfigurationError> {
        if !(miter_limit.is_finite() && miter_limit >= 1.0) {
            return Err(ConfigurationError::InvalidMiterLimit(miter_limit));
        }
        self.miter_limit = miter_limit;
        Ok(self)
    }

    /// True for a finite width `>= 0`
    pub fn is_valid_width(width: f64) -> bool {
        width.is_finite() && width >= 0.0
    }

    /// Lane color
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Lane width in meters
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Light position in the vehicle frame
    pub const fn light(&self) -> Option<Vec3> {
        self.light
    }

    /// Light color
    pub const fn light_color(&self) -> Color {
        self.light_color
    }

    /// Ambient color
    pub const fn ambient_color(&self) -> Color {
        self.ambient_color
    }

    /// Miter limit used by the ribbon builder
    pub const fn miter_limit(&self) -> f32 {
        self.miter_limit
    }
}
