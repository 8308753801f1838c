//! Configuration system
//!
//! Overlay settings are plain serde structures that can be loaded from TOML or
//! RON files. Raw values are checked once when they are turned into the typed
//! parameters the renderer consumes; nothing is clamped.

pub use serde::{Serialize, Deserialize};

use crate::render::camera::ClipPlanes;
use crate::render::lane::{Color, LaneVisualParams};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values parsed but failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigurationError),
}

/// A configuration value is outside its valid range
///
/// Raised when visual or camera parameters are constructed. Values are never
/// clamped into range, so a bad config fails loudly instead of rendering wrong.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// An RGBA channel is outside `[0, 1]` (or not a number)
    #[error("{field}: channel {channel} = {value} is outside [0, 1]")]
    ColorChannelOutOfRange {
        /// Which color parameter was rejected
        field: &'static str,
        /// Channel name (`r`, `g`, `b` or `a`)
        channel: char,
        /// Offending value
        value: f32,
    },

    /// Lane width is negative or not finite
    #[error("lane width {0} must be a finite value >= 0")]
    InvalidWidth(f64),

    /// Miter limit must be at least 1
    #[error("miter limit {0} must be a finite value >= 1")]
    InvalidMiterLimit(f32),

    /// Light position contains a non-finite coordinate
    #[error("light position {0:?} must be finite")]
    InvalidLightPosition([f32; 3]),

    /// Clip planes must satisfy `0 < near < far`
    #[error("clip planes near={near} far={far} must satisfy 0 < near < far")]
    InvalidClipPlanes {
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },

    /// Video frames must have a non-zero size
    #[error("video frame size {width}x{height} must be non-zero")]
    InvalidVideoSize {
        /// Frame width in pixels
        width: u32,
        /// Frame height in pixels
        height: u32,
    },
}

/// Camera clipping distances in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipConfig {
    /// Near plane distance
    pub near: f32,
    /// Far plane distance
    pub far: f32,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self { near: 0.1, far: 1000.0 }
    }
}

/// Size of the frames delivered by the video source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self { width: 960, height: 540 }
    }
}

/// Raw lane styling as it appears in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneStyleConfig {
    /// Lane RGBA color
    pub color: [f32; 4],
    /// Lane width in meters
    pub width: f64,
    /// Light position in the vehicle frame (x right, y forward, z up)
    pub light: Option<[f32; 3]>,
    /// Light RGBA color
    pub light_color: [f32; 4],
    /// Ambient RGBA color
    pub ambient_color: [f32; 4],
    /// Longest allowed miter at a turn, as a multiple of half the lane width
    pub miter_limit: f32,
}

impl Default for LaneStyleConfig {
    fn default() -> Self {
        Self {
            color: [0.16, 0.56, 1.0, 0.8],
            width: 1.0,
            light: Some([0.0, -5.0, 10.0]),
            light_color: [1.0, 1.0, 1.0, 1.0],
            ambient_color: [0.4, 0.4, 0.4, 1.0],
            miter_limit: 4.0,
        }
    }
}

/// Top-level overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OverlayConfig {
    /// Background clear color [R, G, B, A] (0.0-1.0 range)
    pub clear_color: [f32; 4],
    /// Camera clip planes
    pub clip: ClipConfig,
    /// Incoming video frame size
    pub video: VideoConfig,
    /// Lane styling
    pub lane: LaneStyleConfig,
}

impl Config for OverlayConfig {}

impl OverlayConfig {
    /// Build validated lane visual parameters from the raw lane section
    pub fn lane_params(&self) -> Result<LaneVisualParams, ConfigurationError> {
        let lane = &self.lane;
        LaneVisualParams::new(
            Color::from(lane.color),
            lane.width,
            lane.light.map(Into::into),
            Color::from(lane.light_color),
            Color::from(lane.ambient_color),
        )?
        .with_miter_limit(lane.miter_limit)
    }

    /// Build validated clip planes
    pub fn clip_planes(&self) -> Result<ClipPlanes, ConfigurationError> {
        ClipPlanes::new(self.clip.near, self.clip.far)
    }

    /// Check the video frame size
    pub fn video_size(&self) -> Result<(u32, u32), ConfigurationError> {
        let VideoConfig { width, height } = self.video;
        if width == 0 || height == 0 {
            return Err(ConfigurationError::InvalidVideoSize { width, height });
        }
        Ok((width, height))
    }

    /// Check every section without keeping the results
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        Color::from(self.clear_color).validate("clear_color")?;
        self.lane_params()?;
        self.clip_planes()?;
        self.video_size()?;
        Ok(())
    }
}
