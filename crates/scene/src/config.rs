//! Globe tuning knobs. Every field has a default, so a config document only
//! needs the keys it overrides.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {err}"),
            ConfigError::Parse(err) => write!(f, "Config parse error: {err}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub globe: GlobeGeometry,
    pub labels: LabelConfig,
    pub fly_to: FlyToConfig,
    pub picking: PickingConfig,
    pub controls: ControlsConfig,
    pub initial_location: InitialLocation,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeGeometry {
    pub radius: f64,
    /// Fly-to camera distance from the globe center.
    pub camera_distance: f64,
    pub camera_min_distance: f64,
    pub camera_max_distance: f64,
    /// Bounding-sphere radius used for picking.
    pub marker_size: f64,
    /// Marker lift above the surface as a fraction of `radius`.
    pub marker_height: f64,
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for GlobeGeometry {
    fn default() -> Self {
        Self {
            radius: 200.0,
            camera_distance: 600.0,
            camera_min_distance: 300.0,
            camera_max_distance: 700.0,
            marker_size: 1.5,
            marker_height: 0.001,
            fov_y_deg: 45.0,
            near: 1.0,
            far: 2000.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub max_labels: usize,
    /// Labels show only while `|camera| / camera_max_distance` is below this.
    pub distance_threshold: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            max_labels: 15,
            distance_threshold: 0.7,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyToConfig {
    pub duration_ms: f64,
}

impl Default for FlyToConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1000.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Opt-in: ignore markers hidden behind the globe along the pick ray.
    pub occlude_by_globe: bool,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            occlude_by_globe: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub rotate_speed: f64,
    pub damping_factor: f64,
    pub zoom_speed: f64,
    pub keyboard_rotate_speed: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 0.5,
            damping_factor: 0.1,
            zoom_speed: 1.0,
            keyboard_rotate_speed: 2.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialLocation {
    pub lat: f64,
    pub lng: f64,
}

impl Default for InitialLocation {
    fn default() -> Self {
        Self {
            lat: 40.7128,
            lng: -74.006,
        }
    }
}

impl GlobeConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: GlobeConfig = serde_json::from_str(payload).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let payload = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&payload)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.globe;
        let positive = [
            ("globe.radius", g.radius),
            ("globe.marker_size", g.marker_size),
            ("globe.near", g.near),
            ("globe.camera_min_distance", g.camera_min_distance),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be > 0, got {v}")));
            }
        }
        if !(g.marker_height.is_finite() && g.marker_height >= 0.0) {
            return Err(ConfigError::Invalid(
                "globe.marker_height must be >= 0".to_string(),
            ));
        }
        if !(g.camera_max_distance >= g.camera_min_distance) {
            return Err(ConfigError::Invalid(
                "globe.camera_max_distance must be >= camera_min_distance".to_string(),
            ));
        }
        if !(g.camera_distance > g.radius) {
            return Err(ConfigError::Invalid(
                "globe.camera_distance must lie outside the globe".to_string(),
            ));
        }
        if !(g.fov_y_deg > 0.0 && g.fov_y_deg < 180.0) {
            return Err(ConfigError::Invalid(
                "globe.fov_y_deg must be in (0, 180)".to_string(),
            ));
        }
        if !(g.far > g.near) {
            return Err(ConfigError::Invalid("globe.far must be > near".to_string()));
        }
        if !(self.fly_to.duration_ms.is_finite() && self.fly_to.duration_ms >= 0.0) {
            return Err(ConfigError::Invalid(
                "fly_to.duration_ms must be >= 0".to_string(),
            ));
        }
        if !self.labels.distance_threshold.is_finite() {
            return Err(ConfigError::Invalid(
                "labels.distance_threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
