/// Startup settings, optionally read from a TOML file
///
/// Every field has a default, so a partial file (or no file at all) yields
/// the stock scene: a camera looking at the origin from (7, 3, -10), a
/// triangular path hovering one unit above the ground, fog constants and a
/// 300-particle firework burst.
use nalgebra::{Point3, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SettingsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SceneSettings {
    pub camera: CameraSettings,
    pub rolling: RollingSettings,
    pub fog: FogSettings,
    pub fireworks: FireworksSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub eye: [f32; 3],
    pub at: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    pub fovy: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Distance the eye moves per translate command
    pub eye_step: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: [7.0, 3.0, -10.0],
            at: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fovy: 45.0,
            z_near: 0.1,
            z_far: 50.0,
            eye_step: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingSettings {
    pub waypoints: [[f32; 3]; 3],
    /// Arc length travelled per tick
    pub speed: f32,
    pub arrival_epsilon: f32,
    /// Step angle (degrees) beyond which the incremental angle restarts at 0.
    /// Zero disables the cap.
    pub step_angle_cap: f32,
}

impl Default for RollingSettings {
    fn default() -> Self {
        Self {
            waypoints: [[-4.0, 1.0, 4.0], [3.0, 1.0, -4.0], [-3.0, 1.0, -3.0]],
            speed: 0.02,
            arrival_epsilon: 0.05,
            step_angle_cap: 4.0,
        }
    }
}

impl RollingSettings {
    pub fn waypoints(&self) -> [Point3<f32>; 3] {
        self.waypoints.map(|[x, y, z]| Point3::new(x, y, z))
    }

    pub fn angle_cap(&self) -> Option<f32> {
        (self.step_angle_cap > 0.0).then_some(self.step_angle_cap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    pub color: [f32; 4],
    pub start: f32,
    pub end: f32,
    pub density: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            color: [0.7, 0.7, 0.7, 0.5],
            start: 0.0,
            end: 18.0,
            density: 0.09,
        }
    }
}

impl FogSettings {
    pub fn color(&self) -> Vector4<f32> {
        Vector4::from(self.color)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireworksSettings {
    pub count: usize,
    /// Burst period in seconds
    pub t_max: f32,
    pub seed: u64,
    pub start_position: [f32; 3],
}

impl Default for FireworksSettings {
    fn default() -> Self {
        Self {
            count: 300,
            t_max: 4.0,
            seed: 0x5eed,
            start_position: [0.0, 0.1, 0.0],
        }
    }
}

impl FireworksSettings {
    pub fn start_position(&self) -> Vector3<f32> {
        Vector3::from(self.start_position)
    }
}

impl SceneSettings {
    /// Load and validate settings from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            toml::from_str(contents).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let camera = &self.camera;
        if !(camera.z_near > 0.0 && camera.z_near < camera.z_far) {
            return Err(SettingsError::Invalid(format!(
                "clip planes must satisfy 0 < z_near < z_far (got {} and {})",
                camera.z_near, camera.z_far
            )));
        }
        if !(camera.fovy > 0.0 && camera.fovy < 180.0) {
            return Err(SettingsError::Invalid(format!("fovy {} out of range", camera.fovy)));
        }

        let rolling = &self.rolling;
        if rolling.arrival_epsilon <= 0.0 {
            return Err(SettingsError::Invalid("arrival_epsilon must be positive".into()));
        }
        // A step longer than the arrival window could jump over a waypoint.
        if !(rolling.speed > 0.0 && rolling.speed < 2.0 * rolling.arrival_epsilon) {
            return Err(SettingsError::Invalid(format!(
                "speed must lie in (0, {}), got {}",
                2.0 * rolling.arrival_epsilon,
                rolling.speed
            )));
        }
        let points = rolling.waypoints();
        for i in 0..3 {
            let next = points[(i + 1) % 3];
            let leg = next - points[i];
            if leg.norm() <= rolling.arrival_epsilon {
                return Err(SettingsError::Invalid(format!(
                    "waypoints {i} and {} coincide",
                    (i + 1) % 3
                )));
            }
            if leg.cross(&Vector3::y()).norm() < 1e-6 {
                return Err(SettingsError::Invalid(format!("path segment {i} is vertical")));
            }
        }

        if self.fireworks.count == 0 {
            return Err(SettingsError::Invalid("fireworks.count must be non-zero".into()));
        }
        if self.fireworks.t_max <= 0.0 {
            return Err(SettingsError::Invalid("fireworks.t_max must be positive".into()));
        }
        if self.fog.end <= self.fog.start {
            return Err(SettingsError::Invalid("fog.end must exceed fog.start".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = SceneSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.fireworks.count, 300);
        assert_eq!(settings.rolling.angle_cap(), Some(4.0));
    }

    #[test]
    fn test_partial_toml() {
        let settings = SceneSettings::from_toml(
            r#"
            [camera]
            fovy = 60.0

            [rolling]
            step_angle_cap = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(settings.camera.fovy, 60.0);
        assert_eq!(settings.camera.eye, [7.0, 3.0, -10.0]);
        assert_eq!(settings.rolling.angle_cap(), None);
    }

    #[test]
    fn test_rejects_overshooting_speed() {
        let result = SceneSettings::from_toml("[rolling]\nspeed = 0.5\n");
        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_toml() {
        let result = SceneSettings::from_toml("[camera\n");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }
}
