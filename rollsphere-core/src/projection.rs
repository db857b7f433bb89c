/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::settings::CameraSettings;

const VIEW_EPSILON: f32 = 1e-5;

/// World axis an eye translation moves along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub at: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees
    pub fovy: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
    home: Point3<f32>,
}

impl Camera {
    pub fn new(settings: &CameraSettings, width: u32, height: u32) -> Self {
        let [ex, ey, ez] = settings.eye;
        let [ax, ay, az] = settings.at;
        let home = Point3::new(ex, ey, ez);
        Self {
            eye: home,
            at: Point3::new(ax, ay, az),
            up: Vector3::from(settings.up),
            fovy: settings.fovy,
            aspect: aspect_ratio(width, height),
            z_near: settings.z_near,
            z_far: settings.z_far,
            home,
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye, &self.at, &self.up)
    }

    /// Create the perspective projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fovy.to_radians(), self.z_near, self.z_far)
    }

    /// Move the eye along a world axis. A move that would put the eye on the
    /// line through `at` along `up` has no view and is refused, leaving the
    /// eye where it was. Returns whether the eye moved.
    pub fn translate_eye(&mut self, axis: Axis, delta: f32) -> bool {
        let mut eye = self.eye;
        match axis {
            Axis::X => eye.x += delta,
            Axis::Y => eye.y += delta,
            Axis::Z => eye.z += delta,
        }
        if (eye - self.at).cross(&self.up).norm() <= VIEW_EPSILON {
            return false;
        }
        self.eye = eye;
        true
    }

    /// Back to the startup viewpoint
    pub fn reset(&mut self) {
        self.eye = self.home;
    }

    pub fn reshape(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraSettings::default(), 512, 512)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(&CameraSettings::default(), 800, 600);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(camera.eye, Point3::new(7.0, 3.0, -10.0));
    }

    #[test]
    fn test_view_matrix_maps_eye_to_origin() {
        let camera = Camera::default();
        let eye = camera.view_matrix().transform_point(&camera.eye);
        assert_relative_eq!(eye, Point3::origin(), epsilon = 1e-5);
    }

    #[test]
    fn test_translate_and_reset() {
        let mut camera = Camera::default();
        camera.translate_eye(Axis::Y, -1.0);
        camera.translate_eye(Axis::Z, 2.0);
        assert_eq!(camera.eye, Point3::new(7.0, 2.0, -8.0));

        camera.reset();
        assert_eq!(camera.eye, Point3::new(7.0, 3.0, -10.0));
    }

    #[test]
    fn test_eye_never_lands_above_target() {
        let mut camera = Camera::default();
        for _ in 0..7 {
            assert!(camera.translate_eye(Axis::X, -1.0));
        }
        for _ in 0..9 {
            assert!(camera.translate_eye(Axis::Z, 1.0));
        }
        assert!(!camera.translate_eye(Axis::Z, 1.0));
        assert_eq!(camera.eye, Point3::new(0.0, 3.0, -1.0));
        assert!(camera.view_matrix().iter().all(|v| v.is_finite()));

        assert!(camera.translate_eye(Axis::Y, 1.0));
        assert_eq!(camera.eye, Point3::new(0.0, 4.0, -1.0));
    }

    #[test]
    fn test_zero_height_reshape() {
        let mut camera = Camera::default();
        camera.reshape(640, 0);
        assert!(camera.aspect.is_finite());
    }
}
