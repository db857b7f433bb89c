/// Rolling sphere kinematics along the closed A → B → C path
use log::debug;
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::SceneError;
use crate::settings::RollingSettings;
use crate::transform::Transform;

/// Current pose of the rolling sphere
#[derive(Debug, Clone, PartialEq)]
pub struct RollingPose {
    pub position: Point3<f32>,
    /// Index of the waypoint the current segment starts from
    pub current_segment: usize,
    /// Unit vector towards the segment's target waypoint
    pub direction: Vector3<f32>,
    /// Unit vector, up × direction
    pub rotation_axis: Vector3<f32>,
    /// Degrees accumulated since the last reset
    pub step_angle: f32,
    /// Product of every baked step rotation
    pub accumulated_rotation: Matrix4<f32>,
}

/// Advances the sphere by a fixed arc length per tick, rolling without slipping
#[derive(Debug, Clone)]
pub struct RollingKinematics {
    waypoints: [Point3<f32>; 3],
    speed: f32,
    arrival_epsilon: f32,
    angle_cap: Option<f32>,
    sphere_radius: f32,
    pose: RollingPose,
}

impl RollingKinematics {
    /// Start at the first waypoint heading for the second
    pub fn new(settings: &RollingSettings, sphere_radius: f32) -> Self {
        let waypoints = settings.waypoints();
        let (direction, rotation_axis) = heading(&waypoints[0], &waypoints[1]);
        Self {
            waypoints,
            speed: settings.speed,
            arrival_epsilon: settings.arrival_epsilon,
            angle_cap: settings.angle_cap(),
            sphere_radius,
            pose: RollingPose {
                position: waypoints[0],
                current_segment: 0,
                direction,
                rotation_axis,
                step_angle: 0.0,
                accumulated_rotation: Matrix4::identity(),
            },
        }
    }

    pub fn pose(&self) -> &RollingPose {
        &self.pose
    }

    pub fn waypoints(&self) -> &[Point3<f32>; 3] {
        &self.waypoints
    }

    pub fn sphere_radius(&self) -> f32 {
        self.sphere_radius
    }

    /// Waypoint the sphere is heading for
    pub fn target(&self) -> Point3<f32> {
        self.waypoints[(self.pose.current_segment + 1) % 3]
    }

    /// Rolling needs a sphere with a positive radius
    pub fn ensure_rollable(&self) -> Result<(), SceneError> {
        if self.sphere_radius > 0.0 && self.sphere_radius.is_finite() {
            Ok(())
        } else {
            Err(SceneError::DegenerateMesh {
                radius: self.sphere_radius,
            })
        }
    }

    /// Rotation in degrees equivalent to one tick's arc length
    pub fn step_degrees(&self) -> Result<f32, SceneError> {
        self.ensure_rollable()?;
        Ok(self.speed / (2.0 * std::f32::consts::PI * self.sphere_radius) * 360.0)
    }

    /// Incremental rotation for the current step angle
    pub fn step_rotation(&self) -> Matrix4<f32> {
        Transform::rotation_matrix(self.pose.step_angle, &self.pose.rotation_axis)
    }

    /// One animation tick
    pub fn advance(&mut self) -> Result<(), SceneError> {
        let step = self.step_degrees()?;
        let pose = &mut self.pose;

        pose.position += pose.direction * self.speed;
        pose.step_angle += step;

        let r = Transform::rotation_matrix(pose.step_angle, &pose.rotation_axis);
        pose.accumulated_rotation = r * pose.accumulated_rotation;

        if let Some(cap) = self.angle_cap {
            if pose.step_angle > cap {
                pose.step_angle = 0.0;
            }
        }

        let target = self.target();
        if (self.pose.position - target).norm() < self.arrival_epsilon {
            self.arrive(target);
        }
        Ok(())
    }

    fn arrive(&mut self, target: Point3<f32>) {
        let pose = &mut self.pose;
        pose.position = target;
        pose.current_segment = (pose.current_segment + 1) % 3;

        let next = self.waypoints[(pose.current_segment + 1) % 3];
        let (direction, rotation_axis) = heading(&pose.position, &next);
        pose.direction = direction;
        pose.rotation_axis = rotation_axis;
        debug!(
            "Reached waypoint {}, rolling towards {:?}",
            pose.current_segment, next
        );
    }
}

/// Unit direction from `from` to `to` and the matching rolling axis
fn heading(from: &Point3<f32>, to: &Point3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let direction = (to - from).normalize();
    let axis = Vector3::y().cross(&direction).normalize();
    (direction, axis)
}
