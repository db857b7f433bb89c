/// Transformation matrices shared by the kinematics and the frame composer
use nalgebra::{Matrix3, Matrix4, Unit, Vector3};

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation by `degrees` about `axis`; the axis does not need unit length.
    /// A zero axis yields the identity.
    pub fn rotation_matrix(degrees: f32, axis: &Vector3<f32>) -> Matrix4<f32> {
        match Unit::try_new(*axis, f32::EPSILON) {
            Some(axis) => Matrix4::from_axis_angle(&axis, degrees.to_radians()),
            None => Matrix4::identity(),
        }
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Rotation/scale part of a 4x4 transform
    pub fn upper_left(m: &Matrix4<f32>) -> Matrix3<f32> {
        m.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Inverse transpose of the model-view's upper-left block.
    ///
    /// Singular model-views (the flattening shadow transform) fall back to the
    /// block itself.
    pub fn normal_matrix(model_view: &Matrix4<f32>) -> Matrix3<f32> {
        let m = Self::upper_left(model_view);
        m.try_inverse().map(|inv| inv.transpose()).unwrap_or(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn test_rotation_about_unnormalized_axis() {
        let r = Transform::rotation_matrix(90.0, &Vector3::new(0.0, 5.0, 0.0));
        let x = r * Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(x, Vector4::new(0.0, 0.0, -1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_zero_axis_is_identity() {
        let r = Transform::rotation_matrix(30.0, &Vector3::zeros());
        assert!((r - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_of_uniform_scale() {
        let m = Matrix4::new_scaling(2.0);
        let n = Transform::normal_matrix(&m);
        assert_relative_eq!(n, Matrix3::identity() * 0.5, epsilon = 1e-6);
    }
}
