/// Planar shadow projection onto the ground plane y = 0
///
/// The shadow is the sphere drawn a second time through a matrix that
/// flattens it along rays from the light. Getting ground and shadow onto the
/// screen without z-fighting depends on the buffer-mask sequence produced by
/// [`ShadowProjector::ground_and_shadow_recipe`].
use nalgebra::{Matrix4, Point3};

/// Alpha blending factors for the translucent shadow variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFunc {
    /// src·α + dst·(1 − α)
    SrcAlphaOneMinusSrcAlpha,
}

/// One step of the ground + shadow pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStep {
    DepthWrite(bool),
    ColorWrite(bool),
    Blend(Option<BlendFunc>),
    DrawGround,
    DrawShadow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowProjector {
    light: Point3<f32>,
    matrix: Matrix4<f32>,
}

impl ShadowProjector {
    pub fn new(light: Point3<f32>) -> Self {
        Self {
            light,
            matrix: Self::shadow_matrix(&light),
        }
    }

    pub fn light(&self) -> Point3<f32> {
        self.light
    }

    /// Cached projection for the configured light
    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }

    /// Perspective projection from `light` onto y = 0.
    ///
    /// Goes between the view and the object's model transform:
    /// `view · shadow · model`.
    pub fn shadow_matrix(light: &Point3<f32>) -> Matrix4<f32> {
        let (lx, ly, lz) = (light.x, light.y, light.z);
        #[rustfmt::skip]
        let projection = Matrix4::new(
            ly,  -lx, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, -lz, ly,  0.0,
            0.0, -1.0, 0.0, ly,
        );
        projection
    }

    /// Whether the shadow is drawn this frame: it must be enabled and the eye
    /// must be above the ground.
    pub fn shadow_visible(shadow_enabled: bool, eye: &Point3<f32>) -> bool {
        shadow_enabled && eye.y > 0.0
    }

    /// Buffer-mask sequence for the ground and its shadow.
    ///
    /// 1. depth writes off, ground drawn (colour only)
    /// 2. shadow drawn, still without depth writes, blended if requested
    /// 3. depth writes on, colour writes off, ground drawn again for depth
    /// 4. colour writes back on
    pub fn ground_and_shadow_recipe(draw_shadow: bool, blended: bool) -> Vec<PassStep> {
        let mut steps = vec![PassStep::DepthWrite(false), PassStep::DrawGround];

        if draw_shadow {
            if blended {
                steps.push(PassStep::Blend(Some(BlendFunc::SrcAlphaOneMinusSrcAlpha)));
            }
            steps.push(PassStep::DrawShadow);
            if blended {
                steps.push(PassStep::Blend(None));
            }
        }

        steps.extend([
            PassStep::DepthWrite(true),
            PassStep::ColorWrite(false),
            PassStep::DrawGround,
            PassStep::ColorWrite(true),
        ]);
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Vector3, Vector4};

    fn light() -> Point3<f32> {
        Point3::new(-14.0, 12.0, -3.0)
    }

    #[test]
    fn test_ground_points_are_fixed() {
        let n = ShadowProjector::shadow_matrix(&light());
        for (x, z) in [(0.0, 0.0), (3.5, -2.0), (-105.0, 108.0), (42.0, 7.25)] {
            let p = n * Vector4::new(x, 0.0, z, 1.0);
            let projected = p.xyz() / p.w;
            assert_relative_eq!(projected, Vector3::new(x, 0.0, z), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_point_projects_along_light_ray() {
        let l = light();
        let n = ShadowProjector::shadow_matrix(&l);
        let point = Point3::new(-4.0, 1.0, 4.0);
        let p = n * point.to_homogeneous();
        let projected = Point3::from(p.xyz() / p.w);

        assert_relative_eq!(projected.y, 0.0, epsilon = 1e-5);
        // Light, point and shadow are collinear
        let to_point = point - l;
        let to_shadow = projected - l;
        assert_relative_eq!(to_point.cross(&to_shadow).norm(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_recipe_order() {
        use PassStep::*;
        assert_eq!(
            ShadowProjector::ground_and_shadow_recipe(true, false),
            vec![
                DepthWrite(false),
                DrawGround,
                DrawShadow,
                DepthWrite(true),
                ColorWrite(false),
                DrawGround,
                ColorWrite(true),
            ]
        );
    }

    #[test]
    fn test_blended_recipe_wraps_shadow_only() {
        use PassStep::*;
        let steps = ShadowProjector::ground_and_shadow_recipe(true, true);
        let shadow = steps.iter().position(|s| *s == DrawShadow).unwrap();
        assert_eq!(steps[shadow - 1], Blend(Some(BlendFunc::SrcAlphaOneMinusSrcAlpha)));
        assert_eq!(steps[shadow + 1], Blend(None));
        assert_eq!(steps[shadow - 2], DrawGround);
    }

    #[test]
    fn test_hidden_shadow_skips_step_two() {
        let steps = ShadowProjector::ground_and_shadow_recipe(false, true);
        assert!(!steps.contains(&PassStep::DrawShadow));
        assert!(!steps.iter().any(|s| matches!(s, PassStep::Blend(_))));
        assert_eq!(steps.len(), 6);
    }

    #[test]
    fn test_visibility() {
        assert!(ShadowProjector::shadow_visible(true, &Point3::new(7.0, 3.0, -10.0)));
        assert!(!ShadowProjector::shadow_visible(true, &Point3::new(7.0, 0.0, -10.0)));
        assert!(!ShadowProjector::shadow_visible(false, &Point3::new(7.0, 3.0, -10.0)));
    }
}
