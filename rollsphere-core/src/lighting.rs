/// Light, material and fog parameter sets handed to the shading stage
///
/// Nothing here evaluates lighting per fragment. `LightingModel` only decides
/// which lights are live for the current modes, moves light-space vectors into
/// the eye frame, and picks the material for the object being drawn.
use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};

use crate::config::{
    FogMode, GroundTextureMode, LatticeOverlay, LightSourceMode, RenderModeConfig, ShadingMode,
    SphereMappingOrientation, SphereMappingSpace, SphereTextureMode,
};
use crate::projection::Axis;
use crate::settings::FogSettings;
use crate::transform::Transform;

/// Distance attenuation of the positional light: 1 / (c + l·d + q·d²)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

/// Fixed light rig of the scene
#[derive(Debug, Clone, PartialEq)]
pub struct LightConfig {
    pub global_ambient: Vector4<f32>,
    /// World frame, w = 1
    pub positional: Vector4<f32>,
    /// Eye frame, w = 0
    pub directional: Vector4<f32>,
    pub directional_ambient: Vector4<f32>,
    pub directional_diffuse: Vector4<f32>,
    pub directional_specular: Vector4<f32>,
    /// World-frame unit direction of the spot cone axis
    pub spot_direction: Vector3<f32>,
    pub spot_exponent: f32,
    pub spot_cutoff_degrees: f32,
    pub attenuation: Attenuation,
}

impl LightConfig {
    pub fn new() -> Self {
        let positional = Vector4::new(-14.0, 12.0, -3.0, 1.0);
        let spot_target = Point3::new(-6.0, 0.0, -4.5);
        Self {
            global_ambient: Vector4::new(1.0, 1.0, 1.0, 1.0),
            positional,
            directional: Vector4::new(0.1, 0.0, -1.0, 0.0),
            directional_ambient: Vector4::new(0.0, 0.0, 0.0, 1.0),
            directional_diffuse: Vector4::new(0.8, 0.8, 0.8, 1.0),
            directional_specular: Vector4::new(0.2, 0.2, 0.2, 1.0),
            spot_direction: (spot_target - Point3::from(positional.xyz())).normalize(),
            spot_exponent: 15.0,
            spot_cutoff_degrees: 20.0,
            attenuation: Attenuation {
                constant: 2.0,
                linear: 0.01,
                quadratic: 0.001,
            },
        }
    }

    /// Light position as a world point, for the shadow projection
    pub fn positional_point(&self) -> Point3<f32> {
        Point3::from(self.positional.xyz())
    }

    pub fn spot_cutoff_radians(&self) -> f32 {
        self.spot_cutoff_degrees * std::f32::consts::PI / 180.0
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialConfig {
    pub ambient: Vector4<f32>,
    pub diffuse: Vector4<f32>,
    pub specular: Vector4<f32>,
    pub shininess: f32,
}

impl MaterialConfig {
    /// Unlit fallback: only the diffuse colour survives
    pub fn flat(diffuse: Vector4<f32>) -> Self {
        Self {
            ambient: Vector4::new(0.0, 0.0, 0.0, 1.0),
            diffuse,
            specular: Vector4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 0.0,
        }
    }

    pub fn ground() -> Self {
        Self {
            ambient: Vector4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vector4::new(0.0, 1.0, 0.0, 1.0),
            specular: Vector4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 0.0,
        }
    }

    pub fn sphere() -> Self {
        let gold = Vector4::new(1.0, 0.84, 0.0, 1.0);
        Self {
            ambient: Vector4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: gold,
            specular: gold,
            shininess: 125.0,
        }
    }
}

/// What a parameter set is being computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTarget {
    Axis(Axis),
    Ground,
    Shadow,
    Sphere,
}

impl DrawTarget {
    /// Lit material, or `None` for targets that are always drawn flat
    fn lit_material(self) -> Option<MaterialConfig> {
        match self {
            DrawTarget::Ground => Some(MaterialConfig::ground()),
            DrawTarget::Sphere => Some(MaterialConfig::sphere()),
            DrawTarget::Axis(_) | DrawTarget::Shadow => None,
        }
    }

    fn flat_color(self, blended_shadow: bool) -> Vector4<f32> {
        match self {
            DrawTarget::Axis(Axis::X) => Vector4::new(1.0, 0.0, 0.0, 1.0),
            DrawTarget::Axis(Axis::Y) => Vector4::new(1.0, 0.0, 1.0, 1.0),
            DrawTarget::Axis(Axis::Z) => Vector4::new(0.0, 0.0, 1.0, 1.0),
            DrawTarget::Ground => Vector4::new(0.0, 1.0, 0.0, 1.0),
            DrawTarget::Sphere => Vector4::new(1.0, 0.84, 0.0, 1.0),
            DrawTarget::Shadow => {
                let alpha = if blended_shadow { 0.65 } else { 1.0 };
                Vector4::new(0.25, 0.25, 0.25, alpha)
            }
        }
    }
}

/// Shader switches derived from the target and the active modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShaderFlags {
    pub axes: bool,
    pub plane: bool,
    pub wireframe: bool,
    pub shadow: bool,
    pub blended_shadow: bool,
    pub lighting: bool,
    pub flat: bool,
    pub smooth: bool,
    pub spotlight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotParams {
    /// Eye frame, not normalized
    pub direction: Vector3<f32>,
    pub exponent: f32,
    pub cutoff: f32,
}

/// Depth-fog function and its constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogParams {
    pub mode: FogMode,
    pub color: Vector4<f32>,
    pub start: f32,
    pub end: f32,
    pub density: f32,
}

impl FogParams {
    pub fn new(mode: FogMode, settings: &FogSettings) -> Self {
        Self {
            mode,
            color: settings.color(),
            start: settings.start,
            end: settings.end,
            density: settings.density,
        }
    }

    /// Weight of the surface colour at eye-space `depth`: 1 means no fog
    pub fn factor(&self, depth: f32) -> f32 {
        let depth = depth.abs();
        let f = match self.mode {
            FogMode::None => return 1.0,
            FogMode::Linear => (self.end - depth) / (self.end - self.start),
            FogMode::Exponential => (-self.density * depth).exp(),
            FogMode::ExponentialSquare => {
                let d = self.density * depth;
                (-(d * d)).exp()
            }
        };
        f.clamp(0.0, 1.0)
    }

    pub fn apply(&self, color: Vector4<f32>, depth: f32) -> Vector4<f32> {
        let f = self.factor(depth);
        let mixed = self.color.xyz().lerp(&color.xyz(), f);
        Vector4::new(mixed.x, mixed.y, mixed.z, color.w)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureParams {
    pub ground_texture: bool,
    pub eye_space: bool,
    pub sphere_texture: SphereTextureMode,
    pub mapping_orientation: SphereMappingOrientation,
    pub lattice: LatticeOverlay,
}

/// Everything the shading backend receives for one draw call
#[derive(Debug, Clone, PartialEq)]
pub struct LightingParameters {
    pub global_ambient: Vector4<f32>,
    /// Eye frame
    pub light_position: Vector4<f32>,
    pub light_ambient: Vector4<f32>,
    pub light_diffuse: Vector4<f32>,
    pub light_specular: Vector4<f32>,
    /// Eye frame
    pub light_direction: Vector4<f32>,
    pub directional_ambient: Vector4<f32>,
    pub directional_diffuse: Vector4<f32>,
    pub directional_specular: Vector4<f32>,
    pub material: MaterialConfig,
    pub normal_matrix: Matrix3<f32>,
    pub flags: ShaderFlags,
    pub spot: SpotParams,
    pub attenuation: Attenuation,
    pub fog: FogParams,
    pub texture: TextureParams,
}

/// Derives per-draw parameter sets from the render modes
#[derive(Debug, Clone, Default)]
pub struct LightingModel {
    pub lights: LightConfig,
    pub fog: FogSettings,
}

impl LightingModel {
    pub fn new(lights: LightConfig, fog: FogSettings) -> Self {
        Self { lights, fog }
    }

    /// Parameter set for `target`.
    ///
    /// `light_view` places the lights in the eye frame (the camera view);
    /// `model_view` is the object's own chain and only feeds the normal matrix.
    pub fn compute_uniforms(
        &self,
        mode: &RenderModeConfig,
        target: DrawTarget,
        light_view: &Matrix4<f32>,
        model_view: &Matrix4<f32>,
    ) -> LightingParameters {
        let lights = &self.lights;
        let zero = Vector4::new(0.0, 0.0, 0.0, 1.0);

        let lit_material = target.lit_material().filter(|_| mode.lighting_enabled);
        let lighting = lit_material.is_some();
        let material = lit_material
            .unwrap_or_else(|| MaterialConfig::flat(target.flat_color(mode.blended_shadow)));

        let positional_on = lighting && mode.light_source != LightSourceMode::None;
        let (light_diffuse, light_specular) = if positional_on {
            (Vector4::new(1.0, 1.0, 1.0, 1.0), Vector4::new(1.0, 1.0, 1.0, 1.0))
        } else {
            (zero, zero)
        };
        let (directional_ambient, directional_diffuse, directional_specular) = if lighting {
            (
                lights.directional_ambient,
                lights.directional_diffuse,
                lights.directional_specular,
            )
        } else {
            (zero, zero, zero)
        };

        LightingParameters {
            global_ambient: lights.global_ambient,
            light_position: light_view * lights.positional,
            light_ambient: zero,
            light_diffuse,
            light_specular,
            light_direction: lights.directional,
            directional_ambient,
            directional_diffuse,
            directional_specular,
            material,
            normal_matrix: Transform::normal_matrix(model_view),
            flags: ShaderFlags {
                axes: matches!(target, DrawTarget::Axis(_)),
                plane: target == DrawTarget::Ground,
                wireframe: mode.wireframe,
                shadow: target == DrawTarget::Shadow && mode.shadow_enabled,
                blended_shadow: target == DrawTarget::Shadow && mode.blended_shadow,
                lighting,
                flat: mode.shading == ShadingMode::Flat,
                smooth: mode.shading == ShadingMode::Smooth,
                spotlight: positional_on && mode.light_source == LightSourceMode::Spot,
            },
            spot: SpotParams {
                direction: Transform::upper_left(light_view) * lights.spot_direction,
                exponent: lights.spot_exponent,
                cutoff: lights.spot_cutoff_radians(),
            },
            attenuation: lights.attenuation,
            fog: FogParams::new(mode.fog, &self.fog),
            texture: TextureParams {
                ground_texture: mode.ground_texture == GroundTextureMode::On,
                eye_space: mode.mapping_space == SphereMappingSpace::Eye,
                sphere_texture: mode.sphere_texture,
                mapping_orientation: mode.mapping_orientation,
                lattice: mode.lattice_overlay(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn view() -> Matrix4<f32> {
        Matrix4::look_at_rh(
            &Point3::new(7.0, 3.0, -10.0),
            &Point3::origin(),
            &Vector3::y(),
        )
    }

    fn lit(source: LightSourceMode) -> RenderModeConfig {
        let mut mode = RenderModeConfig::new();
        mode.set_light_source(source);
        mode.set_lighting(true);
        mode
    }

    #[test]
    fn test_unlit_draw_uses_flat_color() {
        let model = LightingModel::default();
        let params = model.compute_uniforms(
            &RenderModeConfig::new(),
            DrawTarget::Sphere,
            &view(),
            &view(),
        );
        assert!(!params.flags.lighting);
        assert_eq!(params.material.diffuse, Vector4::new(1.0, 0.84, 0.0, 1.0));
        assert_eq!(params.light_diffuse.xyz(), Vector3::zeros());
        assert_eq!(params.directional_diffuse.xyz(), Vector3::zeros());
    }

    #[test]
    fn test_point_light_full_white() {
        let model = LightingModel::default();
        let config = lit(LightSourceMode::Point);
        let params = model.compute_uniforms(&config, DrawTarget::Sphere, &view(), &view());
        assert!(params.flags.lighting);
        assert!(!params.flags.spotlight);
        assert_eq!(params.light_ambient.xyz(), Vector3::zeros());
        assert_eq!(params.light_diffuse, Vector4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(params.light_specular, Vector4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(params.material.shininess, 125.0);
    }

    #[test]
    fn test_no_source_keeps_directional() {
        let model = LightingModel::default();
        let mut mode = RenderModeConfig::new();
        mode.set_lighting(true);
        let params = model.compute_uniforms(&mode, DrawTarget::Ground, &view(), &view());
        assert!(params.flags.lighting);
        assert_eq!(params.light_diffuse.xyz(), Vector3::zeros());
        assert_eq!(params.light_specular.xyz(), Vector3::zeros());
        assert_eq!(params.directional_diffuse, Vector4::new(0.8, 0.8, 0.8, 1.0));
    }

    #[test]
    fn test_spot_cutoff_and_flag() {
        let model = LightingModel::default();
        let config = lit(LightSourceMode::Spot);
        let params = model.compute_uniforms(&config, DrawTarget::Sphere, &view(), &view());
        assert!(params.flags.spotlight);
        assert_relative_eq!(params.spot.cutoff, 20.0_f32.to_radians(), epsilon = 1e-6);
        assert_eq!(params.spot.exponent, 15.0);
        assert_eq!(params.attenuation.constant, 2.0);
    }

    #[test]
    fn test_light_vectors_move_to_eye_frame() {
        let model = LightingModel::default();
        let v = view();
        let params = model.compute_uniforms(
            &lit(LightSourceMode::Spot),
            DrawTarget::Sphere,
            &v,
            &Matrix4::identity(),
        );

        assert_relative_eq!(params.light_position, v * model.lights.positional, epsilon = 1e-5);
        assert_relative_eq!(params.light_position.w, 1.0);
        // Directions ignore the view's translation
        let rotated = Transform::upper_left(&v) * model.lights.spot_direction;
        assert_relative_eq!(params.spot.direction, rotated, epsilon = 1e-5);
        assert_relative_eq!(params.spot.direction.norm(), 1.0, epsilon = 1e-5);
        // Directional light is already in the eye frame
        assert_eq!(params.light_direction, model.lights.directional);
    }

    #[test]
    fn test_axes_and_shadow_never_lit() {
        let model = LightingModel::default();
        let mode = lit(LightSourceMode::Point);
        let axis = model.compute_uniforms(&mode, DrawTarget::Axis(Axis::Y), &view(), &view());
        assert!(!axis.flags.lighting);
        assert!(axis.flags.axes);
        assert_eq!(axis.material.diffuse, Vector4::new(1.0, 0.0, 1.0, 1.0));

        let mut blended = mode;
        blended.blended_shadow = true;
        let shadow = model.compute_uniforms(&blended, DrawTarget::Shadow, &view(), &view());
        assert!(shadow.flags.shadow && shadow.flags.blended_shadow);
        assert!(shadow.material.diffuse.w < 1.0);
    }

    #[test]
    fn test_fog_none_is_one() {
        let fog = FogParams::new(FogMode::None, &FogSettings::default());
        for depth in [0.0, 1.0, 17.0, 500.0] {
            assert_eq!(fog.factor(depth), 1.0);
        }
    }

    #[test]
    fn test_fog_monotonic() {
        for mode in [FogMode::Linear, FogMode::Exponential, FogMode::ExponentialSquare] {
            let fog = FogParams::new(mode, &FogSettings::default());
            let mut previous = fog.factor(0.0);
            for step in 1..400 {
                let f = fog.factor(step as f32 * 0.1);
                assert!(f <= previous, "{mode:?} increased at depth {}", step as f32 * 0.1);
                previous = f;
            }
        }
    }

    #[test]
    fn test_fog_formulas() {
        let settings = FogSettings::default();
        let linear = FogParams::new(FogMode::Linear, &settings);
        assert_relative_eq!(linear.factor(9.0), 0.5);
        assert_eq!(linear.factor(30.0), 0.0);

        let exp = FogParams::new(FogMode::Exponential, &settings);
        assert_relative_eq!(exp.factor(10.0), (-0.9_f32).exp(), epsilon = 1e-6);

        let exp2 = FogParams::new(FogMode::ExponentialSquare, &settings);
        assert_relative_eq!(exp2.factor(10.0), (-0.81_f32).exp(), epsilon = 1e-6);

        let fogged = linear.apply(Vector4::new(0.0, 0.0, 0.0, 1.0), 18.0);
        assert_relative_eq!(fogged, Vector4::new(0.7, 0.7, 0.7, 1.0));
    }
}
