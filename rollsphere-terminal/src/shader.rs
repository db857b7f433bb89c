/// Software shading stage evaluating the core's parameter sets
///
/// Lighting is evaluated per vertex (Gouraud); textures, the lattice overlay
/// and fog per fragment.
use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use rollsphere_core::config::{LatticeOverlay, SphereMappingOrientation, SphereTextureMode};
use rollsphere_core::LightingParameters;

/// Gravity used by the particle trajectory, in world units per second²
const PARTICLE_GRAVITY: f32 = 0.98;

/// Texels per unit of the 1D stripe texture, red band width in texels
const STRIPE_TEXELS: f32 = 32.0;
const STRIPE_RED_TEXELS: f32 = 4.0;

/// Checker squares per unit of texture coordinate
const CHECKER_SQUARES: f32 = 8.0;

/// Per-vertex outputs interpolated across a primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Varying {
    pub color: Vector4<f32>,
    pub eye: Vector3<f32>,
    pub texture_source: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Varying {
    pub fn scaled(&self, s: f32) -> Self {
        Self {
            color: self.color * s,
            eye: self.eye * s,
            texture_source: self.texture_source * s,
            uv: self.uv * s,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            color: self.color + other.color,
            eye: self.eye + other.eye,
            texture_source: self.texture_source + other.texture_source,
            uv: self.uv + other.uv,
        }
    }

    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        self.scaled(1.0 - t).add(&other.scaled(t))
    }
}

/// Vertex stage: eye-space position, lit colour and texture sources
pub fn shade_vertex(
    params: &LightingParameters,
    model_view: &Matrix4<f32>,
    position: &Point3<f32>,
    normal: &Vector3<f32>,
    uv: Vector2<f32>,
) -> Varying {
    let eye = model_view.transform_point(position).coords;

    let color = if params.flags.lighting {
        let n = (params.normal_matrix * normal)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        lit_color(params, &eye, &n)
    } else {
        params.material.diffuse
    };

    let texture_source = if params.texture.eye_space {
        eye
    } else {
        position.coords
    };

    Varying {
        color,
        eye,
        texture_source,
        uv,
    }
}

fn lit_color(params: &LightingParameters, eye: &Vector3<f32>, n: &Vector3<f32>) -> Vector4<f32> {
    let material = &params.material;
    let e = (-eye).try_normalize(f32::EPSILON).unwrap_or_else(Vector3::z);

    let phong = |l: &Vector3<f32>,
                 ambient: &Vector4<f32>,
                 diffuse: &Vector4<f32>,
                 specular: &Vector4<f32>| {
        let n_dot_l = n.dot(l).max(0.0);
        let mut term = ambient.component_mul(&material.ambient).xyz()
            + diffuse.component_mul(&material.diffuse).xyz() * n_dot_l;
        if n_dot_l > 0.0 {
            let h = (l + e).try_normalize(f32::EPSILON).unwrap_or(*n);
            let highlight = n.dot(&h).max(0.0).powf(material.shininess);
            term += specular.component_mul(&material.specular).xyz() * highlight;
        }
        term
    };

    let mut rgb = params.global_ambient.component_mul(&material.ambient).xyz();

    let to_directional = -params
        .light_direction
        .xyz()
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::z);
    rgb += phong(
        &to_directional,
        &params.directional_ambient,
        &params.directional_diffuse,
        &params.directional_specular,
    );

    let to_light = params.light_position.xyz() - eye;
    let distance = to_light.norm();
    if distance > f32::EPSILON {
        let l = to_light / distance;
        let att = &params.attenuation;
        let attenuation =
            1.0 / (att.constant + att.linear * distance + att.quadratic * distance * distance);
        let spot = if params.flags.spotlight {
            let axis = params
                .spot
                .direction
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::zeros);
            let cos_angle = (-l).dot(&axis);
            if cos_angle < params.spot.cutoff.cos() {
                0.0
            } else {
                cos_angle.powf(params.spot.exponent)
            }
        } else {
            1.0
        };
        rgb += phong(&l, &params.light_ambient, &params.light_diffuse, &params.light_specular)
            * (attenuation * spot);
    }

    Vector4::new(rgb.x.min(1.0), rgb.y.min(1.0), rgb.z.min(1.0), material.diffuse.w)
}

/// Fragment stage; `None` discards the fragment
pub fn shade_fragment(params: &LightingParameters, varying: &Varying) -> Option<Vector4<f32>> {
    let texture = &params.texture;
    let mut color = varying.color;

    if params.flags.plane && texture.ground_texture {
        color = modulate(color, checker(varying.uv.x, varying.uv.y));
    }

    let src = varying.texture_source;
    match texture.sphere_texture {
        SphereTextureMode::Off => {}
        SphereTextureMode::ContourLines => {
            let s = match texture.mapping_orientation {
                SphereMappingOrientation::Vertical => 2.5 * src.x,
                SphereMappingOrientation::Slanted => 1.5 * (src.x + src.y + src.z),
            };
            color = modulate(color, stripe(s));
        }
        SphereTextureMode::Checkerboard => {
            let (s, t) = match texture.mapping_orientation {
                SphereMappingOrientation::Vertical => (0.5 * (src.x + 1.0), 0.5 * (src.y + 1.0)),
                SphereMappingOrientation::Slanted => {
                    (0.3 * (src.x + src.y + src.z), 0.3 * (src.x - src.y + src.z))
                }
            };
            color = modulate(color, checker(s, t));
        }
    }

    let lattice = match texture.lattice {
        LatticeOverlay::Off => None,
        LatticeOverlay::LongitudeLatitude => Some((0.5 * (src.x + 1.0), 0.5 * (src.y + 1.0))),
        LatticeOverlay::Alternate => {
            Some((0.3 * (src.x + src.y + src.z), 0.3 * (src.x - src.y + src.z)))
        }
    };
    if let Some((s, t)) = lattice {
        if (4.0 * s).rem_euclid(1.0) < 0.35 && (4.0 * t).rem_euclid(1.0) < 0.35 {
            return None;
        }
    }

    Some(params.fog.apply(color, varying.eye.z))
}

/// Ballistic particle position, or `None` once it has fallen below the start
pub fn particle_position(
    start: &Vector3<f32>,
    velocity: &Vector3<f32>,
    t: f32,
) -> Option<Point3<f32>> {
    let p = start + velocity * t - Vector3::y() * (0.5 * PARTICLE_GRAVITY * t * t);
    (p.y >= start.y).then(|| Point3::from(p))
}

fn modulate(color: Vector4<f32>, texel: Vector3<f32>) -> Vector4<f32> {
    let rgb = color.xyz().component_mul(&texel);
    Vector4::new(rgb.x, rgb.y, rgb.z, color.w)
}

/// 1D stripe texture: a thin red band, green elsewhere
fn stripe(s: f32) -> Vector3<f32> {
    if s.rem_euclid(1.0) * STRIPE_TEXELS < STRIPE_RED_TEXELS {
        Vector3::new(1.0, 0.0, 0.0)
    } else {
        Vector3::new(0.0, 1.0, 0.0)
    }
}

/// 2D checkerboard texture: white and green squares
fn checker(s: f32, t: f32) -> Vector3<f32> {
    let parity = ((s * CHECKER_SQUARES).floor() + (t * CHECKER_SQUARES).floor()) as i64;
    if parity.rem_euclid(2) == 0 {
        Vector3::new(1.0, 1.0, 1.0)
    } else {
        Vector3::new(0.0, 0.6, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rollsphere_core::config::{FogMode, LightSourceMode};
    use rollsphere_core::lighting::DrawTarget;
    use rollsphere_core::{LightingModel, RenderModeConfig};

    fn params(mode: &RenderModeConfig, target: DrawTarget) -> LightingParameters {
        let eye = Point3::new(7.0, 3.0, -10.0);
        let view = Matrix4::look_at_rh(&eye, &Point3::origin(), &Vector3::y());
        LightingModel::default().compute_uniforms(mode, target, &view, &view)
    }

    #[test]
    fn test_unlit_vertex_uses_material() {
        let p = params(&RenderModeConfig::new(), DrawTarget::Sphere);
        let position = Point3::new(0.0, 1.0, 0.0);
        let v = shade_vertex(&p, &Matrix4::identity(), &position, &Vector3::y(), Vector2::zeros());
        assert_eq!(v.color, Vector4::new(1.0, 0.84, 0.0, 1.0));
    }

    #[test]
    fn test_spot_cone_darkens_outside() {
        let mut mode = RenderModeConfig::new();
        mode.set_light_source(LightSourceMode::Point);
        let point = params(&mode, DrawTarget::Ground);
        mode.set_light_source(LightSourceMode::Spot);
        let spot = params(&mode, DrawTarget::Ground);

        // Far from the spot target the cone contributes nothing
        let far = Point3::new(60.0, 0.0, 60.0);
        let eye = Point3::new(7.0, 3.0, -10.0);
        let view = Matrix4::look_at_rh(&eye, &Point3::origin(), &Vector3::y());
        let lit_point = shade_vertex(&point, &view, &far, &Vector3::y(), Vector2::zeros());
        let lit_spot = shade_vertex(&spot, &view, &far, &Vector3::y(), Vector2::zeros());
        assert!(lit_spot.color.xyz().norm() < lit_point.color.xyz().norm());
    }

    #[test]
    fn test_lattice_discards() {
        let mut mode = RenderModeConfig::new();
        mode.lattice_enabled = true;
        let p = params(&mode, DrawTarget::Sphere);
        let position = Point3::new(-1.0, -1.0, 0.0);
        let mut v =
            shade_vertex(&p, &Matrix4::identity(), &position, &Vector3::z(), Vector2::zeros());
        assert!(shade_fragment(&p, &v).is_none());

        v.texture_source = Vector3::new(-0.7, -0.7, 0.0);
        assert!(shade_fragment(&p, &v).is_some());
    }

    #[test]
    fn test_fog_blends_toward_fog_color() {
        let mut mode = RenderModeConfig::new();
        mode.fog = FogMode::Linear;
        let p = params(&mode, DrawTarget::Sphere);
        let v = Varying {
            color: Vector4::new(0.0, 0.0, 0.0, 1.0),
            eye: Vector3::new(0.0, 0.0, -40.0),
            texture_source: Vector3::new(0.3, 0.3, 0.3),
            uv: Vector2::zeros(),
        };
        let c = shade_fragment(&p, &v).unwrap();
        assert_relative_eq!(c.xyz(), Vector3::new(0.7, 0.7, 0.7));
    }

    #[test]
    fn test_particle_falls_back_below_start() {
        let start = Vector3::new(0.0, 0.1, 0.0);
        let v = Vector3::new(0.5, 0.5, -0.5);
        assert!(particle_position(&start, &v, 1.0).is_some());
        assert!(particle_position(&start, &v, 4.0).is_none());
    }

    #[test]
    fn test_checker_alternates() {
        assert_ne!(checker(0.01, 0.01), checker(0.14, 0.01));
        assert_eq!(checker(0.01, 0.01), checker(0.14, 0.14));
    }
}
