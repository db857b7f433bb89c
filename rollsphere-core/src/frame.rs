/// Per-frame orchestration: turns the scene state into an ordered draw list
///
/// The command order is part of the contract with the backend: axes first,
/// then the ground/shadow mask sequence, then the sphere, then particles.
use log::trace;
use nalgebra::{Matrix4, Vector3};

use crate::config::{GroundTextureMode, RenderModeConfig, ShadingMode, SphereTextureMode};
use crate::geometry::{AxesGeometry, Mesh};
use crate::lighting::{DrawTarget, LightingModel, LightingParameters};
use crate::particles::Particle;
use crate::projection::Axis;
use crate::scene::SceneState;
use crate::shadow::{BlendFunc, PassStep, ShadowProjector};
use crate::transform::Transform;

/// Point size for fireworks particles
pub const PARTICLE_POINT_SIZE: f32 = 3.0;

/// Which vertex buffer a draw reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Axes,
    Ground,
    SmoothSphere,
    FlatSphere,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Lines { first: usize, count: usize, width: f32 },
    Triangles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub target: DrawTarget,
    pub geometry: Geometry,
    pub primitive: Primitive,
    pub polygon_mode: PolygonMode,
    pub model_view: Matrix4<f32>,
    pub params: LightingParameters,
}

/// Particle pass; uses its own shading program and uniforms
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleDraw {
    pub model_view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub start_position: Vector3<f32>,
    /// Shared elapsed time in seconds
    pub time: f32,
    pub point_size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    DepthWrite(bool),
    ColorWrite(bool),
    Blend(Option<BlendFunc>),
    Draw(DrawCall),
    Particles(ParticleDraw),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Draw(call) => Some(call),
            _ => None,
        })
    }
}

/// Static data a backend uploads once before the first frame
#[derive(Debug, Clone, Copy)]
pub struct SceneAssets<'a> {
    pub sphere: &'a Mesh,
    pub particles: &'a [Particle],
}

/// The graphics backend the frame is submitted to
pub trait Renderer {
    type Error;

    fn upload(&mut self, assets: &SceneAssets<'_>) -> Result<(), Self::Error>;

    fn render(&mut self, frame: &Frame) -> Result<(), Self::Error>;
}

/// Builds frames from the scene state
#[derive(Debug, Clone)]
pub struct FrameOrchestrator {
    lighting: LightingModel,
    shadow: ShadowProjector,
}

impl FrameOrchestrator {
    pub fn new(lighting: LightingModel) -> Self {
        let shadow = ShadowProjector::new(lighting.lights.positional_point());
        Self { lighting, shadow }
    }

    pub fn lighting(&self) -> &LightingModel {
        &self.lighting
    }

    /// Compose one frame at clock time `now` (seconds).
    ///
    /// Only the particle clock is advanced; mode flags are read from a
    /// snapshot and every sub-draw forces its own flags on a copy of it.
    pub fn compose(&self, scene: &mut SceneState, now: f32) -> Frame {
        let projection = scene.camera.projection_matrix();
        let view = scene.camera.view_matrix();

        let pose = scene.rolling.pose();
        let step_rotation = if scene.is_rolling() {
            scene.rolling.step_rotation()
        } else {
            Matrix4::identity()
        };
        let position = pose.position;
        let sphere_model = Transform::translation_matrix(position.x, position.y, position.z)
            * step_rotation
            * pose.accumulated_rotation;

        let snapshot = scene.config;
        let mut commands = Vec::with_capacity(16);

        self.draw_axes(&snapshot, &view, &mut commands);

        let shadow_visible =
            ShadowProjector::shadow_visible(snapshot.shadow_enabled, &scene.camera.eye);
        let recipe =
            ShadowProjector::ground_and_shadow_recipe(shadow_visible, snapshot.blended_shadow);
        for step in recipe {
            match step {
                PassStep::DepthWrite(on) => commands.push(DrawCommand::DepthWrite(on)),
                PassStep::ColorWrite(on) => commands.push(DrawCommand::ColorWrite(on)),
                PassStep::Blend(func) => commands.push(DrawCommand::Blend(func)),
                PassStep::DrawGround => commands.push(self.ground_call(&snapshot, &view)),
                PassStep::DrawShadow => {
                    commands.push(self.shadow_call(&snapshot, &view, &sphere_model))
                }
            }
        }

        commands.push(self.sphere_call(&snapshot, &view, &sphere_model));

        if snapshot.fireworks_enabled {
            let time = scene.particles.current_time(now);
            commands.push(DrawCommand::Particles(ParticleDraw {
                model_view: view,
                projection,
                start_position: scene.particles.start_position(),
                time,
                point_size: PARTICLE_POINT_SIZE,
            }));
        }

        trace!("Composed frame with {} commands", commands.len());
        Frame {
            projection,
            view,
            commands,
        }
    }

    fn draw_axes(
        &self,
        snapshot: &RenderModeConfig,
        view: &Matrix4<f32>,
        commands: &mut Vec<DrawCommand>,
    ) {
        let mode = snapshot.overridden(|c| {
            c.wireframe = false;
            c.lighting_enabled = false;
            c.shadow_enabled = false;
            c.ground_texture = GroundTextureMode::Off;
            c.sphere_texture = SphereTextureMode::Off;
            c.lattice_enabled = false;
        });

        for (index, axis) in [Axis::X, Axis::Y, Axis::Z].into_iter().enumerate() {
            let target = DrawTarget::Axis(axis);
            commands.push(DrawCommand::Draw(DrawCall {
                target,
                geometry: Geometry::Axes,
                primitive: Primitive::Lines {
                    first: index * 2,
                    count: 2,
                    width: AxesGeometry::LINE_WIDTH,
                },
                polygon_mode: PolygonMode::Line,
                model_view: *view,
                params: self.lighting.compute_uniforms(&mode, target, view, view),
            }));
        }
    }

    fn ground_call(&self, snapshot: &RenderModeConfig, view: &Matrix4<f32>) -> DrawCommand {
        let mode = snapshot.overridden(|c| {
            c.wireframe = false;
            c.shadow_enabled = false;
            c.sphere_texture = SphereTextureMode::Off;
            c.lattice_enabled = false;
        });
        DrawCommand::Draw(DrawCall {
            target: DrawTarget::Ground,
            geometry: Geometry::Ground,
            primitive: Primitive::Triangles,
            polygon_mode: PolygonMode::Fill,
            model_view: *view,
            params: self.lighting.compute_uniforms(&mode, DrawTarget::Ground, view, view),
        })
    }

    fn shadow_call(
        &self,
        snapshot: &RenderModeConfig,
        view: &Matrix4<f32>,
        sphere_model: &Matrix4<f32>,
    ) -> DrawCommand {
        let mode = snapshot.overridden(|c| {
            c.lighting_enabled = false;
            c.ground_texture = GroundTextureMode::Off;
            c.sphere_texture = SphereTextureMode::Off;
        });
        let model_view = view * self.shadow.matrix() * sphere_model;
        DrawCommand::Draw(DrawCall {
            target: DrawTarget::Shadow,
            geometry: sphere_geometry(&mode),
            primitive: Primitive::Triangles,
            polygon_mode: polygon_mode(&mode),
            model_view,
            params: self.lighting.compute_uniforms(&mode, DrawTarget::Shadow, view, &model_view),
        })
    }

    fn sphere_call(
        &self,
        snapshot: &RenderModeConfig,
        view: &Matrix4<f32>,
        sphere_model: &Matrix4<f32>,
    ) -> DrawCommand {
        let mode = snapshot.overridden(|c| {
            c.shadow_enabled = false;
            c.ground_texture = GroundTextureMode::Off;
        });
        let model_view = view * sphere_model;
        DrawCommand::Draw(DrawCall {
            target: DrawTarget::Sphere,
            geometry: sphere_geometry(&mode),
            primitive: Primitive::Triangles,
            polygon_mode: polygon_mode(&mode),
            model_view,
            params: self.lighting.compute_uniforms(&mode, DrawTarget::Sphere, view, &model_view),
        })
    }
}

fn sphere_geometry(mode: &RenderModeConfig) -> Geometry {
    match mode.shading {
        ShadingMode::Flat => Geometry::FlatSphere,
        ShadingMode::Smooth => Geometry::SmoothSphere,
    }
}

fn polygon_mode(mode: &RenderModeConfig) -> PolygonMode {
    if mode.wireframe {
        PolygonMode::Line
    } else {
        PolygonMode::Fill
    }
}
