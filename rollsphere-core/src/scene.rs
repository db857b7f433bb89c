/// Scene state and the command dispatch table
///
/// Hosts translate their input events into [`Command`]s and hand them to
/// [`SceneState::dispatch`]. Each command is a plain state transition
/// followed by a redraw request; redraw requests coalesce until the host
/// takes them.
use log::{debug, info, warn};

use crate::config::{
    FogMode, GroundTextureMode, LatticePattern, LightSourceMode, RenderModeConfig, ShadingMode,
    SphereMappingOrientation, SphereMappingSpace, SphereTextureMode,
};
use crate::error::SceneError;
use crate::geometry::Mesh;
use crate::kinematics::RollingKinematics;
use crate::particles::ParticleSystem;
use crate::projection::{Axis, Camera};
use crate::settings::SceneSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ResetView,
    Quit,
    /// Move the eye one step along `axis`, in the positive direction if `positive`
    MoveEye { axis: Axis, positive: bool },
    /// Start rolling, or pause/resume once started
    ToggleAnimation,
    /// Pause/resume; ignored until the animation has been started
    ToggleRolling,
    ToggleWireframe,
    SetShadow(bool),
    SetBlendedShadow(bool),
    SetLighting(bool),
    SetShading(ShadingMode),
    SetLightSource(LightSourceMode),
    SetFog(FogMode),
    SetGroundTexture(GroundTextureMode),
    SetSphereTexture(SphereTextureMode),
    SetMappingSpace(SphereMappingSpace),
    SetMappingOrientation(SphereMappingOrientation),
    ToggleLattice,
    SetLatticePattern(LatticePattern),
    SetFireworks(bool),
    Reshape { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    NotStarted,
    Rolling,
    Paused,
}

/// Everything that changes between frames, owned by a single handler at a time
#[derive(Debug, Clone)]
pub struct SceneState {
    pub config: RenderModeConfig,
    pub camera: Camera,
    pub mesh: Mesh,
    pub rolling: RollingKinematics,
    pub particles: ParticleSystem,
    animation: AnimationState,
    eye_step: f32,
    redraw_pending: bool,
}

impl SceneState {
    /// `mesh` may be empty when loading failed; the scene still renders but
    /// refuses to animate.
    pub fn new(settings: &SceneSettings, mesh: Mesh, width: u32, height: u32, now: f32) -> Self {
        let radius = mesh.sphere_radius();
        Self {
            config: RenderModeConfig::new(),
            camera: Camera::new(&settings.camera, width, height),
            rolling: RollingKinematics::new(&settings.rolling, radius),
            particles: ParticleSystem::new(&settings.fireworks, now),
            mesh,
            animation: AnimationState::NotStarted,
            eye_step: settings.camera.eye_step,
            redraw_pending: true,
        }
    }

    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    /// Whether the host should keep delivering ticks
    pub fn is_rolling(&self) -> bool {
        self.animation == AnimationState::Rolling
    }

    pub fn request_redraw(&mut self) {
        self.redraw_pending = true;
    }

    /// Consume the pending redraw request, if any
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_pending)
    }

    /// Apply one input command.
    ///
    /// A refused command leaves the state untouched and requests no redraw.
    pub fn dispatch(&mut self, command: Command, now: f32) -> Result<Outcome, SceneError> {
        debug!("Command {command:?}");
        let config = &mut self.config;
        match command {
            Command::Quit => return Ok(Outcome::Quit),
            Command::ResetView => self.camera.reset(),
            Command::MoveEye { axis, positive } => {
                let delta = if positive { self.eye_step } else { -self.eye_step };
                if !self.camera.translate_eye(axis, delta) {
                    debug!("Eye move along {axis:?} refused: eye would sit on the up axis");
                }
            }
            Command::ToggleAnimation => self.toggle_animation()?,
            Command::ToggleRolling => match self.animation {
                AnimationState::NotStarted => {}
                _ => self.toggle_animation()?,
            },
            Command::ToggleWireframe => config.wireframe = !config.wireframe,
            Command::SetShadow(enabled) => config.shadow_enabled = enabled,
            Command::SetBlendedShadow(enabled) => config.blended_shadow = enabled,
            Command::SetLighting(enabled) => config.set_lighting(enabled),
            Command::SetShading(shading) => config.shading = shading,
            Command::SetLightSource(source) => config.set_light_source(source),
            Command::SetFog(fog) => config.fog = fog,
            Command::SetGroundTexture(mode) => config.ground_texture = mode,
            Command::SetSphereTexture(mode) => config.sphere_texture = mode,
            Command::SetMappingSpace(space) => config.mapping_space = space,
            Command::SetMappingOrientation(orientation) => config.mapping_orientation = orientation,
            Command::ToggleLattice => config.lattice_enabled = !config.lattice_enabled,
            Command::SetLatticePattern(pattern) => config.lattice_pattern = pattern,
            Command::SetFireworks(enabled) => {
                if enabled && !config.fireworks_enabled {
                    self.particles.restart(now);
                }
                config.fireworks_enabled = enabled;
            }
            Command::Reshape { width, height } => self.camera.reshape(width, height),
        }
        self.request_redraw();
        Ok(Outcome::Continue)
    }

    fn toggle_animation(&mut self) -> Result<(), SceneError> {
        self.animation = match self.animation {
            AnimationState::Rolling => AnimationState::Paused,
            AnimationState::NotStarted | AnimationState::Paused => {
                if let Err(err) = self.rolling.ensure_rollable() {
                    warn!("Refusing to animate: {err}");
                    return Err(err);
                }
                info!("Rolling animation started");
                AnimationState::Rolling
            }
        };
        Ok(())
    }

    /// Animation tick; a no-op unless rolling
    pub fn tick(&mut self) -> Result<(), SceneError> {
        if !self.is_rolling() {
            return Ok(());
        }
        self.rolling.advance()?;
        self.request_redraw();
        Ok(())
    }
}
