/// Rollsphere Core Library - scene computation for the rolling sphere demo
///
/// This library holds everything between input events and draw submission:
/// render modes, rolling kinematics, planar shadows, lighting and fog
/// parameter sets, the fireworks clock, and the per-frame draw ordering.
/// Graphics backends implement [`frame::Renderer`].

pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod kinematics;
pub mod lighting;
pub mod mesh;
pub mod particles;
pub mod projection;
pub mod scene;
pub mod settings;
pub mod shadow;
pub mod transform;

// Re-export commonly used types
pub use config::RenderModeConfig;
pub use error::{MeshError, SceneError, SettingsError};
pub use frame::{DrawCommand, Frame, FrameOrchestrator, Renderer, SceneAssets};
pub use geometry::Mesh;
pub use lighting::{LightConfig, LightingModel, LightingParameters};
pub use projection::{Axis, Camera};
pub use scene::{Command, Outcome, SceneState};
pub use settings::SceneSettings;
pub use transform::Transform;
