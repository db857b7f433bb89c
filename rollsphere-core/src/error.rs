/// Error types for mesh loading, settings and scene state transitions
use thiserror::Error;

/// Failures while reading a sphere mesh file
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error in record {record}: {message}")]
    Parse { record: usize, message: String },
    #[error("Mesh contains no triangles")]
    Empty,
}

/// Failures while loading or validating startup settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Invalid scene state transitions
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Cannot roll a degenerate sphere (radius {radius}); load a mesh first")]
    DegenerateMesh { radius: f32 },
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
