/// Toggleable render modes
///
/// Every mutually exclusive choice is its own enum so that only one value
/// can be active at a time; independent switches stay plain booleans.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingMode {
    #[default]
    Flat,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightSourceMode {
    #[default]
    None,
    Point,
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogMode {
    #[default]
    None,
    Linear,
    Exponential,
    ExponentialSquare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundTextureMode {
    #[default]
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SphereTextureMode {
    #[default]
    Off,
    ContourLines,
    Checkerboard,
}

/// Coordinates the sphere texture is generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SphereMappingSpace {
    #[default]
    Object,
    Eye,
}

/// Orientation of the generated sphere texture coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SphereMappingOrientation {
    #[default]
    Vertical,
    Slanted,
}

/// Lattice sub-pattern, remembered while the overlay is switched off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatticePattern {
    /// Upright grid following longitude/latitude
    #[default]
    LongitudeLatitude,
    /// Tilted grid
    Alternate,
}

/// Effective lattice overlay as seen by the shading stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatticeOverlay {
    Off,
    LongitudeLatitude,
    Alternate,
}

/// All mode flags consulted while composing a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderModeConfig {
    pub shading: ShadingMode,
    pub wireframe: bool,
    pub lighting_enabled: bool,
    pub shadow_enabled: bool,
    pub blended_shadow: bool,
    pub light_source: LightSourceMode,
    pub fog: FogMode,
    pub ground_texture: GroundTextureMode,
    pub sphere_texture: SphereTextureMode,
    pub mapping_space: SphereMappingSpace,
    pub mapping_orientation: SphereMappingOrientation,
    pub lattice_enabled: bool,
    pub lattice_pattern: LatticePattern,
    pub fireworks_enabled: bool,
}

impl RenderModeConfig {
    pub fn new() -> Self {
        Self {
            shading: ShadingMode::Flat,
            wireframe: false,
            lighting_enabled: false,
            shadow_enabled: true,
            blended_shadow: false,
            light_source: LightSourceMode::None,
            fog: FogMode::None,
            ground_texture: GroundTextureMode::Off,
            sphere_texture: SphereTextureMode::Off,
            mapping_space: SphereMappingSpace::Object,
            mapping_orientation: SphereMappingOrientation::Vertical,
            lattice_enabled: false,
            lattice_pattern: LatticePattern::LongitudeLatitude,
            fireworks_enabled: false,
        }
    }

    pub fn lattice_overlay(&self) -> LatticeOverlay {
        match (self.lattice_enabled, self.lattice_pattern) {
            (false, _) => LatticeOverlay::Off,
            (true, LatticePattern::LongitudeLatitude) => LatticeOverlay::LongitudeLatitude,
            (true, LatticePattern::Alternate) => LatticeOverlay::Alternate,
        }
    }

    /// Copy of this config with some flags forced for a single sub-draw.
    ///
    /// The receiver is the frame snapshot and is never touched, so whatever a
    /// sub-draw forces cannot leak into the next one.
    pub fn overridden(&self, force: impl FnOnce(&mut RenderModeConfig)) -> RenderModeConfig {
        let mut scoped = *self;
        force(&mut scoped);
        scoped
    }

    pub fn set_lighting(&mut self, enabled: bool) {
        self.lighting_enabled = enabled;
        if !enabled {
            self.light_source = LightSourceMode::None;
        }
    }

    /// Selecting a positional source implies lighting
    pub fn set_light_source(&mut self, source: LightSourceMode) {
        self.light_source = source;
        if source != LightSourceMode::None {
            self.lighting_enabled = true;
        }
    }
}

impl Default for RenderModeConfig {
    fn default() -> Self {
        Self::new()
    }
}
