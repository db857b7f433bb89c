/// Terminal host for the rolling sphere scene
///
/// Translates crossterm events into scene commands, delivers animation ticks
/// while the sphere rolls, and redraws whenever the scene asks for it.
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use log::{info, warn};
use rollsphere_core::config::{
    FogMode, GroundTextureMode, LatticePattern, LightSourceMode, ShadingMode,
    SphereMappingOrientation, SphereMappingSpace, SphereTextureMode,
};
use rollsphere_core::{
    Axis, Command, FrameOrchestrator, Outcome, RenderModeConfig, Renderer, SceneAssets, SceneState,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;
pub mod shader;

pub use renderer::AsciiRenderer;

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: u32 = 2;

const HELP: &str = "q quit | space reset | xXyYzZ eye | b roll | w wire | \
                    1 shade 2 light 3 source 4 fog 5 shadow 6 blend 7 ground 8 tex 9 fireworks | \
                    o/e space v/s orient l/u/t lattice";

/// Map a key press to a scene command.
///
/// On/off menu entries become toggles of the current `config` state and
/// multi-choice entries cycle through their options.
pub fn map_key(config: &RenderModeConfig, key: KeyEvent) -> Option<Command> {
    let command = match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Command::Quit,
        KeyCode::Char(' ') => Command::ResetView,
        KeyCode::Char('x') => Command::MoveEye { axis: Axis::X, positive: false },
        KeyCode::Char('X') => Command::MoveEye { axis: Axis::X, positive: true },
        KeyCode::Char('y') => Command::MoveEye { axis: Axis::Y, positive: false },
        KeyCode::Char('Y') => Command::MoveEye { axis: Axis::Y, positive: true },
        KeyCode::Char('z') => Command::MoveEye { axis: Axis::Z, positive: false },
        KeyCode::Char('Z') => Command::MoveEye { axis: Axis::Z, positive: true },
        KeyCode::Char('b') | KeyCode::Char('B') => Command::ToggleAnimation,
        KeyCode::Char('w') | KeyCode::Char('W') => Command::ToggleWireframe,
        KeyCode::Char('o') | KeyCode::Char('O') => {
            Command::SetMappingSpace(SphereMappingSpace::Object)
        }
        KeyCode::Char('e') | KeyCode::Char('E') => {
            Command::SetMappingSpace(SphereMappingSpace::Eye)
        }
        KeyCode::Char('v') | KeyCode::Char('V') => {
            Command::SetMappingOrientation(SphereMappingOrientation::Vertical)
        }
        KeyCode::Char('s') | KeyCode::Char('S') => {
            Command::SetMappingOrientation(SphereMappingOrientation::Slanted)
        }
        KeyCode::Char('l') | KeyCode::Char('L') => Command::ToggleLattice,
        KeyCode::Char('u') | KeyCode::Char('U') => {
            Command::SetLatticePattern(LatticePattern::LongitudeLatitude)
        }
        KeyCode::Char('t') | KeyCode::Char('T') => {
            Command::SetLatticePattern(LatticePattern::Alternate)
        }
        KeyCode::Char('1') => Command::SetShading(match config.shading {
            ShadingMode::Flat => ShadingMode::Smooth,
            ShadingMode::Smooth => ShadingMode::Flat,
        }),
        KeyCode::Char('2') => Command::SetLighting(!config.lighting_enabled),
        KeyCode::Char('3') => Command::SetLightSource(match config.light_source {
            LightSourceMode::None => LightSourceMode::Point,
            LightSourceMode::Point => LightSourceMode::Spot,
            LightSourceMode::Spot => LightSourceMode::None,
        }),
        KeyCode::Char('4') => Command::SetFog(match config.fog {
            FogMode::None => FogMode::Linear,
            FogMode::Linear => FogMode::Exponential,
            FogMode::Exponential => FogMode::ExponentialSquare,
            FogMode::ExponentialSquare => FogMode::None,
        }),
        KeyCode::Char('5') => Command::SetShadow(!config.shadow_enabled),
        KeyCode::Char('6') => Command::SetBlendedShadow(!config.blended_shadow),
        KeyCode::Char('7') => Command::SetGroundTexture(match config.ground_texture {
            GroundTextureMode::Off => GroundTextureMode::On,
            GroundTextureMode::On => GroundTextureMode::Off,
        }),
        KeyCode::Char('8') => Command::SetSphereTexture(match config.sphere_texture {
            SphereTextureMode::Off => SphereTextureMode::ContourLines,
            SphereTextureMode::ContourLines => SphereTextureMode::Checkerboard,
            SphereTextureMode::Checkerboard => SphereTextureMode::Off,
        }),
        KeyCode::Char('9') => Command::SetFireworks(!config.fireworks_enabled),
        _ => return None,
    };
    Some(command)
}

/// Window size for the camera, in square "pixels"
pub fn reshape_command(columns: u16, rows: u16) -> Command {
    Command::Reshape {
        width: u32::from(columns),
        height: u32::from(rows) * CELL_ASPECT,
    }
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    scene: SceneState,
    orchestrator: FrameOrchestrator,
    renderer: AsciiRenderer,
    clock: Instant,
    running: bool,
    status: Option<String>,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mut scene: SceneState, orchestrator: FrameOrchestrator) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let clock = Instant::now();

        let mut renderer = AsciiRenderer::new(width as usize, height as usize);
        renderer.upload(&SceneAssets {
            sphere: &scene.mesh,
            particles: scene.particles.particles(),
        })?;
        if let Command::Reshape { width, height } = reshape_command(width, height) {
            scene.camera.reshape(width, height);
        }

        Ok(Self {
            scene,
            orchestrator,
            renderer,
            clock,
            running: true,
            status: None,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    /// Seconds since start-up
    fn now(&self) -> f32 {
        self.clock.elapsed().as_secs_f32()
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            // Update
            if self.scene.is_rolling() {
                if let Err(err) = self.scene.tick() {
                    warn!("Animation stopped: {err}");
                    self.status = Some(err.to_string());
                }
            }
            if self.scene.config.fireworks_enabled {
                self.scene.request_redraw();
            }

            // Render
            if self.scene.take_redraw() {
                self.render()?;
                self.frame_count += 1;
            }

            // Frame timing
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        info!("Terminal host exiting");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        let command = match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                map_key(&self.scene.config, key)
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Right) => {
                Some(Command::ToggleRolling)
            }
            Event::Resize(columns, rows) => {
                self.renderer.resize(columns as usize, rows as usize);
                Some(reshape_command(columns, rows))
            }
            _ => None,
        };
        if let Some(command) = command {
            self.dispatch(command);
        }
    }

    fn dispatch(&mut self, command: Command) {
        let now = self.now();
        match self.scene.dispatch(command, now) {
            Ok(Outcome::Quit) => self.running = false,
            Ok(Outcome::Continue) => self.status = None,
            Err(err) => {
                self.status = Some(err.to_string());
                self.scene.request_redraw();
            }
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let now = self.now();
        let frame = self.orchestrator.compose(&mut self.scene, now);
        self.renderer.render(&frame)?;

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let header = match &self.status {
            Some(message) => format!("Rollsphere | FPS: {:.1} | {message}", self.fps),
            None => format!("Rollsphere | FPS: {:.1} | {HELP}", self.fps),
        };
        let width = self.renderer.width();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(header.chars().take(width).collect::<String>()),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_eye_keys() {
        let config = RenderModeConfig::new();
        assert_eq!(
            map_key(&config, key('X')),
            Some(Command::MoveEye { axis: Axis::X, positive: true })
        );
        assert_eq!(
            map_key(&config, key('z')),
            Some(Command::MoveEye { axis: Axis::Z, positive: false })
        );
        assert_eq!(map_key(&config, key(' ')), Some(Command::ResetView));
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(map_key(&config, esc), Some(Command::Quit));
    }

    #[test]
    fn test_menu_keys_follow_current_state() {
        let mut config = RenderModeConfig::new();
        assert_eq!(map_key(&config, key('5')), Some(Command::SetShadow(!config.shadow_enabled)));

        config.set_light_source(LightSourceMode::Spot);
        assert_eq!(
            map_key(&config, key('3')),
            Some(Command::SetLightSource(LightSourceMode::None))
        );

        config.fog = FogMode::ExponentialSquare;
        assert_eq!(map_key(&config, key('4')), Some(Command::SetFog(FogMode::None)));

        config.sphere_texture = SphereTextureMode::ContourLines;
        assert_eq!(
            map_key(&config, key('8')),
            Some(Command::SetSphereTexture(SphereTextureMode::Checkerboard))
        );
    }

    #[test]
    fn test_lattice_and_mapping_keys() {
        let config = RenderModeConfig::new();
        assert_eq!(
            map_key(&config, key('t')),
            Some(Command::SetLatticePattern(LatticePattern::Alternate))
        );
        assert_eq!(
            map_key(&config, key('U')),
            Some(Command::SetLatticePattern(LatticePattern::LongitudeLatitude))
        );
        assert_eq!(
            map_key(&config, key('e')),
            Some(Command::SetMappingSpace(SphereMappingSpace::Eye))
        );
        assert_eq!(map_key(&config, key('?')), None);
    }

    #[test]
    fn test_reshape_doubles_rows() {
        assert_eq!(reshape_command(80, 24), Command::Reshape { width: 80, height: 48 });
    }
}
