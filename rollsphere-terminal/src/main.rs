/// Rollsphere - a sphere rolling between waypoints, rendered in the terminal
///
/// Controls:
///   - b: Start rolling, then pause/resume (right click also pauses/resumes)
///   - x/X y/Y z/Z: Move the eye, Space: reset the view
///   - w, 1-9: Render mode menu entries
///   - o/e, v/s, l/u/t: Texture mapping and lattice options
///   - q/ESC: Quit
use clap::Parser;
use log::{error, info};
use rollsphere_core::{
    mesh, FrameOrchestrator, LightConfig, LightingModel, Mesh, SceneSettings, SceneState,
};
use rollsphere_terminal::TerminalApp;
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rollsphere", version, about = "Rolling sphere scene in the terminal")]
struct Args {
    /// Sphere mesh file (triangle count, then `3 x y z x y z x y z` per triangle)
    #[arg(short, long)]
    mesh: Option<PathBuf>,

    /// TOML scene settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fireworks seed, overriding the settings file
    #[arg(long)]
    seed: Option<u64>,

    /// Subdivisions of the generated sphere used when no mesh file is given
    #[arg(long, default_value_t = 3)]
    subdivisions: u32,
}

fn load_sphere(args: &Args) -> Mesh {
    let Some(path) = &args.mesh else {
        info!("No mesh file given, generating a sphere with {} subdivisions", args.subdivisions);
        return Mesh::octasphere(args.subdivisions);
    };
    match mesh::load_mesh_file(path) {
        Ok(load) => {
            if !load.skipped.is_empty() {
                println!("Skipped {} malformed records in {}", load.skipped.len(), path.display());
            }
            load.mesh
        }
        Err(err) => {
            error!("Failed to load {}: {err}", path.display());
            println!("Could not load sphere from {}: {err}", path.display());
            Mesh::new()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    println!("Rollsphere Terminal Renderer - Loading...");

    let mut settings = match &args.config {
        Some(path) => SceneSettings::load_from_file(path)?,
        None => SceneSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings.fireworks.seed = seed;
    }

    let sphere = load_sphere(&args);
    info!("Sphere has {} triangles", sphere.triangle_count());

    let scene = SceneState::new(&settings, sphere, 512, 512, 0.0);
    let orchestrator = FrameOrchestrator::new(LightingModel::new(LightConfig::new(), settings.fog));

    println!("Starting terminal renderer (press b to roll, q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    // Run the terminal app
    let mut app = TerminalApp::new(scene, orchestrator)?;
    app.run()?;

    println!("Thank you for using Rollsphere!");
    Ok(())
}
