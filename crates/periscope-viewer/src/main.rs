use std::path::PathBuf;

use anyhow::Result;

use periscope_engine::coordinator::{self, CoordinatorConfig, MeshData, SurfaceSpec};
use periscope_engine::logging::{init_logging, LoggingConfig};
use periscope_engine::render::SurfaceMode;

mod scene;

const SCREEN_WIDTH: u32 = 640;
const SCREEN_HEIGHT: u32 = 480;

fn shader_path(name: &str) -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders")).join(name)
}

fn config() -> CoordinatorConfig {
    CoordinatorConfig {
        width: SCREEN_WIDTH,
        height: SCREEN_HEIGHT,
        primary: SurfaceSpec {
            title: "periscope scene".to_string(),
            mode: SurfaceMode::Spatial,
            mesh: MeshData {
                vertices: scene::cube_vertices(),
                colors: scene::cube_colors(),
                indices: scene::cube_indices(),
            },
            vertex_shader: shader_path("scene.vs.wgsl"),
            fragment_shader: shader_path("scene.fs.wgsl"),
        },
        secondary: SurfaceSpec {
            title: "periscope mirror".to_string(),
            mode: SurfaceMode::Flat,
            mesh: MeshData {
                vertices: scene::pixel_grid_vertices(SCREEN_WIDTH, SCREEN_HEIGHT),
                // Colors stream in from the scene window's readback each
                // frame; nothing is drawn before the first upload.
                colors: Vec::new(),
                indices: scene::pixel_grid_indices(SCREEN_WIDTH, SCREEN_HEIGHT),
            },
            vertex_shader: shader_path("points.vs.wgsl"),
            fragment_shader: shader_path("points.fs.wgsl"),
        },
    }
}

fn run() -> Result<()> {
    coordinator::run(config())
}

fn main() {
    init_logging(LoggingConfig::default());

    if let Err(err) = run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
