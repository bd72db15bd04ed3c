use std::path::PathBuf;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::device::{expected_color_len, expected_depth_len};
use crate::render::SurfaceMode;
use crate::surface::{translate_window_event, RenderSurface, SurfaceConfig};
use crate::time::FrameClock;

use super::registry::{SurfaceRegistry, SurfaceRole};
use super::{frame_plan, FramePlan};

/// Static geometry for one surface.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub colors: Vec<f32>,
    pub indices: Vec<u32>,
}

/// Everything needed to set up one surface at startup.
#[derive(Debug, Clone)]
pub struct SurfaceSpec {
    pub title: String,
    pub mode: SurfaceMode,
    pub mesh: MeshData,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
}

/// Coordinator configuration.
///
/// Both windows are created at `width` x `height` so the primary's pixel
/// buffer maps 1:1 onto the secondary's vertex grid.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub width: u32,
    pub height: u32,
    pub primary: SurfaceSpec,
    pub secondary: SurfaceSpec,
}

struct SurfacePair {
    primary: RenderSurface,
    secondary: RenderSurface,
}

impl SurfacePair {
    fn get_mut(&mut self, role: SurfaceRole) -> &mut RenderSurface {
        match role {
            SurfaceRole::Primary => &mut self.primary,
            SurfaceRole::Secondary => &mut self.secondary,
        }
    }
}

/// Owns both surfaces and drives the render/readback/reproject loop.
///
/// Single-threaded by construction: the event loop thread owns both GPU
/// contexts and all buffers, and each per-surface operation goes through
/// that surface's own device handle.
pub struct DualSurfaceCoordinator {
    config: CoordinatorConfig,

    surfaces: Option<SurfacePair>,
    registry: SurfaceRegistry<WindowId>,

    /// Relative pointer displacement accumulated since the last frame.
    pointer_delta: (f64, f64),

    /// Reused readback destinations, sized once at startup.
    color_scratch: Vec<f32>,
    depth_scratch: Vec<f32>,

    clock: FrameClock,
    exiting: bool,
}

impl DualSurfaceCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        let color_len = expected_color_len(config.width, config.height);
        let depth_len = expected_depth_len(config.width, config.height);

        Self {
            config,
            surfaces: None,
            registry: SurfaceRegistry::new(),
            pointer_delta: (0.0, 0.0),
            color_scratch: vec![0.0; color_len],
            depth_scratch: vec![0.0; depth_len],
            clock: FrameClock::new(),
            exiting: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exiting = true;
        event_loop.exit();
    }

    /// Creates both surfaces, builds the id map, and uploads static data.
    fn setup(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary = self
            .create_surface(event_loop, SurfaceRole::Primary)
            .context("primary surface initialization failed")?;
        let secondary = self
            .create_surface(event_loop, SurfaceRole::Secondary)
            .context("secondary surface initialization failed")?;

        // The map is complete before the first event is routed and never
        // mutated afterwards.
        self.registry.insert(primary.id(), SurfaceRole::Primary);
        self.registry.insert(secondary.id(), SurfaceRole::Secondary);

        let mut pair = SurfacePair { primary, secondary };

        // The secondary starts with a zeroed depth field; real depths stream
        // in once the primary has rendered.
        let depth_len = expected_depth_len(self.config.width, self.config.height);
        pair.secondary.upload_depths(&vec![0.0; depth_len]);

        // Match the secondary's pixel dimensions to the primary's so the
        // readback buffer and the vertex grid line up 1:1.
        pair.secondary.set_size(self.config.width, self.config.height);

        self.surfaces = Some(pair);
        Ok(())
    }

    fn create_surface(
        &mut self,
        event_loop: &ActiveEventLoop,
        role: SurfaceRole,
    ) -> Result<RenderSurface> {
        let spec = match role {
            SurfaceRole::Primary => &self.config.primary,
            SurfaceRole::Secondary => &self.config.secondary,
        };

        let mut surface = RenderSurface::create(
            event_loop,
            &SurfaceConfig {
                title: spec.title.clone(),
                width: self.config.width,
                height: self.config.height,
                position: None,
                // Only the primary's frames are read back.
                capture: role == SurfaceRole::Primary,
                mode: spec.mode,
            },
        )?;

        surface.upload_vertices(&spec.mesh.vertices);
        if !spec.mesh.colors.is_empty() {
            surface.upload_colors(&spec.mesh.colors);
        }
        surface.upload_indices(&spec.mesh.indices);

        surface
            .load_program(&spec.vertex_shader, &spec.fragment_shader)
            .with_context(|| format!("loading shader program for {:?}", role))?;

        Ok(surface)
    }

    /// One iteration of the frame loop.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(pair) = self.surfaces.as_mut() else {
            return;
        };

        // Pointer motion goes to whichever surface holds keyboard focus with
        // the pointer over it.
        let (dx, dy) = std::mem::take(&mut self.pointer_delta);
        if dx != 0.0 || dy != 0.0 {
            for surface in [&mut pair.primary, &mut pair.secondary] {
                if surface.is_focused() && surface.is_pointer_over() {
                    surface.apply_pointer_motion(dx as f32, dy as f32);
                }
            }
        }

        let ft = self.clock.tick();
        if ft.frame_index % 600 == 0 {
            log::trace!("frame {} dt={:.4}s", ft.frame_index, ft.dt);
        }

        match frame_plan(pair.primary.is_shown(), pair.secondary.is_shown()) {
            FramePlan::Quit => {
                log::info!("primary surface hidden; leaving frame loop");
                self.request_exit(event_loop);
            }
            plan => {
                // The readback of this frame is reprojected through the
                // transform that produced it, captured before any pointer
                // input can move it next frame.
                let ref_mvp = pair.primary.mvp();

                if !pair.primary.render() {
                    self.request_exit(event_loop);
                    return;
                }

                let have_colors = pair.primary.read_colors(&mut self.color_scratch);
                let have_depths = pair.primary.read_depths(&mut self.depth_scratch);
                if !have_colors {
                    log::warn!("color readback unavailable this frame");
                }

                if plan == FramePlan::Both && have_colors {
                    pair.secondary.upload_colors(&self.color_scratch);
                    if have_depths {
                        pair.secondary.upload_depths(&self.depth_scratch);
                    }
                    if !pair.secondary.render_reprojected(ref_mvp) {
                        self.request_exit(event_loop);
                    }
                }
            }
        }
    }
}

impl ApplicationHandler for DualSurfaceCoordinator {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surfaces.is_some() {
            return;
        }

        if let Err(err) = self.setup(event_loop) {
            log::error!("startup failed: {err:#}");
            self.request_exit(event_loop);
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.pointer_delta.0 += dx;
            self.pointer_delta.1 += dy;
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exiting {
            return;
        }

        // Events for ids neither surface owns are dropped, not indexed.
        let Some(role) = self.registry.role_of(&window_id) else {
            log::trace!("ignoring event for unknown window {window_id:?}");
            return;
        };

        let Some(pair) = self.surfaces.as_mut() else {
            return;
        };
        let surface = pair.get_mut(role);

        if let WindowEvent::Resized(new_size) = &event {
            surface.resized(*new_size);
        }

        if let Some(ev) = translate_window_event(&event) {
            surface.handle_event(&ev);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exiting {
            event_loop.exit();
            return;
        }

        // The loop is paced by the swapchain present (FIFO), not by winit.
        event_loop.set_control_flow(ControlFlow::Poll);
        self.frame(event_loop);
    }
}

/// Builds the event loop and runs the coordinator until it exits.
pub fn run(config: CoordinatorConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

    let mut coordinator = DualSurfaceCoordinator::new(config);
    event_loop
        .run_app(&mut coordinator)
        .context("winit event loop terminated with error")?;

    Ok(())
}
