use std::path::Path;

use anyhow::{Context, Result};
use glam::Mat4;
use ouroboros::self_referencing;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::camera::Camera;
use crate::device::{
    expected_color_len, expected_depth_len, normalize_color_texels, ChannelOrder, Gpu, GpuInit,
    SurfaceErrorAction,
};
use crate::render::{MeshRenderer, ShaderError, ShaderProgram, SurfaceMode};

use super::event::SurfaceEvent;

/// Construction parameters for one surface.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Outer position on the desktop, if the platform honors it.
    pub position: Option<(i32, i32)>,
    /// Stage rendered frames for CPU readback.
    pub capture: bool,
    pub mode: SurfaceMode,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            title: "periscope".to_string(),
            width: 640,
            height: 480,
            position: None,
            capture: false,
            mode: SurfaceMode::Flat,
        }
    }
}

// Window and GPU context are acquired together and released together; the
// GPU surface borrows the window, hence the self-referencing pair.
#[self_referencing]
struct SurfaceHandle {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// One native window with its own rendering context, camera, and geometry.
///
/// Every GPU-affecting operation goes through this surface's own
/// device/queue; nothing here touches another surface's context.
pub struct RenderSurface {
    handle: SurfaceHandle,
    renderer: MeshRenderer,
    camera: Camera,
    mode: SurfaceMode,

    shown: bool,
    focused: bool,
    pointer_over: bool,
}

impl RenderSurface {
    /// Creates the native window and its GPU context.
    ///
    /// Fails with context if window creation or adapter/device acquisition
    /// fails; no partially initialized surface is ever returned.
    pub fn create(event_loop: &ActiveEventLoop, config: &SurfaceConfig) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width.max(1), config.height.max(1)));

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        if let Some((x, y)) = config.position {
            window.set_outer_position(PhysicalPosition::new(x, y));
        }

        let gpu_init = GpuInit {
            capture: config.capture,
            ..GpuInit::default()
        };

        let handle = SurfaceHandleTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        log::info!(
            "surface created: {:?} ({}x{}, capture={})",
            handle.borrow_window().id(),
            config.width,
            config.height,
            config.capture
        );

        Ok(Self {
            handle,
            renderer: MeshRenderer::new(),
            camera: Camera::default(),
            mode: config.mode,
            shown: true,
            focused: false,
            pointer_over: false,
        })
    }

    pub fn id(&self) -> WindowId {
        self.handle.borrow_window().id()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.handle.borrow_gpu().size()
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_pointer_over(&self) -> bool {
        self.pointer_over
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Model-view-projection matrix for the current camera and mode.
    pub fn mvp(&self) -> Mat4 {
        let size = self.size();
        let proj = match self.mode {
            SurfaceMode::Spatial => self.camera.perspective(size.width, size.height),
            SurfaceMode::Flat => Mat4::IDENTITY,
        };
        proj * self.camera.view()
    }

    /// Resizes the native window and the GPU surface behind it.
    pub fn set_size(&mut self, width: u32, height: u32) {
        let size = PhysicalSize::new(width.max(1), height.max(1));
        let _ = self.handle.borrow_window().request_inner_size(size);
        self.handle.with_gpu_mut(|gpu| gpu.resize(size));
    }

    pub fn set_title(&self, title: &str) {
        self.handle.borrow_window().set_title(title);
    }

    pub fn set_position(&self, x: i32, y: i32) {
        self.handle
            .borrow_window()
            .set_outer_position(PhysicalPosition::new(x, y));
    }

    /// Switches between the flat point-field projection and the perspective
    /// one. Takes effect on the next draw.
    pub fn enable_3d(&mut self, enable: bool) {
        self.mode = if enable {
            SurfaceMode::Spatial
        } else {
            SurfaceMode::Flat
        };
        self.renderer.invalidate_pipeline();
    }

    /// Reacts to a window system resize notification.
    pub fn resized(&mut self, size: PhysicalSize<u32>) {
        self.handle.with_gpu_mut(|gpu| gpu.resize(size));
    }

    /// Replaces the position buffer (2 floats per vertex in Flat mode,
    /// 3 in Spatial mode).
    pub fn upload_vertices(&mut self, data: &[f32]) {
        let renderer = &mut self.renderer;
        self.handle.with_gpu(|gpu| renderer.upload_positions(gpu, data));
    }

    /// Replaces the color buffer (3 floats per vertex).
    pub fn upload_colors(&mut self, data: &[f32]) {
        let renderer = &mut self.renderer;
        self.handle.with_gpu(|gpu| renderer.upload_colors(gpu, data));
    }

    /// Replaces the per-vertex depth buffer (1 float per vertex).
    pub fn upload_depths(&mut self, data: &[f32]) {
        let renderer = &mut self.renderer;
        self.handle.with_gpu(|gpu| renderer.upload_depths(gpu, data));
    }

    /// Replaces the index buffer. The drawn element count always reflects
    /// this upload, not any earlier one.
    pub fn upload_indices(&mut self, data: &[u32]) {
        let renderer = &mut self.renderer;
        let mode = self.mode;
        self.handle
            .with_gpu(|gpu| renderer.upload_indices(gpu, data, mode));
    }

    /// Loads and validates the surface's shader program from two WGSL stage
    /// files. On failure the previously loaded program (if any) stays active.
    pub fn load_program(&mut self, vs_path: &Path, fs_path: &Path) -> Result<(), ShaderError> {
        let program = ShaderProgram::load(self.handle.borrow_gpu().device(), vs_path, fs_path)?;
        self.renderer.set_program(program);
        log::debug!(
            "program loaded for {:?}: {} + {}",
            self.id(),
            vs_path.display(),
            fs_path.display()
        );
        Ok(())
    }

    /// Renders one frame with the surface's own camera.
    ///
    /// Returns false on a fatal surface error; transient errors skip the
    /// frame and return true.
    pub fn render(&mut self) -> bool {
        let mvp = self.mvp();
        self.render_with(mvp)
    }

    /// Renders one frame through the inverse of a reference transform.
    ///
    /// Used by a Flat surface to undo the reference surface's camera: each
    /// vertex (x, y) with its depth attribute is mapped back out of the
    /// reference clip space before this surface's own transform applies.
    pub fn render_reprojected(&mut self, ref_mvp: Mat4) -> bool {
        let mvp = self.mvp() * ref_mvp.inverse();
        self.render_with(mvp)
    }

    fn render_with(&mut self, mvp: Mat4) -> bool {
        let renderer = &mut self.renderer;
        let mode = self.mode;

        self.handle.with_mut(|fields| {
            let gpu = fields.gpu;

            let mut frame = match gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    let action = gpu.handle_surface_error(err);
                    if action == SurfaceErrorAction::Fatal {
                        log::error!("fatal surface error on {:?}", fields.window.id());
                        return false;
                    }
                    return true;
                }
            };

            renderer.draw(gpu, &mut frame.encoder, &frame.view, mvp, mode);
            gpu.record_capture(&mut frame);

            fields.window.pre_present_notify();
            gpu.submit(frame);
            true
        })
    }

    /// Copies the last rendered frame's color samples into `out` as
    /// normalized RGB floats.
    ///
    /// Fails (without touching `out`) unless `out` holds exactly
    /// 3 * width * height samples.
    pub fn read_colors(&self, out: &mut [f32]) -> bool {
        let gpu = self.handle.borrow_gpu();
        let size = gpu.size();
        if out.len() != expected_color_len(size.width, size.height) {
            return false;
        }

        let Some(order) = ChannelOrder::of_format(gpu.surface_format()) else {
            log::error!("unsupported readback format {:?}", gpu.surface_format());
            return false;
        };

        match gpu.fetch_color_texels() {
            Ok(texels) => {
                normalize_color_texels(&texels, order, out);
                true
            }
            Err(err) => {
                log::error!("color readback failed: {err:#}");
                false
            }
        }
    }

    /// Copies the last rendered frame's depth samples into `out`.
    ///
    /// Fails (without touching `out`) unless `out` holds exactly
    /// width * height samples. Depth values are already normalized.
    pub fn read_depths(&self, out: &mut [f32]) -> bool {
        let gpu = self.handle.borrow_gpu();
        let size = gpu.size();
        if out.len() != expected_depth_len(size.width, size.height) {
            return false;
        }

        match gpu.fetch_depth_texels() {
            Ok(texels) => {
                out.copy_from_slice(bytemuck::cast_slice(&texels));
                true
            }
            Err(err) => {
                log::error!("depth readback failed: {err:#}");
                false
            }
        }
    }

    /// Applies a surface event to display flags and the camera.
    ///
    /// A close request hides the window instead of destroying it, so the
    /// surface can be shown again later.
    pub fn handle_event(&mut self, event: &SurfaceEvent) {
        match event {
            SurfaceEvent::Shown => self.shown = true,
            SurfaceEvent::Hidden => self.shown = false,
            SurfaceEvent::FocusGained => self.focused = true,
            SurfaceEvent::FocusLost => self.focused = false,
            SurfaceEvent::PointerEntered => self.pointer_over = true,
            SurfaceEvent::PointerLeft => self.pointer_over = false,
            SurfaceEvent::CloseRequested => {
                self.handle.borrow_window().set_visible(false);
                self.shown = false;
            }
            SurfaceEvent::Move(key) => self.camera.advance(*key),
        }
    }

    /// Applies relative pointer displacement to this surface's camera.
    pub fn apply_pointer_motion(&mut self, dx: f32, dy: f32) {
        let size = self.size();
        self.camera
            .apply_pointer_motion(dx, dy, size.width, size.height);
    }
}
