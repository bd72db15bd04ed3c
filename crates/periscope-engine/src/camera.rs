//! Free-look camera state shared by both render surfaces.
//!
//! Angles are kept in degrees because the pointer mapping is specified in
//! degrees per window dimension. Conversion to radians happens only when
//! matrices are built.

use glam::{Mat4, Vec3};

use crate::surface::MoveKey;

/// Near clip plane distance for the perspective projection.
pub const MIN_DISTANCE: f32 = 0.1;

/// Far clip plane distance for the perspective projection.
pub const MAX_DISTANCE: f32 = 100.0;

const FOV_Y_DEG: f32 = 45.0;

/// Camera state for one surface.
///
/// `offset` is the translation applied to the scene after the view rotation,
/// so key movement shifts the world relative to a camera fixed at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub offset: Vec3,
    pub azimuth_deg: f32,
    pub elevation_deg: f32,
    pub speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec3::ZERO,
            azimuth_deg: 0.0,
            elevation_deg: 0.0,
            speed: 0.1,
        }
    }
}

impl Camera {
    /// Advances the offset along camera-relative axes.
    ///
    /// Forward/back and strafe directions are rotated by the current azimuth,
    /// so movement follows the current facing rather than world axes.
    /// Up/down stays world-vertical.
    pub fn advance(&mut self, key: MoveKey) {
        let az = self.azimuth_deg.to_radians();
        let (sin, cos) = az.sin_cos();

        match key {
            MoveKey::Forward => {
                self.offset.z += self.speed * cos;
                self.offset.x -= self.speed * sin;
            }
            MoveKey::Backward => {
                self.offset.z -= self.speed * cos;
                self.offset.x += self.speed * sin;
            }
            MoveKey::Right => {
                self.offset.z -= self.speed * sin;
                self.offset.x -= self.speed * cos;
            }
            MoveKey::Left => {
                self.offset.z += self.speed * sin;
                self.offset.x += self.speed * cos;
            }
            MoveKey::Up => self.offset.y += self.speed,
            MoveKey::Down => self.offset.y -= self.speed,
        }
    }

    /// Applies relative pointer displacement in pixels.
    ///
    /// A displacement equal to the full window dimension turns the camera by
    /// exactly half a revolution on that axis.
    pub fn apply_pointer_motion(&mut self, dx: f32, dy: f32, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.azimuth_deg += 180.0 * dx / width as f32;
        self.elevation_deg += 180.0 * dy / height as f32;
    }

    /// View matrix: look from the origin toward -Z, rotate by elevation then
    /// azimuth, then translate by the accumulated offset.
    pub fn view(&self) -> Mat4 {
        Mat4::from_rotation_x(self.elevation_deg.to_radians())
            * Mat4::from_rotation_y(self.azimuth_deg.to_radians())
            * Mat4::from_translation(self.offset)
    }

    /// Perspective projection with the fixed field of view and clip planes.
    ///
    /// Depth range is [0, 1] to match the GPU convention.
    pub fn perspective(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect, MIN_DISTANCE, MAX_DISTANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < EPS, "{a} != {b}");
    }

    // ── movement ──────────────────────────────────────────────────────────

    #[test]
    fn forward_moves_along_facing() {
        let mut cam = Camera::default();
        cam.advance(MoveKey::Forward);
        assert_close(cam.offset.x, 0.0);
        assert_close(cam.offset.z, cam.speed);
    }

    #[test]
    fn forward_rotate_forward_traces_l_shape() {
        let mut cam = Camera::default();
        cam.advance(MoveKey::Forward);
        let after_first = cam.offset;

        cam.azimuth_deg += 90.0;
        cam.advance(MoveKey::Forward);

        // Second leg is perpendicular to the first, not collinear with it.
        assert_close(cam.offset.z, after_first.z);
        assert_close(cam.offset.x, after_first.x - cam.speed);
    }

    #[test]
    fn backward_undoes_forward() {
        let mut cam = Camera::default();
        cam.azimuth_deg = 37.0;
        cam.advance(MoveKey::Forward);
        cam.advance(MoveKey::Backward);
        assert_close(cam.offset.x, 0.0);
        assert_close(cam.offset.z, 0.0);
    }

    #[test]
    fn vertical_movement_ignores_azimuth() {
        let mut cam = Camera::default();
        cam.azimuth_deg = 123.0;
        cam.advance(MoveKey::Up);
        cam.advance(MoveKey::Up);
        cam.advance(MoveKey::Down);
        assert_close(cam.offset.y, cam.speed);
        assert_close(cam.offset.x, 0.0);
        assert_close(cam.offset.z, 0.0);
    }

    // ── pointer mapping ───────────────────────────────────────────────────

    #[test]
    fn full_width_drag_is_half_turn() {
        let mut cam = Camera::default();
        cam.apply_pointer_motion(640.0, 0.0, 640, 480);
        assert_close(cam.azimuth_deg, 180.0);
        assert_close(cam.elevation_deg, 0.0);
    }

    #[test]
    fn full_height_drag_is_half_turn() {
        let mut cam = Camera::default();
        cam.apply_pointer_motion(0.0, 480.0, 640, 480);
        assert_close(cam.elevation_deg, 180.0);
    }

    #[test]
    fn pointer_mapping_is_linear() {
        let mut a = Camera::default();
        let mut b = Camera::default();
        a.apply_pointer_motion(10.0, 4.0, 640, 480);
        a.apply_pointer_motion(10.0, 4.0, 640, 480);
        b.apply_pointer_motion(20.0, 8.0, 640, 480);
        assert_close(a.azimuth_deg, b.azimuth_deg);
        assert_close(a.elevation_deg, b.elevation_deg);
    }

    #[test]
    fn zero_size_window_does_not_divide_by_zero() {
        let mut cam = Camera::default();
        cam.apply_pointer_motion(10.0, 10.0, 0, 0);
        assert_close(cam.azimuth_deg, 0.0);
    }

    // ── matrices ──────────────────────────────────────────────────────────

    #[test]
    fn identity_camera_view_is_identity() {
        let cam = Camera::default();
        assert!(cam.view().abs_diff_eq(Mat4::IDENTITY, EPS));
    }

    #[test]
    fn view_applies_translation_after_rotation() {
        let mut cam = Camera::default();
        cam.azimuth_deg = 90.0;
        cam.offset = Vec3::new(1.0, 0.0, 0.0);

        // A point at the world origin ends up at the rotated offset.
        let p = cam.view().project_point3(Vec3::ZERO);
        assert_close(p.z, -1.0);
        assert!(p.x.abs() < EPS);
    }
}
