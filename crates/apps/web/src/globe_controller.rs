//! Orbit controller: drag to rotate around the globe, wheel to zoom.
//!
//! The controller never owns the camera. It reads the camera position on
//! each update, applies damped rotation and eased zoom in spherical
//! coordinates around the globe center, and writes the result back. While a
//! fly-to is running the director owns the position, so pending motion is
//! dropped and the zoom target follows the camera.

use foundation::math::Vec3;
use scene::{Camera, ControlsConfig, GlobeGeometry};

/// Keeps the camera off the polar axis, where azimuth is undefined.
const POLAR_EPSILON: f64 = 1e-3;

/// Per-notch wheel zoom ratio before `zoom_speed` is applied.
const WHEEL_ZOOM_STEP: f64 = 0.95;

/// Drag button type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragButton {
    #[default]
    None,
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone)]
pub struct OrbitController {
    controls: ControlsConfig,
    min_distance: f64,
    max_distance: f64,

    /// Rotation still to be applied, in radians. Drained by `update`.
    pending_azimuth: f64,
    pending_polar: f64,

    /// Zoom goal; `None` holds the camera's current distance.
    target_distance: Option<f64>,

    canvas_height: f64,
    drag_button: DragButton,
    last_pos_px: Option<[f64; 2]>,
}

impl OrbitController {
    pub fn new(controls: ControlsConfig, geometry: &GlobeGeometry) -> Self {
        Self {
            controls,
            min_distance: geometry.camera_min_distance,
            max_distance: geometry.camera_max_distance,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            target_distance: None,
            canvas_height: 600.0,
            drag_button: DragButton::None,
            last_pos_px: None,
        }
    }

    pub fn set_canvas_size(&mut self, _width: f64, height: f64) {
        self.canvas_height = if height.is_finite() { height.max(1.0) } else { 1.0 };
    }

    pub fn is_dragging(&self) -> bool {
        self.last_pos_px.is_some()
    }

    /// `button`: 0 = left, 1 = middle, 2 = right.
    pub fn on_pointer_down(&mut self, pos_px: [f64; 2], button: i32) {
        self.drag_button = match button {
            1 => DragButton::Middle,
            2 => DragButton::Right,
            _ => DragButton::Left,
        };
        self.last_pos_px = Some(pos_px);
    }

    /// Returns the drag distance in pixels covered by this move, or 0 when
    /// not dragging. Only a left drag rotates; there is no pan.
    pub fn on_pointer_move(&mut self, pos_px: [f64; 2]) -> f64 {
        let Some(last) = self.last_pos_px else {
            return 0.0;
        };
        let (dx, dy) = (pos_px[0] - last[0], pos_px[1] - last[1]);
        if !(dx.is_finite() && dy.is_finite()) {
            return 0.0;
        }
        if self.drag_button == DragButton::Left {
            let per_px =
                2.0 * std::f64::consts::PI / self.canvas_height * self.controls.rotate_speed;
            self.pending_azimuth -= dx * per_px;
            self.pending_polar -= dy * per_px;
        }
        self.last_pos_px = Some(pos_px);
        dx.hypot(dy)
    }

    pub fn on_pointer_up(&mut self) {
        self.drag_button = DragButton::None;
        self.last_pos_px = None;
    }

    /// `delta` > 0 zooms out, < 0 zooms in.
    pub fn on_wheel(&mut self, delta: f64, camera: &Camera) {
        if !delta.is_finite() || delta == 0.0 {
            return;
        }
        let current = self
            .target_distance
            .unwrap_or_else(|| camera.distance_to_origin());
        let step = WHEEL_ZOOM_STEP.powf(self.controls.zoom_speed);
        let next = if delta > 0.0 { current / step } else { current * step };
        self.target_distance = Some(next.clamp(self.min_distance, self.max_distance));
    }

    /// Arrow-key rotation; each unit turns by `keyboard_rotate_speed` degrees.
    pub fn key_rotate(&mut self, dx: f64, dy: f64) {
        let step = self.controls.keyboard_rotate_speed.to_radians();
        if dx.is_finite() {
            self.pending_azimuth -= dx * step;
        }
        if dy.is_finite() {
            self.pending_polar -= dy * step;
        }
    }

    /// Applies damped motion to `camera`. `animating` is true while a fly-to
    /// owns the camera position.
    pub fn update(&mut self, dt_s: f64, camera: &mut Camera, animating: bool) {
        let distance = camera.distance_to_origin();
        if animating {
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
            self.target_distance = None;
            return;
        }
        let Some(dir) = camera.position.normalize() else {
            return;
        };

        // Damping is specified per 60 Hz frame.
        let frames = if dt_s.is_finite() { (dt_s * 60.0).clamp(0.0, 6.0) } else { 0.0 };
        let damping = self.controls.damping_factor.clamp(0.0, 1.0);
        let applied = if damping > 0.0 {
            1.0 - (1.0 - damping).powf(frames)
        } else {
            1.0
        };

        let d_azimuth = self.pending_azimuth * applied;
        let d_polar = self.pending_polar * applied;
        self.pending_azimuth -= d_azimuth;
        self.pending_polar -= d_polar;

        let target = self.target_distance.unwrap_or(distance);
        let new_distance = (distance + (target - distance) * applied)
            .clamp(self.min_distance, self.max_distance);

        let (azimuth, polar) = to_spherical(dir);
        let polar = (polar + d_polar).clamp(POLAR_EPSILON, std::f64::consts::PI - POLAR_EPSILON);
        camera.position = from_spherical(azimuth + d_azimuth, polar) * new_distance;
        camera.look_at(Vec3::ZERO);
    }

    pub fn target_distance(&self) -> Option<f64> {
        self.target_distance
    }
}

/// `(azimuth, polar)` of a unit vector; azimuth measured from `+Z` toward `+X`.
fn to_spherical(dir: Vec3) -> (f64, f64) {
    (dir.x.atan2(dir.z), dir.y.clamp(-1.0, 1.0).acos())
}

fn from_spherical(azimuth: f64, polar: f64) -> Vec3 {
    Vec3::new(
        polar.sin() * azimuth.sin(),
        polar.cos(),
        polar.sin() * azimuth.cos(),
    )
}
