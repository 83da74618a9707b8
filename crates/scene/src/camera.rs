use foundation::math::{Vec2, Vec3};

use crate::config::GlobeGeometry;
use crate::picking::Ray;

/// Drawing surface size in CSS pixels. Re-set explicitly on resize.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Dimensions below one pixel (or non-finite) are clamped to one.
    pub fn new(width: f64, height: f64) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.max(1.0) } else { 1.0 };
        Self {
            width: clamp(width),
            height: clamp(height),
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Pixel position (origin top-left, y down) to NDC in `[-1, 1]` (y up).
    pub fn to_ndc(&self, px: Vec2) -> Vec2 {
        Vec2::new(
            (px.x / self.width) * 2.0 - 1.0,
            -(px.y / self.height) * 2.0 + 1.0,
        )
    }

    pub fn to_px(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.width,
            (1.0 - (ndc.y * 0.5 + 0.5)) * self.height,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Screen-space projection of a world point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub screen_x: f64,
    pub screen_y: f64,
    /// NDC depth: -1 at the near plane, 1 at the far plane.
    pub depth: f64,
    /// Distance along the view axis.
    pub view_depth: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Basis {
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

/// Right-handed perspective camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    /// Camera on `+Z` at the configured distance, looking at the globe center.
    pub fn from_geometry(geometry: &GlobeGeometry) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, geometry.camera_distance),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg: geometry.fov_y_deg,
            near: geometry.near,
            far: geometry.far,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn distance_to_origin(&self) -> f64 {
        self.position.length()
    }

    pub fn forward(&self) -> Option<Vec3> {
        self.basis().map(|b| b.forward)
    }

    fn basis(&self) -> Option<Basis> {
        let forward = (self.target - self.position).normalize()?;
        // Looking straight along `up` (camera over a pole): fall back to +Z.
        let right = forward
            .cross(self.up)
            .normalize()
            .or_else(|| forward.cross(Vec3::Z).normalize())?;
        let up = right.cross(forward);
        Some(Basis { forward, right, up })
    }

    fn tan_half_fov(&self) -> f64 {
        (self.fov_y_deg.to_radians() * 0.5).tan()
    }

    /// Perspective projection of `p`. `None` for points on or behind the
    /// camera plane, or when the camera basis is degenerate.
    pub fn project(&self, p: Vec3, viewport: &Viewport) -> Option<Projection> {
        let basis = self.basis()?;
        let d = p - self.position;
        let view_depth = d.dot(basis.forward);
        if !(view_depth > 0.0) {
            return None;
        }
        let tan_half = self.tan_half_fov();
        let ndc = Vec2::new(
            d.dot(basis.right) / (view_depth * tan_half * viewport.aspect()),
            d.dot(basis.up) / (view_depth * tan_half),
        );
        let (n, f) = (self.near, self.far);
        let depth = (f + n) / (f - n) - (2.0 * f * n) / ((f - n) * view_depth);
        let px = viewport.to_px(ndc);

        Some(Projection {
            screen_x: px.x,
            screen_y: px.y,
            depth,
            view_depth,
        })
    }

    /// Ray from the eye through a point given in NDC.
    pub fn ray_through_ndc(&self, ndc: Vec2, viewport: &Viewport) -> Option<Ray> {
        let basis = self.basis()?;
        let tan_half = self.tan_half_fov();
        let dir = basis.forward
            + basis.right * (ndc.x * tan_half * viewport.aspect())
            + basis.up * (ndc.y * tan_half);
        Some(Ray::new(self.position, dir.normalize()?))
    }
}
