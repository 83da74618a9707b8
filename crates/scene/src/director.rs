//! Camera fly-to animation.

use foundation::math::{LatLng, Vec3, to_sphere};
use tracing::debug;

use crate::camera::Camera;

/// Quadratic ease-in/ease-out on `[0, 1]`.
pub fn ease_in_out_quad(p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        2.0 * p * p
    } else {
        1.0 - 2.0 * (1.0 - p) * (1.0 - p)
    }
}

/// An in-progress camera move. Dropped when it completes or a new flight
/// supersedes it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Flight {
    pub start: Vec3,
    pub target: Vec3,
    pub progress: f64,
    pub duration_ms: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum DirectorState {
    #[default]
    Idle,
    Animating(Flight),
}

/// Owns the camera and eases it toward fly-to targets.
#[derive(Debug, Clone)]
pub struct CameraDirector {
    camera: Camera,
    state: DirectorState,
    distance: f64,
    duration_ms: f64,
}

impl CameraDirector {
    /// `distance` is the camera's distance from the globe center at the end
    /// of every flight.
    pub fn new(camera: Camera, distance: f64, duration_ms: f64) -> Self {
        Self {
            camera,
            state: DirectorState::Idle,
            distance,
            duration_ms,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Direct camera access for orbit controls. A running flight keeps
    /// overwriting the position until it completes.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn state(&self) -> DirectorState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, DirectorState::Animating(_))
    }

    /// Starts a flight from the current camera position, replacing any
    /// flight in progress.
    pub fn fly_to(&mut self, lat: f64, lng: f64) {
        let geo = LatLng::new(lat, lng);
        let target = to_sphere(geo.lat, geo.lng, self.distance);
        debug!(lat = geo.lat, lng = geo.lng, "fly-to started");

        if !(self.duration_ms > 0.0) {
            self.finish(target);
            return;
        }
        self.state = DirectorState::Animating(Flight {
            start: self.camera.position,
            target,
            progress: 0.0,
            duration_ms: self.duration_ms,
        });
    }

    /// Advances the active flight by `elapsed_ms`.
    pub fn tick(&mut self, elapsed_ms: f64) {
        let DirectorState::Animating(mut flight) = self.state else {
            return;
        };
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            flight.progress += elapsed_ms / flight.duration_ms;
        }
        if flight.progress >= 1.0 {
            self.finish(flight.target);
            return;
        }

        self.camera.position = flight
            .start
            .lerp(flight.target, ease_in_out_quad(flight.progress));
        self.camera.look_at(Vec3::ZERO);
        self.state = DirectorState::Animating(flight);
    }

    /// Stops the flight where it is.
    pub fn cancel(&mut self) {
        self.state = DirectorState::Idle;
    }

    fn finish(&mut self, target: Vec3) {
        self.camera.position = target;
        self.camera.look_at(Vec3::ZERO);
        self.state = DirectorState::Idle;
        debug!("fly-to finished");
    }
}
