//! City markers on the globe surface.
//!
//! `MarkerRegistry` owns every marker. Markers only hold a weak reference to
//! their `City`; the catalog owns the data.

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use catalog::City;
use foundation::handles::Handle;
use foundation::math::{LatLng, Vec3, surface_normal, to_sphere};
use serde::Serialize;
use tracing::{debug, warn};

use crate::camera::{Camera, Projection, Viewport};
use crate::config::GlobeGeometry;
use crate::entity::MarkerId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    #[default]
    Idle,
    Hovered,
    Selected,
}

pub const PULSE_MIN_SCALE: f64 = 1.0;
pub const PULSE_MAX_SCALE: f64 = 1.5;
/// Scale units per second (0.02 per frame at 60 Hz).
pub const PULSE_RATE: f64 = 1.2;

/// Triangle-wave scale oscillating between `PULSE_MIN_SCALE` and
/// `PULSE_MAX_SCALE`. Only advanced while the marker is selected.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Pulse {
    /// Position along one full expand/contract cycle, in scale units.
    phase: f64,
}

impl Pulse {
    const SPAN: f64 = PULSE_MAX_SCALE - PULSE_MIN_SCALE;

    pub fn scale(&self) -> f64 {
        let offset = if self.phase <= Self::SPAN {
            self.phase
        } else {
            2.0 * Self::SPAN - self.phase
        };
        PULSE_MIN_SCALE + offset
    }

    pub fn advance(&mut self, dt_s: f64) {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return;
        }
        self.phase = (self.phase + dt_s * PULSE_RATE).rem_euclid(2.0 * Self::SPAN);
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[derive(Debug, Clone)]
pub struct Marker {
    id: MarkerId,
    city_id: String,
    city: Weak<City>,
    geo: LatLng,
    position: Vec3,
    state: MarkerState,
    pulse: Pulse,
}

impl Marker {
    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn city_id(&self) -> &str {
        &self.city_id
    }

    /// `None` once the catalog that owned the city has been dropped.
    pub fn city(&self) -> Option<Rc<City>> {
        self.city.upgrade()
    }

    pub fn geo(&self) -> LatLng {
        self.geo
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn state(&self) -> MarkerState {
        self.state
    }

    pub fn pulse(&self) -> Pulse {
        self.pulse
    }

    /// Horizon test: the marker faces away from `eye`.
    pub fn is_occluded_from(&self, eye: Vec3) -> bool {
        let Some(normal) = surface_normal(self.position) else {
            return true;
        };
        !((eye - self.position).dot(normal) > 0.0)
    }
}

/// Owner of the current marker set.
///
/// Ordering contract:
/// - Markers keep the insertion order of the cities passed to `set_cities`;
///   `markers()` and every consumer that iterates it follow that order.
#[derive(Debug, Clone)]
pub struct MarkerRegistry {
    geometry: GlobeGeometry,
    generation: u32,
    markers: Vec<Marker>,
    by_city: BTreeMap<String, usize>,
}

impl MarkerRegistry {
    pub fn new(geometry: GlobeGeometry) -> Self {
        Self {
            geometry,
            generation: 0,
            markers: Vec::new(),
            by_city: BTreeMap::new(),
        }
    }

    pub fn geometry(&self) -> &GlobeGeometry {
        &self.geometry
    }

    pub fn globe_radius(&self) -> f64 {
        self.geometry.radius
    }

    pub fn marker_size(&self) -> f64 {
        self.geometry.marker_size
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Replaces the whole marker set. Ids issued for the previous set stop
    /// resolving.
    pub fn set_cities(&mut self, cities: &[Rc<City>]) {
        self.generation = self.generation.wrapping_add(1);
        self.markers.clear();
        self.by_city.clear();

        let lifted = self.geometry.radius * (1.0 + self.geometry.marker_height);
        for city in cities {
            if self.by_city.contains_key(&city.id) {
                warn!(id = %city.id, "duplicate city id; keeping the first marker");
                continue;
            }
            let index = self.markers.len();
            let geo = LatLng::new(city.lat, city.lng);
            self.markers.push(Marker {
                id: MarkerId(Handle::new(index as u32, self.generation)),
                city_id: city.id.clone(),
                city: Rc::downgrade(city),
                geo,
                position: to_sphere(geo.lat, geo.lng, lifted),
                state: MarkerState::Idle,
                pulse: Pulse::default(),
            });
            self.by_city.insert(city.id.clone(), index);
        }
        debug!(
            markers = self.markers.len(),
            generation = self.generation,
            "marker set replaced"
        );
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        if id.generation() != self.generation {
            return None;
        }
        self.markers.get(id.index() as usize)
    }

    fn get_mut(&mut self, id: MarkerId) -> Option<&mut Marker> {
        if id.generation() != self.generation {
            return None;
        }
        self.markers.get_mut(id.index() as usize)
    }

    pub fn by_city_id(&self, city_id: &str) -> Option<&Marker> {
        self.by_city.get(city_id).map(|&idx| &self.markers[idx])
    }

    pub fn city(&self, id: MarkerId) -> Option<Rc<City>> {
        self.get(id).and_then(Marker::city)
    }

    pub fn state(&self, id: MarkerId) -> Option<MarkerState> {
        self.get(id).map(Marker::state)
    }

    /// Returns `true` if the state changed. Leaving `Selected` resets the pulse.
    pub fn set_state(&mut self, id: MarkerId, state: MarkerState) -> bool {
        let Some(marker) = self.get_mut(id) else {
            return false;
        };
        if marker.state == state {
            return false;
        }
        if marker.state == MarkerState::Selected {
            marker.pulse.reset();
        }
        marker.state = state;
        true
    }

    pub fn is_occluded(&self, id: MarkerId, camera: &Camera) -> bool {
        self.get(id)
            .is_none_or(|m| m.is_occluded_from(camera.position))
    }

    pub fn project(
        &self,
        id: MarkerId,
        camera: &Camera,
        viewport: &Viewport,
    ) -> Option<Projection> {
        self.get(id)
            .and_then(|m| camera.project(m.position, viewport))
    }

    /// Advances the pulse of selected markers.
    pub fn tick(&mut self, dt_s: f64) {
        for marker in &mut self.markers {
            if marker.state == MarkerState::Selected {
                marker.pulse.advance(dt_s);
            }
        }
    }
}
