//! The interaction core wired together: pointer input is picked against the
//! markers, fed through the selection state and fanned out to marker
//! visuals, the camera director and the event bus.

use catalog::{City, CityCatalog};
use foundation::math::{LatLng, Vec2, Vec3};
use runtime::{Envelope, EventBus, Frame, SubscriptionId};
use tracing::{debug, info};

use crate::camera::{Camera, Viewport};
use crate::config::GlobeConfig;
use crate::director::CameraDirector;
use crate::entity::MarkerId;
use crate::events::GlobeEvent;
use crate::labels::{LabelPlacement, layout_labels};
use crate::markers::MarkerRegistry;
use crate::picking::{PickHit, PickOptions, pick};
use crate::selection::{SelectionState, SelectionTargets};

#[derive(Debug)]
pub struct GlobeSession {
    config: GlobeConfig,
    viewport: Viewport,
    catalog: CityCatalog,
    registry: MarkerRegistry,
    director: CameraDirector,
    selection: SelectionState,
    bus: EventBus<GlobeEvent>,
    frame: Frame,
}

impl GlobeSession {
    pub fn new(config: GlobeConfig, viewport: Viewport) -> Self {
        let geometry = config.globe;
        let director = CameraDirector::new(
            Camera::from_geometry(&geometry),
            geometry.camera_distance,
            config.fly_to.duration_ms,
        );
        Self {
            registry: MarkerRegistry::new(geometry),
            director,
            config,
            viewport,
            catalog: CityCatalog::new(),
            selection: SelectionState::new(),
            bus: EventBus::new(),
            frame: Frame::first(),
        }
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn camera(&self) -> &Camera {
        self.director.camera()
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        self.director.camera_mut()
    }

    pub fn director(&self) -> &CameraDirector {
        &self.director
    }

    pub fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn selected_city(&self) -> Option<std::rc::Rc<City>> {
        self.selection
            .selected()
            .and_then(|id| self.registry.city(id))
    }

    fn targets(&mut self) -> (&mut SelectionState, SelectionTargets<'_>) {
        (
            &mut self.selection,
            SelectionTargets {
                registry: &mut self.registry,
                director: &mut self.director,
                bus: &mut self.bus,
                frame: self.frame,
            },
        )
    }

    /// Replaces the city data and the whole marker set. A current selection
    /// or hover is cleared first, with notifications.
    pub fn set_catalog(&mut self, catalog: CityCatalog) {
        let (selection, mut cx) = self.targets();
        selection.clear(&mut cx);

        self.registry.set_cities(catalog.cities());
        self.catalog = catalog;
        info!(cities = self.catalog.len(), "globe cities set");
    }

    pub fn set_cities(&mut self, cities: impl IntoIterator<Item = City>) {
        self.set_catalog(CityCatalog::from_cities(cities));
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
    }

    /// Marker under the pixel position, if any.
    pub fn pick_at(&self, px: Vec2) -> Option<PickHit> {
        let ndc = self.viewport.to_ndc(px);
        pick(
            &self.registry,
            self.director.camera(),
            &self.viewport,
            ndc,
            PickOptions::from(&self.config.picking),
        )
    }

    /// Updates the hover from the pointer. Returns the hovered marker.
    pub fn pointer_move(&mut self, px: Vec2) -> Option<MarkerId> {
        let hovered = self.pick_at(px).map(|hit| hit.marker);
        let (selection, mut cx) = self.targets();
        selection.set_hovered(hovered, &mut cx);
        hovered
    }

    pub fn pointer_leave(&mut self) {
        let (selection, mut cx) = self.targets();
        selection.set_hovered(None, &mut cx);
    }

    /// Selects the clicked city. Clicks that miss every marker do nothing.
    pub fn click(&mut self, px: Vec2) -> bool {
        let Some(hit) = self.pick_at(px) else {
            return false;
        };
        let Some(city_id) = self.registry.get(hit.marker).map(|m| m.city_id().to_string()) else {
            return false;
        };
        self.select_city(Some(&city_id))
    }

    /// `None` deselects (the player was closed).
    pub fn select_city(&mut self, city_id: Option<&str>) -> bool {
        let (selection, mut cx) = self.targets();
        selection.select(city_id, &mut cx)
    }

    pub fn fly_to(&mut self, lat: f64, lng: f64) {
        self.director.fly_to(lat, lng);
    }

    /// Frames the city nearest the configured start location without
    /// selecting it. Returns the city id, or `None` with no cities loaded.
    pub fn go_to_initial_location(&mut self) -> Option<String> {
        let start = self.config.initial_location;
        let (city, km) = self.catalog.nearest(LatLng::new(start.lat, start.lng))?;
        let (id, lat, lng) = (city.id.clone(), city.lat, city.lng);
        debug!(city = %id, km, "framing initial location");
        self.director.fly_to(lat, lng);
        Some(id)
    }

    /// Advances one frame: camera flight, marker pulses, then label layout.
    pub fn tick(&mut self, dt_s: f64) -> Vec<LabelPlacement> {
        self.frame = self.frame.advance(dt_s);
        self.director.tick(self.frame.dt_s * 1000.0);
        self.registry.tick(self.frame.dt_s);
        self.labels()
    }

    /// Label layout for the current camera without advancing time.
    pub fn labels(&self) -> Vec<LabelPlacement> {
        layout_labels(
            &self.registry,
            self.director.camera(),
            &self.viewport,
            &self.config.labels,
        )
    }

    /// Zooms along the current view direction, clamped to the configured
    /// camera distance range.
    pub fn set_camera_distance(&mut self, distance: f64) {
        let g = self.config.globe;
        let distance = distance.clamp(g.camera_min_distance, g.camera_max_distance);
        let camera = self.director.camera_mut();
        let dir = camera.position.normalize().unwrap_or(Vec3::Z);
        camera.position = dir * distance;
        camera.look_at(Vec3::ZERO);
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&Envelope<GlobeEvent>) + 'static) -> SubscriptionId {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn drain_events(&mut self) -> Vec<Envelope<GlobeEvent>> {
        self.bus.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::GlobeSession;
    use crate::camera::Viewport;
    use crate::config::GlobeConfig;
    use crate::events::GlobeEvent;
    use crate::markers::MarkerState;
    use catalog::CityCatalog;
    use foundation::math::{Vec2, to_sphere};
    use std::cell::RefCell;
    use std::rc::Rc;

    const CITIES: &str = r#"[
        {"id": "nyc", "name": "New York", "lat": 40.7128, "lng": -74.006, "country": "USA",
         "playlist": [{"title": "A", "artist": "B", "year": 1981}]},
        {"id": "lon", "name": "London", "lat": 51.5074, "lng": -0.1278, "country": "UK"},
        {"id": "eq", "name": "Equator", "lat": 0, "lng": -90, "country": "Sea"}
    ]"#;

    fn session() -> GlobeSession {
        let mut s = GlobeSession::new(GlobeConfig::default(), Viewport::new(800.0, 600.0));
        s.set_catalog(CityCatalog::from_json_str(CITIES).expect("parse"));
        s
    }

    fn run(s: &mut GlobeSession, frames: usize) {
        for _ in 0..frames {
            s.tick(1.0 / 60.0);
        }
    }

    #[test]
    fn click_center_selects_facing_city_and_notifies() {
        let mut s = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        s.subscribe(move |env| {
            if let GlobeEvent::SelectionChanged { city_id, city, .. } = &env.event {
                let tracks = city.as_ref().map(|c| c.playlist.len());
                sink.borrow_mut().push((city_id.clone(), tracks));
            }
        });

        // The default camera looks at lat 0, lng -90.
        assert!(s.click(Vec2::new(400.0, 300.0)));
        assert_eq!(*seen.borrow(), vec![(Some("eq".to_string()), Some(0))]);
        assert_eq!(s.selected_city().map(|c| c.id.clone()), Some("eq".to_string()));

        // Clicking empty space changes nothing.
        assert!(!s.click(Vec2::new(5.0, 5.0)));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn pointer_move_hovers_marker() {
        let mut s = session();
        let hovered = s.pointer_move(Vec2::new(400.0, 300.0));
        let eq = s.registry().by_city_id("eq").map(|m| m.id());
        assert_eq!(hovered, eq);
        assert_eq!(s.registry().by_city_id("eq").map(|m| m.state()), Some(MarkerState::Hovered));

        s.pointer_leave();
        assert_eq!(s.registry().by_city_id("eq").map(|m| m.state()), Some(MarkerState::Idle));
        assert_eq!(s.drain_events().len(), 2);
    }

    #[test]
    fn selection_flight_completes_through_ticks() {
        let mut s = session();
        assert!(s.select_city(Some("nyc")));
        run(&mut s, 30);
        assert!(s.select_city(Some("lon")));
        run(&mut s, 61);

        assert_eq!(s.camera().position, to_sphere(51.5074, -0.1278, 600.0));
        assert!(!s.director().is_animating());
        let selected: Vec<_> = s
            .drain_events()
            .into_iter()
            .filter_map(|e| e.event.selected_city_id().map(|id| id.map(str::to_string)))
            .collect();
        assert_eq!(selected, vec![Some("nyc".to_string()), Some("lon".to_string())]);
    }

    #[test]
    fn selected_marker_pulses_on_tick() {
        let mut s = session();
        s.select_city(Some("nyc"));
        run(&mut s, 10);
        let marker = s.registry().by_city_id("nyc").expect("marker");
        assert!(marker.pulse().scale() > 1.0);
    }

    #[test]
    fn labels_appear_once_zoomed_in() {
        let mut s = session();
        let far = s.tick(0.016);
        assert_eq!(far.len(), 3);
        assert!(far.iter().all(|l| !l.visible));

        s.set_camera_distance(300.0);
        let near = s.tick(0.016);
        let shown: Vec<_> = near.iter().filter(|l| l.visible).map(|l| l.city_id.as_str()).collect();
        // London sits past the horizon from this viewpoint.
        assert_eq!(shown, vec!["nyc", "eq"]);
    }

    #[test]
    fn replacing_cities_clears_selection() {
        let mut s = session();
        s.select_city(Some("lon"));
        s.pointer_move(Vec2::new(400.0, 300.0));
        s.drain_events();

        s.set_catalog(CityCatalog::from_json_str(CITIES).expect("parse"));
        let events = s.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event.selected_city_id(), Some(None));
        assert!(matches!(
            &events[1].event,
            GlobeEvent::HoverChanged { city_id: None, .. }
        ));
        assert!(s.selection().selected().is_none());
        assert!(s.selection().hovered().is_none());
        assert_eq!(s.registry().len(), 3);
    }

    #[test]
    fn initial_location_frames_nearest_without_selecting() {
        let mut s = session();
        assert_eq!(s.go_to_initial_location().as_deref(), Some("nyc"));
        run(&mut s, 70);
        assert_eq!(s.camera().position, to_sphere(40.7128, -74.006, 600.0));
        assert!(s.selection().selected().is_none());
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn empty_data_is_inert() {
        let mut s = GlobeSession::new(GlobeConfig::default(), Viewport::default());
        assert!(!s.click(Vec2::new(400.0, 300.0)));
        assert!(s.pointer_move(Vec2::new(400.0, 300.0)).is_none());
        assert!(!s.select_city(Some("nyc")));
        assert!(s.go_to_initial_location().is_none());
        assert!(s.tick(0.016).is_empty());
        assert!(s.drain_events().is_empty());
    }
}
