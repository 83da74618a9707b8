use runtime::{EventBus, Frame};
use tracing::debug;

use crate::director::CameraDirector;
use crate::entity::MarkerId;
use crate::events::{GlobeEvent, VisualChange};
use crate::markers::{MarkerRegistry, MarkerState};

/// Components a selection transition updates, borrowed for one call.
pub struct SelectionTargets<'a> {
    pub registry: &'a mut MarkerRegistry,
    pub director: &'a mut CameraDirector,
    pub bus: &'a mut EventBus<GlobeEvent>,
    pub frame: Frame,
}

impl SelectionTargets<'_> {
    fn restyle(&mut self, marker: MarkerId, state: MarkerState, out: &mut Vec<VisualChange>) {
        if !self.registry.set_state(marker, state) {
            return;
        }
        if let Some(m) = self.registry.get(marker) {
            out.push(VisualChange {
                marker,
                city_id: m.city_id().to_string(),
                state,
            });
        }
    }

    fn city_id(&self, marker: Option<MarkerId>) -> Option<String> {
        marker
            .and_then(|id| self.registry.get(id))
            .map(|m| m.city_id().to_string())
    }
}

/// The hovered and selected markers.
///
/// Invariants:
/// - At most one marker is selected, and only it is in `MarkerState::Selected`.
/// - A hovered marker that is also selected keeps the `Selected` visual.
/// - Every effective transition emits exactly one `GlobeEvent`, after the
///   marker visuals and camera have been updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    hovered: Option<MarkerId>,
    selected: Option<MarkerId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<MarkerId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<MarkerId> {
        self.selected
    }

    /// Returns `true` if the hovered marker changed. Unknown markers are ignored.
    pub fn set_hovered(&mut self, marker: Option<MarkerId>, cx: &mut SelectionTargets<'_>) -> bool {
        if marker.is_some_and(|id| cx.registry.get(id).is_none()) {
            return false;
        }
        if marker == self.hovered {
            return false;
        }

        let mut visuals = Vec::new();
        let previous = std::mem::replace(&mut self.hovered, marker);
        if let Some(prev) = previous.filter(|&p| Some(p) != self.selected) {
            cx.restyle(prev, MarkerState::Idle, &mut visuals);
        }
        if let Some(next) = marker.filter(|&m| Some(m) != self.selected) {
            cx.restyle(next, MarkerState::Hovered, &mut visuals);
        }

        let city_id = cx.city_id(marker);
        debug!(city = ?city_id, "hover changed");
        cx.bus
            .emit(cx.frame, GlobeEvent::HoverChanged { city_id, visuals });
        true
    }

    /// Selects the city's marker and flies the camera to it, or deselects
    /// with `None`. Returns `true` if the selection changed.
    ///
    /// Selecting the current city again re-frames the camera without a
    /// notification. Unknown ids leave everything untouched.
    pub fn select(&mut self, city_id: Option<&str>, cx: &mut SelectionTargets<'_>) -> bool {
        let next = match city_id {
            None => None,
            Some(id) => match cx.registry.by_city_id(id) {
                Some(m) => Some((m.id(), m.geo())),
                None => {
                    debug!(city = id, "select ignored: unknown city");
                    return false;
                }
            },
        };

        match (next, self.selected) {
            (Some((marker, geo)), Some(current)) if marker == current => {
                cx.director.fly_to(geo.lat, geo.lng);
                return false;
            }
            (None, None) => return false,
            _ => {}
        }

        let mut visuals = Vec::new();
        if let Some(prev) = self.selected.take() {
            let fallback = if self.hovered == Some(prev) {
                MarkerState::Hovered
            } else {
                MarkerState::Idle
            };
            cx.restyle(prev, fallback, &mut visuals);
        }

        let event = match next {
            Some((marker, geo)) => {
                self.selected = Some(marker);
                cx.restyle(marker, MarkerState::Selected, &mut visuals);
                cx.director.fly_to(geo.lat, geo.lng);
                GlobeEvent::SelectionChanged {
                    city_id: cx.city_id(Some(marker)),
                    city: cx.registry.city(marker),
                    visuals,
                }
            }
            None => GlobeEvent::SelectionChanged {
                city_id: None,
                city: None,
                visuals,
            },
        };
        debug!(city = ?city_id, "selection changed");
        cx.bus.emit(cx.frame, event);
        true
    }

    /// Deselects, then clears the hover, emitting a notification for each
    /// that was set.
    pub fn clear(&mut self, cx: &mut SelectionTargets<'_>) {
        self.select(None, cx);
        self.set_hovered(None, cx);
    }
}

#[cfg(test)]
mod tests {
    use super::{SelectionState, SelectionTargets};
    use crate::camera::Camera;
    use crate::config::GlobeGeometry;
    use crate::director::CameraDirector;
    use crate::events::GlobeEvent;
    use crate::markers::{MarkerRegistry, MarkerState};
    use catalog::City;
    use foundation::math::to_sphere;
    use runtime::{EventBus, Frame};
    use std::rc::Rc;

    struct Fixture {
        _cities: Vec<Rc<City>>,
        registry: MarkerRegistry,
        director: CameraDirector,
        bus: EventBus<GlobeEvent>,
        selection: SelectionState,
    }

    impl Fixture {
        fn new() -> Self {
            let cities: Vec<Rc<City>> = [
                ("nyc", 40.7128, -74.006),
                ("lon", 51.5074, -0.1278),
                ("rio", -22.9068, -43.1729),
            ]
            .into_iter()
            .map(|(id, lat, lng)| {
                Rc::new(City {
                    id: id.to_string(),
                    name: id.to_string(),
                    lat,
                    lng,
                    country: String::new(),
                    region: None,
                    description: None,
                    playlist: Vec::new(),
                })
            })
            .collect();
            let geometry = GlobeGeometry::default();
            let mut registry = MarkerRegistry::new(geometry);
            registry.set_cities(&cities);
            Self {
                _cities: cities,
                registry,
                director: CameraDirector::new(Camera::from_geometry(&geometry), 600.0, 1000.0),
                bus: EventBus::new(),
                selection: SelectionState::new(),
            }
        }

        fn cx(&mut self) -> (&mut SelectionState, SelectionTargets<'_>) {
            (
                &mut self.selection,
                SelectionTargets {
                    registry: &mut self.registry,
                    director: &mut self.director,
                    bus: &mut self.bus,
                    frame: Frame::first(),
                },
            )
        }

        fn select(&mut self, id: Option<&str>) -> bool {
            let (sel, mut cx) = self.cx();
            sel.select(id, &mut cx)
        }

        fn hover(&mut self, id: Option<&str>) -> bool {
            let marker = id.and_then(|id| self.registry.by_city_id(id)).map(|m| m.id());
            let (sel, mut cx) = self.cx();
            sel.set_hovered(marker, &mut cx)
        }

        fn state(&self, id: &str) -> MarkerState {
            self.registry.by_city_id(id).map(|m| m.state()).unwrap_or_default()
        }

        fn selected_ids(&mut self) -> Vec<Option<String>> {
            self.bus
                .drain()
                .into_iter()
                .filter_map(|e| match e.event {
                    GlobeEvent::SelectionChanged { city_id, .. } => Some(city_id),
                    GlobeEvent::HoverChanged { .. } => None,
                })
                .collect()
        }

        fn selected_count(&self) -> usize {
            self.registry
                .markers()
                .iter()
                .filter(|m| m.state() == MarkerState::Selected)
                .count()
        }
    }

    #[test]
    fn switching_cities_mid_flight() {
        let mut f = Fixture::new();
        assert!(f.select(Some("nyc")));
        f.director.tick(400.0);
        assert!(f.select(Some("lon")));
        for _ in 0..10 {
            f.director.tick(120.0);
        }

        assert_eq!(f.director.camera().position, to_sphere(51.5074, -0.1278, 600.0));
        assert_eq!(f.state("nyc"), MarkerState::Idle);
        assert_eq!(f.state("lon"), MarkerState::Selected);
        assert_eq!(
            f.selected_ids(),
            vec![Some("nyc".to_string()), Some("lon".to_string())]
        );
    }

    #[test]
    fn deselect_reverts_without_moving_camera() {
        let mut f = Fixture::new();
        f.select(Some("rio"));
        f.director.tick(1000.0);
        f.bus.drain();
        let parked = f.director.camera().position;

        assert!(f.select(None));
        assert_eq!(f.state("rio"), MarkerState::Idle);
        assert!(!f.director.is_animating());
        assert_eq!(f.director.camera().position, parked);
        assert_eq!(f.selected_ids(), vec![None]);
        assert!(!f.select(None));
        assert!(f.selected_ids().is_empty());
    }

    #[test]
    fn reselect_emits_nothing_but_reframes() {
        let mut f = Fixture::new();
        f.select(Some("nyc"));
        f.director.tick(1000.0);
        f.director.camera_mut().position = to_sphere(0.0, 0.0, 650.0);
        f.bus.drain();

        assert!(!f.select(Some("nyc")));
        assert!(f.bus.is_empty());
        assert!(f.director.is_animating());
        assert_eq!(f.state("nyc"), MarkerState::Selected);
    }

    #[test]
    fn unknown_city_is_a_no_op() {
        let mut f = Fixture::new();
        f.select(Some("lon"));
        f.bus.drain();
        assert!(!f.select(Some("atlantis")));
        assert!(f.bus.is_empty());
        assert_eq!(f.state("lon"), MarkerState::Selected);
        assert_eq!(f.selection.selected(), f.registry.by_city_id("lon").map(|m| m.id()));
    }

    #[test]
    fn at_most_one_marker_selected() {
        let mut f = Fixture::new();
        for id in ["nyc", "lon", "rio", "lon", "nyc"] {
            f.select(Some(id));
            assert_eq!(f.selected_count(), 1);
        }
        f.select(None);
        assert_eq!(f.selected_count(), 0);
    }

    #[test]
    fn hover_and_selection_interplay() {
        let mut f = Fixture::new();
        assert!(f.hover(Some("nyc")));
        assert_eq!(f.state("nyc"), MarkerState::Hovered);
        assert!(!f.hover(Some("nyc")));

        // Selecting a hovered marker keeps the hover reference.
        f.select(Some("nyc"));
        assert_eq!(f.state("nyc"), MarkerState::Selected);
        assert!(f.selection.hovered().is_some());

        // Moving the pointer off a selected marker leaves it selected.
        f.hover(Some("lon"));
        assert_eq!(f.state("nyc"), MarkerState::Selected);
        assert_eq!(f.state("lon"), MarkerState::Hovered);

        // Deselecting a still-hovered marker falls back to Hovered.
        f.hover(Some("nyc"));
        assert_eq!(f.state("lon"), MarkerState::Idle);
        f.select(None);
        assert_eq!(f.state("nyc"), MarkerState::Hovered);

        f.hover(None);
        assert_eq!(f.state("nyc"), MarkerState::Idle);
    }

    #[test]
    fn one_event_per_transition_with_visuals() {
        let mut f = Fixture::new();
        f.hover(Some("nyc"));
        f.select(Some("lon"));
        f.select(Some("nyc"));

        let events = f.bus.drain();
        assert_eq!(events.len(), 3);
        let last = &events[2].event;
        let changes: Vec<_> = last
            .visuals()
            .iter()
            .map(|v| (v.city_id.as_str(), v.state))
            .collect();
        assert_eq!(
            changes,
            vec![("lon", MarkerState::Idle), ("nyc", MarkerState::Selected)]
        );
        match last {
            GlobeEvent::SelectionChanged { city, .. } => {
                assert_eq!(city.as_ref().map(|c| c.id.as_str()), Some("nyc"));
            }
            GlobeEvent::HoverChanged { .. } => panic!("expected selection event"),
        }
    }

    #[test]
    fn clear_emits_deselect_then_hover() {
        let mut f = Fixture::new();
        f.hover(Some("rio"));
        f.select(Some("lon"));
        f.bus.drain();

        let (sel, mut cx) = f.cx();
        sel.clear(&mut cx);
        let events = f.bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event.selected_city_id(), Some(None));
        assert!(matches!(
            events[1].event,
            GlobeEvent::HoverChanged { city_id: None, .. }
        ));
        assert_eq!(f.selected_count(), 0);
        assert_eq!(f.state("rio"), MarkerState::Idle);
    }
}
