//! Per-frame label decluttering.

use foundation::math::stable_total_cmp_f64;
use serde::Serialize;

use crate::camera::{Camera, Viewport};
use crate::config::LabelConfig;
use crate::entity::MarkerId;
use crate::markers::MarkerRegistry;

/// Screen placement of one marker's label for the current frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelPlacement {
    pub city_id: String,
    #[serde(skip)]
    pub marker: MarkerId,
    pub screen_x: f64,
    pub screen_y: f64,
    pub depth: f64,
    pub visible: bool,
}

/// Whether the camera is close enough for any label to show.
pub fn labels_in_range(camera: &Camera, labels: &LabelConfig, camera_max_distance: f64) -> bool {
    if !(camera_max_distance > 0.0) {
        return false;
    }
    camera.distance_to_origin() / camera_max_distance < labels.distance_threshold
}

/// Lays out one label per marker, in marker insertion order.
///
/// Candidates are markers facing the camera and in front of it, and only
/// while the camera is within `distance_threshold * camera_max_distance` of
/// the globe center. The `max_labels` candidates nearest the camera are
/// visible; equal distances keep insertion order.
pub fn layout_labels(
    registry: &MarkerRegistry,
    camera: &Camera,
    viewport: &Viewport,
    labels: &LabelConfig,
) -> Vec<LabelPlacement> {
    let in_range = labels_in_range(camera, labels, registry.geometry().camera_max_distance);

    let mut out = Vec::with_capacity(registry.len());
    let mut candidates: Vec<(usize, f64)> = Vec::new();
    for (idx, marker) in registry.markers().iter().enumerate() {
        let projection = camera.project(marker.position(), viewport);
        let (screen_x, screen_y, depth) = projection
            .map(|p| (p.screen_x, p.screen_y, p.depth))
            .unwrap_or((f64::NAN, f64::NAN, f64::NAN));

        if in_range && projection.is_some() && !marker.is_occluded_from(camera.position) {
            candidates.push((idx, marker.position().distance(camera.position)));
        }
        out.push(LabelPlacement {
            city_id: marker.city_id().to_string(),
            marker: marker.id(),
            screen_x,
            screen_y,
            depth,
            visible: false,
        });
    }

    candidates.sort_by(|a, b| stable_total_cmp_f64(a.1, b.1).then_with(|| a.0.cmp(&b.0)));
    for &(idx, _) in candidates.iter().take(labels.max_labels) {
        out[idx].visible = true;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::layout_labels;
    use crate::camera::{Camera, Viewport};
    use crate::config::{GlobeGeometry, LabelConfig};
    use crate::markers::MarkerRegistry;
    use catalog::City;
    use foundation::math::Vec3;
    use std::rc::Rc;

    fn city(id: &str, lat: f64, lng: f64) -> Rc<City> {
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
    }

    fn close_camera() -> Camera {
        // 0.5 of the max distance, looking at (lat 0, lng -90).
        let mut cam = Camera::from_geometry(&GlobeGeometry::default());
        cam.position = Vec3::new(0.0, 0.0, 350.0);
        cam
    }

    fn visible_ids(placements: &[super::LabelPlacement]) -> Vec<&str> {
        placements
            .iter()
            .filter(|p| p.visible)
            .map(|p| p.city_id.as_str())
            .collect()
    }

    #[test]
    fn reveals_nearest_candidates_up_to_the_limit() {
        let cities: Vec<_> = (0..6)
            .map(|i| city(&format!("c{i}"), 0.0, -90.0 + (i as f64) * 8.0))
            .collect();
        let mut reg = MarkerRegistry::new(GlobeGeometry::default());
        reg.set_cities(&cities);

        let config = LabelConfig {
            max_labels: 3,
            ..LabelConfig::default()
        };
        let placements = layout_labels(&reg, &close_camera(), &Viewport::default(), &config);

        assert_eq!(placements.len(), 6);
        let order: Vec<_> = placements.iter().map(|p| p.city_id.as_str()).collect();
        assert_eq!(order, vec!["c0", "c1", "c2", "c3", "c4", "c5"]);
        assert_eq!(visible_ids(&placements), vec!["c0", "c1", "c2"]);
    }

    #[test]
    fn equal_distances_keep_insertion_order() {
        let cities = vec![
            city("far", 0.0, -60.0),
            city("first", 0.0, -80.0),
            city("second", 0.0, -80.0),
        ];
        let mut reg = MarkerRegistry::new(GlobeGeometry::default());
        reg.set_cities(&cities);

        let config = LabelConfig {
            max_labels: 1,
            ..LabelConfig::default()
        };
        let placements = layout_labels(&reg, &close_camera(), &Viewport::default(), &config);
        assert_eq!(visible_ids(&placements), vec!["first"]);
    }

    #[test]
    fn occluded_markers_never_show() {
        let cities = vec![city("front", 0.0, -90.0), city("back", 0.0, 90.0)];
        let mut reg = MarkerRegistry::new(GlobeGeometry::default());
        reg.set_cities(&cities);

        let placements = layout_labels(
            &reg,
            &close_camera(),
            &Viewport::default(),
            &LabelConfig::default(),
        );
        assert_eq!(visible_ids(&placements), vec!["front"]);
    }

    #[test]
    fn far_camera_hides_everything() {
        let cities = vec![city("front", 0.0, -90.0)];
        let mut reg = MarkerRegistry::new(GlobeGeometry::default());
        reg.set_cities(&cities);

        // 600 / 700 > 0.7
        let cam = Camera::from_geometry(&GlobeGeometry::default());
        let placements = layout_labels(&reg, &cam, &Viewport::default(), &LabelConfig::default());
        assert_eq!(placements.len(), 1);
        assert!(!placements[0].visible);
        assert!(placements[0].screen_x.is_finite());
    }

    #[test]
    fn visible_count_is_bounded() {
        let cities: Vec<_> = (0..40)
            .map(|i| city(&format!("c{i}"), (i % 7) as f64 * 3.0, -90.0 + (i / 7) as f64 * 3.0))
            .collect();
        let mut reg = MarkerRegistry::new(GlobeGeometry::default());
        reg.set_cities(&cities);

        for max_labels in [0, 1, 15, 100] {
            let config = LabelConfig {
                max_labels,
                ..LabelConfig::default()
            };
            let placements = layout_labels(&reg, &close_camera(), &Viewport::default(), &config);
            let shown = placements.iter().filter(|p| p.visible).count();
            assert_eq!(shown, max_labels.min(cities.len()));
        }
    }

    #[test]
    fn empty_registry_lays_out_nothing() {
        let reg = MarkerRegistry::new(GlobeGeometry::default());
        let placements = layout_labels(
            &reg,
            &close_camera(),
            &Viewport::default(),
            &LabelConfig::default(),
        );
        assert!(placements.is_empty());
    }
}
