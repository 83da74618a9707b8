use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{Vec2, Vec3};

use crate::camera::{Camera, Viewport};
use crate::config::PickingConfig;
use crate::entity::MarkerId;
use crate::markers::MarkerRegistry;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub marker: MarkerId,
    /// Ray parameter of the bounding-sphere entry point.
    pub t: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
    /// Reject markers that sit behind the globe along the ray.
    pub occlude_by_globe: bool,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
            occlude_by_globe: false,
        }
    }
}

impl From<&PickingConfig> for PickOptions {
    fn from(config: &PickingConfig) -> Self {
        Self {
            occlude_by_globe: config.occlude_by_globe,
            ..Self::default()
        }
    }
}

/// Deterministic ray picking against marker bounding spheres.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - If multiple markers are hit at the same distance, the earlier inserted
///   marker wins.
///
/// Notes:
/// - Every marker uses the registry's `marker_size` as its bounding radius.
/// - With `occlude_by_globe`, a hit more than one marker diameter past the
///   globe entry point is discarded.
pub fn pick_ray(registry: &MarkerRegistry, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let dir = ray.dir.normalize()?;
    if !ray.origin.is_finite() {
        return None;
    }
    let ray = Ray::new(ray.origin, dir);
    let marker_size = registry.marker_size();

    let horizon_t = if opts.occlude_by_globe {
        ray_sphere_t(ray, Vec3::ZERO, registry.globe_radius())
            .map(|t| t + 2.0 * marker_size)
    } else {
        None
    };

    let mut best: Option<(f64, usize, MarkerId)> = None;
    for (idx, marker) in registry.markers().iter().enumerate() {
        let Some(t) = ray_sphere_t(ray, marker.position(), marker_size) else {
            continue;
        };
        if t > opts.max_distance || horizon_t.is_some_and(|h| t > h) {
            continue;
        }

        best = match best {
            None => Some((t, idx, marker.id())),
            Some((bt, bi, bm)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| idx.cmp(&bi));
                if ord.is_lt() {
                    Some((t, idx, marker.id()))
                } else {
                    Some((bt, bi, bm))
                }
            }
        };
    }

    let (t, _, marker) = best?;
    Some(PickHit {
        marker,
        t,
        point: ray.at(t),
    })
}

/// Screen picking: casts the camera ray through `ndc`.
pub fn pick(
    registry: &MarkerRegistry,
    camera: &Camera,
    viewport: &Viewport,
    ndc: Vec2,
    opts: PickOptions,
) -> Option<PickHit> {
    if registry.is_empty() || !(ndc.x.is_finite() && ndc.y.is_finite()) {
        return None;
    }
    let ray = camera.ray_through_ndc(ndc, viewport)?;
    pick_ray(registry, ray, opts)
}

/// Smallest non-negative ray parameter at which `ray` meets the sphere.
///
/// `ray.dir` must be normalized. An origin inside the sphere yields the exit
/// point.
pub fn ray_sphere_t(ray: Ray, center: Vec3, radius: f64) -> Option<f64> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if !(disc >= 0.0) {
        return None;
    }
    let sq = disc.sqrt();
    let (t0, t1) = (-b - sq, -b + sq);
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{PickOptions, Ray, pick, pick_ray, ray_sphere_t};
    use crate::camera::{Camera, Viewport};
    use crate::config::GlobeGeometry;
    use crate::markers::MarkerRegistry;
    use catalog::City;
    use foundation::math::{Vec2, Vec3};
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

    fn registry(cities: &[Rc<City>]) -> MarkerRegistry {
        let mut reg = MarkerRegistry::new(GlobeGeometry::default());
        reg.set_cities(cities);
        reg
    }

    #[test]
    fn ray_sphere_entry_and_miss() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(ray_sphere_t(ray, Vec3::ZERO, 2.0), Some(8.0));
        assert_eq!(ray_sphere_t(ray, Vec3::new(5.0, 0.0, 0.0), 2.0), None);

        let inside = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(ray_sphere_t(inside, Vec3::ZERO, 2.0), Some(2.0));

        let away = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(ray_sphere_t(away, Vec3::ZERO, 2.0), None);
    }

    #[test]
    fn center_click_picks_facing_marker() {
        let cities = vec![city("front", 0.0, -90.0), city("side", 0.0, 0.0)];
        let reg = registry(&cities);
        let cam = Camera::from_geometry(&GlobeGeometry::default());

        let hit = pick(
            &reg,
            &cam,
            &Viewport::default(),
            Vec2::new(0.0, 0.0),
            PickOptions::default(),
        )
        .expect("hit");
        assert_eq!(reg.get(hit.marker).map(|m| m.city_id()), Some("front"));
        assert!(hit.t > 390.0 && hit.t < 400.0);
    }

    #[test]
    fn picks_nearest_along_ray() {
        // Both markers lie on the +Z axis ray from the camera; the front one is nearer.
        let cities = vec![city("back", 0.0, 90.0), city("front", 0.0, -90.0)];
        let reg = registry(&cities);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 600.0), Vec3::new(0.0, 0.0, -2.0));

        let hit = pick_ray(&reg, ray, PickOptions::default()).expect("hit");
        assert_eq!(reg.get(hit.marker).map(|m| m.city_id()), Some("front"));
    }

    #[test]
    fn tie_breaks_by_insertion_order() {
        let cities = vec![city("first", 10.0, 10.0), city("second", 10.0, 10.0)];
        let reg = registry(&cities);
        let target = reg.markers()[0].position();
        let origin = target * 3.0;
        let ray = Ray::new(origin, target - origin);

        let hit = pick_ray(&reg, ray, PickOptions::default()).expect("hit");
        assert_eq!(hit.marker, reg.markers()[0].id());
    }

    #[test]
    fn far_side_marker_is_picked_unless_globe_occludes() {
        let cities = vec![city("back", 0.0, 90.0)];
        let reg = registry(&cities);
        let cam = Camera::from_geometry(&GlobeGeometry::default());
        let center = Vec2::new(0.0, 0.0);

        let hit = pick(&reg, &cam, &Viewport::default(), center, PickOptions::default())
            .expect("sole intersected marker");
        assert_eq!(reg.get(hit.marker).map(|m| m.city_id()), Some("back"));

        let occluding = PickOptions {
            occlude_by_globe: true,
            ..PickOptions::default()
        };
        assert!(pick(&reg, &cam, &Viewport::default(), center, occluding).is_none());
    }

    #[test]
    fn degenerate_inputs_pick_nothing() {
        let cities = vec![city("front", 0.0, -90.0)];
        let reg = registry(&cities);
        let zero_dir = Ray::new(Vec3::new(0.0, 0.0, 600.0), Vec3::ZERO);
        assert!(pick_ray(&reg, zero_dir, PickOptions::default()).is_none());

        let cam = Camera::from_geometry(&GlobeGeometry::default());
        let nan = Vec2::new(f64::NAN, 0.0);
        assert!(pick(&reg, &cam, &Viewport::default(), nan, PickOptions::default()).is_none());

        let empty = MarkerRegistry::new(GlobeGeometry::default());
        let center = Vec2::new(0.0, 0.0);
        assert!(pick(&empty, &cam, &Viewport::default(), center, PickOptions::default()).is_none());
    }

    #[test]
    fn max_distance_limits_hits() {
        let cities = vec![city("front", 0.0, -90.0)];
        let reg = registry(&cities);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 600.0), Vec3::new(0.0, 0.0, -1.0));
        let opts = PickOptions {
            max_distance: 100.0,
            ..PickOptions::default()
        };
        assert!(pick_ray(&reg, ray, opts).is_none());
    }
}
