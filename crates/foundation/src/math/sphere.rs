//! Latitude/longitude on a sphere centered at the origin.
//!
//! Axis convention (Y up):
//! - `lat = 90` maps to `+Y`, `lat = -90` to `-Y`.
//! - `lng = -180` lies on `-X`, `lng = 0` on `+X`, `lng = 90` on `-Z`.

use super::Vec3;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Builds a normalized coordinate: latitude clamped to `[-90, 90]`,
    /// longitude wrapped into `[-180, 180)`, non-finite components set to 0.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: clamp_lat(lat),
            lng: wrap_lng(lng),
        }
    }

    /// Whether the raw inputs survive `LatLng::new` unchanged.
    pub fn is_normalized(lat: f64, lng: f64) -> bool {
        let n = Self::new(lat, lng);
        n.lat == lat && n.lng == lng
    }
}

pub fn clamp_lat(lat: f64) -> f64 {
    if !lat.is_finite() {
        return 0.0;
    }
    lat.clamp(-90.0, 90.0)
}

pub fn wrap_lng(lng: f64) -> f64 {
    if !lng.is_finite() {
        return 0.0;
    }
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Position on the sphere surface of the given radius.
pub fn to_sphere(lat: f64, lng: f64, radius: f64) -> Vec3 {
    let geo = LatLng::new(lat, lng);
    let phi = (90.0 - geo.lat).to_radians();
    let theta = (geo.lng + 180.0).to_radians();

    Vec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Inverse of [`to_sphere`]; independent of the radius.
///
/// On the polar axis the longitude is undefined and reported as whatever
/// `atan2` yields for the residual, wrapped into range.
pub fn to_lat_lng(p: Vec3) -> LatLng {
    if !p.is_finite() || p == Vec3::ZERO {
        return LatLng::default();
    }
    let horizontal = (p.x * p.x + p.z * p.z).sqrt();
    let lat = p.y.atan2(horizontal).to_degrees();
    let lng = p.z.atan2(-p.x).to_degrees() - 180.0;
    LatLng::new(lat, lng)
}

/// Outward unit normal of the sphere at `p`, or `None` at the center.
pub fn surface_normal(p: Vec3) -> Option<Vec3> {
    p.normalize()
}
