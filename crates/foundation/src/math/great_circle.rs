use super::LatLng;

/// Mean Earth radius (kilometers) used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometers.
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    // Rounding can push `h` just past 1 for near-antipodal points.
    let h = ((d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial bearing from `a` towards `b`, in degrees within `[0, 360)`.
pub fn bearing_deg(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Great-circle midpoint between `a` and `b`.
pub fn midpoint(a: LatLng, b: LatLng) -> LatLng {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let lng1 = a.lng.to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let bx = lat2.cos() * d_lng.cos();
    let by = lat2.cos() * d_lng.sin();

    let lat3 = (lat1.sin() + lat2.sin()).atan2(((lat1.cos() + bx).powi(2) + by * by).sqrt());
    let lng3 = lng1 + by.atan2(lat1.cos() + bx);

    LatLng::new(lat3.to_degrees(), lng3.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::{bearing_deg, distance_km, midpoint};
    use crate::math::LatLng;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn new_york_to_london() {
        let nyc = LatLng::new(40.7128, -74.006);
        let london = LatLng::new(51.5074, -0.1278);
        assert_close(distance_km(nyc, london), 5570.2, 1.0);
        assert_close(distance_km(london, nyc), distance_km(nyc, london), 1e-9);
    }

    #[test]
    fn zero_distance_to_self() {
        let p = LatLng::new(-33.8688, 151.2093);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn quarter_meridian() {
        let equator = LatLng::new(0.0, 0.0);
        let pole = LatLng::new(90.0, 0.0);
        let quarter = std::f64::consts::FRAC_PI_2 * super::EARTH_RADIUS_KM;
        assert_close(distance_km(equator, pole), quarter, 1e-6);
    }

    #[test]
    fn antipodal_distances_stay_finite() {
        let half = std::f64::consts::PI * super::EARTH_RADIUS_KM;
        for i in 0..=2000 {
            let lat = -90.0 + 180.0 * f64::from(i) / 2000.0;
            let d = distance_km(LatLng::new(lat, 0.0), LatLng::new(-lat, -180.0));
            assert!(d.is_finite(), "lat {lat} gave {d}");
            assert_close(d, half, 1e-3);
        }
        let d = distance_km(LatLng::new(-87.843, 0.0), LatLng::new(87.843, 180.0));
        assert_close(d, half, 1e-3);
    }

    #[test]
    fn bearings_on_cardinal_directions() {
        let origin = LatLng::new(0.0, 0.0);
        assert_close(bearing_deg(origin, LatLng::new(10.0, 0.0)), 0.0, 1e-9);
        assert_close(bearing_deg(origin, LatLng::new(0.0, 10.0)), 90.0, 1e-9);
        assert_close(bearing_deg(origin, LatLng::new(-10.0, 0.0)), 180.0, 1e-9);
        assert_close(bearing_deg(origin, LatLng::new(0.0, -10.0)), 270.0, 1e-9);
    }

    #[test]
    fn midpoint_on_equator() {
        let m = midpoint(LatLng::new(0.0, 10.0), LatLng::new(0.0, 30.0));
        assert_close(m.lat, 0.0, 1e-9);
        assert_close(m.lng, 20.0, 1e-9);
    }

    #[test]
    fn midpoint_crossing_antimeridian_is_wrapped() {
        let m = midpoint(LatLng::new(0.0, 170.0), LatLng::new(0.0, -170.0));
        assert_close(m.lat, 0.0, 1e-9);
        assert_close(m.lng.abs(), 180.0, 1e-9);
        assert!(m.lng < 180.0);
    }
}
