use foundation::math::LatLng;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_DECADE: &str = "Unknown";
pub const MISSING_URL: &str = "#";

/// A playable track. Position in `City::playlist` is the playback order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Era tag such as `"80s"`, or `"Unknown"`.
    pub decade: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub playlist: Vec<Track>,
}

impl City {
    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Case-insensitive substring match on name, country and region.
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.country.to_lowercase().contains(needle)
            || self
                .region
                .as_deref()
                .is_some_and(|r| r.to_lowercase().contains(needle))
    }
}

/// Era tag for a release year: 1987 → `"80s"`, 2004 → `"00s"`.
///
/// A missing or zero year yields `"Unknown"`.
pub fn decade_for_year(year: Option<i32>) -> String {
    match year {
        None | Some(0) => UNKNOWN_DECADE.to_string(),
        Some(y) => format!("{:02}s", y.rem_euclid(100) / 10 * 10),
    }
}

/// Fallback id derived from a city name: `"Rio de Janeiro"` → `"city-rio-de-janeiro"`.
pub fn id_for_name(name: &str) -> String {
    let slug: Vec<String> = name
        .split_whitespace()
        .map(|part| part.to_lowercase())
        .collect();
    format!("city-{}", slug.join("-"))
}
