//! Lenient decoding of the cities JSON document.
//!
//! The document is an array of city objects. Missing or malformed fields are
//! defaulted rather than rejected; only a document that is not a JSON array
//! fails to parse.

use std::collections::BTreeSet;

use foundation::math::LatLng;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::CatalogError;
use crate::city::{
    City, MISSING_URL, Track, UNKNOWN_ARTIST, UNKNOWN_TITLE, decade_for_year, id_for_name,
};

#[derive(Debug, Default, Deserialize)]
struct RawCity {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    lat: Option<Value>,
    #[serde(default)]
    lng: Option<Value>,
    #[serde(default)]
    country: Option<Value>,
    #[serde(default)]
    region: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    playlist: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrack {
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    artist: Option<Value>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    decade: Option<Value>,
    #[serde(default)]
    url: Option<Value>,
}

pub fn parse_cities(json: &str) -> Result<Vec<City>, CatalogError> {
    let doc: Value = serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
    let Value::Array(items) = doc else {
        return Err(CatalogError::Parse(
            "expected a JSON array of cities".to_string(),
        ));
    };

    let mut seen_ids = BTreeSet::new();
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!(index = idx, "skipping non-object city entry");
            continue;
        }
        let raw: RawCity = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(index = idx, error = %e, "skipping undecodable city entry");
                continue;
            }
        };
        let city = city_from_raw(raw);
        if !seen_ids.insert(city.id.clone()) {
            warn!(id = %city.id, "skipping duplicate city id");
            continue;
        }
        out.push(city);
    }
    Ok(out)
}

fn city_from_raw(raw: RawCity) -> City {
    let name = non_empty_string(raw.name).unwrap_or_else(|| "Unknown City".to_string());
    let id = non_empty_string(raw.id).unwrap_or_else(|| id_for_name(&name));

    let lat = number(raw.lat.as_ref());
    let lng = number(raw.lng.as_ref());
    if lat.is_none() || lng.is_none() {
        warn!(id = %id, "city has missing coordinates; defaulting to 0");
    }
    let (lat, lng) = (lat.unwrap_or(0.0), lng.unwrap_or(0.0));
    if !LatLng::is_normalized(lat, lng) {
        warn!(id = %id, lat, lng, "city coordinates out of range; normalizing");
    }
    let geo = LatLng::new(lat, lng);

    let playlist = match raw.playlist {
        Some(Value::Array(tracks)) => tracks.into_iter().map(track_from_value).collect(),
        _ => Vec::new(),
    };

    City {
        id,
        name,
        lat: geo.lat,
        lng: geo.lng,
        country: non_empty_string(raw.country).unwrap_or_default(),
        region: non_empty_string(raw.region),
        description: non_empty_string(raw.description),
        playlist,
    }
}

fn track_from_value(value: Value) -> Track {
    let raw: RawTrack = serde_json::from_value(value).unwrap_or_default();
    let year = number(raw.year.as_ref())
        .map(f64::floor)
        .filter(|y| *y >= i32::MIN as f64 && *y <= i32::MAX as f64)
        .map(|y| y as i32)
        .filter(|y| *y != 0);
    let decade = non_empty_string(raw.decade).unwrap_or_else(|| decade_for_year(year));

    Track {
        title: non_empty_string(raw.title).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        artist: non_empty_string(raw.artist).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        year,
        decade,
        url: non_empty_string(raw.url).unwrap_or_else(|| MISSING_URL.to_string()),
    }
}

fn non_empty_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers and numeric strings; anything else is treated as missing.
fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}
