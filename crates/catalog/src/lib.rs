//! City and playlist data for the globe.
//!
//! Cities are loaded once, never mutated, and handed out as `Rc<City>` so
//! scene markers can hold weak lookups into the catalog.

pub mod city;
pub mod parse;

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use foundation::math::{LatLng, distance_km};
use tracing::info;

pub use city::*;
pub use parse::parse_cities;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(msg) => write!(f, "city data unavailable: {msg}"),
            CatalogError::Parse(msg) => write!(f, "city data malformed: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Ordered, id-indexed collection of cities.
///
/// Ordering contract:
/// - Iteration, `search` and `nearest` tie-breaks follow load order.
#[derive(Debug, Default, Clone)]
pub struct CityCatalog {
    cities: Vec<Rc<City>>,
    by_id: BTreeMap<String, usize>,
}

impl CityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later duplicates of an id are dropped.
    pub fn from_cities(cities: impl IntoIterator<Item = City>) -> Self {
        let mut catalog = Self::default();
        for city in cities {
            if catalog.by_id.contains_key(&city.id) {
                continue;
            }
            catalog.by_id.insert(city.id.clone(), catalog.cities.len());
            catalog.cities.push(Rc::new(city));
        }
        catalog
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(Self::from_cities(parse_cities(json)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
        let catalog = Self::from_json_str(&payload)?;
        info!(path = %path.display(), cities = catalog.len(), "loaded city catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn cities(&self) -> &[Rc<City>] {
        &self.cities
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<City>> + '_ {
        self.cities.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Rc<City>> {
        self.by_id.get(id).map(|&idx| &self.cities[idx])
    }

    /// Cities whose name, country or region contains `query`, ignoring case.
    /// A blank query returns every city.
    pub fn search(&self, query: &str) -> Vec<&Rc<City>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.cities.iter().collect();
        }
        self.cities
            .iter()
            .filter(|c| c.matches_lowercase(&needle))
            .collect()
    }

    /// The city with the smallest great-circle distance to `to`.
    pub fn nearest(&self, to: LatLng) -> Option<(&Rc<City>, f64)> {
        let mut best: Option<(&Rc<City>, f64)> = None;
        for city in &self.cities {
            let d = distance_km(to, city.lat_lng());
            if d.is_finite() && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((city, d));
            }
        }
        best
    }
}
