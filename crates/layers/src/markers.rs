use foundation::math::Vec3;
use scene::{MarkerId, MarkerRegistry};
use serde::Serialize;

use crate::layer::{Layer, LayerId};
use crate::symbology::{MarkerAppearance, MarkerPalette};

/// Halo radius relative to the marker radius, before pulsing.
pub const PULSE_RADIUS_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDraw {
    #[serde(skip)]
    pub marker: MarkerId,
    pub city_id: String,
    #[serde(skip)]
    pub position: Vec3,
    pub radius: f64,
    pub pulse_radius: f64,
    pub appearance: MarkerAppearance,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MarkersLayerSnapshot {
    pub markers: Vec<MarkerDraw>,
}

impl MarkersLayerSnapshot {
    pub fn get(&self, marker: MarkerId) -> Option<&MarkerDraw> {
        self.markers.iter().find(|m| m.marker == marker)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkersLayer {
    id: LayerId,
    pub palette: MarkerPalette,
}

impl MarkersLayer {
    pub fn new(id: u64, palette: MarkerPalette) -> Self {
        Self {
            id: LayerId(id),
            palette,
        }
    }

    /// One draw per marker, in registry order.
    pub fn extract(&self, registry: &MarkerRegistry) -> MarkersLayerSnapshot {
        let radius = registry.marker_size();
        let markers = registry
            .markers()
            .iter()
            .map(|m| {
                let appearance = self.palette.appearance(m.state(), m.pulse());
                MarkerDraw {
                    marker: m.id(),
                    city_id: m.city_id().to_string(),
                    position: m.position(),
                    radius,
                    pulse_radius: radius * PULSE_RADIUS_FACTOR * f64::from(appearance.pulse_scale),
                    appearance,
                }
            })
            .collect();
        MarkersLayerSnapshot { markers }
    }
}

impl Layer for MarkersLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "markers"
    }
}
