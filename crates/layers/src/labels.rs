use scene::{LabelPlacement, MarkerRegistry};
use serde::Serialize;

use crate::layer::{Layer, LayerId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelStyle {
    pub font_size_px: f32,
    pub color: [f32; 4],
    pub halo_color: [f32; 4],
    pub halo_width_px: f32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size_px: 12.0,
            color: [1.0, 1.0, 1.0, 1.0],
            halo_color: [0.0, 0.0, 0.0, 0.7],
            halo_width_px: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelsConfig {
    pub style: LabelStyle,
    /// Labels sit this far above their marker.
    pub offset_px: f64,
    pub max_text_len: usize,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            style: LabelStyle::default(),
            offset_px: 15.0,
            max_text_len: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLabel {
    pub city_id: String,
    pub text: String,
    pub screen_pos_px: [f64; 2],
    pub style: LabelStyle,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct LabelsLayerSnapshot {
    pub labels: Vec<PlacedLabel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelsLayer {
    id: LayerId,
    pub config: LabelsConfig,
}

impl LabelsLayer {
    pub fn new(id: u64, config: LabelsConfig) -> Self {
        Self {
            id: LayerId(id),
            config,
        }
    }

    /// Text and screen anchor for every visible placement. The city name is
    /// the label text; markers whose city is gone or unnamed are skipped.
    pub fn extract(
        &self,
        placements: &[LabelPlacement],
        registry: &MarkerRegistry,
    ) -> LabelsLayerSnapshot {
        let mut out = Vec::new();
        for placement in placements.iter().filter(|p| p.visible) {
            let Some(city) = registry.city(placement.marker) else {
                continue;
            };
            let text = city.name.trim();
            if text.is_empty() || text.len() > self.config.max_text_len {
                continue;
            }
            if !(placement.screen_x.is_finite() && placement.screen_y.is_finite()) {
                continue;
            }
            out.push(PlacedLabel {
                city_id: placement.city_id.clone(),
                text: text.to_string(),
                screen_pos_px: [
                    placement.screen_x,
                    placement.screen_y - self.config.offset_px,
                ],
                style: self.config.style.clone(),
            });
        }
        LabelsLayerSnapshot { labels: out }
    }
}

impl Layer for LabelsLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "labels"
    }
}
