//! Marker visual state to appearance.

use scene::{MarkerState, Pulse};
use serde::Serialize;

pub const MARKER_COLOR: u32 = 0xcc3232;
pub const MARKER_HOVER_COLOR: u32 = 0xe7b416;
pub const MARKER_ACTIVE_COLOR: u32 = 0x2dc937;

pub fn rgba_from_hex(hex: u32, alpha: f32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), alpha]
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerPalette {
    pub idle: u32,
    pub hovered: u32,
    pub selected: u32,
    pub marker_opacity: f32,
    pub pulse_opacity: f32,
    pub emissive_intensity: f32,
}

impl Default for MarkerPalette {
    fn default() -> Self {
        Self {
            idle: MARKER_COLOR,
            hovered: MARKER_HOVER_COLOR,
            selected: MARKER_ACTIVE_COLOR,
            marker_opacity: 0.9,
            pulse_opacity: 0.3,
            emissive_intensity: 0.3,
        }
    }
}

/// How one marker should be drawn this frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MarkerAppearance {
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    pub pulse_color: [f32; 4],
    /// The halo shows on hover and while selected.
    pub pulse_visible: bool,
    /// Only animates while selected.
    pub pulse_scale: f32,
}

impl MarkerPalette {
    pub fn hex(&self, state: MarkerState) -> u32 {
        match state {
            MarkerState::Idle => self.idle,
            MarkerState::Hovered => self.hovered,
            MarkerState::Selected => self.selected,
        }
    }

    pub fn appearance(&self, state: MarkerState, pulse: Pulse) -> MarkerAppearance {
        let hex = self.hex(state);
        let (pulse_visible, pulse_scale) = match state {
            MarkerState::Idle => (false, 1.0),
            MarkerState::Hovered => (true, 1.0),
            MarkerState::Selected => (true, pulse.scale() as f32),
        };
        MarkerAppearance {
            color: rgba_from_hex(hex, self.marker_opacity),
            emissive: rgba_from_hex(hex, self.emissive_intensity),
            pulse_color: rgba_from_hex(hex, self.pulse_opacity),
            pulse_visible,
            pulse_scale,
        }
    }
}
