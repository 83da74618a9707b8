use std::sync::atomic::{AtomicBool, Ordering};

use catalog::{City, CityCatalog};
use foundation::math::Vec2;
use layers::Layer;
use layers::labels::{LabelsConfig, LabelsLayer, PlacedLabel};
use layers::markers::{MarkerDraw, MarkersLayer};
use layers::symbology::MarkerPalette;
use runtime::SubscriptionId;
use scene::{GlobeConfig, GlobeEvent, GlobeSession, Viewport};
use serde::Serialize;
use wasm_bindgen::prelude::*;

mod globe_controller;
use globe_controller::OrbitController;

// Guard to prevent double-initialization (relevant during hot reload).
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Pointer travel (px) beyond which a press is a drag, not a click.
const CLICK_SLOP_PX: f64 = 5.0;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    console_error_panic_hook::set_once();
    Ok(())
}

fn log_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    let msg = format!("{context}: {err}");
    web_sys::console::error_1(&JsValue::from_str(&msg));
    JsValue::from_str(&msg)
}

/// Fetches a cities document as text, for `GlobeView::load_cities`.
#[wasm_bindgen]
pub async fn fetch_cities(url: String) -> Result<String, JsValue> {
    let resp = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| log_error("city data request failed", e))?;
    if !resp.ok() {
        return Err(log_error(
            "city data request failed",
            format!("{} {}", resp.status(), resp.status_text()),
        ));
    }
    resp.text()
        .await
        .map_err(|e| log_error("city data unreadable", e))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectionPayload<'a> {
    city_id: Option<&'a str>,
    city: Option<&'a City>,
}

#[derive(Debug, Serialize)]
struct LayerTag {
    id: u64,
    name: &'static str,
}

impl LayerTag {
    fn of(layer: &dyn Layer) -> Self {
        Self {
            id: layer.id().0,
            name: layer.name(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameOut<'a> {
    /// Draw order, bottom first.
    layers: [LayerTag; 2],
    labels: &'a [PlacedLabel],
    markers: &'a [MarkerDraw],
    animating: bool,
}

/// Browser handle on one globe.
#[wasm_bindgen]
pub struct GlobeView {
    session: GlobeSession,
    controller: OrbitController,
    markers_layer: MarkersLayer,
    labels_layer: LabelsLayer,
    /// Pointer travel since the last press.
    drag_px: f64,
    selection_listeners: Vec<SubscriptionId>,
}

#[wasm_bindgen]
impl GlobeView {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> GlobeView {
        Self::from_config(GlobeConfig::default(), width, height)
    }

    /// Same as `new` with a JSON config overriding the defaults.
    pub fn with_config(width: f64, height: f64, config_json: &str) -> Result<GlobeView, JsValue> {
        let config =
            GlobeConfig::from_json_str(config_json).map_err(|e| log_error("globe config", e))?;
        Ok(Self::from_config(config, width, height))
    }

    /// Replaces the cities. Returns how many were loaded.
    pub fn load_cities(&mut self, json: &str) -> Result<usize, JsValue> {
        let catalog = CityCatalog::from_json_str(json).map_err(|e| log_error("city data", e))?;
        let count = catalog.len();
        self.session.set_catalog(catalog);
        Ok(count)
    }

    /// Frames the city nearest the configured start location.
    pub fn go_to_initial_location(&mut self) -> Option<String> {
        self.session.go_to_initial_location()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.resize(width, height);
        self.controller.set_canvas_size(width, height);
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, button: i32) {
        self.drag_px = 0.0;
        self.controller.on_pointer_down([x, y], button);
    }

    /// Rotates while dragging, otherwise updates the hover. Returns the
    /// hovered city id.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<String> {
        if self.controller.is_dragging() {
            self.drag_px += self.controller.on_pointer_move([x, y]);
            return None;
        }
        let hovered = self.session.pointer_move(Vec2::new(x, y))?;
        self.session
            .registry()
            .get(hovered)
            .map(|m| m.city_id().to_string())
    }

    pub fn pointer_up(&mut self) {
        self.controller.on_pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.controller.on_pointer_up();
        self.session.pointer_leave();
    }

    pub fn wheel(&mut self, delta: f64) {
        self.controller.on_wheel(delta, self.session.camera());
    }

    pub fn key_rotate(&mut self, dx: f64, dy: f64) {
        self.controller.key_rotate(dx, dy);
    }

    /// Selects the city under the pointer. The click that ends a drag is
    /// ignored.
    pub fn click(&mut self, x: f64, y: f64) -> bool {
        if self.drag_px > CLICK_SLOP_PX {
            self.drag_px = 0.0;
            return false;
        }
        self.session.click(Vec2::new(x, y))
    }

    /// `undefined` deselects, as when the player panel closes.
    pub fn select_city(&mut self, city_id: Option<String>) -> bool {
        self.session.select_city(city_id.as_deref())
    }

    /// Calls `callback(json)` on every selection change with
    /// `{"cityId": .., "city": ..}`; `cityId` is `null` on deselect.
    pub fn on_selection(&mut self, callback: js_sys::Function) {
        let id = self.session.subscribe(move |env| {
            let GlobeEvent::SelectionChanged { city_id, city, .. } = &env.event else {
                return;
            };
            let payload = SelectionPayload {
                city_id: city_id.as_deref(),
                city: city.as_deref(),
            };
            match serde_json::to_string(&payload) {
                Ok(json) => {
                    if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                        web_sys::console::error_2(&JsValue::from_str("selection listener failed"), &err);
                    }
                }
                Err(e) => {
                    log_error("selection payload", e);
                }
            }
        });
        self.selection_listeners.push(id);
    }

    pub fn clear_selection_listeners(&mut self) {
        for id in self.selection_listeners.drain(..) {
            self.session.unsubscribe(id);
        }
    }

    /// Advances one animation frame and returns the draw state as JSON:
    /// `{"layers": [{"id", "name"}..], "labels": [..], "markers": [..],
    /// "animating": bool}`.
    pub fn tick(&mut self, dt_ms: f64) -> Result<String, JsValue> {
        self.advance(dt_ms)
            .map_err(|e| log_error("frame serialization", e))
    }

    /// Cities matching `query` as a JSON array.
    pub fn search_cities(&self, query: &str) -> Result<String, JsValue> {
        let found: Vec<&City> = self
            .session
            .catalog()
            .search(query)
            .into_iter()
            .map(|c| &**c)
            .collect();
        serde_json::to_string(&found).map_err(|e| log_error("search results", e))
    }

    pub fn camera_position(&self) -> Vec<f64> {
        let p = self.session.camera().position;
        vec![p.x, p.y, p.z]
    }

    pub fn selected_city_id(&self) -> Option<String> {
        self.session.selected_city().map(|c| c.id.clone())
    }
}

impl GlobeView {
    fn from_config(config: GlobeConfig, width: f64, height: f64) -> Self {
        let mut controller = OrbitController::new(config.controls, &config.globe);
        controller.set_canvas_size(width, height);
        Self {
            session: GlobeSession::new(config, Viewport::new(width, height)),
            controller,
            markers_layer: MarkersLayer::new(1, MarkerPalette::default()),
            labels_layer: LabelsLayer::new(2, LabelsConfig::default()),
            drag_px: 0.0,
            selection_listeners: Vec::new(),
        }
    }

    fn advance(&mut self, dt_ms: f64) -> Result<String, serde_json::Error> {
        let dt_s = if dt_ms.is_finite() { dt_ms.max(0.0) / 1000.0 } else { 0.0 };
        let animating = self.session.director().is_animating();
        self.controller
            .update(dt_s, self.session.camera_mut(), animating);

        let placements = self.session.tick(dt_s);
        let labels = self.labels_layer.extract(&placements, self.session.registry());
        let markers = self.markers_layer.extract(self.session.registry());
        serde_json::to_string(&FrameOut {
            layers: [
                LayerTag::of(&self.markers_layer),
                LayerTag::of(&self.labels_layer),
            ],
            labels: &labels.labels,
            markers: &markers.markers,
            animating: self.session.director().is_animating(),
        })
    }
}
