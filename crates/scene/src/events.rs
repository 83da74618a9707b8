//! Notifications raised by the globe on the session's `EventBus`.

use std::rc::Rc;

use catalog::City;
use serde::Serialize;

use crate::entity::MarkerId;
use crate::markers::MarkerState;

/// A marker whose visual state changed as part of a transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualChange {
    #[serde(skip)]
    pub marker: MarkerId,
    pub city_id: String,
    pub state: MarkerState,
}

/// One envelope per selection or hover transition. The visual-state changes
/// the transition caused travel with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GlobeEvent {
    /// `city_id: None` is a deselect; the player clears its playlist.
    SelectionChanged {
        city_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        city: Option<Rc<City>>,
        visuals: Vec<VisualChange>,
    },
    HoverChanged {
        city_id: Option<String>,
        visuals: Vec<VisualChange>,
    },
}

impl GlobeEvent {
    pub fn visuals(&self) -> &[VisualChange] {
        match self {
            GlobeEvent::SelectionChanged { visuals, .. } => visuals,
            GlobeEvent::HoverChanged { visuals, .. } => visuals,
        }
    }

    pub fn selected_city_id(&self) -> Option<Option<&str>> {
        match self {
            GlobeEvent::SelectionChanged { city_id, .. } => Some(city_id.as_deref()),
            GlobeEvent::HoverChanged { .. } => None,
        }
    }
}
