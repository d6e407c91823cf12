use formats::{Feature, FeatureId};
use foundation::{LayerId, LngLat};
use serde_json::{Map, Value};
use style::Expr;

use crate::spec::{Control, ControlPosition, LayerSpec, PopupSpec, RotateOptions, SourceSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    DuplicateSource(LayerId),
    UnknownSource(LayerId),
    DuplicateLayer(LayerId),
    UnknownLayer(LayerId),
    /// The `before` id of an insertion names no layer.
    UnknownAnchor(LayerId),
    /// Error reported by the underlying map library.
    Backend(String),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::DuplicateSource(id) => write!(f, "source {id} already exists"),
            MapError::UnknownSource(id) => write!(f, "no source named {id}"),
            MapError::DuplicateLayer(id) => write!(f, "layer {id} already exists"),
            MapError::UnknownLayer(id) => write!(f, "no layer named {id}"),
            MapError::UnknownAnchor(id) => write!(f, "cannot insert before missing layer {id}"),
            MapError::Backend(msg) => write!(f, "map library error: {msg}"),
        }
    }
}

impl std::error::Error for MapError {}

/// Pointer events the viewer subscribes to per layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MapEvent {
    Click,
    MouseMove,
    MouseEnter,
    MouseLeave,
}

impl MapEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            MapEvent::Click => "click",
            MapEvent::MouseMove => "mousemove",
            MapEvent::MouseEnter => "mouseenter",
            MapEvent::MouseLeave => "mouseleave",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "click" => MapEvent::Click,
            "mousemove" => MapEvent::MouseMove,
            "mouseenter" => MapEvent::MouseEnter,
            "mouseleave" => MapEvent::MouseLeave,
            _ => return None,
        })
    }
}

/// Address of a feature for feature-state purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureRef {
    pub source: LayerId,
    pub id: FeatureId,
}

/// A pointer event delivered for one layer, features topmost first.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: MapEvent,
    pub layer: LayerId,
    pub lng_lat: LngLat,
    pub features: Vec<Feature>,
}

impl PointerEvent {
    pub fn top_feature(&self) -> Option<&Feature> {
        self.features.first()
    }
}

/// The map-library operations the viewer relies on.
///
/// Event delivery is push-based on the host side: `on` only declares
/// interest, and the host hands matching [`PointerEvent`]s to the viewer.
pub trait MapBackend {
    fn add_source(&mut self, id: &LayerId, source: SourceSpec) -> Result<(), MapError>;
    fn has_source(&self, id: &LayerId) -> bool;

    /// Inserts below `before` when given, on top otherwise.
    fn add_layer(&mut self, layer: LayerSpec, before: Option<&LayerId>) -> Result<(), MapError>;
    fn has_layer(&self, id: &LayerId) -> bool;

    /// Replaces the layer's filter wholesale; `None` removes it.
    fn set_filter(&mut self, layer: &LayerId, filter: Option<&Expr>) -> Result<(), MapError>;
    fn set_layout_property(
        &mut self,
        layer: &LayerId,
        name: &str,
        value: Value,
    ) -> Result<(), MapError>;

    fn set_feature_state(
        &mut self,
        feature: &FeatureRef,
        key: &str,
        value: Value,
    ) -> Result<(), MapError>;
    fn feature_state(&self, feature: &FeatureRef) -> Map<String, Value>;

    fn on(&mut self, event: MapEvent, layer: &LayerId);

    /// Shows a popup under `key`, replacing any popup already shown there.
    fn show_popup(&mut self, key: &str, popup: PopupSpec);
    fn remove_popup(&mut self, key: &str);

    fn set_cursor(&mut self, cursor: &str);
    fn add_control(&mut self, control: Control, position: Option<ControlPosition>);

    fn bearing(&self) -> f64;
    fn rotate_to(&mut self, bearing: f64, options: RotateOptions);
    /// Ends any camera animation immediately.
    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::MapEvent;

    #[test]
    fn event_names_match_the_map_library() {
        for e in [
            MapEvent::Click,
            MapEvent::MouseMove,
            MapEvent::MouseEnter,
            MapEvent::MouseLeave,
        ] {
            assert_eq!(MapEvent::parse(e.as_str()), Some(e));
        }
        assert_eq!(MapEvent::parse("wheel"), None);
    }
}
