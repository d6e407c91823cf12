//! Values handed to the map library: construction options, sources, layers,
//! controls and popups. Each has a `to_json` producing the MapLibre form.

use std::collections::BTreeMap;

use formats::FeatureCollection;
use foundation::{LayerId, LngLat, LngLatBounds};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use style::{Expr, Paint};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    pub container: String,
    pub center: LngLat,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub max_bounds: Option<LngLatBounds>,
    pub attribution_control: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            container: "map".to_string(),
            center: LngLat::new(0.0, 0.0),
            zoom: 0.0,
            min_zoom: 0.0,
            max_zoom: 22.0,
            pitch: 0.0,
            bearing: 0.0,
            max_bounds: None,
            attribution_control: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    GeoJson(FeatureCollection),
    Raster {
        tiles: Vec<String>,
        tile_size: u32,
        attribution: String,
    },
}

impl SourceSpec {
    pub fn empty_geojson() -> Self {
        SourceSpec::GeoJson(FeatureCollection::empty())
    }

    pub fn to_json(&self) -> Value {
        match self {
            SourceSpec::GeoJson(data) => json!({
                "type": "geojson",
                "data": data.to_geojson_value(),
            }),
            SourceSpec::Raster {
                tiles,
                tile_size,
                attribution,
            } => json!({
                "type": "raster",
                "tiles": tiles,
                "tileSize": tile_size,
                "attribution": attribution,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: LayerId,
    /// MapLibre layer type (`circle`, `symbol`, `raster`, ...).
    pub kind: String,
    pub source: LayerId,
    pub paint: Paint,
    pub layout: BTreeMap<String, Value>,
    pub filter: Option<Expr>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
}

impl LayerSpec {
    pub fn new(id: LayerId, kind: impl Into<String>, source: LayerId) -> Self {
        Self {
            id,
            kind: kind.into(),
            source,
            paint: Paint::new(),
            layout: BTreeMap::new(),
            filter: None,
            min_zoom: None,
            max_zoom: None,
        }
    }

    pub fn with_paint(mut self, paint: Paint) -> Self {
        self.paint = paint;
        self
    }

    pub fn with_layout(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.layout.insert(name.to_string(), value.into());
        self
    }

    pub fn with_zoom_range(mut self, min: f64, max: f64) -> Self {
        self.min_zoom = Some(min);
        self.max_zoom = Some(max);
        self
    }

    /// `visibility` layout property; absent means visible.
    pub fn is_visible(&self) -> bool {
        self.layout.get("visibility").and_then(Value::as_str) != Some("none")
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("id".into(), self.id.as_str().into());
        out.insert("type".into(), self.kind.clone().into());
        out.insert("source".into(), self.source.as_str().into());
        if !self.paint.is_empty() {
            out.insert(
                "paint".into(),
                Value::Object(
                    self.paint
                        .iter()
                        .map(|(k, e)| (k.clone(), e.to_json()))
                        .collect(),
                ),
            );
        }
        if !self.layout.is_empty() {
            out.insert(
                "layout".into(),
                Value::Object(self.layout.clone().into_iter().collect()),
            );
        }
        if let Some(filter) = &self.filter {
            out.insert("filter".into(), filter.to_json());
        }
        if let Some(z) = self.min_zoom {
            out.insert("minzoom".into(), z.into());
        }
        if let Some(z) = self.max_zoom {
            out.insert("maxzoom".into(), z.into());
        }
        Value::Object(out)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ControlPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlPosition::TopLeft => "top-left",
            ControlPosition::TopRight => "top-right",
            ControlPosition::BottomLeft => "bottom-left",
            ControlPosition::BottomRight => "bottom-right",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Scale { unit: String },
    Navigation,
    Attribution { compact: bool, custom: String },
    /// The rotation toggle button.
    Rotation { icon: String },
}

impl Control {
    pub fn name(&self) -> &'static str {
        match self {
            Control::Scale { .. } => "scale",
            Control::Navigation => "navigation",
            Control::Attribution { .. } => "attribution",
            Control::Rotation { .. } => "rotation",
        }
    }

    /// Where MapLibre puts the control when no position is given.
    pub fn default_position(&self) -> ControlPosition {
        match self {
            Control::Scale { .. } => ControlPosition::BottomLeft,
            Control::Navigation => ControlPosition::TopRight,
            Control::Attribution { .. } => ControlPosition::BottomRight,
            Control::Rotation { .. } => ControlPosition::TopLeft,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupSpec {
    pub lng_lat: LngLat,
    pub html: String,
    pub close_button: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotateOptions {
    pub duration_ms: f64,
    pub easing: Easing,
}

#[cfg(test)]
mod tests {
    use super::{Control, ControlPosition, LayerSpec, SourceSpec};
    use foundation::LayerId;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use style::Expr;

    #[test]
    fn layer_json_omits_empty_sections() {
        let slot = LayerSpec::new(LayerId::slot(0), "symbol", LayerId::new("empty"));
        assert_eq!(
            slot.to_json(),
            json!({"id": "layerIndex0", "type": "symbol", "source": "empty"})
        );
        assert!(slot.is_visible());
    }

    #[test]
    fn layer_json_carries_paint_layout_and_zoom() {
        let mut layer = LayerSpec::new(LayerId::new("wmts-layer"), "raster", "raster-tiles".into())
            .with_layout("visibility", "none")
            .with_zoom_range(0.0, 22.0);
        layer
            .paint
            .insert("raster-opacity".to_string(), Expr::from(1.0));
        assert_eq!(
            layer.to_json(),
            json!({
                "id": "wmts-layer",
                "type": "raster",
                "source": "raster-tiles",
                "paint": {"raster-opacity": 1.0},
                "layout": {"visibility": "none"},
                "minzoom": 0.0,
                "maxzoom": 22.0
            })
        );
        assert!(!layer.is_visible());
    }

    #[test]
    fn empty_geojson_source() {
        assert_eq!(
            SourceSpec::empty_geojson().to_json(),
            json!({"type": "geojson", "data": {"type": "FeatureCollection", "features": []}})
        );
    }

    #[test]
    fn default_positions() {
        assert_eq!(Control::Navigation.default_position(), ControlPosition::TopRight);
        assert_eq!(ControlPosition::TopLeft.as_str(), "top-left");
    }
}
