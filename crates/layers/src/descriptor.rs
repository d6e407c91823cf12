use foundation::LayerId;
use serde::{Deserialize, Serialize};
use style::Paint;

use crate::popup::PopupTemplate;
use crate::symbology::Legend;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceType {
    #[default]
    #[serde(rename = "geojson")]
    GeoJson,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::GeoJson => "geojson",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerType {
    Circle,
    Symbol,
    Fill,
    Line,
    Heatmap,
    FillExtrusion,
    Raster,
}

impl LayerType {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerType::Circle => "circle",
            LayerType::Symbol => "symbol",
            LayerType::Fill => "fill",
            LayerType::Line => "line",
            LayerType::Heatmap => "heatmap",
            LayerType::FillExtrusion => "fill-extrusion",
            LayerType::Raster => "raster",
        }
    }

    /// Prefixes of the paint properties this layer type accepts.
    pub fn paint_prefixes(self) -> &'static [&'static str] {
        match self {
            LayerType::Circle => &["circle-"],
            LayerType::Symbol => &["icon-", "text-"],
            LayerType::Fill => &["fill-"],
            LayerType::Line => &["line-"],
            LayerType::Heatmap => &["heatmap-"],
            LayerType::FillExtrusion => &["fill-extrusion-"],
            LayerType::Raster => &["raster-"],
        }
    }

    pub fn owns_paint_property(self, property: &str) -> bool {
        // `fill-extrusion-*` shares the `fill-` prefix.
        if self == LayerType::Fill && property.starts_with("fill-extrusion-") {
            return false;
        }
        self.paint_prefixes()
            .iter()
            .any(|prefix| property.len() > prefix.len() && property.starts_with(prefix))
    }
}

/// Layout `visibility` value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "VisibilityRepr")]
pub enum Visibility {
    #[default]
    Visible,
    None,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    pub fn from_checked(checked: bool) -> Self {
        if checked {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }
}

// Hand-edited configs sometimes write `visible: true`.
#[derive(Deserialize)]
#[serde(untagged)]
enum VisibilityRepr {
    Flag(bool),
    Named(VisibilityName),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum VisibilityName {
    Visible,
    None,
}

impl From<VisibilityRepr> for Visibility {
    fn from(repr: VisibilityRepr) -> Self {
        match repr {
            VisibilityRepr::Flag(b) => Visibility::from_checked(b),
            VisibilityRepr::Named(VisibilityName::Visible) => Visibility::Visible,
            VisibilityRepr::Named(VisibilityName::None) => Visibility::None,
        }
    }
}

/// Behaviour flags of a descriptor.
///
/// `icons` and `filterCat` are carried through configuration but drive no
/// behaviour of their own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerStates {
    pub visible: Visibility,
    pub pop_ups: bool,
    pub icons: bool,
    pub filter_cat: bool,
    pub highlight: bool,
    pub filter_layer: bool,
    pub date_range: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterBy {
    pub active: bool,
    #[serde(rename = "fFeature")]
    pub feature: String,
}

/// Static configuration of one overlay layer.
///
/// `source_layer_name` is both the source id and the layer id on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDescriptor {
    pub name: String,
    pub source_layer_name: LayerId,
    #[serde(default)]
    pub attribution: String,
    #[serde(default)]
    pub source_type: SourceType,
    pub layer_type: LayerType,
    #[serde(default)]
    pub symbolization: Paint,
    #[serde(default)]
    pub legend: Legend,
    #[serde(default)]
    pub states: LayerStates,
    #[serde(rename = "popUpFeatures", default)]
    pub popup: PopupTemplate,
    #[serde(default)]
    pub filter_by: FilterBy,
}

impl LayerDescriptor {
    pub fn id(&self) -> &LayerId {
        &self.source_layer_name
    }

    /// Receives only the category predicate.
    pub fn is_filtered(&self) -> bool {
        self.states.filter_layer && !self.states.date_range
    }

    /// Receives the date predicates and the category predicate.
    pub fn is_date_ranged(&self) -> bool {
        self.states.date_range
    }

    pub fn has_attribution(&self) -> bool {
        !self.attribution.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerDescriptor, LayerType, Visibility};
    use crate::popup::{PopupRole, PopupTrigger};
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "name": "Obstacles",
            "sourceLayerName": "IMPD_obstacles",
            "attribution": "",
            "sourceType": "geojson",
            "layerType": "circle",
            "symbolization": {
                "circle-radius": 5,
                "circle-color": ["match", ["get", "Evaluation"], "Light", "#F6CF71", "#ccc"]
            },
            "legend": {
                "id": "legend-a",
                "class": "legend",
                "items": [{
                    "styleHeight": "12px",
                    "display": "inline-block",
                    "backgroundColor": "#F6CF71",
                    "range": ["Light"]
                }]
            },
            "states": {
                "visible": "visible",
                "popUps": true,
                "icons": true,
                "filterCat": true,
                "highlight": false,
                "filterLayer": true,
                "dateRange": true
            },
            "popUpFeatures": { "event": "click", "fields": ["Type", "Evaluation", "Value"] },
            "filterBy": { "active": false, "fFeature": "Type" }
        })
    }

    #[test]
    fn parses_configuration_shape() {
        let d: LayerDescriptor = serde_json::from_value(sample()).unwrap();
        assert_eq!(d.id().as_str(), "IMPD_obstacles");
        assert_eq!(d.layer_type, LayerType::Circle);
        assert_eq!(d.states.visible, Visibility::Visible);
        assert_eq!(d.popup.trigger, PopupTrigger::Click);
        assert_eq!(d.popup.fields[0].role, PopupRole::Title);
        assert_eq!(d.filter_by.feature, "Type");
        assert_eq!(d.symbolization.len(), 2);
        assert!(!d.has_attribution());
    }

    #[test]
    fn date_range_wins_over_filter_layer() {
        let d: LayerDescriptor = serde_json::from_value(sample()).unwrap();
        assert!(d.is_date_ranged());
        assert!(!d.is_filtered());
    }

    #[test]
    fn visibility_accepts_booleans() {
        let v: Visibility = serde_json::from_value(json!(false)).unwrap();
        assert_eq!(v, Visibility::None);
        let v: Visibility = serde_json::from_value(json!("visible")).unwrap();
        assert_eq!(v, Visibility::Visible);
        assert_eq!(serde_json::to_value(Visibility::None).unwrap(), json!("none"));
    }

    #[test]
    fn paint_properties_are_prefixed_by_type() {
        assert!(LayerType::Circle.owns_paint_property("circle-color"));
        assert!(!LayerType::Circle.owns_paint_property("fill-color"));
        assert!(LayerType::FillExtrusion.owns_paint_property("fill-extrusion-height"));
        assert!(!LayerType::Fill.owns_paint_property("fillcolor"));
        assert!(!LayerType::Fill.owns_paint_property("fill-"));
    }

    #[test]
    fn symbol_paint_uses_icon_and_text_properties() {
        assert!(LayerType::Symbol.owns_paint_property("text-color"));
        assert!(LayerType::Symbol.owns_paint_property("icon-opacity"));
        assert!(!LayerType::Symbol.owns_paint_property("symbol-color"));
        assert!(!LayerType::Symbol.owns_paint_property("circle-color"));
    }

    #[test]
    fn fill_does_not_claim_extrusion_paint() {
        assert!(LayerType::Fill.owns_paint_property("fill-color"));
        assert!(!LayerType::Fill.owns_paint_property("fill-extrusion-color"));
        assert!(!LayerType::FillExtrusion.owns_paint_property("fill-color"));
    }
}
