use std::collections::HashSet;

use foundation::LayerId;
use serde_json::Value;

use crate::descriptor::LayerDescriptor;

/// Ids the bootstrapper and materializer claim for themselves.
pub const RESERVED_IDS: [&str; 3] = ["empty", "raster-tiles", "wmts-layer"];
const SLOT_PREFIX: &str = "layerIndex";

#[derive(Debug)]
pub enum RegistryError {
    Json(serde_json::Error),
    /// Neither an array nor an object with a `layers` array.
    Shape,
    EmptyId { index: usize },
    EmptyName(LayerId),
    DuplicateId(LayerId),
    ReservedId(LayerId),
    ForeignPaintProperty { layer: LayerId, property: String },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Json(e) => write!(f, "invalid layer registry: {e}"),
            RegistryError::Shape => {
                write!(f, "layer registry must be an array or {{\"layers\": [...]}}")
            }
            RegistryError::EmptyId { index } => {
                write!(f, "layer #{index} has an empty sourceLayerName")
            }
            RegistryError::EmptyName(id) => write!(f, "layer {id} has an empty name"),
            RegistryError::DuplicateId(id) => write!(f, "duplicate layer id: {id}"),
            RegistryError::ReservedId(id) => write!(f, "layer id {id} is reserved"),
            RegistryError::ForeignPaintProperty { layer, property } => {
                write!(f, "layer {layer}: paint property {property} does not match its type")
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::Json(e)
    }
}

/// Which layers receive which combined filter. Computed once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MembershipSets {
    pub filtered: Vec<LayerId>,
    pub date_range: Vec<LayerId>,
}

impl MembershipSets {
    pub fn contains(&self, id: &LayerId) -> bool {
        self.filtered.contains(id) || self.date_range.contains(id)
    }
}

/// Ordered layer descriptors, bottom layer first.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRegistry {
    descriptors: Vec<LayerDescriptor>,
}

impl LayerRegistry {
    pub fn new(descriptors: Vec<LayerDescriptor>) -> Result<Self, RegistryError> {
        let registry = Self { descriptors };
        registry.validate()?;
        Ok(registry)
    }

    /// Accepts either a bare array of descriptors or `{"layers": [...]}`.
    pub fn from_json_str(src: &str) -> Result<Self, RegistryError> {
        let list = match serde_json::from_str(src)? {
            Value::Object(mut wrapper) => wrapper.remove("layers").ok_or(RegistryError::Shape)?,
            list @ Value::Array(_) => list,
            _ => return Err(RegistryError::Shape),
        };
        Self::new(serde_json::from_value(list)?)
    }

    pub fn to_json_string(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string_pretty(&self.descriptors)?)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for (index, d) in self.descriptors.iter().enumerate() {
            let id = d.id();
            if id.as_str().trim().is_empty() {
                return Err(RegistryError::EmptyId { index });
            }
            if RESERVED_IDS.contains(&id.as_str()) || id.as_str().starts_with(SLOT_PREFIX) {
                return Err(RegistryError::ReservedId(id.clone()));
            }
            if d.name.trim().is_empty() {
                return Err(RegistryError::EmptyName(id.clone()));
            }
            if !seen.insert(id.as_str()) {
                return Err(RegistryError::DuplicateId(id.clone()));
            }
            if let Some(property) = d
                .symbolization
                .keys()
                .find(|p| !d.layer_type.owns_paint_property(p))
            {
                return Err(RegistryError::ForeignPaintProperty {
                    layer: id.clone(),
                    property: property.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayerDescriptor> {
        self.descriptors.iter()
    }

    pub fn descriptors(&self) -> &[LayerDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, id: &str) -> Option<&LayerDescriptor> {
        self.descriptors.iter().find(|d| d.id().as_str() == id)
    }

    /// Registry position, which is also the placeholder slot index.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.id().as_str() == id)
    }

    pub fn filtered_layers(&self) -> Vec<LayerId> {
        self.ids_where(LayerDescriptor::is_filtered)
    }

    pub fn date_range_layers(&self) -> Vec<LayerId> {
        self.ids_where(LayerDescriptor::is_date_ranged)
    }

    pub fn membership(&self) -> MembershipSets {
        MembershipSets {
            filtered: self.filtered_layers(),
            date_range: self.date_range_layers(),
        }
    }

    /// Non-blank attributions in registry order.
    pub fn attributions(&self) -> Vec<&str> {
        self.descriptors
            .iter()
            .filter(|d| d.has_attribution())
            .map(|d| d.attribution.as_str())
            .collect()
    }

    fn ids_where(&self, pred: impl Fn(&LayerDescriptor) -> bool) -> Vec<LayerId> {
        self.descriptors
            .iter()
            .filter(|d| pred(d))
            .map(|d| d.id().clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a LayerRegistry {
    type Item = &'a LayerDescriptor;
    type IntoIter = std::slice::Iter<'a, LayerDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerRegistry, RegistryError};
    use foundation::LayerId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn descriptor(id: &str, filter_layer: bool, date_range: bool) -> serde_json::Value {
        json!({
            "name": id.to_uppercase(),
            "sourceLayerName": id,
            "attribution": if id == "b" { "" } else { "src " },
            "layerType": "circle",
            "symbolization": { "circle-radius": 4 },
            "states": { "filterLayer": filter_layer, "dateRange": date_range }
        })
    }

    fn registry(items: Vec<serde_json::Value>) -> Result<LayerRegistry, RegistryError> {
        LayerRegistry::from_json_str(&serde_json::Value::Array(items).to_string())
    }

    #[test]
    fn membership_sets_are_disjoint() {
        let r = registry(vec![
            descriptor("a", true, false),
            descriptor("b", true, true),
            descriptor("c", false, true),
            descriptor("d", false, false),
        ])
        .unwrap();
        assert_eq!(r.filtered_layers(), vec![LayerId::new("a")]);
        assert_eq!(r.date_range_layers(), vec![LayerId::new("b"), LayerId::new("c")]);
        let sets = r.membership();
        assert!(sets.contains(&LayerId::new("b")));
        assert!(!sets.contains(&LayerId::new("d")));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = registry(vec![descriptor("a", false, false), descriptor("a", false, false)])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(id) if id.as_str() == "a"));
    }

    #[test]
    fn rejects_reserved_and_slot_ids() {
        for id in ["empty", "wmts-layer", "layerIndex3"] {
            let err = registry(vec![descriptor(id, false, false)]).unwrap_err();
            assert!(matches!(err, RegistryError::ReservedId(_)), "{id}: {err}");
        }
    }

    #[test]
    fn rejects_paint_of_another_layer_type() {
        let mut d = descriptor("a", false, false);
        d["symbolization"] = json!({ "fill-color": "#000" });
        let err = registry(vec![d]).unwrap_err();
        assert!(matches!(err, RegistryError::ForeignPaintProperty { .. }));
    }

    #[test]
    fn malformed_expressions_report_their_cause() {
        let mut d = descriptor("a", false, false);
        d["symbolization"] = json!({ "circle-color": ["get"] });
        let err = registry(vec![d.clone()]).unwrap_err();
        assert!(matches!(err, RegistryError::Json(_)));
        assert!(err.to_string().contains("\"get\" expects 1 arguments"), "{err}");

        let err = LayerRegistry::from_json_str(&json!({ "layers": [d] }).to_string()).unwrap_err();
        assert!(err.to_string().contains("\"get\" expects"), "{err}");
    }

    #[test]
    fn zoom_driven_paint_loads() {
        let mut d = descriptor("a", false, false);
        let radius = json!(["interpolate", ["linear"], ["zoom"], 11, 3, 16, 8]);
        d["symbolization"] = json!({ "circle-radius": radius });
        let r = registry(vec![d]).unwrap();
        let paint = &r.descriptors()[0].symbolization;
        assert_eq!(paint["circle-radius"].to_json(), radius);
    }

    #[test]
    fn symbol_layers_accept_text_and_icon_paint() {
        let mut d = descriptor("x", false, false);
        d["layerType"] = json!("symbol");
        d["symbolization"] = json!({ "text-color": "#000", "icon-opacity": 0.8 });
        assert!(registry(vec![d.clone()]).is_ok());

        d["symbolization"] = json!({ "circle-color": "#000" });
        assert!(matches!(
            registry(vec![d]),
            Err(RegistryError::ForeignPaintProperty { .. })
        ));
    }

    #[test]
    fn rejects_other_document_shapes() {
        for src in ["42", "{\"items\": []}"] {
            assert!(matches!(LayerRegistry::from_json_str(src), Err(RegistryError::Shape)));
        }
    }

    #[test]
    fn wrapped_form_and_lookup() {
        let src = json!({ "layers": [descriptor("a", false, false), descriptor("b", false, false)] });
        let r = LayerRegistry::from_json_str(&src.to_string()).unwrap();
        assert_eq!(r.index_of("b"), Some(1));
        assert_eq!(r.get("a").map(|d| d.name.as_str()), Some("A"));
        assert_eq!(r.attributions(), vec!["src "]);
    }

    #[test]
    fn json_round_trip_preserves_registry() {
        let r = registry(vec![descriptor("a", true, false)]).unwrap();
        let again = LayerRegistry::from_json_str(&r.to_json_string().unwrap()).unwrap();
        assert_eq!(again, r);
    }
}
