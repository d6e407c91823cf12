//! Pointer handling per layer: popups, hover highlight and cursor.

use std::collections::HashMap;

use formats::{Feature, FeatureId};
use foundation::LayerId;
use layers::{LayerDescriptor, PopupRole, PopupTemplate, PopupTrigger, badge_color};
use map::{FeatureRef, MapBackend, MapError, MapEvent, PointerEvent, PopupSpec};
use serde_json::{Map, Value};

pub const HOVER_STATE: &str = "hover";
const MISSING: &str = "N/A";

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Text shown for a property value; `None` for absent, null or blank.
pub fn display_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

/// Popup body for one feature.
pub fn popup_html(template: &PopupTemplate, properties: &Map<String, Value>) -> String {
    let text = |property: &str| display_value(properties.get(property)).map(|v| escape_html(&v));

    let mut html =
        String::from(r#"<div class="popup-content" style="font-family: sans-serif; font-size: 13px;">"#);
    if let Some(title) = template.title().and_then(|f| text(&f.property)) {
        html.push_str(&format!(
            r#"<h3 style="margin:0 0 5px 0; font-size: 14px;">{title}</h3>"#
        ));
    }
    if let Some(desc) = template.description().and_then(|f| text(&f.property)) {
        html.push_str(&format!("<p>{desc}</p>"));
    }
    if let Some(src) = template.image().and_then(|f| text(&f.property)) {
        html.push_str(&format!(r#"<img width="200" src="{src}"><br>"#));
    }

    html.push_str(r#"<div style="display:flex; flex-direction:column; gap:3px;">"#);
    for field in template.rows() {
        let value = text(&field.property).unwrap_or_else(|| MISSING.to_string());
        let value = match field.role {
            PopupRole::Badge => {
                let raw = display_value(properties.get(&field.property));
                let color = badge_color(raw.as_deref().unwrap_or(MISSING));
                format!(
                    r#"<span style="display:inline-block; padding:2px 6px; border-radius:4px; background-color:{color}; color:#fff; font-weight:bold;">{value}</span>"#
                )
            }
            _ => value,
        };
        html.push_str(&format!(
            "<div><strong>{}:</strong> {value}</div>",
            escape_html(&field.property)
        ));
    }
    html.push_str("</div></div>");
    html
}

/// Identity of a hovered feature for popup purposes: an `fid` property when
/// present, the feature id otherwise.
pub fn popup_key(feature: &Feature) -> Option<String> {
    display_value(feature.properties.get("fid"))
        .or_else(|| feature.id.as_ref().map(|id| id.to_string()))
}

/// The one feature per layer carrying `hover: true`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoverTracker {
    current: Option<FeatureId>,
}

impl HoverTracker {
    pub fn current(&self) -> Option<&FeatureId> {
        self.current.as_ref()
    }

    pub fn move_to<M: MapBackend>(
        &mut self,
        map: &mut M,
        source: &LayerId,
        feature: Option<&FeatureId>,
    ) -> Result<(), MapError> {
        if self.current.as_ref() == feature {
            return Ok(());
        }
        self.clear(map, source)?;
        if let Some(id) = feature {
            map.set_feature_state(
                &FeatureRef {
                    source: source.clone(),
                    id: id.clone(),
                },
                HOVER_STATE,
                Value::Bool(true),
            )?;
            self.current = Some(id.clone());
        }
        Ok(())
    }

    pub fn clear<M: MapBackend>(&mut self, map: &mut M, source: &LayerId) -> Result<(), MapError> {
        if let Some(prev) = self.current.take() {
            map.set_feature_state(
                &FeatureRef {
                    source: source.clone(),
                    id: prev,
                },
                HOVER_STATE,
                Value::Bool(false),
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct HoverPopup {
    key: Option<String>,
    html: String,
}

#[derive(Debug, Clone)]
struct LayerHandlers {
    popups: Option<PopupTemplate>,
    highlight: bool,
    hover: HoverTracker,
    hover_popup: HoverPopup,
}

/// Interaction state of every materialized layer.
#[derive(Debug, Default)]
pub struct InteractionHandlers {
    layers: HashMap<LayerId, LayerHandlers>,
}

impl InteractionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: &LayerDescriptor) {
        self.layers.insert(
            descriptor.id().clone(),
            LayerHandlers {
                popups: descriptor.states.pop_ups.then(|| descriptor.popup.clone()),
                highlight: descriptor.states.highlight,
                hover: HoverTracker::default(),
                hover_popup: HoverPopup::default(),
            },
        );
    }

    pub fn hovered(&self, layer: &LayerId) -> Option<&FeatureId> {
        self.layers.get(layer).and_then(|h| h.hover.current())
    }

    /// Click popups get their own key so a hover popup can coexist.
    pub fn click_popup_key(layer: &LayerId) -> String {
        format!("{layer}:click")
    }

    /// Returns `false` when the event's layer has no handlers.
    pub fn handle<M: MapBackend>(&mut self, map: &mut M, event: &PointerEvent) -> Result<bool, MapError> {
        let Some(h) = self.layers.get_mut(&event.layer) else {
            return Ok(false);
        };
        let top = event.top_feature();
        match event.kind {
            MapEvent::Click => {
                if let (Some(template), Some(feature)) = (&h.popups, top)
                    && template.trigger == PopupTrigger::Click
                {
                    map.show_popup(
                        &Self::click_popup_key(&event.layer),
                        PopupSpec {
                            lng_lat: event.lng_lat,
                            html: popup_html(template, &feature.properties),
                            close_button: false,
                        },
                    );
                }
            }
            MapEvent::MouseEnter => {
                if h.popups.is_some() {
                    map.set_cursor("pointer");
                }
            }
            MapEvent::MouseMove => {
                if let (Some(template), Some(feature)) = (&h.popups, top)
                    && template.trigger == PopupTrigger::Hover
                {
                    let key = popup_key(feature);
                    if key.is_none() || key != h.hover_popup.key {
                        h.hover_popup.html = popup_html(template, &feature.properties);
                        h.hover_popup.key = key;
                    }
                    map.show_popup(
                        event.layer.as_str(),
                        PopupSpec {
                            lng_lat: event.lng_lat,
                            html: h.hover_popup.html.clone(),
                            close_button: false,
                        },
                    );
                }
                if h.highlight && let Some(feature) = top {
                    h.hover.move_to(map, &event.layer, feature.id.as_ref())?;
                }
            }
            MapEvent::MouseLeave => {
                if h.popups.is_some() {
                    map.set_cursor("");
                }
                if h.popups.as_ref().is_some_and(|t| t.trigger == PopupTrigger::Hover) {
                    map.remove_popup(event.layer.as_str());
                    h.hover_popup = HoverPopup::default();
                }
                if h.highlight {
                    h.hover.clear(map, &event.layer)?;
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{HoverTracker, InteractionHandlers, display_value, popup_html, popup_key};
    use formats::{FeatureCollection, FeatureId};
    use foundation::LayerId;
    use layers::{PopupTemplate, PopupTrigger, barcelona};
    use map::{FeatureRef, HeadlessMap, MapBackend, MapEvent, MapOptions, SourceSpec};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn popup_lists_fields_with_badge() {
        let t = PopupTemplate::from_names(PopupTrigger::Click, ["Type", "Evaluation", "Value"]);
        let html = popup_html(&t, &obj(json!({"Type": "Obstacles", "Evaluation": "Severe", "Value": 3})));
        assert!(html.contains(r#"<h3 style="margin:0 0 5px 0; font-size: 14px;">Obstacles</h3>"#));
        assert!(html.contains("background-color:#F03B20"));
        assert!(html.contains("<div><strong>Value:</strong> 3</div>"));
        assert!(!html.contains("<strong>Type:</strong>"));
    }

    #[test]
    fn missing_fields_render_na() {
        let t = PopupTemplate::from_names(PopupTrigger::Click, ["Type", "Evaluation", "Value"]);
        let html = popup_html(&t, &obj(json!({"Value": ""})));
        assert!(!html.contains("<h3"));
        assert!(html.contains("<div><strong>Value:</strong> N/A</div>"));
        assert!(html.contains("background-color:#ccc; color:#fff; font-weight:bold;\">N/A</span>"));
    }

    #[test]
    fn values_are_escaped() {
        let t = PopupTemplate::from_names(PopupTrigger::Click, ["Value"]);
        let html = popup_html(&t, &obj(json!({"Value": "<b>&</b>"})));
        assert!(html.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
    }

    #[test]
    fn numbers_display_like_the_browser() {
        assert_eq!(display_value(Some(&json!(3.0))), Some("3".to_string()));
        assert_eq!(display_value(Some(&json!(2.5))), Some("2.5".to_string()));
        assert_eq!(display_value(Some(&json!(null))), None);
        assert_eq!(display_value(None), None);
    }

    fn map_with_points() -> (HeadlessMap, LayerId) {
        let mut map = HeadlessMap::new(MapOptions::default());
        let id = LayerId::new("IMPD_obstacles");
        let fc = FeatureCollection::from_geojson_value(&json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": 1, "properties": {"Type": "Obstacles", "Evaluation": "Light"},
                 "geometry": {"type": "Point", "coordinates": [2.1, 41.3]}},
                {"type": "Feature", "id": 2, "properties": {"fid": "x2", "Evaluation": "Severe"},
                 "geometry": {"type": "Point", "coordinates": [2.2, 41.4]}}
            ]
        }))
        .unwrap();
        map.add_source(&id, SourceSpec::GeoJson(fc)).unwrap();
        (map, id)
    }

    #[test]
    fn hover_tracker_keeps_one_feature_lit() {
        let (mut map, id) = map_with_points();
        let mut t = HoverTracker::default();
        let one = FeatureId::Number(1);
        let two = FeatureId::Number(2);
        let state = |map: &HeadlessMap, fid: &FeatureId| {
            map.feature_state(&FeatureRef {
                source: id.clone(),
                id: fid.clone(),
            })
            .get("hover")
            .cloned()
        };

        t.move_to(&mut map, &id, Some(&one)).unwrap();
        t.move_to(&mut map, &id, Some(&two)).unwrap();
        assert_eq!(state(&map, &one), Some(json!(false)));
        assert_eq!(state(&map, &two), Some(json!(true)));

        t.clear(&mut map, &id).unwrap();
        assert_eq!(state(&map, &two), Some(json!(false)));
        assert_eq!(t.current(), None);
    }

    #[test]
    fn click_popup_and_cursor() {
        let (mut map, id) = map_with_points();
        let descriptor = barcelona::descriptors().remove(1);
        map.add_layer(crate::materializer::layer_spec(&descriptor), None)
            .unwrap();
        for e in crate::materializer::subscriptions(&descriptor) {
            map.on(e, &id);
        }
        let mut handlers = InteractionHandlers::new();
        handlers.register(&descriptor);

        let enter = map.pointer_event(MapEvent::MouseEnter, &id, 0).unwrap();
        handlers.handle(&mut map, &enter).unwrap();
        assert_eq!(map.cursor(), "pointer");

        let click = map.pointer_event(MapEvent::Click, &id, 0).unwrap();
        assert!(handlers.handle(&mut map, &click).unwrap());
        let popup = &map.popups()[&InteractionHandlers::click_popup_key(&id)];
        assert!(popup.html.contains("Obstacles"));
        assert_eq!(popup.lng_lat.lng, 2.1);

        let leave = map.pointer_event(MapEvent::MouseLeave, &id, 0).unwrap();
        handlers.handle(&mut map, &leave).unwrap();
        assert_eq!(map.cursor(), "");
    }

    #[test]
    fn hover_popup_rebuilds_only_for_a_new_feature() {
        let (mut map, id) = map_with_points();
        let mut descriptor = barcelona::descriptors().remove(1);
        descriptor.popup.trigger = PopupTrigger::Hover;
        descriptor.states.highlight = true;
        map.add_layer(crate::materializer::layer_spec(&descriptor), None)
            .unwrap();
        for e in crate::materializer::subscriptions(&descriptor) {
            map.on(e, &id);
        }
        let mut handlers = InteractionHandlers::new();
        handlers.register(&descriptor);

        let over_second = map.pointer_event(MapEvent::MouseMove, &id, 1).unwrap();
        handlers.handle(&mut map, &over_second).unwrap();
        let first_html = map.popups()[id.as_str()].html.clone();
        assert!(first_html.contains("Severe"));
        assert_eq!(handlers.hovered(&id), Some(&FeatureId::Number(2)));

        let mut moved = over_second.clone();
        moved.lng_lat.lng = 2.25;
        moved.features[0].properties.insert("Evaluation".into(), json!("Light"));
        handlers.handle(&mut map, &moved).unwrap();
        assert_eq!(map.popups()[id.as_str()].html, first_html);
        assert_eq!(map.popups()[id.as_str()].lng_lat.lng, 2.25);
        assert_eq!(popup_key(&moved.features[0]), Some("x2".to_string()));

        let leave = map.pointer_event(MapEvent::MouseLeave, &id, 0).unwrap();
        handlers.handle(&mut map, &leave).unwrap();
        assert!(map.popups().is_empty());
        assert_eq!(handlers.hovered(&id), None);
    }

    #[test]
    fn unknown_layers_are_not_handled() {
        let (mut map, id) = map_with_points();
        map.on(MapEvent::MouseLeave, &id);
        let leave = map.pointer_event(MapEvent::MouseLeave, &id, 0).unwrap();
        assert!(!InteractionHandlers::new().handle(&mut map, &leave).unwrap());
    }
}
