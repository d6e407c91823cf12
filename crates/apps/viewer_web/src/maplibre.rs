//! [`MapBackend`] over the global `maplibregl` object.

use std::collections::HashMap;

use formats::FeatureCollection;
use foundation::{LayerId, LngLat};
use map::{
    Control, ControlPosition, Easing, FeatureRef, LayerSpec, MapBackend, MapError, MapEvent,
    MapOptions, PointerEvent, PopupSpec, RotateOptions, SourceSpec,
};
use serde_json::{Map, Value, json};
use style::Expr;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = maplibregl, js_name = Map)]
    pub type JsMap;

    #[wasm_bindgen(constructor, js_namespace = maplibregl, js_class = "Map")]
    fn new(options: &JsValue) -> JsMap;

    #[wasm_bindgen(method, catch, js_name = addSource)]
    fn add_source(this: &JsMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getSource)]
    fn get_source(this: &JsMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    fn add_layer(this: &JsMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    fn add_layer_before(this: &JsMap, layer: &JsValue, before: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getLayer)]
    fn get_layer(this: &JsMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = setFilter)]
    fn set_filter(this: &JsMap, id: &str, filter: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setLayoutProperty)]
    fn set_layout_property(
        this: &JsMap,
        id: &str,
        name: &str,
        value: &JsValue,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setFeatureState)]
    fn set_feature_state(this: &JsMap, feature: &JsValue, state: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getFeatureState)]
    fn get_feature_state(this: &JsMap, feature: &JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = on)]
    fn on_layer(this: &JsMap, kind: &str, layer: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = on)]
    pub fn on_map(this: &JsMap, kind: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = addControl)]
    fn add_control(this: &JsMap, control: &JsValue, position: &str);

    #[wasm_bindgen(method, js_name = getCanvas)]
    fn get_canvas(this: &JsMap) -> web_sys::HtmlElement;

    #[wasm_bindgen(method, js_name = getBearing)]
    fn get_bearing(this: &JsMap) -> f64;

    #[wasm_bindgen(method, js_name = rotateTo)]
    fn rotate_to(this: &JsMap, bearing: f64, options: &JsValue);

    #[wasm_bindgen(method)]
    fn stop(this: &JsMap);

    #[wasm_bindgen(js_namespace = maplibregl, js_name = Popup)]
    type JsPopup;

    #[wasm_bindgen(constructor, js_namespace = maplibregl, js_class = "Popup")]
    fn new(options: &JsValue) -> JsPopup;

    #[wasm_bindgen(method, js_name = setLngLat)]
    fn set_lng_lat(this: &JsPopup, lng_lat: &JsValue) -> JsPopup;

    #[wasm_bindgen(method, js_name = setHTML)]
    fn set_html(this: &JsPopup, html: &str) -> JsPopup;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &JsPopup, map: &JsMap) -> JsPopup;

    #[wasm_bindgen(method)]
    fn remove(this: &JsPopup) -> JsPopup;

    #[wasm_bindgen(js_namespace = maplibregl, js_name = ScaleControl)]
    type ScaleControl;

    #[wasm_bindgen(constructor, js_namespace = maplibregl, js_class = "ScaleControl")]
    fn new(options: &JsValue) -> ScaleControl;

    #[wasm_bindgen(js_namespace = maplibregl, js_name = NavigationControl)]
    type NavigationControl;

    #[wasm_bindgen(constructor, js_namespace = maplibregl, js_class = "NavigationControl")]
    fn new() -> NavigationControl;

    #[wasm_bindgen(js_namespace = maplibregl, js_name = AttributionControl)]
    type AttributionControl;

    #[wasm_bindgen(constructor, js_namespace = maplibregl, js_class = "AttributionControl")]
    fn new(options: &JsValue) -> AttributionControl;
}

pub fn to_js(value: &Value) -> Result<JsValue, JsValue> {
    js_sys::JSON::parse(&value.to_string())
}

pub fn from_js(value: &JsValue) -> Result<Value, JsValue> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    let text: String = js_sys::JSON::stringify(value)?.into();
    serde_json::from_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn backend_error(err: JsValue) -> MapError {
    MapError::Backend(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

fn feature_target(feature: &FeatureRef) -> Result<JsValue, MapError> {
    to_js(&json!({ "source": feature.source.as_str(), "id": feature.id.to_value() }))
        .map_err(backend_error)
}

/// Decodes a MapLibre layer mouse event.
pub fn pointer_event(
    kind: MapEvent,
    layer: &LayerId,
    event: &JsValue,
) -> Result<PointerEvent, JsValue> {
    let lng_lat = js_sys::Reflect::get(event, &JsValue::from_str("lngLat"))?;
    let lng = js_sys::Reflect::get(&lng_lat, &JsValue::from_str("lng"))?
        .as_f64()
        .unwrap_or_default();
    let lat = js_sys::Reflect::get(&lng_lat, &JsValue::from_str("lat"))?
        .as_f64()
        .unwrap_or_default();
    let raw = js_sys::Reflect::get(event, &JsValue::from_str("features"))?;
    let features = match from_js(&raw)? {
        Value::Array(features) => {
            let collection = json!({ "type": "FeatureCollection", "features": features });
            FeatureCollection::from_geojson_value(&collection)
                .map_err(|e| JsValue::from_str(&e.to_string()))?
                .features
        }
        _ => Vec::new(),
    };
    Ok(PointerEvent {
        kind,
        layer: layer.clone(),
        lng_lat: LngLat::new(lng, lat),
        features,
    })
}

/// A map control that is a single icon button, as MapLibre's `IControl`.
struct IconControl {
    object: js_sys::Object,
    _on_add: Closure<dyn FnMut(JsValue) -> JsValue>,
    _on_remove: Closure<dyn FnMut()>,
}

impl IconControl {
    fn new(
        icon: &str,
        on_click: impl FnMut() + 'static,
    ) -> Result<(Self, web_sys::HtmlElement), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let container: web_sys::HtmlElement = document.create_element("div")?.dyn_into()?;
        container.set_class_name("maplibregl-ctrl maplibregl-ctrl-group");
        let button: web_sys::HtmlElement = document.create_element("button")?.dyn_into()?;
        button.set_class_name("maplibre-ctrl-icon");
        button.style().set_property("background-image", &format!("url({icon})"))?;
        container.append_child(&button)?;

        let on_click = Closure::<dyn FnMut()>::new(on_click);
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();

        let node: JsValue = container.clone().into();
        let on_add =
            Closure::<dyn FnMut(JsValue) -> JsValue>::new(move |_map: JsValue| node.clone());
        let detached = container.clone();
        let on_remove = Closure::<dyn FnMut()>::new(move || detached.remove());

        let object = js_sys::Object::new();
        js_sys::Reflect::set(&object, &JsValue::from_str("onAdd"), on_add.as_ref())?;
        js_sys::Reflect::set(&object, &JsValue::from_str("onRemove"), on_remove.as_ref())?;
        Ok((
            Self {
                object,
                _on_add: on_add,
                _on_remove: on_remove,
            },
            button,
        ))
    }
}

type PointerHandler = fn(MapEvent, &LayerId, &JsValue);

pub struct MapLibreMap {
    map: JsMap,
    popups: HashMap<String, JsPopup>,
    listeners: Vec<Closure<dyn FnMut(JsValue)>>,
    on_pointer: PointerHandler,
    on_rotation_click: fn(),
    rotation: Option<(IconControl, web_sys::HtmlElement)>,
}

impl MapLibreMap {
    /// `style` is the initial style document; overlays are added later.
    pub fn new(
        options: &MapOptions,
        style: &Value,
        on_pointer: PointerHandler,
        on_rotation_click: fn(),
    ) -> Result<Self, JsValue> {
        let mut js_options =
            serde_json::to_value(options).map_err(|e| JsValue::from_str(&e.to_string()))?;
        if let Value::Object(obj) = &mut js_options {
            obj.insert("style".to_string(), style.clone());
            if obj.get("maxBounds").is_some_and(Value::is_null) {
                obj.remove("maxBounds");
            }
        }
        Ok(Self {
            map: JsMap::new(&to_js(&js_options)?),
            popups: HashMap::new(),
            listeners: Vec::new(),
            on_pointer,
            on_rotation_click,
            rotation: None,
        })
    }

    pub fn js(&self) -> &JsMap {
        &self.map
    }

    /// Keeps a host listener alive for the map's lifetime.
    pub fn on_map_event(&mut self, kind: &str, listener: Closure<dyn FnMut(JsValue)>) {
        self.map.on_map(kind, listener.as_ref().unchecked_ref());
        self.listeners.push(listener);
    }

    pub fn set_rotation_icon(&self, icon: &str) {
        if let Some((_, button)) = &self.rotation {
            let _ = button
                .style()
                .set_property("background-image", &format!("url({icon})"));
        }
    }
}

impl MapBackend for MapLibreMap {
    fn add_source(&mut self, id: &LayerId, source: SourceSpec) -> Result<(), MapError> {
        if self.has_source(id) {
            return Err(MapError::DuplicateSource(id.clone()));
        }
        let spec = to_js(&source.to_json()).map_err(backend_error)?;
        self.map.add_source(id.as_str(), &spec).map_err(backend_error)
    }

    fn has_source(&self, id: &LayerId) -> bool {
        !self.map.get_source(id.as_str()).is_undefined()
    }

    fn add_layer(&mut self, layer: LayerSpec, before: Option<&LayerId>) -> Result<(), MapError> {
        if self.has_layer(&layer.id) {
            return Err(MapError::DuplicateLayer(layer.id));
        }
        if !self.has_source(&layer.source) {
            return Err(MapError::UnknownSource(layer.source));
        }
        let spec = to_js(&layer.to_json()).map_err(backend_error)?;
        match before {
            Some(anchor) if !self.has_layer(anchor) => {
                Err(MapError::UnknownAnchor(anchor.clone()))
            }
            Some(anchor) => self
                .map
                .add_layer_before(&spec, anchor.as_str())
                .map_err(backend_error),
            None => self.map.add_layer(&spec).map_err(backend_error),
        }
    }

    fn has_layer(&self, id: &LayerId) -> bool {
        !self.map.get_layer(id.as_str()).is_undefined()
    }

    fn set_filter(&mut self, id: &LayerId, filter: Option<&Expr>) -> Result<(), MapError> {
        if !self.has_layer(id) {
            return Err(MapError::UnknownLayer(id.clone()));
        }
        let filter = match filter {
            Some(expr) => to_js(&expr.to_json()).map_err(backend_error)?,
            None => JsValue::NULL,
        };
        self.map.set_filter(id.as_str(), &filter).map_err(backend_error)
    }

    fn set_layout_property(
        &mut self,
        id: &LayerId,
        name: &str,
        value: Value,
    ) -> Result<(), MapError> {
        if !self.has_layer(id) {
            return Err(MapError::UnknownLayer(id.clone()));
        }
        let value = to_js(&value).map_err(backend_error)?;
        self.map
            .set_layout_property(id.as_str(), name, &value)
            .map_err(backend_error)
    }

    fn set_feature_state(
        &mut self,
        feature: &FeatureRef,
        key: &str,
        value: Value,
    ) -> Result<(), MapError> {
        if !self.has_source(&feature.source) {
            return Err(MapError::UnknownSource(feature.source.clone()));
        }
        let mut state = Map::new();
        state.insert(key.to_string(), value);
        let state = to_js(&Value::Object(state)).map_err(backend_error)?;
        self.map
            .set_feature_state(&feature_target(feature)?, &state)
            .map_err(backend_error)
    }

    fn feature_state(&self, feature: &FeatureRef) -> Map<String, Value> {
        let Ok(target) = feature_target(feature) else {
            return Map::new();
        };
        match from_js(&self.map.get_feature_state(&target)) {
            Ok(Value::Object(state)) => state,
            _ => Map::new(),
        }
    }

    fn on(&mut self, event: MapEvent, layer: &LayerId) {
        let handler = self.on_pointer;
        let id = layer.clone();
        let listener =
            Closure::<dyn FnMut(JsValue)>::new(move |e: JsValue| handler(event, &id, &e));
        self.map
            .on_layer(event.as_str(), layer.as_str(), listener.as_ref().unchecked_ref());
        self.listeners.push(listener);
    }

    fn show_popup(&mut self, key: &str, popup: PopupSpec) {
        if let Some(previous) = self.popups.remove(key) {
            previous.remove();
        }
        let Ok(options) = to_js(&json!({ "closeButton": popup.close_button })) else {
            return;
        };
        let lng_lat = js_sys::Array::of2(
            &JsValue::from_f64(popup.lng_lat.lng),
            &JsValue::from_f64(popup.lng_lat.lat),
        );
        let js_popup = JsPopup::new(&options);
        js_popup.set_lng_lat(&lng_lat);
        js_popup.set_html(&popup.html);
        js_popup.add_to(&self.map);
        self.popups.insert(key.to_string(), js_popup);
    }

    fn remove_popup(&mut self, key: &str) {
        if let Some(popup) = self.popups.remove(key) {
            popup.remove();
        }
    }

    fn set_cursor(&mut self, cursor: &str) {
        let _ = self.map.get_canvas().style().set_property("cursor", cursor);
    }

    fn add_control(&mut self, control: Control, position: Option<ControlPosition>) {
        let position = position.unwrap_or_else(|| control.default_position());
        let built: Result<JsValue, JsValue> = match &control {
            Control::Scale { unit } => {
                to_js(&json!({ "unit": unit })).map(|o| ScaleControl::new(&o).into())
            }
            Control::Navigation => Ok(NavigationControl::new().into()),
            Control::Attribution { compact, custom } => to_js(&json!({
                "compact": compact,
                "customAttribution": custom,
            }))
            .map(|o| AttributionControl::new(&o).into()),
            Control::Rotation { icon } => {
                IconControl::new(icon, self.on_rotation_click).map(|(control, button)| {
                    let object: JsValue = control.object.clone().into();
                    self.rotation = Some((control, button));
                    object
                })
            }
        };
        match built {
            Ok(js) => self.map.add_control(&js, position.as_str()),
            Err(err) => web_sys::console::log_1(&JsValue::from_str(&format!(
                "failed to add {} control: {err:?}",
                control.name()
            ))),
        }
    }

    fn bearing(&self) -> f64 {
        self.map.get_bearing()
    }

    fn rotate_to(&mut self, bearing: f64, options: RotateOptions) {
        let Ok(js_options) = to_js(&json!({ "duration": options.duration_ms })) else {
            return;
        };
        let easing = match options.easing {
            Easing::Linear => js_sys::Function::new_with_args("t", "return t;"),
        };
        let _ = js_sys::Reflect::set(&js_options, &JsValue::from_str("easing"), &easing);
        self.map.rotate_to(bearing, &js_options);
    }

    fn stop(&mut self) {
        self.map.stop();
    }
}
