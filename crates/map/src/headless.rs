use std::collections::{BTreeMap, HashMap, HashSet};

use formats::Feature;
use foundation::{LayerId, LngLat};
use serde_json::{Map, Value};
use style::{EvalContext, Expr, matches};

use crate::backend::{FeatureRef, MapBackend, MapError, MapEvent, PointerEvent};
use crate::camera::Camera;
use crate::spec::{Control, ControlPosition, LayerSpec, MapOptions, PopupSpec, RotateOptions, SourceSpec};

/// In-memory [`MapBackend`]: no pixels, but the same bookkeeping a real map
/// does, with filters evaluated against source data.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    options: MapOptions,
    sources: BTreeMap<LayerId, SourceSpec>,
    /// Bottom to top.
    layers: Vec<LayerSpec>,
    feature_states: HashMap<FeatureRef, Map<String, Value>>,
    subscriptions: HashSet<(MapEvent, LayerId)>,
    popups: BTreeMap<String, PopupSpec>,
    controls: Vec<(Control, ControlPosition)>,
    cursor: String,
    camera: Camera,
    filter_calls: usize,
}

impl HeadlessMap {
    pub fn new(options: MapOptions) -> Self {
        Self {
            camera: Camera::new(options.bearing),
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn layer_order(&self) -> Vec<&LayerId> {
        self.layers.iter().map(|l| &l.id).collect()
    }

    pub fn layer(&self, id: &LayerId) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| &l.id == id)
    }

    pub fn source(&self, id: &LayerId) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    pub fn filter(&self, id: &LayerId) -> Option<&Expr> {
        self.layer(id).and_then(|l| l.filter.as_ref())
    }

    pub fn is_visible(&self, id: &LayerId) -> bool {
        self.layer(id).is_some_and(LayerSpec::is_visible)
    }

    pub fn filter_calls(&self) -> usize {
        self.filter_calls
    }

    /// Features the layer would draw: visible layer, filter passing.
    pub fn rendered_features(&self, id: &LayerId) -> Vec<&Feature> {
        let Some(layer) = self.layer(id).filter(|l| l.is_visible()) else {
            return Vec::new();
        };
        let Some(SourceSpec::GeoJson(data)) = self.sources.get(&layer.source) else {
            return Vec::new();
        };
        let no_state = Map::new();
        data.features
            .iter()
            .filter(|f| {
                let Some(filter) = &layer.filter else {
                    return true;
                };
                let state = f
                    .id
                    .as_ref()
                    .and_then(|fid| {
                        self.feature_states.get(&FeatureRef {
                            source: layer.source.clone(),
                            id: fid.clone(),
                        })
                    })
                    .unwrap_or(&no_state);
                matches(filter, &EvalContext::new(&f.properties).with_state(state))
            })
            .collect()
    }

    pub fn is_subscribed(&self, event: MapEvent, layer: &LayerId) -> bool {
        self.subscriptions.contains(&(event, layer.clone()))
    }

    /// Synthesizes the event a pointer over the `index`-th rendered feature
    /// would produce. `None` when nothing listens or there is no such feature.
    pub fn pointer_event(
        &self,
        kind: MapEvent,
        layer: &LayerId,
        index: usize,
    ) -> Option<PointerEvent> {
        if !self.is_subscribed(kind, layer) {
            return None;
        }
        if kind == MapEvent::MouseLeave {
            return Some(PointerEvent {
                kind,
                layer: layer.clone(),
                lng_lat: self.options.center,
                features: Vec::new(),
            });
        }
        let feature = (*self.rendered_features(layer).get(index)?).clone();
        let lng_lat: LngLat = feature
            .geometry
            .as_ref()
            .and_then(|g| g.anchor())
            .unwrap_or(self.options.center);
        Some(PointerEvent {
            kind,
            layer: layer.clone(),
            lng_lat,
            features: vec![feature],
        })
    }

    pub fn popups(&self) -> &BTreeMap<String, PopupSpec> {
        &self.popups
    }

    pub fn controls(&self) -> &[(Control, ControlPosition)] {
        &self.controls
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn is_moving(&self) -> bool {
        self.camera.is_moving()
    }

    /// Advances camera animations; `true` when one finished.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        self.camera.advance(dt_ms)
    }

    fn layer_mut(&mut self, id: &LayerId) -> Result<&mut LayerSpec, MapError> {
        self.layers
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| MapError::UnknownLayer(id.clone()))
    }
}

impl MapBackend for HeadlessMap {
    fn add_source(&mut self, id: &LayerId, source: SourceSpec) -> Result<(), MapError> {
        if self.sources.contains_key(id) {
            return Err(MapError::DuplicateSource(id.clone()));
        }
        self.sources.insert(id.clone(), source);
        Ok(())
    }

    fn has_source(&self, id: &LayerId) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, layer: LayerSpec, before: Option<&LayerId>) -> Result<(), MapError> {
        if self.has_layer(&layer.id) {
            return Err(MapError::DuplicateLayer(layer.id));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(MapError::UnknownSource(layer.source));
        }
        let at = match before {
            Some(anchor) => self
                .layers
                .iter()
                .position(|l| &l.id == anchor)
                .ok_or_else(|| MapError::UnknownAnchor(anchor.clone()))?,
            None => self.layers.len(),
        };
        self.layers.insert(at, layer);
        Ok(())
    }

    fn has_layer(&self, id: &LayerId) -> bool {
        self.layer(id).is_some()
    }

    fn set_filter(&mut self, layer: &LayerId, filter: Option<&Expr>) -> Result<(), MapError> {
        self.layer_mut(layer)?.filter = filter.cloned();
        self.filter_calls += 1;
        Ok(())
    }

    fn set_layout_property(
        &mut self,
        layer: &LayerId,
        name: &str,
        value: Value,
    ) -> Result<(), MapError> {
        self.layer_mut(layer)?.layout.insert(name.to_string(), value);
        Ok(())
    }

    fn set_feature_state(
        &mut self,
        feature: &FeatureRef,
        key: &str,
        value: Value,
    ) -> Result<(), MapError> {
        if !self.sources.contains_key(&feature.source) {
            return Err(MapError::UnknownSource(feature.source.clone()));
        }
        self.feature_states
            .entry(feature.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn feature_state(&self, feature: &FeatureRef) -> Map<String, Value> {
        self.feature_states.get(feature).cloned().unwrap_or_default()
    }

    fn on(&mut self, event: MapEvent, layer: &LayerId) {
        self.subscriptions.insert((event, layer.clone()));
    }

    fn show_popup(&mut self, key: &str, popup: PopupSpec) {
        self.popups.insert(key.to_string(), popup);
    }

    fn remove_popup(&mut self, key: &str) {
        self.popups.remove(key);
    }

    fn set_cursor(&mut self, cursor: &str) {
        self.cursor = cursor.to_string();
    }

    fn add_control(&mut self, control: Control, position: Option<ControlPosition>) {
        let position = position.unwrap_or_else(|| control.default_position());
        self.controls.push((control, position));
    }

    fn bearing(&self) -> f64 {
        self.camera.bearing()
    }

    fn rotate_to(&mut self, bearing: f64, options: RotateOptions) {
        self.camera.rotate_to(bearing, options);
    }

    fn stop(&mut self) {
        self.camera.stop();
    }
}
