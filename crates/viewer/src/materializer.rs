//! Turning descriptors into map sources and layers.
//!
//! Fetches complete in any order, so the stacking order cannot come from
//! insertion order. Before any data arrives, one invisible placeholder layer
//! per descriptor is stacked bottom to top (`layerIndex0` lowest); descriptor
//! `i` is later inserted directly below placeholder `i`. Whatever the arrival
//! order, the resulting order is the registry order.

use std::collections::BTreeSet;

use formats::FeatureCollection;
use foundation::LayerId;
use layers::{LayerDescriptor, PopupTrigger};
use map::{LayerSpec, MapBackend, MapError, MapEvent, SourceSpec};
use tracing::{info, warn};

use crate::error::FetchError;

pub const EMPTY_SOURCE: &str = "empty";

pub fn layer_spec(descriptor: &LayerDescriptor) -> LayerSpec {
    LayerSpec::new(
        descriptor.id().clone(),
        descriptor.layer_type.as_str(),
        descriptor.id().clone(),
    )
    .with_paint(descriptor.symbolization.clone())
    .with_layout("visibility", descriptor.states.visible.as_str())
}

/// Map events a descriptor's flags subscribe to, without repeats.
pub fn subscriptions(descriptor: &LayerDescriptor) -> Vec<MapEvent> {
    let mut events = Vec::new();
    let mut want = |e: MapEvent| {
        if !events.contains(&e) {
            events.push(e);
        }
    };
    if descriptor.states.pop_ups {
        want(match descriptor.popup.trigger {
            PopupTrigger::Click => MapEvent::Click,
            PopupTrigger::Hover => MapEvent::MouseMove,
        });
        want(MapEvent::MouseEnter);
        want(MapEvent::MouseLeave);
    }
    if descriptor.states.highlight {
        want(MapEvent::MouseMove);
        want(MapEvent::MouseLeave);
    }
    events
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Materialized { features: usize },
    Skipped { reason: String },
}

#[derive(Debug, Default)]
pub struct LayerMaterializer {
    slots: usize,
    materialized: BTreeSet<LayerId>,
    skipped: BTreeSet<LayerId>,
}

impl LayerMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot_count(&self) -> usize {
        self.slots
    }

    pub fn is_materialized(&self, id: &LayerId) -> bool {
        self.materialized.contains(id)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &LayerId> {
        self.skipped.iter()
    }

    /// The empty source and `count` placeholder layers.
    pub fn reserve_slots<M: MapBackend>(
        &mut self,
        map: &mut M,
        count: usize,
    ) -> Result<(), MapError> {
        let empty = LayerId::new(EMPTY_SOURCE);
        map.add_source(&empty, SourceSpec::empty_geojson())?;
        for i in 0..count {
            map.add_layer(LayerSpec::new(LayerId::slot(i), "symbol", empty.clone()), None)?;
        }
        self.slots = count;
        Ok(())
    }

    /// Registers source, layer and event interest for descriptor `index`.
    /// A failed fetch is logged and the layer left out entirely.
    pub fn materialize<M: MapBackend>(
        &mut self,
        map: &mut M,
        index: usize,
        descriptor: &LayerDescriptor,
        data: Result<FeatureCollection, FetchError>,
    ) -> Result<Outcome, MapError> {
        let id = descriptor.id();
        let data = match data {
            Ok(data) => data,
            Err(err) => {
                warn!("skipping layer {id}: {err}");
                self.skipped.insert(id.clone());
                return Ok(Outcome::Skipped {
                    reason: err.to_string(),
                });
            }
        };
        if index >= self.slots {
            return Err(MapError::UnknownAnchor(LayerId::slot(index)));
        }

        let features = data.len();
        map.add_source(id, SourceSpec::GeoJson(data))?;
        map.add_layer(layer_spec(descriptor), Some(&LayerId::slot(index)))?;
        for event in subscriptions(descriptor) {
            map.on(event, id);
        }
        self.materialized.insert(id.clone());
        info!("materialized layer {id} with {features} features");
        Ok(Outcome::Materialized { features })
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerMaterializer, Outcome, subscriptions};
    use crate::error::FetchError;
    use formats::FeatureCollection;
    use foundation::LayerId;
    use layers::{LayerDescriptor, PopupTrigger, barcelona};
    use map::{HeadlessMap, MapBackend, MapError, MapEvent, MapOptions};
    use pretty_assertions::assert_eq;

    fn order(map: &HeadlessMap) -> Vec<String> {
        map.layer_order()
            .iter()
            .map(|id| id.to_string())
            .filter(|id| !id.starts_with("layerIndex"))
            .collect()
    }

    fn run(arrival: &[usize]) -> Vec<String> {
        let descriptors = barcelona::descriptors();
        let mut map = HeadlessMap::new(MapOptions::default());
        let mut m = LayerMaterializer::new();
        m.reserve_slots(&mut map, descriptors.len()).unwrap();
        for &i in arrival {
            m.materialize(&mut map, i, &descriptors[i], Ok(FeatureCollection::empty()))
                .unwrap();
        }
        order(&map)
    }

    #[test]
    fn slots_precede_data() {
        let mut map = HeadlessMap::new(MapOptions::default());
        let mut m = LayerMaterializer::new();
        m.reserve_slots(&mut map, 3).unwrap();
        assert_eq!(m.slot_count(), 3);
        let ids: Vec<_> = map.layer_order().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["layerIndex0", "layerIndex1", "layerIndex2"]);
    }

    #[test]
    fn any_arrival_order_gives_registry_order() {
        let expected: Vec<String> = barcelona::descriptors()
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        for arrival in [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]] {
            assert_eq!(run(&arrival), expected, "arrival {arrival:?}");
        }
    }

    #[test]
    fn partial_arrival_keeps_relative_order() {
        assert_eq!(run(&[3, 1]), vec!["IMPD_obstacles", "IMPD_width"]);
    }

    #[test]
    fn fetch_failure_skips_the_layer() {
        let descriptors = barcelona::descriptors();
        let mut map = HeadlessMap::new(MapOptions::default());
        let mut m = LayerMaterializer::new();
        m.reserve_slots(&mut map, descriptors.len()).unwrap();
        let out = m
            .materialize(
                &mut map,
                1,
                &descriptors[1],
                Err(FetchError::NotFound("IMPD_obstacles.geojson".to_string())),
            )
            .unwrap();
        assert!(matches!(out, Outcome::Skipped { .. }));
        let id = LayerId::new("IMPD_obstacles");
        assert!(!map.has_source(&id));
        assert!(!map.has_layer(&id));
        assert_eq!(m.skipped().collect::<Vec<_>>(), vec![&id]);
    }

    #[test]
    fn materializing_twice_is_an_error() {
        let descriptors = barcelona::descriptors();
        let mut map = HeadlessMap::new(MapOptions::default());
        let mut m = LayerMaterializer::new();
        m.reserve_slots(&mut map, descriptors.len()).unwrap();
        m.materialize(&mut map, 0, &descriptors[0], Ok(FeatureCollection::empty()))
            .unwrap();
        let err = m
            .materialize(&mut map, 0, &descriptors[0], Ok(FeatureCollection::empty()))
            .unwrap_err();
        assert!(matches!(err, MapError::DuplicateSource(_)));
    }

    #[test]
    fn subscriptions_follow_flags() {
        let mut d: LayerDescriptor = barcelona::descriptors().remove(1);
        assert_eq!(
            subscriptions(&d),
            vec![MapEvent::Click, MapEvent::MouseEnter, MapEvent::MouseLeave]
        );

        d.states.pop_ups = false;
        d.states.highlight = true;
        assert_eq!(subscriptions(&d), vec![MapEvent::MouseMove, MapEvent::MouseLeave]);

        d.states.pop_ups = true;
        d.popup.trigger = PopupTrigger::Hover;
        assert_eq!(
            subscriptions(&d),
            vec![MapEvent::MouseMove, MapEvent::MouseEnter, MapEvent::MouseLeave]
        );
    }

    #[test]
    fn initial_visibility_comes_from_the_descriptor() {
        let mut descriptors = barcelona::descriptors();
        descriptors[0].states.visible = layers::Visibility::None;
        let mut map = HeadlessMap::new(MapOptions::default());
        let mut m = LayerMaterializer::new();
        m.reserve_slots(&mut map, descriptors.len()).unwrap();
        m.materialize(&mut map, 0, &descriptors[0], Ok(FeatureCollection::empty()))
            .unwrap();
        let id = descriptors[0].id().clone();
        assert!(!map.is_visible(&id));
        assert!(map.is_subscribed(MapEvent::Click, &id));
    }
}
