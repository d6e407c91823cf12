use std::collections::HashMap;

use formats::FeatureCollection;
use foundation::{EpochSeconds, LayerId, add_days, date_to_epoch};
use layers::LayerRegistry;
use map::{MapBackend, PointerEvent};
use runtime::{Event, EventBus, Frame};
use tracing::{debug, info};

use crate::bootstrap::bootstrap;
use crate::config::ViewerConfig;
use crate::controls::{CategoryChecklist, LayerToggle, layer_toggles, set_layer_visibility};
use crate::error::{FetchError, ViewerError};
use crate::filters::FilterCombinator;
use crate::interaction::InteractionHandlers;
use crate::materializer::{LayerMaterializer, Outcome};
use crate::rotation::RotationControl;
use crate::slider::{DateRangeInputs, DateRangeUpdate, DateSlider};

/// The whole application state, driven by the host.
///
/// Every entry point takes the map explicitly, so one `Viewer` works
/// against MapLibre in the browser and [`map::HeadlessMap`] alike. Notable
/// transitions are recorded on an [`EventBus`] for hosts and tests.
#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    registry: LayerRegistry,
    materializer: LayerMaterializer,
    filters: FilterCombinator,
    categories: CategoryChecklist,
    slider: DateSlider,
    range: DateRangeInputs,
    rotation: RotationControl,
    interactions: InteractionHandlers,
    /// Checkbox changes made before the layer's data arrived.
    pending_visibility: HashMap<LayerId, bool>,
    frame: Frame,
    bus: EventBus,
}

impl Viewer {
    pub fn new(config: ViewerConfig, registry: LayerRegistry) -> Result<Self, ViewerError> {
        config.validate()?;
        registry.validate()?;
        let filters =
            FilterCombinator::new(config.categories.property.clone(), registry.membership());
        Ok(Self {
            categories: CategoryChecklist::new(config.categories.known.iter().cloned()),
            slider: DateSlider::new(&config.slider),
            rotation: RotationControl::new(config.rotation.clone()),
            materializer: LayerMaterializer::new(),
            interactions: InteractionHandlers::new(),
            pending_visibility: HashMap::new(),
            range: DateRangeInputs::default(),
            frame: Frame::first(),
            bus: EventBus::new(),
            filters,
            config,
            registry,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn filters(&self) -> &FilterCombinator {
        &self.filters
    }

    pub fn categories(&self) -> &CategoryChecklist {
        &self.categories
    }

    pub fn slider(&self) -> &DateSlider {
        &self.slider
    }

    pub fn rotation(&self) -> &RotationControl {
        &self.rotation
    }

    pub fn interactions(&self) -> &InteractionHandlers {
        &self.interactions
    }

    pub fn materializer(&self) -> &LayerMaterializer {
        &self.materializer
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    pub fn layer_toggles(&self) -> Vec<LayerToggle> {
        layer_toggles(&self.registry)
    }

    /// Base map, controls and one placeholder per registry entry. Call once
    /// the map reports it has loaded, before any data arrives.
    pub fn start<M: MapBackend>(&mut self, map: &mut M) -> Result<(), ViewerError> {
        bootstrap(map, &self.config, &self.registry)?;
        self.materializer.reserve_slots(map, self.registry.len())?;
        self.bus.emit(
            self.frame,
            "map.ready",
            format!("{} layer slots reserved", self.registry.len()),
        );
        Ok(())
    }

    /// Hands over one layer's fetch result, in whatever order they complete.
    pub fn on_source_loaded<M: MapBackend>(
        &mut self,
        map: &mut M,
        id: &LayerId,
        data: Result<FeatureCollection, FetchError>,
    ) -> Result<Outcome, ViewerError> {
        let index = self
            .registry
            .index_of(id.as_str())
            .ok_or_else(|| ViewerError::UnknownLayer(id.to_string()))?;
        let descriptor = &self.registry.descriptors()[index];
        let outcome = self.materializer.materialize(map, index, descriptor, data)?;
        let pending = self.pending_visibility.remove(id);
        match &outcome {
            Outcome::Materialized { features } => {
                self.interactions.register(descriptor);
                self.filters.apply_to(map, id)?;
                if let Some(checked) = pending {
                    set_layer_visibility(map, id, checked)?;
                }
                self.bus.emit(
                    self.frame,
                    "layer.materialized",
                    format!("{id}: {features} features"),
                );
            }
            Outcome::Skipped { reason } => {
                self.bus
                    .emit(self.frame, "layer.skipped", format!("{id}: {reason}"));
            }
        }
        Ok(outcome)
    }

    /// Forwards a map pointer event; `false` if no handler took it.
    pub fn handle_pointer<M: MapBackend>(
        &mut self,
        map: &mut M,
        event: &PointerEvent,
    ) -> Result<bool, ViewerError> {
        Ok(self.interactions.handle(map, event)?)
    }

    pub fn set_layer_visible<M: MapBackend>(
        &mut self,
        map: &mut M,
        id: &LayerId,
        checked: bool,
    ) -> Result<(), ViewerError> {
        if self.registry.get(id.as_str()).is_none() {
            return Err(ViewerError::UnknownLayer(id.to_string()));
        }
        if !self.materializer.is_materialized(id) {
            debug!("visibility of {id} changed before its data arrived");
            self.pending_visibility.insert(id.clone(), checked);
            return Ok(());
        }
        set_layer_visibility(map, id, checked)?;
        Ok(())
    }

    /// One category checkbox, or the master when `checkbox_id` is
    /// [`crate::controls::ALL_CATEGORIES_ID`].
    pub fn toggle_category<M: MapBackend>(
        &mut self,
        map: &mut M,
        checkbox_id: &str,
        checked: bool,
    ) -> Result<usize, ViewerError> {
        if !self.categories.on_change(checkbox_id, checked) {
            debug!("ignoring unknown category checkbox {checkbox_id}");
            return Ok(0);
        }
        self.filters.set_categories(&self.categories.selected());
        self.apply_filters(map)
    }

    /// Starts playback; the first day is applied on the first tick.
    pub fn play(&mut self) -> bool {
        if !self.slider.play() {
            return false;
        }
        self.bus.emit(self.frame, "slider.started", self.slider.label());
        true
    }

    pub fn stop_slider(&mut self) -> bool {
        let stopped = self.slider.stop();
        if stopped {
            self.bus.emit(self.frame, "slider.stopped", self.slider.label());
        }
        stopped
    }

    /// Manual slider input. Returns the new date label, `None` while playing.
    pub fn drag_slider<M: MapBackend>(
        &mut self,
        map: &mut M,
        value: u32,
    ) -> Result<Option<String>, ViewerError> {
        let Some(cursor) = self.slider.set_value(value) else {
            return Ok(None);
        };
        self.set_cursor(map, cursor)?;
        Ok(Some(self.slider.label()))
    }

    /// Raw date input values; the normalized values go back to the inputs.
    pub fn set_date_range<M: MapBackend>(
        &mut self,
        map: &mut M,
        start: &str,
        end: &str,
    ) -> Result<DateRangeUpdate, ViewerError> {
        let update = self.range.update(start, end);
        self.filters.set_date_range(self.range.span());
        self.apply_filters(map)?;
        Ok(update)
    }

    /// Returns the icon the rotation control should now show.
    pub fn toggle_rotation<M: MapBackend>(&mut self, map: &mut M, width_px: f64) -> String {
        let icon = self.rotation.toggle(map, width_px).to_string();
        let state = if self.rotation.is_enabled() { "on" } else { "off" };
        self.bus.emit(self.frame, "rotation.toggled", state);
        icon
    }

    pub fn pointer_down(&mut self) {
        self.rotation.set_user_interacting(true);
    }

    pub fn pointer_up(&mut self) {
        self.rotation.set_user_interacting(false);
    }

    /// Advances host time by `dt_ms`. Each slider step due in that window
    /// moves the cursor and refilters, in order.
    pub fn tick<M: MapBackend>(&mut self, map: &mut M, dt_ms: f64) -> Result<(), ViewerError> {
        self.frame = self.frame.advance(dt_ms);
        let advance = self.slider.advance(dt_ms);
        for step in &advance.steps {
            let cursor = date_to_epoch(add_days(self.config.slider.epoch, *step));
            self.set_cursor(map, cursor)?;
        }
        if advance.finished {
            info!("slider finished on {}", self.slider.label());
            self.bus
                .emit(self.frame, "slider.finished", self.slider.label());
        }
        Ok(())
    }

    fn set_cursor<M: MapBackend>(
        &mut self,
        map: &mut M,
        cursor: EpochSeconds,
    ) -> Result<usize, ViewerError> {
        self.filters.set_cursor(cursor);
        self.apply_filters(map)
    }

    fn apply_filters<M: MapBackend>(&mut self, map: &mut M) -> Result<usize, ViewerError> {
        let applied = self.filters.apply(map)?;
        self.bus
            .emit(self.frame, "filter.applied", format!("{applied} layers"));
        Ok(applied)
    }
}
