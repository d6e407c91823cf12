//! Command-line helpers around the viewer core: registry checks, style and
//! filter previews, and headless replays of a viewing session.

use std::fs;
use std::path::{Path, PathBuf};

use foundation::LayerId;
use layers::{LayerRegistry, barcelona};
use map::{HeadlessMap, MapBackend, MapEvent};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;
use viewer::controls::ALL_CATEGORIES_ID;
use viewer::fetch::{SourceFetcher, fetch_all};
use viewer::slider::DateRangeInputs;
use viewer::{FilterCombinator, Viewer, ViewerConfig, ViewerError};

/// Camera animation step used by replays.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(Debug)]
pub enum ToolError {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
    Viewer(ViewerError),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Io { path, source } => write!(f, "read {}: {source}", path.display()),
            ToolError::Json(e) => write!(f, "json: {e}"),
            ToolError::Viewer(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Io { source, .. } => Some(source),
            ToolError::Json(e) => Some(e),
            ToolError::Viewer(e) => Some(e),
        }
    }
}

impl From<ViewerError> for ToolError {
    fn from(e: ViewerError) -> Self {
        ToolError::Viewer(e)
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::Json(e)
    }
}

fn read(path: &Path) -> Result<String, ToolError> {
    fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// The Barcelona defaults, or a JSON file, then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig, ToolError> {
    let mut config = match path {
        Some(path) => ViewerConfig::from_json_str(&read(path)?).map_err(ViewerError::from)?,
        None => ViewerConfig::barcelona(),
    };
    config.apply_env_overrides();
    config.validate().map_err(ViewerError::from)?;
    Ok(config)
}

pub fn load_registry(path: Option<&Path>) -> Result<LayerRegistry, ToolError> {
    let registry = match path {
        Some(path) => LayerRegistry::from_json_str(&read(path)?),
        None => barcelona::registry(),
    };
    Ok(registry.map_err(ViewerError::from)?)
}

/// One line per layer, in stacking order.
pub fn check_report(registry: &LayerRegistry) -> String {
    let membership = registry.membership();
    let mut out = String::new();
    for (i, d) in registry.iter().enumerate() {
        let popups = if d.states.pop_ups {
            d.popup.trigger.as_str()
        } else {
            "off"
        };
        out.push_str(&format!(
            "{i}\t{}\t{}\tvisible={} popups={popups} highlight={} filtered={} dated={} attribution={}\n",
            d.id(),
            d.layer_type.as_str(),
            d.states.visible.is_visible(),
            d.states.highlight,
            membership.filtered.contains(d.id()),
            membership.date_range.contains(d.id()),
            d.has_attribution(),
        ));
    }
    out
}

/// The filter each registry layer would carry after the given inputs, as
/// `{layer id: filter or null}`.
pub fn filter_preview(
    config: &ViewerConfig,
    registry: &LayerRegistry,
    categories: Option<&[String]>,
    start: Option<&str>,
    end: Option<&str>,
) -> Value {
    let mut filters =
        FilterCombinator::new(config.categories.property.clone(), registry.membership());
    if let Some(categories) = categories {
        filters.set_categories(categories);
    }
    let mut range = DateRangeInputs::default();
    range.update(start.unwrap_or_default(), end.unwrap_or_default());
    filters.set_date_range(range.span());

    let mut out = Map::new();
    for d in registry {
        let filter = filters.filter_for(d.id()).map(|f| f.to_json());
        out.insert(d.id().to_string(), filter.unwrap_or(Value::Null));
    }
    Value::Object(out)
}

#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    /// Categories left checked; `None` keeps them all.
    pub categories: Option<Vec<String>>,
    /// Click the first rendered feature of every layer.
    pub click: bool,
    /// Run the date slider to the end.
    pub play: bool,
    /// Turn rotation on for a viewport this wide and let it finish.
    pub rotate_width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub id: String,
    pub loaded: bool,
    pub features: usize,
    pub rendered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLine {
    pub frame: u64,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub layer_order: Vec<String>,
    pub layers: Vec<LayerSummary>,
    pub popups: Vec<String>,
    pub slider_label: String,
    pub bearing: f64,
    pub events: Vec<EventLine>,
}

/// Replays a session against [`HeadlessMap`]: load every layer as it
/// arrives, then apply the scripted interactions.
pub async fn simulate<F: SourceFetcher>(
    config: ViewerConfig,
    registry: LayerRegistry,
    fetcher: &F,
    options: &SimulateOptions,
) -> Result<SimulationReport, ViewerError> {
    let mut map = HeadlessMap::new(config.map.clone());
    let mut viewer = Viewer::new(config, registry)?;
    viewer.start(&mut map)?;

    for (id, result) in fetch_all(fetcher, viewer.registry()).await {
        viewer.on_source_loaded(&mut map, &id, result)?;
    }
    let ids: Vec<LayerId> = viewer.registry().iter().map(|d| d.id().clone()).collect();

    if let Some(categories) = &options.categories {
        viewer.toggle_category(&mut map, ALL_CATEGORIES_ID, false)?;
        for category in categories {
            viewer.toggle_category(&mut map, category, true)?;
        }
    }

    if options.click {
        for id in &ids {
            if let Some(event) = map.pointer_event(MapEvent::Click, id, 0) {
                viewer.handle_pointer(&mut map, &event)?;
            }
        }
    }

    if options.play && viewer.play() {
        let tick = viewer.config().slider.tick_ms;
        while viewer.slider().is_playing() {
            viewer.tick(&mut map, tick)?;
        }
    }

    if let Some(width) = options.rotate_width {
        viewer.toggle_rotation(&mut map, width);
        while map.is_moving() {
            map.advance(FRAME_MS);
            viewer.tick(&mut map, FRAME_MS)?;
        }
    }

    let layers = ids
        .iter()
        .map(|id| LayerSummary {
            id: id.to_string(),
            loaded: viewer.materializer().is_materialized(id),
            features: match map.source(id) {
                Some(map::SourceSpec::GeoJson(data)) => data.len(),
                _ => 0,
            },
            rendered: map.rendered_features(id).len(),
        })
        .collect();
    info!("simulation finished after {} frames", viewer.frame().index);

    Ok(SimulationReport {
        layer_order: map.layer_order().iter().map(|id| id.to_string()).collect(),
        layers,
        popups: map.popups().keys().cloned().collect(),
        slider_label: viewer.slider().label(),
        bearing: map.bearing(),
        events: viewer
            .drain_events()
            .into_iter()
            .map(|e| EventLine {
                frame: e.frame_index,
                kind: e.kind,
                message: e.message,
            })
            .collect(),
    })
}
