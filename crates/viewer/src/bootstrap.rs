use foundation::LayerId;
use layers::LayerRegistry;
use map::{Control, ControlPosition, LayerSpec, MapBackend, MapError, SourceSpec};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::config::ViewerConfig;
use crate::fetch::source_url;
use crate::materializer::layer_spec;

pub const BASE_SOURCE: &str = "raster-tiles";
pub const BASE_LAYER: &str = "wmts-layer";

/// `main | a | b`, skipping blank layer attributions.
pub fn compose_attribution<'a>(
    main: &'a str,
    layers: impl IntoIterator<Item = &'a str>,
) -> String {
    std::iter::once(main)
        .chain(layers)
        .filter(|a| !a.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn base_source(config: &ViewerConfig) -> SourceSpec {
    SourceSpec::Raster {
        tiles: vec![config.base_tiles.url.clone()],
        tile_size: config.base_tiles.tile_size,
        attribution: config.base_tiles.attribution.clone(),
    }
}

pub fn base_layer() -> LayerSpec {
    LayerSpec::new(LayerId::new(BASE_LAYER), "raster", LayerId::new(BASE_SOURCE))
        .with_zoom_range(0.0, 22.0)
}

/// Controls in the order they are added, with explicit positions where the
/// map library default is not wanted.
pub fn controls(
    config: &ViewerConfig,
    registry: &LayerRegistry,
) -> Vec<(Control, Option<ControlPosition>)> {
    vec![
        (
            Control::Scale {
                unit: "metric".to_string(),
            },
            None,
        ),
        (Control::Navigation, Some(ControlPosition::TopLeft)),
        (
            Control::Attribution {
                compact: true,
                custom: compose_attribution(&config.main_attribution, registry.attributions()),
            },
            None,
        ),
        (
            Control::Rotation {
                icon: config.rotation.disabled_icon.clone(),
            },
            Some(ControlPosition::TopLeft),
        ),
    ]
}

/// Base tiles and fixed controls.
pub fn bootstrap<M: MapBackend>(
    map: &mut M,
    config: &ViewerConfig,
    registry: &LayerRegistry,
) -> Result<(), MapError> {
    map.add_source(&LayerId::new(BASE_SOURCE), base_source(config))?;
    map.add_layer(base_layer(), None)?;
    for (control, position) in controls(config, registry) {
        map.add_control(control, position);
    }
    info!("map bootstrapped with {} overlay layers", registry.len());
    Ok(())
}

/// A standalone MapLibre style document: base tiles plus every registry
/// layer, with GeoJSON sources referenced by URL.
pub fn style_document(config: &ViewerConfig, registry: &LayerRegistry) -> Value {
    let mut sources = Map::new();
    sources.insert(BASE_SOURCE.to_string(), base_source(config).to_json());
    let mut layers = vec![base_layer().to_json()];
    for d in registry {
        sources.insert(
            d.id().to_string(),
            json!({
                "type": d.source_type.as_str(),
                "data": source_url(&config.data_url, d.id()),
                "attribution": d.attribution,
            }),
        );
        layers.push(layer_spec(d).to_json());
    }
    json!({
        "version": 8,
        "name": "IMPD accessibility map",
        "center": config.map.center,
        "zoom": config.map.zoom,
        "pitch": config.map.pitch,
        "bearing": config.map.bearing,
        "sources": sources,
        "layers": layers,
    })
}
