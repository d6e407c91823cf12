use std::env;

use chrono::NaiveDate;
use foundation::{LngLat, LngLatBounds};
use map::MapOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "invalid config file: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseTiles {
    /// XYZ template with `{z}/{x}/{y}` placeholders.
    pub url: String,
    pub tile_size: u32,
    pub attribution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub property: String,
    pub known: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SliderConfig {
    pub epoch: NaiveDate,
    pub steps: u32,
    pub tick_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RotationConfig {
    /// Animation length per pixel of viewport width.
    pub ms_per_px: f64,
    /// Degrees turned per pixel of viewport width.
    pub deg_per_px: f64,
    pub enabled_icon: String,
    pub disabled_icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerConfig {
    pub map: MapOptions,
    pub base_tiles: BaseTiles,
    pub main_attribution: String,
    /// Sources are fetched from `<data_url>/<sourceLayerName>.geojson`.
    pub data_url: String,
    pub categories: CategoryConfig,
    pub slider: SliderConfig,
    pub rotation: RotationConfig,
}

impl Default for BaseTiles {
    fn default() -> Self {
        Self {
            url: "https://geoserveis.icgc.cat/servei/catalunya/mapa-base/wmts/administratiu/MON3857NW/{z}/{x}/{y}.png".to_string(),
            tile_size: 256,
            attribution: "<b>ContextMaps</b>: <a href=\"https://www.icgc.cat/ca/Eines-i-visors/Visors/ContextMaps\">Institut Cartogràfic i Geològic de Catalunya</a>".to_string(),
        }
    }
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            property: "category".to_string(),
            known: ["Obstacles", "Unevenness", "Width"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            epoch: NaiveDate::from_ymd_opt(2024, 7, 22).unwrap_or_default(),
            steps: 50,
            tick_ms: 100.0,
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            ms_per_px: 12.5,
            deg_per_px: 0.046875,
            enabled_icon: "icons/arrow-circle.svg".to_string(),
            disabled_icon: "icons/arrow-circle-crossed.svg".to_string(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::barcelona()
    }
}

impl ViewerConfig {
    pub fn barcelona() -> Self {
        Self {
            map: MapOptions {
                container: "map".to_string(),
                center: LngLat::new(2.16067522513251, 41.39093798964388),
                zoom: 12.0,
                min_zoom: 11.5,
                max_zoom: 16.0,
                pitch: 45.0,
                bearing: -45.0,
                max_bounds: Some(LngLatBounds {
                    sw: LngLat::new(1.5703315311961603, 40.972277499709804),
                    ne: LngLat::new(2.7920111626752373, 41.84544156594339),
                }),
                attribution_control: false,
            },
            base_tiles: BaseTiles::default(),
            main_attribution: "Map by BSC - DataViz Team".to_string(),
            data_url: "data".to_string(),
            categories: CategoryConfig::default(),
            slider: SliderConfig::default(),
            rotation: RotationConfig::default(),
        }
    }

    /// Missing keys fall back to the Barcelona defaults. A `map` object,
    /// when present, must be complete.
    pub fn from_json_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.map;
        if !(m.min_zoom <= m.zoom && m.zoom <= m.max_zoom) {
            return Err(ConfigError::Invalid(format!(
                "zoom {} outside [{}, {}]",
                m.zoom, m.min_zoom, m.max_zoom
            )));
        }
        if let Some(bounds) = m.max_bounds
            && !bounds.contains(m.center)
        {
            return Err(ConfigError::Invalid("center lies outside maxBounds".to_string()));
        }
        if self.slider.steps == 0 {
            return Err(ConfigError::Invalid("slider needs at least one step".to_string()));
        }
        if !(self.slider.tick_ms > 0.0) {
            return Err(ConfigError::Invalid("slider tick must be positive".to_string()));
        }
        if self.categories.property.trim().is_empty() {
            return Err(ConfigError::Invalid("category property is empty".to_string()));
        }
        Ok(())
    }

    /// `IMPD_DATA_URL`, `IMPD_TILE_URL` and `IMPD_CATEGORY_PROPERTY` win over
    /// file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("IMPD_DATA_URL") {
            self.data_url = v;
        }
        if let Some(v) = lookup("IMPD_TILE_URL") {
            self.base_tiles.url = v;
        }
        if let Some(v) = lookup("IMPD_CATEGORY_PROPERTY") {
            self.categories.property = v;
        }
    }
}
