//! State behind the page controls: layer checkboxes, the category
//! checklist and legends. The front end owns the DOM; this owns the rules.

use foundation::LayerId;
use layers::{LayerDescriptor, LayerRegistry, Legend, Visibility};
use map::{MapBackend, MapError};
use serde_json::Value;

use crate::interaction::escape_html;

const CHECKBOX_PREFIX: &str = "checkbox-";
pub const ALL_CATEGORIES_ID: &str = "all-checkbox";

pub fn checkbox_id(layer: &LayerId) -> String {
    format!("{CHECKBOX_PREFIX}{layer}")
}

pub fn layer_from_checkbox_id(id: &str) -> Option<LayerId> {
    id.strip_prefix(CHECKBOX_PREFIX)
        .filter(|rest| !rest.is_empty())
        .map(LayerId::new)
}

pub fn set_layer_visibility<M: MapBackend>(
    map: &mut M,
    layer: &LayerId,
    checked: bool,
) -> Result<(), MapError> {
    map.set_layout_property(
        layer,
        "visibility",
        Value::from(Visibility::from_checked(checked).as_str()),
    )
}

/// One row of the layer panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerToggle {
    pub checkbox_id: String,
    pub label: String,
    pub checked: bool,
    pub legend: LegendView,
}

impl LayerToggle {
    pub fn from_descriptor(d: &LayerDescriptor) -> Self {
        Self {
            checkbox_id: checkbox_id(d.id()),
            label: d.name.clone(),
            checked: d.states.visible.is_visible(),
            legend: LegendView::from(&d.legend),
        }
    }
}

pub fn layer_toggles(registry: &LayerRegistry) -> Vec<LayerToggle> {
    registry.iter().map(LayerToggle::from_descriptor).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendSwatch {
    pub color: String,
    pub label: String,
    pub height: String,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendView {
    pub id: String,
    pub class: String,
    pub swatches: Vec<LegendSwatch>,
}

impl From<&Legend> for LegendView {
    fn from(legend: &Legend) -> Self {
        Self {
            id: legend.id.clone(),
            class: legend.class.clone(),
            swatches: legend
                .items
                .iter()
                .map(|item| LegendSwatch {
                    color: item.background_color.clone(),
                    label: item.label(),
                    height: item.style_height.clone(),
                    display: item.display.clone(),
                })
                .collect(),
        }
    }
}

impl LegendView {
    pub fn to_html(&self) -> String {
        let mut html = format!(
            r#"<div id="{}" class="{}">"#,
            escape_html(&self.id),
            escape_html(&self.class)
        );
        for s in &self.swatches {
            html.push_str(&format!(
                r#"<div><span style="background-color: {}; height: {}; display: {}"></span><i>{}</i></div>"#,
                escape_html(&s.color),
                escape_html(&s.height),
                escape_html(&s.display),
                escape_html(&s.label)
            ));
        }
        html.push_str("</div>");
        html
    }
}

/// Category checkboxes plus the "All" master, all checked initially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChecklist {
    categories: Vec<(String, bool)>,
}

impl CategoryChecklist {
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: known.into_iter().map(|c| (c.into(), true)).collect(),
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, bool)> {
        self.categories.iter().map(|(c, on)| (c.as_str(), *on))
    }

    pub fn all_checked(&self) -> bool {
        self.categories.iter().all(|(_, on)| *on)
    }

    pub fn set_all(&mut self, checked: bool) {
        for (_, on) in &mut self.categories {
            *on = checked;
        }
    }

    /// `false` for an unknown category.
    pub fn set(&mut self, category: &str, checked: bool) -> bool {
        match self.categories.iter_mut().find(|(c, _)| c == category) {
            Some((_, on)) => {
                *on = checked;
                true
            }
            None => false,
        }
    }

    /// Routes a checkbox change by element id, including the master.
    pub fn on_change(&mut self, checkbox_id: &str, checked: bool) -> bool {
        if checkbox_id == ALL_CATEGORIES_ID {
            self.set_all(checked);
            true
        } else {
            self.set(checkbox_id, checked)
        }
    }

    pub fn selected(&self) -> Vec<String> {
        self.categories
            .iter()
            .filter(|(_, on)| *on)
            .map(|(c, _)| c.clone())
            .collect()
    }
}
