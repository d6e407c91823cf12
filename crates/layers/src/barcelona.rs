//! Built-in registry of the Barcelona accessibility map.

use foundation::LayerId;
use style::{Expr, Paint};

use crate::descriptor::{FilterBy, LayerDescriptor, LayerStates, LayerType, SourceType, Visibility};
use crate::popup::{PopupTemplate, PopupTrigger};
use crate::registry::{LayerRegistry, RegistryError};
use crate::symbology::{Legend, LegendItem};

const AJUNTAMENT: &str = "<a href='https://opendata-ajuntament.barcelona.cat/data/ca/dataset/accessibilitat-via-publica'>©Ajuntament de Barcelona</a> (<a href='https://creativecommons.org/licenses/by/4.0/deed.ca'>CC BY 4.0</a>)";

const FALLBACK_COLOR: &str = "hsl(0, 0%, 70%)";

pub const POINTS: &str = "bsc_pilot2_all";
pub const OBSTACLES: &str = "IMPD_obstacles";
pub const UNEVENNESS: &str = "IMPD_unevenness";
pub const WIDTH: &str = "IMPD_width";

pub fn registry() -> Result<LayerRegistry, RegistryError> {
    LayerRegistry::new(descriptors())
}

pub fn descriptors() -> Vec<LayerDescriptor> {
    vec![
        LayerDescriptor {
            attribution: format!("Accessibility Data {AJUNTAMENT}"),
            symbolization: circle_paint(
                6.0,
                true,
                "Type",
                &[
                    ("Obstacles", "hsl(211, 25%, 61%)"),
                    ("Unevenness", "hsl(120, 40%, 55%)"),
                    ("Width", "hsl(30, 70%, 60%)"),
                ],
            ),
            legend: Legend {
                id: format!("legend-{POINTS}"),
                class: "legend".to_string(),
                items: vec![LegendItem {
                    style_height: "10px".to_string(),
                    ..LegendItem::swatch("hsl(211, 25%, 61%)", "Points")
                }],
            },
            ..circle_layer("Accessibility Points", POINTS)
        },
        LayerDescriptor {
            attribution: format!("Accessibility Data: {AJUNTAMENT}"),
            ..evaluated_layer(
                "Obstacles",
                OBSTACLES,
                &[("Light", "#F6CF71"), ("Moderate", "#F89C74"), ("Severe", "#F03B20")],
            )
        },
        evaluated_layer(
            "Unevenness",
            UNEVENNESS,
            &[("Accessible", "#A6D96A"), ("Non accessible", "#F03B20")],
        ),
        evaluated_layer(
            "Width",
            WIDTH,
            &[("Accessible", "#A6D96A"), ("Partially", "#F6CF71")],
        ),
    ]
}

fn circle_layer(name: &str, id: &str) -> LayerDescriptor {
    LayerDescriptor {
        name: name.to_string(),
        source_layer_name: LayerId::new(id),
        attribution: String::new(),
        source_type: SourceType::GeoJson,
        layer_type: LayerType::Circle,
        symbolization: Paint::new(),
        legend: Legend::default(),
        states: LayerStates {
            visible: Visibility::Visible,
            pop_ups: true,
            icons: true,
            filter_cat: true,
            highlight: false,
            filter_layer: false,
            date_range: false,
        },
        popup: PopupTemplate::from_names(PopupTrigger::Click, ["Type", "Evaluation", "Value"]),
        filter_by: FilterBy {
            active: false,
            feature: "Type".to_string(),
        },
    }
}

/// A layer coloured by its `Evaluation` property, one legend swatch per class.
fn evaluated_layer(name: &str, id: &str, classes: &[(&str, &str)]) -> LayerDescriptor {
    LayerDescriptor {
        symbolization: circle_paint(5.0, false, "Evaluation", classes),
        legend: Legend {
            id: format!("legend-{id}"),
            class: "legend".to_string(),
            items: classes
                .iter()
                .map(|(label, color)| LegendItem::swatch(*color, *label))
                .collect(),
        },
        ..circle_layer(name, id)
    }
}

fn circle_paint(radius: f64, stroked: bool, property: &str, classes: &[(&str, &str)]) -> Paint {
    let mut paint = Paint::new();
    paint.insert("circle-radius".to_string(), Expr::from(radius));
    if stroked {
        paint.insert("circle-stroke-width".to_string(), Expr::from(1.0));
        paint.insert("circle-stroke-color".to_string(), Expr::from("#333"));
    }
    paint.insert(
        "circle-color".to_string(),
        Expr::match_on(
            Expr::get(property),
            classes.iter().map(|(label, color)| (*label, Expr::from(*color))),
            Expr::from(FALLBACK_COLOR),
        ),
    );
    paint
}

#[cfg(test)]
mod tests {
    use super::{OBSTACLES, POINTS, WIDTH, registry};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};
    use style::{EvalContext, evaluate};

    #[test]
    fn builtin_registry_is_valid_and_ordered() {
        let r = registry().unwrap();
        let ids: Vec<_> = r.iter().map(|d| d.id().as_str()).collect();
        assert_eq!(ids, vec![POINTS, OBSTACLES, "IMPD_unevenness", WIDTH]);
        assert!(r.filtered_layers().is_empty());
        assert!(r.date_range_layers().is_empty());
    }

    #[test]
    fn only_the_first_two_layers_carry_attribution() {
        let r = registry().unwrap();
        let attributions = r.attributions();
        assert_eq!(attributions.len(), 2);
        assert!(attributions[0].starts_with("Accessibility Data <a"));
        assert!(attributions[1].starts_with("Accessibility Data: <a"));
    }

    #[test]
    fn obstacle_colors_follow_evaluation() {
        let r = registry().unwrap();
        let paint = &r.get(OBSTACLES).unwrap().symbolization;
        let color = &paint["circle-color"];
        let mut props = Map::new();
        props.insert("Evaluation".to_string(), json!("Moderate"));
        assert_eq!(evaluate(color, &EvalContext::new(&props)).unwrap(), json!("#F89C74"));
        props.insert("Evaluation".to_string(), json!("Unknown"));
        assert_eq!(
            evaluate(color, &EvalContext::new(&props)).unwrap(),
            json!("hsl(0, 0%, 70%)")
        );
        assert!(!paint.contains_key("circle-stroke-width"));
    }

    #[test]
    fn legends_list_every_class() {
        let r = registry().unwrap();
        let labels: Vec<_> = r.get(WIDTH).unwrap().legend.items.iter().map(|i| i.label()).collect();
        assert_eq!(labels, vec!["Accessible", "Partially"]);
        assert_eq!(r.get(POINTS).unwrap().legend.items[0].style_height, "10px");
    }
}
