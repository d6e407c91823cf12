use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendItem {
    pub style_height: String,
    pub display: String,
    pub background_color: String,
    pub range: Vec<String>,
}

impl LegendItem {
    pub fn swatch(color: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            style_height: "12px".to_string(),
            display: "inline-block".to_string(),
            background_color: color.into(),
            range: vec![label.into()],
        }
    }

    pub fn label(&self) -> String {
        self.range.join(" - ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legend {
    pub id: String,
    pub class: String,
    #[serde(default)]
    pub items: Vec<LegendItem>,
}

impl Default for Legend {
    fn default() -> Self {
        Self {
            id: String::new(),
            class: "legend".to_string(),
            items: Vec::new(),
        }
    }
}

/// Badge colour for an `Evaluation` value in popups.
pub fn badge_color(value: &str) -> &'static str {
    match value {
        "Light" => "#F6CF71",
        "Moderate" => "#F89C74",
        "Severe" => "#F03B20",
        "Accessible" => "#6AB04C",
        _ => "#ccc",
    }
}
