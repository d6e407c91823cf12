//! Popup templates: which feature properties a popup shows and in what role.
//!
//! Templates are resolved once, at configuration time, into an ordered list
//! of `{role, property}` pairs. A bare property name is resolved by the
//! dataset convention: `Type` is the title, `Evaluation` is the badge,
//! anything else is a plain labelled field.

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PopupTrigger {
    #[default]
    #[serde(rename = "click")]
    Click,
    #[serde(rename = "mousemove", alias = "hover")]
    Hover,
}

impl PopupTrigger {
    /// The map event name that opens the popup.
    pub fn as_str(self) -> &'static str {
        match self {
            PopupTrigger::Click => "click",
            PopupTrigger::Hover => "mousemove",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupRole {
    Title,
    Description,
    Image,
    Field,
    Badge,
}

pub const TITLE_PROPERTY: &str = "Type";
pub const BADGE_PROPERTY: &str = "Evaluation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldRepr")]
pub struct PopupField {
    pub role: PopupRole,
    pub property: String,
}

impl PopupField {
    pub fn new(role: PopupRole, property: impl Into<String>) -> Self {
        Self {
            role,
            property: property.into(),
        }
    }

    pub fn by_convention(property: impl Into<String>) -> Self {
        let property = property.into();
        let role = match property.as_str() {
            TITLE_PROPERTY => PopupRole::Title,
            BADGE_PROPERTY => PopupRole::Badge,
            _ => PopupRole::Field,
        };
        Self { role, property }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldRepr {
    Bare(String),
    Explicit { role: PopupRole, property: String },
}

impl From<FieldRepr> for PopupField {
    fn from(repr: FieldRepr) -> Self {
        match repr {
            FieldRepr::Bare(name) => PopupField::by_convention(name),
            FieldRepr::Explicit { role, property } => PopupField { role, property },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PopupTemplate {
    #[serde(rename = "event", default)]
    pub trigger: PopupTrigger,
    #[serde(default)]
    pub fields: Vec<PopupField>,
}

impl PopupTemplate {
    pub fn from_names<I, S>(trigger: PopupTrigger, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trigger,
            fields: names.into_iter().map(PopupField::by_convention).collect(),
        }
    }

    pub fn title(&self) -> Option<&PopupField> {
        self.first(PopupRole::Title)
    }

    pub fn description(&self) -> Option<&PopupField> {
        self.first(PopupRole::Description)
    }

    pub fn image(&self) -> Option<&PopupField> {
        self.first(PopupRole::Image)
    }

    /// Rows under the title, in configuration order.
    pub fn rows(&self) -> impl Iterator<Item = &PopupField> {
        self.fields
            .iter()
            .filter(|f| matches!(f.role, PopupRole::Field | PopupRole::Badge))
    }

    fn first(&self, role: PopupRole) -> Option<&PopupField> {
        self.fields.iter().find(|f| f.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::{PopupField, PopupRole, PopupTemplate, PopupTrigger};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn bare_names_follow_the_dataset_convention() {
        let t: PopupTemplate =
            serde_json::from_value(json!({"event": "click", "fields": ["Type", "Evaluation", "Value"]}))
                .unwrap();
        assert_eq!(
            t.fields,
            vec![
                PopupField::new(PopupRole::Title, "Type"),
                PopupField::new(PopupRole::Badge, "Evaluation"),
                PopupField::new(PopupRole::Field, "Value"),
            ]
        );
        assert_eq!(t.title().map(|f| f.property.as_str()), Some("Type"));
        let rows: Vec<_> = t.rows().map(|f| f.property.as_str()).collect();
        assert_eq!(rows, vec!["Evaluation", "Value"]);
    }

    #[test]
    fn explicit_roles_and_hover_trigger() {
        let t: PopupTemplate = serde_json::from_value(json!({
            "event": "mousemove",
            "fields": [
                {"role": "title", "property": "name"},
                {"role": "description", "property": "desc"},
                {"role": "image", "property": "photo"}
            ]
        }))
        .unwrap();
        assert_eq!(t.trigger, PopupTrigger::Hover);
        assert_eq!(t.description().map(|f| f.property.as_str()), Some("desc"));
        assert_eq!(t.image().map(|f| f.property.as_str()), Some("photo"));
        assert_eq!(t.rows().count(), 0);
    }

    #[test]
    fn serializes_resolved_pairs() {
        let t = PopupTemplate::from_names(PopupTrigger::Click, ["Type"]);
        assert_eq!(
            serde_json::to_value(&t).unwrap(),
            json!({"event": "click", "fields": [{"role": "title", "property": "Type"}]})
        );
    }
}
