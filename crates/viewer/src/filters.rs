use foundation::{EpochSeconds, LayerId, TimeSpan};
use layers::MembershipSets;
use map::{MapBackend, MapError};
use style::Expr;
use tracing::debug;

pub const START_DATE_PROPERTY: &str = "epoch_start_date";
pub const END_DATE_PROPERTY: &str = "epoch_end_date";

/// Category and date predicates, merged and pushed to the layers that take
/// them.
///
/// Fragments are rebuilt whole on every change. A fragment that has never
/// been set is left out of the combined filter rather than matching nothing.
#[derive(Debug, Clone)]
pub struct FilterCombinator {
    category_property: String,
    category: Option<Expr>,
    start: Option<Expr>,
    end: Option<Expr>,
    membership: MembershipSets,
}

impl FilterCombinator {
    pub fn new(category_property: impl Into<String>, membership: MembershipSets) -> Self {
        Self {
            category_property: category_property.into(),
            category: None,
            start: None,
            end: None,
            membership,
        }
    }

    pub fn membership(&self) -> &MembershipSets {
        &self.membership
    }

    /// An empty selection matches nothing.
    pub fn set_categories<S: AsRef<str>>(&mut self, selected: &[S]) {
        self.category = Some(Expr::in_list(
            Expr::get(self.category_property.as_str()),
            selected.iter().map(|s| s.as_ref().to_string()),
        ));
    }

    /// Keeps features whose own span covers `span`; `None` drops the date
    /// predicates.
    pub fn set_date_range(&mut self, span: Option<TimeSpan>) {
        match span {
            Some(span) => {
                self.start = Some(Expr::le(
                    Expr::get(START_DATE_PROPERTY).to_number(),
                    Expr::from(span.start.0),
                ));
                self.end = Some(Expr::ge(
                    Expr::get(END_DATE_PROPERTY).to_number(),
                    Expr::from(span.end.0),
                ));
            }
            None => {
                self.start = None;
                self.end = None;
            }
        }
    }

    pub fn set_cursor(&mut self, cursor: EpochSeconds) {
        self.set_date_range(Some(TimeSpan::instant(cursor)));
    }

    /// `["all", category]`
    pub fn category_filter(&self) -> Expr {
        Expr::all(self.category.iter().cloned().collect())
    }

    /// `["all", start, end, category]`
    pub fn date_and_category_filter(&self) -> Expr {
        Expr::all(
            [&self.start, &self.end, &self.category]
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
        )
    }

    pub fn filter_for(&self, id: &LayerId) -> Option<Expr> {
        if self.membership.date_range.contains(id) {
            Some(self.date_and_category_filter())
        } else if self.membership.filtered.contains(id) {
            Some(self.category_filter())
        } else {
            None
        }
    }

    /// Pushes the current filters to every member layer present on the map.
    /// Returns how many layers were updated.
    pub fn apply<M: MapBackend>(&self, map: &mut M) -> Result<usize, MapError> {
        let category = self.category_filter();
        let combined = self.date_and_category_filter();
        let mut applied = 0;
        for id in &self.membership.filtered {
            if map.has_layer(id) {
                map.set_filter(id, Some(&category))?;
                applied += 1;
            }
        }
        for id in &self.membership.date_range {
            if map.has_layer(id) {
                map.set_filter(id, Some(&combined))?;
                applied += 1;
            }
        }
        debug!("filters applied to {applied} layers");
        Ok(applied)
    }

    /// Catches a layer up after it appears on the map.
    pub fn apply_to<M: MapBackend>(&self, map: &mut M, id: &LayerId) -> Result<bool, MapError> {
        match self.filter_for(id) {
            Some(filter) if map.has_layer(id) => {
                map.set_filter(id, Some(&filter))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FilterCombinator;
    use formats::FeatureCollection;
    use foundation::{EpochSeconds, LayerId, TimeSpan};
    use layers::MembershipSets;
    use map::{HeadlessMap, LayerSpec, MapBackend, MapOptions, SourceSpec};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};
    use style::{EvalContext, matches};

    fn sets() -> MembershipSets {
        MembershipSets {
            filtered: vec![LayerId::new("cat")],
            date_range: vec![LayerId::new("dated")],
        }
    }

    fn props(category: &str, start: f64, end: f64) -> Map<String, serde_json::Value> {
        json!({"category": category, "epoch_start_date": start.to_string(), "epoch_end_date": end})
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn untouched_combinator_filters_nothing() {
        let f = FilterCombinator::new("category", sets());
        assert_eq!(f.category_filter().to_json(), json!(["all"]));
        assert_eq!(f.date_and_category_filter().to_json(), json!(["all"]));
    }

    #[test]
    fn fragments_combine_in_order() {
        let mut f = FilterCombinator::new("category", sets());
        f.set_categories(&["a", "b"]);
        f.set_cursor(EpochSeconds(1721606400.0));
        assert_eq!(
            f.date_and_category_filter().to_json(),
            json!([
                "all",
                ["<=", ["to-number", ["get", "epoch_start_date"]], 1721606400.0],
                [">=", ["to-number", ["get", "epoch_end_date"]], 1721606400.0],
                ["in", ["get", "category"], ["literal", ["a", "b"]]]
            ])
        );
        assert_eq!(
            f.filter_for(&LayerId::new("cat")).map(|e| e.to_json()),
            Some(json!(["all", ["in", ["get", "category"], ["literal", ["a", "b"]]]]))
        );
        assert_eq!(f.filter_for(&LayerId::new("other")), None);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let mut f = FilterCombinator::new("category", sets());
        let feature = props("a", 100.0, 200.0);
        let ctx = EvalContext::new(&feature);
        for (cursor, expected) in [(150.0, true), (250.0, false), (100.0, true), (200.0, true), (99.0, false)] {
            f.set_cursor(EpochSeconds(cursor));
            assert_eq!(matches(&f.date_and_category_filter(), &ctx), expected, "cursor {cursor}");
        }
    }

    #[test]
    fn range_needs_feature_to_cover_it() {
        let mut f = FilterCombinator::new("category", sets());
        let feature = props("a", 100.0, 200.0);
        let ctx = EvalContext::new(&feature);
        f.set_date_range(Some(TimeSpan {
            start: EpochSeconds(120.0),
            end: EpochSeconds(180.0),
        }));
        assert!(matches(&f.date_and_category_filter(), &ctx));
        f.set_date_range(Some(TimeSpan {
            start: EpochSeconds(120.0),
            end: EpochSeconds(220.0),
        }));
        assert!(!matches(&f.date_and_category_filter(), &ctx));
        f.set_date_range(None);
        assert!(matches(&f.date_and_category_filter(), &ctx));
    }

    #[test]
    fn empty_selection_matches_nothing() {
        let mut f = FilterCombinator::new("category", sets());
        f.set_categories::<&str>(&[]);
        for c in ["a", "b", ""] {
            let feature = props(c, 0.0, 0.0);
            assert!(!matches(&f.category_filter(), &EvalContext::new(&feature)));
        }
    }

    #[test]
    fn applies_only_to_present_members() {
        let mut map = HeadlessMap::new(MapOptions::default());
        for id in ["cat", "plain"] {
            let id = LayerId::new(id);
            map.add_source(&id, SourceSpec::GeoJson(FeatureCollection::empty()))
                .unwrap();
            map.add_layer(LayerSpec::new(id.clone(), "circle", id), None)
                .unwrap();
        }
        let mut f = FilterCombinator::new("category", sets());
        f.set_categories(&["a"]);
        assert_eq!(f.apply(&mut map).unwrap(), 1);
        assert!(map.filter(&LayerId::new("cat")).is_some());
        assert!(map.filter(&LayerId::new("plain")).is_none());
        assert!(!f.apply_to(&mut map, &LayerId::new("dated")).unwrap());
    }
}
