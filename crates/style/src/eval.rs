use serde_json::{Map, Value};

use crate::expr::{CmpOp, Expr};

/// Inputs an expression may read while being evaluated for one feature.
#[derive(Debug, Copy, Clone)]
pub struct EvalContext<'a> {
    pub properties: &'a Map<String, Value>,
    pub feature_state: Option<&'a Map<String, Value>>,
}

impl<'a> EvalContext<'a> {
    pub fn new(properties: &'a Map<String, Value>) -> Self {
        Self {
            properties,
            feature_state: None,
        }
    }

    pub fn with_state(mut self, state: &'a Map<String, Value>) -> Self {
        self.feature_state = Some(state);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// An operator received a value of the wrong runtime type.
    Type {
        op: &'static str,
        expected: &'static str,
        found: Value,
    },
    /// Ordering comparison between values of different types.
    Incomparable { lhs: Value, rhs: Value },
    NotANumber(String),
    /// A verbatim expression whose operator is not evaluated here.
    Unsupported(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::Type {
                op,
                expected,
                found,
            } => write!(f, "\"{op}\" expected {expected}, found {found}"),
            EvalError::Incomparable { lhs, rhs } => {
                write!(f, "cannot compare {lhs} with {rhs}")
            }
            EvalError::NotANumber(s) => write!(f, "could not convert {s:?} to number"),
            EvalError::Unsupported(op) => write!(f, "\"{op}\" is not evaluated off the map"),
        }
    }
}

impl std::error::Error for EvalError {}

pub fn evaluate(expr: &Expr, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Get(k) => Ok(ctx.properties.get(k).cloned().unwrap_or(Value::Null)),
        Expr::Has(k) => Ok(Value::Bool(ctx.properties.contains_key(k))),
        Expr::FeatureState(k) => Ok(ctx
            .feature_state
            .and_then(|s| s.get(k))
            .cloned()
            .unwrap_or(Value::Null)),
        Expr::ToNumber(e) => to_number(&evaluate(e, ctx)?).map(Value::from),
        Expr::ToString(e) => Ok(Value::String(to_display_string(&evaluate(e, ctx)?))),
        Expr::ToBoolean(e) => Ok(Value::Bool(truthy(&evaluate(e, ctx)?))),
        Expr::Compare { op, lhs, rhs } => {
            let l = evaluate(lhs, ctx)?;
            let r = evaluate(rhs, ctx)?;
            compare(*op, &l, &r).map(Value::Bool)
        }
        Expr::Not(e) => Ok(Value::Bool(!expect_bool("!", evaluate(e, ctx)?)?)),
        Expr::All(items) => {
            for item in items {
                if !expect_bool("all", evaluate(item, ctx)?)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        Expr::Any(items) => {
            for item in items {
                if expect_bool("any", evaluate(item, ctx)?)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Expr::In { needle, haystack } => {
            let needle = evaluate(needle, ctx)?;
            let haystack = evaluate(haystack, ctx)?;
            contains(&needle, &haystack).map(Value::Bool)
        }
        Expr::Match {
            input,
            arms,
            fallback,
        } => {
            let input = evaluate(input, ctx)?;
            for arm in arms {
                if arm.labels.iter().any(|label| values_equal(label, &input)) {
                    return evaluate(&arm.output, ctx);
                }
            }
            evaluate(fallback, ctx)
        }
        Expr::Case { branches, fallback } => {
            for b in branches {
                if expect_bool("case", evaluate(&b.condition, ctx)?)? {
                    return evaluate(&b.output, ctx);
                }
            }
            evaluate(fallback, ctx)
        }
        Expr::Raw(v) => match expr.raw_operator() {
            Some(op) => Err(EvalError::Unsupported(op.to_string())),
            None => Ok(v.clone()),
        },
    }
}

/// Filter semantics: a feature passes only if the expression evaluates to
/// `true`. Evaluation errors exclude the feature.
pub fn matches(filter: &Expr, ctx: &EvalContext<'_>) -> bool {
    matches!(evaluate(filter, ctx), Ok(Value::Bool(true)))
}

fn expect_bool(op: &'static str, v: Value) -> Result<bool, EvalError> {
    match v {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::Type {
            op,
            expected: "boolean",
            found: other,
        }),
    }
}

fn to_number(v: &Value) -> Result<f64, EvalError> {
    match v {
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| EvalError::NotANumber(n.to_string())),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                return Ok(0.0);
            }
            t.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| EvalError::NotANumber(s.clone()))
        }
        other => Err(EvalError::Type {
            op: "to-number",
            expected: "a scalar",
            found: other.clone(),
        }),
    }
}

pub(crate) fn to_display_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strict equality; numbers compare by value so `1` equals `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq => return Ok(values_equal(l, r)),
        CmpOp::Ne => return Ok(!values_equal(l, r)),
        _ => {}
    }

    let ordering = match (l, r) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            match x.partial_cmp(&y) {
                Some(o) => o,
                None => return Ok(false),
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => {
            return Err(EvalError::Incomparable {
                lhs: l.clone(),
                rhs: r.clone(),
            });
        }
    };

    Ok(match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::Le => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::Ge => ordering.is_ge(),
        CmpOp::Eq | CmpOp::Ne => unreachable!("handled above"),
    })
}

fn contains(needle: &Value, haystack: &Value) -> Result<bool, EvalError> {
    if matches!(needle, Value::Array(_) | Value::Object(_)) {
        return Err(EvalError::Type {
            op: "in",
            expected: "a scalar needle",
            found: needle.clone(),
        });
    }
    match haystack {
        Value::Array(items) => Ok(items.iter().any(|item| values_equal(item, needle))),
        Value::String(s) => match needle {
            Value::String(n) => Ok(s.contains(n.as_str())),
            Value::Number(_) => Ok(s.contains(&to_display_string(needle))),
            _ => Ok(false),
        },
        other => Err(EvalError::Type {
            op: "in",
            expected: "an array or string",
            found: other.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{EvalContext, EvalError, evaluate, matches};
    use crate::expr::Expr;
    use serde_json::{Map, Value, json};

    fn props(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn date_window(cursor: f64) -> Expr {
        Expr::all(vec![
            Expr::le(Expr::get("epoch_start_date").to_number(), cursor.into()),
            Expr::ge(Expr::get("epoch_end_date").to_number(), cursor.into()),
        ])
    }

    #[test]
    fn date_window_bounds_are_inclusive() {
        let p = props(json!({"epoch_start_date": 100, "epoch_end_date": 200}));
        let ctx = EvalContext::new(&p);
        assert!(matches(&date_window(150.0), &ctx));
        assert!(matches(&date_window(100.0), &ctx));
        assert!(matches(&date_window(200.0), &ctx));
        assert!(!matches(&date_window(250.0), &ctx));
        assert!(!matches(&date_window(99.0), &ctx));
    }

    #[test]
    fn to_number_coerces_string_dates() {
        let p = props(json!({"epoch_start_date": "100", "epoch_end_date": "200.0"}));
        assert!(matches(&date_window(150.0), &EvalContext::new(&p)));
    }

    #[test]
    fn missing_date_properties_coerce_to_zero() {
        let p = props(json!({}));
        // start 0 <= 150, end 0 >= 150 fails
        assert!(!matches(&date_window(150.0), &EvalContext::new(&p)));
    }

    #[test]
    fn empty_category_list_matches_nothing() {
        let f = Expr::in_list(Expr::get("category"), Vec::<String>::new());
        for cat in ["Obstacles", "Width", ""] {
            let p = props(json!({ "category": cat }));
            assert!(!matches(&f, &EvalContext::new(&p)));
        }
    }

    #[test]
    fn category_membership() {
        let f = Expr::in_list(Expr::get("category"), ["Obstacles", "Width"]);
        let yes = props(json!({"category": "Width"}));
        let no = props(json!({"category": "Unevenness"}));
        let missing = props(json!({}));
        assert!(matches(&f, &EvalContext::new(&yes)));
        assert!(!matches(&f, &EvalContext::new(&no)));
        assert!(!matches(&f, &EvalContext::new(&missing)));
    }

    #[test]
    fn match_picks_arm_or_fallback() {
        let e = Expr::match_on(
            Expr::get("Evaluation"),
            [("Light", "#F6CF71".into()), ("Severe", "#F03B20".into())],
            "hsl(0, 0%, 70%)".into(),
        );
        let p = props(json!({"Evaluation": "Severe"}));
        assert_eq!(evaluate(&e, &EvalContext::new(&p)).unwrap(), json!("#F03B20"));
        let p = props(json!({"Evaluation": "Unknown"}));
        assert_eq!(
            evaluate(&e, &EvalContext::new(&p)).unwrap(),
            json!("hsl(0, 0%, 70%)")
        );
    }

    #[test]
    fn feature_state_is_read_from_context() {
        let e = Expr::Case {
            branches: vec![crate::expr::CaseBranch {
                condition: Expr::equals(Expr::feature_state("hover"), Expr::literal(true)),
                output: Expr::literal(10),
            }],
            fallback: Box::new(Expr::literal(5)),
        };
        let p = Map::new();
        let hovered = props(json!({"hover": true}));
        assert_eq!(evaluate(&e, &EvalContext::new(&p)).unwrap(), json!(5));
        assert_eq!(
            evaluate(&e, &EvalContext::new(&p).with_state(&hovered)).unwrap(),
            json!(10)
        );
    }

    #[test]
    fn ordering_mixed_types_is_an_error_and_filters_out() {
        let e = Expr::le(Expr::get("name"), 3.0.into());
        let p = props(json!({"name": "x"}));
        assert!(matches!(
            evaluate(&e, &EvalContext::new(&p)),
            Err(EvalError::Incomparable { .. })
        ));
        assert!(!matches(&e, &EvalContext::new(&p)));
    }

    #[test]
    fn null_haystack_is_an_error() {
        let e = Expr::In {
            needle: Box::new(Expr::get("category")),
            haystack: Box::new(Expr::literal(Value::Null)),
        };
        let p = props(json!({"category": "a"}));
        assert!(evaluate(&e, &EvalContext::new(&p)).is_err());
        assert!(!matches(&e, &EvalContext::new(&p)));
    }

    #[test]
    fn empty_all_is_true() {
        let p = Map::new();
        assert!(matches(&Expr::all(vec![]), &EvalContext::new(&p)));
        assert!(!matches(&Expr::any(vec![]), &EvalContext::new(&p)));
    }

    #[test]
    fn verbatim_operators_are_not_evaluated() {
        let p = props(json!({"w": 2}));
        let zoom = Expr::from_json(&json!(["step", ["zoom"], 1, 14, 2])).unwrap();
        assert_eq!(
            evaluate(&zoom, &EvalContext::new(&p)),
            Err(EvalError::Unsupported("step".to_string()))
        );
        assert!(!matches(&zoom, &EvalContext::new(&p)));

        let offset = Expr::from_json(&json!([0, 2])).unwrap();
        assert_eq!(evaluate(&offset, &EvalContext::new(&p)), Ok(json!([0, 2])));
    }
}
