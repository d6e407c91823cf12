//! JSON tagged-array form of [`Expr`].
//!
//! Scalars (`string`, `number`, `bool`, `null`) stand for themselves. Arrays
//! are operator applications whose first element names the operator; array
//! and object *values* must be wrapped as `["literal", value]`. Operators
//! outside the modelled subset, and arrays that do not start with an
//! operator name, are kept verbatim as [`Expr::Raw`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::expr::{CaseBranch, CmpOp, Expr, MatchArm};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    EmptyArray,
    Arity {
        op: String,
        expected: &'static str,
        found: usize,
    },
    ExpectedString {
        op: String,
    },
    BareObject,
    InvalidMatchLabel(String),
}

impl std::fmt::Display for ExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprError::EmptyArray => write!(f, "empty array is not an expression"),
            ExprError::Arity {
                op,
                expected,
                found,
            } => write!(f, "\"{op}\" expects {expected} arguments, found {found}"),
            ExprError::ExpectedString { op } => {
                write!(f, "\"{op}\" expects a string property name")
            }
            ExprError::BareObject => {
                write!(f, "object values must be wrapped in [\"literal\", ...]")
            }
            ExprError::InvalidMatchLabel(reason) => write!(f, "invalid match label: {reason}"),
        }
    }
}

impl std::error::Error for ExprError {}

impl Expr {
    pub fn from_json(value: &Value) -> Result<Self, ExprError> {
        match value {
            Value::Array(items) => parse_call(items),
            Value::Object(_) => Err(ExprError::BareObject),
            scalar => Ok(Expr::Literal(scalar.clone())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Expr::Literal(v @ (Value::Array(_) | Value::Object(_))) => {
                Value::Array(vec!["literal".into(), v.clone()])
            }
            Expr::Literal(v) | Expr::Raw(v) => v.clone(),
            Expr::Get(k) => call("get", [Value::String(k.clone())]),
            Expr::Has(k) => call("has", [Value::String(k.clone())]),
            Expr::FeatureState(k) => call("feature-state", [Value::String(k.clone())]),
            Expr::ToNumber(e) => call("to-number", [e.to_json()]),
            Expr::ToString(e) => call("to-string", [e.to_json()]),
            Expr::ToBoolean(e) => call("to-boolean", [e.to_json()]),
            Expr::Compare { op, lhs, rhs } => call(op.operator(), [lhs.to_json(), rhs.to_json()]),
            Expr::Not(e) => call("!", [e.to_json()]),
            Expr::All(items) => call("all", items.iter().map(Expr::to_json)),
            Expr::Any(items) => call("any", items.iter().map(Expr::to_json)),
            Expr::In { needle, haystack } => call("in", [needle.to_json(), haystack.to_json()]),
            Expr::Match {
                input,
                arms,
                fallback,
            } => {
                let mut out = vec![Value::from("match"), input.to_json()];
                for arm in arms {
                    let label = match arm.labels.as_slice() {
                        [single] => single.clone(),
                        many => Value::Array(many.to_vec()),
                    };
                    out.push(label);
                    out.push(arm.output.to_json());
                }
                out.push(fallback.to_json());
                Value::Array(out)
            }
            Expr::Case { branches, fallback } => {
                let mut out = vec![Value::from("case")];
                for b in branches {
                    out.push(b.condition.to_json());
                    out.push(b.output.to_json());
                }
                out.push(fallback.to_json());
                Value::Array(out)
            }
        }
    }
}

fn call(op: &str, args: impl IntoIterator<Item = Value>) -> Value {
    let mut out = vec![Value::from(op)];
    out.extend(args);
    Value::Array(out)
}

fn parse_call(items: &[Value]) -> Result<Expr, ExprError> {
    let Some((head, args)) = items.split_first() else {
        return Err(ExprError::EmptyArray);
    };
    let Some(op) = head.as_str() else {
        return Ok(Expr::Raw(Value::Array(items.to_vec())));
    };

    let arity = |expected: &'static str, ok: bool| {
        if ok {
            Ok(())
        } else {
            Err(ExprError::Arity {
                op: op.to_string(),
                expected,
                found: args.len(),
            })
        }
    };

    match op {
        "literal" => {
            arity("1", args.len() == 1)?;
            Ok(Expr::Literal(args[0].clone()))
        }
        "get" | "has" | "feature-state" => {
            arity("1", args.len() == 1)?;
            let key = args[0]
                .as_str()
                .ok_or_else(|| ExprError::ExpectedString { op: op.to_string() })?
                .to_string();
            Ok(match op {
                "get" => Expr::Get(key),
                "has" => Expr::Has(key),
                _ => Expr::FeatureState(key),
            })
        }
        "to-number" | "to-string" | "to-boolean" | "!" => {
            arity("1", args.len() == 1)?;
            let inner = Box::new(Expr::from_json(&args[0])?);
            Ok(match op {
                "to-number" => Expr::ToNumber(inner),
                "to-string" => Expr::ToString(inner),
                "to-boolean" => Expr::ToBoolean(inner),
                _ => Expr::Not(inner),
            })
        }
        "all" | "any" => {
            let items = args
                .iter()
                .map(Expr::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(if op == "all" {
                Expr::All(items)
            } else {
                Expr::Any(items)
            })
        }
        "in" => {
            arity("2", args.len() == 2)?;
            Ok(Expr::In {
                needle: Box::new(Expr::from_json(&args[0])?),
                haystack: Box::new(Expr::from_json(&args[1])?),
            })
        }
        "match" => {
            // input, (label, output)+, fallback
            arity(
                "an input, label/output pairs and a fallback",
                args.len() >= 4 && args.len() % 2 == 0,
            )?;
            let input = Box::new(Expr::from_json(&args[0])?);
            let mut arms = Vec::with_capacity((args.len() - 2) / 2);
            for pair in args[1..args.len() - 1].chunks_exact(2) {
                arms.push(MatchArm {
                    labels: match_labels(&pair[0])?,
                    output: Expr::from_json(&pair[1])?,
                });
            }
            let fallback = Box::new(Expr::from_json(&args[args.len() - 1])?);
            Ok(Expr::Match {
                input,
                arms,
                fallback,
            })
        }
        "case" => {
            arity(
                "condition/output pairs and a fallback",
                args.len() >= 3 && args.len() % 2 == 1,
            )?;
            let mut branches = Vec::with_capacity(args.len() / 2);
            for pair in args[..args.len() - 1].chunks_exact(2) {
                branches.push(CaseBranch {
                    condition: Expr::from_json(&pair[0])?,
                    output: Expr::from_json(&pair[1])?,
                });
            }
            let fallback = Box::new(Expr::from_json(&args[args.len() - 1])?);
            Ok(Expr::Case { branches, fallback })
        }
        other => match CmpOp::from_operator(other) {
            Some(cmp) => {
                arity("2", args.len() == 2)?;
                Ok(Expr::compare(
                    cmp,
                    Expr::from_json(&args[0])?,
                    Expr::from_json(&args[1])?,
                ))
            }
            None => Ok(Expr::Raw(Value::Array(items.to_vec()))),
        },
    }
}

fn match_labels(label: &Value) -> Result<Vec<Value>, ExprError> {
    let labels = match label {
        Value::Array(many) if many.is_empty() => {
            return Err(ExprError::InvalidMatchLabel("empty label list".to_string()));
        }
        Value::Array(many) => many.clone(),
        single => vec![single.clone()],
    };
    for l in &labels {
        if !(l.is_string() || l.is_number()) {
            return Err(ExprError::InvalidMatchLabel(format!(
                "labels must be strings or numbers, found {l}"
            )));
        }
    }
    Ok(labels)
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Expr::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::ExprError;
    use crate::expr::Expr;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_circle_color_match() {
        let src = json!([
            "match",
            ["get", "Evaluation"],
            "Light", "#F6CF71",
            "Moderate", "#F89C74",
            "Severe", "#F03B20",
            "hsl(0, 0%, 70%)"
        ]);
        let e = Expr::from_json(&src).unwrap();
        let Expr::Match { arms, .. } = &e else {
            panic!("expected match, got {e:?}");
        };
        assert_eq!(arms.len(), 3);
        assert_eq!(e.to_json(), src);
    }

    #[test]
    fn date_filter_keeps_its_json_shape() {
        let src = json!([
            "all",
            ["<=", ["to-number", ["get", "epoch_start_date"]], 1721606400.0],
            [">=", ["to-number", ["get", "epoch_end_date"]], 1721606400.0],
            ["in", ["get", "category"], ["literal", ["a", "b"]]]
        ]);
        let e: Expr = serde_json::from_value(src.clone()).unwrap();
        assert_eq!(serde_json::to_value(&e).unwrap(), src);
    }

    #[test]
    fn match_accepts_label_lists() {
        let src = json!(["match", ["get", "t"], ["a", "b"], 1, 0]);
        let e = Expr::from_json(&src).unwrap();
        assert_eq!(e.to_json(), src);
    }

    #[test]
    fn array_values_are_wrapped_as_literals() {
        let e = Expr::in_list(Expr::get("k"), Vec::<String>::new());
        assert_eq!(e.to_json(), json!(["in", ["get", "k"], ["literal", []]]));
    }

    #[test]
    fn unmodelled_operators_pass_through_verbatim() {
        let radius = json!(["interpolate", ["linear"], ["zoom"], 11, 3, 16, 8]);
        let e = Expr::from_json(&radius).unwrap();
        assert_eq!(e.raw_operator(), Some("interpolate"));
        assert_eq!(e.to_json(), radius);

        let nested = json!(["case", ["has", "w"], ["coalesce", ["get", "w"], 1], 0]);
        assert_eq!(Expr::from_json(&nested).unwrap().to_json(), nested);

        let offset = json!([0, 2]);
        assert_eq!(Expr::from_json(&offset).unwrap(), Expr::Raw(offset.clone()));
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert_eq!(Expr::from_json(&json!([])), Err(ExprError::EmptyArray));
        assert!(matches!(
            Expr::from_json(&json!(["get"])),
            Err(ExprError::Arity { .. })
        ));
        assert!(matches!(
            Expr::from_json(&json!(["get", 3])),
            Err(ExprError::ExpectedString { .. })
        ));
        assert_eq!(Expr::from_json(&json!({"a": 1})), Err(ExprError::BareObject));
        assert!(matches!(
            Expr::from_json(&json!(["match", ["get", "t"], "a", 1])),
            Err(ExprError::Arity { .. })
        ));
        assert!(matches!(
            Expr::from_json(&json!(["match", ["get", "t"], true, 1, 0])),
            Err(ExprError::InvalidMatchLabel(_))
        ));
    }
}
