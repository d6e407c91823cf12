use serde_json::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn operator(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    pub fn from_operator(op: &str) -> Option<Self> {
        Some(match op {
            "==" => CmpOp::Eq,
            "!=" => CmpOp::Ne,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::Le,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::Ge,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    /// One or more labels; a JSON array label is flattened into several.
    pub labels: Vec<Value>,
    pub output: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub condition: Expr,
    pub output: Expr,
}

/// A style expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Feature property lookup; missing keys evaluate to `null`.
    Get(String),
    Has(String),
    /// Per-feature ephemeral state lookup (e.g. `hover`).
    FeatureState(String),
    ToNumber(Box<Expr>),
    ToString(Box<Expr>),
    ToBoolean(Box<Expr>),
    Compare {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    All(Vec<Expr>),
    Any(Vec<Expr>),
    In {
        needle: Box<Expr>,
        haystack: Box<Expr>,
    },
    Match {
        input: Box<Expr>,
        arms: Vec<MatchArm>,
        fallback: Box<Expr>,
    },
    Case {
        branches: Vec<CaseBranch>,
        fallback: Box<Expr>,
    },
    /// An expression kept in its JSON form: operators this crate does not
    /// model (`interpolate`, `zoom`, `step`, ...) and plain array values
    /// such as `[0, 2]`. Handed to the map unchanged.
    Raw(Value),
}

impl Expr {
    pub fn literal(v: impl Into<Value>) -> Self {
        Expr::Literal(v.into())
    }

    pub fn get(key: impl Into<String>) -> Self {
        Expr::Get(key.into())
    }

    pub fn feature_state(key: impl Into<String>) -> Self {
        Expr::FeatureState(key.into())
    }

    pub fn to_number(self) -> Self {
        Expr::ToNumber(Box::new(self))
    }

    pub fn compare(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn le(lhs: Expr, rhs: Expr) -> Self {
        Self::compare(CmpOp::Le, lhs, rhs)
    }

    pub fn ge(lhs: Expr, rhs: Expr) -> Self {
        Self::compare(CmpOp::Ge, lhs, rhs)
    }

    pub fn equals(lhs: Expr, rhs: Expr) -> Self {
        Self::compare(CmpOp::Eq, lhs, rhs)
    }

    pub fn all(items: Vec<Expr>) -> Self {
        Expr::All(items)
    }

    pub fn any(items: Vec<Expr>) -> Self {
        Expr::Any(items)
    }

    pub fn negate(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// `["in", needle, ["literal", [values...]]]`. An empty list matches nothing.
    pub fn in_list<I, V>(needle: Expr, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        Expr::In {
            needle: Box::new(needle),
            haystack: Box::new(Expr::Literal(Value::Array(list))),
        }
    }

    /// `["match", input, label, output, ..., fallback]` with one label per arm.
    pub fn match_on<I, L>(input: Expr, arms: I, fallback: Expr) -> Self
    where
        I: IntoIterator<Item = (L, Expr)>,
        L: Into<Value>,
    {
        Expr::Match {
            input: Box::new(input),
            arms: arms
                .into_iter()
                .map(|(label, output)| MatchArm {
                    labels: vec![label.into()],
                    output,
                })
                .collect(),
            fallback: Box::new(fallback),
        }
    }

    /// Property keys read through `get`/`has`, in first-seen order.
    /// The operator name of a [`Expr::Raw`] call, if it is one.
    pub fn raw_operator(&self) -> Option<&str> {
        match self {
            Expr::Raw(Value::Array(items)) => items.first().and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn properties(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.visit(&mut |e| {
            if let Expr::Get(k) | Expr::Has(k) = e
                && !out.contains(&k.as_str())
            {
                out.push(k.as_str());
            }
        });
        out
    }

    /// Pre-order traversal.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Literal(_)
            | Expr::Get(_)
            | Expr::Has(_)
            | Expr::FeatureState(_)
            | Expr::Raw(_) => {}
            Expr::ToNumber(e) | Expr::ToString(e) | Expr::ToBoolean(e) | Expr::Not(e) => {
                e.visit(f)
            }
            Expr::Compare { lhs, rhs, .. } => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Expr::All(items) | Expr::Any(items) => {
                for item in items {
                    item.visit(f);
                }
            }
            Expr::In { needle, haystack } => {
                needle.visit(f);
                haystack.visit(f);
            }
            Expr::Match {
                input,
                arms,
                fallback,
            } => {
                input.visit(f);
                for arm in arms {
                    arm.output.visit(f);
                }
                fallback.visit(f);
            }
            Expr::Case { branches, fallback } => {
                for b in branches {
                    b.condition.visit(f);
                    b.output.visit(f);
                }
                fallback.visit(f);
            }
        }
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Literal(Value::String(s.to_string()))
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::literal(n)
    }
}
