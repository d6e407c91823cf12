use std::collections::BTreeMap;

use serde_json::Value;

use crate::eval::{EvalContext, EvalError, evaluate};
use crate::expr::Expr;

/// Paint properties of a layer (`circle-color`, `circle-radius`, ...).
/// Constant values are stored as literal expressions.
pub type Paint = BTreeMap<String, Expr>;

/// Evaluates every paint property for one feature.
pub fn resolve_paint(
    paint: &Paint,
    ctx: &EvalContext<'_>,
) -> Result<BTreeMap<String, Value>, EvalError> {
    paint
        .iter()
        .map(|(k, e)| Ok((k.clone(), evaluate(e, ctx)?)))
        .collect()
}
