//! Style-expression sublanguage used by layer paint properties and filters.
//!
//! Expressions are trees written as tagged JSON arrays, e.g.
//! `["match", ["get", "Evaluation"], "Light", "#F6CF71", "hsl(0, 0%, 70%)"]`.
//! [`Expr`] is the typed form, [`codec`] converts to and from the JSON form,
//! and [`eval`] evaluates an expression against one feature.

pub mod codec;
pub mod eval;
pub mod expr;
pub mod paint;

pub use codec::ExprError;
pub use eval::{EvalContext, EvalError, evaluate, matches};
pub use expr::*;
pub use paint::Paint;
