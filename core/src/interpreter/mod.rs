//! The compiled evaluator.
//!
//! [`compile`] lowers a typed program to a tree of evaluator nodes;
//! [`evaluate`] walks it against an initial scope. A compiled tree is
//! immutable and may be walked by any number of evaluations, each with its
//! own scope and value arena.

mod compile;
pub mod error;
pub mod eval;
pub mod operators;
pub mod scope;


use bumpalo::Bump;

pub use compile::compile;
pub use error::RuntimeError;
pub use eval::{Interpreter, Node};
pub use scope::Scope;

use crate::values::Value;

/// Evaluate a compiled tree against an initial scope, allocating values in
/// `arena`.
pub fn evaluate<'c: 'v, 'v>(
    arena: &'v Bump,
    root: &'c Node<'c>,
    scope: &mut Scope<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    Interpreter::new(arena).eval(root, scope)
}
