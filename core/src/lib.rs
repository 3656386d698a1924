//! Core of the Rill data-query language: the typed value universe, the
//! Hindley–Milner inference engine with row-polymorphic records, and the
//! compiled tree-walk evaluator.
//!
//! The pipeline is `ir → infer → compile → evaluate`: a host front-end
//! builds the [`ir`] tree in an arena, [`infer::infer`] annotates every node
//! with a type, [`interpreter::compile`] lowers the typed tree to evaluator
//! nodes, and [`interpreter::evaluate`] runs it against an initial
//! [`interpreter::Scope`].

pub mod errors;
pub mod infer;
pub mod interpreter;
pub mod ir;
pub mod span;
pub mod types;
pub mod values;

pub use errors::TypeError;
pub use infer::{infer, Solution};
pub use interpreter::{compile, evaluate, Interpreter, RuntimeError, Scope};
pub use types::{MonoType, PolyType, TypeManager};
pub use values::Value;
