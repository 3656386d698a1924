//! Runtime values.

pub mod value;


pub use value::{ArrayData, FunctionData, ObjectData, Value};
