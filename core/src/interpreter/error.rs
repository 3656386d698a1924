//! Runtime evaluation errors.
//!
//! Only genuinely dynamic failures live here. Conditions the type checker
//! excludes (wrong kinds, unknown identifiers, missing required arguments)
//! are assertions in the evaluator, not errors.

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Integer or unsigned division (or remainder) by zero. Float division
    /// follows IEEE 754 and does not error.
    DivisionByZero,

    /// A regexp pattern failed to compile at evaluation time.
    InvalidRegexp { pattern: String, message: String },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::InvalidRegexp { pattern, message } => {
                write!(f, "invalid regexp {:?}: {}", pattern, message)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
