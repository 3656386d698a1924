//! Binary and unary operator implementations.
//!
//! Binary dispatch is keyed on `(operator, left kind, right kind)`. The
//! compiler precomputes the dispatch function when both operand natures are
//! concrete; inside still-polymorphic function bodies the evaluator looks it
//! up from the runtime value kinds instead. A combination absent from the
//! table was rejected by the type checker, so reaching it is a bug.
//!
//! Integer arithmetic wraps to avoid panics on overflow. Float arithmetic
//! follows IEEE 754, so float division by zero yields inf/nan. Integer and
//! unsigned division by zero is a runtime error.

use bumpalo::Bump;

use crate::interpreter::error::RuntimeError;
use crate::ir::{BinaryOperator, UnaryOperator};
use crate::types::Nature;
use crate::values::Value;

pub type BinaryFn = for<'c, 'v> fn(
    BinaryOperator,
    &'v Bump,
    Value<'c, 'v>,
    Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError>;

/// The dyadic dispatch table.
pub fn lookup(op: BinaryOperator, left: Nature, right: Nature) -> Option<BinaryFn> {
    use BinaryOperator::*;
    use Nature::*;

    let arith = matches!(op, Add | Sub | Mul | Div | Mod);
    let ord = matches!(op, Lt | Lte | Gt | Gte);
    let equality = matches!(op, Eq | Neq);

    match (left, right) {
        (Int, Int) if arith || ord || equality => Some(int_binary),
        (UInt, UInt) if arith || ord || equality => Some(uint_binary),
        (Float, Float) if arith || ord || equality => Some(float_binary),
        (String, String) if matches!(op, Add) || ord || equality => Some(string_binary),
        (String, Regexp) if matches!(op, RegexpMatch | NotRegexpMatch) => Some(regexp_binary),
        (Bool, Bool) if equality => Some(bool_binary),
        (Time, Time) if ord || equality => Some(time_binary),
        (Duration, Duration) if matches!(op, Add) || ord || equality => Some(duration_binary),
        (Null, Null) if equality => Some(null_binary),
        _ => None,
    }
}

fn int_binary<'c, 'v>(
    op: BinaryOperator,
    _arena: &'v Bump,
    left: Value<'c, 'v>,
    right: Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    let a = left.as_int().expect("checked as int");
    let b = right.as_int().expect("checked as int");
    Ok(match op {
        BinaryOperator::Add => Value::int(a.wrapping_add(b)),
        BinaryOperator::Sub => Value::int(a.wrapping_sub(b)),
        BinaryOperator::Mul => Value::int(a.wrapping_mul(b)),
        BinaryOperator::Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::int(a.wrapping_div(b))
        }
        BinaryOperator::Mod => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::int(a.wrapping_rem(b))
        }
        BinaryOperator::Eq => Value::bool(a == b),
        BinaryOperator::Neq => Value::bool(a != b),
        BinaryOperator::Lt => Value::bool(a < b),
        BinaryOperator::Lte => Value::bool(a <= b),
        BinaryOperator::Gt => Value::bool(a > b),
        BinaryOperator::Gte => Value::bool(a >= b),
        BinaryOperator::RegexpMatch | BinaryOperator::NotRegexpMatch => {
            unreachable!("regexp match on integers in a type-checked program")
        }
    })
}

fn uint_binary<'c, 'v>(
    op: BinaryOperator,
    _arena: &'v Bump,
    left: Value<'c, 'v>,
    right: Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    let a = left.as_uint().expect("checked as uint");
    let b = right.as_uint().expect("checked as uint");
    Ok(match op {
        BinaryOperator::Add => Value::uint(a.wrapping_add(b)),
        BinaryOperator::Sub => Value::uint(a.wrapping_sub(b)),
        BinaryOperator::Mul => Value::uint(a.wrapping_mul(b)),
        BinaryOperator::Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::uint(a / b)
        }
        BinaryOperator::Mod => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::uint(a % b)
        }
        BinaryOperator::Eq => Value::bool(a == b),
        BinaryOperator::Neq => Value::bool(a != b),
        BinaryOperator::Lt => Value::bool(a < b),
        BinaryOperator::Lte => Value::bool(a <= b),
        BinaryOperator::Gt => Value::bool(a > b),
        BinaryOperator::Gte => Value::bool(a >= b),
        BinaryOperator::RegexpMatch | BinaryOperator::NotRegexpMatch => {
            unreachable!("regexp match on unsigned integers in a type-checked program")
        }
    })
}

fn float_binary<'c, 'v>(
    op: BinaryOperator,
    _arena: &'v Bump,
    left: Value<'c, 'v>,
    right: Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    let a = left.as_float().expect("checked as float");
    let b = right.as_float().expect("checked as float");
    Ok(match op {
        BinaryOperator::Add => Value::float(a + b),
        BinaryOperator::Sub => Value::float(a - b),
        BinaryOperator::Mul => Value::float(a * b),
        BinaryOperator::Div => Value::float(a / b),
        BinaryOperator::Mod => Value::float(a % b),
        BinaryOperator::Eq => Value::bool(a == b),
        BinaryOperator::Neq => Value::bool(a != b),
        BinaryOperator::Lt => Value::bool(a < b),
        BinaryOperator::Lte => Value::bool(a <= b),
        BinaryOperator::Gt => Value::bool(a > b),
        BinaryOperator::Gte => Value::bool(a >= b),
        BinaryOperator::RegexpMatch | BinaryOperator::NotRegexpMatch => {
            unreachable!("regexp match on floats in a type-checked program")
        }
    })
}

fn string_binary<'c, 'v>(
    op: BinaryOperator,
    arena: &'v Bump,
    left: Value<'c, 'v>,
    right: Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    let a = left.as_str().expect("checked as string");
    let b = right.as_str().expect("checked as string");
    Ok(match op {
        BinaryOperator::Add => {
            let mut joined = bumpalo::collections::String::with_capacity_in(a.len() + b.len(), arena);
            joined.push_str(a);
            joined.push_str(b);
            Value::str(joined.into_bump_str())
        }
        BinaryOperator::Eq => Value::bool(a == b),
        BinaryOperator::Neq => Value::bool(a != b),
        BinaryOperator::Lt => Value::bool(a < b),
        BinaryOperator::Lte => Value::bool(a <= b),
        BinaryOperator::Gt => Value::bool(a > b),
        BinaryOperator::Gte => Value::bool(a >= b),
        _ => unreachable!("unsupported string operator in a type-checked program"),
    })
}

fn regexp_binary<'c, 'v>(
    op: BinaryOperator,
    _arena: &'v Bump,
    left: Value<'c, 'v>,
    right: Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    let subject = left.as_str().expect("checked as string");
    let pattern = right.as_regexp().expect("checked as regexp");
    let regex = regex::Regex::new(pattern).map_err(|err| RuntimeError::InvalidRegexp {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })?;
    let matched = regex.is_match(subject);
    Ok(match op {
        BinaryOperator::RegexpMatch => Value::bool(matched),
        BinaryOperator::NotRegexpMatch => Value::bool(!matched),
        _ => unreachable!("unsupported regexp operator in a type-checked program"),
    })
}

fn bool_binary<'c, 'v>(
    op: BinaryOperator,
    _arena: &'v Bump,
    left: Value<'c, 'v>,
    right: Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    let a = left.as_bool().expect("checked as bool");
    let b = right.as_bool().expect("checked as bool");
    Ok(match op {
        BinaryOperator::Eq => Value::bool(a == b),
        BinaryOperator::Neq => Value::bool(a != b),
        _ => unreachable!("unsupported bool operator in a type-checked program"),
    })
}

fn time_binary<'c, 'v>(
    op: BinaryOperator,
    _arena: &'v Bump,
    left: Value<'c, 'v>,
    right: Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    let a = left.as_time().expect("checked as time");
    let b = right.as_time().expect("checked as time");
    Ok(match op {
        BinaryOperator::Eq => Value::bool(a == b),
        BinaryOperator::Neq => Value::bool(a != b),
        BinaryOperator::Lt => Value::bool(a < b),
        BinaryOperator::Lte => Value::bool(a <= b),
        BinaryOperator::Gt => Value::bool(a > b),
        BinaryOperator::Gte => Value::bool(a >= b),
        _ => unreachable!("unsupported time operator in a type-checked program"),
    })
}

fn duration_binary<'c, 'v>(
    op: BinaryOperator,
    _arena: &'v Bump,
    left: Value<'c, 'v>,
    right: Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    let a = left.as_duration().expect("checked as duration");
    let b = right.as_duration().expect("checked as duration");
    Ok(match op {
        BinaryOperator::Add => Value::duration(a.wrapping_add(b)),
        BinaryOperator::Eq => Value::bool(a == b),
        BinaryOperator::Neq => Value::bool(a != b),
        BinaryOperator::Lt => Value::bool(a < b),
        BinaryOperator::Lte => Value::bool(a <= b),
        BinaryOperator::Gt => Value::bool(a > b),
        BinaryOperator::Gte => Value::bool(a >= b),
        _ => unreachable!("unsupported duration operator in a type-checked program"),
    })
}

fn null_binary<'c, 'v>(
    op: BinaryOperator,
    _arena: &'v Bump,
    _left: Value<'c, 'v>,
    _right: Value<'c, 'v>,
) -> Result<Value<'c, 'v>, RuntimeError> {
    Ok(match op {
        BinaryOperator::Eq => Value::bool(true),
        BinaryOperator::Neq => Value::bool(false),
        _ => unreachable!("unsupported null operator in a type-checked program"),
    })
}

pub(crate) fn eval_unary<'c, 'v>(op: UnaryOperator, value: Value<'c, 'v>) -> Value<'c, 'v>
where
    'c: 'v,
{
    match (op, value.nature()) {
        (UnaryOperator::Neg, Nature::Int) => {
            Value::int(value.as_int().expect("checked as int").wrapping_neg())
        }
        (UnaryOperator::Neg, Nature::Float) => {
            Value::float(-value.as_float().expect("checked as float"))
        }
        (UnaryOperator::Neg, Nature::Duration) => {
            Value::duration(value.as_duration().expect("checked as duration").wrapping_neg())
        }
        (UnaryOperator::Not, Nature::Bool) => {
            Value::bool(!value.as_bool().expect("checked as bool"))
        }
        _ => unreachable!("unary operator on an invalid kind in a type-checked program"),
    }
}
