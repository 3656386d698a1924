//! The runtime value universe.
//!
//! A [`Value`] is a tagged, `Copy` pair of a monomorphic type and a compact
//! representation. Scalars are immediate; strings, arrays, objects, and
//! functions point into the value arena `'v`. Compile-side data (types,
//! evaluator nodes, interned names) lives in `'c`, which outlives `'v`.

use bumpalo::Bump;
use core::fmt;

use crate::interpreter::eval::{Node, ParamSpec};
use crate::interpreter::scope::Scope;
use crate::types::{MonoType, Nature, Prim};

#[derive(Clone, Copy)]
pub struct Value<'c, 'v> {
    ty: &'c MonoType<'c>,
    repr: Repr<'c, 'v>,
}

#[derive(Clone, Copy)]
enum Repr<'c, 'v> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'v str),
    /// Nanoseconds since the Unix epoch, UTC.
    Time(i64),
    /// Nanoseconds.
    Duration(i64),
    /// The source pattern; compiled at evaluation.
    Regexp(&'v str),
    Array(&'v ArrayData<'c, 'v>),
    Object(&'v ObjectData<'c, 'v>),
    Function(&'v FunctionData<'c, 'v>),
}

#[derive(Debug)]
pub struct ArrayData<'c, 'v> {
    pub(crate) ty: &'c MonoType<'c>,
    pub(crate) elements: &'v [Value<'c, 'v>],
}

#[derive(Debug)]
pub struct ObjectData<'c, 'v> {
    pub(crate) ty: &'c MonoType<'c>,
    /// Insertion order; keys are unique.
    pub(crate) properties: &'v [(&'v str, Value<'c, 'v>)],
}

/// A closure: parameter specs, a body evaluator, and the captured scope
/// snapshot taken when the function expression was evaluated.
pub struct FunctionData<'c, 'v> {
    pub(crate) ty: &'c MonoType<'c>,
    pub(crate) params: &'c [ParamSpec<'c>],
    pub(crate) body: &'c Node<'c>,
    pub(crate) scope: Scope<'c, 'v>,
}

impl<'c, 'v> Value<'c, 'v> {
    pub fn null() -> Self {
        Value {
            ty: &MonoType::Prim(Prim::Null),
            repr: Repr::Null,
        }
    }

    pub fn bool(value: bool) -> Self {
        Value {
            ty: &MonoType::Prim(Prim::Bool),
            repr: Repr::Bool(value),
        }
    }

    pub fn int(value: i64) -> Self {
        Value {
            ty: &MonoType::Prim(Prim::Int),
            repr: Repr::Int(value),
        }
    }

    pub fn uint(value: u64) -> Self {
        Value {
            ty: &MonoType::Prim(Prim::UInt),
            repr: Repr::UInt(value),
        }
    }

    pub fn float(value: f64) -> Self {
        Value {
            ty: &MonoType::Prim(Prim::Float),
            repr: Repr::Float(value),
        }
    }

    pub fn str(value: &'v str) -> Self {
        Value {
            ty: &MonoType::Prim(Prim::String),
            repr: Repr::Str(value),
        }
    }

    pub fn time(nanoseconds: i64) -> Self {
        Value {
            ty: &MonoType::Prim(Prim::Time),
            repr: Repr::Time(nanoseconds),
        }
    }

    pub fn duration(nanoseconds: i64) -> Self {
        Value {
            ty: &MonoType::Prim(Prim::Duration),
            repr: Repr::Duration(nanoseconds),
        }
    }

    pub fn regexp(pattern: &'v str) -> Self {
        Value {
            ty: &MonoType::Prim(Prim::Regexp),
            repr: Repr::Regexp(pattern),
        }
    }

    pub fn array(arena: &'v Bump, ty: &'c MonoType<'c>, elements: &[Value<'c, 'v>]) -> Self {
        let data = arena.alloc(ArrayData {
            ty,
            elements: arena.alloc_slice_copy(elements),
        });
        Value {
            ty,
            repr: Repr::Array(data),
        }
    }

    /// Properties keep insertion order; the caller resolves duplicate keys.
    pub fn object(
        arena: &'v Bump,
        ty: &'c MonoType<'c>,
        properties: &[(&'v str, Value<'c, 'v>)],
    ) -> Self {
        let data = arena.alloc(ObjectData {
            ty,
            properties: arena.alloc_slice_copy(properties),
        });
        Value {
            ty,
            repr: Repr::Object(data),
        }
    }

    pub(crate) fn function(arena: &'v Bump, data: FunctionData<'c, 'v>) -> Self {
        let data = arena.alloc(data);
        Value {
            ty: data.ty,
            repr: Repr::Function(data),
        }
    }

    pub fn ty(&self) -> &'c MonoType<'c> {
        self.ty
    }

    pub fn nature(&self) -> Nature {
        match self.repr {
            Repr::Null => Nature::Null,
            Repr::Bool(_) => Nature::Bool,
            Repr::Int(_) => Nature::Int,
            Repr::UInt(_) => Nature::UInt,
            Repr::Float(_) => Nature::Float,
            Repr::Str(_) => Nature::String,
            Repr::Time(_) => Nature::Time,
            Repr::Duration(_) => Nature::Duration,
            Repr::Regexp(_) => Nature::Regexp,
            Repr::Array(_) => Nature::Array,
            Repr::Object(_) => Nature::Object,
            Repr::Function(_) => Nature::Function,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.repr, Repr::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.repr {
            Repr::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.repr {
            Repr::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self.repr {
            Repr::UInt(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.repr {
            Repr::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'v str> {
        match self.repr {
            Repr::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<i64> {
        match self.repr {
            Repr::Time(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<i64> {
        match self.repr {
            Repr::Duration(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_regexp(&self) -> Option<&'v str> {
        match self.repr {
            Repr::Regexp(pattern) => Some(pattern),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&'v ArrayData<'c, 'v>> {
        match self.repr {
            Repr::Array(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&'v ObjectData<'c, 'v>> {
        match self.repr {
            Repr::Object(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&'v FunctionData<'c, 'v>> {
        match self.repr {
            Repr::Function(data) => Some(data),
            _ => None,
        }
    }
}

impl<'c> Value<'c, 'c> {
    /// Widen a compile-arena value into the value arena. Only scalar
    /// literals are stored compile-side, so composites cannot occur here.
    pub(crate) fn promote<'v>(self) -> Value<'c, 'v>
    where
        'c: 'v,
    {
        let repr = match self.repr {
            Repr::Null => Repr::Null,
            Repr::Bool(b) => Repr::Bool(b),
            Repr::Int(i) => Repr::Int(i),
            Repr::UInt(u) => Repr::UInt(u),
            Repr::Float(f) => Repr::Float(f),
            Repr::Str(s) => Repr::Str(s),
            Repr::Time(t) => Repr::Time(t),
            Repr::Duration(d) => Repr::Duration(d),
            Repr::Regexp(p) => Repr::Regexp(p),
            Repr::Array(_) | Repr::Object(_) | Repr::Function(_) => {
                unreachable!("value literals hold scalar values")
            }
        };
        Value { ty: self.ty, repr }
    }
}

impl<'c, 'v> ArrayData<'c, 'v> {
    pub fn ty(&self) -> &'c MonoType<'c> {
        self.ty
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Zero-indexed; out of range is `None`.
    pub fn get(&self, index: usize) -> Option<Value<'c, 'v>> {
        self.elements.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Value<'c, 'v>> + '_ {
        self.elements.iter().copied()
    }

    /// Ordered append, producing a new array value in the arena.
    pub fn append(&self, arena: &'v Bump, value: Value<'c, 'v>) -> Value<'c, 'v> {
        let len = self.elements.len();
        let elements = arena.alloc_slice_fill_with(len + 1, |i| {
            if i < len {
                self.elements[i]
            } else {
                value
            }
        });
        let data = arena.alloc(ArrayData {
            ty: self.ty,
            elements,
        });
        Value {
            ty: self.ty,
            repr: Repr::Array(data),
        }
    }
}

impl<'c, 'v> ObjectData<'c, 'v> {
    pub fn ty(&self) -> &'c MonoType<'c> {
        self.ty
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<Value<'c, 'v>> {
        self.properties
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'v str, Value<'c, 'v>)> + '_ {
        self.properties.iter().copied()
    }
}

impl fmt::Debug for FunctionData<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionData({})", self.ty)
    }
}

impl PartialEq for Value<'_, '_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.repr, other.repr) {
            (Repr::Null, Repr::Null) => true,
            (Repr::Bool(a), Repr::Bool(b)) => a == b,
            (Repr::Int(a), Repr::Int(b)) => a == b,
            (Repr::UInt(a), Repr::UInt(b)) => a == b,
            (Repr::Float(a), Repr::Float(b)) => a == b,
            (Repr::Str(a), Repr::Str(b)) => a == b,
            (Repr::Time(a), Repr::Time(b)) => a == b,
            (Repr::Duration(a), Repr::Duration(b)) => a == b,
            (Repr::Regexp(a), Repr::Regexp(b)) => a == b,
            (Repr::Array(a), Repr::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Repr::Object(a), Repr::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(key, value)| b.get(key) == Some(value))
            }
            (Repr::Function(a), Repr::Function(b)) => core::ptr::eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Value<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            Repr::Null => write!(f, "null"),
            Repr::Bool(b) => write!(f, "{}", b),
            Repr::Int(i) => write!(f, "{}", i),
            Repr::UInt(u) => write!(f, "{}", u),
            Repr::Float(x) => write!(f, "{}", x),
            Repr::Str(s) => write!(f, "{:?}", s),
            Repr::Time(t) => write!(f, "{}ns", t),
            Repr::Duration(d) => write!(f, "{}ns", d),
            Repr::Regexp(pattern) => write!(f, "/{}/", pattern),
            Repr::Array(data) => {
                write!(f, "[")?;
                for (i, element) in data.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Repr::Object(data) => {
                write!(f, "{{")?;
                for (i, (key, value)) in data.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Repr::Function(data) => write!(f, "{}", data.ty),
        }
    }
}
