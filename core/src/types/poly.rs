//! Polymorphic types: the type language the inference engine works in.

use core::fmt;

use crate::types::labels::LabelSet;
use crate::types::mono::{Nature, Prim};

/// The reserved label a pipe call uses before the callee's declared pipe
/// parameter is known. Function unification renames it.
pub(crate) const PIPE_LABEL: &str = "<-";

/// A type variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tvar(pub u64);

impl fmt::Display for Tvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A polymorphic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolyType<'c> {
    Prim(Prim),
    Var(Tvar),
    Arr(&'c PolyType<'c>),
    Fun(&'c FunctionPoly<'c>),
    Record(&'c RecordPoly<'c>),
}

/// A named field of a record or function parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolyProperty<'c> {
    pub key: &'c str,
    pub ty: &'c PolyType<'c>,
}

/// A polymorphic function signature.
///
/// `required` is a subset of the parameter labels; `pipe`, when present,
/// names one of the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionPoly<'c> {
    /// Sorted by key.
    pub parameters: &'c [PolyProperty<'c>],
    pub required: LabelSet<'c>,
    pub pipe: Option<&'c str>,
    pub ret: &'c PolyType<'c>,
}

impl<'c> FunctionPoly<'c> {
    pub fn param(&self, key: &str) -> Option<&'c PolyType<'c>> {
        self.parameters
            .binary_search_by_key(&key, |p| p.key)
            .ok()
            .map(|i| self.parameters[i].ty)
    }
}

/// A row-polymorphic record type.
///
/// Invariant: `lower ⊆ dom(properties) ⊆ upper`. `lower` is the set of
/// labels known to be present, `upper` the set permitted to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordPoly<'c> {
    /// Sorted by key.
    pub properties: &'c [PolyProperty<'c>],
    pub lower: LabelSet<'c>,
    pub upper: LabelSet<'c>,
}

impl<'c> RecordPoly<'c> {
    pub fn property(&self, key: &str) -> Option<&'c PolyType<'c>> {
        self.properties
            .binary_search_by_key(&key, |p| p.key)
            .ok()
            .map(|i| self.properties[i].ty)
    }
}

impl<'c> PolyType<'c> {
    pub fn nature(&self) -> Option<Nature> {
        match self {
            PolyType::Prim(p) => Some(p.nature()),
            PolyType::Var(_) => None,
            PolyType::Arr(_) => Some(Nature::Array),
            PolyType::Fun(_) => Some(Nature::Function),
            PolyType::Record(_) => Some(Nature::Object),
        }
    }
}

impl fmt::Display for PolyType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolyType::Prim(p) => write!(f, "{}", p),
            PolyType::Var(v) => write!(f, "{}", v),
            PolyType::Arr(elem) => write!(f, "[{}]", elem),
            PolyType::Fun(fun) => write!(f, "{}", fun),
            PolyType::Record(record) => write!(f, "{}", record),
        }
    }
}

impl fmt::Display for FunctionPoly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if self.pipe == Some(p.key) {
                write!(f, "<-")?;
            } else if self.required.contains(p.key) {
                write!(f, "^")?;
            }
            write!(f, "{}: {}", p.key, p.ty)?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

impl fmt::Display for RecordPoly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, p) in self.properties.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", p.key, p.ty)?;
        }
        write!(f, "}}")
    }
}
