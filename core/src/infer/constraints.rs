//! Constraints emitted by the generator and consumed by the solver.

use core::fmt;

use crate::span::Span;
use crate::types::{Nature, PolyType};

/// A single constraint, carrying the span of the node that emitted it.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Constraint<'c> {
    /// `left` and `right` must unify.
    Eq {
        left: &'c PolyType<'c>,
        right: &'c PolyType<'c>,
        loc: Span,
    },
    /// `record` must unify with a record whose `label` field has type
    /// `field` and whose lower bound contains `label`.
    Member {
        record: &'c PolyType<'c>,
        label: &'c str,
        field: &'c PolyType<'c>,
        loc: Span,
    },
    /// `ty`, once solved, must have one of the natures `kind` permits.
    /// Checked after the worklist drains; unresolved variables pass.
    Kind {
        ty: &'c PolyType<'c>,
        kind: Kind,
        loc: Span,
    },
}

/// Operator-driven nature families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// `+`: numbers, strings (concatenation), durations.
    Addable,
    /// `-`, `*`, `/`, `%`.
    Numeric,
    /// Ordering comparisons.
    Comparable,
    /// `==` and `!=`.
    Equatable,
    /// Unary negation.
    Negatable,
}

impl Kind {
    pub(crate) fn natures(self) -> &'static [Nature] {
        use Nature::*;
        match self {
            Kind::Addable => &[Int, UInt, Float, String, Duration],
            Kind::Numeric => &[Int, UInt, Float],
            Kind::Comparable => &[Int, UInt, Float, String, Time, Duration],
            Kind::Equatable => &[Null, Bool, Int, UInt, Float, String, Time, Duration],
            Kind::Negatable => &[Int, Float, Duration],
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Addable => "Addable",
            Kind::Numeric => "Numeric",
            Kind::Comparable => "Comparable",
            Kind::Equatable => "Equatable",
            Kind::Negatable => "Negatable",
        };
        f.write_str(name)
    }
}
