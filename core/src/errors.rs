//! User-facing type errors.
//!
//! Every inference failure is reported as a single [`TypeError`] anchored to
//! the source span of the constraint-emitting node, rendered as
//! `type error <line>:<col>-<line>:<col>: <message>`.

use snafu::Snafu;

use crate::span::Span;

/// The reason a program failed to type check.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ErrorKind {
    /// Two types that must be equal are not.
    #[snafu(display("{left} != {right}"))]
    TypeMismatch { left: String, right: String },

    /// A record or call is missing labels its consumer requires.
    #[snafu(display("missing object properties ({})", labels.join(", ")))]
    MissingProperties { labels: Vec<String> },

    /// Unifying would construct an infinite type.
    #[snafu(display("type var {var} occurs in {ty} creating a cycle"))]
    OccursCheck { var: String, ty: String },

    /// A record field exists on both sides but its types disagree.
    #[snafu(display("invalid record access {label:?}: {inner}"))]
    RecordAccess { label: String, inner: Box<ErrorKind> },

    /// A concrete type reached an operator it does not support.
    #[snafu(display("{ty} is not {kind}"))]
    InvalidKind { ty: String, kind: String },

    /// An identifier is not bound in the lexical environment.
    #[snafu(display("undefined identifier {name}"))]
    UndefinedIdentifier { name: String },

    /// The importer had no package for the requested path.
    #[snafu(display("invalid import path {path:?}"))]
    InvalidImportPath { path: String },

    /// A pipe expression targets a function with no pipe parameter.
    #[snafu(display("function does not take a pipe argument"))]
    NoPipeArgument,

    /// Two pipe-carrying functions declare different pipe parameters.
    #[snafu(display("mismatched pipe arguments {left:?} and {right:?}"))]
    PipeArgumentMismatch { left: String, right: String },

    /// A name is assigned twice in the same scope.
    #[snafu(display("variable {name} redeclared"))]
    Redeclaration { name: String },

    /// A function expression declares the same parameter twice.
    #[snafu(display("duplicate parameter {name}"))]
    DuplicateParameter { name: String },
}

/// A type error with the span of the offending node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub span: Span,
    pub kind: ErrorKind,
}

impl TypeError {
    pub fn new(span: Span, kind: ErrorKind) -> Self {
        TypeError { span, kind }
    }
}

impl core::fmt::Display for TypeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "type error {}: {}", self.span, self.kind)
    }
}

impl std::error::Error for TypeError {}
