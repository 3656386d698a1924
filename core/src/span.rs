//! Source positions for diagnostics.
//!
//! Every IR node carries the line/column span of the source text it was
//! built from, and type errors render that span as
//! `line:column-line:column` (e.g. `1:1-1:26`). The core never sees the
//! source text itself — the IR arrives already parsed — so spans hold
//! line/column pairs directly rather than byte offsets.

use core::fmt;

/// A half-open source span. Lines and columns are 1-based; an all-zero
/// span means "unknown" (IR constructed programmatically).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Span {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}
