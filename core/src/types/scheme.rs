//! Type schemes: `forall`-quantified poly types.

use crate::types::poly::{PolyType, Tvar};

/// A type possibly quantified over type variables.
///
/// Monomorphic bindings use an empty `quantified` list. Instantiation
/// replaces each quantified variable with a fresh one, so every use site of
/// a polymorphic binding receives its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheme<'c> {
    /// Sorted, deduplicated variable ids.
    pub quantified: &'c [Tvar],
    pub ty: &'c PolyType<'c>,
}

impl<'c> Scheme<'c> {
    pub fn new(quantified: &'c [Tvar], ty: &'c PolyType<'c>) -> Self {
        Scheme { quantified, ty }
    }

    /// A scheme with nothing quantified.
    pub fn mono(ty: &'c PolyType<'c>) -> Self {
        Scheme {
            quantified: &[],
            ty,
        }
    }

    pub fn is_monomorphic(&self) -> bool {
        self.quantified.is_empty()
    }
}
