//! Type inference.
//!
//! [`infer`] runs constraint generation and solving over a program and
//! returns a [`Solution`]: the mapping from IR node identity to its
//! resolved type. The language-server completion façade consumes the same
//! surface.

pub(crate) mod constraints;
pub(crate) mod env;
pub(crate) mod generate;
pub mod importer;
pub(crate) mod solve;

#[cfg(test)]
mod infer_test;

use hashbrown::HashMap;

use crate::errors::TypeError;
use crate::ir::{Expression, NodeKey, Program};
use crate::types::{MonoType, PolyType, TypeManager};

pub use constraints::Kind;
pub use importer::{Importer, NoImports, PackageType, Packages};

/// The result of inference: every expression node's resolved type.
pub struct Solution<'c> {
    mgr: &'c TypeManager<'c>,
    types: HashMap<NodeKey, &'c PolyType<'c>>,
}

impl<'c> core::fmt::Debug for Solution<'c> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Solution")
            .field("types", &self.types)
            .finish()
    }
}

impl<'c> Solution<'c> {
    /// The resolved poly type of an expression node. Types of nodes inside
    /// polymorphic functions may still mention type variables.
    pub fn poly_of(&self, expr: Expression<'c>) -> Option<&'c PolyType<'c>> {
        self.types.get(&expr.key()).copied()
    }

    /// The monomorphic form of an expression node's type.
    pub fn mono_of(&self, expr: Expression<'c>) -> Option<&'c MonoType<'c>> {
        self.poly_of(expr).map(|ty| self.mgr.mono_from_poly(ty))
    }

    pub(crate) fn manager(&self) -> &'c TypeManager<'c> {
        self.mgr
    }
}

/// Infer types for a whole program.
///
/// The program is inferred as one unit; the first failed constraint aborts
/// inference and is returned with the span of the node that emitted it.
pub fn infer<'c>(
    mgr: &'c TypeManager<'c>,
    program: Program<'c>,
    importer: &dyn Importer<'c>,
) -> Result<Solution<'c>, TypeError> {
    tracing::debug!("inferring program types");
    let generator = generate::ConstraintGenerator::new(mgr, importer);
    let types = generator.run(program)?;
    Ok(Solution { mgr, types })
}
