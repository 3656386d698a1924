//! The lexical type environment.
//!
//! A stack of scopes, searched innermost-first. Two kinds of scope exist:
//!
//! - **Complete scopes**: immutable, pre-populated, sorted for binary search.
//!   Used for extern bindings.
//! - **Incomplete scopes**: names are pre-declared and bound incrementally as
//!   statements are processed, which gives sequential binding semantics (a
//!   later statement sees earlier bindings, never later ones). Used for
//!   files, blocks, and function parameters.

use bumpalo::Bump;

use crate::types::Scheme;

enum TypeScope<'c> {
    Complete(&'c [(&'c str, Scheme<'c>)]),
    Incomplete(&'c mut [(&'c str, Option<Scheme<'c>>)]),
}

impl<'c> TypeScope<'c> {
    fn lookup(&self, name: &str) -> Option<Scheme<'c>> {
        match self {
            TypeScope::Complete(bindings) => bindings
                .binary_search_by_key(&name, |(n, _)| n)
                .ok()
                .map(|i| bindings[i].1),
            TypeScope::Incomplete(bindings) => bindings
                .binary_search_by_key(&name, |(n, _)| n)
                .ok()
                .and_then(|i| bindings[i].1),
        }
    }
}

/// Error when binding a name in the current scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BindError {
    AlreadyBound,
    NotDeclared,
    Immutable,
}

/// Error when pre-declaring scope names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DuplicateName(pub String);

pub(crate) struct Environment<'c> {
    scopes: Vec<TypeScope<'c>>,
}

impl<'c> Environment<'c> {
    pub fn new() -> Self {
        Environment { scopes: Vec::new() }
    }

    /// Push an immutable scope from sorted bindings.
    pub fn push_complete(&mut self, bindings: &'c [(&'c str, Scheme<'c>)]) {
        debug_assert!(
            bindings.windows(2).all(|w| w[0].0 <= w[1].0),
            "bindings must be sorted by name"
        );
        self.scopes.push(TypeScope::Complete(bindings));
    }

    /// Push a mutable scope with the given names declared but unbound.
    pub fn push_incomplete(
        &mut self,
        arena: &'c Bump,
        names: &[&'c str],
    ) -> Result<(), DuplicateName> {
        let mut sorted = names.to_vec();
        sorted.sort_unstable();
        for window in sorted.windows(2) {
            if window[0] == window[1] {
                return Err(DuplicateName(window[0].to_string()));
            }
        }
        let slice = arena.alloc_slice_fill_iter(sorted.iter().map(|name| (*name, None)));
        self.scopes.push(TypeScope::Incomplete(slice));
        Ok(())
    }

    pub fn pop(&mut self) {
        let popped = self.scopes.pop();
        debug_assert!(popped.is_some(), "popped an empty environment");
    }

    /// Bind a declared name in the innermost scope.
    pub fn bind(&mut self, name: &str, scheme: Scheme<'c>) -> Result<(), BindError> {
        match self.scopes.last_mut() {
            None => Err(BindError::NotDeclared),
            Some(TypeScope::Complete(_)) => Err(BindError::Immutable),
            Some(TypeScope::Incomplete(bindings)) => {
                match bindings.binary_search_by_key(&name, |(n, _)| n) {
                    Err(_) => Err(BindError::NotDeclared),
                    Ok(i) => {
                        if bindings[i].1.is_some() {
                            Err(BindError::AlreadyBound)
                        } else {
                            bindings[i].1 = Some(scheme);
                            Ok(())
                        }
                    }
                }
            }
        }
    }

    /// Innermost-first lookup.
    pub fn lookup(&self, name: &str) -> Option<Scheme<'c>> {
        self.scopes.iter().rev().find_map(|scope| scope.lookup(name))
    }

    /// Visit every bound scheme, for computing the environment's free
    /// type variables at generalization points.
    pub fn visit_schemes(&self, mut f: impl FnMut(&Scheme<'c>)) {
        for scope in &self.scopes {
            match scope {
                TypeScope::Complete(bindings) => {
                    for (_, scheme) in bindings.iter() {
                        f(scheme);
                    }
                }
                TypeScope::Incomplete(bindings) => {
                    for (_, scheme) in bindings.iter() {
                        if let Some(scheme) = scheme {
                            f(scheme);
                        }
                    }
                }
            }
        }
    }
}
