//! Runtime scopes.
//!
//! A scope is a flat name → value map allocated inside the value arena.
//! `copy` duplicates the entries but not the referenced values; closures
//! capture a copy, and every call overlays a fresh copy of the capture.

use bumpalo::Bump;
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::HashMap;

use crate::values::Value;

pub struct Scope<'c, 'v> {
    table: HashMap<&'v str, Value<'c, 'v>, DefaultHashBuilder, &'v Bump>,
}

impl<'c: 'v, 'v> Scope<'c, 'v> {
    pub fn new_in(arena: &'v Bump) -> Self {
        Scope {
            table: HashMap::new_in(arena),
        }
    }

    pub fn set(&mut self, name: &'v str, value: Value<'c, 'v>) {
        self.table.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<Value<'c, 'v>> {
        self.table.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Duplicate the entries into a new scope.
    pub fn copy(&self, arena: &'v Bump) -> Self {
        let mut table = HashMap::with_capacity_in(self.table.len(), arena);
        for (name, value) in &self.table {
            table.insert(*name, *value);
        }
        Scope { table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_are_independent() {
        let arena = Bump::new();
        let mut scope = Scope::new_in(&arena);
        scope.set("a", Value::int(1));

        let mut copy = scope.copy(&arena);
        copy.set("a", Value::int(2));
        copy.set("b", Value::int(3));

        assert_eq!(scope.get("a"), Some(Value::int(1)));
        assert_eq!(scope.get("b"), None);
        assert_eq!(copy.get("a"), Some(Value::int(2)));
        assert_eq!(copy.get("b"), Some(Value::int(3)));
    }
}
