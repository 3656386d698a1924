//! Arena-backed construction of types.
//!
//! All types are allocated in a [`Bump`] arena and handed out as `&'c`
//! references. Strings (labels, parameter names) are interned so that a
//! label slice never holds duplicates pointing at different allocations.

use bumpalo::Bump;
use core::cell::{Cell, RefCell};
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::HashMap;

use crate::types::labels::LabelSet;
use crate::types::mono::{MonoFunction, MonoProperty, MonoType, Prim};
use crate::types::poly::{FunctionPoly, PolyProperty, PolyType, RecordPoly, Tvar};

pub struct TypeManager<'c> {
    arena: &'c Bump,
    interned_strs: RefCell<HashMap<&'c str, &'c str, DefaultHashBuilder, &'c Bump>>,
    next_var: Cell<u64>,
}

impl<'c> core::fmt::Debug for TypeManager<'c> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeManager")
            .field("next_var", &self.next_var)
            .finish()
    }
}

impl<'c> TypeManager<'c> {
    pub fn new(arena: &'c Bump) -> &'c Self {
        arena.alloc(Self {
            arena,
            interned_strs: RefCell::new(HashMap::new_in(arena)),
            next_var: Cell::new(0),
        })
    }

    pub(crate) fn arena(&self) -> &'c Bump {
        self.arena
    }

    pub fn intern_str(&self, s: &str) -> &'c str {
        if let Some(&interned) = self.interned_strs.borrow().get(s) {
            return interned;
        }
        let arena_str = self.arena.alloc_str(s);
        self.interned_strs.borrow_mut().insert(arena_str, arena_str);
        arena_str
    }

    /// Generate a fresh type variable id.
    pub fn fresh_var(&self) -> Tvar {
        let id = self.next_var.get();
        self.next_var.set(id.checked_add(1).expect("Tvar id overflowed"));
        Tvar(id)
    }

    // Poly type factories.

    pub fn prim(&self, p: Prim) -> &'c PolyType<'c> {
        self.arena.alloc(PolyType::Prim(p))
    }

    pub fn null(&self) -> &'c PolyType<'c> {
        self.prim(Prim::Null)
    }
    pub fn bool(&self) -> &'c PolyType<'c> {
        self.prim(Prim::Bool)
    }
    pub fn int(&self) -> &'c PolyType<'c> {
        self.prim(Prim::Int)
    }
    pub fn uint(&self) -> &'c PolyType<'c> {
        self.prim(Prim::UInt)
    }
    pub fn float(&self) -> &'c PolyType<'c> {
        self.prim(Prim::Float)
    }
    pub fn string(&self) -> &'c PolyType<'c> {
        self.prim(Prim::String)
    }
    pub fn time(&self) -> &'c PolyType<'c> {
        self.prim(Prim::Time)
    }
    pub fn duration(&self) -> &'c PolyType<'c> {
        self.prim(Prim::Duration)
    }
    pub fn regexp(&self) -> &'c PolyType<'c> {
        self.prim(Prim::Regexp)
    }

    pub fn tvar(&self, v: Tvar) -> &'c PolyType<'c> {
        self.arena.alloc(PolyType::Var(v))
    }

    pub fn fresh_tvar(&self) -> &'c PolyType<'c> {
        self.tvar(self.fresh_var())
    }

    pub fn arr(&self, elem: &'c PolyType<'c>) -> &'c PolyType<'c> {
        self.arena.alloc(PolyType::Arr(elem))
    }

    pub fn fun(
        &self,
        parameters: &[(&str, &'c PolyType<'c>)],
        required: LabelSet<'c>,
        pipe: Option<&str>,
        ret: &'c PolyType<'c>,
    ) -> &'c PolyType<'c> {
        let parameters = self.poly_properties(parameters);
        let pipe = pipe.map(|label| self.intern_str(label));
        self.arena.alloc(PolyType::Fun(self.arena.alloc(FunctionPoly {
            parameters,
            required,
            pipe,
            ret,
        })))
    }

    pub fn record(
        &self,
        properties: &[(&str, &'c PolyType<'c>)],
        lower: LabelSet<'c>,
        upper: LabelSet<'c>,
    ) -> &'c PolyType<'c> {
        let properties = self.poly_properties(properties);
        self.arena.alloc(PolyType::Record(self.arena.alloc(RecordPoly {
            properties,
            lower,
            upper,
        })))
    }

    fn poly_properties(&self, properties: &[(&str, &'c PolyType<'c>)]) -> &'c [PolyProperty<'c>] {
        let mut props: Vec<PolyProperty<'c>> = properties
            .iter()
            .map(|(key, ty)| PolyProperty {
                key: self.intern_str(key),
                ty: *ty,
            })
            .collect();
        props.sort_by_key(|p| p.key);
        debug_assert!(
            props.windows(2).all(|w| w[0].key != w[1].key),
            "duplicate property keys"
        );
        self.arena.alloc_slice_copy(&props)
    }

    /// Intern, sort, and deduplicate a finite label set.
    pub fn labels(&self, names: &[&str]) -> LabelSet<'c> {
        let mut labels: Vec<&'c str> = names.iter().map(|n| self.intern_str(n)).collect();
        labels.sort_unstable();
        labels.dedup();
        LabelSet::Finite(self.arena.alloc_slice_copy(&labels))
    }

    /// Allocate an already sorted, deduplicated, interned label slice.
    pub(crate) fn alloc_label_slice(&self, labels: &[&'c str]) -> &'c [&'c str] {
        debug_assert!(labels.windows(2).all(|w| w[0] < w[1]), "labels not sorted");
        self.arena.alloc_slice_copy(labels)
    }

    pub(crate) fn alloc_tvars(&self, vars: &[Tvar]) -> &'c [Tvar] {
        self.arena.alloc_slice_copy(vars)
    }

    // Mono type factories.

    pub fn mono_prim(&self, p: Prim) -> &'c MonoType<'c> {
        self.arena.alloc(MonoType::Prim(p))
    }

    pub fn mono_var(&self, v: Tvar) -> &'c MonoType<'c> {
        self.arena.alloc(MonoType::Var(v))
    }

    pub fn mono_arr(&self, elem: &'c MonoType<'c>) -> &'c MonoType<'c> {
        self.arena.alloc(MonoType::Arr(elem))
    }

    pub fn mono_object(&self, properties: &[(&str, &'c MonoType<'c>)]) -> &'c MonoType<'c> {
        self.arena
            .alloc(MonoType::Object(self.mono_properties(properties)))
    }

    pub fn mono_fun(
        &self,
        parameters: &[(&str, &'c MonoType<'c>)],
        required: &[&str],
        pipe: Option<&str>,
        ret: &'c MonoType<'c>,
    ) -> &'c MonoType<'c> {
        let mut req: Vec<&'c str> = required.iter().map(|n| self.intern_str(n)).collect();
        req.sort_unstable();
        req.dedup();
        self.arena.alloc(MonoType::Fun(self.arena.alloc(MonoFunction {
            parameters: self.mono_properties(parameters),
            required: self.arena.alloc_slice_copy(&req),
            pipe: pipe.map(|label| self.intern_str(label)),
            ret,
        })))
    }

    fn mono_properties(&self, properties: &[(&str, &'c MonoType<'c>)]) -> &'c [MonoProperty<'c>] {
        let mut props: Vec<MonoProperty<'c>> = properties
            .iter()
            .map(|(key, ty)| MonoProperty {
                key: self.intern_str(key),
                ty: *ty,
            })
            .collect();
        props.sort_by_key(|p| p.key);
        self.arena.alloc_slice_copy(&props)
    }

    /// Convert a solved poly type to its monomorphic form. Unresolved
    /// variables survive as [`MonoType::Var`]; record bounds are dropped.
    pub fn mono_from_poly(&self, ty: &'c PolyType<'c>) -> &'c MonoType<'c> {
        match ty {
            PolyType::Prim(p) => self.mono_prim(*p),
            PolyType::Var(v) => self.mono_var(*v),
            PolyType::Arr(elem) => self.mono_arr(self.mono_from_poly(elem)),
            PolyType::Fun(fun) => {
                let params: Vec<(&str, &'c MonoType<'c>)> = fun
                    .parameters
                    .iter()
                    .map(|p| (p.key, self.mono_from_poly(p.ty)))
                    .collect();
                let required: Vec<&str> = fun.required.labels().unwrap_or(&[]).to_vec();
                self.mono_fun(&params, &required, fun.pipe, self.mono_from_poly(fun.ret))
            }
            PolyType::Record(record) => {
                let props: Vec<(&str, &'c MonoType<'c>)> = record
                    .properties
                    .iter()
                    .map(|p| (p.key, self.mono_from_poly(p.ty)))
                    .collect();
                self.mono_object(&props)
            }
        }
    }
}
