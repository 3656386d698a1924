//! The constraint solver.
//!
//! Union-find over type variables: the substitution maps each variable to a
//! representative type, which may itself be a variable. `resolve_chain`
//! compresses var→var chains onto the representative variable, so rebinding
//! a representative (as record merging must) is seen through every alias.

use core::cell::RefCell;

use hashbrown::{HashMap, HashSet};

use crate::errors::{ErrorKind, TypeError};
use crate::infer::constraints::{Constraint, Kind};
use crate::span::Span;
use crate::types::labels::LabelSet;
use crate::types::poly::PIPE_LABEL;
use crate::types::{FunctionPoly, PolyType, RecordPoly, Scheme, Tvar, TypeManager};

pub(crate) struct Solver<'c> {
    mgr: &'c TypeManager<'c>,
    subst: RefCell<HashMap<Tvar, &'c PolyType<'c>>>,
    kinds: RefCell<Vec<(Span, Kind, &'c PolyType<'c>)>>,
}

impl<'c> Solver<'c> {
    pub fn new(mgr: &'c TypeManager<'c>) -> Self {
        Solver {
            mgr,
            subst: RefCell::new(HashMap::new()),
            kinds: RefCell::new(Vec::new()),
        }
    }

    /// Process one constraint. `Eq` and `Member` unify immediately; `Kind`
    /// is deferred until [`Solver::check_kinds`].
    pub fn solve(&self, constraint: Constraint<'c>) -> Result<(), TypeError> {
        match constraint {
            Constraint::Eq { left, right, loc } => {
                self.unify(left, right, loc)?;
                Ok(())
            }
            Constraint::Member {
                record,
                label,
                field,
                loc,
            } => {
                let want =
                    self.mgr
                        .record(&[(label, field)], self.mgr.labels(&[label]), LabelSet::All);
                self.unify(record, want, loc)?;
                Ok(())
            }
            Constraint::Kind { ty, kind, loc } => {
                self.kinds.borrow_mut().push((loc, kind, ty));
                Ok(())
            }
        }
    }

    /// Follow the substitution to the representative. Compresses var→var
    /// chains onto the last variable so a later rebind reaches every alias.
    fn resolve_chain(&self, ty: &'c PolyType<'c>) -> (&'c PolyType<'c>, Option<Tvar>) {
        let mut vars: Vec<Tvar> = Vec::new();
        let mut current = ty;
        let repr = loop {
            match current {
                PolyType::Var(v) => {
                    vars.push(*v);
                    let next = self.subst.borrow().get(v).copied();
                    match next {
                        Some(t) => current = t,
                        None => break current,
                    }
                }
                _ => break current,
            }
        };
        let root = vars.last().copied();
        if vars.len() > 1 {
            let root_ty = self.mgr.tvar(root.expect("chain has a root"));
            let mut subst = self.subst.borrow_mut();
            for v in &vars[..vars.len() - 1] {
                subst.insert(*v, root_ty);
            }
        }
        (repr, root)
    }

    pub fn resolve(&self, ty: &'c PolyType<'c>) -> &'c PolyType<'c> {
        self.resolve_chain(ty).0
    }

    /// Unify two types, returning the unified representative.
    pub fn unify(
        &self,
        t1: &'c PolyType<'c>,
        t2: &'c PolyType<'c>,
        loc: Span,
    ) -> Result<&'c PolyType<'c>, TypeError> {
        tracing::trace!(t1 = %t1, t2 = %t2, "unifying");
        let (r1, v1) = self.resolve_chain(t1);
        let (r2, v2) = self.resolve_chain(t2);

        if r1 == r2 {
            // Link the roots so a later rebind of one side (a record merge)
            // is seen through the other.
            if let (Some(a), Some(b)) = (v1, v2) {
                if a != b {
                    self.subst.borrow_mut().insert(a, self.mgr.tvar(b));
                }
            }
            return Ok(r1);
        }

        let result = match (*r1, *r2) {
            // An unbound variable aliases the other side's representative
            // variable when there is one, so the classes stay joined.
            (PolyType::Var(a), _) => {
                let target = match v2 {
                    Some(b) => self.mgr.tvar(b),
                    None => r2,
                };
                return self.bind_var(a, target, loc);
            }
            (_, PolyType::Var(b)) => {
                let target = match v1 {
                    Some(a) => self.mgr.tvar(a),
                    None => r1,
                };
                return self.bind_var(b, target, loc);
            }
            (PolyType::Arr(e1), PolyType::Arr(e2)) => {
                let elem = self.unify(e1, e2, loc)?;
                self.mgr.arr(elem)
            }
            (PolyType::Fun(f), PolyType::Fun(g)) => self.unify_funs(f, g, loc)?,
            (PolyType::Record(a), PolyType::Record(b)) => self.unify_records(a, b, loc)?,
            _ => {
                return Err(TypeError::new(
                    loc,
                    ErrorKind::TypeMismatch {
                        left: self.display(r1),
                        right: self.display(r2),
                    },
                ));
            }
        };

        // Composite unification may have produced a merged representative.
        // Chain the roots (not both onto the result) so the classes stay
        // joined under later merges.
        let mut subst = self.subst.borrow_mut();
        match (v1, v2) {
            (Some(a), Some(b)) => {
                if a != b {
                    subst.insert(b, self.mgr.tvar(a));
                }
                subst.insert(a, result);
            }
            (Some(a), None) => {
                subst.insert(a, result);
            }
            (None, Some(b)) => {
                subst.insert(b, result);
            }
            (None, None) => {}
        }
        Ok(result)
    }

    fn bind_var(
        &self,
        v: Tvar,
        ty: &'c PolyType<'c>,
        loc: Span,
    ) -> Result<&'c PolyType<'c>, TypeError> {
        if self.occurs_in(v, ty) {
            return Err(TypeError::new(
                loc,
                ErrorKind::OccursCheck {
                    var: v.to_string(),
                    ty: self.display(ty),
                },
            ));
        }
        tracing::debug!(var = %v, ty = %ty, "binding type variable");
        self.subst.borrow_mut().insert(v, ty);
        Ok(ty)
    }

    /// Does `v` occur in `ty`? Walks through representatives, not through
    /// unresolved aliases.
    fn occurs_in(&self, v: Tvar, ty: &'c PolyType<'c>) -> bool {
        let resolved = self.resolve(ty);
        match *resolved {
            PolyType::Var(w) => w == v,
            PolyType::Prim(_) => false,
            PolyType::Arr(elem) => self.occurs_in(v, elem),
            PolyType::Fun(f) => {
                f.parameters.iter().any(|p| self.occurs_in(v, p.ty)) || self.occurs_in(v, f.ret)
            }
            PolyType::Record(r) => r.properties.iter().any(|p| self.occurs_in(v, p.ty)),
        }
    }

    fn unify_records(
        &self,
        a: &RecordPoly<'c>,
        b: &RecordPoly<'c>,
        loc: Span,
    ) -> Result<&'c PolyType<'c>, TypeError> {
        let lower = a.lower.union(b.lower, self.mgr);
        let upper = a.upper.intersect(b.upper, self.mgr);
        if !lower.is_subset(&upper) {
            let missing = lower.difference(upper, self.mgr);
            let labels = missing
                .labels()
                .unwrap_or(&[])
                .iter()
                .map(|l| l.to_string())
                .collect();
            return Err(TypeError::new(loc, ErrorKind::MissingProperties { labels }));
        }

        let (pa, pb) = (a.properties, b.properties);
        let mut props: Vec<(&'c str, &'c PolyType<'c>)> = Vec::with_capacity(pa.len() + pb.len());
        let (mut i, mut j) = (0, 0);
        while i < pa.len() && j < pb.len() {
            match pa[i].key.cmp(&pb[j].key) {
                core::cmp::Ordering::Less => {
                    props.push((pa[i].key, pa[i].ty));
                    i += 1;
                }
                core::cmp::Ordering::Greater => {
                    props.push((pb[j].key, pb[j].ty));
                    j += 1;
                }
                core::cmp::Ordering::Equal => {
                    let unified = self.unify(pa[i].ty, pb[j].ty, loc).map_err(|e| {
                        TypeError::new(
                            loc,
                            ErrorKind::RecordAccess {
                                label: pa[i].key.to_string(),
                                inner: Box::new(e.kind),
                            },
                        )
                    })?;
                    props.push((pa[i].key, unified));
                    i += 1;
                    j += 1;
                }
            }
        }
        props.extend(pa[i..].iter().map(|p| (p.key, p.ty)));
        props.extend(pb[j..].iter().map(|p| (p.key, p.ty)));
        props.retain(|(key, _)| upper.contains(key));

        Ok(self.mgr.record(&props, lower, upper))
    }

    fn unify_funs(
        &self,
        f: &FunctionPoly<'c>,
        g: &FunctionPoly<'c>,
        loc: Span,
    ) -> Result<&'c PolyType<'c>, TypeError> {
        // Settle which label the pipe parameter goes by. A call site uses
        // the reserved label until the callee's declared label is known.
        let pipe = match (f.pipe, g.pipe) {
            (None, None) => None,
            (Some(p), None) | (None, Some(p)) => {
                if p == PIPE_LABEL {
                    return Err(TypeError::new(loc, ErrorKind::NoPipeArgument));
                }
                Some(p)
            }
            (Some(p), Some(q)) if p == q => Some(p),
            (Some(p), Some(q)) => {
                if p == PIPE_LABEL {
                    Some(q)
                } else if q == PIPE_LABEL {
                    Some(p)
                } else {
                    return Err(TypeError::new(
                        loc,
                        ErrorKind::PipeArgumentMismatch {
                            left: p.to_string(),
                            right: q.to_string(),
                        },
                    ));
                }
            }
        };

        let f_params = self.renamed_params(f, pipe);
        let g_params = self.renamed_params(g, pipe);
        let f_required = self.renamed_required(f, pipe);
        let g_required = self.renamed_required(g, pipe);

        // Any label one side requires must exist on the other.
        let mut missing: Vec<&str> = Vec::new();
        if let Some(required) = g_required.labels() {
            for label in required.iter().copied() {
                if !f_params.iter().any(|(k, _)| *k == label) {
                    missing.push(label);
                }
            }
        }
        if let Some(required) = f_required.labels() {
            for label in required.iter().copied() {
                if !g_params.iter().any(|(k, _)| *k == label) {
                    missing.push(label);
                }
            }
        }
        if !missing.is_empty() {
            missing.sort_unstable();
            missing.dedup();
            return Err(TypeError::new(
                loc,
                ErrorKind::MissingProperties {
                    labels: missing.iter().map(|l| l.to_string()).collect(),
                },
            ));
        }

        let mut params: Vec<(&'c str, &'c PolyType<'c>)> = Vec::new();
        for (key, t1) in f_params.iter().copied() {
            match g_params.iter().copied().find(|(k, _)| *k == key) {
                Some((_, t2)) => params.push((key, self.unify(t1, t2, loc)?)),
                None => params.push((key, t1)),
            }
        }
        for (key, t2) in g_params.iter().copied() {
            if !f_params.iter().any(|(k, _)| *k == key) {
                params.push((key, t2));
            }
        }

        let ret = self.unify(f.ret, g.ret, loc)?;
        let required = f_required.union(g_required, self.mgr);
        Ok(self.mgr.fun(&params, required, pipe, ret))
    }

    fn renamed_params(
        &self,
        sig: &FunctionPoly<'c>,
        pipe: Option<&'c str>,
    ) -> Vec<(&'c str, &'c PolyType<'c>)> {
        sig.parameters
            .iter()
            .map(|p| {
                if sig.pipe == Some(p.key) {
                    (pipe.unwrap_or(p.key), p.ty)
                } else {
                    (p.key, p.ty)
                }
            })
            .collect()
    }

    fn renamed_required(&self, sig: &FunctionPoly<'c>, pipe: Option<&'c str>) -> LabelSet<'c> {
        match (sig.pipe, pipe) {
            (Some(own), Some(target)) if own != target && sig.required.contains(own) => {
                let labels: Vec<&str> = sig
                    .required
                    .labels()
                    .expect("function required sets are finite")
                    .iter()
                    .map(|l| if *l == own { target } else { *l })
                    .collect();
                self.mgr.labels(&labels)
            }
            _ => sig.required,
        }
    }

    /// Validate deferred kind constraints. A still-unresolved variable is
    /// fine; a concrete type must carry an allowed nature.
    pub fn check_kinds(&self) -> Result<(), TypeError> {
        let kinds = self.kinds.borrow().clone();
        for (loc, kind, ty) in kinds {
            let resolved = self.resolve(ty);
            match resolved.nature() {
                None => {}
                Some(nature) if kind.natures().contains(&nature) => {}
                Some(_) => {
                    return Err(TypeError::new(
                        loc,
                        ErrorKind::InvalidKind {
                            ty: self.display(resolved),
                            kind: kind.to_string(),
                        },
                    ));
                }
            }
        }
        Ok(())
    }

    /// Free type variables of `ty` after resolution.
    pub fn free_vars(&self, ty: &'c PolyType<'c>) -> HashSet<Tvar> {
        let mut vars = HashSet::new();
        self.collect_free(ty, &mut vars);
        vars
    }

    fn collect_free(&self, ty: &'c PolyType<'c>, vars: &mut HashSet<Tvar>) {
        let resolved = self.resolve(ty);
        match *resolved {
            PolyType::Var(v) => {
                vars.insert(v);
            }
            PolyType::Prim(_) => {}
            PolyType::Arr(elem) => self.collect_free(elem, vars),
            PolyType::Fun(f) => {
                for p in f.parameters {
                    self.collect_free(p.ty, vars);
                }
                self.collect_free(f.ret, vars);
            }
            PolyType::Record(r) => {
                for p in r.properties {
                    self.collect_free(p.ty, vars);
                }
            }
        }
    }

    /// Recursively replace every resolved variable with its binding,
    /// rebuilding composites. Unbound variables survive.
    pub fn apply(&self, ty: &'c PolyType<'c>) -> &'c PolyType<'c> {
        let resolved = self.resolve(ty);
        match *resolved {
            PolyType::Prim(_) | PolyType::Var(_) => resolved,
            PolyType::Arr(elem) => self.mgr.arr(self.apply(elem)),
            PolyType::Fun(f) => {
                let params: Vec<(&str, &'c PolyType<'c>)> = f
                    .parameters
                    .iter()
                    .map(|p| (p.key, self.apply(p.ty)))
                    .collect();
                self.mgr.fun(&params, f.required, f.pipe, self.apply(f.ret))
            }
            PolyType::Record(r) => {
                let props: Vec<(&str, &'c PolyType<'c>)> = r
                    .properties
                    .iter()
                    .map(|p| (p.key, self.apply(p.ty)))
                    .collect();
                self.mgr.record(&props, r.lower, r.upper)
            }
        }
    }

    /// Substitute, resolving at every step so nested bindings are seen.
    pub fn substitute(
        &self,
        ty: &'c PolyType<'c>,
        map: &HashMap<Tvar, &'c PolyType<'c>>,
    ) -> &'c PolyType<'c> {
        let resolved = self.resolve(ty);
        match *resolved {
            PolyType::Var(v) => map.get(&v).copied().unwrap_or(resolved),
            PolyType::Prim(_) => resolved,
            PolyType::Arr(elem) => self.mgr.arr(self.substitute(elem, map)),
            PolyType::Fun(f) => {
                let params: Vec<(&str, &'c PolyType<'c>)> = f
                    .parameters
                    .iter()
                    .map(|p| (p.key, self.substitute(p.ty, map)))
                    .collect();
                self.mgr
                    .fun(&params, f.required, f.pipe, self.substitute(f.ret, map))
            }
            PolyType::Record(r) => {
                let props: Vec<(&str, &'c PolyType<'c>)> = r
                    .properties
                    .iter()
                    .map(|p| (p.key, self.substitute(p.ty, map)))
                    .collect();
                self.mgr.record(&props, r.lower, r.upper)
            }
        }
    }

    /// Quantify the free variables of `ty` that are not free in the
    /// environment, producing a scheme.
    pub fn generalize(&self, ty: &'c PolyType<'c>, env_vars: &HashSet<Tvar>) -> Scheme<'c> {
        let mut vars: Vec<Tvar> = self
            .free_vars(ty)
            .into_iter()
            .filter(|v| !env_vars.contains(v))
            .collect();
        if vars.is_empty() {
            return Scheme::mono(ty);
        }
        vars.sort_unstable();
        Scheme::new(self.mgr.alloc_tvars(&vars), ty)
    }

    /// Replace each quantified variable with a fresh one.
    pub fn instantiate(&self, scheme: &Scheme<'c>) -> &'c PolyType<'c> {
        if scheme.is_monomorphic() {
            return scheme.ty;
        }
        let mut map = HashMap::new();
        for v in scheme.quantified {
            map.insert(*v, self.mgr.fresh_tvar());
        }
        self.substitute(scheme.ty, &map)
    }

    fn display(&self, ty: &'c PolyType<'c>) -> String {
        self.apply(ty).to_string()
    }
}
