//! Constraint generation.
//!
//! Two passes over the IR: the first assigns a fresh type variable to every
//! expression node (and every function parameter), the second walks the tree
//! emitting constraints by node shape. Constraints are handed to the solver
//! in emission order, so the type of a let-bound initializer is principal by
//! the time the binding generalizes.

use hashbrown::{HashMap, HashSet};

use crate::errors::{ErrorKind, TypeError};
use crate::infer::constraints::{Constraint, Kind};
use crate::infer::env::{BindError, DuplicateName, Environment};
use crate::infer::importer::{Importer, PackageType};
use crate::infer::solve::Solver;
use crate::ir::{
    self, BinaryOperator, Expression, FunctionBody, NodeKey, Program, Statement, UnaryOperator,
};
use crate::span::Span;
use crate::types::poly::PIPE_LABEL;
use crate::types::{PolyType, Scheme, Tvar, TypeManager};

pub(crate) struct ConstraintGenerator<'c, 'i> {
    mgr: &'c TypeManager<'c>,
    solver: Solver<'c>,
    env: Environment<'c>,
    node_vars: HashMap<NodeKey, Tvar>,
    importer: &'i dyn Importer<'c>,
    packages: HashMap<String, Option<PackageType<'c>>>,
}

impl<'c, 'i> ConstraintGenerator<'c, 'i> {
    pub fn new(mgr: &'c TypeManager<'c>, importer: &'i dyn Importer<'c>) -> Self {
        ConstraintGenerator {
            mgr,
            solver: Solver::new(mgr),
            env: Environment::new(),
            node_vars: HashMap::new(),
            importer,
            packages: HashMap::new(),
        }
    }

    /// Annotate, constrain, validate kinds, and produce the per-node
    /// resolved types.
    pub fn run(mut self, program: Program<'c>) -> Result<HashMap<NodeKey, &'c PolyType<'c>>, TypeError> {
        self.annotate_program(program);
        self.program(program)?;
        self.solver.check_kinds()?;

        let mut types = HashMap::with_capacity(self.node_vars.len());
        for (key, var) in &self.node_vars {
            types.insert(*key, self.solver.apply(self.mgr.tvar(*var)));
        }
        Ok(types)
    }

    // Pass one: fresh variables.

    fn annotate_program(&mut self, program: Program<'c>) {
        match program {
            Program::File(file) => {
                for stmt in file.body {
                    self.annotate_statement(stmt);
                }
            }
            Program::Extern(ext) => self.annotate_program(ext.body),
            Program::Expression(expr) => self.annotate_expression(expr),
        }
    }

    fn annotate_statement(&mut self, stmt: &Statement<'c>) {
        match stmt {
            Statement::Expression(expr) => self.annotate_expression(*expr),
            Statement::Assignment(assign) => self.annotate_expression(assign.init),
            Statement::Return(ret) => self.annotate_expression(ret.argument),
        }
    }

    fn annotate_expression(&mut self, expr: Expression<'c>) {
        self.node_vars.insert(expr.key(), self.mgr.fresh_var());
        match expr {
            Expression::String(_)
            | Expression::Int(_)
            | Expression::UInt(_)
            | Expression::Float(_)
            | Expression::Bool(_)
            | Expression::Time(_)
            | Expression::Duration(_)
            | Expression::Regexp(_)
            | Expression::Identifier(_) => {}
            Expression::Member(m) => self.annotate_expression(m.object),
            Expression::Index(ix) => {
                self.annotate_expression(ix.array);
                self.annotate_expression(ix.index);
            }
            Expression::Array(arr) => {
                for element in arr.elements {
                    self.annotate_expression(*element);
                }
            }
            Expression::Object(obj) => {
                for property in obj.properties {
                    self.annotate_expression(property.value);
                }
            }
            Expression::Logical(l) => {
                self.annotate_expression(l.left);
                self.annotate_expression(l.right);
            }
            Expression::Conditional(c) => {
                self.annotate_expression(c.test);
                self.annotate_expression(c.consequent);
                self.annotate_expression(c.alternate);
            }
            Expression::Unary(u) => self.annotate_expression(u.argument),
            Expression::Binary(b) => {
                self.annotate_expression(b.left);
                self.annotate_expression(b.right);
            }
            Expression::Call(call) => {
                self.annotate_expression(call.callee);
                self.annotate_expression(Expression::Object(call.arguments));
            }
            Expression::Pipe(pipe) => {
                self.annotate_expression(pipe.argument);
                self.annotate_expression(Expression::Call(pipe.call));
            }
            Expression::Function(fun) => {
                for param in fun.parameters {
                    self.node_vars.insert(param.key_node(), self.mgr.fresh_var());
                    if let Some(default) = param.default {
                        self.annotate_expression(default);
                    }
                }
                match fun.body {
                    FunctionBody::Expression(body) => self.annotate_expression(body),
                    FunctionBody::Block(block) => {
                        for stmt in block.body {
                            self.annotate_statement(stmt);
                        }
                    }
                }
            }
        }
    }

    // Pass two: constraints.

    fn program(&mut self, program: Program<'c>) -> Result<(), TypeError> {
        match program {
            Program::File(file) => self.file(file),
            Program::Extern(ext) => self.extern_program(ext),
            Program::Expression(expr) => {
                self.expression(expr)?;
                Ok(())
            }
        }
    }

    fn extern_program(&mut self, ext: &'c ir::Extern<'c>) -> Result<(), TypeError> {
        let mut bindings: Vec<(&'c str, Scheme<'c>)> = ext
            .bindings
            .iter()
            .map(|b| {
                let name = self.mgr.intern_str(b.name);
                (name, self.solver.generalize(b.ty, &HashSet::new()))
            })
            .collect();
        bindings.sort_by_key(|(name, _)| *name);
        let bindings = self.mgr.arena().alloc_slice_copy(&bindings);
        self.env.push_complete(bindings);
        self.program(ext.body)?;
        self.env.pop();
        Ok(())
    }

    fn file(&mut self, file: &'c ir::File<'c>) -> Result<(), TypeError> {
        let mut packages: Vec<PackageType<'c>> = Vec::with_capacity(file.imports.len());
        for import in file.imports {
            packages.push(self.import(import)?);
        }

        let mut names: Vec<&'c str> = packages.iter().map(|pkg| pkg.name).collect();
        for stmt in file.body {
            if let Statement::Assignment(assign) = stmt {
                names.push(assign.name);
            }
        }
        self.env
            .push_incomplete(self.mgr.arena(), &names)
            .map_err(|DuplicateName(name)| {
                TypeError::new(file.loc, ErrorKind::Redeclaration { name })
            })?;

        for pkg in packages {
            let scheme = self.solver.generalize(pkg.ty, &HashSet::new());
            self.env
                .bind(pkg.name, scheme)
                .expect("import name was pre-declared");
        }
        for stmt in file.body {
            self.statement(stmt)?;
        }
        self.env.pop();
        Ok(())
    }

    fn import(&mut self, import: &'c ir::ImportDeclaration<'c>) -> Result<PackageType<'c>, TypeError> {
        let package = match self.packages.get(import.path) {
            Some(cached) => *cached,
            None => {
                let resolved = self.importer.import(import.path);
                self.packages.insert(import.path.to_string(), resolved);
                resolved
            }
        };
        package.ok_or_else(|| {
            TypeError::new(
                import.loc,
                ErrorKind::InvalidImportPath {
                    path: import.path.to_string(),
                },
            )
        })
    }

    fn statement(&mut self, stmt: &Statement<'c>) -> Result<(), TypeError> {
        match stmt {
            Statement::Expression(expr) => {
                self.expression(*expr)?;
                Ok(())
            }
            Statement::Assignment(assign) => {
                let init_ty = self.expression(assign.init)?;
                let env_vars = self.env_free_vars();
                let scheme = self.solver.generalize(init_ty, &env_vars);
                self.env.bind(assign.name, scheme).map_err(|err| match err {
                    BindError::AlreadyBound => TypeError::new(
                        assign.loc,
                        ErrorKind::Redeclaration {
                            name: assign.name.to_string(),
                        },
                    ),
                    BindError::NotDeclared | BindError::Immutable => {
                        unreachable!("assignment names are pre-declared in their scope")
                    }
                })?;
                Ok(())
            }
            Statement::Return(ret) => {
                self.expression(ret.argument)?;
                Ok(())
            }
        }
    }

    fn block(&mut self, block: &'c ir::Block<'c>) -> Result<&'c PolyType<'c>, TypeError> {
        let mut names: Vec<&'c str> = Vec::new();
        for stmt in block.body {
            if let Statement::Assignment(assign) = stmt {
                names.push(assign.name);
            }
        }
        self.env
            .push_incomplete(self.mgr.arena(), &names)
            .map_err(|DuplicateName(name)| {
                TypeError::new(block.loc, ErrorKind::Redeclaration { name })
            })?;

        let mut return_ty: Option<&'c PolyType<'c>> = None;
        for stmt in block.body {
            self.statement(stmt)?;
            if let Statement::Return(ret) = stmt {
                return_ty = Some(self.tv(ret.argument));
            }
        }
        self.env.pop();
        Ok(return_ty.unwrap_or_else(|| self.mgr.null()))
    }

    fn expression(&mut self, expr: Expression<'c>) -> Result<&'c PolyType<'c>, TypeError> {
        let tv = self.tv(expr);
        match expr {
            Expression::String(lit) => self.eq(tv, self.mgr.string(), lit.loc)?,
            Expression::Int(lit) => self.eq(tv, self.mgr.int(), lit.loc)?,
            Expression::UInt(lit) => self.eq(tv, self.mgr.uint(), lit.loc)?,
            Expression::Float(lit) => self.eq(tv, self.mgr.float(), lit.loc)?,
            Expression::Bool(lit) => self.eq(tv, self.mgr.bool(), lit.loc)?,
            Expression::Time(lit) => self.eq(tv, self.mgr.time(), lit.loc)?,
            Expression::Duration(lit) => self.eq(tv, self.mgr.duration(), lit.loc)?,
            Expression::Regexp(lit) => self.eq(tv, self.mgr.regexp(), lit.loc)?,

            Expression::Identifier(id) => {
                let Some(scheme) = self.env.lookup(id.name) else {
                    return Err(TypeError::new(
                        id.loc,
                        ErrorKind::UndefinedIdentifier {
                            name: id.name.to_string(),
                        },
                    ));
                };
                let instance = self.solver.instantiate(&scheme);
                self.eq(tv, instance, id.loc)?;
            }

            Expression::Member(m) => {
                let object_ty = self.expression(m.object)?;
                let field = self.mgr.fresh_tvar();
                self.solver.solve(Constraint::Member {
                    record: object_ty,
                    label: self.mgr.intern_str(m.property),
                    field,
                    loc: m.loc,
                })?;
                self.eq(tv, field, m.loc)?;
            }

            Expression::Index(ix) => {
                let array_ty = self.expression(ix.array)?;
                let index_ty = self.expression(ix.index)?;
                self.eq(index_ty, self.mgr.int(), ix.index.loc())?;
                let element = self.mgr.fresh_tvar();
                self.eq(array_ty, self.mgr.arr(element), ix.loc)?;
                self.eq(tv, element, ix.loc)?;
            }

            Expression::Array(arr) => {
                let element = self.mgr.fresh_tvar();
                for item in arr.elements {
                    let item_ty = self.expression(*item)?;
                    self.eq(item_ty, element, item.loc())?;
                }
                self.eq(tv, self.mgr.arr(element), arr.loc)?;
            }

            Expression::Object(obj) => {
                let mut props: Vec<(&'c str, &'c PolyType<'c>)> = Vec::new();
                for property in obj.properties {
                    let value_ty = self.expression(property.value)?;
                    // Later keys overwrite earlier ones, as at evaluation.
                    match props.iter().position(|(key, _)| *key == property.key) {
                        Some(slot) => props[slot].1 = value_ty,
                        None => props.push((property.key, value_ty)),
                    }
                }
                let keys: Vec<&str> = props.iter().map(|(key, _)| *key).collect();
                let labels = self.mgr.labels(&keys);
                self.eq(tv, self.mgr.record(&props, labels, labels), obj.loc)?;
            }

            Expression::Logical(l) => {
                let left_ty = self.expression(l.left)?;
                let right_ty = self.expression(l.right)?;
                self.eq(left_ty, self.mgr.bool(), l.left.loc())?;
                self.eq(right_ty, self.mgr.bool(), l.right.loc())?;
                self.eq(tv, self.mgr.bool(), l.loc)?;
            }

            Expression::Conditional(c) => {
                let test_ty = self.expression(c.test)?;
                self.eq(test_ty, self.mgr.bool(), c.test.loc())?;
                let consequent_ty = self.expression(c.consequent)?;
                let alternate_ty = self.expression(c.alternate)?;
                self.eq(consequent_ty, alternate_ty, c.loc)?;
                self.eq(tv, consequent_ty, c.loc)?;
            }

            Expression::Unary(u) => {
                let argument_ty = self.expression(u.argument)?;
                match u.operator {
                    UnaryOperator::Not => {
                        self.eq(argument_ty, self.mgr.bool(), u.loc)?;
                        self.eq(tv, self.mgr.bool(), u.loc)?;
                    }
                    UnaryOperator::Neg => {
                        self.eq(tv, argument_ty, u.loc)?;
                        self.kind(argument_ty, Kind::Negatable, u.loc)?;
                    }
                }
            }

            Expression::Binary(b) => {
                let left_ty = self.expression(b.left)?;
                let right_ty = self.expression(b.right)?;
                match b.operator {
                    BinaryOperator::Add => {
                        self.solver.unify(left_ty, right_ty, b.loc)?;
                        self.eq(tv, left_ty, b.loc)?;
                        self.kind(left_ty, Kind::Addable, b.loc)?;
                    }
                    BinaryOperator::Sub
                    | BinaryOperator::Mul
                    | BinaryOperator::Div
                    | BinaryOperator::Mod => {
                        self.solver.unify(left_ty, right_ty, b.loc)?;
                        self.eq(tv, left_ty, b.loc)?;
                        self.kind(left_ty, Kind::Numeric, b.loc)?;
                    }
                    BinaryOperator::Lt
                    | BinaryOperator::Lte
                    | BinaryOperator::Gt
                    | BinaryOperator::Gte => {
                        self.solver.unify(left_ty, right_ty, b.loc)?;
                        self.eq(tv, self.mgr.bool(), b.loc)?;
                        self.kind(left_ty, Kind::Comparable, b.loc)?;
                    }
                    BinaryOperator::Eq | BinaryOperator::Neq => {
                        self.solver.unify(left_ty, right_ty, b.loc)?;
                        self.eq(tv, self.mgr.bool(), b.loc)?;
                        self.kind(left_ty, Kind::Equatable, b.loc)?;
                    }
                    BinaryOperator::RegexpMatch | BinaryOperator::NotRegexpMatch => {
                        self.eq(left_ty, self.mgr.string(), b.left.loc())?;
                        self.eq(right_ty, self.mgr.regexp(), b.right.loc())?;
                        self.eq(tv, self.mgr.bool(), b.loc)?;
                    }
                }
            }

            Expression::Call(call) => {
                self.call(call, None)?;
            }

            Expression::Pipe(pipe) => {
                let argument_ty = self.expression(pipe.argument)?;
                let call_ty = self.call(pipe.call, Some(argument_ty))?;
                self.eq(tv, call_ty, pipe.loc)?;
            }

            Expression::Function(fun) => {
                // Defaults are typed in the enclosing scope; they may not
                // reference sibling parameters.
                let mut default_tys: Vec<Option<&'c PolyType<'c>>> =
                    Vec::with_capacity(fun.parameters.len());
                for param in fun.parameters {
                    match param.default {
                        Some(default) => default_tys.push(Some(self.expression(default)?)),
                        None => default_tys.push(None),
                    }
                }

                let names: Vec<&'c str> = fun.parameters.iter().map(|p| p.key).collect();
                self.env
                    .push_incomplete(self.mgr.arena(), &names)
                    .map_err(|DuplicateName(name)| {
                        TypeError::new(fun.loc, ErrorKind::DuplicateParameter { name })
                    })?;

                let mut params: Vec<(&'c str, &'c PolyType<'c>)> = Vec::new();
                let mut required: Vec<&'c str> = Vec::new();
                let mut pipe: Option<&'c str> = None;
                for (param, default_ty) in fun.parameters.iter().zip(&default_tys) {
                    let param_ty = self.mgr.tvar(self.param_var(param));
                    self.env
                        .bind(param.key, Scheme::mono(param_ty))
                        .expect("parameter was pre-declared");
                    if let Some(default_ty) = default_ty {
                        self.solver.unify(param_ty, default_ty, param.loc)?;
                    } else {
                        required.push(param.key);
                    }
                    if param.is_pipe {
                        pipe = Some(param.key);
                    }
                    params.push((param.key, param_ty));
                }

                let body_ty = match fun.body {
                    FunctionBody::Expression(body) => self.expression(body)?,
                    FunctionBody::Block(block) => self.block(block)?,
                };
                self.env.pop();

                let fun_ty = self.mgr.fun(&params, self.mgr.labels(&required), pipe, body_ty);
                self.eq(tv, fun_ty, fun.loc)?;
            }
        }
        Ok(tv)
    }

    fn call(
        &mut self,
        call: &'c ir::CallExpression<'c>,
        pipe_argument: Option<&'c PolyType<'c>>,
    ) -> Result<&'c PolyType<'c>, TypeError> {
        let tv = self.tv(Expression::Call(call));
        let callee_ty = self.expression(call.callee)?;
        self.expression(Expression::Object(call.arguments))?;

        let mut params: Vec<(&'c str, &'c PolyType<'c>)> = Vec::new();
        for property in call.arguments.properties {
            let value_ty = self.tv(property.value);
            match params.iter().position(|(key, _)| *key == property.key) {
                Some(slot) => params[slot].1 = value_ty,
                None => params.push((property.key, value_ty)),
            }
        }
        let mut labels: Vec<&str> = params.iter().map(|(key, _)| *key).collect();
        let mut pipe = None;
        if let Some(argument_ty) = pipe_argument {
            params.push((PIPE_LABEL, argument_ty));
            labels.push(PIPE_LABEL);
            pipe = Some(PIPE_LABEL);
        }

        let call_ty = self.mgr.fun(&params, self.mgr.labels(&labels), pipe, tv);
        self.solver.unify(callee_ty, call_ty, call.loc)?;
        Ok(tv)
    }

    fn tv(&self, expr: Expression<'c>) -> &'c PolyType<'c> {
        let var = self
            .node_vars
            .get(&expr.key())
            .expect("every expression was annotated with a type variable");
        self.mgr.tvar(*var)
    }

    fn param_var(&self, param: &'c ir::FunctionParameter<'c>) -> Tvar {
        *self
            .node_vars
            .get(&param.key_node())
            .expect("every parameter was annotated with a type variable")
    }

    fn env_free_vars(&self) -> HashSet<Tvar> {
        let mut vars = HashSet::new();
        self.env.visit_schemes(|scheme| {
            let mut free = self.solver.free_vars(scheme.ty);
            for quantified in scheme.quantified {
                free.remove(quantified);
            }
            vars.extend(free);
        });
        vars
    }

    fn eq(&self, left: &'c PolyType<'c>, right: &'c PolyType<'c>, loc: Span) -> Result<(), TypeError> {
        self.solver.solve(Constraint::Eq { left, right, loc })
    }

    fn kind(&self, ty: &'c PolyType<'c>, kind: Kind, loc: Span) -> Result<(), TypeError> {
        self.solver.solve(Constraint::Kind { ty, kind, loc })
    }
}
