//! Lowering typed IR to the evaluator tree.
//!
//! Compilation cannot fail on well-typed IR: every lookup into the solution
//! and the operator table is an assertion. Extern bindings compile to
//! nothing (their values arrive in the initial scope) and imports compile to
//! `Noop` (the host binds package values by name).

use bumpalo::Bump;

use crate::infer::Solution;
use crate::interpreter::eval::{Node, ObjProperty, ParamSpec};
use crate::interpreter::operators;
use crate::ir::{self, Expression, FunctionBody, Program, Statement};
use crate::types::{MonoType, Prim};

/// Lower a typed program to its evaluator root.
pub fn compile<'c>(
    arena: &'c Bump,
    program: Program<'c>,
    solution: &Solution<'c>,
) -> &'c Node<'c> {
    let compiler = Compiler { arena, solution };
    arena.alloc(compiler.program(program))
}

struct Compiler<'c, 's> {
    arena: &'c Bump,
    solution: &'s Solution<'c>,
}

impl<'c, 's> Compiler<'c, 's> {
    fn program(&self, program: Program<'c>) -> Node<'c> {
        match program {
            Program::File(file) => {
                let mut body: Vec<Node<'c>> = file.imports.iter().map(|_| Node::Noop).collect();
                for stmt in file.body {
                    body.push(self.statement(stmt));
                }
                let ty = body
                    .last()
                    .map(|node| node.ty())
                    .unwrap_or(&MonoType::Prim(Prim::Null));
                Node::Block {
                    ty,
                    body: self.arena.alloc_slice_copy(&body),
                }
            }
            Program::Extern(ext) => self.program(ext.body),
            Program::Expression(expr) => self.expression(expr),
        }
    }

    fn statement(&self, stmt: &Statement<'c>) -> Node<'c> {
        match stmt {
            Statement::Expression(expr) => self.expression(*expr),
            Statement::Assignment(assign) => Node::Declaration {
                ty: self.mono(assign.init),
                name: assign.name,
                init: self.alloc(self.expression(assign.init)),
            },
            Statement::Return(ret) => Node::Return {
                node: self.alloc(self.expression(ret.argument)),
            },
        }
    }

    fn block(&self, block: &'c ir::Block<'c>) -> Node<'c> {
        let body: Vec<Node<'c>> = block.body.iter().map(|stmt| self.statement(stmt)).collect();
        let ty = block
            .body
            .iter()
            .rev()
            .find_map(|stmt| match stmt {
                Statement::Return(ret) => Some(self.mono(ret.argument)),
                _ => None,
            })
            .unwrap_or(&MonoType::Prim(Prim::Null));
        Node::Block {
            ty,
            body: self.arena.alloc_slice_copy(&body),
        }
    }

    fn expression(&self, expr: Expression<'c>) -> Node<'c> {
        match expr {
            Expression::Bool(lit) => Node::BoolLit { value: lit.value },
            Expression::Int(lit) => Node::IntLit { value: lit.value },
            Expression::UInt(lit) => Node::UintLit { value: lit.value },
            Expression::Float(lit) => Node::FloatLit { value: lit.value },
            Expression::String(lit) => Node::StrLit { value: lit.value },
            Expression::Time(lit) => Node::TimeLit { value: lit.value },
            Expression::Duration(lit) => Node::DurationLit { value: lit.value },
            Expression::Regexp(lit) => Node::RegexpLit {
                pattern: lit.pattern,
            },

            Expression::Identifier(id) => Node::Identifier {
                ty: self.mono(expr),
                name: id.name,
            },

            Expression::Member(m) => Node::Member {
                ty: self.mono(expr),
                object: self.alloc(self.expression(m.object)),
                property: m.property,
            },

            Expression::Index(ix) => Node::Index {
                ty: self.mono(expr),
                array: self.alloc(self.expression(ix.array)),
                index: self.alloc(self.expression(ix.index)),
            },

            Expression::Array(arr) => {
                let elements: Vec<Node<'c>> = arr
                    .elements
                    .iter()
                    .map(|element| self.expression(*element))
                    .collect();
                Node::Array {
                    ty: self.mono(expr),
                    elements: self.arena.alloc_slice_copy(&elements),
                }
            }

            Expression::Object(obj) => {
                let properties: Vec<ObjProperty<'c>> = obj
                    .properties
                    .iter()
                    .map(|property| ObjProperty {
                        key: property.key,
                        value: self.expression(property.value),
                    })
                    .collect();
                Node::Obj {
                    ty: self.mono(expr),
                    properties: self.arena.alloc_slice_copy(&properties),
                }
            }

            Expression::Logical(l) => Node::Logical {
                ty: self.mono(expr),
                operator: l.operator,
                left: self.alloc(self.expression(l.left)),
                right: self.alloc(self.expression(l.right)),
            },

            Expression::Conditional(c) => Node::Conditional {
                ty: self.mono(expr),
                test: self.alloc(self.expression(c.test)),
                consequent: self.alloc(self.expression(c.consequent)),
                alternate: self.alloc(self.expression(c.alternate)),
            },

            Expression::Unary(u) => Node::Unary {
                ty: self.mono(expr),
                operator: u.operator,
                argument: self.alloc(self.expression(u.argument)),
            },

            Expression::Binary(b) => {
                let left_nature = self.mono(b.left).nature();
                let right_nature = self.mono(b.right).nature();
                let dispatch = match (left_nature, right_nature) {
                    (Some(left), Some(right)) => Some(
                        operators::lookup(b.operator, left, right)
                            .expect("operator combination accepted by the type checker"),
                    ),
                    _ => None,
                };
                Node::Binary {
                    ty: self.mono(expr),
                    operator: b.operator,
                    dispatch,
                    left: self.alloc(self.expression(b.left)),
                    right: self.alloc(self.expression(b.right)),
                }
            }

            Expression::Call(call) => self.call(call, None),

            Expression::Pipe(pipe) => self.call(pipe.call, Some(pipe.argument)),

            Expression::Function(fun) => {
                let params: Vec<ParamSpec<'c>> = fun
                    .parameters
                    .iter()
                    .map(|param| ParamSpec {
                        key: param.key,
                        default: param
                            .default
                            .map(|default| self.alloc(self.expression(default))),
                    })
                    .collect();
                let body = match fun.body {
                    FunctionBody::Expression(body) => self.expression(body),
                    FunctionBody::Block(block) => self.block(block),
                };
                Node::Function {
                    ty: self.mono(expr),
                    params: self.arena.alloc_slice_copy(&params),
                    body: self.alloc(body),
                }
            }
        }
    }

    fn call(&self, call: &'c ir::CallExpression<'c>, pipe: Option<Expression<'c>>) -> Node<'c> {
        let mut properties: Vec<ObjProperty<'c>> = call
            .arguments
            .properties
            .iter()
            .map(|property| ObjProperty {
                key: property.key,
                value: self.expression(property.value),
            })
            .collect();

        let mut arguments_ty = self.mono(Expression::Object(call.arguments));
        if let Some(argument) = pipe {
            // The callee's resolved signature names the pipe parameter.
            let MonoType::Fun(signature) = *self.mono(call.callee) else {
                unreachable!("pipe call to a non-function")
            };
            let label = signature
                .pipe
                .expect("pipe call to a function with a pipe parameter");
            properties.push(ObjProperty {
                key: label,
                value: self.expression(argument),
            });

            let mut fields: Vec<(&str, &'c MonoType<'c>)> = call
                .arguments
                .properties
                .iter()
                .map(|property| (property.key, self.mono(property.value)))
                .collect();
            fields.push((label, self.mono(argument)));
            arguments_ty = self.solution.manager().mono_object(&fields);
        }

        let arguments = Node::Obj {
            ty: arguments_ty,
            properties: self.arena.alloc_slice_copy(&properties),
        };
        Node::Call {
            ty: self.mono(Expression::Call(call)),
            callee: self.alloc(self.expression(call.callee)),
            arguments: self.alloc(arguments),
        }
    }

    fn mono(&self, expr: Expression<'c>) -> &'c MonoType<'c> {
        self.solution
            .mono_of(expr)
            .expect("inference assigned a type to every node")
    }

    fn alloc(&self, node: Node<'c>) -> &'c Node<'c> {
        self.arena.alloc(node)
    }
}
