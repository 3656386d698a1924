//! The evaluator node tree and the tree walk.
//!
//! [`crate::interpreter::compile`] lowers each typed IR node to one [`Node`].
//! Every node exposes its monomorphic type and a single
//! [`Interpreter::eval`] produces a value from it. States the type checker
//! has already excluded (kind mismatches, unbound identifiers, missing
//! required arguments) are assertions here, never errors.

use bumpalo::Bump;

use crate::interpreter::error::RuntimeError;
use crate::interpreter::operators::{self, BinaryFn};
use crate::interpreter::scope::Scope;
use crate::ir::{BinaryOperator, LogicalOperator, UnaryOperator};
use crate::types::{MonoType, Prim};
use crate::values::{value::FunctionData, ObjectData, Value};

/// One compiled evaluator node per IR construct, plus `ValueLit` for
/// host-injected pre-computed values and `Noop` for imports.
#[derive(Debug, Clone, Copy)]
pub enum Node<'c> {
    Block {
        ty: &'c MonoType<'c>,
        body: &'c [Node<'c>],
    },
    Declaration {
        ty: &'c MonoType<'c>,
        name: &'c str,
        init: &'c Node<'c>,
    },
    Return {
        node: &'c Node<'c>,
    },
    Identifier {
        ty: &'c MonoType<'c>,
        name: &'c str,
    },
    ValueLit {
        value: Value<'c, 'c>,
    },
    Noop,
    BoolLit {
        value: bool,
    },
    IntLit {
        value: i64,
    },
    UintLit {
        value: u64,
    },
    FloatLit {
        value: f64,
    },
    StrLit {
        value: &'c str,
    },
    TimeLit {
        value: i64,
    },
    DurationLit {
        value: i64,
    },
    RegexpLit {
        pattern: &'c str,
    },
    Array {
        ty: &'c MonoType<'c>,
        elements: &'c [Node<'c>],
    },
    Obj {
        ty: &'c MonoType<'c>,
        properties: &'c [ObjProperty<'c>],
    },
    Member {
        ty: &'c MonoType<'c>,
        object: &'c Node<'c>,
        property: &'c str,
    },
    Index {
        ty: &'c MonoType<'c>,
        array: &'c Node<'c>,
        index: &'c Node<'c>,
    },
    Logical {
        ty: &'c MonoType<'c>,
        operator: LogicalOperator,
        left: &'c Node<'c>,
        right: &'c Node<'c>,
    },
    Conditional {
        ty: &'c MonoType<'c>,
        test: &'c Node<'c>,
        consequent: &'c Node<'c>,
        alternate: &'c Node<'c>,
    },
    Unary {
        ty: &'c MonoType<'c>,
        operator: UnaryOperator,
        argument: &'c Node<'c>,
    },
    Binary {
        ty: &'c MonoType<'c>,
        operator: BinaryOperator,
        /// Precomputed when both operand natures were concrete at compile
        /// time; otherwise resolved from the runtime value kinds.
        dispatch: Option<BinaryFn>,
        left: &'c Node<'c>,
        right: &'c Node<'c>,
    },
    Call {
        ty: &'c MonoType<'c>,
        callee: &'c Node<'c>,
        arguments: &'c Node<'c>,
    },
    Function {
        ty: &'c MonoType<'c>,
        params: &'c [ParamSpec<'c>],
        body: &'c Node<'c>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ObjProperty<'c> {
    pub key: &'c str,
    pub value: Node<'c>,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec<'c> {
    pub key: &'c str,
    pub default: Option<&'c Node<'c>>,
}

impl<'c> Node<'c> {
    pub fn ty(&self) -> &'c MonoType<'c> {
        match *self {
            Node::Block { ty, .. }
            | Node::Declaration { ty, .. }
            | Node::Identifier { ty, .. }
            | Node::Array { ty, .. }
            | Node::Obj { ty, .. }
            | Node::Member { ty, .. }
            | Node::Index { ty, .. }
            | Node::Logical { ty, .. }
            | Node::Conditional { ty, .. }
            | Node::Unary { ty, .. }
            | Node::Binary { ty, .. }
            | Node::Call { ty, .. }
            | Node::Function { ty, .. } => ty,
            Node::Return { node } => node.ty(),
            Node::ValueLit { value } => value.ty(),
            Node::Noop => &MonoType::Prim(Prim::Null),
            Node::BoolLit { .. } => &MonoType::Prim(Prim::Bool),
            Node::IntLit { .. } => &MonoType::Prim(Prim::Int),
            Node::UintLit { .. } => &MonoType::Prim(Prim::UInt),
            Node::FloatLit { .. } => &MonoType::Prim(Prim::Float),
            Node::StrLit { .. } => &MonoType::Prim(Prim::String),
            Node::TimeLit { .. } => &MonoType::Prim(Prim::Time),
            Node::DurationLit { .. } => &MonoType::Prim(Prim::Duration),
            Node::RegexpLit { .. } => &MonoType::Prim(Prim::Regexp),
        }
    }
}

/// Walks a compiled tree, allocating values in its arena.
pub struct Interpreter<'v> {
    arena: &'v Bump,
}

impl<'v> Interpreter<'v> {
    pub fn new(arena: &'v Bump) -> Self {
        Interpreter { arena }
    }

    pub fn eval<'c: 'v>(
        &self,
        node: &'c Node<'c>,
        scope: &mut Scope<'c, 'v>,
    ) -> Result<Value<'c, 'v>, RuntimeError> {
        match *node {
            Node::Block { body, .. } => {
                let mut value = Value::null();
                for stmt in body {
                    value = self.eval(stmt, scope)?;
                }
                Ok(value)
            }

            Node::Declaration { name, init, .. } => {
                let value = self.eval(init, scope)?;
                scope.set(name, value);
                Ok(value)
            }

            Node::Return { node } => self.eval(node, scope),

            Node::Identifier { name, .. } => Ok(scope
                .get(name)
                .expect("identifier bound in a type-checked program")),

            Node::ValueLit { value } => Ok(value.promote()),

            Node::Noop => Ok(Value::null()),

            Node::BoolLit { value } => Ok(Value::bool(value)),
            Node::IntLit { value } => Ok(Value::int(value)),
            Node::UintLit { value } => Ok(Value::uint(value)),
            Node::FloatLit { value } => Ok(Value::float(value)),
            Node::StrLit { value } => Ok(Value::str(value)),
            Node::TimeLit { value } => Ok(Value::time(value)),
            Node::DurationLit { value } => Ok(Value::duration(value)),
            Node::RegexpLit { pattern } => Ok(Value::regexp(pattern)),

            Node::Array { ty, elements } => {
                let mut values: Vec<Value<'c, 'v>> = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, scope)?);
                }
                Ok(Value::array(self.arena, ty, &values))
            }

            Node::Obj { ty, properties } => {
                // Declaration order; later keys overwrite earlier ones.
                let mut props: Vec<(&'v str, Value<'c, 'v>)> =
                    Vec::with_capacity(properties.len());
                for property in properties {
                    let value = self.eval(&property.value, scope)?;
                    match props.iter().position(|(key, _)| *key == property.key) {
                        Some(slot) => props[slot].1 = value,
                        None => props.push((property.key, value)),
                    }
                }
                Ok(Value::object(self.arena, ty, &props))
            }

            Node::Member {
                object, property, ..
            } => {
                let value = self.eval(object, scope)?;
                let object = value
                    .as_object()
                    .expect("member access on an object in a type-checked program");
                Ok(object.get(property).unwrap_or_else(Value::null))
            }

            Node::Index { array, index, .. } => {
                let array_value = self.eval(array, scope)?;
                let array = array_value
                    .as_array()
                    .expect("index into an array in a type-checked program");
                let index = self
                    .eval(index, scope)?
                    .as_int()
                    .expect("array index is an int in a type-checked program");
                if index < 0 {
                    return Ok(Value::null());
                }
                Ok(array.get(index as usize).unwrap_or_else(Value::null))
            }

            Node::Logical {
                operator,
                left,
                right,
                ..
            } => {
                let left = self
                    .eval(left, scope)?
                    .as_bool()
                    .expect("logical operand is a bool in a type-checked program");
                match operator {
                    LogicalOperator::And if !left => Ok(Value::bool(false)),
                    LogicalOperator::Or if left => Ok(Value::bool(true)),
                    _ => {
                        let right = self
                            .eval(right, scope)?
                            .as_bool()
                            .expect("logical operand is a bool in a type-checked program");
                        Ok(Value::bool(right))
                    }
                }
            }

            Node::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                let test = self
                    .eval(test, scope)?
                    .as_bool()
                    .expect("conditional test is a bool in a type-checked program");
                if test {
                    self.eval(consequent, scope)
                } else {
                    self.eval(alternate, scope)
                }
            }

            Node::Unary {
                operator, argument, ..
            } => {
                let value = self.eval(argument, scope)?;
                Ok(operators::eval_unary(operator, value))
            }

            Node::Binary {
                operator,
                dispatch,
                left,
                right,
                ..
            } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                let f = dispatch.unwrap_or_else(|| {
                    operators::lookup(operator, left.nature(), right.nature())
                        .expect("operator combination accepted by the type checker")
                });
                f(operator, self.arena, left, right)
            }

            Node::Call {
                callee, arguments, ..
            } => {
                let args_value = self.eval(arguments, scope)?;
                let callee_value = self.eval(callee, scope)?;
                let function = callee_value
                    .as_function()
                    .expect("callee is a function in a type-checked program");
                let args = args_value
                    .as_object()
                    .expect("call arguments evaluate to an object");
                self.call(function, args)
            }

            Node::Function { ty, params, body } => Ok(Value::function(
                self.arena,
                FunctionData {
                    ty,
                    params,
                    body,
                    scope: scope.copy(self.arena),
                },
            )),
        }
    }

    /// Call a closure: overlay a copy of the captured scope with the
    /// provided arguments, evaluating omitted defaults in the capture.
    pub fn call<'c: 'v>(
        &self,
        function: &'v FunctionData<'c, 'v>,
        arguments: &ObjectData<'c, 'v>,
    ) -> Result<Value<'c, 'v>, RuntimeError> {
        let mut captured = function.scope.copy(self.arena);
        let mut scope = function.scope.copy(self.arena);
        for param in function.params {
            let value = match arguments.get(param.key) {
                Some(value) => value,
                None => {
                    let default = param
                        .default
                        .expect("missing argument has a default in a type-checked call");
                    self.eval(default, &mut captured)?
                }
            };
            scope.set(param.key, value);
        }
        self.eval(function.body, &mut scope)
    }
}
