//! The typed intermediate representation.
//!
//! The core consumes an already-parsed tree: a host front-end (or a test)
//! allocates these nodes in the compile arena and hands the root to
//! [`crate::infer::infer`] and [`crate::interpreter::compile`]. Nodes are
//! immutable; node identity (the arena address) keys the inference solution.

use core::fmt;

use crate::span::Span;
use crate::types::PolyType;

/// The root accepted by inference and compilation.
#[derive(Debug, Clone, Copy)]
pub enum Program<'a> {
    File(&'a File<'a>),
    Extern(&'a Extern<'a>),
    Expression(Expression<'a>),
}

/// A sequence of imports followed by statements.
#[derive(Debug)]
pub struct File<'a> {
    pub loc: Span,
    pub imports: &'a [ImportDeclaration<'a>],
    pub body: &'a [Statement<'a>],
}

#[derive(Debug)]
pub struct ImportDeclaration<'a> {
    pub loc: Span,
    pub path: &'a str,
}

/// Pre-typed identifiers injected around a body.
#[derive(Debug)]
pub struct Extern<'a> {
    pub loc: Span,
    pub bindings: &'a [ExternBinding<'a>],
    pub body: Program<'a>,
}

#[derive(Debug)]
pub struct ExternBinding<'a> {
    pub loc: Span,
    pub name: &'a str,
    pub ty: &'a PolyType<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum Statement<'a> {
    Expression(Expression<'a>),
    /// A native variable assignment; the only generalization point.
    Assignment(&'a Assignment<'a>),
    Return(&'a ReturnStatement<'a>),
}

#[derive(Debug)]
pub struct Assignment<'a> {
    pub loc: Span,
    pub name: &'a str,
    pub init: Expression<'a>,
}

#[derive(Debug)]
pub struct ReturnStatement<'a> {
    pub loc: Span,
    pub argument: Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum Expression<'a> {
    String(&'a StringLiteral<'a>),
    Int(&'a IntegerLiteral),
    UInt(&'a UnsignedIntegerLiteral),
    Float(&'a FloatLiteral),
    Bool(&'a BooleanLiteral),
    Time(&'a DateTimeLiteral),
    Duration(&'a DurationLiteral),
    Regexp(&'a RegexpLiteral<'a>),
    Identifier(&'a Identifier<'a>),
    Member(&'a MemberExpression<'a>),
    Index(&'a IndexExpression<'a>),
    Array(&'a ArrayExpression<'a>),
    Object(&'a ObjectExpression<'a>),
    Logical(&'a LogicalExpression<'a>),
    Conditional(&'a ConditionalExpression<'a>),
    Unary(&'a UnaryExpression<'a>),
    Binary(&'a BinaryExpression<'a>),
    Call(&'a CallExpression<'a>),
    Pipe(&'a PipeExpression<'a>),
    Function(&'a FunctionExpression<'a>),
}

#[derive(Debug)]
pub struct StringLiteral<'a> {
    pub loc: Span,
    pub value: &'a str,
}

#[derive(Debug)]
pub struct IntegerLiteral {
    pub loc: Span,
    pub value: i64,
}

#[derive(Debug)]
pub struct UnsignedIntegerLiteral {
    pub loc: Span,
    pub value: u64,
}

#[derive(Debug)]
pub struct FloatLiteral {
    pub loc: Span,
    pub value: f64,
}

#[derive(Debug)]
pub struct BooleanLiteral {
    pub loc: Span,
    pub value: bool,
}

/// Nanoseconds since the Unix epoch, UTC.
#[derive(Debug)]
pub struct DateTimeLiteral {
    pub loc: Span,
    pub value: i64,
}

/// A span of time in nanoseconds.
#[derive(Debug)]
pub struct DurationLiteral {
    pub loc: Span,
    pub value: i64,
}

#[derive(Debug)]
pub struct RegexpLiteral<'a> {
    pub loc: Span,
    pub pattern: &'a str,
}

#[derive(Debug)]
pub struct Identifier<'a> {
    pub loc: Span,
    pub name: &'a str,
}

#[derive(Debug)]
pub struct MemberExpression<'a> {
    pub loc: Span,
    pub object: Expression<'a>,
    pub property: &'a str,
}

#[derive(Debug)]
pub struct IndexExpression<'a> {
    pub loc: Span,
    pub array: Expression<'a>,
    pub index: Expression<'a>,
}

#[derive(Debug)]
pub struct ArrayExpression<'a> {
    pub loc: Span,
    pub elements: &'a [Expression<'a>],
}

#[derive(Debug)]
pub struct ObjectExpression<'a> {
    pub loc: Span,
    pub properties: &'a [Property<'a>],
}

#[derive(Debug)]
pub struct Property<'a> {
    pub loc: Span,
    pub key: &'a str,
    pub value: Expression<'a>,
}

#[derive(Debug)]
pub struct LogicalExpression<'a> {
    pub loc: Span,
    pub operator: LogicalOperator,
    pub left: Expression<'a>,
    pub right: Expression<'a>,
}

#[derive(Debug)]
pub struct ConditionalExpression<'a> {
    pub loc: Span,
    pub test: Expression<'a>,
    pub consequent: Expression<'a>,
    pub alternate: Expression<'a>,
}

#[derive(Debug)]
pub struct UnaryExpression<'a> {
    pub loc: Span,
    pub operator: UnaryOperator,
    pub argument: Expression<'a>,
}

#[derive(Debug)]
pub struct BinaryExpression<'a> {
    pub loc: Span,
    pub operator: BinaryOperator,
    pub left: Expression<'a>,
    pub right: Expression<'a>,
}

/// A call with named arguments. The argument list is an object expression
/// so call objects and object literals share one typing rule.
#[derive(Debug)]
pub struct CallExpression<'a> {
    pub loc: Span,
    pub callee: Expression<'a>,
    pub arguments: &'a ObjectExpression<'a>,
}

/// `argument |> call`. The piped value becomes one extra named argument at
/// the callee's declared pipe parameter.
#[derive(Debug)]
pub struct PipeExpression<'a> {
    pub loc: Span,
    pub argument: Expression<'a>,
    pub call: &'a CallExpression<'a>,
}

#[derive(Debug)]
pub struct FunctionExpression<'a> {
    pub loc: Span,
    pub parameters: &'a [FunctionParameter<'a>],
    pub body: FunctionBody<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionParameter<'a> {
    pub loc: Span,
    pub key: &'a str,
    /// Evaluated in the closure's captured scope when the caller omits the
    /// argument. A parameter with a default is not required.
    pub default: Option<Expression<'a>>,
    pub is_pipe: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum FunctionBody<'a> {
    Expression(Expression<'a>),
    Block(&'a Block<'a>),
}

#[derive(Debug)]
pub struct Block<'a> {
    pub loc: Span,
    pub body: &'a [Statement<'a>],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    RegexpMatch,
    NotRegexpMatch,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::Neq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Lte => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Gte => ">=",
            BinaryOperator::RegexpMatch => "=~",
            BinaryOperator::NotRegexpMatch => "!~",
        };
        f.write_str(op)
    }
}

/// Node identity: the arena address of the underlying node struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(usize);

impl<'a> Expression<'a> {
    pub fn loc(&self) -> Span {
        match self {
            Expression::String(n) => n.loc,
            Expression::Int(n) => n.loc,
            Expression::UInt(n) => n.loc,
            Expression::Float(n) => n.loc,
            Expression::Bool(n) => n.loc,
            Expression::Time(n) => n.loc,
            Expression::Duration(n) => n.loc,
            Expression::Regexp(n) => n.loc,
            Expression::Identifier(n) => n.loc,
            Expression::Member(n) => n.loc,
            Expression::Index(n) => n.loc,
            Expression::Array(n) => n.loc,
            Expression::Object(n) => n.loc,
            Expression::Logical(n) => n.loc,
            Expression::Conditional(n) => n.loc,
            Expression::Unary(n) => n.loc,
            Expression::Binary(n) => n.loc,
            Expression::Call(n) => n.loc,
            Expression::Pipe(n) => n.loc,
            Expression::Function(n) => n.loc,
        }
    }

    pub fn key(&self) -> NodeKey {
        let addr = match self {
            Expression::String(n) => *n as *const _ as usize,
            Expression::Int(n) => *n as *const _ as usize,
            Expression::UInt(n) => *n as *const _ as usize,
            Expression::Float(n) => *n as *const _ as usize,
            Expression::Bool(n) => *n as *const _ as usize,
            Expression::Time(n) => *n as *const _ as usize,
            Expression::Duration(n) => *n as *const _ as usize,
            Expression::Regexp(n) => *n as *const _ as usize,
            Expression::Identifier(n) => *n as *const _ as usize,
            Expression::Member(n) => *n as *const _ as usize,
            Expression::Index(n) => *n as *const _ as usize,
            Expression::Array(n) => *n as *const _ as usize,
            Expression::Object(n) => *n as *const _ as usize,
            Expression::Logical(n) => *n as *const _ as usize,
            Expression::Conditional(n) => *n as *const _ as usize,
            Expression::Unary(n) => *n as *const _ as usize,
            Expression::Binary(n) => *n as *const _ as usize,
            Expression::Call(n) => *n as *const _ as usize,
            Expression::Pipe(n) => *n as *const _ as usize,
            Expression::Function(n) => *n as *const _ as usize,
        };
        NodeKey(addr)
    }
}

impl<'a> FunctionParameter<'a> {
    pub fn key_node(&self) -> NodeKey {
        NodeKey(self as *const _ as usize)
    }
}

/// Arena-backed construction helpers for hosts and tests.
///
/// Every helper allocates its node in the given arena and stamps a default
/// (unknown) span; the `*_at` variants take an explicit span for the nodes
/// diagnostics are asserted against.
pub mod build {
    use bumpalo::Bump;

    use super::*;

    pub fn string<'a>(arena: &'a Bump, value: &str) -> Expression<'a> {
        Expression::String(arena.alloc(StringLiteral {
            loc: Span::default(),
            value: arena.alloc_str(value),
        }))
    }

    pub fn int<'a>(arena: &'a Bump, value: i64) -> Expression<'a> {
        int_at(arena, Span::default(), value)
    }

    pub fn int_at<'a>(arena: &'a Bump, loc: Span, value: i64) -> Expression<'a> {
        Expression::Int(arena.alloc(IntegerLiteral { loc, value }))
    }

    pub fn uint<'a>(arena: &'a Bump, value: u64) -> Expression<'a> {
        Expression::UInt(arena.alloc(UnsignedIntegerLiteral {
            loc: Span::default(),
            value,
        }))
    }

    pub fn float<'a>(arena: &'a Bump, value: f64) -> Expression<'a> {
        Expression::Float(arena.alloc(FloatLiteral {
            loc: Span::default(),
            value,
        }))
    }

    pub fn boolean<'a>(arena: &'a Bump, value: bool) -> Expression<'a> {
        Expression::Bool(arena.alloc(BooleanLiteral {
            loc: Span::default(),
            value,
        }))
    }

    pub fn time<'a>(arena: &'a Bump, nanoseconds: i64) -> Expression<'a> {
        Expression::Time(arena.alloc(DateTimeLiteral {
            loc: Span::default(),
            value: nanoseconds,
        }))
    }

    pub fn duration<'a>(arena: &'a Bump, nanoseconds: i64) -> Expression<'a> {
        Expression::Duration(arena.alloc(DurationLiteral {
            loc: Span::default(),
            value: nanoseconds,
        }))
    }

    pub fn regexp<'a>(arena: &'a Bump, pattern: &str) -> Expression<'a> {
        Expression::Regexp(arena.alloc(RegexpLiteral {
            loc: Span::default(),
            pattern: arena.alloc_str(pattern),
        }))
    }

    pub fn ident<'a>(arena: &'a Bump, name: &str) -> Expression<'a> {
        Expression::Identifier(arena.alloc(Identifier {
            loc: Span::default(),
            name: arena.alloc_str(name),
        }))
    }

    pub fn member<'a>(arena: &'a Bump, object: Expression<'a>, property: &str) -> Expression<'a> {
        Expression::Member(arena.alloc(MemberExpression {
            loc: Span::default(),
            object,
            property: arena.alloc_str(property),
        }))
    }

    pub fn index<'a>(
        arena: &'a Bump,
        array: Expression<'a>,
        index: Expression<'a>,
    ) -> Expression<'a> {
        Expression::Index(arena.alloc(IndexExpression {
            loc: Span::default(),
            array,
            index,
        }))
    }

    pub fn array<'a>(arena: &'a Bump, elements: &[Expression<'a>]) -> Expression<'a> {
        Expression::Array(arena.alloc(ArrayExpression {
            loc: Span::default(),
            elements: arena.alloc_slice_copy(elements),
        }))
    }

    pub fn object<'a>(arena: &'a Bump, properties: &[(&str, Expression<'a>)]) -> Expression<'a> {
        Expression::Object(object_expr(arena, properties))
    }

    fn object_expr<'a>(
        arena: &'a Bump,
        properties: &[(&str, Expression<'a>)],
    ) -> &'a ObjectExpression<'a> {
        let properties = arena.alloc_slice_fill_iter(properties.iter().map(|(key, value)| {
            Property {
                loc: Span::default(),
                key: arena.alloc_str(key),
                value: *value,
            }
        }));
        arena.alloc(ObjectExpression {
            loc: Span::default(),
            properties,
        })
    }

    pub fn and<'a>(arena: &'a Bump, left: Expression<'a>, right: Expression<'a>) -> Expression<'a> {
        logical(arena, LogicalOperator::And, left, right)
    }

    pub fn or<'a>(arena: &'a Bump, left: Expression<'a>, right: Expression<'a>) -> Expression<'a> {
        logical(arena, LogicalOperator::Or, left, right)
    }

    fn logical<'a>(
        arena: &'a Bump,
        operator: LogicalOperator,
        left: Expression<'a>,
        right: Expression<'a>,
    ) -> Expression<'a> {
        Expression::Logical(arena.alloc(LogicalExpression {
            loc: Span::default(),
            operator,
            left,
            right,
        }))
    }

    pub fn conditional<'a>(
        arena: &'a Bump,
        test: Expression<'a>,
        consequent: Expression<'a>,
        alternate: Expression<'a>,
    ) -> Expression<'a> {
        conditional_at(arena, Span::default(), test, consequent, alternate)
    }

    pub fn conditional_at<'a>(
        arena: &'a Bump,
        loc: Span,
        test: Expression<'a>,
        consequent: Expression<'a>,
        alternate: Expression<'a>,
    ) -> Expression<'a> {
        Expression::Conditional(arena.alloc(ConditionalExpression {
            loc,
            test,
            consequent,
            alternate,
        }))
    }

    pub fn neg<'a>(arena: &'a Bump, argument: Expression<'a>) -> Expression<'a> {
        Expression::Unary(arena.alloc(UnaryExpression {
            loc: Span::default(),
            operator: UnaryOperator::Neg,
            argument,
        }))
    }

    pub fn not<'a>(arena: &'a Bump, argument: Expression<'a>) -> Expression<'a> {
        Expression::Unary(arena.alloc(UnaryExpression {
            loc: Span::default(),
            operator: UnaryOperator::Not,
            argument,
        }))
    }

    pub fn binary<'a>(
        arena: &'a Bump,
        operator: BinaryOperator,
        left: Expression<'a>,
        right: Expression<'a>,
    ) -> Expression<'a> {
        Expression::Binary(arena.alloc(BinaryExpression {
            loc: Span::default(),
            operator,
            left,
            right,
        }))
    }

    pub fn add<'a>(arena: &'a Bump, left: Expression<'a>, right: Expression<'a>) -> Expression<'a> {
        binary(arena, BinaryOperator::Add, left, right)
    }

    pub fn call<'a>(
        arena: &'a Bump,
        callee: Expression<'a>,
        arguments: &[(&str, Expression<'a>)],
    ) -> Expression<'a> {
        call_at(arena, Span::default(), callee, arguments)
    }

    pub fn call_at<'a>(
        arena: &'a Bump,
        loc: Span,
        callee: Expression<'a>,
        arguments: &[(&str, Expression<'a>)],
    ) -> Expression<'a> {
        Expression::Call(arena.alloc(CallExpression {
            loc,
            callee,
            arguments: object_expr(arena, arguments),
        }))
    }

    /// `argument |> call`. `call` must be a call expression.
    pub fn pipe<'a>(
        arena: &'a Bump,
        argument: Expression<'a>,
        call: Expression<'a>,
    ) -> Expression<'a> {
        let Expression::Call(call) = call else {
            panic!("pipe target must be a call expression");
        };
        Expression::Pipe(arena.alloc(PipeExpression {
            loc: Span::default(),
            argument,
            call,
        }))
    }

    pub fn param<'a>(arena: &'a Bump, key: &str) -> FunctionParameter<'a> {
        FunctionParameter {
            loc: Span::default(),
            key: arena.alloc_str(key),
            default: None,
            is_pipe: false,
        }
    }

    pub fn param_with_default<'a>(
        arena: &'a Bump,
        key: &str,
        default: Expression<'a>,
    ) -> FunctionParameter<'a> {
        FunctionParameter {
            loc: Span::default(),
            key: arena.alloc_str(key),
            default: Some(default),
            is_pipe: false,
        }
    }

    pub fn pipe_param<'a>(arena: &'a Bump, key: &str) -> FunctionParameter<'a> {
        FunctionParameter {
            loc: Span::default(),
            key: arena.alloc_str(key),
            default: None,
            is_pipe: true,
        }
    }

    pub fn function<'a>(
        arena: &'a Bump,
        parameters: &[FunctionParameter<'a>],
        body: Expression<'a>,
    ) -> Expression<'a> {
        Expression::Function(arena.alloc(FunctionExpression {
            loc: Span::default(),
            parameters: arena.alloc_slice_copy(parameters),
            body: FunctionBody::Expression(body),
        }))
    }

    pub fn function_block<'a>(
        arena: &'a Bump,
        parameters: &[FunctionParameter<'a>],
        body: &[Statement<'a>],
    ) -> Expression<'a> {
        Expression::Function(arena.alloc(FunctionExpression {
            loc: Span::default(),
            parameters: arena.alloc_slice_copy(parameters),
            body: FunctionBody::Block(arena.alloc(Block {
                loc: Span::default(),
                body: arena.alloc_slice_copy(body),
            })),
        }))
    }

    pub fn assign<'a>(arena: &'a Bump, name: &str, init: Expression<'a>) -> Statement<'a> {
        Statement::Assignment(arena.alloc(Assignment {
            loc: Span::default(),
            name: arena.alloc_str(name),
            init,
        }))
    }

    pub fn expr_stmt(expression: Expression<'_>) -> Statement<'_> {
        Statement::Expression(expression)
    }

    pub fn ret<'a>(arena: &'a Bump, argument: Expression<'a>) -> Statement<'a> {
        Statement::Return(arena.alloc(ReturnStatement {
            loc: Span::default(),
            argument,
        }))
    }

    pub fn file<'a>(arena: &'a Bump, imports: &[&str], body: &[Statement<'a>]) -> Program<'a> {
        let imports = arena.alloc_slice_fill_iter(imports.iter().map(|path| ImportDeclaration {
            loc: Span::default(),
            path: arena.alloc_str(path),
        }));
        Program::File(arena.alloc(File {
            loc: Span::default(),
            imports,
            body: arena.alloc_slice_copy(body),
        }))
    }

    pub fn extern_program<'a>(
        arena: &'a Bump,
        bindings: &[(&str, &'a PolyType<'a>)],
        body: Program<'a>,
    ) -> Program<'a> {
        let bindings = arena.alloc_slice_fill_iter(bindings.iter().map(|(name, ty)| {
            ExternBinding {
                loc: Span::default(),
                name: arena.alloc_str(name),
                ty: *ty,
            }
        }));
        Program::Extern(arena.alloc(Extern {
            loc: Span::default(),
            bindings,
            body,
        }))
    }
}
