//! Full pipeline scenarios: build IR, infer, compile, evaluate.

use bumpalo::Bump;

use rill_core::infer::{infer, NoImports, PackageType, Packages};
use rill_core::interpreter::{compile, evaluate, Scope};
use rill_core::ir::{build, Program};
use rill_core::types::TypeManager;
use rill_core::values::Value;

fn eval_program<'a>(arena: &'a Bump, program: Program<'a>) -> Value<'a, 'a> {
    let mgr = TypeManager::new(arena);
    let solution = infer(mgr, program, &NoImports).expect("program type checks");
    let root = compile(arena, program, &solution);
    let mut scope = Scope::new_in(arena);
    evaluate(arena, root, &mut scope).expect("evaluation succeeds")
}

#[test]
fn one_plus_one() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    let sum = build::add(&arena, build::int(&arena, 1), build::int(&arena, 1));
    let program = Program::Expression(sum);

    let solution = infer(mgr, program, &NoImports).unwrap();
    assert_eq!(solution.poly_of(sum).unwrap().to_string(), "int");
    assert_eq!(solution.mono_of(sum).unwrap().to_string(), "int");

    let root = compile(&arena, program, &solution);
    let mut scope = Scope::new_in(&arena);
    assert_eq!(
        evaluate(&arena, root, &mut scope).unwrap(),
        Value::int(2)
    );
}

#[test]
fn named_arguments() {
    let arena = Bump::new();
    // f = (a, b) => a + b; f(a: 3, b: 4)
    let f = build::function(
        &arena,
        &[build::param(&arena, "a"), build::param(&arena, "b")],
        build::add(&arena, build::ident(&arena, "a"), build::ident(&arena, "b")),
    );
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "f", f),
            build::expr_stmt(build::call(
                &arena,
                build::ident(&arena, "f"),
                &[("a", build::int(&arena, 3)), ("b", build::int(&arena, 4))],
            )),
        ],
    );
    assert_eq!(eval_program(&arena, program), Value::int(7));
}

#[test]
fn record_field_arithmetic() {
    let arena = Bump::new();
    // r = {x: 1.5, y: 2.5}; r.x + r.y
    let r = build::object(
        &arena,
        &[
            ("x", build::float(&arena, 1.5)),
            ("y", build::float(&arena, 2.5)),
        ],
    );
    let sum = build::add(
        &arena,
        build::member(&arena, build::ident(&arena, "r"), "x"),
        build::member(&arena, build::ident(&arena, "r"), "y"),
    );
    let program = build::file(
        &arena,
        &[],
        &[build::assign(&arena, "r", r), build::expr_stmt(sum)],
    );
    assert_eq!(eval_program(&arena, program), Value::float(4.0));
}

#[test]
fn imported_bindings_sum() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);

    let labels = mgr.labels(&["a", "b", "c"]);
    let package_ty = mgr.record(
        &[("a", mgr.int()), ("b", mgr.int()), ("c", mgr.string())],
        labels,
        labels,
    );
    let mut packages = Packages::new();
    packages.insert(
        "foo",
        PackageType {
            name: mgr.intern_str("foo"),
            ty: package_ty,
        },
    );

    // import "foo"; foo.a + foo.b
    let sum = build::add(
        &arena,
        build::member(&arena, build::ident(&arena, "foo"), "a"),
        build::member(&arena, build::ident(&arena, "foo"), "b"),
    );
    let program = build::file(&arena, &["foo"], &[build::expr_stmt(sum)]);

    let solution = infer(mgr, program, &packages).unwrap();
    assert_eq!(solution.poly_of(sum).unwrap().to_string(), "int");

    let root = compile(&arena, program, &solution);
    let mut scope = Scope::new_in(&arena);
    let object_ty = mgr.mono_object(&[
        ("a", mgr.mono_prim(rill_core::types::Prim::Int)),
        ("b", mgr.mono_prim(rill_core::types::Prim::Int)),
        ("c", mgr.mono_prim(rill_core::types::Prim::String)),
    ]);
    let foo = Value::object(
        &arena,
        object_ty,
        &[
            ("a", Value::int(19)),
            ("b", Value::int(23)),
            ("c", Value::str("ignored")),
        ],
    );
    scope.set("foo", foo);
    assert_eq!(evaluate(&arena, root, &mut scope).unwrap(), Value::int(42));
}

#[test]
fn row_polymorphic_accessor_returns_the_field() {
    let arena = Bump::new();
    // jim = {name: "Jim", age: 30}; name = (p) => p.name; name(p: jim)
    let jim = build::object(
        &arena,
        &[
            ("name", build::string(&arena, "Jim")),
            ("age", build::int(&arena, 30)),
        ],
    );
    let name = build::function(
        &arena,
        &[build::param(&arena, "p")],
        build::member(&arena, build::ident(&arena, "p"), "name"),
    );
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "jim", jim),
            build::assign(&arena, "name", name),
            build::expr_stmt(build::call(
                &arena,
                build::ident(&arena, "name"),
                &[("p", build::ident(&arena, "jim"))],
            )),
        ],
    );
    assert_eq!(eval_program(&arena, program), Value::str("Jim"));
}

#[test]
fn default_arguments_fill_in_omitted_labels() {
    let arena = Bump::new();
    // add = (a, b, c = 1) => a + b + c
    let add = build::function(
        &arena,
        &[
            build::param(&arena, "a"),
            build::param(&arena, "b"),
            build::param_with_default(&arena, "c", build::int(&arena, 1)),
        ],
        build::add(
            &arena,
            build::add(&arena, build::ident(&arena, "a"), build::ident(&arena, "b")),
            build::ident(&arena, "c"),
        ),
    );
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "add", add),
            build::expr_stmt(build::call(
                &arena,
                build::ident(&arena, "add"),
                &[("a", build::int(&arena, 1)), ("b", build::int(&arena, 2))],
            )),
        ],
    );
    assert_eq!(eval_program(&arena, program), Value::int(4));

    let arena = Bump::new();
    let add = build::function(
        &arena,
        &[
            build::param(&arena, "a"),
            build::param(&arena, "b"),
            build::param_with_default(&arena, "c", build::int(&arena, 1)),
        ],
        build::add(
            &arena,
            build::add(&arena, build::ident(&arena, "a"), build::ident(&arena, "b")),
            build::ident(&arena, "c"),
        ),
    );
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "add", add),
            build::expr_stmt(build::call(
                &arena,
                build::ident(&arena, "add"),
                &[
                    ("a", build::int(&arena, 1)),
                    ("b", build::int(&arena, 2)),
                    ("c", build::int(&arena, 1)),
                ],
            )),
        ],
    );
    assert_eq!(eval_program(&arena, program), Value::int(4));
}

#[test]
fn generalized_identity_applies_at_two_types() {
    let arena = Bump::new();
    // identity = (x) => x; identity(x: identity)(x: 2)
    let identity = build::function(
        &arena,
        &[build::param(&arena, "x")],
        build::ident(&arena, "x"),
    );
    let inner = build::call(
        &arena,
        build::ident(&arena, "identity"),
        &[("x", build::ident(&arena, "identity"))],
    );
    let outer = build::call(&arena, inner, &[("x", build::int(&arena, 2))]);
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "identity", identity),
            build::expr_stmt(outer),
        ],
    );
    assert_eq!(eval_program(&arena, program), Value::int(2));
}

#[test]
fn invalid_record_argument_fails_inference() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // plus1 = (r = {_value: 1}) => r._value + 1; plus1(r: {_value: 2.0})
    let default = build::object(&arena, &[("_value", build::int(&arena, 1))]);
    let plus1 = build::function(
        &arena,
        &[build::param_with_default(&arena, "r", default)],
        build::add(
            &arena,
            build::member(&arena, build::ident(&arena, "r"), "_value"),
            build::int(&arena, 1),
        ),
    );
    let argument = build::object(&arena, &[("_value", build::float(&arena, 2.0))]);
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "plus1", plus1),
            build::expr_stmt(build::call(
                &arena,
                build::ident(&arena, "plus1"),
                &[("r", argument)],
            )),
        ],
    );
    let err = infer(mgr, program, &NoImports).unwrap_err();
    assert!(err
        .to_string()
        .ends_with("invalid record access \"_value\": int != float"));
}

#[test]
fn short_circuits_skip_the_diverging_operand() {
    let arena = Bump::new();
    // false and (1 / 0 == 1)
    let diverges = build::binary(
        &arena,
        rill_core::ir::BinaryOperator::Eq,
        build::binary(
            &arena,
            rill_core::ir::BinaryOperator::Div,
            build::int(&arena, 1),
            build::int(&arena, 0),
        ),
        build::int(&arena, 1),
    );
    let program = Program::Expression(build::and(&arena, build::boolean(&arena, false), diverges));
    assert_eq!(eval_program(&arena, program), Value::bool(false));
}

#[test]
fn closures_see_creation_time_bindings() {
    let arena = Bump::new();
    // make = (a) => { f = (x) => a + x; return f }
    // add1 = make(a: 1)
    // add1(x: 41)
    let inner = build::function(
        &arena,
        &[build::param(&arena, "x")],
        build::add(&arena, build::ident(&arena, "a"), build::ident(&arena, "x")),
    );
    let body = [
        build::assign(&arena, "f", inner),
        build::ret(&arena, build::ident(&arena, "f")),
    ];
    let make = build::function_block(&arena, &[build::param(&arena, "a")], &body);
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "make", make),
            build::assign(
                &arena,
                "add1",
                build::call(&arena, build::ident(&arena, "make"), &[("a", build::int(&arena, 1))]),
            ),
            build::expr_stmt(build::call(
                &arena,
                build::ident(&arena, "add1"),
                &[("x", build::int(&arena, 41))],
            )),
        ],
    );
    assert_eq!(eval_program(&arena, program), Value::int(42));
}
