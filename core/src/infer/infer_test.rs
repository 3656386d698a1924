//! Inference tests: polymorphism, records, defaults, pipes, imports, and
//! the diagnostic texts.

use bumpalo::Bump;

use crate::infer::{infer, NoImports, PackageType, Packages};
use crate::ir::{build, BinaryOperator, Program};
use crate::span::Span;
use crate::types::{PolyType, Tvar, TypeManager};

fn infer_ok<'a>(
    mgr: &'a TypeManager<'a>,
    program: Program<'a>,
) -> crate::infer::Solution<'a> {
    infer(mgr, program, &NoImports).expect("program type checks")
}

fn infer_err<'a>(mgr: &'a TypeManager<'a>, program: Program<'a>) -> String {
    infer(mgr, program, &NoImports)
        .err()
        .expect("program fails to type check")
        .to_string()
}

#[test]
fn literals_have_their_natures() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    let expr = build::int(&arena, 1);
    let solution = infer_ok(mgr, Program::Expression(expr));
    assert_eq!(solution.poly_of(expr).unwrap().to_string(), "int");

    let expr = build::string(&arena, "hi");
    let solution = infer_ok(mgr, Program::Expression(expr));
    assert_eq!(solution.poly_of(expr).unwrap().to_string(), "string");
}

#[test]
fn binary_expression_in_an_assignment() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // a = 1 + 1
    let sum = build::add(&arena, build::int(&arena, 1), build::int(&arena, 1));
    let program = build::file(&arena, &[], &[build::assign(&arena, "a", sum)]);
    let solution = infer_ok(mgr, program);
    assert_eq!(solution.poly_of(sum).unwrap().to_string(), "int");
}

#[test]
fn function_with_defaults_keeps_optional_labels() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // f = (a, b = 0) => a + b
    let f = build::function(
        &arena,
        &[
            build::param(&arena, "a"),
            build::param_with_default(&arena, "b", build::int(&arena, 0)),
        ],
        build::add(&arena, build::ident(&arena, "a"), build::ident(&arena, "b")),
    );
    let program = build::file(&arena, &[], &[build::assign(&arena, "f", f)]);
    let solution = infer_ok(mgr, program);
    assert_eq!(
        solution.poly_of(f).unwrap().to_string(),
        "(^a: int, b: int) -> int"
    );
}

#[test]
fn calling_a_function_identifier() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // add = (a) => 1 + a
    // two = add(a: 1)
    let add = build::function(
        &arena,
        &[build::param(&arena, "a")],
        build::add(&arena, build::int(&arena, 1), build::ident(&arena, "a")),
    );
    let add_ref = build::ident(&arena, "add");
    let call = build::call(&arena, add_ref, &[("a", build::int(&arena, 1))]);
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "add", add),
            build::assign(&arena, "two", call),
        ],
    );
    let solution = infer_ok(mgr, program);
    assert_eq!(solution.poly_of(call).unwrap().to_string(), "int");
    assert_eq!(
        solution.poly_of(add_ref).unwrap().to_string(),
        "(^a: int) -> int"
    );
}

#[test]
fn polymorphic_identity_instantiates_per_use() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // identity = (x) => x
    // identity(x: identity)(x: 2)
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
    let solution = infer_ok(mgr, program);
    assert_eq!(solution.poly_of(outer).unwrap().to_string(), "int");
    assert_eq!(
        solution.poly_of(inner).unwrap().to_string(),
        "(^x: int) -> int"
    );
}

#[test]
fn generalization_closes_over_the_body() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // (x) => { y = x; return y }
    let body = [
        build::assign(&arena, "y", build::ident(&arena, "x")),
        build::ret(&arena, build::ident(&arena, "y")),
    ];
    let f = build::function_block(&arena, &[build::param(&arena, "x")], &body);
    let solution = infer_ok(mgr, Program::Expression(f));

    let PolyType::Fun(sig) = solution.poly_of(f).unwrap() else {
        panic!("expected a function type");
    };
    assert_eq!(sig.parameters.len(), 1);
    assert!(matches!(sig.parameters[0].ty, PolyType::Var(_)));
    // The parameter flows through unchanged.
    assert_eq!(sig.parameters[0].ty, sig.ret);
}

#[test]
fn conditional_branches_agree() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    let consequent = build::int(&arena, 3);
    let alternate = build::int(&arena, 30);
    let cond = build::conditional(&arena, build::boolean(&arena, true), consequent, alternate);
    let solution = infer_ok(mgr, Program::Expression(cond));
    assert_eq!(solution.poly_of(cond).unwrap().to_string(), "int");
    assert_eq!(
        solution.poly_of(consequent).unwrap(),
        solution.poly_of(alternate).unwrap()
    );
    assert_eq!(
        solution.poly_of(cond).unwrap(),
        solution.poly_of(consequent).unwrap()
    );
}

#[test]
fn conditional_infers_branch_types_from_each_other() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // (t, c, a) => if t then c else a
    let cond = build::conditional(
        &arena,
        build::ident(&arena, "t"),
        build::ident(&arena, "c"),
        build::ident(&arena, "a"),
    );
    let f = build::function(
        &arena,
        &[
            build::param(&arena, "t"),
            build::param(&arena, "c"),
            build::param(&arena, "a"),
        ],
        cond,
    );
    let solution = infer_ok(mgr, Program::Expression(f));

    let PolyType::Fun(sig) = solution.poly_of(f).unwrap() else {
        panic!("expected a function type");
    };
    assert_eq!(sig.param("t").unwrap().to_string(), "bool");
    // c and a were forced together.
    assert!(matches!(sig.param("c").unwrap(), PolyType::Var(_)));
    assert_eq!(sig.param("c").unwrap(), sig.param("a").unwrap());
    assert_eq!(sig.param("c").unwrap(), sig.ret);
}

#[test]
fn conditional_test_must_be_bool() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // if 1 then 0.1 else 0.0
    let cond = build::conditional_at(
        &arena,
        Span::new(1, 1, 1, 23),
        build::int_at(&arena, Span::new(1, 4, 1, 5), 1),
        build::float(&arena, 0.1),
        build::float(&arena, 0.0),
    );
    assert_eq!(
        infer_err(mgr, Program::Expression(cond)),
        "type error 1:4-1:5: int != bool"
    );
}

#[test]
fn conditional_branches_must_agree() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // if true then 0 else "foo"
    let cond = build::conditional_at(
        &arena,
        Span::new(1, 1, 1, 26),
        build::boolean(&arena, true),
        build::int(&arena, 0),
        build::string(&arena, "foo"),
    );
    assert_eq!(
        infer_err(mgr, Program::Expression(cond)),
        "type error 1:1-1:26: int != string"
    );
}

#[test]
fn occurs_check_rejects_self_application() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // (f) => { return f(a: f) }
    let call = build::call_at(
        &arena,
        Span::new(2, 17, 2, 23),
        build::ident(&arena, "f"),
        &[("a", build::ident(&arena, "f"))],
    );
    let f = build::function_block(
        &arena,
        &[build::param(&arena, "f")],
        &[build::ret(&arena, call)],
    );
    assert_eq!(
        infer_err(mgr, Program::Expression(f)),
        "type error 2:17-2:23: type var t1 occurs in (^a: t1) -> t2 creating a cycle"
    );
}

#[test]
fn row_polymorphism_accepts_any_record_with_the_field() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // jim    = {name: "Jim", age: 30, weight: 100.0}
    // jane   = {name: "Jane", age: 31}
    // device = {name: 42, lat: 28.25, lon: 15.6}
    // name = (p) => p.name
    // name(p: jim); name(p: jane); name(p: device)
    let jim = build::object(
        &arena,
        &[
            ("name", build::string(&arena, "Jim")),
            ("age", build::int(&arena, 30)),
            ("weight", build::float(&arena, 100.0)),
        ],
    );
    let jane = build::object(
        &arena,
        &[
            ("name", build::string(&arena, "Jane")),
            ("age", build::int(&arena, 31)),
        ],
    );
    let device = build::object(
        &arena,
        &[
            ("name", build::int(&arena, 42)),
            ("lat", build::float(&arena, 28.25)),
            ("lon", build::float(&arena, 15.6)),
        ],
    );
    let name = build::function(
        &arena,
        &[build::param(&arena, "p")],
        build::member(&arena, build::ident(&arena, "p"), "name"),
    );
    let call_jim = build::call(
        &arena,
        build::ident(&arena, "name"),
        &[("p", build::ident(&arena, "jim"))],
    );
    let call_jane = build::call(
        &arena,
        build::ident(&arena, "name"),
        &[("p", build::ident(&arena, "jane"))],
    );
    let call_device = build::call(
        &arena,
        build::ident(&arena, "name"),
        &[("p", build::ident(&arena, "device"))],
    );
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "jim", jim),
            build::assign(&arena, "jane", jane),
            build::assign(&arena, "device", device),
            build::assign(&arena, "name", name),
            build::expr_stmt(call_jim),
            build::expr_stmt(call_jane),
            build::expr_stmt(call_device),
        ],
    );
    let solution = infer_ok(mgr, program);
    assert_eq!(solution.poly_of(call_jim).unwrap().to_string(), "string");
    assert_eq!(solution.poly_of(call_jane).unwrap().to_string(), "string");
    assert_eq!(solution.poly_of(call_device).unwrap().to_string(), "int");
}

#[test]
fn missing_record_fields_are_reported_at_the_call() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // john = {name: "John", age: 30, weight: 100.0}
    // jane = {name: "Jane", lastName: "Smith"}
    // fullName = (p) => p.name + " " + p.lastName
    // fullName(p: jane)
    // fullName(p: john)
    let john = build::object(
        &arena,
        &[
            ("name", build::string(&arena, "John")),
            ("age", build::int(&arena, 30)),
            ("weight", build::float(&arena, 100.0)),
        ],
    );
    let jane = build::object(
        &arena,
        &[
            ("name", build::string(&arena, "Jane")),
            ("lastName", build::string(&arena, "Smith")),
        ],
    );
    let body = build::add(
        &arena,
        build::add(
            &arena,
            build::member(&arena, build::ident(&arena, "p"), "name"),
            build::string(&arena, " "),
        ),
        build::member(&arena, build::ident(&arena, "p"), "lastName"),
    );
    let full_name = build::function(&arena, &[build::param(&arena, "p")], body);
    let call_jane = build::call(
        &arena,
        build::ident(&arena, "fullName"),
        &[("p", build::ident(&arena, "jane"))],
    );
    let call_john = build::call_at(
        &arena,
        Span::new(8, 1, 8, 17),
        build::ident(&arena, "fullName"),
        &[("p", build::ident(&arena, "john"))],
    );
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "john", john),
            build::assign(&arena, "jane", jane),
            build::assign(&arena, "fullName", full_name),
            build::expr_stmt(call_jane),
            build::expr_stmt(call_john),
        ],
    );
    assert_eq!(
        infer_err(mgr, program),
        "type error 8:1-8:17: missing object properties (lastName)"
    );
}

#[test]
fn record_access_conflicts_name_the_field() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // plus1 = (r = {_value: 1}) => r._value + 1
    // plus1(r: {_value: 2.0})
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
    let call = build::call_at(
        &arena,
        Span::new(3, 1, 3, 23),
        build::ident(&arena, "plus1"),
        &[("r", argument)],
    );
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "plus1", plus1),
            build::expr_stmt(call),
        ],
    );
    assert_eq!(
        infer_err(mgr, program),
        "type error 3:1-3:23: invalid record access \"_value\": int != float"
    );
}

#[test]
fn defaults_relax_the_required_labels_at_calls() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // add = (a, b, c = 1) => a + b + c
    // add(a: 1, b: 2, c: 1)
    // add(a: 1, b: 2)
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
    let add_ref = build::ident(&arena, "add");
    let with = build::call(
        &arena,
        add_ref,
        &[
            ("a", build::int(&arena, 1)),
            ("b", build::int(&arena, 2)),
            ("c", build::int(&arena, 1)),
        ],
    );
    let without = build::call(
        &arena,
        build::ident(&arena, "add"),
        &[("a", build::int(&arena, 1)), ("b", build::int(&arena, 2))],
    );
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "add", add),
            build::expr_stmt(with),
            build::expr_stmt(without),
        ],
    );
    let solution = infer_ok(mgr, program);
    assert_eq!(solution.poly_of(with).unwrap().to_string(), "int");
    assert_eq!(solution.poly_of(without).unwrap().to_string(), "int");
    assert_eq!(
        solution.poly_of(add_ref).unwrap().to_string(),
        "(^a: int, ^b: int, c: int) -> int"
    );
}

#[test]
fn extern_bindings_instantiate_freshly_per_reference() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // extern f: () -> t100, g: () -> t101
    let f_ty = mgr.fun(&[], mgr.labels(&[]), None, mgr.tvar(Tvar(100)));
    let g_ty = mgr.fun(&[], mgr.labels(&[]), None, mgr.tvar(Tvar(101)));
    let f_ref = build::ident(&arena, "f");
    let g_ref = build::ident(&arena, "g");
    let body = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "a", f_ref),
            build::assign(&arena, "b", g_ref),
        ],
    );
    let program = build::extern_program(&arena, &[("f", f_ty), ("g", g_ty)], body);
    let solution = infer_ok(mgr, program);

    let PolyType::Fun(f_sig) = solution.poly_of(f_ref).unwrap() else {
        panic!("expected a function type");
    };
    let PolyType::Fun(g_sig) = solution.poly_of(g_ref).unwrap() else {
        panic!("expected a function type");
    };
    // Fresh variables, and fresh per binding.
    assert!(matches!(f_sig.ret, PolyType::Var(v) if *v != Tvar(100)));
    assert!(matches!(g_sig.ret, PolyType::Var(v) if *v != Tvar(101)));
    assert_ne!(f_sig.ret, g_sig.ret);
}

#[test]
fn extern_scalars_type_their_references() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    let foo = build::ident(&arena, "foo");
    let program = build::extern_program(&arena, &[("foo", mgr.int())], Program::Expression(foo));
    let solution = infer_ok(mgr, program);
    assert_eq!(solution.poly_of(foo).unwrap().to_string(), "int");
}

#[test]
fn imports_model_packages_as_closed_records() {
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

    // import "foo"
    // foo.a + foo.b
    let sum = build::add(
        &arena,
        build::member(&arena, build::ident(&arena, "foo"), "a"),
        build::member(&arena, build::ident(&arena, "foo"), "b"),
    );
    let program = build::file(&arena, &["foo"], &[build::expr_stmt(sum)]);
    let solution = infer(mgr, program, &packages).expect("program type checks");
    assert_eq!(solution.poly_of(sum).unwrap().to_string(), "int");
}

#[test]
fn imported_functions_keep_their_pipe_parameter() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // foo.a : (<-x: int) -> int, foo.b : int
    let a_ty = mgr.fun(&[("x", mgr.int())], mgr.labels(&["x"]), Some("x"), mgr.int());
    let labels = mgr.labels(&["a", "b"]);
    let package_ty = mgr.record(&[("a", a_ty), ("b", mgr.int())], labels, labels);
    let mut packages = Packages::new();
    packages.insert(
        "foo",
        PackageType {
            name: mgr.intern_str("foo"),
            ty: package_ty,
        },
    );

    // foo.b |> foo.a()
    let callee = build::member(&arena, build::ident(&arena, "foo"), "a");
    let call = build::call(&arena, callee, &[]);
    let piped = build::pipe(
        &arena,
        build::member(&arena, build::ident(&arena, "foo"), "b"),
        call,
    );
    let program = build::file(&arena, &["foo"], &[build::expr_stmt(piped)]);
    let solution = infer(mgr, program, &packages).expect("program type checks");
    assert_eq!(solution.poly_of(piped).unwrap().to_string(), "int");
    assert_eq!(
        solution.poly_of(callee).unwrap().to_string(),
        "(<-x: int) -> int"
    );
}

#[test]
fn unknown_imports_fail() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    let program = build::file(&arena, &["bar"], &[]);
    assert_eq!(
        infer_err(mgr, program),
        "type error 0:0-0:0: invalid import path \"bar\""
    );
}

#[test]
fn undefined_identifiers_fail() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    let program = Program::Expression(build::ident(&arena, "nope"));
    assert_eq!(
        infer_err(mgr, program),
        "type error 0:0-0:0: undefined identifier nope"
    );
}

#[test]
fn redeclaration_fails() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    let program = build::file(
        &arena,
        &[],
        &[
            build::assign(&arena, "x", build::int(&arena, 1)),
            build::assign(&arena, "x", build::int(&arena, 2)),
        ],
    );
    assert_eq!(
        infer_err(mgr, program),
        "type error 0:0-0:0: variable x redeclared"
    );
}

#[test]
fn kind_constraints_reject_bad_natures() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    // -"x"
    let program = Program::Expression(build::neg(&arena, build::string(&arena, "x")));
    assert_eq!(
        infer_err(mgr, program),
        "type error 0:0-0:0: string is not Negatable"
    );

    // [1] == [1]
    let left = [build::int(&arena, 1)];
    let right = [build::int(&arena, 1)];
    let program = Program::Expression(build::binary(
        &arena,
        BinaryOperator::Eq,
        build::array(&arena, &left),
        build::array(&arena, &right),
    ));
    assert_eq!(
        infer_err(mgr, program),
        "type error 0:0-0:0: [int] is not Equatable"
    );
}

#[test]
fn mixed_arithmetic_is_a_mismatch() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    let program = Program::Expression(build::add(
        &arena,
        build::int(&arena, 1),
        build::float(&arena, 1.0),
    ));
    assert_eq!(infer_err(mgr, program), "type error 0:0-0:0: int != float");
}

#[test]
fn concrete_programs_solve_every_node_closed() {
    let arena = Bump::new();
    let mgr = TypeManager::new(&arena);
    let f = build::function(
        &arena,
        &[build::param(&arena, "a"), build::param(&arena, "b")],
        build::add(&arena, build::ident(&arena, "a"), build::ident(&arena, "b")),
    );
    let f_ref = build::ident(&arena, "f");
    let call = build::call(
        &arena,
        f_ref,
        &[("a", build::int(&arena, 3)), ("b", build::int(&arena, 4))],
    );
    let program = build::file(
        &arena,
        &[],
        &[build::assign(&arena, "f", f), build::expr_stmt(call)],
    );
    let solution = infer_ok(mgr, program);

    fn closed(ty: &PolyType<'_>) -> bool {
        match ty {
            PolyType::Prim(_) => true,
            PolyType::Var(_) => false,
            PolyType::Arr(elem) => closed(elem),
            PolyType::Fun(sig) => {
                sig.parameters.iter().all(|p| closed(p.ty)) && closed(sig.ret)
            }
            PolyType::Record(record) => record.properties.iter().all(|p| closed(p.ty)),
        }
    }
    for expr in [call, f_ref] {
        assert!(
            closed(solution.poly_of(expr).unwrap()),
            "unbound variables left in {}",
            solution.poly_of(expr).unwrap()
        );
    }
    assert_eq!(solution.poly_of(call).unwrap().to_string(), "int");
}
