// Integration tests for per-signature specialization
//
// Each test builds a chunk, runs it, and inspects the specializations the
// engine produced along the way.

use crate::common::{as_float, as_int, engine, eval, load, run};
use std::rc::Rc;
use wane::syntax::build::*;
use wane::value::{Callable, Value};
use wane::Type;

fn closure(v: &Value) -> Rc<wane::value::Closure> {
    match v {
        Value::Function(Callable::Closure(c)) => c.clone(),
        other => panic!("expected a closure, got {:?}", other),
    }
}

#[test]
fn test_integer_then_float_assignment_types_float() {
    let engine = engine();
    let loaded = load(
        &engine,
        vec![
            local(&["x"], vec![int(1)]),
            set("x", float(2.5)),
            local(&["y"], vec![name("x")]),
            ret(vec![name("y")]),
        ],
    );
    let result = loaded.run(&engine);
    assert_eq!(as_float(&result.first()), 2.5);

    let spec = loaded.main_specialization();
    assert_eq!(spec.local_type("x"), Some(Type::Float));
    assert_eq!(spec.local_type("y"), Some(Type::Float));
    assert_eq!(spec.returns(), &Type::Float);
}

#[test]
fn test_integer_read_before_widening_is_float() {
    let result = run(vec![
        local(&["x"], vec![int(3)]),
        local(&["before"], vec![name("x")]),
        set("x", float(0.5)),
        ret(vec![name("before"), name("x")]),
    ]);
    // the Integer value is widened at its write
    assert_eq!(as_float(&result.get(0)), 3.0);
    assert_eq!(as_float(&result.get(1)), 0.5);
}

#[test]
fn test_specialize_returns_same_routine() {
    let engine = engine();
    let f = run_on(
        &engine,
        vec![ret(vec![function(&["a"], vec![ret(vec![add(name("a"), int(1))])])])],
    );
    let ft = closure(&f).function_type().clone();
    let a = ft.specialize(engine.runtime(), &[Type::Integer]);
    let b = ft.specialize(engine.runtime(), &[Type::Integer]);
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(ft.specialization_count(), 1);
    assert_eq!(a.args(), &[Type::Integer]);
}

fn run_on(engine: &wane::Engine, stmts: Vec<wane::syntax::Stmt>) -> Value {
    engine.run(&chunk(stmts)).expect("script failed").first()
}

#[test]
fn test_each_signature_compiles_once() {
    let engine = engine();
    let result = engine
        .run(&chunk(vec![
            local_function("double", &["a"], vec![ret(vec![mul(name("a"), int(2))])]),
            local(&["i"], vec![call(name("double"), vec![int(21)])]),
            local(&["f"], vec![call(name("double"), vec![float(1.25)])]),
            local(&["j"], vec![call(name("double"), vec![int(4)])]),
            ret(vec![name("i"), name("f"), name("j"), name("double")]),
        ]))
        .unwrap();
    assert_eq!(as_int(&result.get(0)), 42);
    assert_eq!(as_float(&result.get(1)), 2.5);
    assert_eq!(as_int(&result.get(2)), 8);

    let ft = closure(&result.get(3)).function_type().clone();
    assert_eq!(ft.specialization_count(), 2);
    let ints = ft.lookup(&[Type::Integer]).unwrap();
    let floats = ft.lookup(&[Type::Float]).unwrap();
    assert_eq!(ints.returns(), &Type::Integer);
    assert_eq!(floats.returns(), &Type::Float);
    assert!(ft.lookup(&[Type::String]).is_none());
}

#[test]
fn test_missing_return_joins_nil() {
    let engine = engine();
    let result = engine
        .run(&chunk(vec![
            local_function(
                "maybe",
                &["c"],
                vec![if_then(name("c"), vec![ret(vec![int(1)])])],
            ),
            local_function(
                "always",
                &["c"],
                vec![if_else(
                    name("c"),
                    vec![ret(vec![int(1)])],
                    vec![ret(vec![int(2)])],
                )],
            ),
            ret(vec![
                call(name("maybe"), vec![boolean(false)]),
                call(name("always"), vec![boolean(false)]),
                name("maybe"),
                name("always"),
            ]),
        ]))
        .unwrap();
    assert!(result.get(0).is_nil());
    assert_eq!(as_int(&result.get(1)), 2);

    let maybe = closure(&result.get(2)).function_type().lookup(&[Type::Boolean]).unwrap();
    let always = closure(&result.get(3)).function_type().lookup(&[Type::Boolean]).unwrap();
    assert_eq!(maybe.returns(), &Type::Unknown);
    assert_eq!(always.returns(), &Type::Integer);
}

#[test]
fn test_loops_never_count_as_returning() {
    let engine = engine();
    let result = engine
        .run(&chunk(vec![
            local_function(
                "find",
                &["n"],
                vec![numeric_for(
                    "i",
                    int(1),
                    int(10),
                    None,
                    vec![if_then(eq(name("i"), name("n")), vec![ret(vec![name("i")])])],
                )],
            ),
            ret(vec![
                call(name("find"), vec![int(4)]),
                call(name("find"), vec![int(40)]),
                name("find"),
            ]),
        ]))
        .unwrap();
    assert_eq!(as_int(&result.get(0)), 4);
    assert!(result.get(1).is_nil());
    let find = closure(&result.get(2)).function_type().lookup(&[Type::Integer]).unwrap();
    assert_eq!(find.returns(), &Type::Unknown);
}

#[test]
fn test_captured_and_mutated_local_is_shared() {
    let engine = engine();
    let loaded = load(
        &engine,
        vec![
            local(&["n"], vec![int(0)]),
            local_function("bump", &[], vec![set("n", add(name("n"), int(1)))]),
            call_stmt(name("bump"), vec![]),
            call_stmt(name("bump"), vec![]),
            ret(vec![name("n")]),
        ],
    );
    assert_eq!(as_int(&loaded.run(&engine).first()), 2);
    assert_eq!(loaded.main_specialization().local_type("n"), Some(Type::Unknown));
}

#[test]
fn test_captured_immutable_local_is_copied() {
    let v = eval(vec![
        local(&["k"], vec![int(10)]),
        local(&["f"], vec![function(&["x"], vec![ret(vec![add(name("x"), name("k"))])])]),
        ret(vec![call(name("f"), vec![int(5)])]),
    ]);
    assert_eq!(as_int(&v), 15);
}

#[test]
fn test_loop_locals_are_fresh_per_iteration() {
    let v = eval(vec![
        local(&["fs"], vec![list(vec![])]),
        numeric_for(
            "i",
            int(1),
            int(3),
            None,
            vec![assign(
                vec![index(name("fs"), name("i"))],
                vec![function(&[], vec![ret(vec![name("i")])])],
            )],
        ),
        ret(vec![add(
            add(
                call(index(name("fs"), int(1)), vec![]),
                call(index(name("fs"), int(2)), vec![]),
            ),
            call(index(name("fs"), int(3)), vec![]),
        )]),
    ]);
    assert_eq!(as_int(&v), 6);
}

#[test]
fn test_closures_with_equal_capture_types_share_a_cache() {
    let engine = engine();
    let result = engine
        .run(&chunk(vec![
            local_function(
                "adder",
                &["k"],
                vec![ret(vec![function(&["x"], vec![ret(vec![add(name("x"), name("k"))])])])],
            ),
            local(&["a"], vec![call(name("adder"), vec![int(1)])]),
            local(&["b"], vec![call(name("adder"), vec![int(2)])]),
            local(&["c"], vec![call(name("adder"), vec![string("s")])]),
            ret(vec![
                name("a"),
                name("b"),
                name("c"),
                call(name("a"), vec![int(1)]),
                call(name("b"), vec![int(1)]),
            ]),
        ]))
        .unwrap();
    let (a, b, c) = (closure(&result.get(0)), closure(&result.get(1)), closure(&result.get(2)));
    assert_eq!(a.function_type(), b.function_type());
    assert_ne!(a.function_type(), c.function_type());
    assert_eq!(a.function_type().specialization_count(), 1);
    assert_eq!(as_int(&result.get(3)), 2);
    assert_eq!(as_int(&result.get(4)), 3);
}

#[test]
fn test_varargs_are_unpacked() {
    let engine = engine();
    let result = engine
        .run(&chunk(vec![
            local(
                &["pack"],
                vec![variadic_function(&["first"], vec![ret(vec![list(vec![vararg()])])])],
            ),
            local(&["t"], vec![call(name("pack"), vec![int(1), int(2), int(3)])]),
            ret(vec![len(name("t")), index(name("t"), int(2))]),
        ]))
        .unwrap();
    assert_eq!(as_int(&result.get(0)), 2);
    assert_eq!(as_int(&result.get(1)), 3);
}

#[test]
fn test_multiple_results_spread_into_calls() {
    let v = eval(vec![
        local_function("two", &[], vec![ret(vec![int(3), int(4)])]),
        local_function("sum", &["a", "b"], vec![ret(vec![add(name("a"), name("b"))])]),
        ret(vec![call(name("sum"), vec![call(name("two"), vec![])])]),
    ]);
    assert_eq!(as_int(&v), 7);
}

#[test]
fn test_numeric_for_with_float_step() {
    let v = eval(vec![
        local(&["n"], vec![int(0)]),
        numeric_for(
            "x",
            float(0.0),
            float(1.0),
            Some(float(0.25)),
            vec![set("n", add(name("n"), int(1)))],
        ),
        ret(vec![name("n")]),
    ]);
    assert_eq!(as_int(&v), 5);
}

#[test]
fn test_while_and_repeat() {
    let v = eval(vec![
        local(&["i"], vec![int(0)]),
        while_loop(lt(name("i"), int(5)), vec![set("i", add(name("i"), int(1)))]),
        repeat_until(vec![set("i", add(name("i"), int(2)))], le(int(10), name("i"))),
        ret(vec![name("i")]),
    ]);
    assert_eq!(as_int(&v), 11);
}

#[test]
fn test_specialization_stats() {
    let engine = engine();
    engine
        .run(&chunk(vec![
            local_function("id", &["v"], vec![ret(vec![name("v")])]),
            call_stmt(name("id"), vec![int(1)]),
            call_stmt(name("id"), vec![int(2)]),
            call_stmt(name("id"), vec![string("s")]),
        ]))
        .unwrap();
    // main, id(Integer), id(String)
    assert_eq!(engine.stats().specializations, 3);
}
