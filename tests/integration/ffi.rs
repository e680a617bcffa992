// Integration tests for host function overload selection from scripts

use crate::common::{as_int, as_string, engine, load, script_error};
use wane::ffi::{DeclaredType, HostFunction, Overload, Param, Returns};
use wane::link::LinkState;
use wane::syntax::build::*;
use wane::value::Value;
use wane::{Engine, LResult, Multi, Runtime};

fn tag(label: &'static str) -> impl Fn(&Runtime, &[Value]) -> LResult<Multi> {
    move |_: &Runtime, _: &[Value]| Ok(Value::from(label).into())
}

const INT: Param = Param::of(DeclaredType::Integer);
const ANY: Param = Param::of(DeclaredType::Any);

/// `pick(int)`, `pick(int, int)` and a fallback `pick(any...)`.
fn register_pick(engine: &Engine) {
    engine.register(
        HostFunction::builder("pick")
            .overload(Overload::new([INT], tag("one")).with_returns(Returns::Exact(1)))
            .overload(Overload::new([INT, INT], tag("two")).with_returns(Returns::Exact(1)))
            .overload(
                Overload::new([ANY], tag("rest"))
                    .with_variadic()
                    .as_fallback()
                    .with_returns(Returns::Exact(1)),
            )
            .build()
            .unwrap(),
    );
}

#[test]
fn test_three_arguments_select_fallback() {
    let engine = engine();
    register_pick(&engine);
    let result = engine
        .run(&chunk(vec![ret(vec![
            call(name("pick"), vec![int(1)]),
            call(name("pick"), vec![int(1), int(2)]),
            call(name("pick"), vec![int(1), int(2), int(3)]),
            call(name("pick"), vec![string("x")]),
        ])]))
        .unwrap();
    assert_eq!(as_string(&result.get(0)), "one");
    assert_eq!(as_string(&result.get(1)), "two");
    assert_eq!(as_string(&result.get(2)), "rest");
    assert_eq!(as_string(&result.get(3)), "rest");
}

#[test]
fn test_overload_choice_relinks_per_signature() {
    let engine = engine();
    register_pick(&engine);
    let loaded = load(
        &engine,
        vec![
            local(&["args"], vec![list(vec![int(1), string("s"), int(2), float(0.5)])]),
            local(&["out"], vec![string("")]),
            numeric_for(
                "i",
                int(1),
                int(4),
                None,
                vec![set(
                    "out",
                    concat(name("out"), call(name("pick"), vec![index(name("args"), name("i"))])),
                )],
            ),
            ret(vec![name("out")]),
        ],
    );
    assert_eq!(as_string(&loaded.run(&engine).first()), "onerestonerest");
    let trace = loaded.call_site("pick").trace();
    // Integer, String and Float signatures; the second Integer call hits
    assert_eq!(trace.resolutions, 3);
    assert_eq!(trace.state, LinkState::Polymorphic(3));
}

#[test]
fn test_nullable_parameter_accepts_nil() {
    let engine = engine();
    engine.register(
        HostFunction::builder("greet")
            .overload(Overload::new([Param::nullable(DeclaredType::String)], |_, args| {
                Ok(match &args[0] {
                    Value::Str(s) => Value::from(format!("hello {}", s).as_str()),
                    _ => Value::from("hello nobody"),
                }
                .into())
            }))
            .build()
            .unwrap(),
    );
    let result = engine
        .run(&chunk(vec![ret(vec![
            call(name("greet"), vec![string("ann")]),
            call(name("greet"), vec![nil()]),
        ])]))
        .unwrap();
    assert_eq!(as_string(&result.get(0)), "hello ann");
    assert_eq!(as_string(&result.get(1)), "hello nobody");

    // a missing argument is too few, not nil
    let err = script_error(engine.run(&chunk(vec![call_stmt(name("greet"), vec![])])));
    assert_eq!(err.to_string(), "no overload of 'greet' accepts ()");
    let err = script_error(engine.run(&chunk(vec![call_stmt(name("greet"), vec![int(1)])])));
    assert_eq!(err.to_string(), "no overload of 'greet' accepts (integer)");
}

#[test]
fn test_variadic_tail_checks_element_type() {
    let engine = engine();
    engine.register(
        HostFunction::builder("sum")
            .overload(
                Overload::new([Param::of(DeclaredType::String), INT], |_, args| {
                    let total: i64 = args[1..]
                        .iter()
                        .map(|v| match v {
                            Value::Int(i) => *i,
                            _ => 0,
                        })
                        .sum();
                    Ok(Value::Int(total).into())
                })
                .with_variadic(),
            )
            .build()
            .unwrap(),
    );
    let result = engine
        .run(&chunk(vec![ret(vec![
            call(name("sum"), vec![string("n"), int(1), int(2), int(3)]),
            call(name("sum"), vec![string("n")]),
        ])]))
        .unwrap();
    assert_eq!(as_int(&result.get(0)), 6);
    assert_eq!(as_int(&result.get(1)), 0);

    let err = script_error(engine.run(&chunk(vec![call_stmt(
        name("sum"),
        vec![string("n"), int(1), string("x")],
    )])));
    assert_eq!(
        err.to_string(),
        "no overload of 'sum' accepts (string, integer, string)"
    );
}

#[test]
fn test_integer_widens_to_float_parameter() {
    let engine = engine();
    engine.register(
        HostFunction::builder("half")
            .overload(Overload::new([Param::of(DeclaredType::Float)], |_, args| {
                Ok(match args[0] {
                    Value::Float(f) => Value::Float(f / 2.0),
                    _ => Value::from("not widened"),
                }
                .into())
            }))
            .build()
            .unwrap(),
    );
    let result = engine
        .run(&chunk(vec![ret(vec![call(name("half"), vec![int(3)])])]))
        .unwrap();
    assert!(result.first().raw_equal(&Value::Float(1.5)));
}

#[test]
fn test_exact_match_preferred_over_widening() {
    let engine = engine();
    engine.register(
        HostFunction::builder("kind")
            .overload(Overload::new([Param::of(DeclaredType::Integer)], tag("int")))
            .overload(Overload::new([Param::of(DeclaredType::Float)], tag("float")))
            .build()
            .unwrap(),
    );
    let result = engine
        .run(&chunk(vec![ret(vec![
            call(name("kind"), vec![int(1)]),
            call(name("kind"), vec![float(1.0)]),
        ])]))
        .unwrap();
    assert_eq!(as_string(&result.get(0)), "int");
    assert_eq!(as_string(&result.get(1)), "float");
}

#[test]
fn test_intrinsic_overload_hidden_from_plain_calls() {
    let engine = engine();
    let result = engine
        .run(&chunk(vec![
            local(&["t"], vec![record(vec![("a", int(1))])]),
            ret(vec![eq(call(name("pairs"), vec![name("t")]), name("next"))]),
        ]))
        .unwrap();
    assert!(result.first().truthy());
}

/// Counts the iterations of a generic `for` whose body keeps adding keys.
fn growing_loop(head: Vec<wane::syntax::Expr>) -> Vec<wane::syntax::Stmt> {
    vec![
        local(&["t"], vec![record(vec![("a", int(1))])]),
        local(&["n"], vec![int(0)]),
        generic_for(
            &["k", "v"],
            head,
            vec![
                set("n", add(name("n"), int(1))),
                if_then(
                    lt(name("n"), int(5)),
                    vec![assign(
                        vec![index(name("t"), concat(name("k"), string("x")))],
                        vec![name("v")],
                    )],
                ),
            ],
        ),
        ret(vec![name("n")]),
    ]
}

#[test]
fn test_generic_for_links_iteration_intrinsic() {
    let engine = engine();
    // the intrinsic pairs walks a snapshot of the entries
    let snapshot = engine
        .run(&chunk(growing_loop(vec![call(name("pairs"), vec![name("t")])])))
        .unwrap();
    assert_eq!(as_int(&snapshot.first()), 1);
    // next sees keys added during the walk
    let live = engine
        .run(&chunk(growing_loop(vec![name("next"), name("t"), nil()])))
        .unwrap();
    assert_eq!(as_int(&live.first()), 5);
}

#[test]
fn test_no_overload_message() {
    let engine = engine();
    engine.register(
        HostFunction::builder("only_int")
            .overload(Overload::new([INT], tag("ok")))
            .build()
            .unwrap(),
    );
    let err = script_error(engine.run(&chunk(vec![call_stmt(
        name("only_int"),
        vec![string("s"), boolean(true)],
    )])));
    assert_eq!(
        err.to_string(),
        "no overload of 'only_int' accepts (string, boolean)"
    );
}

#[test]
fn test_megamorphic_host_site_prefers_fallback() {
    let engine = Engine::new(wane::EngineConfig::new().with_polymorphism_limit(0));
    register_pick(&engine);
    let loaded = load(
        &engine,
        vec![
            local(&["args"], vec![list(vec![string("s"), int(1), int(2)])]),
            local(&["out"], vec![string("")]),
            numeric_for(
                "i",
                int(1),
                int(3),
                None,
                vec![set(
                    "out",
                    concat(name("out"), call(name("pick"), vec![index(name("args"), name("i"))])),
                )],
            ),
            ret(vec![name("out")]),
        ],
    );
    // the site goes megamorphic on its second resolution, after which
    // the fallback is tried first
    assert_eq!(as_string(&loaded.run(&engine).first()), "restonerest");
    assert_eq!(loaded.call_site("pick").state(), LinkState::Megamorphic);
}

#[test]
fn test_registration_errors() {
    let err = HostFunction::builder("empty").build().unwrap_err();
    assert_eq!(err, wane::ffi::RegistrationError::Empty("empty".to_string()));
    let err = HostFunction::builder("twice")
        .overload(Overload::new([ANY], tag("a")).as_fallback())
        .overload(Overload::new([ANY], tag("b")).as_fallback())
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        wane::ffi::RegistrationError::DuplicateFallback("twice".to_string())
    );
}
