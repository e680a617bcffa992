// Integration tests for language-level errors and their payloads

use crate::common::{as_string, engine, run_err, script_error};
use wane::syntax::build::*;
use wane::syntax::BinOp;
use wane::value::{Table, Value};
use wane::{Diagnostic, Error};

#[test]
fn test_raised_table_payload_is_untouched() {
    let engine = engine();
    let payload = Value::table(Table::new());
    engine.set_global("E", payload.clone());
    let err = script_error(engine.run(&chunk(vec![
        local_function("inner", &[], vec![call_stmt(name("error"), vec![name("E")])]),
        local_function("outer", &[], vec![call_stmt(name("inner"), vec![])]),
        call_stmt(name("outer"), vec![]),
    ])));
    assert!(err.payload.raw_equal(&payload));
}

#[test]
fn test_raised_payload_crosses_metamethods() {
    let err = run_err(vec![
        local(&["t"], vec![call(
            name("setmetatable"),
            vec![
                list(vec![]),
                record(vec![(
                    "__add",
                    function(&["a", "b"], vec![call_stmt(name("error"), vec![int(42)])]),
                )]),
            ],
        )]),
        ret(vec![add(name("t"), int(1))]),
    ]);
    assert!(err.payload.raw_equal(&Value::Int(42)));
}

#[test]
fn test_string_payload_displays_as_message() {
    let err = run_err(vec![call_stmt(name("error"), vec![string("boom")])]);
    assert_eq!(err.to_string(), "boom");
}

#[test]
fn test_default_messages() {
    let cases = vec![
        (
            vec![local(&["x"], vec![nil()]), ret(vec![add(name("x"), int(1))])],
            "attempt to perform arithmetic on a nil value",
        ),
        (
            vec![ret(vec![sub(int(1), list(vec![]))])],
            "attempt to perform arithmetic on a table value",
        ),
        (
            vec![ret(vec![lt(int(1), string("x"))])],
            "attempt to compare number with string",
        ),
        (
            vec![ret(vec![le(list(vec![]), list(vec![]))])],
            "attempt to compare two table values",
        ),
        (
            vec![ret(vec![concat(string("a"), list(vec![]))])],
            "attempt to concatenate a table value",
        ),
        (vec![ret(vec![len(int(5))])], "attempt to get length of a number value"),
        (vec![ret(vec![neg(string("x"))])], "attempt to perform arithmetic on a string value"),
        (
            vec![local(&["t"], vec![nil()]), ret(vec![field(name("t"), "x")])],
            "attempt to index a nil value (field 'x')",
        ),
        (
            vec![local(&["n"], vec![int(5)]), call_stmt(name("n"), vec![])],
            "attempt to call a number value",
        ),
        (
            vec![call_stmt(name("missing"), vec![])],
            "attempt to call a nil value",
        ),
        (
            vec![generic_for(&["k"], vec![int(5)], vec![])],
            "attempt to iterate over a number value",
        ),
        (
            vec![local(&["t"], vec![list(vec![])]), assign(vec![index(name("t"), nil())], vec![int(1)])],
            "table index is nil",
        ),
    ];
    for (stmts, message) in cases {
        assert_eq!(run_err(stmts).to_string(), message);
    }
}

#[test]
fn test_numeric_for_errors() {
    let err = run_err(vec![numeric_for("i", int(1), int(10), Some(int(0)), vec![])]);
    assert_eq!(err.to_string(), "'for' step is zero");
    let err = run_err(vec![numeric_for("i", int(1), string("x"), None, vec![])]);
    assert_eq!(err.to_string(), "'for' limit must be a number");
    let err = run_err(vec![numeric_for("i", nil(), int(3), None, vec![])]);
    assert_eq!(err.to_string(), "'for' initial value must be a number");
}

#[test]
fn test_integer_division_by_zero() {
    let err = run_err(vec![
        local(&["a", "b"], vec![int(1), int(0)]),
        ret(vec![binary(BinOp::IDiv, name("a"), name("b"))]),
    ]);
    assert_eq!(err.to_string(), "attempt to perform 'n//0'");
    let err = run_err(vec![
        local(&["a", "b"], vec![int(1), int(0)]),
        ret(vec![binary(BinOp::Mod, name("a"), name("b"))]),
    ]);
    assert_eq!(err.to_string(), "attempt to perform 'n%0'");
}

#[test]
fn test_float_division_by_zero_is_infinite() {
    let engine = engine();
    let result = engine
        .run(&chunk(vec![
            local(&["a", "b"], vec![int(1), int(0)]),
            ret(vec![div(name("a"), name("b"))]),
        ]))
        .unwrap();
    assert!(result.first().raw_equal(&Value::Float(f64::INFINITY)));
}

#[test]
fn test_custom_formatter_builds_structured_payload() {
    let engine = engine().with_error_formatter(|d: &Diagnostic| {
        let mut t = Table::new();
        let kind = match d {
            Diagnostic::Call { .. } => "call",
            Diagnostic::Arithmetic { .. } => "arithmetic",
            _ => "other",
        };
        t.set_str("kind", Value::from(kind));
        t.set_str("message", Value::from(d.to_string().as_str()));
        Value::table(t)
    });
    let err = script_error(engine.run(&chunk(vec![call_stmt(name("missing"), vec![])])));
    let payload = err.payload.as_table().unwrap().borrow();
    assert_eq!(as_string(&payload.get_str("kind")), "call");
    assert_eq!(as_string(&payload.get_str("message")), "attempt to call a nil value");

    // script-raised payloads bypass the formatter
    let err = script_error(engine.run(&chunk(vec![call_stmt(name("error"), vec![string("raw")])])));
    assert_eq!(err.to_string(), "raw");
}

#[test]
fn test_resolve_errors() {
    let engine = engine();
    let err = engine.run(&chunk(vec![brk()])).unwrap_err();
    assert!(matches!(err, Error::Resolve(_)));
    assert!(err.to_string().contains("'break' outside a loop"));

    let err = engine
        .run(&chunk(vec![local(&["f"], vec![function(&[], vec![ret(vec![vararg()])])])]))
        .unwrap_err();
    assert!(matches!(err, Error::Resolve(_)));
    assert!(err.to_string().contains("'...'"));
}

#[test]
fn test_failed_site_recovers() {
    let engine = engine();
    let loaded = crate::common::load(
        &engine,
        vec![
            local_function("inc", &["x"], vec![ret(vec![add(name("x"), int(1))])]),
            set("increment", name("inc")),
        ],
    );
    loaded.run(&engine);
    let inc = engine.get_global("increment");
    assert!(engine.call(&inc, &[Value::Nil]).is_err());
    let ok = engine.call(&inc, &[Value::Int(1)]).unwrap();
    assert!(ok.first().raw_equal(&Value::Int(2)));
}

/// `local function f(n) if n == 0 then return 0 end return f(n - 1) + 1 end`
fn count_down(n: i64) -> Vec<wane::syntax::Stmt> {
    vec![
        local_function(
            "f",
            &["n"],
            vec![
                if_then(eq(name("n"), int(0)), vec![ret(vec![int(0)])]),
                ret(vec![add(call(name("f"), vec![sub(name("n"), int(1))]), int(1))]),
            ],
        ),
        ret(vec![call(name("f"), vec![int(n)])]),
    ]
}

#[test]
fn test_call_depth_limit() {
    let engine = wane::Engine::new(wane::EngineConfig::new().with_max_call_depth(30));
    let ok = engine.run(&chunk(count_down(20))).unwrap();
    assert!(ok.first().raw_equal(&Value::Int(20)));

    let err = script_error(engine.run(&chunk(count_down(40))));
    assert_eq!(err.to_string(), "stack overflow (30 nested calls)");
    // every frame was popped on the way out
    assert_eq!(engine.runtime().call_depth(), 0);
    let ok = engine.run(&chunk(count_down(25))).unwrap();
    assert!(ok.first().raw_equal(&Value::Int(25)));
}

#[test]
fn test_runaway_recursion_raises_instead_of_aborting() {
    // the default limit must fit well inside a normal thread stack
    let handle = std::thread::Builder::new()
        .stack_size(8 * 1024 * 1024)
        .spawn(|| {
            let err = run_err(count_down(1_000_000));
            err.to_string()
        })
        .unwrap();
    assert_eq!(handle.join().unwrap(), "stack overflow (200 nested calls)");
}
