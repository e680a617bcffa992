// Integration tests for call-site linking: monomorphic hits, polymorphic
// chains, the megamorphic transition and re-entrant sites.

use crate::common::{as_int, as_string, load};
use wane::config::EngineConfig;
use wane::link::LinkState;
use wane::syntax::build::*;
use wane::syntax::Stmt;
use wane::Engine;

/// Calls `f` once for each element of `values` from a single call site.
fn call_each(values: Vec<wane::syntax::Expr>) -> Vec<Stmt> {
    let n = values.len() as i64;
    vec![
        local_function("f", &["v"], vec![ret(vec![name("v")])]),
        local(&["args"], vec![list(values)]),
        local(&["out"], vec![list(vec![])]),
        numeric_for(
            "i",
            int(1),
            int(n),
            None,
            vec![assign(
                vec![index(name("out"), name("i"))],
                vec![call(name("f"), vec![index(name("args"), name("i"))])],
            )],
        ),
        ret(vec![name("out")]),
    ]
}

#[test]
fn test_third_call_served_by_polymorphic_entry() {
    let engine = Engine::new(EngineConfig::new().with_polymorphism_limit(2));
    let loaded = load(&engine, call_each(vec![int(1), string("a"), int(1)]));
    let out = loaded.run(&engine).first();
    let out = out.as_table().unwrap().borrow();
    assert_eq!(as_int(&out.raw_get(&1i64.into())), 1);
    assert_eq!(as_string(&out.raw_get(&2i64.into())), "a");
    assert_eq!(as_int(&out.raw_get(&3i64.into())), 1);

    let trace = loaded.call_site("f").trace();
    assert_eq!(trace.resolutions, 2);
    assert_eq!(trace.relinks, 1);
    assert_eq!(trace.hits, 1);
    assert_eq!(trace.state, LinkState::Polymorphic(2));
    assert_eq!(trace.callee.as_deref(), Some("f"));
}

#[test]
fn test_monomorphic_site_resolves_once() {
    let engine = Engine::new(EngineConfig::default());
    let loaded = load(&engine, call_each(vec![int(1), int(2), int(3), int(4)]));
    loaded.run(&engine);
    let trace = loaded.call_site("f").trace();
    assert_eq!(trace.state, LinkState::Monomorphic);
    assert_eq!(trace.resolutions, 1);
    assert_eq!(trace.hits, 3);
    assert_eq!(trace.stability, 3);
    assert_eq!(trace.specialization.as_deref(), Some(&[wane::Type::Integer][..]));
}

#[test]
fn test_megamorphic_site_stays_correct() {
    let engine = Engine::new(EngineConfig::new().with_polymorphism_limit(1));
    let loaded = load(
        &engine,
        call_each(vec![
            int(1),
            string("a"),
            boolean(true),
            float(0.5),
            int(2),
            string("b"),
        ]),
    );
    let out = loaded.run(&engine).first();
    let out = out.as_table().unwrap().borrow();
    assert_eq!(as_int(&out.raw_get(&5i64.into())), 2);
    assert_eq!(as_string(&out.raw_get(&6i64.into())), "b");

    let site = loaded.call_site("f");
    assert_eq!(site.state(), LinkState::Megamorphic);
    // every call after the transition resolves again
    assert_eq!(site.trace().resolutions, 6);
    assert!(engine.stats().megamorphic_sites >= 1);
}

#[test]
fn test_field_site_alternating_tables() {
    let engine = Engine::new(EngineConfig::default());
    let loaded = load(
        &engine,
        vec![
            local(&["t1"], vec![record(vec![("x", int(1))])]),
            local(&["t2"], vec![record(vec![("x", int(2)), ("y", int(3))])]),
            local(&["ts"], vec![list(vec![name("t1"), name("t2"), name("t1"), name("t2")])]),
            local_function("getx", &["t"], vec![ret(vec![field(name("t"), "x")])]),
            local(&["sum"], vec![int(0)]),
            numeric_for(
                "i",
                int(1),
                int(4),
                None,
                vec![set(
                    "sum",
                    add(name("sum"), call(name("getx"), vec![index(name("ts"), name("i"))])),
                )],
            ),
            ret(vec![name("sum")]),
        ],
    );
    assert_eq!(as_int(&loaded.run(&engine).first()), 6);

    let x = loaded.site("x").trace();
    assert_eq!(x.resolutions, 2);
    assert_eq!(x.hits, 2);
    assert_eq!(x.state, LinkState::Polymorphic(2));

    // every argument is a table, so the call itself never relinks
    let getx = loaded.call_site("getx").trace();
    assert_eq!(getx.resolutions, 1);
    assert_eq!(getx.hits, 3);
}

#[test]
fn test_recursive_site_reenters() {
    let engine = Engine::new(EngineConfig::default());
    let loaded = load(
        &engine,
        vec![
            local_function(
                "fib",
                &["n"],
                vec![
                    if_then(lt(name("n"), int(2)), vec![ret(vec![name("n")])]),
                    ret(vec![add(
                        call(name("fib"), vec![sub(name("n"), int(1))]),
                        call(name("fib"), vec![sub(name("n"), int(2))]),
                    )]),
                ],
            ),
            ret(vec![call(name("fib"), vec![int(15)])]),
        ],
    );
    assert_eq!(as_int(&loaded.run(&engine).first()), 610);
    let fib = loaded.proto.find_child("fib").unwrap();
    let inner = fib.sites_labeled("fib").find(|s| s.is_call()).unwrap();
    assert_eq!(inner.state(), LinkState::Monomorphic);
    assert_eq!(inner.trace().resolutions, 1);
}

#[test]
fn test_untraced_sites_keep_resolution_counts() {
    let engine = Engine::new(EngineConfig::new().with_trace_sites(false));
    let loaded = load(&engine, call_each(vec![int(1), int(2), int(3)]));
    loaded.run(&engine);
    let trace = loaded.call_site("f").trace();
    assert_eq!(trace.resolutions, 1);
    assert_eq!(trace.hits, 0);
    assert!(trace.callee.is_none());
    assert!(engine.stats().guard_hits >= 2);
}

#[test]
fn test_host_call_site_links_overload() {
    let engine = Engine::new(EngineConfig::default());
    let loaded = load(
        &engine,
        vec![
            local(&["n"], vec![int(0)]),
            numeric_for(
                "i",
                int(1),
                int(3),
                None,
                vec![set(
                    "n",
                    add(name("n"), call(name("tonumber"), vec![string("2")])),
                )],
            ),
            ret(vec![name("n")]),
        ],
    );
    assert_eq!(as_int(&loaded.run(&engine).first()), 6);
    let trace = loaded.call_site("tonumber").trace();
    assert_eq!(trace.state, LinkState::Monomorphic);
    assert_eq!(trace.callee.as_deref(), Some("tonumber"));
    assert_eq!(trace.hits, 2);
}

#[test]
fn test_global_rebinding_relinks() {
    let engine = Engine::new(EngineConfig::default());
    let loaded = load(
        &engine,
        vec![
            function_stmt(&["g"], &[], vec![ret(vec![int(1)])]),
            local(&["a"], vec![int(0)]),
            local(&["b"], vec![int(0)]),
            numeric_for(
                "i",
                int(1),
                int(2),
                None,
                vec![
                    set("b", call(name("g"), vec![])),
                    set("a", add(name("a"), name("b"))),
                    function_stmt(&["g"], &[], vec![ret(vec![int(10)])]),
                ],
            ),
            ret(vec![name("a")]),
        ],
    );
    assert_eq!(as_int(&loaded.run(&engine).first()), 11);
    assert_eq!(loaded.call_site("g").trace().relinks, 1);
}
