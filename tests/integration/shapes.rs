// Integration tests for table shapes as seen by field sites

use crate::common::{as_int, eval, load};
use wane::syntax::build::*;
use wane::value::{Table, TableRef, Value};
use wane::Engine;

/// `getv(T)` from a chunk that can be re-run against a host-owned `T`.
fn getv_chunk(engine: &Engine) -> crate::common::Loaded {
    load(
        engine,
        vec![
            local_function("getv", &["t"], vec![ret(vec![field(name("t"), "v")])]),
            ret(vec![call(name("getv"), vec![name("T")])]),
        ],
    )
}

fn host_table(engine: &Engine, v: i64) -> TableRef {
    let t = Table::new_ref();
    t.borrow_mut().set_str("v", Value::Int(v));
    engine.set_global("T", Value::Table(t.clone()));
    t
}

#[test]
fn test_overwrite_keeps_field_site_linked() {
    let engine = crate::common::engine();
    let t = host_table(&engine, 1);
    let loaded = getv_chunk(&engine);
    assert_eq!(as_int(&loaded.run(&engine).first()), 1);
    t.borrow_mut().set_str("v", Value::Int(2));
    assert_eq!(as_int(&loaded.run(&engine).first()), 2);

    let trace = loaded.site("v").trace();
    assert_eq!(trace.resolutions, 1);
    assert_eq!(trace.hits, 1);
}

#[test]
fn test_insert_and_remove_relink_field_site() {
    let engine = crate::common::engine();
    let t = host_table(&engine, 1);
    let loaded = getv_chunk(&engine);
    loaded.run(&engine);

    t.borrow_mut().set_str("w", Value::Int(3));
    assert_eq!(as_int(&loaded.run(&engine).first()), 1);
    assert_eq!(loaded.site("v").trace().resolutions, 2);

    t.borrow_mut().set_str("w", Value::Nil);
    assert_eq!(as_int(&loaded.run(&engine).first()), 1);
    assert_eq!(loaded.site("v").trace().resolutions, 3);
}

#[test]
fn test_removed_field_reads_nil() {
    let engine = crate::common::engine();
    let t = host_table(&engine, 1);
    let loaded = getv_chunk(&engine);
    loaded.run(&engine);
    t.borrow_mut().set_str("v", Value::Nil);
    assert!(loaded.run(&engine).first().is_nil());
    // revived under a fresh shape
    t.borrow_mut().set_str("v", Value::Int(9));
    assert_eq!(as_int(&loaded.run(&engine).first()), 9);
    assert_eq!(loaded.site("v").trace().resolutions, 3);
}

#[test]
fn test_setmetatable_relinks_field_site() {
    let engine = crate::common::engine();
    let t = Table::new_ref();
    engine.set_global("T", Value::Table(t.clone()));
    let loaded = getv_chunk(&engine);
    assert!(loaded.run(&engine).first().is_nil());

    let proto = Table::new_ref();
    proto.borrow_mut().set_str("v", Value::Int(4));
    let meta = Table::new_ref();
    meta.borrow_mut().set_str("__index", Value::Table(proto.clone()));
    t.borrow_mut().set_metatable(Some(meta));
    assert_eq!(as_int(&loaded.run(&engine).first()), 4);
    assert_eq!(loaded.site("v").trace().resolutions, 2);

    // the fallback table is read through its own site
    proto.borrow_mut().set_str("v", Value::Int(5));
    assert_eq!(as_int(&loaded.run(&engine).first()), 5);
    assert_eq!(loaded.site("v").trace().resolutions, 2);
}

#[test]
fn test_tables_never_share_a_shape() {
    let a = Table::new();
    let b = Table::new();
    assert_ne!(a.shape(), b.shape());

    let mut a = a;
    let mut b = b;
    a.set_str("x", Value::Int(1));
    b.set_str("x", Value::Int(1));
    assert_ne!(a.shape(), b.shape());
}

#[test]
fn test_next_skips_removed_keys() {
    let v = eval(vec![
        local(&["t"], vec![record(vec![("a", int(1)), ("b", int(2)), ("c", int(3))])]),
        assign(vec![field(name("t"), "b")], vec![nil()]),
        local(&["n"], vec![int(0)]),
        generic_for(
            &["k", "v"],
            vec![name("next"), name("t"), nil()],
            vec![set("n", add(name("n"), name("v")))],
        ),
        ret(vec![name("n")]),
    ]);
    assert_eq!(as_int(&v), 4);
}

#[test]
fn test_clearing_fields_during_traversal() {
    let result = crate::common::run(vec![
        local(&["t"], vec![record(vec![("a", int(1)), ("b", int(2)), ("c", int(3))])]),
        local(&["n"], vec![int(0)]),
        generic_for(
            &["k"],
            vec![name("next"), name("t"), nil()],
            vec![
                assign(vec![index(name("t"), name("k"))], vec![nil()]),
                set("n", add(name("n"), int(1))),
            ],
        ),
        ret(vec![name("n"), call(name("next"), vec![name("t")])]),
    ]);
    assert_eq!(as_int(&result.get(0)), 3);
    assert!(result.get(1).is_nil());
}
