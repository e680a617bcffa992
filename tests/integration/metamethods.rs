// Integration tests for metamethod dispatch through linked sites

use crate::common::{as_float, as_int, as_string, engine, eval, load, run};
use wane::link::LinkState;
use wane::syntax::build::*;
use wane::syntax::{BinOp, Expr, Stmt};

fn setmetatable(t: Expr, mt: Expr) -> Expr {
    call(name("setmetatable"), vec![t, mt])
}

/// `local function plus(x, y) return x + y end`
fn plus() -> Stmt {
    local_function("plus", &["x", "y"], vec![ret(vec![add(name("x"), name("y"))])])
}

/// A metatable whose `__add` returns `self.v + n` for the given field.
fn adder_meta(field_name: &str) -> Expr {
    record(vec![(
        "__add",
        function(&["self", "n"], vec![ret(vec![add(field(name("self"), field_name), name("n"))])]),
    )])
}

#[test]
fn test_left_metamethod_relinks_after_layout_change() {
    let engine = engine();
    let loaded = load(
        &engine,
        vec![
            plus(),
            local(&["a"], vec![setmetatable(record(vec![("v", int(10))]), adder_meta("v"))]),
            local(&["r1"], vec![call(name("plus"), vec![name("a"), int(1)])]),
            local(&["r2"], vec![call(name("plus"), vec![name("a"), int(2)])]),
            assign(vec![field(name("a"), "w")], vec![boolean(true)]),
            local(&["r3"], vec![call(name("plus"), vec![name("a"), int(3)])]),
            ret(vec![name("r1"), name("r2"), name("r3")]),
        ],
    );
    let result = loaded.run(&engine);
    assert_eq!(as_int(&result.get(0)), 11);
    assert_eq!(as_int(&result.get(1)), 12);
    assert_eq!(as_int(&result.get(2)), 13);

    let plus = loaded.proto.find_child("plus").unwrap();
    let site = plus.sites_labeled("+").next().unwrap();
    let trace = site.trace();
    assert_eq!(trace.resolutions, 2);
    assert_eq!(trace.relinks, 1);
    assert_eq!(trace.hits, 1);
}

/// A metatable whose `__add` ignores its operands and returns `tag`.
fn tagged_meta(tag: &str) -> Expr {
    record(vec![("__add", function(&["l", "r"], vec![ret(vec![string(tag)])]))])
}

#[test]
fn test_left_operand_metamethod_wins() {
    let result = run(vec![
        local(&["a"], vec![setmetatable(list(vec![]), tagged_meta("a"))]),
        local(&["b"], vec![setmetatable(list(vec![]), tagged_meta("b"))]),
        ret(vec![add(name("a"), name("b")), add(name("b"), name("a"))]),
    ]);
    assert_eq!(as_string(&result.get(0)), "a");
    assert_eq!(as_string(&result.get(1)), "b");
}

#[test]
fn test_table_field_metamethod_result() {
    let result = run(vec![
        local(&["a"], vec![setmetatable(record(vec![("v", int(1))]), adder_meta("v"))]),
        local(&["b"], vec![setmetatable(record(vec![("v", int(100))]), adder_meta("v"))]),
        ret(vec![add(name("a"), int(5)), add(name("b"), float(0.5))]),
    ]);
    assert_eq!(as_int(&result.get(0)), 6);
    assert_eq!(as_float(&result.get(1)), 100.5);
}

#[test]
fn test_right_only_metamethod_then_left_gains_one() {
    let engine = engine();
    let loaded = load(
        &engine,
        vec![
            plus(),
            local(&["right"], vec![setmetatable(list(vec![]), tagged_meta("right"))]),
            local(&["left"], vec![list(vec![])]),
            local(&["r1"], vec![call(name("plus"), vec![name("left"), name("right")])]),
            call_stmt(name("setmetatable"), vec![name("left"), tagged_meta("left")]),
            local(&["r2"], vec![call(name("plus"), vec![name("left"), name("right")])]),
            ret(vec![name("r1"), name("r2")]),
        ],
    );
    let result = loaded.run(&engine);
    assert_eq!(as_string(&result.get(0)), "right");
    assert_eq!(as_string(&result.get(1)), "left");
    let plus = loaded.proto.find_child("plus").unwrap();
    let site = plus.sites_labeled("+").next().unwrap();
    assert_eq!(site.trace().relinks, 1);
}

#[test]
fn test_number_plus_table_uses_right_handler() {
    let v = eval(vec![
        local(&["a"], vec![setmetatable(record(vec![("v", int(7))]), record(vec![(
            "__add",
            function(&["l", "r"], vec![ret(vec![add(name("l"), field(name("r"), "v"))])]),
        )]))]),
        ret(vec![add(int(3), name("a"))]),
    ]);
    assert_eq!(as_int(&v), 10);
}

#[test]
fn test_overwritten_handler_used_without_relink() {
    let engine = engine();
    let loaded = load(
        &engine,
        vec![
            plus(),
            local(&["mt"], vec![adder_meta("v")]),
            local(&["a"], vec![setmetatable(record(vec![("v", int(1))]), name("mt"))]),
            local(&["r1"], vec![call(name("plus"), vec![name("a"), int(1)])]),
            assign(
                vec![field(name("mt"), "__add")],
                vec![function(&["self", "n"], vec![ret(vec![int(-1)])])],
            ),
            local(&["r2"], vec![call(name("plus"), vec![name("a"), int(1)])]),
            ret(vec![name("r1"), name("r2")]),
        ],
    );
    let result = loaded.run(&engine);
    assert_eq!(as_int(&result.get(0)), 2);
    assert_eq!(as_int(&result.get(1)), -1);
    let plus = loaded.proto.find_child("plus").unwrap();
    let trace = plus.sites_labeled("+").next().unwrap().trace();
    assert_eq!(trace.resolutions, 1);
    assert_eq!(trace.hits, 1);
}

#[test]
fn test_index_through_table_chain() {
    let result = run(vec![
        local(&["base"], vec![record(vec![("kind", string("base")), ("depth", int(0))])]),
        local(&["mid"], vec![setmetatable(
            record(vec![("depth", int(1))]),
            record(vec![("__index", name("base"))]),
        )]),
        local(&["obj"], vec![setmetatable(list(vec![]), record(vec![("__index", name("mid"))]))]),
        ret(vec![field(name("obj"), "kind"), field(name("obj"), "depth"), field(name("obj"), "none")]),
    ]);
    assert_eq!(as_string(&result.get(0)), "base");
    assert_eq!(as_int(&result.get(1)), 1);
    assert!(result.get(2).is_nil());
}

#[test]
fn test_index_function_receives_table_and_key() {
    let v = eval(vec![
        local(&["t"], vec![setmetatable(
            list(vec![]),
            record(vec![(
                "__index",
                function(&["t", "k"], vec![ret(vec![concat(name("k"), string("!"))])]),
            )]),
        )]),
        ret(vec![field(name("t"), "hey")]),
    ]);
    assert_eq!(as_string(&v), "hey!");
}

#[test]
fn test_method_call_through_index() {
    let v = eval(vec![
        local(&["Point"], vec![list(vec![])]),
        assign(vec![field(name("Point"), "__index")], vec![name("Point")]),
        method_stmt(
            &["Point"],
            "norm1",
            &[],
            vec![ret(vec![add(field(name("self"), "x"), field(name("self"), "y"))])],
        ),
        local(&["p"], vec![setmetatable(
            record(vec![("x", int(3)), ("y", int(4))]),
            name("Point"),
        )]),
        ret(vec![method(name("p"), "norm1", vec![])]),
    ]);
    assert_eq!(as_int(&v), 7);
}

#[test]
fn test_newindex_table_and_function() {
    let result = run(vec![
        local(&["store"], vec![list(vec![])]),
        local(&["proxy"], vec![setmetatable(list(vec![]), record(vec![("__newindex", name("store"))]))]),
        assign(vec![field(name("proxy"), "a")], vec![int(1)]),
        local(&["log"], vec![list(vec![])]),
        local(&["watched"], vec![setmetatable(
            list(vec![]),
            record(vec![(
                "__newindex",
                function(
                    &["t", "k", "v"],
                    vec![call_stmt(name("rawset"), vec![name("log"), name("k"), mul(name("v"), int(2))])],
                ),
            )]),
        )]),
        assign(vec![field(name("watched"), "b")], vec![int(5)]),
        ret(vec![
            call(name("rawget"), vec![name("proxy"), string("a")]),
            field(name("store"), "a"),
            field(name("log"), "b"),
            call(name("rawget"), vec![name("watched"), string("b")]),
        ]),
    ]);
    assert!(result.get(0).is_nil());
    assert_eq!(as_int(&result.get(1)), 1);
    assert_eq!(as_int(&result.get(2)), 10);
    assert!(result.get(3).is_nil());
}

#[test]
fn test_existing_key_bypasses_newindex() {
    let v = eval(vec![
        local(&["hits"], vec![int(0)]),
        local(&["t"], vec![setmetatable(
            record(vec![("x", int(1))]),
            record(vec![(
                "__newindex",
                function(&["t", "k", "v"], vec![set("hits", add(name("hits"), int(1)))]),
            )]),
        )]),
        assign(vec![field(name("t"), "x")], vec![int(2)]),
        assign(vec![field(name("t"), "y")], vec![int(3)]),
        ret(vec![add(mul(name("hits"), int(100)), field(name("t"), "x"))]),
    ]);
    assert_eq!(as_int(&v), 102);
}

#[test]
fn test_call_metamethod() {
    let engine = engine();
    let loaded = load(
        &engine,
        vec![
            local(&["double"], vec![setmetatable(
                list(vec![]),
                record(vec![(
                    "__call",
                    function(&["self", "x"], vec![ret(vec![mul(name("x"), int(2))])]),
                )]),
            )]),
            local(&["n"], vec![int(0)]),
            numeric_for(
                "i",
                int(1),
                int(3),
                None,
                vec![set("n", add(name("n"), call(name("double"), vec![name("i")])))],
            ),
            ret(vec![name("n")]),
        ],
    );
    assert_eq!(as_int(&loaded.run(&engine).first()), 12);
    let trace = loaded.call_site("double").trace();
    assert_eq!(trace.state, LinkState::Monomorphic);
    assert_eq!(trace.resolutions, 1);
}

#[test]
fn test_eq_metamethod() {
    let result = run(vec![
        local(&["mt"], vec![record(vec![(
            "__eq",
            function(&["a", "b"], vec![ret(vec![eq(field(name("a"), "id"), field(name("b"), "id"))])]),
        )])]),
        local(&["a"], vec![setmetatable(record(vec![("id", int(1))]), name("mt"))]),
        local(&["b"], vec![setmetatable(record(vec![("id", int(1))]), name("mt"))]),
        local(&["c"], vec![setmetatable(record(vec![("id", int(2))]), name("mt"))]),
        ret(vec![
            eq(name("a"), name("b")),
            eq(name("a"), name("c")),
            binary(BinOp::Ne, name("a"), name("b")),
            eq(name("a"), name("a")),
            eq(name("a"), int(1)),
        ]),
    ]);
    assert!(result.get(0).truthy());
    assert!(!result.get(1).truthy());
    assert!(!result.get(2).truthy());
    assert!(result.get(3).truthy());
    assert!(!result.get(4).truthy());
}

#[test]
fn test_plain_tables_compare_by_identity() {
    let result = run(vec![
        local(&["a"], vec![list(vec![])]),
        local(&["b"], vec![list(vec![])]),
        ret(vec![eq(name("a"), name("b")), eq(name("a"), name("a"))]),
    ]);
    assert!(!result.get(0).truthy());
    assert!(result.get(1).truthy());
}

#[test]
fn test_ordering_metamethods() {
    let result = run(vec![
        local(&["mt"], vec![record(vec![
            (
                "__lt",
                function(&["a", "b"], vec![ret(vec![lt(field(name("a"), "n"), field(name("b"), "n"))])]),
            ),
            (
                "__le",
                function(&["a", "b"], vec![ret(vec![le(field(name("a"), "n"), field(name("b"), "n"))])]),
            ),
        ])]),
        local(&["one"], vec![setmetatable(record(vec![("n", int(1))]), name("mt"))]),
        local(&["two"], vec![setmetatable(record(vec![("n", int(2))]), name("mt"))]),
        ret(vec![
            lt(name("one"), name("two")),
            binary(BinOp::Gt, name("one"), name("two")),
            le(name("two"), name("two")),
            binary(BinOp::Ge, name("one"), name("two")),
        ]),
    ]);
    assert!(result.get(0).truthy());
    assert!(!result.get(1).truthy());
    assert!(result.get(2).truthy());
    assert!(!result.get(3).truthy());
}

#[test]
fn test_unary_metamethods() {
    let result = run(vec![
        local(&["v"], vec![setmetatable(
            record(vec![("x", float(1.5))]),
            record(vec![
                ("__unm", function(&["a"], vec![ret(vec![neg(field(name("a"), "x"))])])),
                ("__len", function(&["a"], vec![ret(vec![int(99)])])),
                (
                    "__concat",
                    function(&["a", "b"], vec![ret(vec![concat(string("v:"), name("b"))])]),
                ),
            ]),
        )]),
        ret(vec![neg(name("v")), len(name("v")), concat(name("v"), string("z"))]),
    ]);
    assert_eq!(as_float(&result.get(0)), -1.5);
    assert_eq!(as_int(&result.get(1)), 99);
    assert_eq!(as_string(&result.get(2)), "v:z");
}

#[test]
fn test_tostring_through_metatable() {
    let v = eval(vec![
        local(&["t"], vec![setmetatable(
            list(vec![]),
            record(vec![("__tostring", function(&["t"], vec![ret(vec![string("<t>")])]))]),
        )]),
        ret(vec![call(name("tostring"), vec![name("t")])]),
    ]);
    assert_eq!(as_string(&v), "<t>");
}
