//! Table primitives: metatables, raw access and iteration

use super::def::{OverloadDef, PrimitiveDef};
use crate::engine::Runtime;
use crate::error::{Diagnostic, LResult, ScriptError};
use crate::ffi::{DeclaredType, IntrinsicId, Param, Returns};
use crate::value::{Multi, Table, TableKey, TableRef, Value};

const ANY: Param = Param::of(DeclaredType::Any);
const TABLE: Param = Param::of(DeclaredType::Table);

/// Position of the next snapshot entry in a `pairs` iteration state.
const POSITION: &str = "position";

fn table(value: &Value) -> LResult<&TableRef> {
    value
        .as_table()
        .ok_or_else(|| ScriptError::message(format!("table expected, got {}", value.type_name())))
}

fn prim_setmetatable(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    let t = table(&args[0])?;
    let metatable = match args.get(1) {
        Some(Value::Table(mt)) => Some(mt.clone()),
        _ => None,
    };
    t.borrow_mut().set_metatable(metatable);
    Ok(args[0].clone().into())
}

fn prim_getmetatable(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    Ok(args[0].metatable().map(Value::Table).unwrap_or(Value::Nil).into())
}

fn prim_rawget(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    Ok(table(&args[0])?.borrow().raw_get(&args[1]).into())
}

fn prim_rawset(rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    let t = table(&args[0])?;
    let Some(key) = TableKey::new(&args[1]) else {
        return Err(rt.error(
            Diagnostic::invalid_key(&args[1]).unwrap_or(Diagnostic::InvalidKey { reason: "invalid" }),
        ));
    };
    t.borrow_mut().set(key, args[2].clone());
    Ok(args[0].clone().into())
}

fn prim_rawlen(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    let n = match &args[0] {
        Value::Str(s) => s.len() as i64,
        other => table(other)?.borrow().len(),
    };
    Ok(Value::Int(n).into())
}

fn prim_next(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    let t = table(&args[0])?;
    let key = args.get(1).cloned().unwrap_or(Value::Nil);
    let next = t.borrow().next(&key);
    match next {
        Ok(Some((k, v))) => Ok(Multi::from_vec(vec![k, v])),
        Ok(None) => Ok(Value::Nil.into()),
        Err(()) => Err(ScriptError::message("invalid key to 'next'")),
    }
}

/// `next, t, nil`, or whatever `__pairs` returns.
fn prim_pairs(rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    if let Some(mt) = args[0].metatable() {
        let handler = mt.borrow().get_str("__pairs");
        if !handler.is_nil() {
            return Ok(rt.call(&handler, &args[..1])?.adjust(3));
        }
    }
    Ok(Multi::from_vec(vec![
        rt.builtin("next"),
        args[0].clone(),
        Value::Nil,
    ]))
}

/// Stateful `pairs` for generic `for` loops: the entries are copied into
/// a private state table up front and walked by position.
fn prim_pairs_iteration(rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    if args[0]
        .metatable()
        .is_some_and(|mt| !mt.borrow().get_str("__pairs").is_nil())
    {
        return prim_pairs(rt, args);
    }
    let mut state = Table::new();
    for (i, (k, v)) in table(&args[0])?.borrow().iter().enumerate() {
        let i = i as i64;
        state.set(TableKey::Int(2 * i + 1), k);
        state.set(TableKey::Int(2 * i + 2), v);
    }
    state.set_str(POSITION, Value::Int(1));
    Ok(Multi::from_vec(vec![
        rt.builtin("pairs step"),
        Value::table(state),
        Value::Nil,
    ]))
}

fn prim_pairs_step(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    let mut state = table(&args[0])?.borrow_mut();
    let Value::Int(position) = state.get_str(POSITION) else {
        return Ok(Value::Nil.into());
    };
    let key = state.get(&TableKey::Int(position));
    if key.is_nil() {
        return Ok(Value::Nil.into());
    }
    let value = state.get(&TableKey::Int(position + 1));
    state.set_str(POSITION, Value::Int(position + 2));
    Ok(Multi::from_vec(vec![key, value]))
}

fn prim_ipairs(rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    Ok(Multi::from_vec(vec![
        rt.builtin("ipairs step"),
        args[0].clone(),
        Value::Int(0),
    ]))
}

/// Stops at the first nil, honoring `__index`.
fn prim_ipairs_step(rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    let Value::Int(i) = args[1] else {
        return Ok(Value::Nil.into());
    };
    let key = Value::Int(i + 1);
    let value = rt.index(&args[0], &key)?;
    if value.is_nil() {
        return Ok(Value::Nil.into());
    }
    Ok(Multi::from_vec(vec![key, value]))
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "setmetatable",
        doc: "Set or clear the metatable of a table; returns the table.",
        params: &["t", "mt"],
        overloads: &[OverloadDef {
            params: &[TABLE, Param::nullable(DeclaredType::Table)],
            returns: Returns::Exact(1),
            func: prim_setmetatable,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "getmetatable",
        doc: "Metatable of a value, or nil.",
        params: &["v"],
        overloads: &[OverloadDef {
            params: &[ANY],
            returns: Returns::Exact(1),
            func: prim_getmetatable,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "rawget",
        doc: "t[k] without __index.",
        params: &["t", "k"],
        overloads: &[OverloadDef {
            params: &[TABLE, ANY],
            returns: Returns::Exact(1),
            func: prim_rawget,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "rawset",
        doc: "t[k] = v without __newindex; returns the table.",
        params: &["t", "k", "v"],
        overloads: &[OverloadDef {
            params: &[TABLE, ANY, ANY],
            returns: Returns::Exact(1),
            func: prim_rawset,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "rawlen",
        doc: "Length of a table or string without __len.",
        params: &["v"],
        overloads: &[
            OverloadDef {
                params: &[TABLE],
                returns: Returns::Exact(1),
                func: prim_rawlen,
                ..OverloadDef::DEFAULT
            },
            OverloadDef {
                params: &[Param::of(DeclaredType::String)],
                returns: Returns::Exact(1),
                func: prim_rawlen,
                ..OverloadDef::DEFAULT
            },
        ],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "next",
        doc: "The entry after key k, or nil at the end.",
        params: &["t", "k"],
        overloads: &[OverloadDef {
            params: &[TABLE, ANY],
            variadic: true,
            func: prim_next,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "pairs",
        doc: "Iterator triple over every entry of a table.",
        params: &["t"],
        overloads: &[
            OverloadDef {
                params: &[TABLE],
                intrinsic: Some(IntrinsicId::Iteration),
                returns: Returns::Exact(3),
                func: prim_pairs_iteration,
                ..OverloadDef::DEFAULT
            },
            OverloadDef {
                params: &[TABLE],
                returns: Returns::Exact(3),
                func: prim_pairs,
                ..OverloadDef::DEFAULT
            },
        ],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "pairs step",
        doc: "Iterator function behind the stateful pairs.",
        params: &["state"],
        global: false,
        overloads: &[OverloadDef {
            params: &[TABLE, ANY],
            variadic: true,
            func: prim_pairs_step,
            ..OverloadDef::DEFAULT
        }],
    },
    PrimitiveDef {
        name: "ipairs",
        doc: "Iterator triple over t[1], t[2], ... up to the first nil.",
        params: &["t"],
        overloads: &[OverloadDef {
            params: &[ANY],
            returns: Returns::Exact(3),
            func: prim_ipairs,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "ipairs step",
        doc: "Iterator function returned by ipairs.",
        params: &["t", "i"],
        global: false,
        overloads: &[OverloadDef {
            params: &[ANY, Param::of(DeclaredType::Integer)],
            func: prim_ipairs_step,
            ..OverloadDef::DEFAULT
        }],
    },
];
