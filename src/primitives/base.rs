//! Basic primitives: type inspection, conversion and errors

use super::def::{OverloadDef, PrimitiveDef};
use crate::engine::Runtime;
use crate::error::{LResult, ScriptError};
use crate::ffi::{DeclaredType, Param, Returns};
use crate::value::{Multi, Value};

const ANY: Param = Param::of(DeclaredType::Any);

fn prim_type(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    Ok(Value::from(args[0].type_name()).into())
}

/// Honors `__tostring`.
fn prim_tostring(rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    let value = &args[0];
    if let Some(mt) = value.metatable() {
        let handler = mt.borrow().get_str("__tostring");
        if !handler.is_nil() {
            return Ok(rt.call(&handler, &[value.clone()])?.into_first().into());
        }
    }
    Ok(Value::from(value.to_string().as_str()).into())
}

fn prim_tonumber_number(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    Ok(args[0].clone().into())
}

fn prim_tonumber_string(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    let Value::Str(s) = &args[0] else {
        return Ok(Value::Nil.into());
    };
    Ok(parse_number(s).unwrap_or(Value::Nil).into())
}

fn prim_tonumber_other(_rt: &Runtime, _args: &[Value]) -> LResult<Multi> {
    Ok(Value::Nil.into())
}

/// Decimal integer or float literal, surrounding whitespace allowed.
pub(crate) fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || "+-.eE".contains(c)) {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Int(i));
    }
    s.parse::<f64>().ok().map(Value::Float)
}

/// Raises its argument untouched.
fn prim_error(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    Err(ScriptError::raise(args.first().cloned().unwrap_or(Value::Nil)))
}

fn prim_assert(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    if args[0].truthy() {
        return Ok(Multi::from_vec(args.to_vec()));
    }
    match args.get(1) {
        Some(message) if !message.is_nil() => Err(ScriptError::raise(message.clone())),
        _ => Err(ScriptError::message("assertion failed!")),
    }
}

fn prim_select_index(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    let Value::Int(n) = args[0] else {
        return Err(ScriptError::message("bad argument #1 to 'select' (number expected)"));
    };
    let rest = &args[1..];
    let len = rest.len() as i64;
    let start = if n < 0 { len + n } else { n - 1 };
    if n == 0 || start < 0 {
        return Err(ScriptError::message("bad argument #1 to 'select' (index out of range)"));
    }
    let start = (start as usize).min(rest.len());
    Ok(Multi::from_vec(rest[start..].to_vec()))
}

fn prim_select_count(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    match &args[0] {
        Value::Str(s) if &**s == "#" => Ok(Value::Int(args.len() as i64 - 1).into()),
        _ => Err(ScriptError::message("bad argument #1 to 'select' (number expected)")),
    }
}

fn prim_rawequal(_rt: &Runtime, args: &[Value]) -> LResult<Multi> {
    Ok(Value::Bool(args[0].raw_equal(&args[1])).into())
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "type",
        doc: "Type name of a value.",
        params: &["v"],
        overloads: &[OverloadDef {
            params: &[ANY],
            returns: Returns::Exact(1),
            func: prim_type,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "tostring",
        doc: "String form of a value, through __tostring when present.",
        params: &["v"],
        overloads: &[OverloadDef {
            params: &[ANY],
            returns: Returns::Exact(1),
            func: prim_tostring,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "tonumber",
        doc: "Number for a number or numeric string, nil otherwise.",
        params: &["v"],
        overloads: &[
            OverloadDef {
                params: &[Param::of(DeclaredType::Integer)],
                returns: Returns::Exact(1),
                func: prim_tonumber_number,
                ..OverloadDef::DEFAULT
            },
            OverloadDef {
                params: &[Param::of(DeclaredType::Float)],
                returns: Returns::Exact(1),
                func: prim_tonumber_number,
                ..OverloadDef::DEFAULT
            },
            OverloadDef {
                params: &[Param::of(DeclaredType::String)],
                returns: Returns::Exact(1),
                func: prim_tonumber_string,
                ..OverloadDef::DEFAULT
            },
            OverloadDef {
                params: &[ANY],
                variadic: true,
                fallback: true,
                returns: Returns::Exact(1),
                func: prim_tonumber_other,
                ..OverloadDef::DEFAULT
            },
        ],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "error",
        doc: "Raise a value as an error.",
        params: &["v"],
        overloads: &[OverloadDef {
            params: &[ANY],
            variadic: true,
            func: prim_error,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "assert",
        doc: "Return all arguments if the first is true, raise otherwise.",
        params: &["v", "message"],
        overloads: &[OverloadDef {
            params: &[ANY, ANY],
            variadic: true,
            func: prim_assert,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "select",
        doc: "Arguments after position n, or their count for '#'.",
        params: &["n", "..."],
        overloads: &[
            OverloadDef {
                params: &[Param::of(DeclaredType::Integer), ANY],
                variadic: true,
                func: prim_select_index,
                ..OverloadDef::DEFAULT
            },
            OverloadDef {
                params: &[Param::of(DeclaredType::String), ANY],
                variadic: true,
                returns: Returns::Exact(1),
                func: prim_select_count,
                ..OverloadDef::DEFAULT
            },
        ],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "rawequal",
        doc: "Equality without __eq.",
        params: &["a", "b"],
        overloads: &[OverloadDef {
            params: &[ANY, ANY],
            returns: Returns::Exact(1),
            func: prim_rawequal,
            ..OverloadDef::DEFAULT
        }],
        ..PrimitiveDef::DEFAULT
    },
];
