//! Cached call-site targets

use super::site::CallSite;
use crate::arithmetic::{arith_values, concat_values, less, negate};
use crate::engine::Runtime;
use crate::error::{fault, Diagnostic, EngineFault, LResult, ScriptError};
use crate::ffi::Selection;
use crate::hir::BinaryOp;
use crate::specialize::Specialization;
use crate::types::Type;
use crate::value::{Callable, Multi, TableKey, Value};
use std::rc::Rc;

/// Longest `__index`/`__newindex` delegation chain followed.
const MAX_DELEGATION: usize = 100;

/// How a metamethod handler is applied to the operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCall {
    /// `handler(a, b)`, first result
    Binary,
    /// `handler(a, b)`, first result as a boolean
    Compare,
    /// Like `Compare`, but operands that are raw-equal never reach the
    /// handler
    Equal,
    /// `handler(a, a)`, first result
    Unary,
    /// `handler(callee, args...)`, all results
    Call,
    /// `__index`: a table handler is indexed, a function is called
    Index,
    /// `__newindex`: a table handler is assigned into, a function is called
    NewIndex,
}

/// What a linked site runs once its guard holds.
#[derive(Clone)]
pub enum Target {
    Arith(BinaryOp),
    Concat,
    Compare(BinaryOp),
    RawEqual,
    Negate,
    StrLen,
    RawLen,
    /// Handler read from `slot` of the metatable of operand `operand`
    Metamethod {
        operand: usize,
        slot: usize,
        kind: MetaCall,
        call: Rc<CallSite>,
    },
    FieldSlot(usize),
    FieldMiss,
    FieldStore(usize),
    FieldInsert,
    Closure(Rc<Specialization>),
    Host(Selection),
}

impl Target {
    pub fn run(&self, rt: &Runtime, ops: &[Value]) -> LResult<Multi> {
        match self {
            Target::Arith(op) => match arith_values(*op, &ops[0], &ops[1]) {
                Some(Ok(v)) => Ok(v.into()),
                Some(Err(d)) => Err(rt.error(d)),
                None => fault(EngineFault::StaleTarget("arithmetic on non-numbers")),
            },
            Target::Concat => match concat_values(&ops[0], &ops[1]) {
                Some(v) => Ok(v.into()),
                None => fault(EngineFault::StaleTarget("concatenation of non-strings")),
            },
            Target::Compare(op) => match less(&ops[0], &ops[1], *op == BinaryOp::Lt) {
                Some(b) => Ok(Value::Bool(b).into()),
                None => fault(EngineFault::StaleTarget("comparison of mixed operands")),
            },
            Target::RawEqual => Ok(Value::Bool(ops[0].raw_equal(&ops[1])).into()),
            Target::Negate => match negate(&ops[0]) {
                Some(v) => Ok(v.into()),
                None => fault(EngineFault::StaleTarget("negation of a non-number")),
            },
            Target::StrLen => match &ops[0] {
                Value::Str(s) => Ok(Value::Int(s.len() as i64).into()),
                _ => fault(EngineFault::StaleTarget("string length of a non-string")),
            },
            Target::RawLen => match &ops[0] {
                Value::Table(t) => Ok(Value::Int(t.borrow().len()).into()),
                _ => fault(EngineFault::StaleTarget("table length of a non-table")),
            },
            Target::Metamethod {
                operand,
                slot,
                kind,
                call,
            } => {
                let handler = handler(&ops[*operand], *slot);
                apply(rt, *kind, call, handler, ops)
            }
            Target::FieldSlot(slot) => Ok(table(&ops[0]).borrow().slot(*slot).into()),
            Target::FieldMiss => Ok(Value::Nil.into()),
            Target::FieldStore(slot) => {
                let t = table(&ops[0]);
                let value = ops[2].clone();
                if value.is_nil() {
                    if let Some(key) = TableKey::new(&ops[1]) {
                        t.borrow_mut().set(key, Value::Nil);
                    }
                } else if !t.borrow_mut().overwrite_slot(*slot, value) {
                    fault(EngineFault::StaleTarget("field store into a dead slot"));
                }
                Ok(Multi::empty())
            }
            Target::FieldInsert => {
                match TableKey::new(&ops[1]) {
                    Some(key) => table(&ops[0]).borrow_mut().set(key, ops[2].clone()),
                    None => fault(EngineFault::StaleTarget("field insert with an invalid key")),
                }
                Ok(Multi::empty())
            }
            Target::Closure(spec) => match &ops[0] {
                Value::Function(Callable::Closure(closure)) => {
                    spec.invoke(rt, closure.captures(), &ops[1..])
                }
                _ => fault(EngineFault::StaleTarget("closure target without a closure")),
            },
            Target::Host(selection) => match &ops[0] {
                Value::Function(Callable::Host(host)) => host.invoke(rt, selection, &ops[1..]),
                _ => fault(EngineFault::StaleTarget("host target without a host function")),
            },
        }
    }

    /// Name of what this target ends up calling, and the argument types
    /// of the specialization it runs, for site traces.
    pub(super) fn describe(&self, ops: &[Value]) -> (Option<Rc<str>>, Option<Box<[Type]>>) {
        match self {
            Target::Closure(spec) => (Some(spec.name().clone()), Some(spec.args().into())),
            Target::Host(_) => match &ops[0] {
                Value::Function(c) => (Some(c.name()), None),
                _ => (None, None),
            },
            Target::Metamethod { operand, slot, .. } => match handler(&ops[*operand], *slot) {
                Value::Function(c) => (Some(c.name()), None),
                _ => (None, None),
            },
            _ => (None, None),
        }
    }
}

fn table(value: &Value) -> &crate::value::TableRef {
    match value {
        Value::Table(t) => t,
        _ => fault(EngineFault::StaleTarget("field target on a non-table")),
    }
}

/// Current handler in a metatable slot. Overwritten handlers are picked
/// up here since overwriting keeps the metatable's shape.
fn handler(value: &Value, slot: usize) -> Value {
    match value.metatable() {
        Some(mt) => mt.borrow().slot(slot),
        None => fault(EngineFault::StaleTarget("metamethod target without a metatable")),
    }
}

fn apply(
    rt: &Runtime,
    kind: MetaCall,
    call: &CallSite,
    handler: Value,
    ops: &[Value],
) -> LResult<Multi> {
    match kind {
        MetaCall::Binary => {
            let result = call.invoke(rt, &[handler, ops[0].clone(), ops[1].clone()])?;
            Ok(result.into_first().into())
        }
        MetaCall::Compare => {
            let result = call.invoke(rt, &[handler, ops[0].clone(), ops[1].clone()])?;
            Ok(Value::Bool(result.first().truthy()).into())
        }
        MetaCall::Equal => {
            if ops[0].raw_equal(&ops[1]) {
                return Ok(Value::Bool(true).into());
            }
            let result = call.invoke(rt, &[handler, ops[0].clone(), ops[1].clone()])?;
            Ok(Value::Bool(result.first().truthy()).into())
        }
        MetaCall::Unary => {
            let result = call.invoke(rt, &[handler, ops[0].clone(), ops[0].clone()])?;
            Ok(result.into_first().into())
        }
        MetaCall::Call => {
            let mut args = Vec::with_capacity(ops.len() + 1);
            args.push(handler);
            args.extend_from_slice(ops);
            call.invoke(rt, &args)
        }
        MetaCall::Index => index_through(rt, call, handler, &ops[0], &ops[1]).map(Multi::from),
        MetaCall::NewIndex => {
            new_index_through(rt, call, handler, &ops[0], &ops[1], &ops[2])?;
            Ok(Multi::empty())
        }
    }
}

/// Follow an `__index` chain starting at `handler`.
pub(super) fn index_through(
    rt: &Runtime,
    call: &CallSite,
    mut handler: Value,
    object: &Value,
    key: &Value,
) -> LResult<Value> {
    let mut object = object.clone();
    for _ in 0..MAX_DELEGATION {
        let next = match &handler {
            Value::Function(_) => {
                let result = call.invoke(rt, &[handler.clone(), object, key.clone()])?;
                return Ok(result.into_first());
            }
            Value::Table(t) => {
                let t = t.borrow();
                let raw = t.raw_get(key);
                if !raw.is_nil() {
                    return Ok(raw);
                }
                match t.metatable().map(|mt| mt.borrow().get_str("__index")) {
                    Some(next) if !next.is_nil() => next,
                    _ => return Ok(Value::Nil),
                }
            }
            other => return Err(rt.error(Diagnostic::index(other, key))),
        };
        object = std::mem::replace(&mut handler, next);
    }
    Err(ScriptError::message("'__index' chain too long; possible loop"))
}

/// Follow a `__newindex` chain starting at `handler`.
pub(super) fn new_index_through(
    rt: &Runtime,
    call: &CallSite,
    mut handler: Value,
    object: &Value,
    key: &Value,
    value: &Value,
) -> LResult<()> {
    let mut object = object.clone();
    for _ in 0..MAX_DELEGATION {
        let next = match &handler {
            Value::Function(_) => {
                call.invoke(rt, &[handler.clone(), object, key.clone(), value.clone()])?;
                return Ok(());
            }
            Value::Table(t) => {
                let Some(table_key) = TableKey::new(key) else {
                    return Err(rt.error(invalid_key(key)));
                };
                let next = {
                    let t = t.borrow();
                    if t.slot_of(&table_key).is_some() {
                        None
                    } else {
                        t.metatable()
                            .map(|mt| mt.borrow().get_str("__newindex"))
                            .filter(|h| !h.is_nil())
                    }
                };
                match next {
                    Some(next) => next,
                    None => {
                        t.borrow_mut().set(table_key, value.clone());
                        return Ok(());
                    }
                }
            }
            other => return Err(rt.error(Diagnostic::index(other, key))),
        };
        object = std::mem::replace(&mut handler, next);
    }
    Err(ScriptError::message("'__newindex' chain too long; possible loop"))
}

pub(super) fn invalid_key(key: &Value) -> Diagnostic {
    Diagnostic::invalid_key(key).unwrap_or(Diagnostic::InvalidKey { reason: "invalid" })
}
