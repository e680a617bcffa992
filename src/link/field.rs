//! Field access resolution

use super::guard::Guard;
use super::site::CallSite;
use super::target::{invalid_key, MetaCall, Target};
use crate::engine::Runtime;
use crate::error::{Diagnostic, LResult};
use crate::value::{TableKey, Value};

/// Operands: `[table, key]`.
pub(super) fn resolve_get(site: &CallSite, rt: &Runtime, ops: &[Value]) -> LResult<(Guard, Target)> {
    let (object, key) = (&ops[0], &ops[1]);
    let Value::Table(table) = object else {
        return Err(rt.error(Diagnostic::index(object, key)));
    };
    let table_key = TableKey::new(key);
    let table = table.borrow();
    let mut guards = vec![
        Guard::Shape {
            index: 0,
            shape: table.shape(),
        },
        Guard::Key {
            index: 1,
            key: table_key.clone(),
        },
    ];
    if let Some(slot) = table_key.as_ref().and_then(|k| table.slot_of(k)) {
        return Ok((Guard::all(guards), Target::FieldSlot(slot)));
    }

    let Some(mt) = table.metatable() else {
        return Ok((Guard::all(guards), Target::FieldMiss));
    };
    let mt = mt.borrow();
    guards.push(Guard::MetaShape {
        index: 0,
        shape: Some(mt.shape()),
    });
    let target = match mt.slot_of(&TableKey::str("__index")) {
        Some(slot) => Target::Metamethod {
            operand: 0,
            slot,
            kind: MetaCall::Index,
            call: site.nested(),
        },
        None => Target::FieldMiss,
    };
    Ok((Guard::all(guards), target))
}

/// Operands: `[table, key, value]`.
pub(super) fn resolve_set(site: &CallSite, rt: &Runtime, ops: &[Value]) -> LResult<(Guard, Target)> {
    let (object, key) = (&ops[0], &ops[1]);
    let Value::Table(table) = object else {
        return Err(rt.error(Diagnostic::index(object, key)));
    };
    let table_key = TableKey::new(key);
    let table = table.borrow();
    let mut guards = vec![
        Guard::Shape {
            index: 0,
            shape: table.shape(),
        },
        Guard::Key {
            index: 1,
            key: table_key.clone(),
        },
    ];
    if let Some(slot) = table_key.as_ref().and_then(|k| table.slot_of(k)) {
        return Ok((Guard::all(guards), Target::FieldStore(slot)));
    }

    let meta = table.metatable();
    let new_index = meta
        .as_ref()
        .and_then(|mt| mt.borrow().slot_of(&TableKey::str("__newindex")));
    guards.push(Guard::MetaShape {
        index: 0,
        shape: meta.as_ref().map(|mt| mt.borrow().shape()),
    });
    match new_index {
        Some(slot) => {
            let target = Target::Metamethod {
                operand: 0,
                slot,
                kind: MetaCall::NewIndex,
                call: site.nested(),
            };
            Ok((Guard::all(guards), target))
        }
        None if table_key.is_none() => Err(rt.error(invalid_key(key))),
        None => Ok((Guard::all(guards), Target::FieldInsert)),
    }
}
