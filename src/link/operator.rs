//! Operator resolution

use super::guard::{watch, Guard};
use super::site::CallSite;
use super::target::{MetaCall, Target};
use crate::arithmetic::concat_piece;
use crate::engine::Runtime;
use crate::error::{Diagnostic, LResult};
use crate::hir::{BinaryOp, UnaryOp};
use crate::types::Tag;
use crate::value::{TableKey, Value};

/// Slot of `event` in the metatable of `value`.
pub(super) fn metamethod(value: &Value, event: &str) -> Option<usize> {
    let mt = value.metatable()?;
    let mt = mt.borrow();
    mt.slot_of(&TableKey::str(event))
}

fn tags(a: &Value, b: &Value) -> Guard {
    Guard::all([
        Guard::Tag {
            index: 0,
            tag: a.tag(),
        },
        Guard::Tag {
            index: 1,
            tag: b.tag(),
        },
    ])
}

/// The primitive behavior of `op`, if it applies to these operands.
fn primitive(op: BinaryOp, a: &Value, b: &Value) -> Option<Target> {
    let numbers = a.tag().is_number() && b.tag().is_number();
    match op {
        BinaryOp::Eq => (a.tag() != Tag::Table || b.tag() != Tag::Table).then_some(Target::RawEqual),
        BinaryOp::Lt | BinaryOp::Le => {
            let strings = a.tag() == Tag::String && b.tag() == Tag::String;
            (numbers || strings).then_some(Target::Compare(op))
        }
        BinaryOp::Concat => {
            (concat_piece(a).is_some() && concat_piece(b).is_some()).then_some(Target::Concat)
        }
        _ => numbers.then_some(Target::Arith(op)),
    }
}

pub(super) fn resolve_binary(
    site: &CallSite,
    rt: &Runtime,
    op: BinaryOp,
    ops: &[Value],
) -> LResult<(Guard, Target)> {
    let (a, b) = (&ops[0], &ops[1]);
    if let Some(target) = primitive(op, a, b) {
        return Ok((tags(a, b), target));
    }

    let kind = match op {
        BinaryOp::Eq => MetaCall::Equal,
        BinaryOp::Lt | BinaryOp::Le => MetaCall::Compare,
        _ => MetaCall::Binary,
    };
    let event = op.event();
    if let Some(slot) = metamethod(a, event) {
        let mut guards = watch(0, a);
        if op == BinaryOp::Eq {
            guards.push(Guard::Tag {
                index: 1,
                tag: Tag::Table,
            });
        }
        let target = Target::Metamethod {
            operand: 0,
            slot,
            kind,
            call: site.nested(),
        };
        return Ok((Guard::all(guards), target));
    }
    if let Some(slot) = metamethod(b, event) {
        // the left operand is watched too, so it gaining the metamethod
        // later relinks this site
        let mut guards = watch(0, a);
        guards.extend(watch(1, b));
        let target = Target::Metamethod {
            operand: 1,
            slot,
            kind,
            call: site.nested(),
        };
        return Ok((Guard::all(guards), target));
    }
    if op == BinaryOp::Eq {
        let mut guards = watch(0, a);
        guards.extend(watch(1, b));
        return Ok((Guard::all(guards), Target::RawEqual));
    }

    let diagnostic = match op {
        BinaryOp::Concat if concat_piece(a).is_some() => Diagnostic::concat(b),
        BinaryOp::Concat => Diagnostic::concat(a),
        BinaryOp::Lt | BinaryOp::Le => Diagnostic::compare(a, b),
        _ if a.tag().is_number() => Diagnostic::arithmetic(b),
        _ => Diagnostic::arithmetic(a),
    };
    Err(rt.error(diagnostic))
}

pub(super) fn resolve_unary(
    site: &CallSite,
    rt: &Runtime,
    op: UnaryOp,
    ops: &[Value],
) -> LResult<(Guard, Target)> {
    let a = &ops[0];
    let tag = Guard::Tag {
        index: 0,
        tag: a.tag(),
    };
    match (op, a) {
        (UnaryOp::Neg, Value::Int(_) | Value::Float(_)) => return Ok((tag, Target::Negate)),
        (UnaryOp::Len, Value::Str(_)) => return Ok((tag, Target::StrLen)),
        _ => {}
    }
    if let Some(slot) = metamethod(a, op.event()) {
        let target = Target::Metamethod {
            operand: 0,
            slot,
            kind: MetaCall::Unary,
            call: site.nested(),
        };
        return Ok((Guard::all(watch(0, a)), target));
    }
    match (op, a) {
        (UnaryOp::Len, Value::Table(_)) => Ok((Guard::all(watch(0, a)), Target::RawLen)),
        (UnaryOp::Len, _) => Err(rt.error(Diagnostic::length(a))),
        (UnaryOp::Neg, _) => Err(rt.error(Diagnostic::arithmetic(a))),
    }
}
