//! Call resolution

use super::guard::{watch, CalleeKey, Guard};
use super::operator::metamethod;
use super::site::{CallPurpose, CallSite};
use super::target::{MetaCall, Target};
use crate::engine::Runtime;
use crate::error::{Diagnostic, LResult};
use crate::ffi::{self, IntrinsicId};
use crate::types::{describe, Type};
use crate::value::{Callable, Value};

pub(super) fn resolve_call(
    site: &CallSite,
    rt: &Runtime,
    purpose: CallPurpose,
    intrinsic: Option<IntrinsicId>,
    ops: &[Value],
    megamorphic: bool,
) -> LResult<(Guard, Target)> {
    let callee = &ops[0];
    match callee {
        Value::Function(Callable::Closure(closure)) => {
            let types: Box<[Type]> = ops[1..].iter().map(Type::of).collect();
            let function_type = closure.function_type().clone();
            let spec = function_type.specialize(rt, &types);
            let guard = Guard::all([
                Guard::Callee {
                    index: 0,
                    callee: CalleeKey::Function(function_type),
                },
                Guard::ArgTypes { from: 1, types },
            ]);
            Ok((guard, Target::Closure(spec)))
        }
        Value::Function(Callable::Host(host)) => {
            let types: Box<[Type]> = ops[1..].iter().map(Type::of).collect();
            match ffi::select(host, &types, intrinsic, megamorphic) {
                Some(selection) => {
                    let guard = Guard::all([
                        Guard::Callee {
                            index: 0,
                            callee: CalleeKey::Host(host.clone()),
                        },
                        Guard::ArgTypes { from: 1, types },
                    ]);
                    Ok((guard, Target::Host(selection)))
                }
                None => Err(rt.error(Diagnostic::no_overload(
                    host.name().to_string(),
                    describe(&types),
                ))),
            }
        }
        Value::Table(_) => match metamethod(callee, "__call") {
            Some(slot) => {
                let target = Target::Metamethod {
                    operand: 0,
                    slot,
                    kind: MetaCall::Call,
                    call: site.nested(),
                };
                Ok((Guard::all(watch(0, callee)), target))
            }
            None => Err(rt.error(not_callable(purpose, callee))),
        },
        _ => Err(rt.error(not_callable(purpose, callee))),
    }
}

fn not_callable(purpose: CallPurpose, callee: &Value) -> Diagnostic {
    match purpose {
        CallPurpose::Call => Diagnostic::call(callee),
        CallPurpose::Iterate => Diagnostic::not_iterable(callee),
    }
}
