//! Lowering of IR to native routines
//!
//! A routine is a tree of compiled closures built once per
//! specialization. Lowering walks the IR under the inference context
//! produced for that specialization and picks, node by node:
//!
//! - unboxed integer, float and boolean code where the operand types are
//!   known, with no call site involved;
//! - boxed values plus a call to the node's linker site where they are not.
//!
//! Every node's code is conformed to the type the context reports for it,
//! so the two passes cannot silently disagree.

mod code;
mod expr;
mod frame;
mod lambda;
mod stmt;

pub use code::{Code, Eval, Exec, Repr};
pub use frame::{Flow, Frame, Slot};

use crate::engine::Runtime;
use crate::error::{fault, EngineFault, LResult};
use crate::hir::{FunctionProto, LocalId};
use crate::infer::InferenceContext;
use crate::types::Type;
use crate::value::{Capture, Multi, Value};
use std::rc::Rc;

/// Frame layout of one specialization.
pub struct Layout {
    slots: Box<[Slot]>,
    counts: [usize; 5],
}

impl Layout {
    fn new(proto: &FunctionProto, ctx: &InferenceContext) -> Self {
        let mut counts = [0usize; 5];
        let mut next = |kind: usize| {
            counts[kind] += 1;
            counts[kind] - 1
        };
        let slots = proto
            .locals
            .iter()
            .enumerate()
            .map(|(i, info)| {
                if info.needs_cell() {
                    return Slot::Cell(next(4));
                }
                match ctx.local_type(LocalId(i as u32)) {
                    Type::Integer => Slot::Int(next(0)),
                    Type::Float => Slot::Float(next(1)),
                    Type::Boolean => Slot::Bool(next(2)),
                    _ => Slot::Value(next(3)),
                }
            })
            .collect();
        Layout { slots, counts }
    }

    pub fn slot(&self, id: LocalId) -> Slot {
        self.slots[id.index()]
    }
}

/// The native routine of one specialization.
pub struct Routine {
    layout: Layout,
    params: Box<[Slot]>,
    vararg: bool,
    body: Exec,
}

impl Routine {
    pub fn run(&self, rt: &Runtime, captures: &[Capture], args: &[Value]) -> LResult<Multi> {
        let declared = self.params.len();
        let varargs: Rc<[Value]> = if self.vararg && args.len() > declared {
            args[declared..].into()
        } else {
            Rc::from(Vec::new())
        };
        let mut frame = Frame::new(rt, self.layout.counts, captures, varargs);
        for (i, slot) in self.params.iter().enumerate() {
            frame.declare(*slot, args.get(i).cloned().unwrap_or(Value::Nil));
        }
        match (self.body)(&mut frame)? {
            Flow::Return(values) => Ok(values),
            Flow::Next => Ok(Multi::empty()),
            Flow::Break => fault(EngineFault::ImpossibleTransition("break escaped a routine")),
        }
    }
}

/// Compiles one function under an inference context.
struct Lowerer<'c> {
    proto: &'c Rc<FunctionProto>,
    ctx: &'c InferenceContext,
    layout: &'c Layout,
}

/// Compile `proto` into a routine using the types in `ctx`.
pub fn lower(proto: &Rc<FunctionProto>, ctx: &InferenceContext) -> Routine {
    let layout = Layout::new(proto, ctx);
    let body = Lowerer {
        proto,
        ctx,
        layout: &layout,
    }
    .block(&proto.body);
    let params = proto.params.iter().map(|p| layout.slot(*p)).collect();
    Routine {
        layout,
        params,
        vararg: proto.vararg,
        body,
    }
}
