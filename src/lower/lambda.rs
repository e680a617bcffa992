//! Closure creation

use super::code::Eval;
use super::frame::Slot;
use super::Lowerer;
use crate::hir::CaptureSource;
use crate::specialize::FunctionType;
use crate::types::Type;
use crate::value::{Callable, Capture, Closure, Value};
use std::rc::Rc;

/// Where a new closure reads one capture from.
#[derive(Clone, Copy)]
enum Source {
    /// Share the enclosing function's cell
    Cell(usize),
    /// Copy a local's current value
    Copy(Slot),
    /// Pass through one of the enclosing function's own captures
    Outer(usize),
}

impl Lowerer<'_> {
    /// Compile creation of the `index`th child function literal.
    ///
    /// The closure's function type is interned from the static types of
    /// the captured values, so closures over same-typed values share one
    /// specialization cache.
    pub(super) fn closure(&self, index: usize) -> Eval<Value> {
        let proto = self.proto.children[index].clone();
        let sources: Box<[Source]> = proto
            .captures
            .iter()
            .map(|capture| match capture.source {
                CaptureSource::Local(id) => match self.layout.slot(id) {
                    Slot::Cell(s) => Source::Cell(s),
                    slot => Source::Copy(slot),
                },
                CaptureSource::Capture(outer) => Source::Outer(outer),
            })
            .collect();

        Box::new(move |f| {
            let captures: Box<[Capture]> = sources
                .iter()
                .map(|source| match *source {
                    Source::Cell(s) => Capture::Cell(f.cells[s].clone()),
                    Source::Copy(slot) => Capture::Value(f.load(slot)),
                    Source::Outer(outer) => f.captures[outer].clone(),
                })
                .collect();
            let types: Box<[Type]> = captures.iter().map(Capture::static_type).collect();
            let function_type = FunctionType::intern(&proto, types);
            Ok(Value::Function(Callable::Closure(Rc::new(Closure::new(
                function_type,
                captures,
            )))))
        })
    }
}
