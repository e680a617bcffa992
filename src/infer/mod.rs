//! Type inference for one specialization
//!
//! The inference context is the single source of truth shared by the two
//! passes over a function's IR: [`infer`] walks the body to establish
//! every local's type and the return type, then `lower` asks the same
//! context for each node's type while it compiles.
//!
//! The walk is forward and single-pass: a read sees whatever type the
//! variable has been given so far, a write joins into it. Because
//! lowering compiles every read against one final type per variable, the
//! walk is repeated, seeded with the joined types, until no variable
//! widens further. Types only ever widen, so a variable whose definitions
//! disagree inside a loop ends at Unknown exactly as a single pass would
//! leave it; reconciliation never narrows anything.

mod expr;
mod returns;
mod stmt;

pub use returns::has_return;

use crate::hir::{FunctionProto, LocalId};
use crate::types::Type;
use std::rc::Rc;

pub struct InferenceContext {
    /// `None` until the first write in the current walk
    locals: Vec<Option<Type>>,
    boxed: Vec<bool>,
    captures: Box<[Type]>,
    varargs: Rc<[Type]>,
    returns: Option<Type>,
}

impl InferenceContext {
    fn new(proto: &FunctionProto, captures: &[Type], args: &[Type]) -> Self {
        let mut ctx = InferenceContext {
            locals: vec![None; proto.locals.len()],
            boxed: proto.locals.iter().map(|l| l.needs_cell()).collect(),
            captures: captures.into(),
            varargs: if proto.vararg && args.len() > proto.params.len() {
                args[proto.params.len()..].into()
            } else {
                Rc::from(Vec::new())
            },
            returns: None,
        };
        for (i, param) in proto.params.iter().enumerate() {
            ctx.write(*param, args.get(i).cloned().unwrap_or(Type::Nil));
        }
        ctx
    }

    /// Type of a local as seen by a read. Boxed locals can be rewritten by
    /// any closure sharing their cell, so they are always Unknown.
    pub fn local_type(&self, id: LocalId) -> Type {
        if self.boxed[id.index()] {
            return Type::Unknown;
        }
        self.locals[id.index()].clone().unwrap_or(Type::Unknown)
    }

    pub fn capture_type(&self, index: usize) -> Type {
        self.captures.get(index).cloned().unwrap_or(Type::Unknown)
    }

    /// Types of the extra arguments bound to `...`.
    pub fn varargs(&self) -> &[Type] {
        &self.varargs
    }

    /// The function's output type; Nil if no return was reached.
    pub fn returns(&self) -> Type {
        self.returns.clone().unwrap_or(Type::Nil)
    }

    pub fn local_types(&self) -> Vec<Type> {
        (0..self.locals.len())
            .map(|i| self.local_type(LocalId(i as u32)))
            .collect()
    }

    fn write(&mut self, id: LocalId, ty: Type) {
        let slot = &mut self.locals[id.index()];
        *slot = Some(match slot.take() {
            Some(existing) => existing.join(&ty),
            None => ty,
        });
    }

    fn record_return(&mut self, ty: Type) {
        self.returns = Some(match self.returns.take() {
            Some(existing) => existing.join(&ty),
            None => ty,
        });
    }
}

/// Infer local and return types of `proto` for one capture and argument
/// signature.
pub fn infer(proto: &FunctionProto, captures: &[Type], args: &[Type]) -> InferenceContext {
    let mut ctx = InferenceContext::new(proto, captures, args);
    loop {
        let before = ctx.locals.clone();
        ctx.returns = None;
        ctx.block(&proto.body);
        if ctx.locals == before {
            break;
        }
        tracing::trace!(function = %proto.name, "reconciling widened locals");
    }
    if !has_return(&proto.body) && ctx.returns.is_some() {
        ctx.record_return(Type::Nil);
    }
    ctx
}
