//! High-level IR
//!
//! Scope resolution turns a parse tree into one [`FunctionProto`] per
//! function literal: identifiers are resolved to locals, captures or
//! global field accesses, and every dynamic call, operator and field
//! access gets its own unlinked [`crate::link::CallSite`].

mod analyze;
mod binding;
mod expr;

pub use analyze::analyze;
pub use binding::{CaptureInfo, CaptureSource, LocalBuilder, LocalId, LocalInfo};
pub use expr::{BinaryOp, Block, Expr, Place, Stmt, TableItem, UnaryOp};

use crate::link::CallSite;
use crate::specialize::FunctionTypeTable;
use std::rc::Rc;
use thiserror::Error;

/// A chunk that cannot be turned into IR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("'break' outside a loop in function '{function}'")]
    BreakOutsideLoop { function: String },
    #[error("cannot use '...' outside a vararg function ('{function}')")]
    VarargOutsideVarargFunction { function: String },
    #[error("cannot assign to a {what}")]
    InvalidAssignTarget { what: &'static str },
}

/// A resolved function literal, shared by every closure created from it.
pub struct FunctionProto {
    pub name: Rc<str>,
    pub params: Box<[LocalId]>,
    pub vararg: bool,
    /// Indexed by [`LocalId`]
    pub locals: Box<[LocalInfo]>,
    pub captures: Box<[CaptureInfo]>,
    pub body: Block,
    /// Nested literals, indexed by `Expr::Function` and `Stmt::LocalFunction`
    pub children: Box<[Rc<FunctionProto>]>,
    /// Call sites created for this literal's own body
    pub sites: Box<[Rc<CallSite>]>,
    pub(crate) function_types: FunctionTypeTable,
}

impl FunctionProto {
    pub fn local(&self, id: LocalId) -> &LocalInfo {
        &self.locals[id.index()]
    }

    /// Locals declared with `name`, in declaration order.
    pub fn locals_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = LocalId> + 'a {
        self.locals
            .iter()
            .enumerate()
            .filter(move |(_, info)| &*info.name == name)
            .map(|(i, _)| LocalId(i as u32))
    }

    /// Sites whose label is `label`, in creation order.
    pub fn sites_labeled<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Rc<CallSite>> + 'a {
        self.sites.iter().filter(move |s| &**s.label() == label)
    }

    /// The nested literal named `name`, searching depth first.
    pub fn find_child(&self, name: &str) -> Option<&Rc<FunctionProto>> {
        self.children.iter().find_map(|c| {
            if &*c.name == name {
                Some(c)
            } else {
                c.find_child(name)
            }
        })
    }
}

impl std::fmt::Debug for FunctionProto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionProto")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .field("vararg", &self.vararg)
            .field("locals", &self.locals)
            .field("captures", &self.captures)
            .field("children", &self.children.len())
            .field("sites", &self.sites.len())
            .finish()
    }
}
