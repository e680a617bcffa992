//! Binding resolution types for HIR

use std::cell::Cell;
use std::rc::Rc;

/// Identity of a local variable within one function literal.
/// Unlike a name, this is unique per declaration: two `local x` in
/// different blocks get different LocalIds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

impl LocalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Build-phase record of a local.
///
/// Flags flip while the enclosing chunk is being resolved: a later
/// assignment, or a nested function referencing the local, may come
/// after the declaring function's own body has been walked. Once the
/// whole chunk is resolved the builder is frozen into a [`LocalInfo`].
#[derive(Debug)]
pub struct LocalBuilder {
    pub name: Rc<str>,
    pub depth: u32,
    mutated: Cell<bool>,
    captured: Cell<bool>,
}

impl LocalBuilder {
    pub fn new(name: Rc<str>, depth: u32) -> Self {
        LocalBuilder {
            name,
            depth,
            mutated: Cell::new(false),
            captured: Cell::new(false),
        }
    }

    /// Mark this local as written after its declaration
    pub fn mark_mutated(&self) {
        self.mutated.set(true);
    }

    /// Mark this local as closed over by a nested function
    pub fn mark_captured(&self) {
        self.captured.set(true);
    }

    pub fn is_captured(&self) -> bool {
        self.captured.get()
    }

    pub fn freeze(&self) -> LocalInfo {
        LocalInfo {
            name: self.name.clone(),
            depth: self.depth,
            mutated: self.mutated.get(),
            captured: self.captured.get(),
        }
    }
}

/// Information about a local, fixed for every specialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInfo {
    pub name: Rc<str>,
    /// Block nesting depth of the declaration within its function
    pub depth: u32,
    pub mutated: bool,
    pub captured: bool,
}

impl LocalInfo {
    /// Check if this local needs to be boxed in a cell.
    /// Captured and mutated locals share one cell with every closure
    /// over them; captured immutable locals are copied by value.
    pub fn needs_cell(&self) -> bool {
        self.captured && self.mutated
    }
}

/// How a capture is reached from the enclosing function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    /// The parent's local
    Local(LocalId),
    /// The parent's own capture (transitive capture)
    Capture(usize),
}

/// Information about a captured variable (upvalue) of a function literal
#[derive(Debug, Clone)]
pub struct CaptureInfo {
    pub name: Rc<str>,
    pub source: CaptureSource,
    /// Whether the captured variable lives in a shared cell
    pub boxed: bool,
}
