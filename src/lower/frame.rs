//! Activation frames of compiled routines

use crate::engine::Runtime;
use crate::error::{fault, EngineFault};
use crate::value::{Capture, LocalCell, Multi, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Where a local lives in its frame.
///
/// Locals inferred Integer, Float or Boolean get unboxed slots; boxed
/// locals (captured and mutated) get a shared cell; everything else is
/// a boxed value slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Int(usize),
    Float(usize),
    Bool(usize),
    Value(usize),
    Cell(usize),
}

/// Control outcome of a compiled statement.
pub enum Flow {
    Next,
    Break,
    Return(Multi),
}

pub struct Frame<'a> {
    pub rt: &'a Runtime,
    pub ints: Vec<i64>,
    pub floats: Vec<f64>,
    pub bools: Vec<bool>,
    pub values: Vec<Value>,
    pub cells: Vec<LocalCell>,
    pub captures: &'a [Capture],
    pub varargs: Rc<[Value]>,
}

impl<'a> Frame<'a> {
    pub(super) fn new(
        rt: &'a Runtime,
        counts: [usize; 5],
        captures: &'a [Capture],
        varargs: Rc<[Value]>,
    ) -> Self {
        let [ints, floats, bools, values, cells] = counts;
        // Every boxed local is declared before it is read, and each
        // declaration installs a fresh cell.
        let placeholder: LocalCell = Rc::new(RefCell::new(Value::Nil));
        Frame {
            rt,
            ints: vec![0; ints],
            floats: vec![0.0; floats],
            bools: vec![false; bools],
            values: vec![Value::Nil; values],
            cells: vec![placeholder; cells],
            captures,
            varargs,
        }
    }

    /// Read any slot as a boxed value.
    pub fn load(&self, slot: Slot) -> Value {
        match slot {
            Slot::Int(s) => Value::Int(self.ints[s]),
            Slot::Float(s) => Value::Float(self.floats[s]),
            Slot::Bool(s) => Value::Bool(self.bools[s]),
            Slot::Value(s) => self.values[s].clone(),
            Slot::Cell(s) => self.cells[s].borrow().clone(),
        }
    }

    /// Write a boxed value into an existing binding.
    pub fn store(&mut self, slot: Slot, value: Value) {
        match slot {
            Slot::Int(s) => self.ints[s] = unbox_int(value),
            Slot::Float(s) => self.floats[s] = unbox_float(value),
            Slot::Bool(s) => self.bools[s] = unbox_bool(value),
            Slot::Value(s) => self.values[s] = value,
            Slot::Cell(s) => *self.cells[s].borrow_mut() = value,
        }
    }

    /// Bind a new variable: boxed locals get a fresh cell, so closures
    /// made in earlier loop iterations keep their own.
    pub fn declare(&mut self, slot: Slot, value: Value) {
        match slot {
            Slot::Cell(s) => self.cells[s] = Rc::new(RefCell::new(value)),
            other => self.store(other, value),
        }
    }
}

pub(super) fn unbox_int(value: Value) -> i64 {
    match value {
        Value::Int(i) => i,
        other => fault(EngineFault::Unbox {
            expected: "integer",
            found: other.type_name(),
        }),
    }
}

/// Integers widen into float slots.
pub(super) fn unbox_float(value: Value) -> f64 {
    match value {
        Value::Float(f) => f,
        Value::Int(i) => i as f64,
        other => fault(EngineFault::Unbox {
            expected: "float",
            found: other.type_name(),
        }),
    }
}

pub(super) fn unbox_bool(value: Value) -> bool {
    match value {
        Value::Bool(b) => b,
        other => fault(EngineFault::Unbox {
            expected: "boolean",
            found: other.type_name(),
        }),
    }
}
