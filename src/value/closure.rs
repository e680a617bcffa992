//! Closure type for the wane runtime
//!
//! A closure pairs a function type (function literal plus capture types,
//! which owns the specialization cache) with this instance's captured
//! values.

use super::Value;
use crate::specialize::FunctionType;
use crate::types::Type;
use std::cell::RefCell;
use std::rc::Rc;

/// Boxed storage for a variable that is both captured and mutated.
pub type LocalCell = Rc<RefCell<Value>>;

/// One captured variable (upvalue) of a closure.
#[derive(Clone)]
pub enum Capture {
    /// Immutable capture, copied when the closure was created.
    Value(Value),
    /// Shared cell, observed by every closure over the same variable.
    Cell(LocalCell),
}

impl Capture {
    pub fn get(&self) -> Value {
        match self {
            Capture::Value(v) => v.clone(),
            Capture::Cell(cell) => cell.borrow().clone(),
        }
    }

    /// Type this capture contributes to the function type. Cells can be
    /// rewritten at any time, so they are always Unknown.
    pub fn static_type(&self) -> Type {
        match self {
            Capture::Value(v) => Type::of(v),
            Capture::Cell(_) => Type::Unknown,
        }
    }
}

/// Closure with captured environment
pub struct Closure {
    function_type: FunctionType,
    captures: Box<[Capture]>,
}

impl Closure {
    pub fn new(function_type: FunctionType, captures: Box<[Capture]>) -> Self {
        Closure {
            function_type,
            captures,
        }
    }

    pub fn function_type(&self) -> &FunctionType {
        &self.function_type
    }

    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }
}
