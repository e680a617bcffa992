//! Runtime values
//!
//! The value runtime the compiler and linker build on: boxed values,
//! tables with shape tokens, closures with their captures, and the
//! single-or-many union used for multi-value results.

mod closure;
mod display;
mod table;

pub use closure::{Capture, Closure, LocalCell};
pub use display::format_float;
pub use table::{float_to_int, Shape, Table, TableKey, TableRef};

use crate::ffi::HostFunction;
use crate::specialize::FunctionType;
use crate::types::Tag;
use std::rc::Rc;

/// A boxed runtime value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Table(TableRef),
    Function(Callable),
}

/// Something a call site can invoke.
#[derive(Clone)]
pub enum Callable {
    Closure(Rc<Closure>),
    Host(Rc<HostFunction>),
}

impl Callable {
    /// The function type of a script closure; host functions have none.
    pub fn function_type(&self) -> Option<FunctionType> {
        match self {
            Callable::Closure(c) => Some(c.function_type().clone()),
            Callable::Host(_) => None,
        }
    }

    pub fn name(&self) -> Rc<str> {
        match self {
            Callable::Closure(c) => c.function_type().name(),
            Callable::Host(h) => h.name().clone(),
        }
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        self.addr() == other.addr()
    }

    pub(crate) fn addr(&self) -> usize {
        match self {
            Callable::Closure(c) => Rc::as_ptr(c) as *const () as usize,
            Callable::Host(h) => Rc::as_ptr(h) as *const () as usize,
        }
    }
}

impl Value {
    pub fn table(table: Table) -> Value {
        Value::Table(Rc::new(std::cell::RefCell::new(table)))
    }

    pub fn host(function: HostFunction) -> Value {
        Value::Function(Callable::Host(Rc::new(function)))
    }

    pub fn tag(&self) -> Tag {
        match self {
            Value::Nil => Tag::Nil,
            Value::Bool(_) => Tag::Boolean,
            Value::Int(_) => Tag::Integer,
            Value::Float(_) => Tag::Float,
            Value::Str(_) => Tag::String,
            Value::Table(_) => Tag::Table,
            Value::Function(_) => Tag::Function,
        }
    }

    /// Lua-facing type name, as returned by `type()`.
    pub fn type_name(&self) -> &'static str {
        self.tag().name()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Everything except nil and false is true.
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Primitive equality: numbers by value across Integer and Float,
    /// strings by content, tables and functions by identity.
    pub fn raw_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b && float_to_int(*b) == Some(*a)
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Metatable of a table value.
    pub fn metatable(&self) -> Option<TableRef> {
        self.as_table().and_then(|t| t.borrow().metatable())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<TableRef> for Value {
    fn from(t: TableRef) -> Self {
        Value::Table(t)
    }
}

/// One or many values: the runtime side of a `Type::Tuple`.
///
/// `Many` never holds exactly one value.
#[derive(Clone)]
pub enum Multi {
    One(Value),
    Many(Rc<[Value]>),
}

impl Multi {
    pub fn empty() -> Multi {
        Multi::Many(Rc::from(Vec::new()))
    }

    pub fn from_vec(mut values: Vec<Value>) -> Multi {
        if values.len() == 1 {
            Multi::One(values.pop().unwrap_or(Value::Nil))
        } else {
            Multi::Many(values.into())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Multi::One(_) => 1,
            Multi::Many(vs) => vs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first value, nil if there is none.
    pub fn first(&self) -> Value {
        self.get(0)
    }

    pub fn get(&self, index: usize) -> Value {
        match self {
            Multi::One(v) if index == 0 => v.clone(),
            Multi::One(_) => Value::Nil,
            Multi::Many(vs) => vs.get(index).cloned().unwrap_or(Value::Nil),
        }
    }

    pub fn into_first(self) -> Value {
        match self {
            Multi::One(v) => v,
            Multi::Many(vs) => vs.first().cloned().unwrap_or(Value::Nil),
        }
    }

    /// Append every value to `out`.
    pub fn extend_into<E: Extend<Value>>(&self, out: &mut E) {
        match self {
            Multi::One(v) => out.extend(std::iter::once(v.clone())),
            Multi::Many(vs) => out.extend(vs.iter().cloned()),
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.len());
        self.extend_into(&mut out);
        out
    }

    /// Pad or truncate to exactly `n` values.
    pub fn adjust(self, n: usize) -> Multi {
        if self.len() == n {
            return self;
        }
        let mut values = self.to_vec();
        values.resize(n, Value::Nil);
        Multi::from_vec(values)
    }
}

impl From<Value> for Multi {
    fn from(v: Value) -> Self {
        Multi::One(v)
    }
}
