//! Guards protecting cached targets

use crate::ffi::HostFunction;
use crate::specialize::FunctionType;
use crate::types::{Tag, Type};
use crate::value::{Callable, Shape, TableKey, Value};
use std::rc::Rc;

/// Callee identity as far as code shape is concerned.
///
/// Closures of one function literal over same-typed captures share a
/// function type and therefore a specialization, so they match the same
/// key. Host functions match by pointer.
#[derive(Clone, Debug)]
pub enum CalleeKey {
    Function(FunctionType),
    Host(Rc<HostFunction>),
}

impl CalleeKey {
    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (CalleeKey::Function(ft), Value::Function(Callable::Closure(c))) => {
                c.function_type() == ft
            }
            (CalleeKey::Host(h), Value::Function(Callable::Host(g))) => Rc::ptr_eq(h, g),
            _ => false,
        }
    }
}

/// A condition over the operands of one invocation.
#[derive(Clone, Debug)]
pub enum Guard {
    /// Operand has this type tag
    Tag { index: usize, tag: Tag },
    /// Operand is this callee
    Callee { index: usize, callee: CalleeKey },
    /// Operands from `from` on have exactly these types
    ArgTypes { from: usize, types: Box<[Type]> },
    /// Operand is a table with this shape
    Shape { index: usize, shape: Shape },
    /// Operand is a table whose metatable has this shape, or none at all
    MetaShape { index: usize, shape: Option<Shape> },
    /// Operand is this key; `None` for values that cannot be keys
    Key {
        index: usize,
        key: Option<TableKey>,
    },
    All(Box<[Guard]>),
}

impl Guard {
    pub fn all(guards: impl IntoIterator<Item = Guard>) -> Guard {
        Guard::All(guards.into_iter().collect())
    }

    pub fn holds(&self, ops: &[Value]) -> bool {
        match self {
            Guard::Tag { index, tag } => ops[*index].tag() == *tag,
            Guard::Callee { index, callee } => callee.matches(&ops[*index]),
            Guard::ArgTypes { from, types } => {
                let args = ops.get(*from..).unwrap_or_default();
                args.len() == types.len() && args.iter().zip(types.iter()).all(|(v, t)| matches_type(v, t))
            }
            Guard::Shape { index, shape } => match &ops[*index] {
                Value::Table(t) => t.borrow().shape() == *shape,
                _ => false,
            },
            Guard::MetaShape { index, shape } => match &ops[*index] {
                Value::Table(t) => t.borrow().metatable().map(|mt| mt.borrow().shape()) == *shape,
                _ => false,
            },
            Guard::Key { index, key } => TableKey::new(&ops[*index]) == *key,
            Guard::All(guards) => guards.iter().all(|g| g.holds(ops)),
        }
    }
}

/// `Type::of(value) == *ty` without building the type.
fn matches_type(value: &Value, ty: &Type) -> bool {
    match (value, ty) {
        (Value::Function(Callable::Closure(c)), Type::Function(Some(ft))) => c.function_type() == ft,
        (Value::Function(Callable::Host(_)), Type::Function(None)) => true,
        (Value::Function(_), _) => false,
        _ => ty.tag() == Some(value.tag()),
    }
}

/// Guards watching a value's identity-relevant layout: tag for plain
/// values, shape and metatable shape for tables.
pub(super) fn watch(index: usize, value: &Value) -> Vec<Guard> {
    match value {
        Value::Table(t) => {
            let t = t.borrow();
            vec![
                Guard::Shape {
                    index,
                    shape: t.shape(),
                },
                Guard::MetaShape {
                    index,
                    shape: t.metatable().map(|mt| mt.borrow().shape()),
                },
            ]
        }
        other => vec![Guard::Tag {
            index,
            tag: other.tag(),
        }],
    }
}
