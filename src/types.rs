//! Static type lattice
//!
//! Every expression the compiler sees is classified into one of these
//! types for a given specialization. `Unknown` is the top of the lattice:
//! the compiler falls back to boxed values and linker sites wherever it
//! appears.
//!
//! ```text
//!            Unknown
//!   /   /   /   |    \     \        \
//! Nil Bool Int->Float String Table Function(None)
//!                                     |
//!                              Function(Some(ft))
//! ```
//!
//! Integer is never silently merged into Float at an assignment site.
//! `join` reports Float for a variable written with both, and the write
//! of the Integer value must record a widening conversion (see
//! [`Type::widens_to`]).

use crate::specialize::FunctionType;
use crate::value::{Multi, Value};
use std::fmt;
use std::rc::Rc;

/// Static type of a value or multi-value result.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    Table,
    /// A callable. `Some` pins one function literal under one set of
    /// capture types and owns its specialization cache.
    Function(Option<FunctionType>),
    /// Compile-time "don't know yet".
    Unknown,
    /// Multiple values, e.g. `...` or the results of a `return a, b`.
    Tuple(Rc<[Type]>),
}

/// Runtime representation tag of a single value.
///
/// Guards compare tags rather than full types when only the primitive
/// representation matters (operator fast paths).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    Table,
    Function,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Nil => "nil",
            Tag::Boolean => "boolean",
            Tag::Integer | Tag::Float => "number",
            Tag::String => "string",
            Tag::Table => "table",
            Tag::Function => "function",
        }
    }

    pub fn is_number(self) -> bool {
        matches!(self, Tag::Integer | Tag::Float)
    }
}

impl Type {
    pub fn tuple(types: impl IntoIterator<Item = Type>) -> Type {
        Type::Tuple(types.into_iter().collect())
    }

    /// Classify a runtime value. Never touches the value itself.
    pub fn of(value: &Value) -> Type {
        match value {
            Value::Nil => Type::Nil,
            Value::Bool(_) => Type::Boolean,
            Value::Int(_) => Type::Integer,
            Value::Float(_) => Type::Float,
            Value::Str(_) => Type::String,
            Value::Table(_) => Type::Table,
            Value::Function(callable) => Type::Function(callable.function_type()),
        }
    }

    /// Classify a multi-value result: a single value keeps its own type,
    /// several values become a tuple.
    pub fn of_multi(values: &Multi) -> Type {
        match values {
            Multi::One(v) => Type::of(v),
            Multi::Many(vs) => Type::tuple(vs.iter().map(Type::of)),
        }
    }

    /// The representation tag, if this type pins exactly one.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Type::Nil => Some(Tag::Nil),
            Type::Boolean => Some(Tag::Boolean),
            Type::Integer => Some(Tag::Integer),
            Type::Float => Some(Tag::Float),
            Type::String => Some(Tag::String),
            Type::Table => Some(Tag::Table),
            Type::Function(_) => Some(Tag::Function),
            Type::Unknown | Type::Tuple(_) => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    /// Whether a value of type `source` may be stored at a site of type
    /// `self` without any conversion.
    pub fn is_assignable_from(&self, source: &Type) -> bool {
        match (self, source) {
            (Type::Unknown, _) | (_, Type::Unknown) => true,
            (Type::Function(None), Type::Function(_)) => true,
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.is_assignable_from(y))
            }
            (a, b) => a == b,
        }
    }

    /// Whether writing a `self` value into a `target` site needs the
    /// explicit Integer to Float widening.
    pub fn widens_to(&self, target: &Type) -> bool {
        matches!((self, target), (Type::Integer, Type::Float))
    }

    /// Merge two types observed for the same variable or result.
    pub fn join(&self, other: &Type) -> Type {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (Type::Integer, Type::Float) | (Type::Float, Type::Integer) => Type::Float,
            (Type::Function(_), Type::Function(_)) => Type::Function(None),
            (Type::Tuple(a), Type::Tuple(b)) if a.len() == b.len() => {
                Type::tuple(a.iter().zip(b.iter()).map(|(x, y)| x.join(y)))
            }
            _ => Type::Unknown,
        }
    }

    /// The type of the first value of a possibly multi-valued result, as
    /// seen by an expression that truncates to one value.
    pub fn first(&self) -> Type {
        match self {
            Type::Tuple(items) => items.first().cloned().unwrap_or(Type::Nil),
            other => other.clone(),
        }
    }

    /// The type of the `index`th value of a result, padding with Nil.
    pub fn nth(&self, index: usize) -> Type {
        match self {
            Type::Tuple(items) => items.get(index).cloned().unwrap_or(Type::Nil),
            Type::Unknown => Type::Unknown,
            other if index == 0 => other.clone(),
            _ => Type::Nil,
        }
    }

    /// Number of values this type statically produces, if known.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Type::Tuple(items) => Some(items.len()),
            Type::Unknown => None,
            _ => Some(1),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Nil => write!(f, "nil"),
            Type::Boolean => write!(f, "boolean"),
            Type::Integer => write!(f, "integer"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Table => write!(f, "table"),
            Type::Function(None) => write!(f, "function"),
            Type::Function(Some(ft)) => write!(f, "function<{}>", ft.name()),
            Type::Unknown => write!(f, "?"),
            Type::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Render an argument-type tuple for diagnostics.
pub fn describe(types: &[Type]) -> String {
    let parts: Vec<String> = types.iter().map(|t| t.to_string()).collect();
    format!("({})", parts.join(", "))
}
