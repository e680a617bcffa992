//! Compiled expression code in its value representation

use super::frame::{unbox_bool, unbox_float, unbox_int, Flow, Frame};
use crate::error::{fault, EngineFault, LResult};
use crate::types::Type;
use crate::value::Value;

/// A compiled fragment producing a `T`.
pub type Eval<T> = Box<dyn Fn(&mut Frame<'_>) -> LResult<T>>;

/// A compiled statement.
pub type Exec = Eval<Flow>;

/// Value representation chosen from a static type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repr {
    Int,
    Float,
    Bool,
    Value,
}

impl Repr {
    pub fn of(ty: &Type) -> Repr {
        match ty {
            Type::Integer => Repr::Int,
            Type::Float => Repr::Float,
            Type::Boolean => Repr::Bool,
            _ => Repr::Value,
        }
    }
}

/// Compiled expression, tagged with the representation it produces.
pub enum Code {
    Int(Eval<i64>),
    Float(Eval<f64>),
    Bool(Eval<bool>),
    Value(Eval<Value>),
}

impl Code {
    pub fn repr(&self) -> Repr {
        match self {
            Code::Int(_) => Repr::Int,
            Code::Float(_) => Repr::Float,
            Code::Bool(_) => Repr::Bool,
            Code::Value(_) => Repr::Value,
        }
    }

    pub fn boxed(self) -> Eval<Value> {
        match self {
            Code::Int(e) => Box::new(move |f| Ok(Value::Int(e(f)?))),
            Code::Float(e) => Box::new(move |f| Ok(Value::Float(e(f)?))),
            Code::Bool(e) => Box::new(move |f| Ok(Value::Bool(e(f)?))),
            Code::Value(e) => e,
        }
    }

    pub fn int(self) -> Eval<i64> {
        match self {
            Code::Int(e) => e,
            Code::Value(e) => Box::new(move |f| Ok(unbox_int(e(f)?))),
            other => disagree("integer", other.repr()),
        }
    }

    /// Integers widen.
    pub fn float(self) -> Eval<f64> {
        match self {
            Code::Float(e) => e,
            Code::Int(e) => Box::new(move |f| Ok(e(f)? as f64)),
            Code::Value(e) => Box::new(move |f| Ok(unbox_float(e(f)?))),
            other => disagree("float", other.repr()),
        }
    }

    pub fn bool(self) -> Eval<bool> {
        match self {
            Code::Bool(e) => e,
            Code::Value(e) => Box::new(move |f| Ok(unbox_bool(e(f)?))),
            other => disagree("boolean", other.repr()),
        }
    }

    /// Truthiness, for conditions.
    pub fn truth(self) -> Eval<bool> {
        match self {
            Code::Bool(e) => e,
            Code::Int(e) => Box::new(move |f| e(f).map(|_| true)),
            Code::Float(e) => Box::new(move |f| e(f).map(|_| true)),
            Code::Value(e) => Box::new(move |f| Ok(e(f)?.truthy())),
        }
    }

    /// Convert to the representation of `ty`, unboxing with a checked
    /// conversion when the code produces boxed values.
    pub fn conform(self, ty: &Type) -> Code {
        let want = Repr::of(ty);
        if self.repr() == want {
            return self;
        }
        match want {
            Repr::Int => Code::Int(self.int()),
            Repr::Float => Code::Float(self.float()),
            Repr::Bool => Code::Bool(self.bool()),
            Repr::Value => Code::Value(self.boxed()),
        }
    }
}

fn disagree(expected: &str, found: Repr) -> ! {
    fault(EngineFault::TypeDisagreement {
        expected: expected.to_string(),
        found: format!("{:?}", found),
    })
}
