//! Builder methods for constructing Diagnostic and ScriptError instances

use super::types::{Diagnostic, ScriptError};
use crate::value::Value;

impl ScriptError {
    /// A script-raised error; the payload is kept exactly as given.
    pub fn raise(payload: Value) -> Self {
        ScriptError { payload }
    }

    /// A plain message payload, for host functions.
    pub fn message(message: impl AsRef<str>) -> Self {
        ScriptError {
            payload: Value::from(message.as_ref()),
        }
    }
}

impl Diagnostic {
    pub fn arithmetic(operand: &Value) -> Self {
        Diagnostic::Arithmetic {
            operand: operand.type_name(),
        }
    }

    pub fn concat(operand: &Value) -> Self {
        Diagnostic::Concat {
            operand: operand.type_name(),
        }
    }

    pub fn compare(lhs: &Value, rhs: &Value) -> Self {
        Diagnostic::Compare {
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }
    }

    pub fn length(operand: &Value) -> Self {
        Diagnostic::Length {
            operand: operand.type_name(),
        }
    }

    pub fn call(callee: &Value) -> Self {
        Diagnostic::Call {
            callee: callee.type_name(),
        }
    }

    pub fn index(operand: &Value, key: &Value) -> Self {
        let key = match key {
            Value::Str(s) => Some(s.to_string()),
            _ => None,
        };
        Diagnostic::Index {
            operand: operand.type_name(),
            key,
        }
    }

    pub fn not_iterable(operand: &Value) -> Self {
        Diagnostic::NotIterable {
            operand: operand.type_name(),
        }
    }

    pub fn no_overload(function: impl Into<String>, arguments: impl Into<String>) -> Self {
        Diagnostic::NoOverload {
            function: function.into(),
            arguments: arguments.into(),
        }
    }

    /// The diagnostic for a key that can never be stored in a table.
    pub fn invalid_key(key: &Value) -> Option<Self> {
        match key {
            Value::Nil => Some(Diagnostic::InvalidKey { reason: "nil" }),
            Value::Float(f) if f.is_nan() => Some(Diagnostic::InvalidKey { reason: "NaN" }),
            _ => None,
        }
    }
}

/// Default rendering of a diagnostic: its Lua-style message as a string.
pub fn default_formatter(diagnostic: &Diagnostic) -> Value {
    Value::from(diagnostic.to_string().as_str())
}
