//! Error type definitions for wane

use crate::ffi::RegistrationError;
use crate::hir::ResolveError;
use crate::value::Value;
use std::fmt;
use thiserror::Error;

/// A language-level error raised while a script runs.
///
/// The payload is whatever the script raised, or the value the runtime's
/// error formatter produced for an engine-detected [`Diagnostic`]. It is
/// carried across every routine boundary untouched.
#[derive(Debug, Clone, Error)]
#[error("{payload}")]
pub struct ScriptError {
    pub payload: Value,
}

/// Result type for anything that runs script code.
pub type LResult<T> = Result<T, ScriptError>;

/// Error surfaced by [`crate::engine::Engine::run`]: the chunk either
/// failed scope resolution or raised while running.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("{0}")]
    Script(#[from] ScriptError),
}

/// What went wrong at a call, operator, field or loop site.
///
/// The runtime turns these into [`ScriptError`] payloads through its
/// error formatter, so embedders can substitute their own messages or
/// structured payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Arithmetic or unary minus on a non-number without a metamethod.
    Arithmetic { operand: &'static str },
    /// `..` on something that is neither a string nor a number.
    Concat { operand: &'static str },
    /// `<` or `<=` between incomparable values.
    Compare {
        lhs: &'static str,
        rhs: &'static str,
    },
    /// `#` on a value without a length.
    Length { operand: &'static str },
    /// Calling a value that is not callable.
    Call { callee: &'static str },
    /// Indexing a value that is not a table.
    Index {
        operand: &'static str,
        key: Option<String>,
    },
    /// A table key that can never be stored.
    InvalidKey { reason: &'static str },
    /// No host overload accepts the argument types.
    NoOverload { function: String, arguments: String },
    /// The value produced for a generic `for` cannot be iterated.
    NotIterable { operand: &'static str },
    /// A numeric `for` bound is not a number.
    ForLoop { what: &'static str },
    /// A numeric `for` with a zero step.
    ForStep,
    /// Integer `//` or `%` by zero.
    DivideByZero { op: &'static str },
    /// Script calls nested deeper than `EngineConfig::max_call_depth`.
    StackOverflow { depth: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Arithmetic { operand } => {
                write!(f, "attempt to perform arithmetic on a {} value", operand)
            }
            Diagnostic::Concat { operand } => {
                write!(f, "attempt to concatenate a {} value", operand)
            }
            Diagnostic::Compare { lhs, rhs } if lhs == rhs => {
                write!(f, "attempt to compare two {} values", lhs)
            }
            Diagnostic::Compare { lhs, rhs } => {
                write!(f, "attempt to compare {} with {}", lhs, rhs)
            }
            Diagnostic::Length { operand } => {
                write!(f, "attempt to get length of a {} value", operand)
            }
            Diagnostic::Call { callee } => write!(f, "attempt to call a {} value", callee),
            Diagnostic::Index { operand, key } => {
                write!(f, "attempt to index a {} value", operand)?;
                if let Some(key) = key {
                    write!(f, " (field '{}')", key)?;
                }
                Ok(())
            }
            Diagnostic::InvalidKey { reason } => write!(f, "table index is {}", reason),
            Diagnostic::NoOverload {
                function,
                arguments,
            } => write!(f, "no overload of '{}' accepts {}", function, arguments),
            Diagnostic::NotIterable { operand } => {
                write!(f, "attempt to iterate over a {} value", operand)
            }
            Diagnostic::ForLoop { what } => write!(f, "'for' {} must be a number", what),
            Diagnostic::ForStep => write!(f, "'for' step is zero"),
            Diagnostic::DivideByZero { op } => write!(f, "attempt to perform 'n{}0'", op),
            Diagnostic::StackOverflow { depth } => {
                write!(f, "stack overflow ({} nested calls)", depth)
            }
        }
    }
}

/// Violations of the compiler's or linker's own invariants.
///
/// These are bugs in wane, never in the script, and they are never
/// caught: see [`super::fault`].
#[derive(Debug, Clone, Error)]
pub enum EngineFault {
    #[error("lowering disagrees with inference: expected {expected}, found {found}")]
    TypeDisagreement { expected: String, found: String },
    #[error("unboxing a {found} value into a {expected} slot")]
    Unbox {
        expected: &'static str,
        found: &'static str,
    },
    #[error("call site reached an impossible transition: {0}")]
    ImpossibleTransition(&'static str),
    #[error("guard held but target could not run: {0}")]
    StaleTarget(&'static str),
    #[error("built-in registration failed: {0}")]
    Registration(#[from] RegistrationError),
}
