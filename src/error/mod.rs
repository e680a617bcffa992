//! Unified error system for wane
//!
//! Three kinds of failure exist and they never mix:
//! - [`ScriptError`]: language-level errors, propagated with `?`
//! - [`crate::hir::ResolveError`]: a chunk that cannot be resolved
//! - [`EngineFault`]: broken invariants, raised through [`fault`]
//!
//! Guard misses are not errors at all; they drive relinking.

mod builders;
mod fault;
mod types;

use crate::value::Value;
use std::rc::Rc;

pub use builders::default_formatter;
pub use fault::fault;
pub use types::{Diagnostic, EngineFault, Error, LResult, ScriptError};

/// Caller-supplied rendering of diagnostics into error payloads.
pub type ErrorFormatter = Rc<dyn Fn(&Diagnostic) -> Value>;
