//! Host functions and overload resolution
//!
//! A host function is a name plus an ordered list of overloads, each a
//! Rust closure with declared parameter types. Calls to a host function
//! go through the call-site linker, which asks [`select`] for the
//! overload matching the runtime argument types and caches the answer
//! behind a callee + argument-type guard.
//!
//! Resolution order:
//! - overloads sorted by descending declared parameter count, stable;
//! - an overload tagged with an [`IntrinsicId`] is only visible to sites
//!   that request that intrinsic;
//! - the fallback, if any, is tried last, or first on a megamorphic site.

mod function;
mod matcher;

pub use function::{
    DeclaredType, HostFn, HostFunction, HostFunctionBuilder, Overload, Param, RegistrationError,
    Returns,
};
pub use matcher::{match_candidate, select, Choice, Mismatch, Selection};

/// Privileged call-site kinds that may see hidden overloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicId {
    /// The iterator-producing call of a generic `for`.
    Iteration,
}
