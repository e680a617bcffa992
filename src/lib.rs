//! # wane - a type-specializing compiler for a Lua-like language
//!
//! wane compiles Lua-style function literals into trees of native Rust
//! closures, one per observed argument-type signature, and defers the
//! meaning of every dynamic call, operator and field access to
//! self-patching call sites.
//!
//! ## Quick Start
//!
//! ```
//! use wane::engine::Engine;
//! use wane::config::EngineConfig;
//! use wane::syntax::build::*;
//! use wane::value::Value;
//!
//! let engine = Engine::new(EngineConfig::default());
//! let chunk = chunk(vec![
//!     local(&["x"], vec![int(40)]),
//!     ret(vec![add(name("x"), int(2))]),
//! ]);
//! let result = engine.run(&chunk).unwrap();
//! assert!(result.first().raw_equal(&Value::Int(42)));
//! ```
//!
//! ## Architecture
//!
//! 1. **syntax** - parse-tree shapes handed over by a front end
//! 2. **hir** - scope resolution into an IR with resolved locals, captures
//!    and one call site per dynamic operation
//! 3. **infer** - per-signature type inference over the IR
//! 4. **lower** - closure compilation of the IR using the inferred types
//! 5. **specialize** - the per-function specialization cache
//! 6. **link** - the polymorphic inline cache behind every call site
//! 7. **ffi** - overload selection for host functions
//!
//! ## Performance
//!
//! - Integer, Float and Boolean locals live in unboxed frame slots
//! - Operators on statically known numbers never touch a call site
//! - Call sites cache up to `polymorphism_limit + 1` guarded targets
//! - SmallVec keeps guard chains and argument vectors off the heap

pub mod arithmetic;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod hir;
pub mod infer;
pub mod link;
pub mod lower;
pub mod primitives;
pub mod specialize;
pub mod syntax;
pub mod types;
pub mod value;

pub use config::EngineConfig;
pub use engine::{Engine, Runtime};
pub use error::{Diagnostic, Error, LResult, ScriptError};
pub use ffi::HostFunction;
pub use specialize::{FunctionType, Specialization};
pub use types::Type;
pub use value::{Multi, TableRef, Value};
