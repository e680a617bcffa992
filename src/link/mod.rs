//! The call-site linker
//!
//! Every dynamic call, operator and field access owns a [`CallSite`]:
//! a polymorphic inline cache of (guard, target) pairs.
//!
//! ```text
//! Unlinked --resolve--> Monomorphic --miss--> Polymorphic chain
//!                            |                      |
//!                            +--- relinks > limit --+--> Megamorphic
//! ```
//!
//! - A hit runs the cached target without resolving.
//! - A miss resolves again and pushes the new entry in front of the
//!   old ones, so earlier shapes stay cached.
//! - A megamorphic site resolves on every invocation and caches nothing.
//!
//! Resolution is split by site kind: `operator` covers binary and unary
//! operators, `call` covers calls and `field` covers field reads and writes.

mod call;
mod field;
mod guard;
mod operator;
mod site;
mod stats;
mod target;

pub use guard::{CalleeKey, Guard};
pub use site::{CallPurpose, CallSite, LinkState, SiteKind, SiteTrace};
pub use stats::{Stats, StatsSnapshot};
pub use target::{MetaCall, Target};

use crate::value::Value;
use smallvec::SmallVec;

/// Operands of one site invocation, callee or receiver first.
pub type Operands = SmallVec<[Value; 4]>;
