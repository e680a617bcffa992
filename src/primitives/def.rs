//! Primitive definition types for declarative registration.
//!
//! Each primitive module exports a `const PRIMITIVES: &[PrimitiveDef]`
//! table. `register_primitives` iterates all tables and turns every
//! definition into a [`HostFunction`].

use crate::engine::Runtime;
use crate::error::{fault, EngineFault, LResult};
use crate::ffi::{HostFunction, IntrinsicId, Overload, Param, RegistrationError, Returns};
use crate::value::{Multi, Value};

/// The Rust implementation of one overload.
pub type NativeFn = fn(&Runtime, &[Value]) -> LResult<Multi>;

/// One overload of a primitive. Tables use `..OverloadDef::DEFAULT`
/// for the fields they leave alone.
pub struct OverloadDef {
    pub params: &'static [Param],
    /// The last parameter is the element type of a variadic tail.
    pub variadic: bool,
    /// Only visible to call sites requesting this intrinsic.
    pub intrinsic: Option<IntrinsicId>,
    pub fallback: bool,
    pub returns: Returns,
    pub func: NativeFn,
}

impl OverloadDef {
    /// Default for struct-update syntax. `func` faults if called, which
    /// forces explicit initialization.
    pub const DEFAULT: OverloadDef = OverloadDef {
        params: &[],
        variadic: false,
        intrinsic: None,
        fallback: false,
        returns: Returns::Variable,
        func: default_prim,
    };

    fn to_overload(&self) -> Overload {
        let mut overload = Overload::new(self.params, self.func).with_returns(self.returns);
        if self.variadic {
            overload = overload.with_variadic();
        }
        if let Some(id) = self.intrinsic {
            overload = overload.with_intrinsic(id);
        }
        if self.fallback {
            overload = overload.as_fallback();
        }
        overload
    }
}

/// Placeholder function for DEFAULT.
fn default_prim(_: &Runtime, _: &[Value]) -> LResult<Multi> {
    fault(EngineFault::ImpossibleTransition(
        "OverloadDef::DEFAULT func called",
    ))
}

/// Declarative definition of a primitive function.
pub struct PrimitiveDef {
    /// The script-facing name.
    pub name: &'static str,
    /// One-line description.
    pub doc: &'static str,
    /// Parameter names, for documentation.
    pub params: &'static [&'static str],
    /// Whether the primitive is bound as a global. Hidden primitives are
    /// reachable through [`Runtime::builtin`] only.
    pub global: bool,
    pub overloads: &'static [OverloadDef],
}

impl PrimitiveDef {
    pub const DEFAULT: PrimitiveDef = PrimitiveDef {
        name: "",
        doc: "",
        params: &[],
        global: true,
        overloads: &[],
    };

    pub fn build(&self) -> Result<HostFunction, RegistrationError> {
        self.overloads
            .iter()
            .fold(HostFunction::builder(self.name), |builder, def| {
                builder.overload(def.to_overload())
            })
            .build()
    }
}

/// Documentation info for a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Doc {
    pub name: &'static str,
    pub doc: &'static str,
    pub params: &'static [&'static str],
}

impl Doc {
    /// Format as a one-line signature plus description.
    pub fn format(&self) -> String {
        format!("{}({}) - {}", self.name, self.params.join(", "), self.doc)
    }
}
