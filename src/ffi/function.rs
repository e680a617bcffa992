//! Host function registration

use super::matcher::{Choice, Selection};
use super::IntrinsicId;
use crate::engine::Runtime;
use crate::error::{fault, EngineFault, LResult};
use crate::types::Type;
use crate::value::{Multi, Value};
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// The Rust side of one overload.
pub type HostFn = Rc<dyn Fn(&Runtime, &[Value]) -> LResult<Multi>>;

/// Parameter type as declared by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    Any,
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    Table,
    Function,
}

impl DeclaredType {
    /// Direct acceptance, without nullability or widening.
    pub fn accepts(self, ty: &Type) -> bool {
        match self {
            DeclaredType::Any => true,
            DeclaredType::Nil => matches!(ty, Type::Nil),
            DeclaredType::Boolean => matches!(ty, Type::Boolean),
            DeclaredType::Integer => matches!(ty, Type::Integer),
            DeclaredType::Float => matches!(ty, Type::Float),
            DeclaredType::String => matches!(ty, Type::String),
            DeclaredType::Table => matches!(ty, Type::Table),
            DeclaredType::Function => matches!(ty, Type::Function(_)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeclaredType::Any => "any",
            DeclaredType::Nil => "nil",
            DeclaredType::Boolean => "boolean",
            DeclaredType::Integer => "integer",
            DeclaredType::Float => "float",
            DeclaredType::String => "string",
            DeclaredType::Table => "table",
            DeclaredType::Function => "function",
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub ty: DeclaredType,
    pub nullable: bool,
}

impl Param {
    pub const fn of(ty: DeclaredType) -> Param {
        Param {
            ty,
            nullable: false,
        }
    }

    /// A parameter that also accepts nil.
    pub const fn nullable(ty: DeclaredType) -> Param {
        Param { ty, nullable: true }
    }
}

/// How many results an overload produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    /// Results are truncated or nil-padded to exactly this many.
    Exact(usize),
    /// Whatever the closure returns.
    Variable,
}

/// One candidate signature of a host function.
#[derive(Clone)]
pub struct Overload {
    params: Box<[Param]>,
    variadic: bool,
    intrinsic: Option<IntrinsicId>,
    fallback: bool,
    returns: Returns,
    func: HostFn,
}

impl Overload {
    pub fn new(
        params: impl Into<Box<[Param]>>,
        func: impl Fn(&Runtime, &[Value]) -> LResult<Multi> + 'static,
    ) -> Self {
        Overload {
            params: params.into(),
            variadic: false,
            intrinsic: None,
            fallback: false,
            returns: Returns::Variable,
            func: Rc::new(func),
        }
    }

    /// The last parameter is the element type of a variadic tail.
    pub fn with_variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn with_intrinsic(mut self, id: IntrinsicId) -> Self {
        self.intrinsic = Some(id);
        self
    }

    pub fn as_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    pub fn with_returns(mut self, returns: Returns) -> Self {
        self.returns = returns;
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn intrinsic(&self) -> Option<IntrinsicId> {
        self.intrinsic
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn returns(&self) -> Returns {
        self.returns
    }

    fn call(&self, rt: &Runtime, args: &[Value]) -> LResult<Multi> {
        let results = (self.func)(rt, args)?;
        Ok(match self.returns {
            Returns::Exact(n) => results.adjust(n),
            Returns::Variable => results,
        })
    }
}

impl fmt::Debug for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overload")
            .field("params", &self.params)
            .field("variadic", &self.variadic)
            .field("intrinsic", &self.intrinsic)
            .field("fallback", &self.fallback)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("host function '{0}' declares more than one fallback")]
    DuplicateFallback(String),
    #[error("host function '{0}' has no overloads")]
    Empty(String),
}

/// A named host function exposed to scripts.
#[derive(Debug)]
pub struct HostFunction {
    name: Rc<str>,
    overloads: Box<[Overload]>,
    fallback: Option<Overload>,
}

impl HostFunction {
    pub fn builder(name: impl AsRef<str>) -> HostFunctionBuilder {
        HostFunctionBuilder {
            name: Rc::from(name.as_ref()),
            overloads: Vec::new(),
        }
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    /// Non-fallback overloads in resolution order.
    pub fn overloads(&self) -> &[Overload] {
        &self.overloads
    }

    pub fn fallback(&self) -> Option<&Overload> {
        self.fallback.as_ref()
    }

    /// Run the selected overload, widening the recorded argument
    /// positions from Integer to Float first.
    pub fn invoke(&self, rt: &Runtime, selection: &Selection, args: &[Value]) -> LResult<Multi> {
        let overload = match selection.choice {
            Choice::Overload(i) => &self.overloads[i],
            Choice::Fallback => match &self.fallback {
                Some(fallback) => fallback,
                None => fault(EngineFault::StaleTarget("fallback selected but none registered")),
            },
        };
        if selection.widen.is_empty() {
            return overload.call(rt, args);
        }
        let mut widened: SmallVec<[Value; 4]> = args.iter().cloned().collect();
        for &i in &selection.widen {
            if let Value::Int(n) = widened[i] {
                widened[i] = Value::Float(n as f64);
            }
        }
        overload.call(rt, &widened)
    }
}

pub struct HostFunctionBuilder {
    name: Rc<str>,
    overloads: Vec<Overload>,
}

impl HostFunctionBuilder {
    pub fn overload(mut self, overload: Overload) -> Self {
        self.overloads.push(overload);
        self
    }

    /// Sort the overloads by descending parameter count, keeping
    /// declaration order among equals except that intrinsic overloads
    /// come before plain ones.
    pub fn build(self) -> Result<HostFunction, RegistrationError> {
        if self.overloads.is_empty() {
            return Err(RegistrationError::Empty(self.name.to_string()));
        }
        let (fallbacks, mut overloads): (Vec<_>, Vec<_>) =
            self.overloads.into_iter().partition(|o| o.fallback);
        if fallbacks.len() > 1 {
            return Err(RegistrationError::DuplicateFallback(self.name.to_string()));
        }
        overloads.sort_by_key(|o| (Reverse(o.params.len()), o.intrinsic.is_none()));
        Ok(HostFunction {
            name: self.name,
            overloads: overloads.into_boxed_slice(),
            fallback: fallbacks.into_iter().next(),
        })
    }
}
