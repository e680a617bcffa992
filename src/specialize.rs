//! Function types and their specialization caches
//!
//! A [`FunctionType`] is one function literal under one tuple of capture
//! types. Every closure created from that literal with those capture types
//! shares it, and with it the cache of compiled [`Specialization`]s keyed
//! by argument-type tuple.

use crate::engine::Runtime;
use crate::error::LResult;
use crate::hir::FunctionProto;
use crate::infer::infer;
use crate::lower::{lower, Routine};
use crate::types::{describe, Type};
use crate::value::{Capture, Multi, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// Interning table from capture types to live function types, owned by
/// each function literal.
pub(crate) type FunctionTypeTable = RefCell<FxHashMap<Box<[Type]>, Weak<FunctionTypeInner>>>;

pub struct FunctionTypeInner {
    proto: Rc<FunctionProto>,
    captures: Box<[Type]>,
    cache: RefCell<FxHashMap<Box<[Type]>, Rc<Specialization>>>,
}

/// A function literal plus the static types of its captures.
///
/// Compared and hashed by identity: interning guarantees one value per
/// (literal, capture types) pair while any closure keeps it alive.
#[derive(Clone)]
pub struct FunctionType(Rc<FunctionTypeInner>);

impl FunctionType {
    /// The function type for `proto` closed over values of `captures`.
    pub fn intern(proto: &Rc<FunctionProto>, captures: Box<[Type]>) -> FunctionType {
        let mut table = proto.function_types.borrow_mut();
        if let Some(existing) = table.get(&captures[..]).and_then(Weak::upgrade) {
            return FunctionType(existing);
        }
        let inner = Rc::new(FunctionTypeInner {
            proto: proto.clone(),
            captures: captures.clone(),
            cache: RefCell::new(FxHashMap::default()),
        });
        table.retain(|_, weak| weak.strong_count() > 0);
        table.insert(captures, Rc::downgrade(&inner));
        FunctionType(inner)
    }

    pub fn proto(&self) -> &Rc<FunctionProto> {
        &self.0.proto
    }

    pub fn name(&self) -> Rc<str> {
        self.0.proto.name.clone()
    }

    pub fn capture_types(&self) -> &[Type] {
        &self.0.captures
    }

    /// Normalize observed argument types to the cache key: declared
    /// parameters padded with Nil, extras kept only for vararg functions.
    fn signature(&self, args: &[Type]) -> Box<[Type]> {
        let proto = &self.0.proto;
        let declared = proto.params.len();
        let mut key: Vec<Type> = (0..declared)
            .map(|i| args.get(i).cloned().unwrap_or(Type::Nil))
            .collect();
        if proto.vararg && args.len() > declared {
            key.extend(args[declared..].iter().cloned());
        }
        key.into_boxed_slice()
    }

    /// The cached specialization for `args`, if one was compiled.
    pub fn lookup(&self, args: &[Type]) -> Option<Rc<Specialization>> {
        self.0.cache.borrow().get(&self.signature(args)).cloned()
    }

    /// Compile (or fetch) the routine for an argument-type tuple.
    ///
    /// Repeated calls with an equal tuple return the same `Rc`.
    pub fn specialize(&self, rt: &Runtime, args: &[Type]) -> Rc<Specialization> {
        let key = self.signature(args);
        if let Some(existing) = self.0.cache.borrow().get(&key) {
            return existing.clone();
        }

        let proto = &self.0.proto;
        let ctx = infer(proto, &self.0.captures, &key);
        let routine = lower(proto, &ctx);
        let specialization = Rc::new(Specialization {
            name: proto.name.clone(),
            proto: proto.clone(),
            args: key.clone(),
            returns: ctx.returns(),
            locals: ctx.local_types().into_boxed_slice(),
            routine,
        });

        let mut cache = self.0.cache.borrow_mut();
        if let Some(existing) = cache.get(&key) {
            return existing.clone();
        }
        cache.insert(key, specialization.clone());
        drop(cache);
        rt.stats().record_specialization();
        tracing::debug!(
            function = %specialization.name,
            args = %describe(&specialization.args),
            returns = %specialization.returns,
            "specialized"
        );
        specialization
    }

    /// Number of compiled specializations.
    pub fn specialization_count(&self) -> usize {
        self.0.cache.borrow().len()
    }
}

impl PartialEq for FunctionType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for FunctionType {}

impl Hash for FunctionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const () as usize).hash(state)
    }
}

impl fmt::Debug for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0.proto.name, describe(&self.0.captures))
    }
}

/// A compiled routine for one function type and argument-type tuple.
pub struct Specialization {
    name: Rc<str>,
    proto: Rc<FunctionProto>,
    args: Box<[Type]>,
    returns: Type,
    locals: Box<[Type]>,
    routine: Routine,
}

impl Specialization {
    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn args(&self) -> &[Type] {
        &self.args
    }

    pub fn returns(&self) -> &Type {
        &self.returns
    }

    /// Inferred type of the first local called `name`.
    pub fn local_type(&self, name: &str) -> Option<Type> {
        let id = self.proto.locals_named(name).next()?;
        self.locals.get(id.index()).cloned()
    }

    /// Inferred types of every local called `name`, in declaration order.
    pub fn local_types(&self, name: &str) -> Vec<Type> {
        self.proto
            .locals_named(name)
            .filter_map(|id| self.locals.get(id.index()).cloned())
            .collect()
    }

    pub fn invoke(&self, rt: &Runtime, captures: &[Capture], args: &[Value]) -> LResult<Multi> {
        let _frame = rt.enter()?;
        self.routine.run(rt, captures, args)
    }
}

impl fmt::Debug for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} -> {}", self.name, describe(&self.args), self.returns)
    }
}
