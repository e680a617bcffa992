//! Embedding API
//!
//! An [`Engine`] owns the [`Runtime`] every routine runs against: the
//! configuration, the globals table, the error formatter and the linker
//! statistics. Chunks are resolved once by [`Engine::load`] and compiled
//! lazily, one specialization per argument-type signature, as they run.

use crate::config::EngineConfig;
use crate::error::{default_formatter, Diagnostic, Error, ErrorFormatter, LResult, ScriptError};
use crate::ffi::HostFunction;
use crate::hir::{analyze, ResolveError};
use crate::link::{CallSite, Operands, SiteKind, Stats, StatsSnapshot};
use crate::primitives::register_primitives;
use crate::specialize::FunctionType;
use crate::syntax::Chunk;
use crate::value::{Callable, Closure, Multi, Table, TableRef, Value};
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// State shared by every routine and call site of one engine.
pub struct Runtime {
    config: EngineConfig,
    globals: TableRef,
    formatter: ErrorFormatter,
    stats: Stats,
    builtins: RefCell<FxHashMap<&'static str, Value>>,
    depth: Cell<usize>,
}

/// One active script call; leaving it pops the depth counter.
pub(crate) struct CallFrame<'rt> {
    depth: &'rt Cell<usize>,
}

impl Drop for CallFrame<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

impl Runtime {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn globals(&self) -> &TableRef {
        &self.globals
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// A built-in host function by name, whether or not it is exposed as
    /// a global. Scripts overwriting globals do not affect this lookup.
    pub fn builtin(&self, name: &str) -> Value {
        self.builtins
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(Value::Nil)
    }

    pub(crate) fn register_builtin(&self, name: &'static str, value: Value) {
        self.builtins.borrow_mut().insert(name, value);
    }

    /// Enter a script function call, failing once
    /// `EngineConfig::max_call_depth` calls are already active.
    pub(crate) fn enter(&self) -> LResult<CallFrame<'_>> {
        let depth = self.depth.get();
        if depth >= self.config.max_call_depth {
            tracing::debug!(depth, "call depth exceeded");
            return Err(self.error(Diagnostic::StackOverflow { depth }));
        }
        self.depth.set(depth + 1);
        Ok(CallFrame { depth: &self.depth })
    }

    /// Script calls currently active.
    pub fn call_depth(&self) -> usize {
        self.depth.get()
    }

    /// Build the script error for an engine-detected problem through the
    /// configured formatter.
    pub fn error(&self, diagnostic: Diagnostic) -> ScriptError {
        ScriptError::raise((self.formatter)(&diagnostic))
    }

    /// Call `callee` from host code.
    ///
    /// Each call goes through a fresh, unlinked site, so nothing is
    /// cached between calls.
    pub fn call(&self, callee: &Value, args: &[Value]) -> LResult<Multi> {
        let mut ops = Operands::with_capacity(args.len() + 1);
        ops.push(callee.clone());
        ops.extend(args.iter().cloned());
        CallSite::new(SiteKind::call(), "host call").invoke(self, &ops)
    }

    /// `object[key]`, honoring `__index`.
    pub fn index(&self, object: &Value, key: &Value) -> LResult<Value> {
        let site = CallSite::new(SiteKind::GetField, "host index");
        Ok(site.invoke(self, &[object.clone(), key.clone()])?.into_first())
    }

    /// `object[key] = value`, honoring `__newindex`.
    pub fn set_index(&self, object: &Value, key: &Value, value: Value) -> LResult<()> {
        let site = CallSite::new(SiteKind::SetField, "host index");
        site.invoke(self, &[object.clone(), key.clone(), value])?;
        Ok(())
    }
}

/// A script engine: globals, host functions and compiled chunks.
///
/// Single-threaded; values and caches are shared through `Rc`.
pub struct Engine {
    runtime: Runtime,
}

impl Engine {
    /// A fresh engine with the built-in host functions registered.
    pub fn new(config: EngineConfig) -> Self {
        let engine = Engine {
            runtime: Runtime {
                config,
                globals: Table::new_ref(),
                formatter: Rc::new(default_formatter),
                stats: Stats::default(),
                builtins: RefCell::new(FxHashMap::default()),
                depth: Cell::new(0),
            },
        };
        register_primitives(&engine);
        engine
    }

    /// Replace the formatter turning diagnostics into error payloads.
    pub fn with_error_formatter(mut self, formatter: impl Fn(&Diagnostic) -> Value + 'static) -> Self {
        self.runtime.formatter = Rc::new(formatter);
        self
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Expose a host function as a global under its own name.
    pub fn register(&self, function: HostFunction) {
        let name = function.name().clone();
        self.set_global(&name, Value::host(function));
    }

    pub fn set_global(&self, name: &str, value: Value) {
        self.runtime.globals.borrow_mut().set_str(name, value);
    }

    pub fn get_global(&self, name: &str) -> Value {
        self.runtime.globals.borrow().get_str(name)
    }

    pub fn globals(&self) -> &TableRef {
        &self.runtime.globals
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.runtime.stats.snapshot()
    }

    /// Resolve a chunk into its main function. Nothing is compiled until
    /// the function is called.
    pub fn load(&self, chunk: &Chunk) -> Result<Value, ResolveError> {
        let proto = analyze(chunk)?;
        tracing::debug!(sites = proto.sites.len(), children = proto.children.len(), "loaded chunk");
        let function_type = FunctionType::intern(&proto, Box::new([]));
        let main = Closure::new(function_type, Box::new([]));
        Ok(Value::Function(Callable::Closure(Rc::new(main))))
    }

    /// Load and run a chunk with no arguments.
    pub fn run(&self, chunk: &Chunk) -> Result<Multi, Error> {
        let main = self.load(chunk)?;
        Ok(self.call(&main, &[])?)
    }

    pub fn call(&self, callee: &Value, args: &[Value]) -> LResult<Multi> {
        self.runtime.call(callee, args)
    }
}
