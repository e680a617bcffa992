//! Shared test helpers for the wane test suite.
//!
//! Scripts are built with `wane::syntax::build`; these helpers run them
//! and dig out the call sites and specializations they produced.

#![allow(dead_code)]

use std::rc::Rc;
use wane::config::EngineConfig;
use wane::hir::FunctionProto;
use wane::link::CallSite;
use wane::specialize::Specialization;
use wane::syntax::build::chunk;
use wane::syntax::Stmt;
use wane::types::Type;
use wane::value::{Callable, Multi, Value};
use wane::{Engine, Error, ScriptError};

pub fn engine() -> Engine {
    Engine::new(EngineConfig::default())
}

/// Run statements as a chunk on a fresh engine.
pub fn run(stmts: Vec<Stmt>) -> Multi {
    engine().run(&chunk(stmts)).expect("script failed")
}

/// The first result of running statements on a fresh engine.
pub fn eval(stmts: Vec<Stmt>) -> Value {
    run(stmts).first()
}

/// The script error raised by statements on a fresh engine.
pub fn run_err(stmts: Vec<Stmt>) -> ScriptError {
    script_error(engine().run(&chunk(stmts)))
}

pub fn script_error(result: Result<Multi, Error>) -> ScriptError {
    match result {
        Err(Error::Script(e)) => e,
        Err(other) => panic!("expected a script error, got {}", other),
        Ok(values) => panic!("expected a script error, got {:?}", values),
    }
}

/// A loaded chunk plus its resolved prototype, for site inspection.
pub struct Loaded {
    pub main: Value,
    pub proto: Rc<FunctionProto>,
}

pub fn load(engine: &Engine, stmts: Vec<Stmt>) -> Loaded {
    let main = engine.load(&chunk(stmts)).expect("chunk failed to resolve");
    let proto = match &main {
        Value::Function(Callable::Closure(c)) => c.function_type().proto().clone(),
        _ => panic!("load returned a non-closure"),
    };
    Loaded { main, proto }
}

impl Loaded {
    pub fn run(&self, engine: &Engine) -> Multi {
        engine.call(&self.main, &[]).expect("script failed")
    }

    /// The main function's specialization for no arguments.
    pub fn main_specialization(&self) -> Rc<Specialization> {
        match &self.main {
            Value::Function(Callable::Closure(c)) => c
                .function_type()
                .lookup(&[])
                .expect("main was never specialized"),
            _ => unreachable!(),
        }
    }

    /// The first call site labeled `label`, in the chunk or any nested
    /// function.
    pub fn call_site(&self, label: &str) -> Rc<CallSite> {
        find_site(&self.proto, label, true).unwrap_or_else(|| panic!("no call site '{}'", label))
    }

    /// The first non-call site labeled `label` (operators, field access).
    pub fn site(&self, label: &str) -> Rc<CallSite> {
        find_site(&self.proto, label, false).unwrap_or_else(|| panic!("no site '{}'", label))
    }
}

fn find_site(proto: &FunctionProto, label: &str, call: bool) -> Option<Rc<CallSite>> {
    proto
        .sites_labeled(label)
        .find(|s| s.is_call() == call)
        .cloned()
        .or_else(|| {
            proto
                .children
                .iter()
                .find_map(|child| find_site(child, label, call))
        })
}

pub fn as_int(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i,
        other => panic!("expected an integer, got {:?}", other),
    }
}

pub fn as_float(v: &Value) -> f64 {
    match v {
        Value::Float(f) => *f,
        other => panic!("expected a float, got {:?}", other),
    }
}

pub fn as_string(v: &Value) -> String {
    match v {
        Value::Str(s) => s.to_string(),
        other => panic!("expected a string, got {:?}", other),
    }
}

pub fn types(ts: &[Type]) -> Box<[Type]> {
    ts.to_vec().into_boxed_slice()
}
