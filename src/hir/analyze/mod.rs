//! Syntax to HIR analysis
//!
//! This module converts a parse tree into HIR by:
//! 1. Resolving every identifier to a local, a capture or a global
//! 2. Building each function literal's capture list on first reference
//! 3. Flagging locals that are mutated or captured
//! 4. Creating one unlinked call site per dynamic operation
//! 5. Validating scope rules (`break` placement, `...` placement)
//!
//! ## Build phase
//!
//! A local's flags can change after its function literal has been
//! walked (an inner closure may be created before the outer assignment
//! that makes the local mutable), so every function is first collected
//! as a [`FunctionDraft`]. Drafts are frozen into [`FunctionProto`]s once
//! the whole chunk is resolved and every flag is final.

mod call;
mod forms;
mod lambda;

use super::binding::{CaptureInfo, CaptureSource, LocalBuilder, LocalId};
use super::expr::Block;
use super::{FunctionProto, ResolveError};
use crate::link::{CallSite, SiteKind};
use crate::syntax::Chunk;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Resolve a chunk into the IR of its main function.
///
/// The main function is variadic and has no captures; names it does
/// not declare are globals.
pub fn analyze(chunk: &Chunk) -> Result<Rc<FunctionProto>, ResolveError> {
    let mut analyzer = Analyzer::new();
    let draft = analyzer.analyze_chunk(chunk)?;
    Ok(draft.freeze())
}

/// A lexical block
struct Scope {
    names: FxHashMap<Rc<str>, LocalId>,
    /// Index of the owning function in `Analyzer::functions`
    level: usize,
}

/// A captured variable while its function is being built
struct CaptureDraft {
    name: Rc<str>,
    source: CaptureSource,
    /// The local ultimately captured, possibly several functions out
    local: Rc<LocalBuilder>,
}

/// Per-function analysis state
struct FunctionState {
    name: Rc<str>,
    vararg: bool,
    params: Vec<LocalId>,
    locals: Vec<Rc<LocalBuilder>>,
    captures: Vec<CaptureDraft>,
    children: Vec<FunctionDraft>,
    sites: Vec<Rc<CallSite>>,
    loop_depth: u32,
    block_depth: u32,
}

impl FunctionState {
    fn new(name: Rc<str>, vararg: bool) -> Self {
        FunctionState {
            name,
            vararg,
            params: Vec::new(),
            locals: Vec::new(),
            captures: Vec::new(),
            children: Vec::new(),
            sites: Vec::new(),
            loop_depth: 0,
            block_depth: 0,
        }
    }

    fn into_draft(self, body: Block) -> FunctionDraft {
        FunctionDraft {
            name: self.name,
            params: self.params,
            vararg: self.vararg,
            locals: self.locals,
            captures: self.captures,
            body,
            children: self.children,
            sites: self.sites,
        }
    }
}

/// A function literal whose local flags may still change
struct FunctionDraft {
    name: Rc<str>,
    params: Vec<LocalId>,
    vararg: bool,
    locals: Vec<Rc<LocalBuilder>>,
    captures: Vec<CaptureDraft>,
    body: Block,
    children: Vec<FunctionDraft>,
    sites: Vec<Rc<CallSite>>,
}

impl FunctionDraft {
    fn freeze(self) -> Rc<FunctionProto> {
        let children = self.children.into_iter().map(FunctionDraft::freeze).collect();
        let captures = self
            .captures
            .iter()
            .map(|c| CaptureInfo {
                name: c.name.clone(),
                source: c.source,
                boxed: c.local.freeze().needs_cell(),
            })
            .collect();
        Rc::new(FunctionProto {
            name: self.name,
            params: self.params.into_boxed_slice(),
            vararg: self.vararg,
            locals: self.locals.iter().map(|l| l.freeze()).collect(),
            captures,
            body: self.body,
            children,
            sites: self.sites.into_boxed_slice(),
            function_types: Default::default(),
        })
    }
}

/// What a name refers to from the current function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolved {
    Local(LocalId),
    Capture(usize),
    Global,
}

/// Analyzer that converts syntax to HIR
struct Analyzer {
    scopes: Vec<Scope>,
    functions: Vec<FunctionState>,
}

impl Analyzer {
    fn new() -> Self {
        Analyzer {
            scopes: Vec::new(),
            functions: Vec::new(),
        }
    }

    fn analyze_chunk(&mut self, chunk: &Chunk) -> Result<FunctionDraft, ResolveError> {
        self.functions
            .push(FunctionState::new(chunk.name.clone(), true));
        self.push_scope();
        let body = self.analyze_stmts(&chunk.body.stmts)?;
        self.pop_scope();
        let state = self.pop_function();
        Ok(state.into_draft(body))
    }

    // === Function State ===

    fn level(&self) -> usize {
        self.functions.len() - 1
    }

    fn current(&mut self) -> &mut FunctionState {
        let level = self.level();
        &mut self.functions[level]
    }

    fn pop_function(&mut self) -> FunctionState {
        match self.functions.pop() {
            Some(state) => state,
            None => crate::error::fault(crate::error::EngineFault::ImpossibleTransition(
                "function stack underflow during resolution",
            )),
        }
    }

    fn site(&mut self, kind: SiteKind, label: &str) -> Rc<CallSite> {
        let site = Rc::new(CallSite::new(kind, label));
        self.current().sites.push(site.clone());
        site
    }

    // === Scope Management ===

    fn push_scope(&mut self) {
        let level = self.level();
        self.current().block_depth += 1;
        self.scopes.push(Scope {
            names: FxHashMap::default(),
            level,
        });
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
        let state = self.current();
        state.block_depth = state.block_depth.saturating_sub(1);
    }

    /// Declare a local in the innermost scope. Shadows any earlier
    /// local of the same name from here on.
    fn declare(&mut self, name: Rc<str>) -> LocalId {
        let state = self.current();
        let id = LocalId(state.locals.len() as u32);
        let builder = LocalBuilder::new(name.clone(), state.block_depth);
        state.locals.push(Rc::new(builder));
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name, id);
        }
        id
    }

    fn resolve(&mut self, name: &str) -> Resolved {
        let level = self.level();
        self.resolve_at(level, name)
    }

    fn resolve_at(&mut self, level: usize, name: &str) -> Resolved {
        // Walk scopes from innermost to outermost within this function
        let found = self
            .scopes
            .iter()
            .rev()
            .filter(|s| s.level == level)
            .find_map(|s| s.names.get(name).copied());
        if let Some(id) = found {
            return Resolved::Local(id);
        }
        if level == 0 {
            return Resolved::Global;
        }

        let (source, local) = match self.resolve_at(level - 1, name) {
            Resolved::Global => return Resolved::Global,
            Resolved::Local(id) => {
                let local = self.functions[level - 1].locals[id.index()].clone();
                local.mark_captured();
                (CaptureSource::Local(id), local)
            }
            Resolved::Capture(index) => {
                let local = self.functions[level - 1].captures[index].local.clone();
                (CaptureSource::Capture(index), local)
            }
        };

        let captures = &mut self.functions[level].captures;
        if let Some(index) = captures.iter().position(|c| c.source == source) {
            return Resolved::Capture(index);
        }
        captures.push(CaptureDraft {
            name: Rc::from(name),
            source,
            local,
        });
        Resolved::Capture(captures.len() - 1)
    }

    /// The build-phase record behind a resolved local or capture.
    fn builder_of(&mut self, resolved: Resolved) -> Option<Rc<LocalBuilder>> {
        let state = self.current();
        match resolved {
            Resolved::Local(id) => Some(state.locals[id.index()].clone()),
            Resolved::Capture(index) => Some(state.captures[index].local.clone()),
            Resolved::Global => None,
        }
    }
}
