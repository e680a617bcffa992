//! Call sites and their link state machine

use super::call::resolve_call;
use super::field::{resolve_get, resolve_set};
use super::guard::Guard;
use super::operator::{resolve_binary, resolve_unary};
use super::target::Target;
use crate::engine::Runtime;
use crate::error::{fault, EngineFault, LResult};
use crate::ffi::IntrinsicId;
use crate::hir::{BinaryOp, UnaryOp};
use crate::types::Type;
use crate::value::{Multi, Value};
use smallvec::SmallVec;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Why a call site calls its callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPurpose {
    Call,
    /// The per-iteration call of a generic `for`
    Iterate,
}

/// The dynamic operation a site performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// Operands: `[callee, args...]`
    Call {
        purpose: CallPurpose,
        intrinsic: Option<IntrinsicId>,
    },
    /// Operands: `[lhs, rhs]`
    Binary(BinaryOp),
    /// Operands: `[operand]`
    Unary(UnaryOp),
    /// Operands: `[table, key]`
    GetField,
    /// Operands: `[table, key, value]`
    SetField,
}

impl SiteKind {
    pub fn call() -> SiteKind {
        SiteKind::Call {
            purpose: CallPurpose::Call,
            intrinsic: None,
        }
    }

    pub fn iterate() -> SiteKind {
        SiteKind::Call {
            purpose: CallPurpose::Iterate,
            intrinsic: None,
        }
    }

    pub fn intrinsic_call(id: IntrinsicId) -> SiteKind {
        SiteKind::Call {
            purpose: CallPurpose::Call,
            intrinsic: Some(id),
        }
    }
}

/// Coarse link state, as reported by [`SiteTrace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Unlinked,
    Monomorphic,
    /// Number of cached entries
    Polymorphic(usize),
    Megamorphic,
}

/// Diagnostics snapshot of one site.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteTrace {
    pub label: Rc<str>,
    pub state: LinkState,
    /// Name of the function the last dispatch reached, if any
    pub callee: Option<Rc<str>>,
    /// Argument types of the specialization the last dispatch ran
    pub specialization: Option<Box<[Type]>>,
    /// Consecutive dispatches through the same cached entry
    pub stability: u64,
    pub hits: u64,
    pub resolutions: u64,
    pub relinks: u32,
}

struct Entry {
    id: u32,
    guard: Guard,
    target: Target,
}

enum Link {
    Unlinked,
    Monomorphic(Entry),
    /// Most recently resolved first
    Polymorphic(SmallVec<[Entry; 4]>),
    Megamorphic,
}

#[derive(Default)]
struct Counters {
    hits: Cell<u64>,
    resolutions: Cell<u64>,
    relinks: Cell<u32>,
    stability: Cell<u64>,
    last: Cell<Option<u32>>,
    next_id: Cell<u32>,
}

/// The inline cache of one syntactic call, operator or field access.
///
/// The link borrow is only held while guards are checked or an entry is
/// installed, never while a target runs, so a site may re-enter itself
/// through recursion.
pub struct CallSite {
    kind: SiteKind,
    label: Rc<str>,
    link: RefCell<Link>,
    counters: Counters,
    last_target: RefCell<(Option<Rc<str>>, Option<Box<[Type]>>)>,
    nested: OnceCell<Rc<CallSite>>,
}

impl CallSite {
    pub fn new(kind: SiteKind, label: impl AsRef<str>) -> Self {
        CallSite {
            kind,
            label: Rc::from(label.as_ref()),
            link: RefCell::new(Link::Unlinked),
            counters: Counters::default(),
            last_target: RefCell::new((None, None)),
            nested: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> SiteKind {
        self.kind
    }

    pub fn label(&self) -> &Rc<str> {
        &self.label
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, SiteKind::Call { .. })
    }

    pub fn intrinsic(&self) -> Option<IntrinsicId> {
        match self.kind {
            SiteKind::Call { intrinsic, .. } => intrinsic,
            _ => None,
        }
    }

    /// The call site metamethod targets of this site call their handlers
    /// through.
    pub(super) fn nested(&self) -> Rc<CallSite> {
        self.nested
            .get_or_init(|| Rc::new(CallSite::new(SiteKind::call(), &*self.label)))
            .clone()
    }

    pub fn state(&self) -> LinkState {
        match &*self.link.borrow() {
            Link::Unlinked => LinkState::Unlinked,
            Link::Monomorphic(_) => LinkState::Monomorphic,
            Link::Polymorphic(chain) => LinkState::Polymorphic(chain.len()),
            Link::Megamorphic => LinkState::Megamorphic,
        }
    }

    pub fn trace(&self) -> SiteTrace {
        let (callee, specialization) = self.last_target.borrow().clone();
        SiteTrace {
            label: self.label.clone(),
            state: self.state(),
            callee,
            specialization,
            stability: self.counters.stability.get(),
            hits: self.counters.hits.get(),
            resolutions: self.counters.resolutions.get(),
            relinks: self.counters.relinks.get(),
        }
    }

    /// Run the operation on `ops`, resolving and relinking as needed.
    pub fn invoke(&self, rt: &Runtime, ops: &[Value]) -> LResult<Multi> {
        if let Some((id, target)) = self.lookup(ops) {
            rt.stats().record_guard_hit();
            if rt.config().trace_sites {
                self.confirm(id, &target, ops);
            }
            return target.run(rt, ops);
        }

        let megamorphic = matches!(*self.link.borrow(), Link::Megamorphic);
        if !megamorphic && !matches!(*self.link.borrow(), Link::Unlinked) {
            tracing::trace!(site = %self.label, "guard miss");
        }
        let (guard, target) = self.resolve(rt, ops, megamorphic)?;
        self.install(rt, guard, &target, ops);
        target.run(rt, ops)
    }

    fn lookup(&self, ops: &[Value]) -> Option<(u32, Target)> {
        match &*self.link.borrow() {
            Link::Monomorphic(entry) => entry
                .guard
                .holds(ops)
                .then(|| (entry.id, entry.target.clone())),
            Link::Polymorphic(chain) => chain
                .iter()
                .find(|entry| entry.guard.holds(ops))
                .map(|entry| (entry.id, entry.target.clone())),
            Link::Unlinked | Link::Megamorphic => None,
        }
    }

    fn confirm(&self, id: u32, target: &Target, ops: &[Value]) {
        let c = &self.counters;
        c.hits.set(c.hits.get() + 1);
        if c.last.get() == Some(id) {
            c.stability.set(c.stability.get() + 1);
        } else {
            c.stability.set(1);
            c.last.set(Some(id));
            *self.last_target.borrow_mut() = target.describe(ops);
        }
    }

    fn resolve(&self, rt: &Runtime, ops: &[Value], megamorphic: bool) -> LResult<(Guard, Target)> {
        let resolved = match self.kind {
            SiteKind::Call { purpose, intrinsic } => {
                resolve_call(self, rt, purpose, intrinsic, ops, megamorphic)
            }
            SiteKind::Binary(op) => resolve_binary(self, rt, op, ops),
            SiteKind::Unary(op) => resolve_unary(self, rt, op, ops),
            SiteKind::GetField => resolve_get(self, rt, ops),
            SiteKind::SetField => resolve_set(self, rt, ops),
        };
        let c = &self.counters;
        c.resolutions.set(c.resolutions.get() + 1);
        rt.stats().record_resolution();
        tracing::trace!(site = %self.label, ok = resolved.is_ok(), "resolved");
        resolved
    }

    fn install(&self, rt: &Runtime, guard: Guard, target: &Target, ops: &[Value]) {
        let c = &self.counters;
        let id = c.next_id.get();
        c.next_id.set(id + 1);
        c.stability.set(0);
        c.last.set(Some(id));
        if rt.config().trace_sites {
            *self.last_target.borrow_mut() = target.describe(ops);
        }

        let entry = Entry {
            id,
            guard,
            target: target.clone(),
        };
        let mut link = self.link.borrow_mut();
        match &*link {
            Link::Megamorphic => return,
            Link::Unlinked => {
                *link = Link::Monomorphic(entry);
                return;
            }
            Link::Monomorphic(_) | Link::Polymorphic(_) => {}
        }

        let relinks = c.relinks.get() + 1;
        c.relinks.set(relinks);
        rt.stats().record_relink();
        tracing::trace!(site = %self.label, relinks, "relinking");
        if relinks > rt.config().polymorphism_limit {
            *link = Link::Megamorphic;
            rt.stats().record_megamorphic();
            tracing::debug!(site = %self.label, relinks, "call site went megamorphic");
            return;
        }
        *link = match std::mem::replace(&mut *link, Link::Unlinked) {
            Link::Monomorphic(previous) => {
                let mut chain = SmallVec::new();
                chain.push(entry);
                chain.push(previous);
                Link::Polymorphic(chain)
            }
            Link::Polymorphic(mut chain) => {
                chain.insert(0, entry);
                Link::Polymorphic(chain)
            }
            Link::Unlinked | Link::Megamorphic => {
                fault(EngineFault::ImpossibleTransition("relinking a site with no entries"))
            }
        };
    }
}

impl fmt::Debug for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSite")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("state", &self.state())
            .finish()
    }
}
