//! HIR statement and expression types
//!
//! The IR is one tagged-union tree walked by two passes: `infer` asks
//! every node for its type under an inference context, and `lower`
//! compiles the node under that same context. Every dynamic operation
//! carries the call site created for its syntactic location.

use super::binding::LocalId;
use crate::link::CallSite;
use std::fmt;
use std::rc::Rc;

/// Binary operators that reach a call site. `~=`, `>` and `>=` are built
/// from these by negation or operand swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    IDiv,
    Concat,
    Eq,
    Lt,
    Le,
}

impl BinaryOp {
    /// Metatable key consulted when no primitive path applies
    pub fn event(self) -> &'static str {
        match self {
            BinaryOp::Add => "__add",
            BinaryOp::Sub => "__sub",
            BinaryOp::Mul => "__mul",
            BinaryOp::Div => "__div",
            BinaryOp::Mod => "__mod",
            BinaryOp::Pow => "__pow",
            BinaryOp::IDiv => "__idiv",
            BinaryOp::Concat => "__concat",
            BinaryOp::Eq => "__eq",
            BinaryOp::Lt => "__lt",
            BinaryOp::Le => "__le",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        !matches!(
            self,
            BinaryOp::Concat | BinaryOp::Eq | BinaryOp::Lt | BinaryOp::Le
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Lt | BinaryOp::Le)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::IDiv => "//",
            BinaryOp::Concat => "..",
            BinaryOp::Eq => "==",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Len,
}

impl UnaryOp {
    pub fn event(self) -> &'static str {
        match self {
            UnaryOp::Neg => "__unm",
            UnaryOp::Len => "__len",
        }
    }
}

pub type Block = Vec<Stmt>;

pub enum Stmt {
    /// Declaration; `targets` come into scope after `values` are evaluated
    Local {
        targets: Vec<LocalId>,
        values: Vec<Expr>,
    },
    /// `local function f`: `f` is in scope inside its own body
    LocalFunction { target: LocalId, function: usize },
    Assign {
        targets: Vec<Place>,
        values: Vec<Expr>,
    },
    /// Expression statement (always a call)
    Expr(Expr),
    Do(Block),
    If {
        arms: Vec<(Expr, Block)>,
        otherwise: Option<Block>,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Repeat {
        body: Block,
        cond: Expr,
    },
    NumericFor {
        var: LocalId,
        start: Expr,
        limit: Expr,
        step: Option<Expr>,
        body: Block,
    },
    GenericFor {
        vars: Vec<LocalId>,
        exprs: Vec<Expr>,
        /// Call site of the per-iteration iterator call
        iterate: Rc<CallSite>,
        body: Block,
    },
    Return(Vec<Expr>),
    Break,
}

/// Assignment target
pub enum Place {
    Local(LocalId),
    Capture(usize),
    Global {
        name: Rc<str>,
        site: Rc<CallSite>,
    },
    Index {
        table: Expr,
        key: Expr,
        site: Rc<CallSite>,
    },
}

pub enum TableItem {
    Positional(Expr),
    Keyed(Expr, Expr),
}

pub enum Expr {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Vararg,
    Local(LocalId),
    Capture(usize),
    /// Field read on the globals table
    Global {
        name: Rc<str>,
        site: Rc<CallSite>,
    },
    Index {
        table: Box<Expr>,
        key: Box<Expr>,
        site: Rc<CallSite>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        site: Rc<CallSite>,
    },
    /// `object:name(args)`: `lookup` fetches the method, `site` calls it
    Method {
        object: Box<Expr>,
        name: Rc<str>,
        args: Vec<Expr>,
        lookup: Rc<CallSite>,
        site: Rc<CallSite>,
    },
    /// Closure creation; indexes the enclosing function's children
    Function(usize),
    /// Operands are evaluated left to right; `swap` hands them to the
    /// site in reverse order (`a > b` is `b < a`)
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        swap: bool,
        site: Rc<CallSite>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        site: Rc<CallSite>,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Table(Vec<TableItem>),
    Paren(Box<Expr>),
}

impl Expr {
    /// Whether this expression can produce several values when it is
    /// last in a list.
    pub fn is_multi(&self) -> bool {
        matches!(self, Expr::Call { .. } | Expr::Method { .. } | Expr::Vararg)
    }
}
