//! Parse-tree contract
//!
//! These are the statement and expression shapes a front end hands to
//! the scope resolver. Identifiers are still names here; the resolver
//! turns them into locals, captures or global field accesses.
//! [`build`] has terse constructors for embedders and tests.

pub mod build;

use std::rc::Rc;

/// A compilation unit: an implicitly variadic function body.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub name: Rc<str>,
    pub body: Block,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `local a, b = e1, e2`
    Local {
        names: Vec<Rc<str>>,
        values: Vec<Expr>,
    },
    /// `a, t.k = e1, e2`; targets are `Name` or `Index` expressions
    Assign {
        targets: Vec<Expr>,
        values: Vec<Expr>,
    },
    /// A call in statement position; results are discarded
    Call(Expr),
    Do(Block),
    While {
        cond: Expr,
        body: Block,
    },
    /// `repeat body until cond`; `cond` sees the body's locals
    Repeat {
        body: Block,
        cond: Expr,
    },
    If {
        arms: Vec<(Expr, Block)>,
        otherwise: Option<Block>,
    },
    NumericFor {
        var: Rc<str>,
        start: Expr,
        limit: Expr,
        step: Option<Expr>,
        body: Block,
    },
    GenericFor {
        names: Vec<Rc<str>>,
        exprs: Vec<Expr>,
        body: Block,
    },
    /// `function a.b.c()` or `function a.b:m()`
    Function {
        path: Vec<Rc<str>>,
        method: Option<Rc<str>>,
        func: FunctionLiteral,
    },
    LocalFunction {
        name: Rc<str>,
        func: FunctionLiteral,
    },
    Return(Vec<Expr>),
    Break,
}

#[derive(Debug, Clone)]
pub struct FunctionLiteral {
    pub name: Option<Rc<str>>,
    pub params: Vec<Rc<str>>,
    pub vararg: bool,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    IDiv,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Len,
}

#[derive(Debug, Clone)]
pub enum TableField {
    /// `{ e }`
    Positional(Expr),
    /// `{ name = e }`
    Named(Rc<str>, Expr),
    /// `{ [k] = e }`
    Keyed(Expr, Expr),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Nil,
    True,
    False,
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Vararg,
    Name(Rc<str>),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Method(Box<Expr>, Rc<str>, Vec<Expr>),
    Function(FunctionLiteral),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Unary(UnOp, Box<Expr>),
    Table(Vec<TableField>),
    /// `(e)`: truncates a multi-valued expression to one value
    Paren(Box<Expr>),
}
