//! Constructors for parse trees.
//!
//! ```
//! use wane::syntax::build::*;
//!
//! // local function sq(x) return x * x end
//! let stmt = local_function("sq", &["x"], vec![ret(vec![mul(name("x"), name("x"))])]);
//! ```

use super::*;

pub fn chunk(stmts: Vec<Stmt>) -> Chunk {
    Chunk {
        name: Rc::from("main"),
        body: Block::new(stmts),
    }
}

pub fn block(stmts: Vec<Stmt>) -> Block {
    Block::new(stmts)
}

// Statements

pub fn local(names: &[&str], values: Vec<Expr>) -> Stmt {
    Stmt::Local {
        names: names.iter().map(|n| Rc::from(*n)).collect(),
        values,
    }
}

pub fn assign(targets: Vec<Expr>, values: Vec<Expr>) -> Stmt {
    Stmt::Assign { targets, values }
}

/// `name = value`
pub fn set(target: &str, value: Expr) -> Stmt {
    assign(vec![name(target)], vec![value])
}

pub fn call_stmt(callee: Expr, args: Vec<Expr>) -> Stmt {
    Stmt::Call(call(callee, args))
}

pub fn do_block(stmts: Vec<Stmt>) -> Stmt {
    Stmt::Do(Block::new(stmts))
}

pub fn while_loop(cond: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While {
        cond,
        body: Block::new(body),
    }
}

pub fn repeat_until(body: Vec<Stmt>, cond: Expr) -> Stmt {
    Stmt::Repeat {
        body: Block::new(body),
        cond,
    }
}

pub fn if_then(cond: Expr, then: Vec<Stmt>) -> Stmt {
    Stmt::If {
        arms: vec![(cond, Block::new(then))],
        otherwise: None,
    }
}

pub fn if_else(cond: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt>) -> Stmt {
    Stmt::If {
        arms: vec![(cond, Block::new(then))],
        otherwise: Some(Block::new(otherwise)),
    }
}

pub fn numeric_for(var: &str, start: Expr, limit: Expr, step: Option<Expr>, body: Vec<Stmt>) -> Stmt {
    Stmt::NumericFor {
        var: Rc::from(var),
        start,
        limit,
        step,
        body: Block::new(body),
    }
}

pub fn generic_for(names: &[&str], exprs: Vec<Expr>, body: Vec<Stmt>) -> Stmt {
    Stmt::GenericFor {
        names: names.iter().map(|n| Rc::from(*n)).collect(),
        exprs,
        body: Block::new(body),
    }
}

pub fn local_function(name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
    Stmt::LocalFunction {
        name: Rc::from(name),
        func: literal(Some(name), params, false, body),
    }
}

/// `function a.b.c(params) body end`
pub fn function_stmt(path: &[&str], params: &[&str], body: Vec<Stmt>) -> Stmt {
    Stmt::Function {
        path: path.iter().map(|n| Rc::from(*n)).collect(),
        method: None,
        func: literal(Some(&path.join(".")), params, false, body),
    }
}

/// `function a.b:m(params) body end`
pub fn method_stmt(path: &[&str], method: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
    Stmt::Function {
        path: path.iter().map(|n| Rc::from(*n)).collect(),
        method: Some(Rc::from(method)),
        func: literal(
            Some(&format!("{}:{}", path.join("."), method)),
            params,
            false,
            body,
        ),
    }
}

pub fn ret(values: Vec<Expr>) -> Stmt {
    Stmt::Return(values)
}

pub fn brk() -> Stmt {
    Stmt::Break
}

// Expressions

pub fn nil() -> Expr {
    Expr::Nil
}

pub fn boolean(b: bool) -> Expr {
    if b {
        Expr::True
    } else {
        Expr::False
    }
}

pub fn int(i: i64) -> Expr {
    Expr::Int(i)
}

pub fn float(f: f64) -> Expr {
    Expr::Float(f)
}

pub fn string(s: &str) -> Expr {
    Expr::Str(Rc::from(s))
}

pub fn vararg() -> Expr {
    Expr::Vararg
}

pub fn name(n: &str) -> Expr {
    Expr::Name(Rc::from(n))
}

pub fn index(table: Expr, key: Expr) -> Expr {
    Expr::Index(Box::new(table), Box::new(key))
}

/// `table.field`
pub fn field(table: Expr, field: &str) -> Expr {
    index(table, string(field))
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call(Box::new(callee), args)
}

pub fn method(object: Expr, method: &str, args: Vec<Expr>) -> Expr {
    Expr::Method(Box::new(object), Rc::from(method), args)
}

fn literal(name: Option<&str>, params: &[&str], vararg: bool, body: Vec<Stmt>) -> FunctionLiteral {
    FunctionLiteral {
        name: name.map(Rc::from),
        params: params.iter().map(|p| Rc::from(*p)).collect(),
        vararg,
        body: Block::new(body),
    }
}

pub fn function(params: &[&str], body: Vec<Stmt>) -> Expr {
    Expr::Function(literal(None, params, false, body))
}

pub fn variadic_function(params: &[&str], body: Vec<Stmt>) -> Expr {
    Expr::Function(literal(None, params, true, body))
}

pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(op, Box::new(lhs), Box::new(rhs))
}

pub fn add(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::Add, lhs, rhs)
}

pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::Sub, lhs, rhs)
}

pub fn mul(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::Mul, lhs, rhs)
}

pub fn div(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::Div, lhs, rhs)
}

pub fn concat(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::Concat, lhs, rhs)
}

pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::Eq, lhs, rhs)
}

pub fn lt(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::Lt, lhs, rhs)
}

pub fn le(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::Le, lhs, rhs)
}

pub fn and(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::And, lhs, rhs)
}

pub fn or(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinOp::Or, lhs, rhs)
}

pub fn unary(op: UnOp, operand: Expr) -> Expr {
    Expr::Unary(op, Box::new(operand))
}

pub fn neg(operand: Expr) -> Expr {
    unary(UnOp::Neg, operand)
}

pub fn not(operand: Expr) -> Expr {
    unary(UnOp::Not, operand)
}

pub fn len(operand: Expr) -> Expr {
    unary(UnOp::Len, operand)
}

pub fn paren(e: Expr) -> Expr {
    Expr::Paren(Box::new(e))
}

/// `{ e1, e2, ... }`
pub fn list(items: Vec<Expr>) -> Expr {
    Expr::Table(items.into_iter().map(TableField::Positional).collect())
}

/// `{ k1 = e1, k2 = e2 }`
pub fn record(fields: Vec<(&str, Expr)>) -> Expr {
    Expr::Table(
        fields
            .into_iter()
            .map(|(k, v)| TableField::Named(Rc::from(k), v))
            .collect(),
    )
}

pub fn table(fields: Vec<TableField>) -> Expr {
    Expr::Table(fields)
}
