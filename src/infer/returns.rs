//! Definite-return analysis

use crate::hir::{Block, Stmt};

/// Whether every path through `block` ends in a `return`.
///
/// Conservative: an `if` needs an `else` and every arm returning, `while`
/// and both `for` forms may run zero times, and a `repeat` counts only if
/// its body returns without any `break` out of that loop.
pub fn has_return(block: &Block) -> bool {
    block.iter().any(stmt_returns)
}

fn stmt_returns(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) => true,
        Stmt::Do(body) => has_return(body),
        Stmt::If { arms, otherwise } => match otherwise {
            Some(otherwise) => has_return(otherwise) && arms.iter().all(|(_, body)| has_return(body)),
            None => false,
        },
        Stmt::Repeat { body, .. } => has_return(body) && !breaks(body),
        Stmt::While { .. }
        | Stmt::NumericFor { .. }
        | Stmt::GenericFor { .. }
        | Stmt::Local { .. }
        | Stmt::LocalFunction { .. }
        | Stmt::Assign { .. }
        | Stmt::Expr(_)
        | Stmt::Break => false,
    }
}

/// Whether `block` contains a `break` that leaves the enclosing loop.
fn breaks(block: &Block) -> bool {
    block.iter().any(|stmt| match stmt {
        Stmt::Break => true,
        Stmt::Do(body) => breaks(body),
        Stmt::If { arms, otherwise } => {
            arms.iter().any(|(_, body)| breaks(body)) || otherwise.as_ref().is_some_and(breaks)
        }
        _ => false,
    })
}
