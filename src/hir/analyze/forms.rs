//! Statement analysis

use super::*;
use crate::ffi::IntrinsicId;
use crate::hir::expr::{Expr, Place, Stmt};
use crate::syntax;

impl Analyzer {
    /// A nested block with its own scope
    pub(super) fn analyze_block(&mut self, block: &syntax::Block) -> Result<Block, ResolveError> {
        self.push_scope();
        let result = self.analyze_stmts(&block.stmts);
        self.pop_scope();
        result
    }

    /// A loop body: `break` is legal inside it
    fn analyze_loop_body(&mut self, block: &syntax::Block) -> Result<Block, ResolveError> {
        self.current().loop_depth += 1;
        let result = self.analyze_block(block);
        self.current().loop_depth -= 1;
        result
    }

    pub(super) fn analyze_stmts(&mut self, stmts: &[syntax::Stmt]) -> Result<Block, ResolveError> {
        stmts.iter().map(|s| self.analyze_stmt(s)).collect()
    }

    fn analyze_stmt(&mut self, stmt: &syntax::Stmt) -> Result<Stmt, ResolveError> {
        match stmt {
            syntax::Stmt::Local { names, values } => {
                let values = self.analyze_exprs(values)?;
                let targets = names.iter().map(|n| self.declare(n.clone())).collect();
                Ok(Stmt::Local { targets, values })
            }

            syntax::Stmt::LocalFunction { name, func } => {
                let target = self.declare(name.clone());
                let function = self.analyze_function(func, Some(name.clone()), false)?;
                // The closure is created before the name is bound, so a
                // self-reference must go through a shared cell.
                if let Some(local) = self.builder_of(Resolved::Local(target)) {
                    if local.is_captured() {
                        local.mark_mutated();
                    }
                }
                Ok(Stmt::LocalFunction { target, function })
            }

            syntax::Stmt::Assign { targets, values } => {
                let targets = targets
                    .iter()
                    .map(|t| self.analyze_place(t))
                    .collect::<Result<Vec<_>, _>>()?;
                let values = self.analyze_exprs(values)?;
                Ok(Stmt::Assign { targets, values })
            }

            syntax::Stmt::Call(expr) => Ok(Stmt::Expr(self.analyze_expr(expr)?)),

            syntax::Stmt::Do(block) => Ok(Stmt::Do(self.analyze_block(block)?)),

            syntax::Stmt::If { arms, otherwise } => {
                let arms = arms
                    .iter()
                    .map(|(cond, body)| Ok((self.analyze_expr(cond)?, self.analyze_block(body)?)))
                    .collect::<Result<Vec<_>, ResolveError>>()?;
                let otherwise = match otherwise {
                    Some(block) => Some(self.analyze_block(block)?),
                    None => None,
                };
                Ok(Stmt::If { arms, otherwise })
            }

            syntax::Stmt::While { cond, body } => {
                let cond = self.analyze_expr(cond)?;
                let body = self.analyze_loop_body(body)?;
                Ok(Stmt::While { cond, body })
            }

            syntax::Stmt::Repeat { body, cond } => {
                // The condition sees the body's locals
                self.push_scope();
                self.current().loop_depth += 1;
                let body = self.analyze_stmts(&body.stmts);
                self.current().loop_depth -= 1;
                let cond = body.and_then(|body| Ok((body, self.analyze_expr(cond)?)));
                self.pop_scope();
                let (body, cond) = cond?;
                Ok(Stmt::Repeat { body, cond })
            }

            syntax::Stmt::NumericFor {
                var,
                start,
                limit,
                step,
                body,
            } => {
                let start = self.analyze_expr(start)?;
                let limit = self.analyze_expr(limit)?;
                let step = match step {
                    Some(step) => Some(self.analyze_expr(step)?),
                    None => None,
                };
                self.push_scope();
                let var = self.declare(var.clone());
                let body = self.analyze_loop_body(body);
                self.pop_scope();
                Ok(Stmt::NumericFor {
                    var,
                    start,
                    limit,
                    step,
                    body: body?,
                })
            }

            syntax::Stmt::GenericFor { names, exprs, body } => {
                let exprs = self.analyze_iteration_exprs(exprs)?;
                let iterate = self.site(SiteKind::iterate(), "for iterator");
                self.push_scope();
                let vars = names.iter().map(|n| self.declare(n.clone())).collect();
                let body = self.analyze_loop_body(body);
                self.pop_scope();
                Ok(Stmt::GenericFor {
                    vars,
                    exprs,
                    iterate,
                    body: body?,
                })
            }

            syntax::Stmt::Function { path, method, func } => {
                let mut target = syntax::Expr::Name(path[0].clone());
                for key in path[1..].iter().chain(method.iter()) {
                    target = syntax::Expr::Index(
                        Box::new(target),
                        Box::new(syntax::Expr::Str(key.clone())),
                    );
                }
                let place = self.analyze_place(&target)?;
                let function = self.analyze_function(func, None, method.is_some())?;
                Ok(Stmt::Assign {
                    targets: vec![place],
                    values: vec![Expr::Function(function)],
                })
            }

            syntax::Stmt::Return(values) => Ok(Stmt::Return(self.analyze_exprs(values)?)),

            syntax::Stmt::Break => {
                let state = self.current();
                if state.loop_depth == 0 {
                    return Err(ResolveError::BreakOutsideLoop {
                        function: state.name.to_string(),
                    });
                }
                Ok(Stmt::Break)
            }
        }
    }

    /// The explist of a generic `for`. A lone call producing the iterator
    /// triple is linked with the iteration intrinsic, which lets host
    /// functions offer a stateful iterator overload to loops only.
    fn analyze_iteration_exprs(&mut self, exprs: &[syntax::Expr]) -> Result<Vec<Expr>, ResolveError> {
        match exprs {
            [syntax::Expr::Call(callee, args)] => {
                let call = self.analyze_call(callee, args, Some(IntrinsicId::Iteration))?;
                Ok(vec![call])
            }
            _ => self.analyze_exprs(exprs),
        }
    }

    fn analyze_place(&mut self, target: &syntax::Expr) -> Result<Place, ResolveError> {
        match target {
            syntax::Expr::Name(name) => {
                let resolved = self.resolve(name);
                if let Some(local) = self.builder_of(resolved) {
                    local.mark_mutated();
                }
                Ok(match resolved {
                    Resolved::Local(id) => Place::Local(id),
                    Resolved::Capture(index) => Place::Capture(index),
                    Resolved::Global => Place::Global {
                        name: name.clone(),
                        site: self.site(SiteKind::SetField, name),
                    },
                })
            }
            syntax::Expr::Index(table, key) => {
                let label = key_label(key);
                let table = self.analyze_expr(table)?;
                let key = self.analyze_expr(key)?;
                Ok(Place::Index {
                    table,
                    key,
                    site: self.site(SiteKind::SetField, &label),
                })
            }
            syntax::Expr::Call(..) | syntax::Expr::Method(..) => {
                Err(ResolveError::InvalidAssignTarget { what: "call" })
            }
            syntax::Expr::Paren(_) => Err(ResolveError::InvalidAssignTarget {
                what: "parenthesized expression",
            }),
            _ => Err(ResolveError::InvalidAssignTarget { what: "value" }),
        }
    }
}

/// Site label for a field access: the key if it is a constant string.
pub(super) fn key_label(key: &syntax::Expr) -> String {
    match key {
        syntax::Expr::Str(s) => s.to_string(),
        _ => "[]".to_string(),
    }
}
