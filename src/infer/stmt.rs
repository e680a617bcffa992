//! Statement walk: writes and returns

use super::InferenceContext;
use crate::hir::{Block, Expr, Place, Stmt};
use crate::types::Type;

impl InferenceContext {
    pub(super) fn block(&mut self, block: &Block) {
        for stmt in block {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Local { targets, values } => {
                let types: Vec<Type> = (0..targets.len())
                    .map(|i| self.nth_value_type(values, i))
                    .collect();
                for (target, ty) in targets.iter().zip(types) {
                    self.write(*target, ty);
                }
            }
            Stmt::LocalFunction { target, .. } => self.write(*target, Type::Function(None)),
            Stmt::Assign { targets, values } => {
                let types: Vec<(usize, Type)> = targets
                    .iter()
                    .enumerate()
                    .filter(|(_, place)| matches!(place, Place::Local(_)))
                    .map(|(i, _)| (i, self.nth_value_type(values, i)))
                    .collect();
                for (i, ty) in types {
                    if let Place::Local(id) = &targets[i] {
                        self.write(*id, ty);
                    }
                }
            }
            Stmt::Expr(_) | Stmt::Break => {}
            Stmt::Do(body) => self.block(body),
            Stmt::If { arms, otherwise } => {
                for (_, body) in arms {
                    self.block(body);
                }
                if let Some(body) = otherwise {
                    self.block(body);
                }
            }
            Stmt::While { body, .. } | Stmt::Repeat { body, .. } => self.block(body),
            Stmt::NumericFor {
                var,
                start,
                limit,
                step,
                body,
            } => {
                let ty = self.numeric_for_type(start, limit, step.as_ref());
                self.write(*var, ty);
                self.block(body);
            }
            Stmt::GenericFor { vars, body, .. } => {
                for var in vars {
                    self.write(*var, Type::Unknown);
                }
                self.block(body);
            }
            Stmt::Return(values) => {
                let ty = self.list_type(values);
                self.record_return(ty);
            }
        }
    }

    /// Control variable type of a numeric `for`: Integer when start and
    /// step are integers, Float when every bound is a number.
    pub fn numeric_for_type(&self, start: &Expr, limit: &Expr, step: Option<&Expr>) -> Type {
        let start = self.expr_type(start);
        let limit = self.expr_type(limit);
        let step = step.map_or(Type::Integer, |s| self.expr_type(s));
        match (&start, &limit, &step) {
            (Type::Integer, l, Type::Integer) if l.is_number() => Type::Integer,
            (s, l, t) if s.is_number() && l.is_number() && t.is_number() => Type::Float,
            _ => Type::Unknown,
        }
    }
}
