//! Expression typing

use super::InferenceContext;
use crate::arithmetic::int_result;
use crate::hir::{BinaryOp, Expr, UnaryOp};
use crate::types::Type;

impl InferenceContext {
    /// Type of an expression truncated to one value.
    pub fn expr_type(&self, expr: &Expr) -> Type {
        match expr {
            Expr::Nil => Type::Nil,
            Expr::Bool(_) => Type::Boolean,
            Expr::Int(_) => Type::Integer,
            Expr::Float(_) => Type::Float,
            Expr::Str(_) => Type::String,
            Expr::Vararg => self.varargs().first().cloned().unwrap_or(Type::Nil),
            Expr::Local(id) => self.local_type(*id),
            Expr::Capture(index) => self.capture_type(*index),
            Expr::Global { .. } | Expr::Index { .. } | Expr::Call { .. } | Expr::Method { .. } => {
                Type::Unknown
            }
            Expr::Function(_) => Type::Function(None),
            Expr::Binary { op, lhs, rhs, .. } => {
                binary_type(*op, &self.expr_type(lhs), &self.expr_type(rhs))
            }
            Expr::Unary { op, operand, .. } => unary_type(*op, &self.expr_type(operand)),
            Expr::Not(_) => Type::Boolean,
            Expr::And(lhs, rhs) => {
                let (l, r) = (self.expr_type(lhs), self.expr_type(rhs));
                match l {
                    ref t if always_truthy(t) => r,
                    Type::Nil => Type::Nil,
                    l => l.join(&r),
                }
            }
            Expr::Or(lhs, rhs) => {
                let (l, r) = (self.expr_type(lhs), self.expr_type(rhs));
                match l {
                    ref t if always_truthy(t) => l,
                    Type::Nil => r,
                    l => l.join(&r),
                }
            }
            Expr::Table(_) => Type::Table,
            Expr::Paren(inner) => self.expr_type(inner),
        }
    }

    /// Type of an expression in a position that keeps all its values.
    pub fn multi_type(&self, expr: &Expr) -> Type {
        match expr {
            Expr::Call { .. } | Expr::Method { .. } => Type::Unknown,
            Expr::Vararg => Type::tuple(self.varargs().iter().cloned()),
            other => self.expr_type(other),
        }
    }

    /// Type of an expression list whose last element may expand.
    pub fn list_type(&self, exprs: &[Expr]) -> Type {
        let Some((last, init)) = exprs.split_last() else {
            return Type::tuple([]);
        };
        let mut items: Vec<Type> = init.iter().map(|e| self.expr_type(e)).collect();
        if last.is_multi() {
            match self.multi_type(last) {
                Type::Unknown => return Type::Unknown,
                Type::Tuple(tail) => items.extend(tail.iter().cloned()),
                single => items.push(single),
            }
        } else {
            items.push(self.expr_type(last));
        }
        if items.len() == 1 {
            items.pop().unwrap_or(Type::Nil)
        } else {
            Type::tuple(items)
        }
    }

    /// Type of the `index`th value an expression list produces.
    pub fn nth_value_type(&self, exprs: &[Expr], index: usize) -> Type {
        let Some(last) = exprs.len().checked_sub(1) else {
            return Type::Nil;
        };
        if index < last {
            return self.expr_type(&exprs[index]);
        }
        if exprs[last].is_multi() {
            self.multi_type(&exprs[last]).nth(index - last)
        } else if index == last {
            self.expr_type(&exprs[last])
        } else {
            Type::Nil
        }
    }
}

/// Whether every value of this type is truthy.
fn always_truthy(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Integer | Type::Float | Type::String | Type::Table | Type::Function(_)
    )
}

pub(crate) fn binary_type(op: BinaryOp, lhs: &Type, rhs: &Type) -> Type {
    match op {
        BinaryOp::Eq | BinaryOp::Lt | BinaryOp::Le => Type::Boolean,
        BinaryOp::Concat => {
            let piece = |t: &Type| matches!(t, Type::String | Type::Integer | Type::Float);
            if piece(lhs) && piece(rhs) {
                Type::String
            } else {
                Type::Unknown
            }
        }
        op => match (lhs, rhs) {
            (Type::Integer, Type::Integer) if int_result(op) => Type::Integer,
            (l, r) if l.is_number() && r.is_number() => Type::Float,
            _ => Type::Unknown,
        },
    }
}

pub(crate) fn unary_type(op: UnaryOp, operand: &Type) -> Type {
    match (op, operand) {
        (UnaryOp::Neg, Type::Integer) => Type::Integer,
        (UnaryOp::Neg, Type::Float) => Type::Float,
        (UnaryOp::Len, Type::String) => Type::Integer,
        _ => Type::Unknown,
    }
}
