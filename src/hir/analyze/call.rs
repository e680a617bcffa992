//! Expression and call analysis

use super::forms::key_label;
use super::*;
use crate::ffi::IntrinsicId;
use crate::hir::expr::{BinaryOp, Expr, TableItem, UnaryOp};
use crate::syntax::{self, BinOp, TableField, UnOp};

impl Analyzer {
    pub(super) fn analyze_exprs(&mut self, exprs: &[syntax::Expr]) -> Result<Vec<Expr>, ResolveError> {
        exprs.iter().map(|e| self.analyze_expr(e)).collect()
    }

    pub(super) fn analyze_expr(&mut self, expr: &syntax::Expr) -> Result<Expr, ResolveError> {
        Ok(match expr {
            syntax::Expr::Nil => Expr::Nil,
            syntax::Expr::True => Expr::Bool(true),
            syntax::Expr::False => Expr::Bool(false),
            syntax::Expr::Int(i) => Expr::Int(*i),
            syntax::Expr::Float(f) => Expr::Float(*f),
            syntax::Expr::Str(s) => Expr::Str(s.clone()),

            syntax::Expr::Vararg => {
                let state = self.current();
                if !state.vararg {
                    return Err(ResolveError::VarargOutsideVarargFunction {
                        function: state.name.to_string(),
                    });
                }
                Expr::Vararg
            }

            syntax::Expr::Name(name) => match self.resolve(name) {
                Resolved::Local(id) => Expr::Local(id),
                Resolved::Capture(index) => Expr::Capture(index),
                Resolved::Global => Expr::Global {
                    name: name.clone(),
                    site: self.site(SiteKind::GetField, name),
                },
            },

            syntax::Expr::Index(table, key) => {
                let label = key_label(key);
                let table = self.analyze_expr(table)?;
                let key = self.analyze_expr(key)?;
                Expr::Index {
                    table: Box::new(table),
                    key: Box::new(key),
                    site: self.site(SiteKind::GetField, &label),
                }
            }

            syntax::Expr::Call(callee, args) => self.analyze_call(callee, args, None)?,

            syntax::Expr::Method(object, name, args) => {
                let object = self.analyze_expr(object)?;
                let args = self.analyze_exprs(args)?;
                Expr::Method {
                    object: Box::new(object),
                    name: name.clone(),
                    args,
                    lookup: self.site(SiteKind::GetField, name),
                    site: self.site(SiteKind::call(), name),
                }
            }

            syntax::Expr::Function(func) => {
                Expr::Function(self.analyze_function(func, None, false)?)
            }

            syntax::Expr::Binary(op, lhs, rhs) => self.analyze_binary(*op, lhs, rhs)?,

            syntax::Expr::Unary(op, operand) => {
                let operand = Box::new(self.analyze_expr(operand)?);
                match op {
                    UnOp::Not => Expr::Not(operand),
                    UnOp::Neg => Expr::Unary {
                        op: UnaryOp::Neg,
                        operand,
                        site: self.site(SiteKind::Unary(UnaryOp::Neg), "unary -"),
                    },
                    UnOp::Len => Expr::Unary {
                        op: UnaryOp::Len,
                        operand,
                        site: self.site(SiteKind::Unary(UnaryOp::Len), "#"),
                    },
                }
            }

            syntax::Expr::Table(fields) => {
                let items = fields
                    .iter()
                    .map(|field| {
                        Ok(match field {
                            TableField::Positional(e) => TableItem::Positional(self.analyze_expr(e)?),
                            TableField::Named(k, e) => {
                                TableItem::Keyed(Expr::Str(k.clone()), self.analyze_expr(e)?)
                            }
                            TableField::Keyed(k, e) => {
                                TableItem::Keyed(self.analyze_expr(k)?, self.analyze_expr(e)?)
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, ResolveError>>()?;
                Expr::Table(items)
            }

            syntax::Expr::Paren(inner) => Expr::Paren(Box::new(self.analyze_expr(inner)?)),
        })
    }

    pub(super) fn analyze_call(
        &mut self,
        callee: &syntax::Expr,
        args: &[syntax::Expr],
        intrinsic: Option<IntrinsicId>,
    ) -> Result<Expr, ResolveError> {
        let label = match callee {
            syntax::Expr::Name(name) => name.to_string(),
            syntax::Expr::Index(_, key) => key_label(key),
            _ => "?".to_string(),
        };
        let callee = self.analyze_expr(callee)?;
        let args = self.analyze_exprs(args)?;
        let kind = match intrinsic {
            Some(id) => SiteKind::intrinsic_call(id),
            None => SiteKind::call(),
        };
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            site: self.site(kind, &label),
        })
    }

    fn analyze_binary(
        &mut self,
        op: BinOp,
        lhs: &syntax::Expr,
        rhs: &syntax::Expr,
    ) -> Result<Expr, ResolveError> {
        let lhs = Box::new(self.analyze_expr(lhs)?);
        let rhs = Box::new(self.analyze_expr(rhs)?);
        let (op, swap, negate) = match op {
            BinOp::And => return Ok(Expr::And(lhs, rhs)),
            BinOp::Or => return Ok(Expr::Or(lhs, rhs)),
            BinOp::Add => (BinaryOp::Add, false, false),
            BinOp::Sub => (BinaryOp::Sub, false, false),
            BinOp::Mul => (BinaryOp::Mul, false, false),
            BinOp::Div => (BinaryOp::Div, false, false),
            BinOp::Mod => (BinaryOp::Mod, false, false),
            BinOp::Pow => (BinaryOp::Pow, false, false),
            BinOp::IDiv => (BinaryOp::IDiv, false, false),
            BinOp::Concat => (BinaryOp::Concat, false, false),
            BinOp::Eq => (BinaryOp::Eq, false, false),
            BinOp::Ne => (BinaryOp::Eq, false, true),
            BinOp::Lt => (BinaryOp::Lt, false, false),
            BinOp::Le => (BinaryOp::Le, false, false),
            BinOp::Gt => (BinaryOp::Lt, true, false),
            BinOp::Ge => (BinaryOp::Le, true, false),
        };
        let binary = Expr::Binary {
            op,
            lhs,
            rhs,
            swap,
            site: self.site(SiteKind::Binary(op), op.symbol()),
        };
        Ok(if negate {
            Expr::Not(Box::new(binary))
        } else {
            binary
        })
    }
}
