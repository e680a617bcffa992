//! Expression lowering

use super::code::{Code, Eval};
use super::frame::Slot;
use super::Lowerer;
use crate::arithmetic::{cmp_int_float, concat_values, float_op, int_op, int_result, order_holds};
use crate::error::{fault, Diagnostic, EngineFault};
use crate::hir::{BinaryOp, Expr, LocalId, TableItem, UnaryOp};
use crate::link::{CallSite, Operands};
use crate::types::Type;
use crate::value::{Multi, Table, TableKey, Value};
use std::rc::Rc;

/// One constructor item of a table literal.
enum Item {
    Positional(Eval<Value>),
    Spread(Eval<Multi>),
    Keyed(Eval<Value>, Eval<Value>),
}

impl Lowerer<'_> {
    /// Compile an expression truncated to one value, in the
    /// representation of its inferred type.
    pub(super) fn expr(&self, expr: &Expr) -> Code {
        let ty = self.ctx.expr_type(expr);
        self.expr_code(expr).conform(&ty)
    }

    pub(super) fn value(&self, expr: &Expr) -> Eval<Value> {
        self.expr(expr).boxed()
    }

    fn expr_code(&self, expr: &Expr) -> Code {
        match expr {
            Expr::Nil => Code::Value(Box::new(|_| Ok(Value::Nil))),
            Expr::Bool(b) => {
                let b = *b;
                Code::Bool(Box::new(move |_| Ok(b)))
            }
            Expr::Int(i) => {
                let i = *i;
                Code::Int(Box::new(move |_| Ok(i)))
            }
            Expr::Float(x) => {
                let x = *x;
                Code::Float(Box::new(move |_| Ok(x)))
            }
            Expr::Str(s) => {
                let v = Value::Str(s.clone());
                Code::Value(Box::new(move |_| Ok(v.clone())))
            }
            Expr::Vararg => Code::Value(Box::new(|f| {
                Ok(f.varargs.first().cloned().unwrap_or(Value::Nil))
            })),
            Expr::Local(id) => self.read_local(*id),
            Expr::Capture(index) => {
                let index = *index;
                Code::Value(Box::new(move |f| Ok(f.captures[index].get())))
            }
            Expr::Global { name, site } => {
                let key = Value::Str(name.clone());
                let site = site.clone();
                Code::Value(Box::new(move |f| {
                    let globals = Value::Table(f.rt.globals().clone());
                    Ok(site.invoke(f.rt, &[globals, key.clone()])?.into_first())
                }))
            }
            Expr::Index { table, key, site } => {
                let (table, key) = (self.value(table), self.value(key));
                let site = site.clone();
                Code::Value(Box::new(move |f| {
                    let t = table(f)?;
                    let k = key(f)?;
                    Ok(site.invoke(f.rt, &[t, k])?.into_first())
                }))
            }
            Expr::Call { .. } | Expr::Method { .. } => {
                let values = self.multi(expr);
                Code::Value(Box::new(move |f| Ok(values(f)?.into_first())))
            }
            Expr::Function(index) => Code::Value(self.closure(*index)),
            Expr::Binary {
                op,
                lhs,
                rhs,
                swap,
                site,
            } => self.binary(*op, lhs, rhs, *swap, site),
            Expr::Unary { op, operand, site } => self.unary(*op, operand, site),
            Expr::Not(operand) => {
                let operand = self.expr(operand).truth();
                Code::Bool(Box::new(move |f| Ok(!operand(f)?)))
            }
            Expr::And(lhs, rhs) => self.logical(lhs, rhs, true),
            Expr::Or(lhs, rhs) => self.logical(lhs, rhs, false),
            Expr::Table(items) => self.table(items),
            Expr::Paren(inner) => self.expr(inner),
        }
    }

    fn read_local(&self, id: LocalId) -> Code {
        match self.layout.slot(id) {
            Slot::Int(s) => Code::Int(Box::new(move |f| Ok(f.ints[s]))),
            Slot::Float(s) => Code::Float(Box::new(move |f| Ok(f.floats[s]))),
            Slot::Bool(s) => Code::Bool(Box::new(move |f| Ok(f.bools[s]))),
            Slot::Value(s) => Code::Value(Box::new(move |f| Ok(f.values[s].clone()))),
            Slot::Cell(s) => Code::Value(Box::new(move |f| Ok(f.cells[s].borrow().clone()))),
        }
    }

    /// `and` (`short_on_false`) or `or`: the right side runs only when
    /// the left side does not decide the result.
    fn logical(&self, lhs: &Expr, rhs: &Expr, short_on_false: bool) -> Code {
        match (self.expr(lhs), self.expr(rhs)) {
            (Code::Bool(l), Code::Bool(r)) => Code::Bool(if short_on_false {
                Box::new(move |f| Ok(l(f)? && r(f)?))
            } else {
                Box::new(move |f| Ok(l(f)? || r(f)?))
            }),
            (l, r) => {
                let (l, r) = (l.boxed(), r.boxed());
                Code::Value(Box::new(move |f| {
                    let left = l(f)?;
                    if left.truthy() == short_on_false {
                        r(f)
                    } else {
                        Ok(left)
                    }
                }))
            }
        }
    }

    fn binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr, swap: bool, site: &Rc<CallSite>) -> Code {
        let (lt, rt) = (self.ctx.expr_type(lhs), self.ctx.expr_type(rhs));
        let numbers = lt.is_number() && rt.is_number();

        if op.is_arithmetic() && numbers {
            if lt == Type::Integer && rt == Type::Integer && int_result(op) {
                let (a, b) = (self.expr(lhs).int(), self.expr(rhs).int());
                return Code::Int(match op {
                    BinaryOp::Add => Box::new(move |f| Ok(a(f)?.wrapping_add(b(f)?))),
                    BinaryOp::Sub => Box::new(move |f| Ok(a(f)?.wrapping_sub(b(f)?))),
                    BinaryOp::Mul => Box::new(move |f| Ok(a(f)?.wrapping_mul(b(f)?))),
                    _ => Box::new(move |f| {
                        let (x, y) = (a(f)?, b(f)?);
                        int_op(op, x, y).map_err(|d| f.rt.error(d))
                    }),
                });
            }
            let (a, b) = (self.expr(lhs).float(), self.expr(rhs).float());
            return Code::Float(Box::new(move |f| {
                let (x, y) = (a(f)?, b(f)?);
                Ok(float_op(op, x, y))
            }));
        }

        let piece = |t: &Type| matches!(t, Type::String | Type::Integer | Type::Float);
        match op {
            BinaryOp::Concat if piece(&lt) && piece(&rt) => {
                let (a, b) = (self.value(lhs), self.value(rhs));
                return Code::Value(Box::new(move |f| {
                    let (x, y) = (a(f)?, b(f)?);
                    Ok(concat_values(&x, &y).unwrap_or_else(|| {
                        fault(EngineFault::TypeDisagreement {
                            expected: "string or number".to_string(),
                            found: format!("{} .. {}", x.type_name(), y.type_name()),
                        })
                    }))
                }));
            }
            BinaryOp::Lt | BinaryOp::Le if numbers => {
                let strict = op == BinaryOp::Lt;
                let cmp = move |x, y| if strict { x < y } else { x <= y };
                if lt == Type::Integer && rt == Type::Integer {
                    let (a, b) = (self.expr(lhs).int(), self.expr(rhs).int());
                    return Code::Bool(Box::new(move |f| {
                        let (x, y) = (a(f)?, b(f)?);
                        Ok(if swap { cmp_i(strict, y, x) } else { cmp_i(strict, x, y) })
                    }));
                }
                if lt == Type::Integer || rt == Type::Integer {
                    return self.mixed_compare(lhs, rhs, lt == Type::Integer, swap, strict);
                }
                let (a, b) = (self.expr(lhs).float(), self.expr(rhs).float());
                return Code::Bool(Box::new(move |f| {
                    let (x, y) = (a(f)?, b(f)?);
                    Ok(if swap { cmp(y, x) } else { cmp(x, y) })
                }));
            }
            BinaryOp::Lt | BinaryOp::Le if lt == Type::String && rt == Type::String => {
                let strict = op == BinaryOp::Lt;
                let (a, b) = (self.value(lhs), self.value(rhs));
                return Code::Bool(Box::new(move |f| {
                    let (x, y) = (a(f)?, b(f)?);
                    let (x, y) = if swap { (y, x) } else { (x, y) };
                    Ok(crate::arithmetic::less(&x, &y, strict).unwrap_or(false))
                }));
            }
            BinaryOp::Eq if lt == Type::Integer && rt == Type::Integer => {
                let (a, b) = (self.expr(lhs).int(), self.expr(rhs).int());
                return Code::Bool(Box::new(move |f| Ok(a(f)? == b(f)?)));
            }
            BinaryOp::Eq if !(may_be_table(&lt) && may_be_table(&rt)) => {
                let (a, b) = (self.value(lhs), self.value(rhs));
                return Code::Bool(Box::new(move |f| {
                    let (x, y) = (a(f)?, b(f)?);
                    Ok(x.raw_equal(&y))
                }));
            }
            _ => {}
        }

        let (a, b) = (self.value(lhs), self.value(rhs));
        let site = site.clone();
        let eval: Eval<Value> = Box::new(move |f| {
            let (x, y) = (a(f)?, b(f)?);
            let operands = if swap { [y, x] } else { [x, y] };
            Ok(site.invoke(f.rt, &operands)?.into_first())
        });
        if op.is_comparison() {
            Code::Bool(Box::new(move |f| Ok(eval(f)?.truthy())))
        } else {
            Code::Value(eval)
        }
    }

    fn unary(&self, op: UnaryOp, operand: &Expr, site: &Rc<CallSite>) -> Code {
        match (op, self.ctx.expr_type(operand)) {
            (UnaryOp::Neg, Type::Integer) => {
                let a = self.expr(operand).int();
                Code::Int(Box::new(move |f| Ok(a(f)?.wrapping_neg())))
            }
            (UnaryOp::Neg, Type::Float) => {
                let a = self.expr(operand).float();
                Code::Float(Box::new(move |f| Ok(-a(f)?)))
            }
            (UnaryOp::Len, Type::String) => {
                let a = self.value(operand);
                Code::Int(Box::new(move |f| match a(f)? {
                    Value::Str(s) => Ok(s.len() as i64),
                    other => fault(EngineFault::Unbox {
                        expected: "string",
                        found: other.type_name(),
                    }),
                }))
            }
            _ => {
                let a = self.value(operand);
                let site = site.clone();
                Code::Value(Box::new(move |f| {
                    let x = a(f)?;
                    Ok(site.invoke(f.rt, &[x])?.into_first())
                }))
            }
        }
    }

    /// Compile an expression keeping every value it produces.
    pub(super) fn multi(&self, expr: &Expr) -> Eval<Multi> {
        match expr {
            Expr::Call { callee, args, site } => {
                let operands = self.operands(vec![self.value(callee)], args);
                let site = site.clone();
                Box::new(move |f| {
                    let operands = operands(f)?;
                    site.invoke(f.rt, &operands)
                })
            }
            Expr::Method {
                object,
                name,
                args,
                lookup,
                site,
            } => {
                let object = self.value(object);
                let key = Value::Str(name.clone());
                let args = self.list(args);
                let (lookup, site) = (lookup.clone(), site.clone());
                Box::new(move |f| {
                    let receiver = object(f)?;
                    let method = lookup
                        .invoke(f.rt, &[receiver.clone(), key.clone()])?
                        .into_first();
                    let rest = args(f)?;
                    let mut operands = Operands::with_capacity(rest.len() + 2);
                    operands.push(method);
                    operands.push(receiver);
                    operands.extend(rest);
                    site.invoke(f.rt, &operands)
                })
            }
            Expr::Vararg => Box::new(|f| {
                Ok(match f.varargs.len() {
                    1 => Multi::One(f.varargs[0].clone()),
                    _ => Multi::Many(f.varargs.clone()),
                })
            }),
            other => {
                let value = self.value(other);
                Box::new(move |f| Ok(Multi::One(value(f)?)))
            }
        }
    }

    /// Evaluate `head` then `exprs` left to right, expanding a trailing
    /// multi-valued expression.
    pub(super) fn operands(&self, head: Vec<Eval<Value>>, exprs: &[Expr]) -> Eval<Operands> {
        let (singles, tail) = match exprs.split_last() {
            Some((last, init)) if last.is_multi() => (init, Some(self.multi(last))),
            _ => (exprs, None),
        };
        let singles: Vec<Eval<Value>> = head
            .into_iter()
            .chain(singles.iter().map(|e| self.value(e)))
            .collect();
        Box::new(move |f| {
            let mut out = Operands::new();
            for single in &singles {
                out.push(single(f)?);
            }
            if let Some(tail) = &tail {
                tail(f)?.extend_into(&mut out);
            }
            Ok(out)
        })
    }

    pub(super) fn list(&self, exprs: &[Expr]) -> Eval<Operands> {
        self.operands(Vec::new(), exprs)
    }

    fn table(&self, items: &[TableItem]) -> Code {
        let count = items.len();
        let items: Vec<Item> = items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                TableItem::Positional(e) if i + 1 == count && e.is_multi() => {
                    Item::Spread(self.multi(e))
                }
                TableItem::Positional(e) => Item::Positional(self.value(e)),
                TableItem::Keyed(k, v) => Item::Keyed(self.value(k), self.value(v)),
            })
            .collect();
        Code::Value(Box::new(move |f| {
            let mut table = Table::new();
            let mut n = 1;
            for item in &items {
                match item {
                    Item::Positional(e) => {
                        table.set(TableKey::Int(n), e(f)?);
                        n += 1;
                    }
                    Item::Spread(e) => {
                        for v in e(f)?.to_vec() {
                            table.set(TableKey::Int(n), v);
                            n += 1;
                        }
                    }
                    Item::Keyed(k, v) => {
                        let key = k(f)?;
                        let value = v(f)?;
                        match TableKey::new(&key) {
                            Some(key) => table.set(key, value),
                            None => {
                                let diagnostic = Diagnostic::invalid_key(&key)
                                    .unwrap_or(Diagnostic::InvalidKey { reason: "nil" });
                                return Err(f.rt.error(diagnostic));
                            }
                        }
                    }
                }
            }
            Ok(Value::table(table))
        }))
    }
}

impl Lowerer<'_> {
    /// `<`/`<=` between one Integer and one Float operand, compared
    /// exactly rather than through a rounded float.
    fn mixed_compare(&self, lhs: &Expr, rhs: &Expr, int_first: bool, swap: bool, strict: bool) -> Code {
        let (int_side, float_side) = if int_first { (lhs, rhs) } else { (rhs, lhs) };
        let (i, x) = (self.expr(int_side).int(), self.expr(float_side).float());
        // operand order as the script wrote it
        let int_left = int_first != swap;
        Code::Bool(Box::new(move |f| {
            let ordering = if int_first {
                let n = i(f)?;
                cmp_int_float(n, x(f)?)
            } else {
                let v = x(f)?;
                cmp_int_float(i(f)?, v)
            };
            let ordering = if int_left { ordering } else { ordering.map(|o| o.reverse()) };
            Ok(order_holds(ordering, strict))
        }))
    }
}

fn cmp_i(strict: bool, x: i64, y: i64) -> bool {
    if strict {
        x < y
    } else {
        x <= y
    }
}

/// Whether a value of this type could carry an `__eq` metamethod.
fn may_be_table(ty: &Type) -> bool {
    matches!(ty, Type::Table | Type::Unknown)
}
