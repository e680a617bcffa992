//! Statement lowering

use super::code::{Code, Eval, Exec};
use super::frame::{Flow, Frame, Slot};
use super::Lowerer;
use crate::error::{fault, Diagnostic, EngineFault, LResult};
use crate::hir::{Block, Expr, LocalId, Place, Stmt};
use crate::link::CallSite;
use crate::types::Type;
use crate::value::{Capture, Multi, Value};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

/// A compiled assignment target.
enum Store {
    Local(Slot),
    Capture(usize),
    Global(Value, Rc<CallSite>),
    Field(Eval<Value>, Eval<Value>, Rc<CallSite>),
}

/// An assignment target with its operands evaluated.
enum Ready<'s> {
    Local(Slot),
    Capture(usize),
    Field(Value, Value, &'s Rc<CallSite>),
}

/// Numeric `for` limit as compiled.
enum Limit {
    Int(Eval<i64>),
    Float(Eval<f64>),
}

impl Lowerer<'_> {
    pub(super) fn block(&self, block: &Block) -> Exec {
        let mut stmts: Vec<Exec> = block.iter().map(|s| self.stmt(s)).collect();
        if stmts.len() == 1 {
            if let Some(only) = stmts.pop() {
                return only;
            }
        }
        Box::new(move |f| {
            for stmt in &stmts {
                match stmt(f)? {
                    Flow::Next => {}
                    other => return Ok(other),
                }
            }
            Ok(Flow::Next)
        })
    }

    fn stmt(&self, stmt: &Stmt) -> Exec {
        match stmt {
            Stmt::Local { targets, values } => self.local(targets, values),
            Stmt::LocalFunction { target, function } => {
                let slot = self.layout.slot(*target);
                let make = self.closure(*function);
                Box::new(move |f| {
                    f.declare(slot, Value::Nil);
                    let closure = make(f)?;
                    f.store(slot, closure);
                    Ok(Flow::Next)
                })
            }
            Stmt::Assign { targets, values } => self.assign(targets, values),
            Stmt::Expr(expr) => {
                let values = self.multi(expr);
                Box::new(move |f| {
                    values(f)?;
                    Ok(Flow::Next)
                })
            }
            Stmt::Do(body) => self.block(body),
            Stmt::If { arms, otherwise } => {
                let arms: Vec<(Eval<bool>, Exec)> = arms
                    .iter()
                    .map(|(cond, body)| (self.expr(cond).truth(), self.block(body)))
                    .collect();
                let otherwise = otherwise.as_ref().map(|body| self.block(body));
                Box::new(move |f| {
                    for (cond, body) in &arms {
                        if cond(f)? {
                            return body(f);
                        }
                    }
                    match &otherwise {
                        Some(body) => body(f),
                        None => Ok(Flow::Next),
                    }
                })
            }
            Stmt::While { cond, body } => {
                let (cond, body) = (self.expr(cond).truth(), self.block(body));
                Box::new(move |f| {
                    while cond(f)? {
                        match body(f)? {
                            Flow::Next => {}
                            Flow::Break => break,
                            ret @ Flow::Return(_) => return Ok(ret),
                        }
                    }
                    Ok(Flow::Next)
                })
            }
            Stmt::Repeat { body, cond } => {
                let (body, cond) = (self.block(body), self.expr(cond).truth());
                Box::new(move |f| {
                    loop {
                        match body(f)? {
                            Flow::Next => {}
                            Flow::Break => break,
                            ret @ Flow::Return(_) => return Ok(ret),
                        }
                        if cond(f)? {
                            break;
                        }
                    }
                    Ok(Flow::Next)
                })
            }
            Stmt::NumericFor {
                var,
                start,
                limit,
                step,
                body,
            } => self.numeric_for(*var, start, limit, step.as_ref(), body),
            Stmt::GenericFor {
                vars,
                exprs,
                iterate,
                body,
            } => {
                let init = self.list(exprs);
                let slots: Vec<Slot> = vars.iter().map(|v| self.layout.slot(*v)).collect();
                let iterate = iterate.clone();
                let body = self.block(body);
                Box::new(move |f| {
                    let init = init(f)?;
                    let nth = |i: usize| init.get(i).cloned().unwrap_or(Value::Nil);
                    let (iterator, state) = (nth(0), nth(1));
                    let mut control = nth(2);
                    loop {
                        let results = iterate.invoke(f.rt, &[iterator.clone(), state.clone(), control])?;
                        let first = results.first();
                        if first.is_nil() {
                            break;
                        }
                        control = first;
                        for (i, slot) in slots.iter().enumerate() {
                            f.declare(*slot, results.get(i));
                        }
                        match body(f)? {
                            Flow::Next => {}
                            Flow::Break => break,
                            ret @ Flow::Return(_) => return Ok(ret),
                        }
                    }
                    Ok(Flow::Next)
                })
            }
            Stmt::Return(values) => match values.as_slice() {
                [] => Box::new(|_| Ok(Flow::Return(Multi::empty()))),
                [single] if single.is_multi() => {
                    let values = self.multi(single);
                    Box::new(move |f| Ok(Flow::Return(values(f)?)))
                }
                [single] => {
                    let value = self.value(single);
                    Box::new(move |f| Ok(Flow::Return(Multi::One(value(f)?))))
                }
                _ => {
                    let values = self.list(values);
                    Box::new(move |f| Ok(Flow::Return(Multi::from_vec(values(f)?.into_vec()))))
                }
            },
            Stmt::Break => Box::new(|_| Ok(Flow::Break)),
        }
    }

    fn local(&self, targets: &[LocalId], values: &[Expr]) -> Exec {
        if let ([target], [value]) = (targets, values) {
            if !value.is_multi() {
                return self.bind(*target, self.expr(value), true);
            }
        }
        let values = self.list(values);
        let slots: Vec<Slot> = targets.iter().map(|t| self.layout.slot(*t)).collect();
        Box::new(move |f| {
            let values = values(f)?;
            for (i, slot) in slots.iter().enumerate() {
                f.declare(*slot, values.get(i).cloned().unwrap_or(Value::Nil));
            }
            Ok(Flow::Next)
        })
    }

    /// Store compiled code into a local without boxing where its slot is
    /// typed.
    fn bind(&self, target: LocalId, code: Code, declare: bool) -> Exec {
        match self.layout.slot(target) {
            Slot::Int(s) => {
                let e = code.int();
                Box::new(move |f| {
                    f.ints[s] = e(f)?;
                    Ok(Flow::Next)
                })
            }
            Slot::Float(s) => {
                let e = code.float();
                Box::new(move |f| {
                    f.floats[s] = e(f)?;
                    Ok(Flow::Next)
                })
            }
            Slot::Bool(s) => {
                let e = code.bool();
                Box::new(move |f| {
                    f.bools[s] = e(f)?;
                    Ok(Flow::Next)
                })
            }
            Slot::Value(s) => {
                let e = code.boxed();
                Box::new(move |f| {
                    f.values[s] = e(f)?;
                    Ok(Flow::Next)
                })
            }
            Slot::Cell(s) => {
                let e = code.boxed();
                if declare {
                    Box::new(move |f| {
                        f.cells[s] = Rc::new(RefCell::new(e(f)?));
                        Ok(Flow::Next)
                    })
                } else {
                    Box::new(move |f| {
                        let v = e(f)?;
                        *f.cells[s].borrow_mut() = v;
                        Ok(Flow::Next)
                    })
                }
            }
        }
    }

    /// Place operands are evaluated first, then the values, then the
    /// stores happen left to right.
    fn assign(&self, targets: &[Place], values: &[Expr]) -> Exec {
        if let ([Place::Local(id)], [value]) = (targets, values) {
            if !value.is_multi() {
                return self.bind(*id, self.expr(value), false);
            }
        }
        let stores: Vec<Store> = targets
            .iter()
            .map(|place| match place {
                Place::Local(id) => Store::Local(self.layout.slot(*id)),
                Place::Capture(index) => Store::Capture(*index),
                Place::Global { name, site } => Store::Global(Value::Str(name.clone()), site.clone()),
                Place::Index { table, key, site } => {
                    Store::Field(self.value(table), self.value(key), site.clone())
                }
            })
            .collect();
        let values = self.list(values);
        Box::new(move |f| {
            let mut ready: SmallVec<[Ready<'_>; 4]> = SmallVec::with_capacity(stores.len());
            for store in &stores {
                ready.push(match store {
                    Store::Local(slot) => Ready::Local(*slot),
                    Store::Capture(index) => Ready::Capture(*index),
                    Store::Global(key, site) => {
                        Ready::Field(Value::Table(f.rt.globals().clone()), key.clone(), site)
                    }
                    Store::Field(table, key, site) => Ready::Field(table(f)?, key(f)?, site),
                });
            }
            let values = values(f)?;
            for (i, target) in ready.into_iter().enumerate() {
                let value = values.get(i).cloned().unwrap_or(Value::Nil);
                match target {
                    Ready::Local(slot) => f.store(slot, value),
                    Ready::Capture(index) => store_capture(f, index, value),
                    Ready::Field(table, key, site) => {
                        site.invoke(f.rt, &[table, key, value])?;
                    }
                }
            }
            Ok(Flow::Next)
        })
    }

    fn numeric_for(
        &self,
        var: LocalId,
        start: &Expr,
        limit: &Expr,
        step: Option<&Expr>,
        body: &Block,
    ) -> Exec {
        let slot = self.layout.slot(var);
        let loop_type = self.ctx.numeric_for_type(start, limit, step);
        let limit_type = self.ctx.expr_type(limit);
        let body = self.block(body);

        match loop_type {
            Type::Integer => {
                let start = self.expr(start).int();
                let limit = match limit_type {
                    Type::Integer => Limit::Int(self.expr(limit).int()),
                    _ => Limit::Float(self.expr(limit).float()),
                };
                let step = step.map(|s| self.expr(s).int());
                Box::new(move |f| {
                    let start = start(f)?;
                    let limit = match &limit {
                        Limit::Int(e) => Ok(e(f)?),
                        Limit::Float(e) => Err(e(f)?),
                    };
                    let step = match &step {
                        Some(e) => e(f)?,
                        None => 1,
                    };
                    int_loop(f, start, limit, step, slot, &body)
                })
            }
            Type::Float => {
                let start = self.expr(start).float();
                let limit = self.expr(limit).float();
                let step = step.map(|s| self.expr(s).float());
                Box::new(move |f| {
                    let (start, limit) = (start(f)?, limit(f)?);
                    let step = match &step {
                        Some(e) => e(f)?,
                        None => 1.0,
                    };
                    float_loop(f, start, limit, step, slot, &body)
                })
            }
            _ => {
                let start = self.value(start);
                let limit = self.value(limit);
                let step = step.map(|s| self.value(s));
                Box::new(move |f| {
                    let start = start(f)?;
                    let start = for_number(f, start, "initial value")?;
                    let limit = limit(f)?;
                    let limit = for_number(f, limit, "limit")?;
                    let step = match &step {
                        Some(e) => {
                            let step = e(f)?;
                            for_number(f, step, "step")?
                        }
                        None => Value::Int(1),
                    };
                    match (start, limit, step) {
                        (Value::Int(start), Value::Int(limit), Value::Int(step)) => {
                            int_loop(f, start, Ok(limit), step, slot, &body)
                        }
                        (Value::Int(start), Value::Float(limit), Value::Int(step)) => {
                            int_loop(f, start, Err(limit), step, slot, &body)
                        }
                        (start, limit, step) => {
                            let n = |v: &Value| v.as_number().unwrap_or(f64::NAN);
                            float_loop(f, n(&start), n(&limit), n(&step), slot, &body)
                        }
                    }
                })
            }
        }
    }
}

fn store_capture(f: &mut Frame<'_>, index: usize, value: Value) {
    match &f.captures[index] {
        Capture::Cell(cell) => *cell.borrow_mut() = value,
        Capture::Value(_) => fault(EngineFault::TypeDisagreement {
            expected: "boxed capture".to_string(),
            found: "copied capture".to_string(),
        }),
    }
}

fn for_number(f: &Frame<'_>, value: Value, what: &'static str) -> LResult<Value> {
    match value {
        Value::Int(_) | Value::Float(_) => Ok(value),
        _ => Err(f.rt.error(Diagnostic::ForLoop { what })),
    }
}

/// Integer bound for a float limit: floored for an ascending loop,
/// ceiled for a descending one. `None` if the loop cannot run.
fn int_limit(limit: f64, step: i64) -> Option<i64> {
    const TOP: f64 = 9.223_372_036_854_776e18;
    if limit.is_nan() {
        return None;
    }
    let bound = if step > 0 { limit.floor() } else { limit.ceil() };
    if bound >= TOP {
        (step > 0).then_some(i64::MAX)
    } else if bound < -TOP {
        (step < 0).then_some(i64::MIN)
    } else {
        Some(bound as i64)
    }
}

fn set_int(f: &mut Frame<'_>, slot: Slot, i: i64) {
    match slot {
        Slot::Int(s) => f.ints[s] = i,
        other => f.declare(other, Value::Int(i)),
    }
}

fn set_float(f: &mut Frame<'_>, slot: Slot, x: f64) {
    match slot {
        Slot::Float(s) => f.floats[s] = x,
        other => f.declare(other, Value::Float(x)),
    }
}

/// `limit` is `Err` when it is a float still to be clamped.
fn int_loop(
    f: &mut Frame<'_>,
    start: i64,
    limit: Result<i64, f64>,
    step: i64,
    slot: Slot,
    body: &Exec,
) -> LResult<Flow> {
    if step == 0 {
        return Err(f.rt.error(Diagnostic::ForStep));
    }
    let limit = match limit {
        Ok(limit) => limit,
        Err(limit) => match int_limit(limit, step) {
            Some(limit) => limit,
            None => return Ok(Flow::Next),
        },
    };
    if (step > 0 && start > limit) || (step < 0 && start < limit) {
        return Ok(Flow::Next);
    }
    // Iteration count up front, so the control variable never overflows.
    let mut remaining = if step > 0 {
        (limit as u64).wrapping_sub(start as u64) / step as u64
    } else {
        (start as u64).wrapping_sub(limit as u64) / ((-(step + 1)) as u64 + 1)
    };
    let mut i = start;
    loop {
        set_int(f, slot, i);
        match body(f)? {
            Flow::Next => {}
            Flow::Break => break,
            ret @ Flow::Return(_) => return Ok(ret),
        }
        if remaining == 0 {
            break;
        }
        remaining -= 1;
        i = i.wrapping_add(step);
    }
    Ok(Flow::Next)
}

fn float_loop(
    f: &mut Frame<'_>,
    start: f64,
    limit: f64,
    step: f64,
    slot: Slot,
    body: &Exec,
) -> LResult<Flow> {
    if step == 0.0 {
        return Err(f.rt.error(Diagnostic::ForStep));
    }
    let mut x = start;
    loop {
        let inside = if step > 0.0 { x <= limit } else { x >= limit };
        if !inside {
            break;
        }
        set_float(f, slot, x);
        match body(f)? {
            Flow::Next => {}
            Flow::Break => break,
            ret @ Flow::Return(_) => return Ok(ret),
        }
        x += step;
    }
    Ok(Flow::Next)
}
