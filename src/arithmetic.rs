//! Unified primitive operations for compiled code and call sites
//!
//! Statically typed operators are compiled straight to these functions,
//! and linked operator sites use the same functions as their fast-path
//! targets, so both paths always agree on semantics.

use crate::error::{fault, Diagnostic, EngineFault};
use crate::hir::BinaryOp;
use crate::value::{format_float, Value};
use std::cmp::Ordering;
use std::rc::Rc;

/// Integer arithmetic. Wraps on overflow; `//` and `%` floor.
pub fn int_op(op: BinaryOp, a: i64, b: i64) -> Result<i64, Diagnostic> {
    Ok(match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::IDiv => {
            if b == 0 {
                return Err(Diagnostic::DivideByZero { op: "//" });
            }
            let q = a.wrapping_div(b);
            if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(Diagnostic::DivideByZero { op: "%" });
            }
            let r = a.wrapping_rem(b);
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }
        _ => fault(EngineFault::TypeDisagreement {
            expected: "integer operator".to_string(),
            found: op.to_string(),
        }),
    })
}

/// Float arithmetic. `%` and `//` floor like their integer versions.
pub fn float_op(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Pow => a.powf(b),
        BinaryOp::IDiv => (a / b).floor(),
        BinaryOp::Mod => {
            let m = a % b;
            if m != 0.0 && (m < 0.0) != (b < 0.0) {
                m + b
            } else {
                m
            }
        }
        _ => f64::NAN,
    }
}

/// Whether `op` on two integers produces an integer.
pub fn int_result(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::IDiv | BinaryOp::Mod
    )
}

/// Arithmetic on two boxed numbers. `None` if either is not a number.
pub fn arith_values(op: BinaryOp, a: &Value, b: &Value) -> Option<Result<Value, Diagnostic>> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) if int_result(op) => Some(int_op(op, *x, *y).map(Value::Int)),
        _ => {
            let (x, y) = (a.as_number()?, b.as_number()?);
            Some(Ok(Value::Float(float_op(op, x, y))))
        }
    }
}

pub fn negate(a: &Value) -> Option<Value> {
    match a {
        Value::Int(i) => Some(Value::Int(i.wrapping_neg())),
        Value::Float(f) => Some(Value::Float(-f)),
        _ => None,
    }
}

/// String form of a concatenation operand.
pub fn concat_piece(v: &Value) -> Option<Rc<str>> {
    match v {
        Value::Str(s) => Some(s.clone()),
        Value::Int(i) => Some(Rc::from(i.to_string().as_str())),
        Value::Float(f) => Some(Rc::from(format_float(*f).as_str())),
        _ => None,
    }
}

pub fn concat_values(a: &Value, b: &Value) -> Option<Value> {
    let (x, y) = (concat_piece(a)?, concat_piece(b)?);
    let mut s = String::with_capacity(x.len() + y.len());
    s.push_str(&x);
    s.push_str(&y);
    Some(Value::Str(Rc::from(s.as_str())))
}

/// Exact order of an integer against a float, without rounding the
/// integer. `None` if `f` is NaN.
pub fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    // 2^63 and beyond lie outside i64
    if f >= 9.223_372_036_854_775_808e18 {
        return Some(Ordering::Less);
    }
    if f < -9.223_372_036_854_775_808e18 {
        return Some(Ordering::Greater);
    }
    let floor = f.floor();
    Some(match i.cmp(&(floor as i64)) {
        Ordering::Equal if floor < f => Ordering::Less,
        ordering => ordering,
    })
}

/// Order two numbers. `None` for non-numbers and NaN.
pub fn number_order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Float(y)) => cmp_int_float(*x, *y),
        (Value::Float(x), Value::Int(y)) => cmp_int_float(*y, *x).map(Ordering::reverse),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        _ => None,
    }
}

/// Order two numbers or two strings. `None` if they are not comparable.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        _ => number_order(a, b),
    }
}

/// Whether an ordering satisfies `<` (`strict`) or `<=`.
pub fn order_holds(ordering: Option<Ordering>, strict: bool) -> bool {
    match ordering {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => !strict,
        _ => false,
    }
}

/// `a < b` (`strict`) or `a <= b` on comparable primitives.
pub fn less(a: &Value, b: &Value, strict: bool) -> Option<bool> {
    if a.as_number().is_some() && b.as_number().is_some() {
        return Some(order_holds(number_order(a, b), strict));
    }
    let ordering = compare(a, b)?;
    Some(order_holds(Some(ordering), strict))
}
