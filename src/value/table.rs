//! Tables, keys and shape tokens
//!
//! A table keeps its entries in insertion order behind a key index, so
//! every live key has a stable structural offset (its slot). The shape
//! token is re-minted whenever the key layout or the metatable changes;
//! overwriting the value of a live key keeps it. Removing a key (storing
//! nil) leaves a tombstone in its slot so traversal with `next` stays
//! valid while fields are cleared. Tombstones are swept when a new key is
//! inserted and they outnumber the live entries.

use super::{Callable, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared, mutable table handle.
pub type TableRef = Rc<RefCell<Table>>;

static NEXT_SHAPE: AtomicU64 = AtomicU64::new(1);

/// Opaque key-layout version of one table.
///
/// Tokens are globally unique, so two tables never share a shape and a
/// shape match implies table identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape(u64);

impl Shape {
    fn mint() -> Shape {
        Shape(NEXT_SHAPE.fetch_add(1, Ordering::Relaxed))
    }
}

/// A value usable as a table key.
///
/// Floats with an exact integer value are normalized to `Int`, so `t[1]`
/// and `t[1.0]` name the same slot. Tables and functions key by identity.
#[derive(Clone)]
pub enum TableKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(Rc<str>),
    Table(TableRef),
    Function(Callable),
}

impl TableKey {
    /// `None` for nil and NaN, which can never be keys.
    pub fn new(value: &Value) -> Option<TableKey> {
        Some(match value {
            Value::Nil => return None,
            Value::Bool(b) => TableKey::Bool(*b),
            Value::Int(i) => TableKey::Int(*i),
            Value::Float(f) if f.is_nan() => return None,
            Value::Float(f) => match float_to_int(*f) {
                Some(i) => TableKey::Int(i),
                None => TableKey::Float(f.to_bits()),
            },
            Value::Str(s) => TableKey::Str(s.clone()),
            Value::Table(t) => TableKey::Table(t.clone()),
            Value::Function(c) => TableKey::Function(c.clone()),
        })
    }

    pub fn str(s: &str) -> TableKey {
        TableKey::Str(Rc::from(s))
    }

    pub fn to_value(&self) -> Value {
        match self {
            TableKey::Bool(b) => Value::Bool(*b),
            TableKey::Int(i) => Value::Int(*i),
            TableKey::Float(bits) => Value::Float(f64::from_bits(*bits)),
            TableKey::Str(s) => Value::Str(s.clone()),
            TableKey::Table(t) => Value::Table(t.clone()),
            TableKey::Function(c) => Value::Function(c.clone()),
        }
    }
}

/// Exact integer value of a float, if it has one.
pub fn float_to_int(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= -9.223_372_036_854_776e18 && f < 9.223_372_036_854_776e18 {
        Some(f as i64)
    } else {
        None
    }
}

impl PartialEq for TableKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TableKey::Bool(a), TableKey::Bool(b)) => a == b,
            (TableKey::Int(a), TableKey::Int(b)) => a == b,
            (TableKey::Float(a), TableKey::Float(b)) => a == b,
            (TableKey::Str(a), TableKey::Str(b)) => a == b,
            (TableKey::Table(a), TableKey::Table(b)) => Rc::ptr_eq(a, b),
            (TableKey::Function(a), TableKey::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for TableKey {}

impl Hash for TableKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            TableKey::Bool(b) => b.hash(state),
            TableKey::Int(i) => i.hash(state),
            TableKey::Float(bits) => bits.hash(state),
            TableKey::Str(s) => s.hash(state),
            TableKey::Table(t) => (Rc::as_ptr(t) as *const () as usize).hash(state),
            TableKey::Function(c) => c.addr().hash(state),
        }
    }
}

impl std::fmt::Debug for TableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_value())
    }
}

/// A Lua-style table.
pub struct Table {
    index: FxHashMap<TableKey, usize>,
    entries: Vec<(TableKey, Value)>,
    tombstones: usize,
    /// Largest `n` with `1..=n` all live.
    border: i64,
    metatable: Option<TableRef>,
    shape: Shape,
}

impl Table {
    pub fn new() -> Self {
        Table {
            index: FxHashMap::default(),
            entries: Vec::new(),
            tombstones: 0,
            border: 0,
            metatable: None,
            shape: Shape::mint(),
        }
    }

    /// A fresh table behind a shared handle.
    pub fn new_ref() -> TableRef {
        Rc::new(RefCell::new(Table::new()))
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn metatable(&self) -> Option<TableRef> {
        self.metatable.clone()
    }

    pub fn set_metatable(&mut self, metatable: Option<TableRef>) {
        self.metatable = metatable;
        self.shape = Shape::mint();
    }

    pub fn get(&self, key: &TableKey) -> Value {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1.clone(),
            None => Value::Nil,
        }
    }

    /// Raw read with an arbitrary key value; nil and NaN read as absent.
    pub fn raw_get(&self, key: &Value) -> Value {
        match TableKey::new(key) {
            Some(key) => self.get(&key),
            None => Value::Nil,
        }
    }

    pub fn get_str(&self, key: &str) -> Value {
        self.get(&TableKey::str(key))
    }

    /// Raw write. Storing nil removes the key.
    pub fn set(&mut self, key: TableKey, value: Value) {
        match self.index.get(&key) {
            Some(&slot) => {
                let live = !self.entries[slot].1.is_nil();
                let removing = value.is_nil();
                self.entries[slot].1 = value;
                if live == removing {
                    if removing {
                        self.tombstones += 1;
                        self.retreat_border(&key);
                    } else {
                        self.tombstones -= 1;
                        self.advance_border(&key);
                    }
                    self.shape = Shape::mint();
                }
            }
            None if value.is_nil() => {}
            None => {
                if self.tombstones > self.entries.len() - self.tombstones {
                    self.compact();
                }
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key.clone(), value));
                self.advance_border(&key);
                self.shape = Shape::mint();
            }
        }
    }

    /// Drop tombstones and renumber the surviving slots.
    /// Only called on insert, so a walk with `next` over cleared fields
    /// never loses its position.
    fn compact(&mut self) {
        tracing::trace!(
            tombstones = self.tombstones,
            live = self.entries.len() - self.tombstones,
            "compacting table"
        );
        self.entries.retain(|(_, v)| !v.is_nil());
        self.index.clear();
        for (slot, (key, _)) in self.entries.iter().enumerate() {
            self.index.insert(key.clone(), slot);
        }
        self.tombstones = 0;
    }

    fn advance_border(&mut self, key: &TableKey) {
        if matches!(key, TableKey::Int(k) if *k == self.border + 1) {
            while self.slot_of(&TableKey::Int(self.border + 1)).is_some() {
                self.border += 1;
            }
        }
    }

    fn retreat_border(&mut self, key: &TableKey) {
        if let TableKey::Int(k) = *key {
            if k >= 1 && k <= self.border {
                self.border = k - 1;
            }
        }
    }

    pub fn set_str(&mut self, key: &str, value: Value) {
        self.set(TableKey::str(key), value);
    }

    /// Structural offset of a live key.
    pub fn slot_of(&self, key: &TableKey) -> Option<usize> {
        self.index
            .get(key)
            .copied()
            .filter(|&slot| !self.entries[slot].1.is_nil())
    }

    /// Read a slot obtained from [`Table::slot_of`] under the same shape.
    pub fn slot(&self, slot: usize) -> Value {
        self.entries
            .get(slot)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Nil)
    }

    /// Overwrite a live slot with a non-nil value. The shape is unchanged.
    /// Returns false if the slot is not live.
    pub fn overwrite_slot(&mut self, slot: usize, value: Value) -> bool {
        match self.entries.get_mut(slot) {
            Some(entry) if !entry.1.is_nil() && !value.is_nil() => {
                entry.1 = value;
                true
            }
            _ => false,
        }
    }

    /// Border length: the largest `n` with `t[1..=n]` all non-nil.
    pub fn len(&self) -> i64 {
        self.border
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == self.tombstones
    }

    /// The entry after `key` in traversal order (`key` nil starts the walk).
    /// `Err(())` if `key` was never in the table.
    #[allow(clippy::result_unit_err)]
    pub fn next(&self, key: &Value) -> Result<Option<(Value, Value)>, ()> {
        let start = if key.is_nil() {
            0
        } else {
            let key = TableKey::new(key).ok_or(())?;
            *self.index.get(&key).ok_or(())? + 1
        };
        Ok(self.entries[start.min(self.entries.len())..]
            .iter()
            .find(|(_, v)| !v.is_nil())
            .map(|(k, v)| (k.to_value(), v.clone())))
    }

    /// Live entries in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_nil())
            .map(|(k, v)| (k.to_value(), v.clone()))
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
