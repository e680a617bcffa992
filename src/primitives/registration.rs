use super::def::{Doc, PrimitiveDef};
use super::{base, table};
use crate::engine::Engine;
use crate::error::{fault, EngineFault};
use crate::value::Value;

/// All primitive tables. Each module exports a `const PRIMITIVES`
/// array; this list is the single place that enumerates them.
pub(crate) const ALL_TABLES: &[&[PrimitiveDef]] = &[base::PRIMITIVES, table::PRIMITIVES];

/// Register every primitive with the engine's builtin registry, and
/// bind the non-hidden ones as globals.
pub fn register_primitives(engine: &Engine) {
    let mut count = 0usize;
    for table in ALL_TABLES {
        for def in *table {
            let function = match def.build() {
                Ok(function) => function,
                Err(e) => fault(EngineFault::Registration(e)),
            };
            let value = Value::host(function);
            engine.runtime().register_builtin(def.name, value.clone());
            if def.global {
                engine.set_global(def.name, value);
            }
            count += 1;
        }
    }
    tracing::trace!(count, "registered primitives");
}

/// Documentation for a primitive, hidden ones included.
pub fn doc(name: &str) -> Option<Doc> {
    ALL_TABLES
        .iter()
        .flat_map(|table| table.iter())
        .find(|def| def.name == name)
        .map(|def| Doc {
            name: def.name,
            doc: def.doc,
            params: def.params,
        })
}
