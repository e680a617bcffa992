//! Minimal host library
//!
//! Just enough built-in functions to exercise the linker from scripts:
//! type inspection, errors, metatables, raw access and iteration. The
//! `pairs` primitive carries an [`crate::ffi::IntrinsicId::Iteration`]
//! overload that only generic `for` loops can see.

mod base;
pub mod def;
mod registration;
mod table;

pub use def::{Doc, NativeFn, OverloadDef, PrimitiveDef};
pub use registration::{doc, register_primitives};
