//! Runtime type model for the transit conversion engine.
//!
//! This crate provides:
//! - [`TypeSystem`]: per-engine table of declared types, pre-seeded with the well-known ones
//! - [`TypeRef`]: interned descriptor handle (identity, supertype, interfaces, classification)
//! - [`Primitive`]: the eight primitive kinds and their boxed names
//! - [`Value`]: dynamic values whose runtime type resolves through a [`TypeSystem`]

mod descriptor;
mod error;
mod system;
mod value;

#[cfg(test)]
mod tests;

pub use descriptor::{Primitive, TypeKind, TypeRef};
pub use error::TypeError;
pub use system::{TypeSystem, WellKnown};
pub use value::{EnumConstant, Object, ObjectValue, Value};
