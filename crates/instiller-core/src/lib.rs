//! Core contracts for instiller.
//!
//! This crate defines the type-introspection adapter used in place of runtime
//! reflection, the per-field directive model, the alias store and the
//! generated value tree shared by the plan and generation crates.

pub mod aliases;
pub mod directive;
pub mod error;
pub mod registry;
pub mod types;
pub mod value;

pub use aliases::{AliasStore, alias_reference};
pub use directive::{ClassDirective, GenerationDirective};
pub use error::{Error, Result};
pub use registry::{CompositeBuilder, Fixture, TypeRegistry};
pub use types::{
    CompositeType, FieldDescriptor, FieldKey, ScalarKind, SequenceKind, TypeDescriptor, TypeExpr,
    TypeKind,
};
pub use value::GeneratedValue;

/// Name under which [`AliasStore`] is registered in every [`TypeRegistry`].
pub const ALIAS_STORE_TYPE: &str = "AliasStore";
