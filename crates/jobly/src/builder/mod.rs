//! Parameter-safe clause compilers.
//!
//! - [`compile_partial_update`] / [`UpdateSpec`]: sparse payload → `SET` list
//! - [`build_filter`]: declared [`FieldSpec`]s + [`FilterRequest`] → predicate
//!
//! Both are pure functions returning a [`CompiledClause`]. Column names are
//! only ever taken from declarations or rendered as quoted identifiers; values
//! only ever travel as `$n` parameters.

pub mod clause;
pub mod filter;
pub mod update;

pub use clause::{CompiledClause, Joiner, TRUE_PREDICATE};
pub use filter::{Comparison, FieldSpec, FilterRequest, Transform, ValueKind, build_filter};
pub use update::{Aliases, UpdateField, UpdatePayload, UpdateSpec, compile_partial_update};
