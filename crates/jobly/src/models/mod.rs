//! Entity repositories.
//!
//! Free async functions over `&impl GenericClient`. Each entity declares its
//! filterable fields (`FILTERS`) and updatable fields (`UPDATES`) once; the
//! `compile_*` functions turn caller input into a [`CompiledClause`] without
//! touching the database, and the `*_with` functions execute one.
//!
//! [`CompiledClause`]: crate::builder::CompiledClause

pub mod company;
pub mod job;
pub mod user;

use crate::builder::UpdatePayload;
use crate::error::{JoblyError, JoblyResult};

/// Replace a unique violation with a caller-facing message.
pub(crate) fn duplicate(err: JoblyError, message: impl FnOnce() -> String) -> JoblyError {
    if err.is_unique_violation() {
        JoblyError::UniqueViolation(message())
    } else {
        err
    }
}

/// Reject a payload value that is neither `null` nor accepted by `check`.
pub(crate) fn check_field(
    payload: &UpdatePayload,
    key: &str,
    nullable: bool,
    check: impl FnOnce(&serde_json::Value) -> Result<(), &'static str>,
) -> JoblyResult<()> {
    match payload.get(key) {
        None => Ok(()),
        Some(serde_json::Value::Null) if nullable => Ok(()),
        Some(serde_json::Value::Null) => {
            Err(JoblyError::validation(format!("{key} cannot be null")))
        }
        Some(value) => {
            check(value).map_err(|reason| JoblyError::validation(format!("{key} {reason}")))
        }
    }
}

pub(crate) fn non_empty_text(value: &serde_json::Value) -> Result<(), &'static str> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err("cannot be empty"),
        None => Err("must be a string"),
    }
}

pub(crate) fn non_negative_int(value: &serde_json::Value) -> Result<(), &'static str> {
    match value.as_i64() {
        Some(n) if n < 0 => Err("must not be negative"),
        Some(n) if i32::try_from(n).is_ok() => Ok(()),
        Some(_) => Err("is too large"),
        None => Err("must be a whole number"),
    }
}
