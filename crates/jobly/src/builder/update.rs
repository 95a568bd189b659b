//! Partial-update compiler: sparse payload in, `SET` list out.

use super::clause::{CompiledClause, Joiner};
use crate::error::{JoblyError, JoblyResult};
use crate::ident::Ident;
use crate::value::SqlValue;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Field name → new value, in the order the caller supplied them.
///
/// A key mapped to `null` nulls the column; a key that is missing leaves the
/// column untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct UpdatePayload(Map<String, Value>);

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for UpdatePayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for UpdatePayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// External field name → stored column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aliases(HashMap<String, String>);

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column for `key`, falling back to the key itself.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.0.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Aliases {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Compile `payload` into `"<column>"=$i` fragments joined by `, `.
///
/// Values are bound verbatim. Checking their shape is the caller's job.
pub fn compile_partial_update(
    payload: &UpdatePayload,
    aliases: &Aliases,
) -> JoblyResult<CompiledClause> {
    if payload.is_empty() {
        return Err(JoblyError::EmptyPayload);
    }

    let mut clause = CompiledClause::new(Joiner::Comma);
    for (key, value) in payload.iter() {
        let mut head = Ident::quoted(aliases.resolve(key))?.to_sql();
        head.push('=');
        clause.push(head, SqlValue::from(value));
    }
    Ok(clause)
}

/// One updatable field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateField {
    pub external: &'static str,
    pub column: &'static str,
}

impl UpdateField {
    /// Field stored under its own name.
    pub const fn same(name: &'static str) -> Self {
        Self {
            external: name,
            column: name,
        }
    }

    pub const fn aliased(external: &'static str, column: &'static str) -> Self {
        Self { external, column }
    }
}

/// The set of fields an entity allows callers to update.
#[derive(Debug, Clone, Copy)]
pub struct UpdateSpec {
    fields: &'static [UpdateField],
}

impl UpdateSpec {
    pub const fn new(fields: &'static [UpdateField]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [UpdateField] {
        self.fields
    }

    pub fn allows(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.external == key)
    }

    pub fn aliases(&self) -> Aliases {
        self.fields
            .iter()
            .filter(|f| f.external != f.column)
            .map(|f| (f.external, f.column))
            .collect()
    }

    /// Like [`compile_partial_update`], but rejects undeclared keys first.
    pub fn compile(&self, payload: &UpdatePayload) -> JoblyResult<CompiledClause> {
        if payload.is_empty() {
            return Err(JoblyError::EmptyPayload);
        }
        if let Some(key) = payload.keys().find(|k| !self.allows(k)) {
            return Err(JoblyError::unknown_field(key));
        }
        compile_partial_update(payload, &self.aliases())
    }
}
