//! Dynamic filter builder.
//!
//! Each entity declares its filterable fields once as a `&[FieldSpec]`.
//! [`build_filter`] walks that list in declared order and emits one
//! `<column> <op> $n` fragment per field present in the request, so
//! placeholder numbering never depends on the order the caller sent keys in.
//!
//! ```ignore
//! const FILTERS: &[FieldSpec] = &[
//!     FieldSpec::at_least("minSalary", "salary").non_negative(),
//!     FieldSpec::substring("titleLike", "title"),
//!     FieldSpec::flag("hasEquity", "equity"),
//! ];
//!
//! let clause = build_filter(FILTERS, &request)?;
//! let sql = format!("SELECT * FROM jobs WHERE {}", clause.predicate());
//! ```

use super::clause::{CompiledClause, Joiner};
use crate::error::{JoblyError, JoblyResult};
use crate::ident::Ident;
use crate::value::SqlValue;
use serde::Deserialize;
use serde_json::{Map, Number, Value};

/// SQL comparison emitted for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lte,
    ILike,
}

impl Comparison {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::ILike => "ILIKE",
        }
    }
}

/// How the request value becomes the bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    /// `v` → `%v%`
    Wildcard,
    /// `true` → compare against zero; `false` → no constraint.
    Threshold,
}

/// Expected shape of the request value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Number,
    Flag,
}

/// Declaration of one filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub external: &'static str,
    pub column: &'static str,
    pub comparison: Comparison,
    pub transform: Transform,
    pub kind: ValueKind,
    pub allow_negative: bool,
}

impl FieldSpec {
    const fn new(
        external: &'static str,
        column: &'static str,
        comparison: Comparison,
        transform: Transform,
        kind: ValueKind,
    ) -> Self {
        Self {
            external,
            column,
            comparison,
            transform,
            kind,
            allow_negative: true,
        }
    }

    /// Case-insensitive substring match (`ILIKE '%v%'`).
    pub const fn substring(external: &'static str, column: &'static str) -> Self {
        Self::new(
            external,
            column,
            Comparison::ILike,
            Transform::Wildcard,
            ValueKind::Text,
        )
    }

    /// Exact match on text. Not used by the bundled entities; available to
    /// callers declaring their own filters.
    pub const fn equals(external: &'static str, column: &'static str) -> Self {
        Self::new(
            external,
            column,
            Comparison::Eq,
            Transform::Identity,
            ValueKind::Text,
        )
    }

    /// Integer lower bound (`>=`).
    pub const fn at_least(external: &'static str, column: &'static str) -> Self {
        Self::new(
            external,
            column,
            Comparison::Gte,
            Transform::Identity,
            ValueKind::Integer,
        )
    }

    /// Integer upper bound (`<=`).
    pub const fn at_most(external: &'static str, column: &'static str) -> Self {
        Self::new(
            external,
            column,
            Comparison::Lte,
            Transform::Identity,
            ValueKind::Integer,
        )
    }

    /// Tri-state flag: `true` → `column > 0`, `false` or absent → unconstrained.
    pub const fn flag(external: &'static str, column: &'static str) -> Self {
        Self::new(
            external,
            column,
            Comparison::Gt,
            Transform::Threshold,
            ValueKind::Flag,
        )
    }

    /// Accept any real number instead of integers only, for `numeric` or
    /// floating-point columns. Not used by the bundled entities.
    pub const fn fractional(mut self) -> Self {
        self.kind = ValueKind::Number;
        self
    }

    /// Reject negative values.
    pub const fn non_negative(mut self) -> Self {
        self.allow_negative = false;
        self
    }

    /// The parameter this field would bind for `request`, or `None` when it
    /// adds no constraint.
    pub fn bound(&self, request: &FilterRequest) -> JoblyResult<Option<SqlValue>> {
        match request.get(self.external) {
            Some(raw) => self.bind_value(raw),
            None => Ok(None),
        }
    }

    fn bind_value(&self, raw: &Value) -> JoblyResult<Option<SqlValue>> {
        match self.transform {
            Transform::Wildcard => {
                let text = self.text(raw)?;
                Ok(Some(SqlValue::Text(format!("%{text}%"))))
            }
            Transform::Threshold => Ok(self.flag_value(raw)?.then_some(SqlValue::Int(0))),
            Transform::Identity => {
                let value = match self.kind {
                    ValueKind::Text => SqlValue::Text(self.text(raw)?.to_string()),
                    ValueKind::Integer => SqlValue::Int(self.integer(raw)?),
                    ValueKind::Number => self.number(raw)?,
                    ValueKind::Flag => SqlValue::Bool(self.flag_value(raw)?),
                };
                Ok(Some(value))
            }
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> JoblyError {
        JoblyError::invalid_value(self.external, reason)
    }

    fn text<'v>(&self, raw: &'v Value) -> JoblyResult<&'v str> {
        raw.as_str()
            .ok_or_else(|| self.invalid(format!("expected text, got {raw}")))
    }

    fn flag_value(&self, raw: &Value) -> JoblyResult<bool> {
        match raw {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(self.invalid(format!("expected true or false, got {raw}"))),
        }
    }

    fn check_sign(&self, negative: bool) -> JoblyResult<()> {
        if negative && !self.allow_negative {
            return Err(self.invalid("must not be negative"));
        }
        Ok(())
    }

    fn finite(&self, x: f64) -> JoblyResult<f64> {
        if !x.is_finite() {
            return Err(self.invalid("must be a finite number"));
        }
        self.check_sign(x < 0.0)?;
        Ok(x)
    }

    /// Integer filters target `integer` (int4) columns, so values must fit `i32`.
    fn integer(&self, raw: &Value) -> JoblyResult<i64> {
        let value = match parse_number(raw) {
            Some(Parsed::Int(i)) => {
                self.check_sign(i < 0)?;
                i
            }
            Some(Parsed::Float(x)) => {
                let x = self.finite(x)?;
                if x.fract() != 0.0 {
                    return Err(self.invalid("must be a whole number"));
                }
                if x < f64::from(i32::MIN) || x > f64::from(i32::MAX) {
                    return Err(self.invalid("is out of range"));
                }
                x as i64
            }
            None => return Err(self.invalid(format!("expected a number, got {raw}"))),
        };
        if i32::try_from(value).is_err() {
            return Err(self.invalid("is out of range"));
        }
        Ok(value)
    }

    fn number(&self, raw: &Value) -> JoblyResult<SqlValue> {
        match parse_number(raw) {
            Some(Parsed::Int(i)) => {
                self.check_sign(i < 0)?;
                Ok(SqlValue::Int(i))
            }
            Some(Parsed::Float(x)) => Ok(SqlValue::Float(self.finite(x)?)),
            None => Err(self.invalid(format!("expected a number, got {raw}"))),
        }
    }
}

enum Parsed {
    Int(i64),
    Float(f64),
}

/// JSON numbers, or strings holding one (query parameters arrive as text).
fn parse_number(raw: &Value) -> Option<Parsed> {
    match raw {
        Value::Number(n) => Some(from_json_number(n)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Some(Parsed::Int(i))
            } else {
                s.parse::<f64>().ok().map(Parsed::Float)
            }
        }
        _ => None,
    }
}

fn from_json_number(n: &Number) -> Parsed {
    match n.as_i64() {
        Some(i) => Parsed::Int(i),
        None => Parsed::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

/// External field name → requested value. `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FilterRequest(Map<String, Value>);

impl FilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from decoded query-string pairs; every value is text.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// The value for `key`, treating `null` as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for FilterRequest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FilterRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Compile `request` against `specs` into an `AND`-joined predicate.
///
/// Unknown keys are rejected before anything is emitted. Fields are visited in
/// `specs` order; absent and `null` values are skipped.
pub fn build_filter(specs: &[FieldSpec], request: &FilterRequest) -> JoblyResult<CompiledClause> {
    if let Some(key) = request
        .keys()
        .find(|k| !specs.iter().any(|s| s.external == *k))
    {
        return Err(JoblyError::unknown_field(key));
    }

    let mut clause = CompiledClause::new(Joiner::And);
    for spec in specs {
        let Some(value) = spec.bound(request)? else {
            continue;
        };
        let column = Ident::parse(spec.column)?;
        clause.push(
            format!("{} {} ", column.to_sql(), spec.comparison.as_sql()),
            value,
        );
    }
    Ok(clause)
}
