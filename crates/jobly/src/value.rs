//! Bind values for compiled clauses.
//!
//! Request payloads arrive as JSON, but Postgres wants a concrete wire type per
//! placeholder. [`SqlValue`] keeps the JSON value as-is and picks the encoding
//! when the driver tells it the column type, so `{"numEmployees": 10}` binds to
//! an `integer` column and `{"equity": 0.25}` to a `numeric` one.

use bytes::BytesMut;
use rust_decimal::Decimal;
use serde_json::Value;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

/// A single bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                // u64 beyond i64::MAX or a fraction; f64 is the widest we bind.
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

impl From<&Value> for SqlValue {
    fn from(value: &Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

fn integral(x: f64) -> Result<i64, BoxError> {
    if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x <= i64::MAX as f64 {
        Ok(x as i64)
    } else {
        Err(format!("{x} cannot be stored in an integer column").into())
    }
}

fn encode_int(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(i)?.to_sql_checked(ty, out),
        Type::INT4 => i32::try_from(i)?.to_sql_checked(ty, out),
        Type::FLOAT4 => (i as f32).to_sql_checked(ty, out),
        Type::FLOAT8 => (i as f64).to_sql_checked(ty, out),
        Type::NUMERIC => Decimal::from(i).to_sql_checked(ty, out),
        _ => i.to_sql_checked(ty, out),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(b) => b.to_sql_checked(ty, out),
            Self::Int(i) => encode_int(*i, ty, out),
            Self::Float(x) => match *ty {
                Type::FLOAT4 => (*x as f32).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::try_from(*x)?.to_sql_checked(ty, out),
                Type::INT2 | Type::INT4 | Type::INT8 => encode_int(integral(*x)?, ty, out),
                _ => x.to_sql_checked(ty, out),
            },
            Self::Text(s) => match *ty {
                // decimal literals, as `numeric` values serialize
                Type::NUMERIC => s.trim().parse::<Decimal>()?.to_sql_checked(ty, out),
                _ => s.as_str().to_sql_checked(ty, out),
            },
            Self::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::UNKNOWN
                | Type::JSON
                | Type::JSONB
        )
    }

    to_sql_checked!();
}
