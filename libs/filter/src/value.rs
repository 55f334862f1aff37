//! Typed values produced by coercion and the bind payloads handed to the driver.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::schema::ValueType;

/// A request value after coercion to its declared [`ValueType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
    StringList(Vec<String>),
    IntegerList(Vec<i64>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Integer(_) => ValueType::Integer,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::Boolean(_) => ValueType::Boolean,
            Value::StringList(_) => ValueType::StringList,
            Value::IntegerList(_) => ValueType::IntegerList,
        }
    }
}

/// Column type of a typed `NULL` bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Timestamp,
    Uuid,
}

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Null(SqlType),
    TextArray(Vec<String>),
    IntegerArray(Vec<i64>),
    TimestampArray(Vec<DateTime<Utc>>),
}

impl BindValue {
    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(BindValue::Null(SqlType::Text), |v| {
            BindValue::Text(v.to_string())
        })
    }

    pub fn opt_timestamp(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(BindValue::Null(SqlType::Timestamp), BindValue::Timestamp)
    }

    pub fn opt_uuid(value: Option<Uuid>) -> Self {
        value.map_or(BindValue::Null(SqlType::Uuid), BindValue::Uuid)
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::Integer(value)
    }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(value: DateTime<Utc>) -> Self {
        BindValue::Timestamp(value)
    }
}

/// Convert Unix epoch seconds into a UTC instant.
pub fn timestamp_from_epoch(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
