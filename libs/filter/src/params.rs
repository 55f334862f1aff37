//! Filter parameter parsing and validation
//!
//! Handles:
//! - The mandatory `limit` and `query_id` parameters
//! - Splitting `field` / `field_operator` names and resolving them against the schema
//! - Arity checks, coercion to the declared value type and domain validation

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::escape::split_list;
use crate::schema::{Field, FieldSchema, Operator, ValueType};
use crate::value::{timestamp_from_epoch, Value};

pub const LIMIT_PARAM: &str = "limit";
pub const QUERY_ID_PARAM: &str = "query_id";

const OPERATOR_SEPARATOR: char = '_';

/// A validated `(field, operator, value)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
    pub field: Field,
    pub operator: Operator,
    pub value: Value,
}

/// Everything a single filter request asks for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    /// Validated parameters in parse order.
    pub params: Vec<QueryParam>,
    pub referenced_fields: BTreeSet<Field>,
    /// `0` means unlimited.
    pub limit: u32,
}

impl FilterSet {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn push(&mut self, param: QueryParam) {
        self.referenced_fields.insert(param.field);
        self.params.push(param);
    }

    pub fn references(&self, field: Field) -> bool {
        self.referenced_fields.contains(&field)
    }
}

/// Turns raw request parameters into a [`FilterSet`].
#[derive(Debug, Clone, Copy)]
pub struct ParameterParser<'a> {
    schema: &'a FieldSchema,
    max_limit: Option<u32>,
}

impl<'a> ParameterParser<'a> {
    pub fn new(schema: &'a FieldSchema) -> Self {
        Self {
            schema,
            max_limit: None,
        }
    }

    pub fn with_max_limit(mut self, max_limit: u32) -> Self {
        self.max_limit = Some(max_limit);
        self
    }

    /// Parse ordered `(name, value)` pairs; repeated names are grouped.
    pub fn parse_items(&self, items: &[(String, String)]) -> Result<FilterSet> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, value) in items {
            grouped
                .entry(name.as_str())
                .or_default()
                .push(value.as_str());
        }
        self.parse_grouped(grouped)
    }

    pub fn parse_map(&self, params: &HashMap<String, Vec<String>>) -> Result<FilterSet> {
        let grouped = params
            .iter()
            .map(|(name, values)| {
                (
                    name.as_str(),
                    values.iter().map(String::as_str).collect::<Vec<_>>(),
                )
            })
            .collect();
        self.parse_grouped(grouped)
    }

    fn parse_grouped(&self, mut grouped: BTreeMap<&str, Vec<&str>>) -> Result<FilterSet> {
        let limit_values = grouped
            .remove(LIMIT_PARAM)
            .ok_or(Error::MissingRequiredParameter(LIMIT_PARAM))?;
        let limit = self.parse_limit(&limit_values)?;

        if grouped.remove(QUERY_ID_PARAM).is_none() {
            return Err(Error::MissingRequiredParameter(QUERY_ID_PARAM));
        }

        let mut set = FilterSet::with_limit(limit);
        for (name, values) in grouped {
            set.push(self.parse_param(name, &values)?);
        }
        Ok(set)
    }

    fn parse_limit(&self, values: &[&str]) -> Result<u32> {
        let [raw] = values else {
            return Err(Error::WrongArity(LIMIT_PARAM.to_string()));
        };
        if raw.is_empty() {
            return Err(Error::EmptyValue(LIMIT_PARAM.to_string()));
        }
        let parsed = parse_integer(LIMIT_PARAM, raw)?;
        let limit = u32::try_from(parsed)
            .map_err(|_| Error::out_of_range(LIMIT_PARAM, format!("{parsed} is not a valid limit")))?;
        match self.max_limit {
            Some(max) if limit > max => Err(Error::out_of_range(
                LIMIT_PARAM,
                format!("{limit} exceeds the maximum of {max}"),
            )),
            _ => Ok(limit),
        }
    }

    fn parse_param(&self, name: &str, values: &[&str]) -> Result<QueryParam> {
        let (field_name, operator_token) = split_parameter_name(name)?;
        let descriptor = self
            .schema
            .lookup(field_name)
            .ok_or_else(|| Error::UnknownField(field_name.to_string()))?;

        let unknown_operator = || Error::UnknownOperator {
            field: field_name.to_string(),
            operator: operator_token.unwrap_or("").to_string(),
        };
        let operator = match operator_token {
            None => Operator::Equal,
            Some(token) => Operator::from_token(token).ok_or_else(unknown_operator)?,
        };
        let value_type = descriptor
            .operators
            .get(&operator)
            .copied()
            .ok_or_else(unknown_operator)?;

        if values.is_empty() || values.iter().any(|v| v.is_empty()) {
            return Err(Error::EmptyValue(name.to_string()));
        }

        let value = coerce(name, operator, value_type, values)?;
        descriptor.constraint.check(name, operator, &value)?;

        Ok(QueryParam {
            field: descriptor.field,
            operator,
            value,
        })
    }
}

/// Split `field` or `field_operator`; any other shape is an unknown field.
fn split_parameter_name(name: &str) -> Result<(&str, Option<&str>)> {
    let mut parts = name.split(OPERATOR_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(field), None, _) => Ok((field, None)),
        (Some(field), Some(operator), None) => Ok((field, Some(operator))),
        _ => Err(Error::UnknownField(name.to_string())),
    }
}

fn coerce(param: &str, operator: Operator, value_type: ValueType, values: &[&str]) -> Result<Value> {
    if operator.takes_list() != value_type.is_list() {
        return Err(Error::InternalInvariantViolation(format!(
            "operator '{operator}' declared with value type {value_type:?} for '{param}'"
        )));
    }

    if value_type.is_list() {
        let items = list_items(param, values)?;
        return Ok(match value_type {
            ValueType::IntegerList => Value::IntegerList(
                items
                    .iter()
                    .map(|item| parse_integer(param, item))
                    .collect::<Result<_>>()?,
            ),
            _ => Value::StringList(items.into_iter().map(str::to_string).collect()),
        });
    }

    let [raw] = values else {
        return Err(Error::WrongArity(param.to_string()));
    };
    Ok(match value_type {
        ValueType::String => Value::String(raw.to_string()),
        ValueType::Integer => Value::Integer(parse_integer(param, raw)?),
        ValueType::Timestamp => Value::Timestamp(parse_timestamp(param, raw)?),
        ValueType::Boolean => Value::Boolean(parse_boolean(param, raw)?),
        ValueType::StringList | ValueType::IntegerList => unreachable!("list types handled above"),
    })
}

/// Flatten repeated values and comma-joined lists, preserving input order.
fn list_items<'v>(param: &str, values: &[&'v str]) -> Result<Vec<&'v str>> {
    let mut items = Vec::new();
    for value in values {
        for item in split_list(value) {
            if item.is_empty() {
                return Err(Error::EmptyValue(param.to_string()));
            }
            items.push(item);
        }
    }
    Ok(items)
}

fn parse_integer(param: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| Error::invalid(param, raw))
}

fn parse_timestamp(param: &str, raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_integer(param, raw)
        .ok()
        .and_then(timestamp_from_epoch)
        .ok_or_else(|| Error::invalid(param, raw))
}

fn parse_boolean(param: &str, raw: &str) -> Result<bool> {
    match raw {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(Error::invalid(param, raw)),
    }
}
