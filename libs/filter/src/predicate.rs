//! Per-parameter SQL fragments.
//!
//! Fragments use `?` placeholders; the assembler renumbers them once the
//! final predicate order is known.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{Error, Result};
use crate::escape::escape_like_pattern;
use crate::params::QueryParam;
use crate::schema::{Column, Field, FieldDescriptor, FieldSchema, JoinSpec, Operator};
use crate::value::{BindValue, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub field: Field,
    pub operator: Operator,
    pub sql: String,
    pub binds: Vec<BindValue>,
    /// The fragment reads the field's joined table from the outer query.
    pub uses_join: bool,
}

impl CompiledPredicate {
    fn new(param: &QueryParam, sql: String, binds: Vec<BindValue>) -> Self {
        Self {
            field: param.field,
            operator: param.operator,
            sql,
            binds,
            uses_join: true,
        }
    }
}

/// Compiles validated parameters against one captured instant.
#[derive(Debug, Clone, Copy)]
pub struct PredicateCompiler<'a> {
    schema: &'a FieldSchema,
    now: DateTime<Utc>,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(schema: &'a FieldSchema) -> Self {
        Self::at(schema, Utc::now())
    }

    pub fn at(schema: &'a FieldSchema, now: DateTime<Utc>) -> Self {
        Self { schema, now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn compile(&self, param: &QueryParam) -> Result<CompiledPredicate> {
        let descriptor = self.schema.require(param.field)?;
        let declared = descriptor.operators.get(&param.operator).copied();
        if declared != Some(param.value.value_type()) {
            return Err(Error::InternalInvariantViolation(format!(
                "'{}_{}' reached the compiler with {:?} (declared {:?})",
                param.field,
                param.operator,
                param.value.value_type(),
                declared
            )));
        }

        let col = descriptor.column;
        let predicate = match (param.operator, &param.value) {
            (Operator::Equal, v) => comparison(param, col, "=", v)?,
            (Operator::NotEqual, v) => comparison(param, col, "<>", v)?,
            (Operator::LessThan, v) => comparison(param, col, "<", v)?,
            (Operator::GreaterThan, v) => comparison(param, col, ">", v)?,
            (Operator::Domain, Value::String(s)) => {
                like(param, col, format!("%@{}", escape_like_pattern(s)))
            }
            (Operator::StartsWith, Value::String(s)) => {
                like(param, col, format!("{}%", escape_like_pattern(s)))
            }
            (Operator::Code, Value::String(s)) => {
                like(param, col, format!("%({})%", escape_like_pattern(s)))
            }
            (Operator::IsNull, Value::Boolean(is_null)) => {
                let sql = if *is_null {
                    format!("{col} IS NULL")
                } else {
                    format!("{col} IS NOT NULL")
                };
                CompiledPredicate::new(param, sql, Vec::new())
            }
            (Operator::Any, v) => {
                let binds = list_binds(v);
                CompiledPredicate::new(param, in_list(col, binds.len()), binds)
            }
            (Operator::Contains, v) => {
                let join = fan_out_join(descriptor)?;
                let mut binds = list_binds(v);
                let distinct = distinct_count(&binds);
                // Counted per owner, independent of any outer join on the same table.
                let sql = format!(
                    "{owner} IN (SELECT {key} FROM {table} WHERE {members} \
                     GROUP BY {key} HAVING COUNT(DISTINCT {col}) = ?)",
                    owner = join.on_right,
                    key = join.on_left,
                    table = join.table.name(),
                    members = in_list(col, binds.len()),
                );
                binds.push(BindValue::Integer(distinct));
                let mut predicate = CompiledPredicate::new(param, sql, binds);
                predicate.uses_join = false;
                predicate
            }
            (Operator::Year, Value::Integer(year)) => {
                let (start, end) = year_bounds(param, *year)?;
                CompiledPredicate::new(
                    param,
                    format!("({col} >= ? AND {col} < ?)"),
                    vec![BindValue::Timestamp(start), BindValue::Timestamp(end)],
                )
            }
            (Operator::Now, Value::Boolean(_)) => {
                let end = end_column(descriptor)?;
                CompiledPredicate::new(
                    param,
                    format!("({col} <= ? AND {end} >= ?)"),
                    vec![BindValue::Timestamp(self.now), BindValue::Timestamp(self.now)],
                )
            }
            (op, value) => {
                return Err(Error::InternalInvariantViolation(format!(
                    "operator '{op}' cannot compile {:?}",
                    value.value_type()
                )))
            }
        };
        Ok(predicate)
    }
}

fn comparison(param: &QueryParam, col: Column, op: &str, value: &Value) -> Result<CompiledPredicate> {
    let bind = scalar_bind(value).ok_or_else(|| {
        Error::InternalInvariantViolation(format!(
            "'{}_{}' expects a scalar value",
            param.field, param.operator
        ))
    })?;
    Ok(CompiledPredicate::new(
        param,
        format!("{col} {op} ?"),
        vec![bind],
    ))
}

fn like(param: &QueryParam, col: Column, pattern: String) -> CompiledPredicate {
    CompiledPredicate::new(param, format!("{col} LIKE ?"), vec![BindValue::Text(pattern)])
}

fn scalar_bind(value: &Value) -> Option<BindValue> {
    match value {
        Value::String(s) => Some(BindValue::Text(s.clone())),
        Value::Integer(i) => Some(BindValue::Integer(*i)),
        Value::Timestamp(ts) => Some(BindValue::Timestamp(*ts)),
        Value::Boolean(_) | Value::StringList(_) | Value::IntegerList(_) => None,
    }
}

fn list_binds(value: &Value) -> Vec<BindValue> {
    match value {
        Value::StringList(items) => items.iter().cloned().map(BindValue::Text).collect(),
        Value::IntegerList(items) => items.iter().copied().map(BindValue::Integer).collect(),
        other => scalar_bind(other).into_iter().collect(),
    }
}

fn in_list(col: Column, count: usize) -> String {
    format!("{col} IN ({})", vec!["?"; count].join(", "))
}

fn distinct_count(binds: &[BindValue]) -> i64 {
    let mut seen: Vec<&BindValue> = Vec::with_capacity(binds.len());
    for bind in binds {
        if !seen.contains(&bind) {
            seen.push(bind);
        }
    }
    i64::try_from(seen.len()).unwrap_or(i64::MAX)
}

/// Half-open UTC calendar year `[Jan 1 year, Jan 1 year+1)`.
fn year_bounds(param: &QueryParam, year: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let jan_first = |y: i64| {
        i32::try_from(y)
            .ok()
            .and_then(|y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).single())
    };
    match (jan_first(year), year.checked_add(1).and_then(jan_first)) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(Error::out_of_range(
            &format!("{}_{}", param.field, param.operator),
            format!("year {year} is not representable"),
        )),
    }
}

fn fan_out_join(descriptor: &FieldDescriptor) -> Result<JoinSpec> {
    descriptor
        .join
        .filter(|join| join.fan_out)
        .ok_or_else(|| {
            Error::InternalInvariantViolation(format!(
                "field '{}' has no one-to-many join for a contains check",
                descriptor.field
            ))
        })
}

fn end_column(descriptor: &FieldDescriptor) -> Result<Column> {
    descriptor.end_column.ok_or_else(|| {
        Error::InternalInvariantViolation(format!(
            "field '{}' has no end column for a range check",
            descriptor.field
        ))
    })
}
