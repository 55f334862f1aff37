//! Statement assembly for account filters.
//!
//! Turns a [`FilterSet`] into one `SELECT` with:
//! - a projection driven by the referenced fields
//! - one join per foreign table that is projected or filtered in place
//! - predicates in a fixed order, renumbered to `$1..$n`
//! - grouping when a one-to-many join is present

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::params::{FilterSet, ParameterParser};
use crate::predicate::{CompiledPredicate, PredicateCompiler};
use crate::schema::columns::{ACCOUNT_EMAIL, ACCOUNT_ID};
use crate::schema::{Column, Field, FieldSchema, JoinSpec, Table};
use crate::value::BindValue;

/// One projected column and the alias rows are decoded by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
    pub field: Option<Field>,
    pub column: Column,
    pub alias: String,
}

impl ProjectedColumn {
    fn new(field: Option<Field>, column: Column, alias: impl Into<String>) -> Self {
        Self {
            field,
            column,
            alias: alias.into(),
        }
    }

    fn to_sql(&self) -> String {
        if self.column.name == self.alias {
            self.column.to_string()
        } else {
            format!("{} AS {}", self.column, self.alias)
        }
    }
}

/// Executable statement: SQL text with `$n` placeholders and matching binds.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
    pub columns: Vec<ProjectedColumn>,
}

/// Compile raw request parameters into a filter statement.
pub fn compile(schema: &FieldSchema, items: &[(String, String)]) -> Result<CompiledQuery> {
    compile_at(schema, items, Utc::now())
}

/// Same as [`compile`], with the instant used by `now` checks fixed.
pub fn compile_at(
    schema: &FieldSchema,
    items: &[(String, String)],
    now: DateTime<Utc>,
) -> Result<CompiledQuery> {
    let filters = ParameterParser::new(schema).parse_items(items)?;
    QueryAssembler::at(schema, now).assemble(&filters)
}

#[derive(Debug, Clone, Copy)]
pub struct QueryAssembler<'a> {
    schema: &'a FieldSchema,
    compiler: PredicateCompiler<'a>,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(schema: &'a FieldSchema) -> Self {
        Self::at(schema, Utc::now())
    }

    pub fn at(schema: &'a FieldSchema, now: DateTime<Utc>) -> Self {
        Self {
            schema,
            compiler: PredicateCompiler::at(schema, now),
        }
    }

    pub fn assemble(&self, filters: &FilterSet) -> Result<CompiledQuery> {
        let columns = self.projection(&filters.referenced_fields)?;

        let mut params: Vec<_> = filters.params.iter().collect();
        params.sort_by_key(|p| (p.field, p.operator.token()));
        let predicates = params
            .into_iter()
            .map(|p| self.compiler.compile(p))
            .collect::<Result<Vec<CompiledPredicate>>>()?;
        let joins = self.joins(&filters.referenced_fields, &predicates)?;

        let mut sql = String::from("SELECT ");
        sql.push_str(
            &columns
                .iter()
                .map(ProjectedColumn::to_sql)
                .collect::<Vec<_>>()
                .join(", "),
        );
        sql.push_str(" FROM ");
        sql.push_str(Table::Account.name());
        for join in &joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        let mut binds = Vec::new();
        let mut placeholders = Placeholders::default();

        if !predicates.is_empty() {
            let clauses: Vec<String> = predicates
                .iter()
                .map(|p| {
                    binds.extend(p.binds.iter().cloned());
                    placeholders.renumber(&p.sql)
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if joins.iter().any(|j| j.fan_out) {
            sql.push_str(" GROUP BY ");
            sql.push_str(
                &columns
                    .iter()
                    .map(|c| c.column.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&ACCOUNT_ID.to_string());
        sql.push_str(" DESC");

        if filters.limit != 0 {
            sql.push_str(" LIMIT ");
            sql.push_str(&placeholders.renumber("?"));
            binds.push(BindValue::Integer(i64::from(filters.limit)));
        }

        if placeholders.count != binds.len() {
            return Err(Error::InternalInvariantViolation(format!(
                "{} placeholders for {} binds",
                placeholders.count,
                binds.len()
            )));
        }

        tracing::debug!(sql = %sql, binds = binds.len(), "compiled account filter");

        Ok(CompiledQuery {
            sql,
            binds,
            columns,
        })
    }

    fn projection(&self, referenced: &BTreeSet<Field>) -> Result<Vec<ProjectedColumn>> {
        let mut projection = vec![
            ProjectedColumn::new(None, ACCOUNT_ID, "id"),
            ProjectedColumn::new(Some(Field::Email), ACCOUNT_EMAIL, "email"),
        ];
        for field in referenced {
            let descriptor = self.schema.require(*field)?;
            if !descriptor.projected || projection.iter().any(|c| c.column == descriptor.column) {
                continue;
            }
            match descriptor.end_column {
                Some(end) => {
                    projection.push(ProjectedColumn::new(
                        Some(*field),
                        descriptor.column,
                        format!("{field}_start"),
                    ));
                    projection.push(ProjectedColumn::new(Some(*field), end, format!("{field}_end")));
                }
                None => projection.push(ProjectedColumn::new(
                    Some(*field),
                    descriptor.column,
                    field.name(),
                )),
            }
        }
        Ok(projection)
    }

    fn joins(
        &self,
        referenced: &BTreeSet<Field>,
        predicates: &[CompiledPredicate],
    ) -> Result<Vec<JoinSpec>> {
        let mut joins: Vec<JoinSpec> = Vec::new();
        for field in referenced {
            let descriptor = self.schema.require(*field)?;
            let needed = descriptor.projected
                || predicates.iter().any(|p| p.field == *field && p.uses_join);
            if let Some(join) = descriptor.join.filter(|_| needed) {
                if !joins.iter().any(|j| j.table == join.table) {
                    joins.push(join);
                }
            }
        }
        Ok(joins)
    }
}

/// Rewrites `?` markers into sequential Postgres placeholders.
#[derive(Debug, Default)]
struct Placeholders {
    count: usize,
}

impl Placeholders {
    fn renumber(&mut self, fragment: &str) -> String {
        let mut out = String::with_capacity(fragment.len() + 4);
        for c in fragment.chars() {
            if c == '?' {
                self.count += 1;
                out.push('$');
                out.push_str(&self.count.to_string());
            } else {
                out.push(c);
            }
        }
        out
    }
}
