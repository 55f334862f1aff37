//! Field registry for account filters.
//!
//! The registry is the single source of truth for which `(field, operator)`
//! pairs are legal, which value type each pair carries, which column backs a
//! field and which join a field drags into the query. It is built once and
//! only ever read afterwards.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::constraints::{self, Constraint};
use crate::error::{Error, Result};

/// Filterable account field.
///
/// Variants are declared in wire-name order, so the derived `Ord` sorts
/// fields lexicographically by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Birth,
    City,
    Country,
    Email,
    Fname,
    Interests,
    Joined,
    Likes,
    Phone,
    Premium,
    Sex,
    Sname,
    Status,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Birth,
        Field::City,
        Field::Country,
        Field::Email,
        Field::Fname,
        Field::Interests,
        Field::Joined,
        Field::Likes,
        Field::Phone,
        Field::Premium,
        Field::Sex,
        Field::Sname,
        Field::Status,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Birth => "birth",
            Field::City => "city",
            Field::Country => "country",
            Field::Email => "email",
            Field::Fname => "fname",
            Field::Interests => "interests",
            Field::Joined => "joined",
            Field::Likes => "likes",
            Field::Phone => "phone",
            Field::Premium => "premium",
            Field::Sex => "sex",
            Field::Sname => "sname",
            Field::Status => "status",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filter operator, addressed on the wire as `field_<token>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    Domain,
    IsNull,
    StartsWith,
    Code,
    Year,
    Any,
    Contains,
    Now,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::LessThan,
        Operator::GreaterThan,
        Operator::Domain,
        Operator::IsNull,
        Operator::StartsWith,
        Operator::Code,
        Operator::Year,
        Operator::Any,
        Operator::Contains,
        Operator::Now,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Operator::Equal => "eq",
            Operator::NotEqual => "neq",
            Operator::LessThan => "lt",
            Operator::GreaterThan => "gt",
            Operator::Domain => "domain",
            Operator::IsNull => "null",
            Operator::StartsWith => "starts",
            Operator::Code => "code",
            Operator::Year => "year",
            Operator::Any => "any",
            Operator::Contains => "contains",
            Operator::Now => "now",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }

    /// List operators accept one or more comma-joined values.
    pub fn takes_list(self) -> bool {
        matches!(self, Operator::Any | Operator::Contains)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Timestamp,
    Boolean,
    StringList,
    IntegerList,
}

impl ValueType {
    pub fn is_list(self) -> bool {
        matches!(self, ValueType::StringList | ValueType::IntegerList)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Account,
    City,
    Country,
    Interest,
    Likes,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Account => "account",
            Table::City => "city",
            Table::Country => "country",
            Table::Interest => "interest",
            Table::Likes => "likes",
        }
    }
}

/// A table-qualified column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    pub table: Table,
    pub name: &'static str,
}

impl Column {
    pub const fn new(table: Table, name: &'static str) -> Self {
        Self { table, name }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table.name(), self.name)
    }
}

pub mod columns {
    use super::{Column, Table};

    pub const ACCOUNT_ID: Column = Column::new(Table::Account, "id");
    pub const ACCOUNT_EMAIL: Column = Column::new(Table::Account, "email");
    pub const ACCOUNT_SEX: Column = Column::new(Table::Account, "sex");
    pub const ACCOUNT_STATUS: Column = Column::new(Table::Account, "status");
    pub const ACCOUNT_BIRTH: Column = Column::new(Table::Account, "birth");
    pub const ACCOUNT_JOINED: Column = Column::new(Table::Account, "joined");
    pub const ACCOUNT_NAME: Column = Column::new(Table::Account, "name");
    pub const ACCOUNT_SURNAME: Column = Column::new(Table::Account, "surname");
    pub const ACCOUNT_PHONE: Column = Column::new(Table::Account, "phone");
    pub const ACCOUNT_CITY_ID: Column = Column::new(Table::Account, "city_id");
    pub const ACCOUNT_COUNTRY_ID: Column = Column::new(Table::Account, "country_id");
    pub const ACCOUNT_PREM_START: Column = Column::new(Table::Account, "prem_start");
    pub const ACCOUNT_PREM_END: Column = Column::new(Table::Account, "prem_end");
    pub const CITY_ID: Column = Column::new(Table::City, "id");
    pub const CITY_NAME: Column = Column::new(Table::City, "name");
    pub const COUNTRY_ID: Column = Column::new(Table::Country, "id");
    pub const COUNTRY_NAME: Column = Column::new(Table::Country, "name");
    pub const LIKES_LIKER_ID: Column = Column::new(Table::Likes, "liker_id");
    pub const LIKES_LIKEE_ID: Column = Column::new(Table::Likes, "likee_id");
    pub const LIKES_TS: Column = Column::new(Table::Likes, "ts");
    pub const INTEREST_ACCOUNT_ID: Column = Column::new(Table::Interest, "account_id");
    pub const INTEREST_NAME: Column = Column::new(Table::Interest, "name");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// Join required to reach a field stored outside `account`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec {
    pub table: Table,
    pub on_left: Column,
    pub on_right: Column,
    pub kind: JoinKind,
    /// One account row may match many joined rows.
    pub fan_out: bool,
}

impl JoinSpec {
    pub fn to_sql(&self) -> String {
        let keyword = match self.kind {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        };
        format!(
            "{} {} ON {} = {}",
            keyword,
            self.table.name(),
            self.on_left,
            self.on_right
        )
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub field: Field,
    pub column: Column,
    /// Second column for range fields (premium end).
    pub end_column: Option<Column>,
    pub join: Option<JoinSpec>,
    pub operators: BTreeMap<Operator, ValueType>,
    /// Whether referencing the field adds its column(s) to the projection.
    pub projected: bool,
    pub constraint: Constraint,
}

impl FieldDescriptor {
    pub fn new(field: Field, column: Column, constraint: Constraint) -> Self {
        Self {
            field,
            column,
            end_column: None,
            join: None,
            operators: BTreeMap::new(),
            projected: true,
            constraint,
        }
    }

    pub fn operator(mut self, operator: Operator, value_type: ValueType) -> Self {
        self.operators.insert(operator, value_type);
        self
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.join = Some(join);
        self
    }

    pub fn end_column(mut self, column: Column) -> Self {
        self.end_column = Some(column);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.projected = false;
        self
    }

    pub fn permits(&self, operator: Operator) -> bool {
        self.operators.contains_key(&operator)
    }
}

static ACCOUNTS: Lazy<FieldSchema> = Lazy::new(build_accounts_schema);

/// Immutable registry of filterable fields.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: BTreeMap<Field, FieldDescriptor>,
}

impl FieldSchema {
    /// The process-wide account schema.
    pub fn accounts() -> &'static FieldSchema {
        &ACCOUNTS
    }

    pub fn builder() -> FieldSchemaBuilder {
        FieldSchemaBuilder::default()
    }

    pub fn descriptor(&self, field: Field) -> Option<&FieldDescriptor> {
        self.fields.get(&field)
    }

    /// Look up a descriptor by its wire name.
    pub fn lookup(&self, name: &str) -> Option<&FieldDescriptor> {
        Field::from_name(name).and_then(|f| self.descriptor(f))
    }

    /// Descriptor lookup for fields that already passed parsing.
    pub(crate) fn require(&self, field: Field) -> Result<&FieldDescriptor> {
        self.descriptor(field).ok_or_else(|| {
            Error::InternalInvariantViolation(format!("field '{}' has no schema mapping", field))
        })
    }

    pub fn operators_for(&self, field: Field) -> Vec<Operator> {
        self.descriptor(field)
            .map(|d| d.operators.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn value_type_for(&self, field: Field, operator: Operator) -> Option<ValueType> {
        self.descriptor(field)
            .and_then(|d| d.operators.get(&operator).copied())
    }

    pub fn column_for(&self, field: Field) -> Option<Column> {
        self.descriptor(field).map(|d| d.column)
    }

    pub fn join_for(&self, field: Field) -> Option<&JoinSpec> {
        self.descriptor(field).and_then(|d| d.join.as_ref())
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }
}

#[derive(Debug, Default)]
pub struct FieldSchemaBuilder {
    fields: BTreeMap<Field, FieldDescriptor>,
}

impl FieldSchemaBuilder {
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(descriptor.field, descriptor);
        self
    }

    pub fn build(self) -> FieldSchema {
        FieldSchema {
            fields: self.fields,
        }
    }
}

fn build_accounts_schema() -> FieldSchema {
    use columns::*;
    use Operator::*;

    let city_join = JoinSpec {
        table: Table::City,
        on_left: CITY_ID,
        on_right: ACCOUNT_CITY_ID,
        kind: JoinKind::Left,
        fan_out: false,
    };
    let country_join = JoinSpec {
        table: Table::Country,
        on_left: COUNTRY_ID,
        on_right: ACCOUNT_COUNTRY_ID,
        kind: JoinKind::Left,
        fan_out: false,
    };
    let interest_join = JoinSpec {
        table: Table::Interest,
        on_left: INTEREST_ACCOUNT_ID,
        on_right: ACCOUNT_ID,
        kind: JoinKind::Inner,
        fan_out: true,
    };
    let likes_join = JoinSpec {
        table: Table::Likes,
        on_left: LIKES_LIKER_ID,
        on_right: ACCOUNT_ID,
        kind: JoinKind::Inner,
        fan_out: true,
    };

    FieldSchema::builder()
        .field(
            FieldDescriptor::new(Field::Sex, ACCOUNT_SEX, Constraint::OneOf(constraints::SEXES))
                .operator(Equal, ValueType::String),
        )
        .field(
            FieldDescriptor::new(Field::Email, ACCOUNT_EMAIL, constraints::EMAIL)
                .operator(Domain, ValueType::String)
                .operator(LessThan, ValueType::String)
                .operator(GreaterThan, ValueType::String),
        )
        .field(
            FieldDescriptor::new(
                Field::Status,
                ACCOUNT_STATUS,
                Constraint::OneOf(constraints::STATUSES),
            )
            .operator(Equal, ValueType::String)
            .operator(NotEqual, ValueType::String),
        )
        .field(
            FieldDescriptor::new(Field::Fname, ACCOUNT_NAME, constraints::FIRSTNAME)
                .operator(Equal, ValueType::String)
                .operator(Any, ValueType::StringList)
                .operator(IsNull, ValueType::Boolean),
        )
        .field(
            FieldDescriptor::new(Field::Sname, ACCOUNT_SURNAME, constraints::SURNAME)
                .operator(Equal, ValueType::String)
                .operator(StartsWith, ValueType::String)
                .operator(IsNull, ValueType::Boolean),
        )
        .field(
            FieldDescriptor::new(Field::Phone, ACCOUNT_PHONE, constraints::PHONE)
                .operator(Code, ValueType::String)
                .operator(IsNull, ValueType::Boolean),
        )
        .field(
            FieldDescriptor::new(Field::Country, COUNTRY_NAME, constraints::COUNTRY)
                .join(country_join)
                .operator(Equal, ValueType::String)
                .operator(IsNull, ValueType::Boolean),
        )
        .field(
            FieldDescriptor::new(Field::City, CITY_NAME, constraints::CITY)
                .join(city_join)
                .operator(Equal, ValueType::String)
                .operator(Any, ValueType::StringList)
                .operator(IsNull, ValueType::Boolean),
        )
        .field(
            FieldDescriptor::new(
                Field::Birth,
                ACCOUNT_BIRTH,
                Constraint::Window(constraints::BIRTH_WINDOW),
            )
            .operator(LessThan, ValueType::Timestamp)
            .operator(GreaterThan, ValueType::Timestamp)
            .operator(Year, ValueType::Integer),
        )
        .field(
            FieldDescriptor::new(
                Field::Joined,
                ACCOUNT_JOINED,
                Constraint::Window(constraints::JOINED_WINDOW),
            )
            .operator(LessThan, ValueType::Timestamp)
            .operator(GreaterThan, ValueType::Timestamp)
            .operator(Year, ValueType::Integer),
        )
        .field(
            FieldDescriptor::new(Field::Interests, INTEREST_NAME, constraints::INTEREST)
                .join(interest_join)
                .hidden()
                .operator(Contains, ValueType::StringList)
                .operator(Any, ValueType::StringList),
        )
        .field(
            FieldDescriptor::new(Field::Likes, LIKES_LIKEE_ID, Constraint::Identifier)
                .join(likes_join)
                .hidden()
                .operator(Contains, ValueType::IntegerList),
        )
        .field(
            FieldDescriptor::new(
                Field::Premium,
                ACCOUNT_PREM_START,
                Constraint::Window(constraints::PREMIUM_WINDOW),
            )
            .end_column(ACCOUNT_PREM_END)
            .operator(Now, ValueType::Boolean)
            .operator(IsNull, ValueType::Boolean),
        )
        .build()
}
