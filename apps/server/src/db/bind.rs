use accounts_filter::{BindValue, SqlType};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;
use uuid::Uuid;

/// Bind compiled values in order.
pub(crate) fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    binds: &'q [BindValue],
) -> Query<'q, Postgres, PgArguments> {
    for value in binds {
        query = match value {
            BindValue::Text(v) => query.bind(v.as_str()),
            BindValue::Integer(v) => query.bind(*v),
            BindValue::Timestamp(v) => query.bind(*v),
            BindValue::Uuid(v) => query.bind(*v),
            BindValue::Null(SqlType::Text) => query.bind(None::<String>),
            BindValue::Null(SqlType::Integer) => query.bind(None::<i64>),
            BindValue::Null(SqlType::Timestamp) => query.bind(None::<DateTime<Utc>>),
            BindValue::Null(SqlType::Uuid) => query.bind(None::<Uuid>),
            BindValue::TextArray(vs) => query.bind(vs.as_slice()),
            BindValue::IntegerArray(vs) => query.bind(vs.as_slice()),
            BindValue::TimestampArray(vs) => query.bind(vs.as_slice()),
        };
    }
    query
}
