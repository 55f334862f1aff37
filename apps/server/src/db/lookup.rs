//! Get-or-create for city and country rows

use accounts_filter::upsert::{lookup_upsert, new_lookup_id, LookupTable};
use sqlx::{PgConnection, Row};
use uuid::Uuid;

use super::bind::bind_all;
use crate::{Error, Result};

/// Resolve `name` in `table` to an id, inserting the row when it is missing.
///
/// An empty result means the insert lost a race to a writer that committed
/// after this statement's snapshot was taken; the statement is re-issued, and
/// the next snapshot sees the committed row.
pub async fn resolve_or_create_lookup(
    conn: &mut PgConnection,
    table: LookupTable,
    name: &str,
    attempts: u32,
) -> Result<Uuid> {
    for attempt in 1..=attempts {
        let stmt = lookup_upsert(table, new_lookup_id(), name);
        let row = bind_all(sqlx::query(&stmt.sql), &stmt.binds)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(row) = row {
            return Ok(row.try_get::<Uuid, _>(0)?);
        }

        tracing::debug!(%table, name, attempt, "Lookup upsert returned no row, retrying");
    }

    Err(Error::Internal(format!(
        "could not resolve {table} '{name}' after {attempts} attempts"
    )))
}
