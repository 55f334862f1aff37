//! PostgreSQL account store

use accounts_filter::schema::columns::ACCOUNT_PREM_END;
use accounts_filter::upsert::LookupTable;
use accounts_filter::{
    compile_account_exists, compile_account_insert, compile_account_update,
    compile_interests_insert, compile_likes_insert, CompiledQuery, Field, Like, ProjectedColumn,
    ValidatedAccount, ValidatedUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::bind::bind_all;
use super::lookup::resolve_or_create_lookup;
use super::traits::AccountStore;
use crate::models::{AccountOut, PremiumOut};
use crate::{Error, Result};

#[derive(Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
    upsert_attempts: u32,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool, upsert_attempts: u32) -> Self {
        Self {
            pool,
            upsert_attempts,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get-or-create a lookup row outside any caller transaction.
    pub async fn resolve_or_create_lookup(&self, table: LookupTable, name: &str) -> Result<Uuid> {
        let mut conn = self.pool.acquire().await?;
        resolve_or_create_lookup(&mut conn, table, name, self.upsert_attempts).await
    }

    async fn begin_write(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn resolve_lookups(
        &self,
        conn: &mut PgConnection,
        city: Option<&str>,
        country: Option<&str>,
    ) -> Result<(Option<Uuid>, Option<Uuid>)> {
        let city_id = match city {
            Some(name) => Some(
                resolve_or_create_lookup(conn, LookupTable::City, name, self.upsert_attempts)
                    .await?,
            ),
            None => None,
        };
        let country_id = match country {
            Some(name) => Some(
                resolve_or_create_lookup(conn, LookupTable::Country, name, self.upsert_attempts)
                    .await?,
            ),
            None => None,
        };
        Ok((city_id, country_id))
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn filter_accounts(&self, query: &CompiledQuery) -> Result<Vec<AccountOut>> {
        let rows = bind_all(sqlx::query(&query.sql), &query.binds)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| decode_account(row, &query.columns))
            .collect()
    }

    async fn add_account(&self, account: ValidatedAccount) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let (city_id, country_id) = self
            .resolve_lookups(&mut tx, account.city.as_deref(), account.country.as_deref())
            .await?;

        let insert = compile_account_insert(&account, city_id, country_id);
        bind_all(sqlx::query(&insert.sql), &insert.binds)
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::from_write)?;

        if let Some(stmt) = compile_likes_insert(&account.likes) {
            bind_all(sqlx::query(&stmt.sql), &stmt.binds)
                .execute(&mut *tx)
                .await
                .map_err(Error::from_write)?;
        }

        if let Some(stmt) = compile_interests_insert(account.id, &account.interests) {
            bind_all(sqlx::query(&stmt.sql), &stmt.binds)
                .execute(&mut *tx)
                .await
                .map_err(Error::from_write)?;
        }

        tx.commit().await?;
        tracing::debug!(
            account_id = account.id,
            likes = account.likes.len(),
            interests = account.interests.len(),
            "Account created"
        );
        Ok(())
    }

    async fn update_account(&self, update: ValidatedUpdate) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let (city_id, country_id) = self
            .resolve_lookups(&mut tx, update.city.as_deref(), update.country.as_deref())
            .await?;

        let found = match compile_account_update(&update, city_id, country_id) {
            Some(stmt) => {
                let result = bind_all(sqlx::query(&stmt.sql), &stmt.binds)
                    .execute(&mut *tx)
                    .await
                    .map_err(Error::from_write)?;
                result.rows_affected() > 0
            }
            None => {
                let stmt = compile_account_exists(update.id);
                bind_all(sqlx::query(&stmt.sql), &stmt.binds)
                    .fetch_optional(&mut *tx)
                    .await?
                    .is_some()
            }
        };

        if !found {
            return Err(Error::NotFound(format!("account {}", update.id)));
        }

        tx.commit().await?;
        tracing::debug!(account_id = update.id, "Account updated");
        Ok(())
    }

    async fn add_likes(&self, likes: Vec<Like>) -> Result<()> {
        let Some(stmt) = compile_likes_insert(&likes) else {
            return Ok(());
        };
        bind_all(sqlx::query(&stmt.sql), &stmt.binds)
            .execute(&self.pool)
            .await
            .map_err(Error::from_write)?;
        tracing::debug!(likes = likes.len(), "Likes added");
        Ok(())
    }
}

fn decode_account(row: &PgRow, columns: &[ProjectedColumn]) -> Result<AccountOut> {
    let mut account = AccountOut::default();
    let mut premium_start = None;
    let mut premium_end = None;

    for column in columns {
        let alias = column.alias.as_str();
        match column.field {
            None => account.id = row.try_get(alias)?,
            Some(Field::Email) => account.email = row.try_get(alias)?,
            Some(Field::Sex) => account.sex = row.try_get(alias)?,
            Some(Field::Status) => account.status = row.try_get(alias)?,
            Some(Field::Birth) => account.birth = epoch(row, alias)?,
            Some(Field::Joined) => account.joined = epoch(row, alias)?,
            Some(Field::Fname) => account.fname = row.try_get(alias)?,
            Some(Field::Sname) => account.sname = row.try_get(alias)?,
            Some(Field::Phone) => account.phone = row.try_get(alias)?,
            Some(Field::Country) => account.country = row.try_get(alias)?,
            Some(Field::City) => account.city = row.try_get(alias)?,
            Some(Field::Premium) if column.column == ACCOUNT_PREM_END => {
                premium_end = epoch(row, alias)?
            }
            Some(Field::Premium) => premium_start = epoch(row, alias)?,
            Some(Field::Interests | Field::Likes) => {}
        }
    }

    if let (Some(start), Some(finish)) = (premium_start, premium_end) {
        account.premium = Some(PremiumOut { start, finish });
    }
    Ok(account)
}

fn epoch(row: &PgRow, alias: &str) -> Result<Option<i64>> {
    Ok(row
        .try_get::<Option<DateTime<Utc>>, _>(alias)?
        .map(|ts| ts.timestamp()))
}
