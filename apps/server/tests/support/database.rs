use std::sync::Arc;

use accounts::{
    api::create_router,
    db::{self, PostgresAccountStore},
    AppState, Config,
};
use anyhow::Context as _;
use axum::Router;
use futures::FutureExt as _;
use sqlx::{Connection as _, PgPool};
use url::Url;
use uuid::Uuid;

/// Tables the server reads and writes. Deployments provision these themselves.
pub const TEST_SCHEMA_DDL: &str = r#"
CREATE TABLE city (
    id uuid PRIMARY KEY,
    name varchar(50) NOT NULL UNIQUE
);
CREATE TABLE country (
    id uuid PRIMARY KEY,
    name varchar(50) NOT NULL UNIQUE
);
CREATE TABLE account (
    id int4 PRIMARY KEY,
    status text NOT NULL,
    email varchar(100) NOT NULL UNIQUE,
    sex text NOT NULL,
    birth timestamptz NOT NULL,
    joined timestamptz NOT NULL,
    name varchar(50),
    surname varchar(50),
    phone varchar(16),
    city_id uuid REFERENCES city (id),
    country_id uuid REFERENCES country (id),
    prem_start timestamptz,
    prem_end timestamptz
);
CREATE TABLE likes (
    liker_id int4 NOT NULL REFERENCES account (id),
    likee_id int4 NOT NULL REFERENCES account (id),
    ts timestamptz NOT NULL
);
CREATE TABLE interest (
    account_id int4 NOT NULL REFERENCES account (id),
    name varchar(100) NOT NULL
);
"#;

/// A throwaway Postgres schema holding the account tables.
pub struct TestDatabase {
    pub config: Config,
    pub pool: PgPool,
    schema: String,
    admin_database_url: String,
}

impl TestDatabase {
    /// Returns `None` when no test database is configured.
    pub async fn new() -> anyhow::Result<Option<Self>> {
        super::init_tracing();

        let mut config = Config::load().context("load Config for tests")?;
        let Some(admin_database_url) = config
            .database
            .test_database_url
            .clone()
            .or_else(|| std::env::var("TEST_DATABASE_URL").ok())
        else {
            return Ok(None);
        };

        let schema = format!("test_{}", Uuid::new_v4().simple());
        let mut admin_conn = sqlx::PgConnection::connect(&admin_database_url)
            .await
            .context("connect admin db for schema create")?;
        sqlx::query(&format!(r#"CREATE SCHEMA "{}""#, schema))
            .execute(&mut admin_conn)
            .await
            .context("create test schema")?;

        config.database.url = with_search_path(&admin_database_url, &schema)?;
        config.database.pool_min_size = 0;
        // Concurrency tests need a few connections at once.
        config.database.pool_max_size = 8;

        let pool = db::connect(&config.database)
            .await
            .context("connect test pool")?;
        sqlx::raw_sql(TEST_SCHEMA_DDL)
            .execute(&pool)
            .await
            .context("create test tables")?;

        Ok(Some(Self {
            config,
            pool,
            schema,
            admin_database_url,
        }))
    }

    pub fn store(&self) -> PostgresAccountStore {
        PostgresAccountStore::new(self.pool.clone(), self.config.filter.upsert_attempts)
    }

    pub fn router(&self) -> Router {
        let state = AppState::with_store(self.config.clone(), Arc::new(self.store()));
        create_router(state)
    }

    pub async fn count(&self, table: &str) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("count rows in {table}"))?;
        Ok(count)
    }

    pub async fn cleanup(self) -> anyhow::Result<()> {
        self.pool.close().await;

        let mut admin_conn = sqlx::PgConnection::connect(&self.admin_database_url)
            .await
            .context("connect admin db for schema drop")?;
        sqlx::query(&format!(r#"DROP SCHEMA "{}" CASCADE"#, self.schema))
            .execute(&mut admin_conn)
            .await
            .context("drop test schema")?;

        Ok(())
    }
}

/// Run `f` against a fresh schema, or skip when no database is configured.
pub async fn with_test_database<F>(f: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(
        &'a TestDatabase,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + 'a>,
    >,
{
    let Some(database) = TestDatabase::new().await? else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return Ok(());
    };

    let result = std::panic::AssertUnwindSafe(f(&database))
        .catch_unwind()
        .await;
    if let Err(e) = database.cleanup().await {
        eprintln!("test schema cleanup failed: {e:?}");
    }

    match result {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

fn with_search_path(database_url: &str, schema: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(database_url).context("parse database URL")?;
    url.query_pairs_mut()
        .append_pair("options", &format!("-c search_path={}", schema));
    Ok(url.to_string())
}
