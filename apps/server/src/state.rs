//! Shared application state

use std::sync::Arc;

use accounts_filter::FieldSchema;

use crate::config::Config;
use crate::db::{self, AccountStore, PostgresAccountStore};
use crate::Result;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn AccountStore>,
    pub schema: &'static FieldSchema,
}

impl AppState {
    /// Connect to Postgres and build the state used by the server binary.
    pub async fn new(config: Config) -> Result<Self> {
        let pool = db::connect(&config.database).await?;
        let store = PostgresAccountStore::new(pool, config.filter.upsert_attempts);
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: Config, store: Arc<dyn AccountStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            schema: FieldSchema::accounts(),
        }
    }
}
