use std::collections::BTreeMap;
use std::sync::Mutex;

use accounts::{db::AccountStore, models::AccountOut, Error, Result};
use accounts_filter::{CompiledQuery, Like, ValidatedAccount, ValidatedUpdate};
use async_trait::async_trait;

/// In-memory store that records what the handlers hand it.
#[derive(Default)]
pub struct RecordingStore {
    pub queries: Mutex<Vec<CompiledQuery>>,
    pub accounts: Mutex<BTreeMap<i32, ValidatedAccount>>,
    pub updates: Mutex<Vec<ValidatedUpdate>>,
    pub likes: Mutex<Vec<Like>>,
    /// Rows returned by every filter call.
    pub results: Mutex<Vec<AccountOut>>,
}

impl RecordingStore {
    pub fn last_query(&self) -> Option<CompiledQuery> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub fn set_results(&self, rows: Vec<AccountOut>) {
        *self.results.lock().unwrap() = rows;
    }
}

#[async_trait]
impl AccountStore for RecordingStore {
    async fn filter_accounts(&self, query: &CompiledQuery) -> Result<Vec<AccountOut>> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.results.lock().unwrap().clone())
    }

    async fn add_account(&self, account: ValidatedAccount) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&account.id) || accounts.values().any(|a| a.email == account.email) {
            return Err(Error::Conflict(format!("account {} exists", account.id)));
        }
        accounts.insert(account.id, account);
        Ok(())
    }

    async fn update_account(&self, update: ValidatedUpdate) -> Result<()> {
        if !self.accounts.lock().unwrap().contains_key(&update.id) {
            return Err(Error::NotFound(format!("account {}", update.id)));
        }
        self.updates.lock().unwrap().push(update);
        Ok(())
    }

    async fn add_likes(&self, likes: Vec<Like>) -> Result<()> {
        self.likes.lock().unwrap().extend(likes);
        Ok(())
    }
}
