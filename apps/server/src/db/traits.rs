//! Storage trait for account backends

use accounts_filter::{CompiledQuery, Like, ValidatedAccount, ValidatedUpdate};
use async_trait::async_trait;

use crate::{models::AccountOut, Result};

/// Storage operations behind the HTTP API.
///
/// Filter queries arrive fully compiled; the store only executes them and
/// decodes the projected columns.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Run a compiled filter statement.
    async fn filter_accounts(&self, query: &CompiledQuery) -> Result<Vec<AccountOut>>;

    /// Insert a new account with its lookups, likes and interests atomically.
    ///
    /// # Errors
    /// * `Conflict` - An account with the same id or email exists
    async fn add_account(&self, account: ValidatedAccount) -> Result<()>;

    /// Apply a partial update.
    ///
    /// # Errors
    /// * `NotFound` - The account does not exist
    async fn update_account(&self, update: ValidatedUpdate) -> Result<()>;

    /// Insert a batch of likes.
    async fn add_likes(&self, likes: Vec<Like>) -> Result<()>;
}
