//! Accounts server
//!
//! HTTP service over the account dataset:
//! - Filtered account search compiled to parameterized SQL
//! - Account creation and partial updates with city/country get-or-create
//! - Bulk like ingestion

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
