//! Request handlers for API endpoints
//!
//! Handlers coordinate between routes and the store, handling:
//! - Request extraction and validation
//! - Filter compilation
//! - Response formatting

pub mod accounts;

pub use accounts::*;
