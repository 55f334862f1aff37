//! Account API routes
//!
//! Both the trailing-slash and bare forms of each path are registered.

use crate::api::handlers::accounts;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/filter/", get(accounts::filter_accounts))
        .route("/accounts/filter", get(accounts::filter_accounts))
        .route("/accounts/new/", post(accounts::create_account))
        .route("/accounts/new", post(accounts::create_account))
        .route("/accounts/likes/", post(accounts::add_likes))
        .route("/accounts/likes", post(accounts::add_likes))
        .route("/accounts/:id/", post(accounts::update_account))
        .route("/accounts/:id", post(accounts::update_account))
}
