//! Account handlers
//!
//! - GET  /accounts/filter/  - filtered search
//! - POST /accounts/new/     - create an account
//! - POST /accounts/{id}/    - partial update
//! - POST /accounts/likes/   - bulk likes

use accounts_filter::{AccountInput, AccountUpdate, LikesInput, ParameterParser, QueryAssembler};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{models::AccountsOut, state::AppState, Error, Result};

pub async fn filter_accounts(
    State(state): State<AppState>,
    Query(items): Query<Vec<(String, String)>>,
) -> Result<Json<AccountsOut>> {
    let mut parser = ParameterParser::new(state.schema);
    if let Some(max_limit) = state.config.filter.max_limit {
        parser = parser.with_max_limit(max_limit);
    }
    let filters = parser.parse_items(&items)?;
    let query = QueryAssembler::new(state.schema).assemble(&filters)?;

    let accounts = state.store.filter_accounts(&query).await?;
    tracing::debug!(
        params = filters.params.len(),
        results = accounts.len(),
        "Filter executed"
    );
    Ok(Json(AccountsOut { accounts }))
}

pub async fn create_account(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    let account = parse_body::<AccountInput>(&body)?.validate()?;
    state.store.add_account(account).await?;
    Ok((StatusCode::CREATED, Json(json!({}))))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    // Non-numeric ids cannot name an account.
    let id: i64 = id
        .parse()
        .map_err(|_| Error::NotFound(format!("account {id}")))?;
    let update = parse_body::<AccountUpdate>(&body)?.validate(id)?;
    state.store.update_account(update).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({}))))
}

pub async fn add_likes(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    let likes = parse_body::<LikesInput>(&body)?.validate()?;
    state.store.add_likes(likes).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({}))))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::BadRequest(format!("Invalid JSON body: {e}")))
}
