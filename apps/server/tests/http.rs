//! HTTP surface over an in-memory store
//!
//! Covers status mapping and what the handlers hand to the store.

#[allow(unused)]
mod support;

use accounts::models::{AccountOut, PremiumOut};
use accounts_filter::BindValue;
use axum::http::StatusCode;
use serde_json::json;
use support::{account_body, assert_status, TestApp};

#[tokio::test]
async fn health_reports_ok() -> anyhow::Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await?;
    assert_status(status, StatusCode::OK, "health");
    assert_eq!(body["status"], "ok");
    Ok(())
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn filter_compiles_parameters_before_hitting_the_store() -> anyhow::Result<()> {
    let app = TestApp::new();
    let (status, body) = app
        .get("/accounts/filter/?sex_eq=f&city_any=Moscow,Kazan&limit=7&query_id=12")
        .await?;
    assert_status(status, StatusCode::OK, "filter");
    assert_eq!(body, json!({"accounts": []}));

    let query = app.store.last_query().expect("store saw the query");
    assert!(query.sql.contains("JOIN city ON city.id = account.city_id"));
    assert!(query.sql.ends_with("ORDER BY account.id DESC LIMIT $4"));
    assert!(!query.sql.contains("Moscow"));
    assert!(query.binds.contains(&BindValue::Text("Kazan".into())));
    assert_eq!(query.binds.last(), Some(&BindValue::Integer(7)));
    Ok(())
}

#[tokio::test]
async fn filter_path_without_trailing_slash_is_routed() -> anyhow::Result<()> {
    let app = TestApp::new();
    let (status, _) = app.get("/accounts/filter?limit=1&query_id=1").await?;
    assert_status(status, StatusCode::OK, "filter without slash");
    Ok(())
}

#[tokio::test]
async fn filter_serializes_only_projected_fields() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.store.set_results(vec![AccountOut {
        id: 42,
        email: "x@mail.ru".into(),
        premium: Some(PremiumOut {
            start: 1_527_811_200,
            finish: 1_559_347_200,
        }),
        ..AccountOut::default()
    }]);

    let (status, body) = app
        .get("/accounts/filter/?premium_null=0&limit=1&query_id=3")
        .await?;
    assert_status(status, StatusCode::OK, "filter");
    assert_eq!(
        body,
        json!({"accounts": [{
            "id": 42,
            "email": "x@mail.ru",
            "premium": {"start": 1_527_811_200, "finish": 1_559_347_200}
        }]})
    );
    Ok(())
}

#[tokio::test]
async fn filter_rejects_bad_parameters_with_400() -> anyhow::Result<()> {
    let app = TestApp::new();
    for uri in [
        "/accounts/filter/?limit=5",
        "/accounts/filter/?query_id=1",
        "/accounts/filter/?foo_eq=1&limit=5&query_id=1",
        "/accounts/filter/?sex_lt=m&limit=5&query_id=1",
        "/accounts/filter/?sex_eq=x&limit=5&query_id=1",
        "/accounts/filter/?sex_eq=&limit=5&query_id=1",
        "/accounts/filter/?limit=abc&query_id=1",
        "/accounts/filter/?birth_year=1800&limit=5&query_id=1",
    ] {
        let (status, body) = app.get(uri).await?;
        assert_status(status, StatusCode::BAD_REQUEST, uri);
        assert!(body["error"].is_string(), "{uri}: {body}");
    }
    assert!(app.store.queries.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn filter_limit_is_capped_by_config() -> anyhow::Result<()> {
    let app = TestApp::new_with_config(|config| config.filter.max_limit = Some(50));
    let (status, _) = app.get("/accounts/filter/?limit=51&query_id=1").await?;
    assert_status(status, StatusCode::BAD_REQUEST, "limit over cap");

    let app = TestApp::new_with_config(|config| config.filter.max_limit = None);
    let (status, _) = app.get("/accounts/filter/?limit=5000&query_id=1").await?;
    assert_status(status, StatusCode::OK, "uncapped limit");
    Ok(())
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_201_with_empty_object() -> anyhow::Result<()> {
    let app = TestApp::new();
    let mut body = account_body(10, "ten@mail.ru");
    body["city"] = json!("Москва");
    body["interests"] = json!(["Пиво", "Футбол"]);
    body["likes"] = json!([{"id": 3, "ts": 1_500_000_000}]);

    let (status, response) = app.post("/accounts/new/", body).await?;
    assert_status(status, StatusCode::CREATED, "create");
    assert_eq!(response, json!({}));

    let accounts = app.store.accounts.lock().unwrap();
    let stored = &accounts[&10];
    assert_eq!(stored.city.as_deref(), Some("Москва"));
    assert_eq!(stored.interests.len(), 2);
    assert_eq!(stored.likes[0].liker, 10);
    assert_eq!(stored.likes[0].likee, 3);
    Ok(())
}

#[tokio::test]
async fn create_rejects_invalid_bodies() -> anyhow::Result<()> {
    let app = TestApp::new();

    let mut missing_email = account_body(1, "a@b.ru");
    missing_email.as_object_mut().unwrap().remove("email");
    let mut bad_sex = account_body(1, "a@b.ru");
    bad_sex["sex"] = json!("x");
    let mut late_premium = account_body(1, "a@b.ru");
    late_premium["premium"] = json!({"start": 1_900_000_000, "finish": 1_900_000_100});

    for body in [missing_email, bad_sex, late_premium, json!({"id": "seven"})] {
        let (status, _) = app.post("/accounts/new/", body.clone()).await?;
        assert_status(status, StatusCode::BAD_REQUEST, &body.to_string());
    }
    assert!(app.store.accounts.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn create_rejects_malformed_json() -> anyhow::Result<()> {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/accounts/new/")
        .body(axum::body::Body::from("{not json"))?;
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await?;
    assert_status(response.status(), StatusCode::BAD_REQUEST, "malformed json");
    Ok(())
}

#[tokio::test]
async fn duplicate_account_is_400() -> anyhow::Result<()> {
    let app = TestApp::new();
    let (status, _) = app.post("/accounts/new/", account_body(5, "a@b.ru")).await?;
    assert_status(status, StatusCode::CREATED, "first create");

    let (status, _) = app.post("/accounts/new/", account_body(5, "c@d.ru")).await?;
    assert_status(status, StatusCode::BAD_REQUEST, "duplicate id");
    let (status, _) = app.post("/accounts/new/", account_body(6, "a@b.ru")).await?;
    assert_status(status, StatusCode::BAD_REQUEST, "duplicate email");
    Ok(())
}

#[tokio::test]
async fn update_maps_statuses() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.post("/accounts/new/", account_body(8, "eight@mail.ru"))
        .await?;

    let (status, body) = app
        .post("/accounts/8/", json!({"status": "заняты", "city": "Омск"}))
        .await?;
    assert_status(status, StatusCode::ACCEPTED, "update");
    assert_eq!(body, json!({}));
    let update = app.store.updates.lock().unwrap()[0].clone();
    assert_eq!(update.id, 8);
    assert_eq!(update.status.as_deref(), Some("заняты"));
    assert_eq!(update.city.as_deref(), Some("Омск"));
    assert!(update.email.is_none());

    let (status, _) = app.post("/accounts/9/", json!({})).await?;
    assert_status(status, StatusCode::NOT_FOUND, "missing account");
    let (status, _) = app.post("/accounts/abc/", json!({})).await?;
    assert_status(status, StatusCode::NOT_FOUND, "non-numeric id");
    let (status, _) = app.post("/accounts/8/", json!({"sex": "q"})).await?;
    assert_status(status, StatusCode::BAD_REQUEST, "invalid field");
    Ok(())
}

#[tokio::test]
async fn likes_are_accepted_with_202() -> anyhow::Result<()> {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/accounts/likes/",
            json!({"likes": [
                {"liker": 1, "likee": 2, "ts": 1_500_000_000},
                {"liker": 2, "likee": 1, "ts": 1_500_000_100}
            ]}),
        )
        .await?;
    assert_status(status, StatusCode::ACCEPTED, "likes");
    assert_eq!(body, json!({}));
    assert_eq!(app.store.likes.lock().unwrap().len(), 2);

    let (status, _) = app
        .post("/accounts/likes/", json!({"likes": [{"liker": 1, "ts": 1}]}))
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "like without likee");
    assert_eq!(app.store.likes.lock().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn oversized_body_is_rejected() -> anyhow::Result<()> {
    let app = TestApp::new_with_config(|config| config.server.max_request_body_size = 16);
    let (status, _) = app
        .post(
            "/accounts/likes/",
            json!({"likes": [{"liker": 1, "likee": 2, "ts": 1_500_000_000}]}),
        )
        .await?;
    assert_status(status, StatusCode::PAYLOAD_TOO_LARGE, "body limit");
    Ok(())
}

#[tokio::test]
async fn responses_carry_request_id() -> anyhow::Result<()> {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-request-id", "client-42")
        .body(axum::body::Body::empty())?;
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await?;

    let headers = response.headers();
    assert!(headers.get("x-request-id").is_some());
    assert_eq!(
        headers.get("x-correlation-id").and_then(|v| v.to_str().ok()),
        Some("client-42")
    );
    Ok(())
}
