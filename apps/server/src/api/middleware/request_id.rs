//! Per-request id and completion logging

use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Runs the request inside an `http_request` span tagged with a fresh id.
///
/// The id is returned in `x-request-id`. A caller-supplied `x-request-id` is
/// echoed back as `x-correlation-id`.
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let caller_id = header_str(req.headers(), REQUEST_ID_HEADER).map(str::to_owned);
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let span = tracing::info_span!(
        "http_request",
        %method,
        %path,
        %request_id,
        status = tracing::field::Empty,
    );

    async move {
        let started = Instant::now();
        let mut response = next.run(req).await;

        let status = response.status().as_u16();
        tracing::Span::current().record("status", status);
        tracing::info!(
            status,
            elapsed_ms = started.elapsed().as_millis(),
            "Request finished"
        );

        tag_response(response.headers_mut(), &request_id, caller_id.as_deref());
        response
    }
    .instrument(span)
    .await
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn tag_response(headers: &mut HeaderMap, request_id: &str, caller_id: Option<&str>) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    if let Some(value) = caller_id
        .filter(|id| *id != request_id)
        .and_then(|id| HeaderValue::from_str(id).ok())
    {
        headers.insert(CORRELATION_ID_HEADER, value);
    }
}
