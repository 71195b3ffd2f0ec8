use axum::{
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Wrap each request in a span carrying a request id, and echo that id back.
///
/// A well-formed incoming `x-request-id` is reused; otherwise a UUIDv7 is minted.
pub async fn request_span_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let request_id = extract_request_id(req.headers()).unwrap_or_else(Uuid::now_v7);

    let span = tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    );

    let mut res = next.run(req).instrument(span.clone()).await;
    span.in_scope(|| tracing::debug!(status = res.status().as_u16(), "request completed"));

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        res.headers_mut().insert(HeaderName::from_static(X_REQUEST_ID), value);
    }
    res
}

fn extract_request_id(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(X_REQUEST_ID)?.to_str().ok()?;
    Uuid::parse_str(raw.trim()).ok()
}
