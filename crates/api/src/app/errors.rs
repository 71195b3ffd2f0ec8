//! Consistent JSON error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use carhub_infra::RepositoryError;

use crate::app::headers;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Error response carrying an entity-scoped error key plus the failure alert headers.
pub fn alert_error(
    status: StatusCode,
    application_name: &str,
    entity_name: &str,
    error_key: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        headers::failure_alert(application_name, entity_name, error_key),
        axum::Json(json!({
            "error": error_key,
            "message": message.into(),
            "entityName": entity_name,
        })),
    )
        .into_response()
}

pub fn bad_request_alert(
    application_name: &str,
    entity_name: &str,
    error_key: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    alert_error(StatusCode::BAD_REQUEST, application_name, entity_name, error_key, message)
}

pub fn invalid_body(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn repository_error_to_response(err: RepositoryError) -> axum::response::Response {
    tracing::error!(error = %err, "car repository failure");
    match err {
        RepositoryError::PoolClosed => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "store_unavailable",
            err.to_string(),
        ),
        RepositoryError::Database(_) | RepositoryError::Decode(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            err.to_string(),
        ),
    }
}
