use axum::Router;

pub mod cars;
pub mod system;

/// Router for all `/api` endpoints.
pub fn router() -> Router {
    Router::new().nest(cars::BASE_PATH, cars::router())
}
