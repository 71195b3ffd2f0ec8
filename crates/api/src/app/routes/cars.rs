use std::sync::Arc;

use axum::{
    extract::{Extension, OriginalUri, Path, RawQuery, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use carhub_cars::{Car, CarId};
use carhub_infra::repository::{Page, Pageable};

use crate::app::services::AppServices;
use crate::app::{errors, headers};

/// Entity name used in alert headers and error bodies.
pub const ENTITY_NAME: &str = "carCar";

/// Base path the router is mounted under.
pub const BASE_PATH: &str = "/api/cars";

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_car).get(get_all_cars))
        .route(
            "/:id",
            get(get_car)
                .put(update_car)
                .patch(partial_update_car)
                .delete(delete_car),
        )
}

fn parse_id(raw: &str) -> Result<CarId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid car id"))
}

/// Identifier checks shared by full and partial updates: the body must carry
/// an id, and it must be the one in the path.
fn check_body_id(
    services: &AppServices,
    path_id: CarId,
    car: &Car,
) -> Result<(), axum::response::Response> {
    match car.id() {
        None => Err(errors::bad_request_alert(
            services.application_name(),
            ENTITY_NAME,
            "idnull",
            "Invalid id",
        )),
        Some(body_id) if body_id != path_id => Err(errors::bad_request_alert(
            services.application_name(),
            ENTITY_NAME,
            "idinvalid",
            "Invalid ID",
        )),
        Some(_) => Ok(()),
    }
}

fn not_found_alert(services: &AppServices) -> axum::response::Response {
    errors::alert_error(
        StatusCode::NOT_FOUND,
        services.application_name(),
        ENTITY_NAME,
        "idnotfound",
        "Entity not found",
    )
}

pub async fn create_car(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Car>, JsonRejection>,
) -> axum::response::Response {
    let Json(car) = match body {
        Ok(b) => b,
        Err(e) => return errors::invalid_body(e),
    };
    tracing::debug!(car = %car, "REST request to save Car");

    if car.id().is_some() {
        return errors::bad_request_alert(
            services.application_name(),
            ENTITY_NAME,
            "idexists",
            "A new car cannot already have an ID",
        );
    }

    let result = match services.cars().save(car).await {
        Ok(c) => c,
        Err(e) => return errors::repository_error_to_response(e),
    };
    let Some(id) = result.id() else {
        return errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            "store returned a car without an id",
        );
    };

    let mut response_headers =
        headers::entity_creation_alert(services.application_name(), ENTITY_NAME, &id.to_string());
    if let Ok(location) = HeaderValue::from_str(&format!("{BASE_PATH}/{id}")) {
        response_headers.insert(header::LOCATION, location);
    }

    (StatusCode::CREATED, response_headers, Json(result)).into_response()
}

pub async fn update_car(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Car>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(car) = match body {
        Ok(b) => b,
        Err(e) => return errors::invalid_body(e),
    };
    tracing::debug!(car_id = %id, car = %car, "REST request to update Car");

    if let Err(resp) = check_body_id(&services, id, &car) {
        return resp;
    }

    match services.cars().exists_by_id(id).await {
        Ok(true) => {}
        Ok(false) => return not_found_alert(&services),
        Err(e) => return errors::repository_error_to_response(e),
    }

    let result = match services.cars().save(car).await {
        Ok(c) => c,
        Err(e) => return errors::repository_error_to_response(e),
    };

    (
        StatusCode::OK,
        headers::entity_update_alert(services.application_name(), ENTITY_NAME, &id.to_string()),
        Json(result),
    )
        .into_response()
}

/// Merge-patch: only non-null fields of the body are applied.
pub async fn partial_update_car(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Car>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(e) => return errors::invalid_body(e),
    };
    tracing::debug!(car_id = %id, car = %patch, "REST request to partial update Car");

    if let Err(resp) = check_body_id(&services, id, &patch) {
        return resp;
    }

    match services.cars().exists_by_id(id).await {
        Ok(true) => {}
        Ok(false) => return not_found_alert(&services),
        Err(e) => return errors::repository_error_to_response(e),
    }

    // The row can vanish between the existence check and the read.
    let mut existing = match services.cars().find_by_id(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return not_found_alert(&services),
        Err(e) => return errors::repository_error_to_response(e),
    };
    existing.merge_from(&patch);

    let result = match services.cars().save(existing).await {
        Ok(c) => c,
        Err(e) => return errors::repository_error_to_response(e),
    };

    (
        StatusCode::OK,
        headers::entity_update_alert(services.application_name(), ENTITY_NAME, &id.to_string()),
        Json(result),
    )
        .into_response()
}

pub async fn get_all_cars(
    Extension(services): Extension<Arc<AppServices>>,
    OriginalUri(uri): OriginalUri,
    RawQuery(query): RawQuery,
) -> axum::response::Response {
    tracing::debug!("REST request to get a page of Cars");
    let pageable = Pageable::from_query(query.as_deref());

    let cars = services.cars();
    let (total, content) = match tokio::try_join!(cars.count(), cars.find_all(&pageable)) {
        Ok(v) => v,
        Err(e) => return errors::repository_error_to_response(e),
    };

    let page = Page::new(content, &pageable, total);
    let response_headers = headers::pagination_headers(uri.path(), query.as_deref(), &page);

    (StatusCode::OK, response_headers, Json(page.content)).into_response()
}

pub async fn get_car(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    tracing::debug!(car_id = %id, "REST request to get Car");

    match services.cars().find_by_id(id).await {
        Ok(Some(car)) => (StatusCode::OK, Json(car)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "car not found"),
        Err(e) => errors::repository_error_to_response(e),
    }
}

/// Deletion does not check for existence; a missing id still yields 204.
pub async fn delete_car(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    tracing::debug!(car_id = %id, "REST request to delete Car");

    if let Err(e) = services.cars().delete_by_id(id).await {
        return errors::repository_error_to_response(e);
    }

    (
        StatusCode::NO_CONTENT,
        headers::entity_deletion_alert(services.application_name(), ENTITY_NAME, &id.to_string()),
    )
        .into_response()
}
