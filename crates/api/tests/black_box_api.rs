use std::sync::Arc;

use async_trait::async_trait;
use carhub_api::app::services::AppServices;
use carhub_cars::{Car, CarId};
use carhub_infra::repository::Pageable;
use carhub_infra::{AppConfig, CarRepository, RepositoryError};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an in-memory repository, bound to an ephemeral port.
        let config = AppConfig::in_memory();
        let app = carhub_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        Self::serve(app).await
    }

    async fn spawn_with(services: AppServices) -> Self {
        Self::serve(carhub_api::app::router(services)).await
    }

    async fn serve(app: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn cars_url(&self) -> String {
        format!("{}/api/cars", self.base_url)
    }

    fn car_url(&self, id: i64) -> String {
        format!("{}/api/cars/{}", self.base_url, id)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn default_car() -> Value {
    json!({ "name": "AAAAAAAAAA", "age": 1, "isBroken": false })
}

async fn create(client: &reqwest::Client, srv: &TestServer, body: Value) -> Value {
    let res = client.post(srv.cars_url()).json(&body).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn total_count(client: &reqwest::Client, srv: &TestServer) -> u64 {
    let res = client.get(srv.cars_url()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.headers()["x-total-count"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn create_then_read_round_trips_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let before = total_count(&client, &srv).await;

    let res = client
        .post(srv.cars_url())
        .json(&default_car())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let headers = res.headers().clone();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().expect("assigned id");

    assert_eq!(headers["location"], format!("/api/cars/{id}").as_str());
    assert_eq!(headers["x-carapp-alert"], "carApp.carCar.created");
    assert_eq!(headers["x-carapp-params"], id.to_string().as_str());
    assert_eq!(total_count(&client, &srv).await, before + 1);

    let res = client.get(srv.car_url(id)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["id"].as_i64(), Some(id));
    assert_eq!(fetched["name"], "AAAAAAAAAA");
    assert_eq!(fetched["age"].as_f64(), Some(1.0));
    assert_eq!(fetched["isBroken"], false);
}

#[tokio::test]
async fn create_with_existing_id_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let before = total_count(&client, &srv).await;

    let mut body = default_car();
    body["id"] = json!(1);
    let res = client.post(srv.cars_url()).json(&body).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["x-carapp-error"], "error.idexists");
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "idexists");
    assert_eq!(err["entityName"], "carCar");
    assert_eq!(total_count(&client, &srv).await, before);
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.cars_url())
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_body");
}

#[tokio::test]
async fn get_all_returns_page_with_pagination_headers() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    for name in ["a", "b", "c"] {
        create(&client, &srv, json!({ "name": name, "age": 2.50, "isBroken": true })).await;
    }

    let res = client
        .get(format!("{}?sort=id,desc&page=0&size=2", srv.cars_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-total-count"], "3");

    let link = res.headers()["link"].to_str().unwrap().to_string();
    assert!(link.contains("</api/cars?sort=id%2Cdesc&page=1&size=2>; rel=\"next\""));
    assert!(link.contains("</api/cars?sort=id%2Cdesc&page=1&size=2>; rel=\"last\""));
    assert!(link.contains("</api/cars?sort=id%2Cdesc&page=0&size=2>; rel=\"first\""));
    assert!(!link.contains("rel=\"prev\""));

    let body: Vec<Value> = res.json().await.unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["name"], "c");
    assert_eq!(body[1]["name"], "b");
    assert_eq!(body[0]["age"].as_f64(), Some(2.5));
}

#[tokio::test]
async fn age_keeps_every_digit_through_create_and_read() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.cars_url())
        .header("content-type", "application/json")
        .body(r#"{"name":"precise","age":1234567890123456789.12}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let body = client
        .get(srv.car_url(id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(r#""age":1234567890123456789.12"#), "{body}");
}

#[tokio::test]
async fn get_non_existing_car_is_not_found() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.car_url(i64::MAX)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/abc", srv.cars_url())).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_id");
}

#[tokio::test]
async fn put_existing_car_replaces_every_field() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let created = create(&client, &srv, default_car()).await;
    let id = created["id"].as_i64().unwrap();

    let res = client
        .put(srv.car_url(id))
        .json(&json!({ "id": id, "name": "BBBBBBBBBB" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-carapp-alert"], "carApp.carCar.updated");

    let fetched: Value = client
        .get(srv.car_url(id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["name"], "BBBBBBBBBB");
    assert!(fetched["age"].is_null());
    assert!(fetched["isBroken"].is_null());
}

#[tokio::test]
async fn put_non_existing_car_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let before = total_count(&client, &srv).await;

    let res = client
        .put(srv.car_url(4242))
        .json(&json!({ "id": 4242, "name": "ghost" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["x-carapp-error"], "error.idnotfound");
    assert_eq!(total_count(&client, &srv).await, before);
}

#[tokio::test]
async fn put_with_missing_or_mismatched_id_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let created = create(&client, &srv, default_car()).await;
    let id = created["id"].as_i64().unwrap();

    let res = client
        .put(srv.car_url(id))
        .json(&json!({ "name": "no id" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["x-carapp-error"], "error.idnull");

    let res = client
        .put(srv.car_url(id))
        .json(&json!({ "id": id + 1, "name": "wrong id" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["x-carapp-error"], "error.idinvalid");
}

#[tokio::test]
async fn put_without_path_id_is_method_not_allowed() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.cars_url())
        .json(&json!({ "id": 1, "name": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn patch_preserves_omitted_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let created = create(&client, &srv, default_car()).await;
    let id = created["id"].as_i64().unwrap();

    let res = client
        .patch(srv.car_url(id))
        .header("content-type", "application/merge-patch+json")
        .body(json!({ "id": id, "isBroken": true, "name": null }).to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let patched: Value = res.json().await.unwrap();
    assert_eq!(patched["id"].as_i64(), Some(id));
    assert_eq!(patched["name"], "AAAAAAAAAA");
    assert_eq!(patched["age"].as_f64(), Some(1.0));
    assert_eq!(patched["isBroken"], true);
}

#[tokio::test]
async fn patch_non_existing_or_mismatched_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .patch(srv.car_url(777))
        .json(&json!({ "id": 777, "name": "ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .patch(srv.car_url(777))
        .json(&json!({ "id": 778 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .patch(srv.car_url(777))
        .json(&json!({ "name": "no id" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_decrements_count_and_is_unconditional() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let created = create(&client, &srv, default_car()).await;
    let id = created["id"].as_i64().unwrap();
    let before = total_count(&client, &srv).await;

    let res = client.delete(srv.car_url(id)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()["x-carapp-alert"], "carApp.carCar.deleted");
    assert_eq!(total_count(&client, &srv).await, before - 1);

    let res = client.delete(srv.car_url(id)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(total_count(&client, &srv).await, before - 1);

    let res = client.get(srv.car_url(id)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

/// Reports every id as present but never finds the row, as when a concurrent
/// delete lands between the existence check and the read.
struct VanishingCars;

#[async_trait]
impl CarRepository for VanishingCars {
    async fn save(&self, car: Car) -> Result<Car, RepositoryError> {
        Ok(car)
    }

    async fn find_by_id(&self, _id: CarId) -> Result<Option<Car>, RepositoryError> {
        Ok(None)
    }

    async fn exists_by_id(&self, _id: CarId) -> Result<bool, RepositoryError> {
        Ok(true)
    }

    async fn delete_by_id(&self, _id: CarId) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(0)
    }

    async fn find_all(&self, _pageable: &Pageable) -> Result<Vec<Car>, RepositoryError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn patch_of_a_row_deleted_mid_request_carries_failure_alert() {
    let srv = TestServer::spawn_with(AppServices::new(Arc::new(VanishingCars), "carApp")).await;
    let client = reqwest::Client::new();

    let res = client
        .patch(srv.car_url(5))
        .json(&json!({ "id": 5, "name": "gone" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["x-carapp-error"], "error.idnotfound");
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "idnotfound");
    assert_eq!(err["entityName"], "carCar");
}
