use std::sync::Arc;

use async_trait::async_trait;
use cutlery_api::app::InventoryService;
use cutlery_core::EntryId;
use cutlery_infra::{InventoryStore, StoreError};
use cutlery_inventory::{EntryFields, InventoryEntry};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(InventoryService::in_memory()).await
    }

    async fn spawn_with(services: InventoryService) -> Self {
        // Same router as prod, ephemeral port.
        let app = cutlery_api::app::build_app(Arc::new(services));
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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Store whose every call fails as if the database were down.
struct FailingStore;

#[async_trait]
impl InventoryStore for FailingStore {
    async fn list_by_venue(&self, _venue: &str) -> Result<Vec<InventoryEntry>, StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn insert(&self, _fields: &EntryFields) -> Result<InventoryEntry, StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn update(
        &self,
        _id: EntryId,
        _fields: &EntryFields,
    ) -> Result<Option<InventoryEntry>, StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn delete(&self, _id: EntryId) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn list_all(&self) -> Result<Vec<InventoryEntry>, StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }
}

fn entry(venue: &str, date: &str) -> Value {
    json!({
        "venue": venue,
        "date": date,
        "forks": 10,
        "knives": 8,
        "steakKnives": 2,
        "spoons": 10,
        "dessertSpoons": 4,
        "iceCooler": 1,
        "plates": 20,
        "sugarTongs": 1,
        "iceTongs": 1
    })
}

async fn create(client: &reqwest::Client, srv: &TestServer, body: &Value) -> Value {
    let res = client
        .post(srv.url("/inventory"))
        .json(body)
        .send()
        .await
        .unwrap();
    if res.status() != StatusCode::CREATED {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        panic!("expected 201 from create, got {status} body={body}");
    }
    let created: Value = res.json().await.unwrap();
    created["entry"].clone()
}

#[tokio::test]
async fn create_then_list_by_venue() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create(&client, &srv, &entry("PORT", "2024-01-15")).await;
    assert!(created["id"].as_i64().unwrap() > 0);
    assert_eq!(created["venue"], "PORT");
    assert_eq!(created["date"], "2024-01-15");
    assert_eq!(created["forks"], 10);
    assert_eq!(created["steak_knives"], 2);
    assert_eq!(created["ice_tongs"], 1);
    assert_eq!(created["ashtrays"], 0);
    assert!(created["responsible_name"].is_null());

    create(&client, &srv, &entry("PORT", "2024-02-01")).await;
    create(&client, &srv, &entry("DICKENS", "2024-03-01")).await;

    let res = client
        .get(srv.url("/inventory?venue=PORT"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["date"], "2024-02-01");
    assert_eq!(entries[1]["date"], "2024-01-15");

    // No venue: the default venue.
    let body: Value = client
        .get(srv.url("/inventory"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_count_is_rejected_without_writing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut body = entry("PORT", "2024-01-15");
    body.as_object_mut().unwrap().remove("forks");

    let res = client
        .post(srv.url("/inventory"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert!(err["error"].as_str().unwrap().contains("forks"));

    let backup: Value = client
        .get(srv.url("/backup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(backup["total_records"], 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/inventory"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_replaces_and_unknown_id_yields_null() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create(&client, &srv, &entry("PORT", "2024-01-15")).await;

    let mut body = entry("PORT", "2024-01-16");
    body["id"] = created["id"].clone();
    body["forks"] = json!(12);
    body["responsibleName"] = json!("Olga");
    let res = client
        .put(srv.url("/inventory"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["entry"]["id"], created["id"]);
    assert_eq!(updated["entry"]["forks"], 12);
    assert_eq!(updated["entry"]["date"], "2024-01-16");
    assert_eq!(updated["entry"]["responsible_name"], "Olga");
    assert_eq!(updated["entry"]["created_at"], created["created_at"]);

    body["id"] = json!(99_999);
    let res = client
        .put(srv.url("/inventory"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let missing: Value = res.json().await.unwrap();
    assert!(missing["entry"].is_null());
}

#[tokio::test]
async fn update_and_delete_require_an_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.url("/inventory"))
        .json(&entry("PORT", "2024-01-15"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .delete(srv.url("/inventory"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid identifier: ID is required");
}

#[tokio::test]
async fn delete_is_idempotent() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create(&client, &srv, &entry("PORT", "2024-01-15")).await;
    let url = srv.url(&format!("/inventory?id={}", created["id"]));

    for _ in 0..2 {
        let res = client.delete(&url).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "success": true }));
    }

    let body: Value = client
        .get(srv.url("/inventory?venue=PORT"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["entries"], json!([]));
}

#[tokio::test]
async fn backup_is_a_downloadable_document() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/backup")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let disposition = res
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"inventory_backup_"));
    assert!(disposition.ends_with(".json\""));

    let empty: Value = res.json().await.unwrap();
    assert_eq!(empty["total_records"], 0);
    assert_eq!(empty["version"], "1.0");
    assert_eq!(empty["entries"], json!([]));
    assert!(empty["backup_date"].is_string());

    create(&client, &srv, &entry("PORT", "2024-01-15")).await;
    create(&client, &srv, &entry("DICKENS", "2024-01-10")).await;

    let full: Value = client
        .get(srv.url("/backup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(full["total_records"], 2);
    assert_eq!(full["entries"][0]["venue"], "DICKENS");
    assert_eq!(full["entries"][1]["venue"], "PORT");
}

#[tokio::test]
async fn cors_headers_and_preflight() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/inventory")).send().await.unwrap();
    assert_eq!(
        res.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    // Errors carry the header too.
    let res = client.delete(srv.url("/inventory")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    let res = client
        .request(Method::OPTIONS, srv.url("/inventory"))
        .header("origin", "https://example.org")
        .header("access-control-request-method", "PUT")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let allowed = res
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(allowed.contains(method), "{method} missing from {allowed}");
    }
    assert_eq!(res.headers().get("access-control-max-age").unwrap(), "86400");
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_methods_get_a_json_405() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/inventory", "/backup"] {
        let res = client
            .request(Method::PATCH, srv.url(path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Method not allowed");
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn store_failures_surface_as_json_500() {
    let srv = TestServer::spawn_with(InventoryService::new(Arc::new(FailingStore), "PORT")).await;
    let client = reqwest::Client::new();

    let mut update = entry("PORT", "2024-01-15");
    update["id"] = json!(1);

    let requests = [
        client.get(srv.url("/inventory?venue=PORT")),
        client.post(srv.url("/inventory")).json(&entry("PORT", "2024-01-15")),
        client.put(srv.url("/inventory")).json(&update),
        client.delete(srv.url("/inventory?id=1")),
        client.get(srv.url("/backup")),
    ];

    for request in requests {
        let res = request.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            res.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body: Value = res.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("down"));
        assert_eq!(body["code"], "store_error");
    }

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn duplicated_query_key_is_a_json_error() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .delete(srv.url("/inventory?id=1&id=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "invalid_request");
}

#[tokio::test]
async fn non_positive_ids_delete_nothing_and_succeed() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create(&client, &srv, &entry("PORT", "2024-01-15")).await;

    for id in ["0", "-1"] {
        let res = client
            .delete(srv.url(&format!("/inventory?id={id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "success": true }));
    }

    let res = client
        .delete(srv.url("/inventory?id=abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let backup: Value = client
        .get(srv.url("/backup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(backup["total_records"], 1);
}
