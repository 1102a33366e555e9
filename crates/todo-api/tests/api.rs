use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use domain::{Todo, TodoChanges, TodoId};
use infrastructure::{DeleteResult, InMemoryTodoStore, StorageError, TodoStore, UpdateResult};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use todo_api::{app, AppState};
use tower::ServiceExt; // for `oneshot`

fn app_with(store: Arc<dyn TodoStore>) -> Router {
    app(AppState::new(store))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn raw_request(method: &str, uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn create(app: &Router, title: &str) -> Value {
    let (status, json) = send(
        app,
        json_request("POST", "/todo/", json!({"title": title, "completed": false})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"].clone()
}

/// 常に失敗するストア
struct FailingStore;

#[async_trait]
impl TodoStore for FailingStore {
    async fn find_all(&self) -> Result<Vec<Todo>, StorageError> {
        Err(StorageError::DynamoDb("connection refused".into()))
    }

    async fn insert_one(&self, _todo: &Todo) -> Result<TodoId, StorageError> {
        Err(StorageError::Timeout {
            operation: "insert_one",
            after: Duration::from_secs(5),
        })
    }

    async fn update_by_id(
        &self,
        _id: &TodoId,
        _changes: &TodoChanges,
    ) -> Result<UpdateResult, StorageError> {
        Err(StorageError::DynamoDb("connection refused".into()))
    }

    async fn delete_by_id(&self, _id: &TodoId) -> Result<DeleteResult, StorageError> {
        Err(StorageError::DynamoDb("connection refused".into()))
    }
}

/// 応答しないストア
struct StalledStore;

#[async_trait]
impl TodoStore for StalledStore {
    async fn find_all(&self) -> Result<Vec<Todo>, StorageError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }

    async fn insert_one(&self, todo: &Todo) -> Result<TodoId, StorageError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(todo.id)
    }

    async fn update_by_id(
        &self,
        _id: &TodoId,
        _changes: &TodoChanges,
    ) -> Result<UpdateResult, StorageError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(UpdateResult { matched: true })
    }

    async fn delete_by_id(&self, _id: &TodoId) -> Result<DeleteResult, StorageError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(DeleteResult { deleted: true })
    }
}

#[tokio::test]
async fn home_page_is_html() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let response = app.oneshot(empty_request("GET", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn list_is_empty_initially() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let (status, json) = send(&app, empty_request("GET", "/todo/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"data": []}));
}

#[tokio::test]
async fn create_returns_201_with_the_new_todo() {
    let store = Arc::new(InMemoryTodoStore::new());
    let app = app_with(store.clone());

    let (status, json) = send(
        &app,
        json_request("POST", "/todo/", json!({"title": "buy milk", "completed": false})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Todo created successfully");
    let data = &json["data"];
    assert_eq!(data["title"], "buy milk");
    assert_eq!(data["completed"], false);
    assert_eq!(data["created_at"], data["updated_at"]);

    let id: TodoId = data["id"].as_str().unwrap().parse().unwrap();
    assert!(store.get(&id).await.is_some());
}

#[tokio::test]
async fn create_without_trailing_slash_is_accepted() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let (status, _) = send(&app, json_request("POST", "/todo", json!({"title": "a"}))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn create_decodes_json_regardless_of_content_type() {
    let store = Arc::new(InMemoryTodoStore::new());
    let app = app_with(store.clone());

    for content_type in [None, Some("application/x-www-form-urlencoded"), Some("text/plain")] {
        let (status, json) = send(
            &app,
            raw_request("POST", "/todo/", content_type, r#"{"title":"buy milk"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{content_type:?}");
        assert_eq!(json["data"]["title"], "buy milk");
    }

    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn update_decodes_json_without_content_type() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let created = create(&app, "a").await;
    let uri = format!("/todo/{}", created["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        raw_request("PUT", &uri, None, r#"{"title":"a","completed":true}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, empty_request("GET", "/todo/")).await;
    assert_eq!(json["data"][0]["completed"], true);
}

#[tokio::test]
async fn create_assigns_unique_ids() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let first = create(&app, "a").await;
    let second = create(&app, "a").await;
    assert_ne!(first["id"], second["id"]);
}

#[tokio::test]
async fn create_with_empty_title_is_rejected_and_not_persisted() {
    let store = Arc::new(InMemoryTodoStore::new());
    let app = app_with(store.clone());

    for body in [json!({"title": ""}), json!({"title": "   "}), json!({"completed": true})] {
        let (status, json) = send(&app, json_request("POST", "/todo/", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Failed to create todo");
        assert_eq!(json["error"], "Title is required");
    }

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn create_with_malformed_json_returns_422() {
    let store = Arc::new(InMemoryTodoStore::new());
    let app = app_with(store.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/todo/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["message"], "Failed to create todo");
    assert!(json["error"].as_str().unwrap().starts_with("Invalid request body"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn list_returns_every_created_todo() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    for title in ["a", "b", "c", "d"] {
        create(&app, title).await;
    }

    let (status, json) = send(&app, empty_request("GET", "/todo/")).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn update_then_list_shows_the_change() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let created = create(&app, "buy milk").await;
    let id = created["id"].as_str().unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;

    let (status, json) = send(
        &app,
        json_request(
            "PUT",
            &format!("/todo/{id}"),
            json!({"title": "buy milk", "completed": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"message": "Todo updated successfully"}));

    let (_, json) = send(&app, empty_request("GET", "/todo/")).await;
    let todos = json["data"].as_array().unwrap();
    assert_eq!(todos.len(), 1);
    let todo = &todos[0];
    assert_eq!(todo["title"], "buy milk");
    assert_eq!(todo["completed"], true);
    assert_eq!(todo["created_at"], created["created_at"]);

    let parse = |v: &Value| chrono::DateTime::parse_from_rfc3339(v.as_str().unwrap()).unwrap();
    assert!(parse(&todo["updated_at"]) > parse(&created["updated_at"]));
}

#[tokio::test]
async fn update_with_malformed_id_returns_400() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let (status, json) = send(
        &app,
        json_request("PUT", "/todo/not-an-id", json!({"title": "a"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid id");
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("not-an-id: "), "{error}");
}

#[tokio::test]
async fn update_with_empty_title_returns_400() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let created = create(&app, "a").await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        json_request("PUT", &format!("/todo/{id}"), json!({"title": ""})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Failed to update todo");
}

#[tokio::test]
async fn update_of_unknown_id_still_reports_success() {
    let store = Arc::new(InMemoryTodoStore::new());
    let app = app_with(store.clone());

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/todo/{}", TodoId::new()),
            json!({"title": "ghost"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn delete_twice_reports_success_both_times() {
    let store = Arc::new(InMemoryTodoStore::new());
    let app = app_with(store.clone());
    let created = create(&app, "a").await;
    let uri = format!("/todo/{}", created["id"].as_str().unwrap());

    let (status, json) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"message": "Todo deleted successfully"}));
    assert!(store.is_empty().await);

    let (status, _) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_with_malformed_id_returns_400() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let (status, json) = send(&app, empty_request("DELETE", "/todo/12345")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid id");
}

#[tokio::test]
async fn undecodable_path_id_returns_400_envelope() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));

    for request in [
        empty_request("DELETE", "/todo/%FF"),
        json_request("PUT", "/todo/%FF", json!({"title": "a"})),
    ] {
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid id");
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn storage_failures_return_500_envelopes() {
    let app = app_with(Arc::new(FailingStore));
    let id = TodoId::new();

    let cases = [
        (empty_request("GET", "/todo/"), "Failed to fetch todo lists"),
        (
            json_request("POST", "/todo/", json!({"title": "a"})),
            "Failed to create todo",
        ),
        (
            json_request("PUT", &format!("/todo/{id}"), json!({"title": "a"})),
            "Failed to update todo",
        ),
        (
            empty_request("DELETE", &format!("/todo/{id}")),
            "Failed to delete todo",
        ),
    ];

    for (request, message) in cases {
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{message}");
        assert_eq!(json["message"], message);
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn unrouted_method_returns_405_envelope() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let id = TodoId::new();

    for (method, uri) in [
        ("DELETE", "/todo/".to_string()),
        ("PUT", "/todo".to_string()),
        ("GET", format!("/todo/{id}")),
        ("PATCH", format!("/todo/{id}")),
        ("POST", "/".to_string()),
    ] {
        let (status, json) = send(&app, empty_request(method, &uri)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(json["message"], "Method not allowed");
        assert_eq!(json["error"], format!("{method} is not allowed on {uri}"));
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_request_is_cut_off_with_408() {
    let app = app_with(Arc::new(StalledStore));

    for request in [
        empty_request("GET", "/todo/"),
        json_request("POST", "/todo/", json!({"title": "a"})),
        empty_request("DELETE", &format!("/todo/{}", TodoId::new())),
    ] {
        let started = tokio::time::Instant::now();
        let (status, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(json["message"], "Request timed out");
        assert_eq!(json["error"], "Request timed out after 5s");
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(5) && waited < Duration::from_secs(6));
    }
}

#[tokio::test]
async fn unknown_route_returns_404_envelope() {
    let app = app_with(Arc::new(InMemoryTodoStore::new()));
    let (status, json) = send(&app, empty_request("GET", "/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Not found");
    assert_eq!(json["error"], "no route for /nope");
}
