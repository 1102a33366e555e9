use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::{Method, StatusCode, Uri},
    response::Html,
    Json,
};
use chrono::Utc;
use domain::{Todo, TodoChanges, TodoId, TodoPayload, TodoView};
use serde_json::{json, Value};
use shared::AppError;

use crate::error::ApiError;
use crate::AppState;

const HOME_PAGE: &str = include_str!("../static/index.html");

type JsonResult = Result<(StatusCode, Json<Value>), ApiError>;

/// ボディは Content-Type に関係なく JSON として読む
fn decode_payload(body: &Bytes) -> Result<TodoPayload, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::Decode(e.to_string()))
}

fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<TodoId, ApiError> {
    let Path(raw) = path
        .map_err(|e| ApiError::new("Invalid id", AppError::InvalidId(e.body_text())))?;
    raw.parse().map_err(|e| ApiError::new("Invalid id", e))
}

pub async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

pub async fn list_todos(State(state): State<AppState>) -> JsonResult {
    let todos = state
        .store
        .find_all()
        .await
        .map_err(|e| ApiError::new("Failed to fetch todo lists", e))?;

    let data: Vec<TodoView> = todos.iter().map(TodoView::from).collect();
    Ok((StatusCode::OK, Json(json!({ "data": data }))))
}

pub async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> JsonResult {
    const FAILED: &str = "Failed to create todo";

    let payload = decode_payload(&body).map_err(|e| ApiError::new(FAILED, e))?;
    let draft = payload.into_draft().map_err(|e| ApiError::new(FAILED, e))?;

    let todo = Todo::create(draft, Utc::now());
    state
        .store
        .insert_one(&todo)
        .await
        .map_err(|e| ApiError::new(FAILED, e))?;

    tracing::info!(todo_id = %todo.id, "Todo created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Todo created successfully",
            "data": TodoView::from(&todo),
        })),
    ))
}

pub async fn update_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> JsonResult {
    const FAILED: &str = "Failed to update todo";

    let id = parse_id(path)?;
    let payload = decode_payload(&body).map_err(|e| ApiError::new(FAILED, e))?;
    let draft = payload.into_draft().map_err(|e| ApiError::new(FAILED, e))?;

    let changes = TodoChanges::from_draft(draft, Utc::now());
    let result = state
        .store
        .update_by_id(&id, &changes)
        .await
        .map_err(|e| ApiError::new(FAILED, e))?;

    if result.matched {
        tracing::info!(todo_id = %id, "Todo updated");
    } else {
        tracing::warn!(todo_id = %id, "Update matched no todo");
    }
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Todo updated successfully" })),
    ))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> JsonResult {
    let id = parse_id(path)?;

    let result = state
        .store
        .delete_by_id(&id)
        .await
        .map_err(|e| ApiError::new("Failed to delete todo", e))?;

    if result.deleted {
        tracing::info!(todo_id = %id, "Todo deleted");
    } else {
        tracing::warn!(todo_id = %id, "Delete matched no todo");
    }
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Todo deleted successfully" })),
    ))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::new(
        "Not found",
        AppError::NotFound(format!("no route for {}", uri.path())),
    )
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::new(
        "Method not allowed",
        AppError::MethodNotAllowed(format!("{method} is not allowed on {}", uri.path())),
    )
}
