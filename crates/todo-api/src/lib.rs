//! Todo コレクションに対する CRUD API（axum）

use axum::{
    error_handling::HandleErrorLayer,
    middleware,
    routing::{get, put},
    Router,
};
use infrastructure::TodoStore;
use shared::REQUEST_TIMEOUT;
use std::sync::Arc;
use tower::ServiceBuilder;

pub mod error;
pub mod handlers;
pub mod logging;

/// アプリケーションの共有状態
///
/// ストアは起動処理が所有し、ここから各ハンドラに渡る。
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

/// ルータを構築して返します。
///
/// 既知のパスへの未対応メソッドは 405、未知のパスは 404 を
/// いずれもエンベロープ付きで返す。各リクエストは `REQUEST_TIMEOUT` で打ち切る。
pub fn app(state: AppState) -> Router {
    let todo_routes = get(handlers::list_todos)
        .post(handlers::create_todo)
        .fallback(handlers::method_not_allowed);

    Router::new()
        .route(
            "/",
            get(handlers::home).fallback(handlers::method_not_allowed),
        )
        .route("/todo", todo_routes.clone())
        .route("/todo/", todo_routes)
        .route(
            "/todo/:id",
            put(handlers::update_todo)
                .delete(handlers::delete_todo)
                .fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(error::handle_layer_error))
                .timeout(REQUEST_TIMEOUT),
        )
        .layer(middleware::from_fn(logging::log_request))
        .with_state(state)
}
