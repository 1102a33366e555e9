use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use serde_json::json;
use shared::{AppError, ErrorCategory, REQUEST_TIMEOUT};
use tower::timeout::error::Elapsed;

/// ハンドラが返すエラー
///
/// `message` は操作の要約、`error` は原因。ステータスコードは
/// `AppError::http_status_code` の対応表だけで決まる。
#[derive(Debug)]
pub struct ApiError {
    pub message: &'static str,
    pub error: AppError,
}

impl ApiError {
    pub fn new(message: &'static str, error: impl Into<AppError>) -> Self {
        Self {
            message,
            error: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.error.category() {
            ErrorCategory::Client => {
                tracing::warn!(code = self.error.code(), error = %self.error, "{}", self.message)
            }
            ErrorCategory::Server => {
                tracing::error!(code = self.error.code(), error = %self.error, "{}", self.message)
            }
        }

        let body = json!({
            "message": self.message,
            "error": self.error.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// タイムアウト層のエラーを応答に変換する
pub async fn handle_layer_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::new(
            "Request timed out",
            AppError::RequestTimeout(format!("{}s", REQUEST_TIMEOUT.as_secs())),
        )
    } else {
        ApiError::new("Internal server error", AppError::Internal(err.to_string()))
    }
}
