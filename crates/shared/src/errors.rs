use domain::DomainError;
use thiserror::Error;

/// アプリケーション全体で使用されるエラー型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidId(String),

    #[error("Invalid request body: {0}")]
    Decode(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("Request timed out after {0}")]
    RequestTimeout(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Timeout occurred: {0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// クライアントエラー（4xx相当）
    Client,
    /// サーバーエラー（5xx相当）
    Server,
}

impl AppError {
    /// HTTPステータスコードを取得
    ///
    /// 全ハンドラがこの対応表だけを使う。
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::InvalidId(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::MethodNotAllowed(_) => 405,
            AppError::RequestTimeout(_) => 408,
            AppError::Decode(_) => 422,
            AppError::Storage(_) | AppError::Timeout(_) | AppError::Internal(_) => 500,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        if self.http_status_code() >= 500 {
            ErrorCategory::Server
        } else {
            ErrorCategory::Client
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidId(_) => "INVALID_ID",
            AppError::Decode(_) => "DECODE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            AppError::RequestTimeout(_) => "REQUEST_TIMEOUT",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidTodoId(detail) => AppError::InvalidId(detail),
            DomainError::Validation(msg) => AppError::Validation(msg),
        }
    }
}
