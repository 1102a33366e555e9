use async_trait::async_trait;
use domain::{Todo, TodoChanges, TodoId};
use shared::AppError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Corrupt document: {0}")]
    Corrupt(String),

    #[error("Duplicate id: {0}")]
    Duplicate(String),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Timeout { .. } => AppError::Timeout(e.to_string()),
            _ => AppError::Storage(e.to_string()),
        }
    }
}

/// update_by_id の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResult {
    /// 対象 ID のレコードが存在したか
    pub matched: bool,
}

/// delete_by_id の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted: bool,
}

/// 単一コレクションに対するストレージゲートウェイ
///
/// 存在しない ID に対する更新・削除はエラーにせず、結果の
/// `matched` / `deleted` で呼び出し側に伝える。
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Todo>, StorageError>;

    async fn insert_one(&self, todo: &Todo) -> Result<TodoId, StorageError>;

    async fn update_by_id(
        &self,
        id: &TodoId,
        changes: &TodoChanges,
    ) -> Result<UpdateResult, StorageError>;

    async fn delete_by_id(&self, id: &TodoId) -> Result<DeleteResult, StorageError>;
}
