use crate::StorageError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// ストレージ操作を上限時間つきで実行する
///
/// 上限を超えた場合は `StorageError::Timeout` を返す。リトライはしない。
pub async fn run_bounded<F, T>(
    operation: &'static str,
    limit: Duration,
    fut: F,
) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "Storage operation timed out");
            Err(StorageError::Timeout {
                operation,
                after: limit,
            })
        }
    }
}
