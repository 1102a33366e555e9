use crate::{
    id_attr, item_to_todo, run_bounded, timestamp_attr, todo_to_item, DeleteResult,
    StorageError, TodoStore, UpdateResult, ATTR_COMPLETED, ATTR_ID, ATTR_TITLE, ATTR_UPDATED_AT,
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::{
    error::DisplayErrorContext,
    types::{AttributeValue, ReturnValue},
    Client,
};
use domain::{Todo, TodoChanges, TodoId};
use shared::Config;
use std::time::Duration;
use tracing::{debug, info};

/// DynamoDB 上の 1 テーブルを Todo コレクションとして扱うゲートウェイ
///
/// クライアントは起動時に 1 度だけ作成し、全リクエストで共有する。
#[derive(Clone)]
pub struct DynamoTodoStore {
    client: Client,
    table_name: String,
    timeout: Duration,
}

impl DynamoTodoStore {
    pub fn new(client: Client, table_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            timeout,
        }
    }

    /// 設定からクライアントを作成し、テーブルに到達できることを確認する
    pub async fn connect(config: &Config) -> Result<Self, StorageError> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let store = Self::new(
            Client::new(&sdk_config),
            config.table_name(),
            config.storage_timeout,
        );
        store.ping(config.connect_timeout).await?;

        info!(table = %store.table_name, "DynamoDB connected");
        Ok(store)
    }

    async fn ping(&self, limit: Duration) -> Result<(), StorageError> {
        run_bounded("ping", limit, async {
            self.client
                .describe_table()
                .table_name(&self.table_name)
                .send()
                .await
                .map_err(|e| StorageError::DynamoDb(DisplayErrorContext(&e).to_string()))?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl TodoStore for DynamoTodoStore {
    async fn find_all(&self) -> Result<Vec<Todo>, StorageError> {
        run_bounded("find_all", self.timeout, async {
            let mut todos = Vec::new();
            let mut start_key = None;

            // ページを LastEvaluatedKey が尽きるまで辿る
            loop {
                let page = self
                    .client
                    .scan()
                    .table_name(&self.table_name)
                    .set_exclusive_start_key(start_key.take())
                    .send()
                    .await
                    .map_err(|e| StorageError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

                for item in page.items() {
                    todos.push(item_to_todo(item)?);
                }

                match page.last_evaluated_key {
                    Some(key) if !key.is_empty() => start_key = Some(key),
                    _ => break,
                }
            }

            debug!(count = todos.len(), "Scanned todo collection");
            Ok(todos)
        })
        .await
    }

    async fn insert_one(&self, todo: &Todo) -> Result<TodoId, StorageError> {
        run_bounded("insert_one", self.timeout, async {
            let result = self
                .client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(todo_to_item(todo)))
                .condition_expression("attribute_not_exists(#id)")
                .expression_attribute_names("#id", ATTR_ID)
                .send()
                .await;

            match result {
                Ok(_) => Ok(todo.id),
                Err(err)
                    if err
                        .as_service_error()
                        .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
                {
                    Err(StorageError::Duplicate(todo.id.to_string()))
                }
                Err(err) => Err(StorageError::DynamoDb(
                    DisplayErrorContext(&err).to_string(),
                )),
            }
        })
        .await
    }

    async fn update_by_id(
        &self,
        id: &TodoId,
        changes: &TodoChanges,
    ) -> Result<UpdateResult, StorageError> {
        run_bounded("update_by_id", self.timeout, async {
            // attribute_exists 条件で存在しない ID への upsert を防ぐ
            let result = self
                .client
                .update_item()
                .table_name(&self.table_name)
                .key(ATTR_ID, id_attr(id))
                .update_expression("SET #title = :title, #completed = :completed, #updated_at = :updated_at")
                .condition_expression("attribute_exists(#id)")
                .expression_attribute_names("#id", ATTR_ID)
                .expression_attribute_names("#title", ATTR_TITLE)
                .expression_attribute_names("#completed", ATTR_COMPLETED)
                .expression_attribute_names("#updated_at", ATTR_UPDATED_AT)
                .expression_attribute_values(":title", AttributeValue::S(changes.title.clone()))
                .expression_attribute_values(":completed", AttributeValue::Bool(changes.completed))
                .expression_attribute_values(":updated_at", timestamp_attr(&changes.updated_at))
                .send()
                .await;

            match result {
                Ok(_) => Ok(UpdateResult { matched: true }),
                Err(err)
                    if err
                        .as_service_error()
                        .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
                {
                    Ok(UpdateResult { matched: false })
                }
                Err(err) => Err(StorageError::DynamoDb(
                    DisplayErrorContext(&err).to_string(),
                )),
            }
        })
        .await
    }

    async fn delete_by_id(&self, id: &TodoId) -> Result<DeleteResult, StorageError> {
        run_bounded("delete_by_id", self.timeout, async {
            let output = self
                .client
                .delete_item()
                .table_name(&self.table_name)
                .key(ATTR_ID, id_attr(id))
                .return_values(ReturnValue::AllOld)
                .send()
                .await
                .map_err(|e| StorageError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

            let deleted = output
                .attributes()
                .is_some_and(|attributes| !attributes.is_empty());
            Ok(DeleteResult { deleted })
        })
        .await
    }
}
