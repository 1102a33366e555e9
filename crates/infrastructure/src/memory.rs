use crate::{DeleteResult, StorageError, TodoStore, UpdateResult};
use async_trait::async_trait;
use domain::{Todo, TodoChanges, TodoId};
use tokio::sync::RwLock;

/// プロセス内に保持する実装（ローカル開発/テスト用）
///
/// 挿入順を保つため Vec で持つ。
#[derive(Default)]
pub struct InMemoryTodoStore {
    todos: RwLock<Vec<Todo>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }

    pub async fn get(&self, id: &TodoId) -> Option<Todo> {
        self.todos.read().await.iter().find(|t| &t.id == id).cloned()
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn find_all(&self) -> Result<Vec<Todo>, StorageError> {
        Ok(self.todos.read().await.clone())
    }

    async fn insert_one(&self, todo: &Todo) -> Result<TodoId, StorageError> {
        let mut todos = self.todos.write().await;
        if todos.iter().any(|t| t.id == todo.id) {
            return Err(StorageError::Duplicate(todo.id.to_string()));
        }
        todos.push(todo.clone());
        Ok(todo.id)
    }

    async fn update_by_id(
        &self,
        id: &TodoId,
        changes: &TodoChanges,
    ) -> Result<UpdateResult, StorageError> {
        let mut todos = self.todos.write().await;
        let matched = match todos.iter_mut().find(|t| &t.id == id) {
            Some(todo) => {
                todo.apply(changes);
                true
            }
            None => false,
        };
        Ok(UpdateResult { matched })
    }

    async fn delete_by_id(&self, id: &TodoId) -> Result<DeleteResult, StorageError> {
        let mut todos = self.todos.write().await;
        let before = todos.len();
        todos.retain(|t| &t.id != id);
        Ok(DeleteResult {
            deleted: todos.len() < before,
        })
    }
}
