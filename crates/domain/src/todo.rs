use crate::errors::DomainError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Todo の識別子（ULID）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Ulid);

impl TodoId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = DomainError;

    /// パスパラメータ由来の文字列を解析（前後の空白は無視）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ulid::from_string(trimmed)
            .map(Self)
            .map_err(|e| DomainError::InvalidTodoId(format!("{trimmed}: {e}")))
    }
}

/// 永続化される Todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// 新規 Todo を組み立てる。created_at と updated_at は同じ時刻になる。
    pub fn create(draft: TodoDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: TodoId::new(),
            title: draft.title,
            completed: draft.completed,
            created_at: now,
            updated_at: now,
        }
    }

    /// 部分更新を適用する。created_at は変更しない。
    pub fn apply(&mut self, changes: &TodoChanges) {
        self.title = changes.title.clone();
        self.completed = changes.completed;
        self.updated_at = changes.updated_at;
    }
}

/// バリデーション済みの入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub completed: bool,
}

/// 更新時に書き換えるフィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: String,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

impl TodoChanges {
    pub fn from_draft(draft: TodoDraft, now: DateTime<Utc>) -> Self {
        Self {
            title: draft.title,
            completed: draft.completed,
            updated_at: now,
        }
    }
}

/// POST / PUT のリクエストボディ
///
/// title が欠けている場合は空文字として受け取り、`into_draft` で弾く。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoPayload {
    pub fn into_draft(self) -> Result<TodoDraft, DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("Title is required".to_string()));
        }

        Ok(TodoDraft {
            title: self.title,
            completed: self.completed,
        })
    }
}

/// レスポンスで返す Todo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoView {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Todo> for TodoView {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.to_string(),
            title: todo.title.clone(),
            completed: todo.completed,
            created_at: format_timestamp(&todo.created_at),
            updated_at: format_timestamp(&todo.updated_at),
        }
    }
}

impl From<Todo> for TodoView {
    fn from(todo: Todo) -> Self {
        Self::from(&todo)
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
