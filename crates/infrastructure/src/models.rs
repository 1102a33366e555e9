use crate::StorageError;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::{Todo, TodoId};
use std::collections::HashMap;

pub type Item = HashMap<String, AttributeValue>;

/// 属性名
pub const ATTR_ID: &str = "id";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_COMPLETED: &str = "completed";
pub const ATTR_CREATED_AT: &str = "created_at";
pub const ATTR_UPDATED_AT: &str = "updated_at";

/// 保存用のタイムスタンプ表現（ナノ秒精度の RFC 3339、読み戻しで値が変わらない）
pub fn timestamp_attr(ts: &DateTime<Utc>) -> AttributeValue {
    AttributeValue::S(ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

pub fn id_attr(id: &TodoId) -> AttributeValue {
    AttributeValue::S(id.to_string())
}

pub fn todo_to_item(todo: &Todo) -> Item {
    HashMap::from([
        (ATTR_ID.to_string(), id_attr(&todo.id)),
        (ATTR_TITLE.to_string(), AttributeValue::S(todo.title.clone())),
        (
            ATTR_COMPLETED.to_string(),
            AttributeValue::Bool(todo.completed),
        ),
        (ATTR_CREATED_AT.to_string(), timestamp_attr(&todo.created_at)),
        (ATTR_UPDATED_AT.to_string(), timestamp_attr(&todo.updated_at)),
    ])
}

pub fn item_to_todo(item: &Item) -> Result<Todo, StorageError> {
    let id = string_attr(item, ATTR_ID)?;
    let id = id
        .parse::<TodoId>()
        .map_err(|e| StorageError::Corrupt(e.to_string()))?;

    Ok(Todo {
        id,
        title: string_attr(item, ATTR_TITLE)?.to_string(),
        completed: *item
            .get(ATTR_COMPLETED)
            .ok_or_else(|| missing(ATTR_COMPLETED))?
            .as_bool()
            .map_err(|_| wrong_type(ATTR_COMPLETED))?,
        created_at: datetime_attr(item, ATTR_CREATED_AT)?,
        updated_at: datetime_attr(item, ATTR_UPDATED_AT)?,
    })
}

fn string_attr<'a>(item: &'a Item, name: &str) -> Result<&'a str, StorageError> {
    item.get(name)
        .ok_or_else(|| missing(name))?
        .as_s()
        .map(String::as_str)
        .map_err(|_| wrong_type(name))
}

fn datetime_attr(item: &Item, name: &str) -> Result<DateTime<Utc>, StorageError> {
    let raw = string_attr(item, name)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("{name}: {e}")))
}

fn missing(name: &str) -> StorageError {
    StorageError::Corrupt(format!("missing attribute {name}"))
}

fn wrong_type(name: &str) -> StorageError {
    StorageError::Corrupt(format!("unexpected type for attribute {name}"))
}
