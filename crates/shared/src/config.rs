use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LISTEN_PORT: u16 = 9000;
pub const DEFAULT_DATABASE_NAME: &str = "demo_todo";
pub const DEFAULT_COLLECTION_NAME: &str = "todo";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// ストレージ操作 1 回あたりの上限
pub const STORAGE_TIMEOUT: Duration = Duration::from_secs(5);
/// 起動時の接続確認の上限
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// 1 リクエスト（読み取りから応答まで）の上限
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// シャットダウン時に処理中リクエストを待つ上限
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(StorageBackend::DynamoDb),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::InvalidValue {
                name: "STORAGE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::DynamoDb => write!(f, "dynamodb"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_port: u16,
    pub database_name: String,
    pub collection_name: String,
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub storage_backend: StorageBackend,
    pub storage_timeout: Duration,
    pub connect_timeout: Duration,
    pub shutdown_grace_period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            dynamodb_endpoint: None,
            aws_region: DEFAULT_AWS_REGION.to_string(),
            storage_backend: StorageBackend::DynamoDb,
            storage_timeout: STORAGE_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
            shutdown_grace_period: SHUTDOWN_GRACE_PERIOD,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を組み立てる（テストでは環境変数を汚さずに使う）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "PORT",
                    value,
                })?,
            None => defaults.listen_port,
        };

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.storage_backend,
        };

        Ok(Config {
            listen_port,
            database_name: lookup("DATABASE_NAME").unwrap_or(defaults.database_name),
            collection_name: lookup("COLLECTION_NAME").unwrap_or(defaults.collection_name),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|s| !s.trim().is_empty()),
            aws_region: lookup("AWS_REGION").unwrap_or(defaults.aws_region),
            storage_backend,
            ..defaults
        })
    }

    /// コレクションに対応するテーブル名（`<database>.<collection>`）
    pub fn table_name(&self) -> String {
        format!("{}.{}", self.database_name, self.collection_name)
    }
}
