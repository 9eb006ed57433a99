//! SeaORM 存储后端
//!
//! 同一个 `SeaOrmStorage` 支持 SQLite、MySQL/MariaDB 与 PostgreSQL。
//! 读操作经过 [`retry::with_retry`]，多表写入在事务中执行。

mod connection;
mod content;
mod converters;
mod courses;
mod friends;
pub mod retry;
mod users;

use std::future::Future;

use sea_orm::{DatabaseConnection, DbErr};
use tracing::info;

use crate::errors::{Result, TalkError};

pub use connection::{connect_generic, connect_sqlite, run_migrations};

pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(TalkError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(TalkError::database_config("database_url is not set"));
        }

        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig::from(&config.database);

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        run_migrations(&db).await?;

        info!("{} storage initialized", backend_name.to_uppercase());
        Ok(SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
        })
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 健康检查使用的轻量查询
    pub async fn ping(&self) -> bool {
        self.db.ping().await.is_ok()
    }

    /// 执行读操作，遇到瞬时故障时重试
    async fn read<T, F, Fut>(&self, name: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, DbErr>>,
    {
        retry::with_retry(name, self.retry_config, operation)
            .await
            .map_err(|e| TalkError::database_operation(format!("{} failed: {}", name, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("unswtalk.db").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("sqlite:///tmp/x.sqlite?mode=rwc").unwrap(),
            "sqlite"
        );
        assert_eq!(infer_backend_from_url("mariadb://u@h/db").unwrap(), "mysql");
        assert_eq!(infer_backend_from_url("postgresql://h/db").unwrap(), "postgres");
        assert!(infer_backend_from_url("redis://h").is_err());
    }
}
