//! SQLite pool construction driven by the application's database settings.
//! Pragmas ride on the connect options so every pooled connection gets
//! foreign keys, WAL journaling and a busy timeout without a per-connection
//! hook.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use preventivo_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

pub async fn connect(database: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&database.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    SqlitePoolOptions::new()
        .max_connections(database.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(database.timeout_secs.max(1)))
        .connect_with(options)
        .await
}

#[cfg(test)]
pub(crate) fn memory_settings() -> DatabaseConfig {
    DatabaseConfig { url: "sqlite::memory:".to_string(), max_connections: 1, timeout_secs: 30 }
}

#[cfg(test)]
mod tests {
    use super::{connect, memory_settings};

    #[tokio::test]
    async fn pooled_connections_enforce_foreign_keys() {
        let pool = connect(&memory_settings()).await.expect("connect");

        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("pragma query");
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn missing_database_file_is_created() {
        let dir = std::env::temp_dir().join(format!("preventivo-conn-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("fresh.db");
        let _ = std::fs::remove_file(&path);

        let database = super::DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 1,
            timeout_secs: 5,
        };
        let pool = connect(&database).await.expect("connect");
        sqlx::query("SELECT 1").execute(&pool).await.expect("probe query");
        pool.close().await;

        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
