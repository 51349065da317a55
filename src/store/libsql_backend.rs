//! libSQL backend: `KeyValueStore` over a `settings` table.
//!
//! Values are stored as tagged JSON so a date comes back as a date and a
//! flag as a flag. Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::{KeyValueStore, StoredValue};

/// Default owner for settings rows (single-user app).
const DEFAULT_USER: &str = "default";

/// libSQL-backed settings store.
///
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Settings database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;

        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

#[async_trait]
impl KeyValueStore for LibSqlStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![DEFAULT_USER, key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("get: {e}")))?;
                let value: StoredValue = serde_json::from_str(&value_str)
                    .map_err(|e| StoreError::Serialization(format!("{key}: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get: {e}"))),
        }
    }

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let value_str =
            serde_json::to_string(&value).map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![DEFAULT_USER, key, value_str, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("set: {e}")))?;

        debug!(key, "Setting stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn set_then_get_preserves_type() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let birth = NaiveDate::from_ymd_opt(1992, 7, 30).unwrap();

        store
            .set("profile.birth_date", StoredValue::Date(birth))
            .await
            .unwrap();
        store
            .set("onboarding.completed", StoredValue::Flag(true))
            .await
            .unwrap();

        assert_eq!(
            store.get("profile.birth_date").await.unwrap(),
            Some(StoredValue::Date(birth))
        );
        assert_eq!(
            store.get("onboarding.completed").await.unwrap(),
            Some(StoredValue::Flag(true))
        );
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_upserts() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.set("k", StoredValue::Text("a".into())).await.unwrap();
        store.set("k", StoredValue::Text("b".into())).await.unwrap();
        assert_eq!(
            store.get("k").await.unwrap(),
            Some(StoredValue::Text("b".into()))
        );
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.db");

        {
            let store = LibSqlStore::new_local(&path).await.unwrap();
            store
                .set("onboarding.completed", StoredValue::Flag(true))
                .await
                .unwrap();
        }

        let reopened = LibSqlStore::new_local(&path).await.unwrap();
        assert_eq!(
            reopened.get("onboarding.completed").await.unwrap(),
            Some(StoredValue::Flag(true))
        );
    }
}
