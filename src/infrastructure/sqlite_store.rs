// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::observation::{Listing, Observation};
use crate::domain::repositories::observation_store::{ObservationStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::info;

/// SQLite观测存储
///
/// 追加写入的单表时间序列，时间戳以UTC文本存储
pub struct SqliteObservationStore {
    pool: SqlitePool,
}

impl SqliteObservationStore {
    /// 打开（必要时创建）数据库并确保表结构存在
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product TEXT NOT NULL,
                price REAL NOT NULL,
                currency TEXT,
                source TEXT NOT NULL,
                observed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        info!(path, "observation store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ObservationStore for SqliteObservationStore {
    async fn append(
        &self,
        records: &[Listing],
        source: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        for record in records {
            sqlx::query(
                "INSERT INTO observations (product, price, currency, source, observed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&record.name)
            .bind(record.price)
            .bind(&record.currency)
            .bind(source)
            .bind(observed_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn load_history(&self, since: DateTime<Utc>) -> Result<Vec<Observation>, StoreError> {
        let rows = sqlx::query(
            "SELECT product, price, currency, source, observed_at FROM observations \
             WHERE observed_at >= ?1 ORDER BY observed_at ASC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut observations = Vec::with_capacity(rows.len());
        for row in rows {
            observations.push(Observation {
                product: row
                    .try_get("product")
                    .map_err(|e| StoreError::Database(e.to_string()))?,
                price: row
                    .try_get("price")
                    .map_err(|e| StoreError::Database(e.to_string()))?,
                currency: row
                    .try_get("currency")
                    .map_err(|e| StoreError::Database(e.to_string()))?,
                source: row
                    .try_get("source")
                    .map_err(|e| StoreError::Database(e.to_string()))?,
                observed_at: row
                    .try_get("observed_at")
                    .map_err(|e| StoreError::Database(e.to_string()))?,
            });
        }
        Ok(observations)
    }
}
