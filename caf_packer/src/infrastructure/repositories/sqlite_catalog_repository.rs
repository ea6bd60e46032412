// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed `CatalogRepository` adapter (§4.E / §6 Catalog schema).
//! Rows are insert-only; `lookup` is a keyed read.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use caf_packer_domain::entities::{CatalogRecord, WorkerIdentity};
use caf_packer_domain::repositories::CatalogRepository;
use caf_packer_domain::PackerError;

use super::schema;

pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    /// Connects to `database_url` (e.g. `sqlite://./catalog.db`), creating
    /// the database and applying migrations if needed.
    pub async fn connect(database_url: &str) -> Result<Self, PackerError> {
        let pool = schema::initialize_database(database_url)
            .await
            .map_err(|e| PackerError::database_error(format!("failed to initialize catalog database: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn insert(
        &self,
        task_id: &str,
        file_path: &str,
        container_name: &str,
        worker_id: &str,
    ) -> Result<(), PackerError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO catalog_records (file_path, task_id, bundle_id, js_worker_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(file_path)
        .bind(task_id)
        .bind(container_name)
        .bind(worker_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| PackerError::IndexInsertFailed(e.to_string()))?;

        Ok(())
    }

    async fn lookup(&self, task_id: &str, file_path: &str) -> Result<Option<CatalogRecord>, PackerError> {
        let row = sqlx::query(
            r#"
            SELECT id, file_path, task_id, bundle_id, js_worker_id, created_at, updated_at
            FROM catalog_records
            WHERE task_id = ? AND file_path = ?
            "#,
        )
        .bind(task_id)
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PackerError::database_error(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at: String = row.try_get("created_at").map_err(|e| PackerError::database_error(e.to_string()))?;
        let updated_at: String = row.try_get("updated_at").map_err(|e| PackerError::database_error(e.to_string()))?;

        Ok(Some(CatalogRecord {
            id: row.try_get("id").map_err(|e| PackerError::database_error(e.to_string()))?,
            task_id: row.try_get("task_id").map_err(|e| PackerError::database_error(e.to_string()))?,
            file_path: row.try_get("file_path").map_err(|e| PackerError::database_error(e.to_string()))?,
            bundle_id: row.try_get("bundle_id").map_err(|e| PackerError::database_error(e.to_string()))?,
            js_worker_id: row
                .try_get("js_worker_id")
                .map_err(|e| PackerError::database_error(e.to_string()))?,
            created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| PackerError::database_error(e.to_string()))?
                .with_timezone(&Utc),
            updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
                .map_err(|e| PackerError::database_error(e.to_string()))?
                .with_timezone(&Utc),
        }))
    }

    async fn lookup_worker(&self, worker_id: i64) -> Result<Option<WorkerIdentity>, PackerError> {
        let row = sqlx::query(
            r#"
            SELECT id, address, seed, created_at, updated_at
            FROM worker_identities
            WHERE id = ?
            "#,
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PackerError::database_error(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at: String = row.try_get("created_at").map_err(|e| PackerError::database_error(e.to_string()))?;
        let updated_at: String = row.try_get("updated_at").map_err(|e| PackerError::database_error(e.to_string()))?;

        Ok(Some(WorkerIdentity {
            id: row.try_get("id").map_err(|e| PackerError::database_error(e.to_string()))?,
            address: row.try_get("address").map_err(|e| PackerError::database_error(e.to_string()))?,
            seed: row.try_get("seed").map_err(|e| PackerError::database_error(e.to_string()))?,
            created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| PackerError::database_error(e.to_string()))?
                .with_timezone(&Utc),
            updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
                .map_err(|e| PackerError::database_error(e.to_string()))?
                .with_timezone(&Utc),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteCatalogRepository {
        SqliteCatalogRepository::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn insert_then_lookup_round_trips() {
        let repo = repo().await;
        repo.insert("T1", "a.bin", "batch_1.caf", "1").await.unwrap();

        let record = repo.lookup("T1", "a.bin").await.unwrap().unwrap();
        assert_eq!(record.bundle_id, "batch_1.caf");
        assert_eq!(record.js_worker_id, "1");
    }

    #[tokio::test]
    async fn lookup_miss_returns_none() {
        let repo = repo().await;
        assert!(repo.lookup("T1", "missing.bin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_key_insert_is_rejected() {
        let repo = repo().await;
        repo.insert("T1", "a.bin", "batch_1.caf", "1").await.unwrap();
        let err = repo.insert("T1", "a.bin", "batch_2.caf", "1").await.unwrap_err();
        assert!(matches!(err, PackerError::IndexInsertFailed(_)));
    }

    #[tokio::test]
    async fn lookup_worker_finds_seeded_row() {
        let repo = repo().await;
        let now = Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO worker_identities (id, address, seed, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
            .bind(1i64)
            .bind("worker-1-address")
            .bind("worker-1-seed")
            .bind(&now)
            .bind(&now)
            .execute(&repo.pool)
            .await
            .unwrap();

        let identity = repo.lookup_worker(1).await.unwrap().unwrap();
        assert_eq!(identity.address, "worker-1-address");
    }

    #[tokio::test]
    async fn lookup_worker_miss_returns_none() {
        let repo = repo().await;
        assert!(repo.lookup_worker(99).await.unwrap().is_none());
    }
}
