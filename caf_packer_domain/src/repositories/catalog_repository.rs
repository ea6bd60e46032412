// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Catalog repository port (§4.E): immutable insert, keyed lookup.

use async_trait::async_trait;

use crate::entities::{CatalogRecord, WorkerIdentity};
use crate::PackerError;

/// Dependency-inverted interface to the relational catalog. The concrete
/// adapter lives in infrastructure; the pipeline and the façade depend only
/// on this trait.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Inserts an immutable record. Rows are never updated once finalized.
    async fn insert(
        &self,
        task_id: &str,
        file_path: &str,
        container_name: &str,
        worker_id: &str,
    ) -> Result<(), PackerError>;

    /// Looks up the container holding a given logical file, if any.
    async fn lookup(&self, task_id: &str, file_path: &str) -> Result<Option<CatalogRecord>, PackerError>;

    /// Looks up the worker identity row selected by `worker_id`. Called once
    /// at startup (§6); a missing row is an initialization failure, not a
    /// runtime one.
    async fn lookup_worker(&self, worker_id: i64) -> Result<Option<WorkerIdentity>, PackerError>;
}
