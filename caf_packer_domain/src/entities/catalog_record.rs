// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The catalog record: an immutable, insert-only row keyed by
//! `(task_id, file_path)`.

use chrono::{DateTime, Utc};

/// A row in the catalog, recording which container holds a given logical
/// file. Rows are never updated once inserted (§3 Catalog record).
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    pub id: i64,
    pub task_id: String,
    pub file_path: String,
    pub bundle_id: String,
    pub js_worker_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
