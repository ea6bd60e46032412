// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Worker identity: the persistent row selected by `worker_id` that supplies
//! credentials for the remote blob adapter.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerIdentity {
    pub id: i64,
    pub address: String,
    pub seed: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
