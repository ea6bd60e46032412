// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The queue message contract: `{"task_id": ..., "file_path": ...}`.

use serde::{Deserialize, Serialize};

use crate::value_objects::MemberPath;
use crate::PackerError;

/// An ingest request pulled from the work queue. `delivery_tag` is an opaque
/// handle the queue adapter needs to ack/nack this specific delivery; it is
/// not part of the wire payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub task_id: String,
    pub file_path: String,
    pub delivery_tag: u64,
}

/// Wire shape of the message body, `{"task_id": string, "file_path": string}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessageBody {
    pub task_id: String,
    pub file_path: String,
}

impl QueueMessage {
    /// Parses and validates a raw UTF-8 JSON frame. `delivery_tag` is
    /// supplied by the queue adapter, not carried in the payload.
    pub fn parse(raw: &[u8], delivery_tag: u64) -> Result<Self, PackerError> {
        let body: QueueMessageBody = serde_json::from_slice(raw)
            .map_err(|e| PackerError::validation(format!("invalid queue message body: {e}")))?;

        if body.task_id.is_empty() {
            return Err(PackerError::validation("task_id must not be empty"));
        }
        if body.file_path.is_empty() {
            return Err(PackerError::validation("file_path must not be empty"));
        }

        Ok(Self {
            task_id: body.task_id,
            file_path: body.file_path,
            delivery_tag,
        })
    }

    /// The in-archive member path this message's bytes are appended under.
    pub fn member_path(&self) -> MemberPath {
        MemberPath::compose(&self.task_id, &self.file_path)
    }
}
