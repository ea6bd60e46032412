// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Queue consumer port (§6 Queue contract): manual-acknowledgement delivery
//! of upload-request messages.

use async_trait::async_trait;

use crate::entities::QueueMessage;
use crate::PackerError;

#[async_trait]
pub trait QueueConsumer: Send + Sync {
    /// Blocks until the next message is available, or the consumer's
    /// connection is closed (`Ok(None)` on graceful shutdown).
    async fn recv(&mut self) -> Result<Option<QueueMessage>, PackerError>;

    /// Acknowledges successful processing of the delivery identified by
    /// `delivery_tag`. Only issued after a batch's container has been
    /// durably shipped and indexed (§4.F atomicity requirement).
    async fn ack(&mut self, delivery_tag: u64) -> Result<(), PackerError>;

    /// Negatively acknowledges delivery `delivery_tag` and requeues it.
    /// Used for validation failures, poisoned containers, and any message
    /// received while the pipeline is not in `Idle`/`Open`.
    async fn nack_requeue(&mut self, delivery_tag: u64) -> Result<(), PackerError>;
}
