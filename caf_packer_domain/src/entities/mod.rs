// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Entities: things with identity that persist across the pipeline's
//! lifecycle (catalog rows, queue messages, worker identity).

mod catalog_record;
mod queue_message;
mod worker_identity;

pub use catalog_record::CatalogRecord;
pub use queue_message::QueueMessage;
pub use worker_identity::WorkerIdentity;
