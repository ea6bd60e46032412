// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete implementations of the domain's I/O ports. No object-store,
//! remote-blob, or broker client crate is part of this workspace's stack, so
//! these adapters are filesystem-backed: a local "object store" directory
//! stands in for the S3-compatible source, a local "worker home" directory
//! stands in for the remote blob service, and an in-memory channel stands in
//! for the queue broker. Swapping in real clients means implementing the
//! same three domain traits; nothing above this layer changes.

mod filesystem_object_store;
mod filesystem_remote_blob;
mod in_memory_queue;

pub use filesystem_object_store::{seed as filesystem_object_store_seed, FilesystemObjectStore};
pub use filesystem_remote_blob::FilesystemRemoteBlob;
pub use in_memory_queue::{InMemoryQueue, InMemoryQueueHandle};
