// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Object store port (§4.C): streams source bytes in for packing.
//!
//! # Architecture Note - Infrastructure Port
//!
//! This trait is declared in the domain layer even though every
//! implementation is I/O-bound. The pipeline's application logic must depend
//! on the *interface*, not on a concrete object-store client, so that the
//! store can be swapped (or stubbed in tests) without touching packing
//! logic. This mirrors the file I/O and binary-format ports of the teacher
//! pipeline this crate is descended from.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::PackerError;

/// A stream of source-byte chunks, read in order. Chunk boundaries carry no
/// meaning beyond how much was read in one poll.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, PackerError>>;

#[async_trait]
pub trait ObjectStoreAdapter: Send + Sync {
    /// Opens a stream over the object named by `key`, returning the stream
    /// together with its declared length in bytes. The declared length is
    /// advisory: callers must verify the actual bytes read against it and
    /// raise `PackerError::SizeMismatch` on divergence (§4.C edge cases).
    async fn open_stream(&self, key: &str) -> Result<(ByteStream, u64), PackerError>;
}
