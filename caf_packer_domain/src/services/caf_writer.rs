// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! CAF writer port (§4.A): append-only streaming serializer for one
//! container, enforcing a hard byte budget.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::services::object_store_adapter::ByteStream;
use crate::PackerError;

#[async_trait]
pub trait CafWriter: Send + Sync {
    /// Writes `bytes` as a new member. Returns `Ok(false)` (not an error) if
    /// the append would exceed the configured byte budget, leaving state
    /// untouched. Fails with `Validation` for an empty-body member (the
    /// writer's invariant forbids `start_byte == end_byte`), `IoError` on a
    /// short write, and `DuplicateMember` if `member_path` was already
    /// recorded.
    async fn append_buffer(&mut self, member_path: &str, bytes: Vec<u8>) -> Result<bool, PackerError>;

    /// Streams exactly `declared_length` bytes from `stream` as a new
    /// member, subject to the same capacity check as `append_buffer`.
    /// Fails with `SizeMismatch` if the stream yields a different number of
    /// bytes than declared, `Timeout` past the bounded copy deadline, or
    /// `IoError` on writer failure. On any failure the container is
    /// poisoned: the caller must discard it rather than reuse the partial
    /// prefix.
    async fn append_stream(
        &mut self,
        member_path: &str,
        stream: ByteStream,
        declared_length: u64,
    ) -> Result<bool, PackerError>;

    /// Serializes the index, appends it and the 4-byte little-endian
    /// footer, flushes, and closes. Terminal: any further operation fails
    /// with `UseAfterFinalize`.
    async fn finalize(&mut self) -> Result<PathBuf, PackerError>;

    /// Flushes and closes without finalizing. Safe on a non-finalized
    /// writer to abort it; the caller is responsible for deleting the
    /// residual file.
    async fn cleanup(&mut self) -> Result<(), PackerError>;

    /// Current payload offset, for capacity-law tests and diagnostics.
    fn payload_offset(&self) -> u64;

    /// Number of members recorded so far.
    fn member_count(&self) -> usize;
}
