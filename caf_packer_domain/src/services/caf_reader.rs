// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! CAF reader port (§4.B): opens a container, parses footer and index, and
//! exposes list/has/slice-read against the cached index.

use std::path::Path;

use async_trait::async_trait;

use crate::value_objects::MemberRange;
use crate::PackerError;

#[async_trait]
pub trait CafReader: Send + Sync {
    /// Reads the footer, decodes the index length, parses and validates the
    /// index, and caches it. Must be called before any other operation;
    /// otherwise they fail with `IndexNotLoaded`.
    async fn load_index(&mut self) -> Result<(), PackerError>;

    /// Member paths in unspecified order; every indexed member exactly
    /// once.
    fn list(&self) -> Result<Vec<String>, PackerError>;

    /// O(1) membership check against the cached index.
    fn has(&self, member_path: &str) -> Result<bool, PackerError>;

    /// O(1) range lookup against the cached index.
    fn metadata(&self, member_path: &str) -> Result<MemberRange, PackerError>;

    /// Positional read of exactly `end - start` bytes at `start`. Fails
    /// with `NotFound` if `member_path` is absent, `IoError` on a read
    /// failure.
    async fn extract(&self, member_path: &str) -> Result<Vec<u8>, PackerError>;

    /// Writes every member to `dir`, creating intermediate directories as
    /// dictated by the member path's `/`-separated components. Files get
    /// mode `0644`, directories `0755`.
    async fn extract_all(&self, dir: &Path) -> Result<(), PackerError>;
}
