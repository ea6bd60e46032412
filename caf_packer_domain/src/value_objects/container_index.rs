// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The CAF index region: a JSON map from member path to byte range, plus the
//! 4-byte little-endian footer that records its length.
//!
//! # Binary Layout
//! ```text
//! [PAYLOAD_REGION][INDEX_REGION (UTF-8 JSON)][FOOTER (u32 LE index length)]
//! ```
//!
//! Unlike the teacher's `.adapipe` format, the CAF footer carries no magic
//! bytes or separate version field: the format version lives inside the
//! JSON index itself, and the footer is exactly 4 bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::PackerError;

/// The only format version this implementation understands.
pub const FORMAT_VERSION: &str = "1.0";

/// Minimum possible footer: 4-byte length field.
pub const FOOTER_LEN: usize = 4;

/// Inclusive/exclusive byte range of one member within the payload region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRange {
    pub start_byte: u64,
    pub end_byte: u64,
}

impl MemberRange {
    pub fn len(&self) -> u64 {
        self.end_byte - self.start_byte
    }

    pub fn is_empty(&self) -> bool {
        self.start_byte == self.end_byte
    }
}

/// The parsed (or in-progress) CAF index region.
///
/// A `BTreeMap` keeps key order deterministic so two writers given the same
/// members in the same append order produce byte-identical index JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerIndex {
    pub format_version: String,
    pub files: BTreeMap<String, MemberRange>,
}

impl ContainerIndex {
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            files: BTreeMap::new(),
        }
    }

    /// Records a new member, rejecting overlap-by-construction: callers must
    /// reject duplicates *before* calling this (the writer does, since the
    /// bytes are already on disk by the time the index would accept it).
    pub fn insert(&mut self, member_path: String, range: MemberRange) {
        self.files.insert(member_path, range);
    }

    pub fn contains(&self, member_path: &str) -> bool {
        self.files.contains_key(member_path)
    }

    pub fn get(&self, member_path: &str) -> Option<&MemberRange> {
        self.files.get(member_path)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Serializes to the exact bytes written to disk as the index region.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, PackerError> {
        serde_json::to_vec(self).map_err(PackerError::from)
    }

    /// Builds the 4-byte little-endian footer recording `index_len`.
    pub fn footer_bytes(index_len: usize) -> Result<[u8; FOOTER_LEN], PackerError> {
        let len_u32: u32 = index_len
            .try_into()
            .map_err(|_| PackerError::CorruptContainer("index region exceeds u32 length".to_string()))?;
        Ok(len_u32.to_le_bytes())
    }

    /// Parses the index region from its JSON bytes, validating the
    /// container-level invariants that don't depend on the writer: version
    /// string, and that every declared range lies within
    /// `[0, payload_region_length)` with no `start >= end`.
    pub fn parse(json: &[u8], payload_region_length: u64) -> Result<Self, PackerError> {
        let parsed: Self = serde_json::from_slice(json).map_err(PackerError::from)?;

        if parsed.format_version != FORMAT_VERSION {
            return Err(PackerError::UnsupportedVersion(format!(
                "unsupported format_version {:?}, expected {:?}",
                parsed.format_version, FORMAT_VERSION
            )));
        }

        for (path, range) in &parsed.files {
            if range.start_byte >= range.end_byte {
                return Err(PackerError::CorruptContainer(format!(
                    "member {path:?} has empty or inverted range {range:?}"
                )));
            }
            if range.end_byte > payload_region_length {
                return Err(PackerError::CorruptContainer(format!(
                    "member {path:?} range {range:?} exceeds payload region length {payload_region_length}"
                )));
            }
        }

        Ok(parsed)
    }
}

impl Default for ContainerIndex {
    fn default() -> Self {
        Self::new()
    }
}
