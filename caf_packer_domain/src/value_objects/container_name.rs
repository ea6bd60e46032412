// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Deterministic container naming: `batch_<milliseconds_since_epoch>.caf`.

/// Name under which a finalized container is shipped to the remote blob
/// service and recorded as `bundle_id` in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerName(String);

impl ContainerName {
    /// Builds the deterministic name for a batch finalized at `epoch_millis`.
    pub fn for_batch(epoch_millis: u128) -> Self {
        Self(format!("batch_{epoch_millis}.caf"))
    }

    pub fn from_raw(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
