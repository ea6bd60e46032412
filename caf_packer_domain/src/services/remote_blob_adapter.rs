// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Remote blob service port (§4.D): ships finished containers to durable
//! storage and serves them (or membership proofs) back out.
//!
//! # Architecture Note - Infrastructure Port
//!
//! As with [`super::ObjectStoreAdapter`], this is an I/O-bound interface
//! declared in the domain layer so the pipeline and the retrieval façade
//! depend on the port, not a specific remote service client.

use std::path::Path;

use async_trait::async_trait;

use crate::PackerError;

/// A cryptographic-free membership attestation: which byte range within
/// `container_name` a given member occupies, as last observed by the blob
/// service. Concrete shape is opaque to callers; only its presence or
/// absence through `GetProofs` matters to the façade.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MembershipProof {
    pub container_name: String,
    pub member_path: String,
    pub start_byte: u64,
    pub end_byte: u64,
}

#[async_trait]
pub trait RemoteBlobAdapter: Send + Sync {
    /// Uploads the finished container at `local_path` under `container_name`,
    /// streaming disk to disk rather than buffering the whole container in
    /// memory (containers can legitimately reach the configured byte budget,
    /// up to tens of gigabytes). Failure here must not ack any queue message
    /// for the batch (§4.F: ship failures nack and requeue every member).
    async fn put_container(&self, container_name: &str, local_path: &Path) -> Result<(), PackerError>;

    /// Downloads a previously shipped container in full, writing it to
    /// `local_path` by streamed copy rather than an in-memory buffer.
    async fn get_container(&self, container_name: &str, local_path: &Path) -> Result<(), PackerError>;

    /// Fetches membership proofs for a set of members within a container.
    /// Used by the retrieval façade's proof endpoint and its TTL cache.
    async fn get_proofs(
        &self,
        container_name: &str,
        member_paths: &[String],
    ) -> Result<Vec<MembershipProof>, PackerError>;
}
