// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use thiserror::Error;

/// Domain-specific errors for the batch-packing worker.
///
/// Variants correspond to the error taxonomy in the specification: each one
/// carries enough context to decide HTTP status, queue ack discipline, and
/// whether the in-flight container must be poisoned.
#[derive(Error, Debug, Clone)]
pub enum PackerError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("io error: {0}")]
    IoError(String),

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(String),

    #[error("corrupt container: {0}")]
    CorruptContainer(String),

    #[error("use after finalize: {0}")]
    UseAfterFinalize(String),

    #[error("index not loaded: {0}")]
    IndexNotLoaded(String),

    #[error("duplicate member: {0}")]
    DuplicateMember(String),

    #[error("put to remote blob service failed: {0}")]
    PutFailed(String),

    #[error("catalog insert failed: {0}")]
    IndexInsertFailed(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("configuration error: {0}")]
    InvalidConfiguration(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl PackerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Errors whose only valid response is nack+requeue of the pending batch
    /// and deletion of the in-flight container (§7 propagation policy).
    pub fn poisons_container(&self) -> bool {
        matches!(
            self,
            PackerError::SizeMismatch(_) | PackerError::Timeout(_) | PackerError::IoError(_)
        )
    }

    /// Errors that, in the façade, invalidate a cached container on disk.
    pub fn invalidates_cache(&self) -> bool {
        matches!(
            self,
            PackerError::UnsupportedVersion(_) | PackerError::CorruptContainer(_)
        )
    }

    /// Maps a domain error to the HTTP status the façade must return.
    pub fn http_status(&self) -> u16 {
        match self {
            PackerError::Validation(_) => 400,
            PackerError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for PackerError {
    fn from(err: std::io::Error) -> Self {
        PackerError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PackerError {
    fn from(err: serde_json::Error) -> Self {
        PackerError::SerializationError(err.to_string())
    }
}
