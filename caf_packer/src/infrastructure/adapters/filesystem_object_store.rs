// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Filesystem-backed `ObjectStoreAdapter` (§4.C): opens a byte stream over a
//! file under a configured source root, applying the key-sanitization rule
//! uniformly on both the write side (here) and the read side would need to
//! mirror it, since the rule must round-trip.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream;
use tokio::io::AsyncReadExt;

use caf_packer_domain::services::{ByteStream, ObjectStoreAdapter};
use caf_packer_domain::PackerError;

const CHUNK_SIZE: usize = 64 * 1024;

/// Rewrites characters outside a portable set to word tokens, deterministic
/// and injective over the forbidden set (§4.C).
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '+' => "PLUS".to_string(),
            '=' => "EQUALS".to_string(),
            ':' => "COLON".to_string(),
            ' ' => "SPACE".to_string(),
            '?' => "QMARK".to_string(),
            '#' => "HASH".to_string(),
            '%' => "PERCENT".to_string(),
            other => other.to_string(),
        })
        .collect()
}

pub struct FilesystemObjectStore {
    root: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }
}

#[async_trait]
impl ObjectStoreAdapter for FilesystemObjectStore {
    async fn open_stream(&self, key: &str) -> Result<(ByteStream, u64), PackerError> {
        let path: PathBuf = self.resolve(key);
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| PackerError::not_found(format!("object '{key}' not found at {}: {e}", path.display())))?;
        let declared_length = meta.len();

        let file = tokio::fs::File::open(&path).await?;
        let stream = stream::unfold(file, |mut file| async move {
            let mut buf = vec![0u8; CHUNK_SIZE];
            match file.read(&mut buf).await {
                Ok(0) => None,
                Ok(n) => {
                    buf.truncate(n);
                    Some((Ok(buf), file))
                }
                Err(e) => Some((Err(PackerError::from(e)), file)),
            }
        });

        Ok((Box::pin(stream), declared_length))
    }
}

/// Writes `bytes` under `root` at the sanitized `key`, creating parent
/// directories as needed. Used by tests and by the demo seed script to
/// populate the stand-in object store.
pub async fn seed(root: &Path, key: &str, bytes: &[u8]) -> std::io::Result<()> {
    let path = root.join(sanitize_key(key));
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
