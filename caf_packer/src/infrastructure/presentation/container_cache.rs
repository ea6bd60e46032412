// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Container cache (§4.H): one file per container name under a configured
//! temp directory. Coordination across concurrent retrievals of the same
//! container is left to the filesystem (§5: "last-writer-wins").

use std::path::PathBuf;
use std::sync::Arc;

use caf_packer_domain::services::{CafReader, RemoteBlobAdapter};
use caf_packer_domain::PackerError;

use crate::infrastructure::services::CafFileReader;

pub struct ContainerCache {
    temp_dir: PathBuf,
    download_timeout: std::time::Duration,
    keep_caf_files: bool,
    remote_blob: Arc<dyn RemoteBlobAdapter>,
}

impl ContainerCache {
    pub fn new(
        temp_dir: PathBuf,
        download_timeout: std::time::Duration,
        keep_caf_files: bool,
        remote_blob: Arc<dyn RemoteBlobAdapter>,
    ) -> Self {
        Self {
            temp_dir,
            download_timeout,
            keep_caf_files,
            remote_blob,
        }
    }

    fn local_path(&self, container_name: &str) -> PathBuf {
        self.temp_dir.join(container_name)
    }

    /// Resolves `container_name` to a validated, loaded `CafFileReader`,
    /// downloading and caching it if not already present (§4.G step 2).
    pub async fn resolve(&self, container_name: &str) -> Result<CafFileReader, PackerError> {
        let local = self.local_path(container_name);

        let needs_download = match tokio::fs::metadata(&local).await {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        if needs_download {
            if tokio::fs::metadata(&local).await.is_ok() {
                tokio::fs::remove_file(&local).await.ok();
            }
            self.download(container_name, &local).await?;
        }

        match self.validate(&local).await {
            Ok(reader) => Ok(reader),
            Err(e) => {
                tokio::fs::remove_file(&local).await.ok();
                Err(e)
            }
        }
    }

    async fn download(&self, container_name: &str, local: &std::path::Path) -> Result<(), PackerError> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let fetch = self.remote_blob.get_container(container_name, local);
        tokio::time::timeout(self.download_timeout, fetch)
            .await
            .map_err(|_| PackerError::Timeout(format!("downloading container '{container_name}' timed out")))??;
        Ok(())
    }

    async fn validate(&self, local: &std::path::Path) -> Result<CafFileReader, PackerError> {
        let mut reader = CafFileReader::new(local.to_path_buf());
        reader.load_index().await?;
        if reader.list()?.is_empty() {
            return Err(PackerError::CorruptContainer(
                "container validated but contains no members".to_string(),
            ));
        }
        Ok(reader)
    }

    /// Deletes the cached file after serving, unless `keep_caf_files` is
    /// set. Cleanup failure is logged but never fails the response (§4.G).
    pub async fn cleanup_after_serve(&self, container_name: &str) {
        if self.keep_caf_files {
            return;
        }
        let local = self.local_path(container_name);
        if let Err(e) = tokio::fs::remove_file(&local).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, container = %container_name, "failed to clean up served container");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FilesystemRemoteBlob;
    use caf_packer_domain::services::CafWriter;
    use caf_packer_domain::value_objects::ByteBudget;

    async fn seed_container(blob_root: &std::path::Path, name: &str) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("src.caf");
        let mut writer =
            crate::infrastructure::services::CafFileWriter::create(path.clone(), ByteBudget::from_bytes(1024).unwrap())
                .unwrap();
        writer.append_buffer("T1/a.bin", vec![9, 9, 9]).await.unwrap();
        writer.finalize().await.unwrap();

        let blob = FilesystemRemoteBlob::new(blob_root);
        blob.put_container(name, &path).await.unwrap();
    }

    #[tokio::test]
    async fn downloads_validates_and_caches_on_first_resolve() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blob_root = tempfile::tempdir().unwrap();
        seed_container(blob_root.path(), "batch_1.caf").await;

        let blob = Arc::new(FilesystemRemoteBlob::new(blob_root.path()));
        let cache = ContainerCache::new(temp_dir.path().to_path_buf(), std::time::Duration::from_secs(5), true, blob);

        let mut reader = cache.resolve("batch_1.caf").await.unwrap();
        reader.load_index().await.unwrap();
        assert!(reader.has("T1/a.bin").unwrap());
    }

    #[tokio::test]
    async fn zero_byte_cache_entry_is_replaced_by_fresh_download() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blob_root = tempfile::tempdir().unwrap();
        seed_container(blob_root.path(), "batch_1.caf").await;

        tokio::fs::create_dir_all(temp_dir.path()).await.unwrap();
        tokio::fs::write(temp_dir.path().join("batch_1.caf"), []).await.unwrap();

        let blob = Arc::new(FilesystemRemoteBlob::new(blob_root.path()));
        let cache = ContainerCache::new(temp_dir.path().to_path_buf(), std::time::Duration::from_secs(5), true, blob);

        let reader = cache.resolve("batch_1.caf").await.unwrap();
        assert!(reader.has("T1/a.bin").unwrap());
    }
}
