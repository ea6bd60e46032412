// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Filesystem-backed `RemoteBlobAdapter` (§4.D): stores finished containers
//! under `<worker_home>/<logical_name>` and serves membership proofs derived
//! from the container's own index, since no proof format is specified
//! beyond "opaque token".

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use caf_packer_domain::services::{MembershipProof, RemoteBlobAdapter};
use caf_packer_domain::value_objects::{ContainerIndex, FOOTER_LEN};
use caf_packer_domain::PackerError;

/// Chunk size for the disk-to-disk streaming copy used by `put_container`
/// and `get_container`. Matches the façade's own buffer-free streaming
/// posture: a container can legitimately reach the configured byte budget.
const COPY_CHUNK_BYTES: usize = 256 * 1024;

pub struct FilesystemRemoteBlob {
    worker_home: PathBuf,
}

impl FilesystemRemoteBlob {
    pub fn new(worker_home: impl Into<PathBuf>) -> Self {
        Self {
            worker_home: worker_home.into(),
        }
    }

    fn path_for(&self, container_name: &str) -> PathBuf {
        self.worker_home.join(container_name)
    }
}

/// Streams `src` to `dst` in fixed-size chunks rather than buffering the
/// whole file, since containers can legitimately reach the configured byte
/// budget (up to tens of gigabytes).
async fn stream_copy(src: &Path, dst: &Path) -> Result<(), PackerError> {
    use tokio::io::AsyncReadExt;

    let mut reader = tokio::fs::File::open(src).await?;
    let mut writer = tokio::fs::File::create(dst).await?;
    let mut buf = vec![0u8; COPY_CHUNK_BYTES];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
    }
    writer.flush().await?;
    Ok(())
}

#[async_trait]
impl RemoteBlobAdapter for FilesystemRemoteBlob {
    async fn put_container(&self, container_name: &str, local_path: &Path) -> Result<(), PackerError> {
        tokio::fs::create_dir_all(&self.worker_home).await?;
        let path = self.path_for(container_name);
        let tmp_path = path.with_extension("caf.uploading");
        stream_copy(local_path, &tmp_path).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    async fn get_container(&self, container_name: &str, local_path: &Path) -> Result<(), PackerError> {
        let path = self.path_for(container_name);
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| PackerError::not_found(format!("container '{container_name}' not found: {e}")))?;
        if meta.len() == 0 {
            return Err(PackerError::CorruptContainer(format!(
                "container '{container_name}' is empty"
            )));
        }
        stream_copy(&path, local_path).await
    }

    async fn get_proofs(
        &self,
        container_name: &str,
        member_paths: &[String],
    ) -> Result<Vec<MembershipProof>, PackerError> {
        let path = self.path_for(container_name);
        let index = load_index_from_path(&path, container_name).await?;

        member_paths
            .iter()
            .map(|member_path| {
                let range = index
                    .get(member_path)
                    .ok_or_else(|| PackerError::not_found(member_path.clone()))?;
                Ok(MembershipProof {
                    container_name: container_name.to_string(),
                    member_path: member_path.clone(),
                    start_byte: range.start_byte,
                    end_byte: range.end_byte,
                })
            })
            .collect()
    }
}

#[cfg(unix)]
fn read_at_blocking(file: &std::fs::File, position: u64, len: usize) -> Result<Vec<u8>, PackerError> {
    use std::os::unix::fs::FileExt;
    let mut buf = vec![0u8; len];
    file.read_exact_at(&mut buf, position)
        .map_err(|e| PackerError::IoError(format!("failed to read {len} bytes at position {position}: {e}")))?;
    Ok(buf)
}

#[cfg(windows)]
fn read_at_blocking(file: &std::fs::File, position: u64, len: usize) -> Result<Vec<u8>, PackerError> {
    use std::os::windows::fs::FileExt;
    let mut buf = vec![0u8; len];
    let mut read = 0usize;
    while read < len {
        let n = file
            .seek_read(&mut buf[read..], position + read as u64)
            .map_err(|e| PackerError::IoError(format!("failed to read {len} bytes at position {position}: {e}")))?;
        if n == 0 {
            return Err(PackerError::IoError(format!(
                "unexpected end of file reading at position {position}"
            )));
        }
        read += n;
    }
    Ok(buf)
}

/// Reads only the footer and index trailer of the stored container at
/// `path`, not the full payload, mirroring [`CafFileReader::load_index`].
async fn load_index_from_path(path: &Path, container_name: &str) -> Result<ContainerIndex, PackerError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| PackerError::not_found(format!("container '{container_name}' not found: {e}")))?;
    let file_length = meta.len();
    if file_length < FOOTER_LEN as u64 {
        return Err(PackerError::CorruptContainer("container shorter than footer".to_string()));
    }

    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&path)?;
        let footer = read_at_blocking(&file, file_length - FOOTER_LEN as u64, FOOTER_LEN)?;
        let index_size = u32::from_le_bytes(footer.try_into().unwrap()) as u64;
        if index_size + FOOTER_LEN as u64 > file_length {
            return Err(PackerError::CorruptContainer("index length exceeds file length".to_string()));
        }
        let payload_region_length = file_length - FOOTER_LEN as u64 - index_size;
        let index_bytes = read_at_blocking(&file, payload_region_length, index_size as usize)?;
        ContainerIndex::parse(&index_bytes, payload_region_length)
    })
    .await
    .map_err(|e| PackerError::IoError(format!("reader task join error: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use caf_packer_domain::services::CafWriter;
    use caf_packer_domain::value_objects::ByteBudget;

    async fn build_container(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("src.caf");
        let mut writer = crate::infrastructure::services::CafFileWriter::create(
            path.clone(),
            ByteBudget::from_bytes(1024).unwrap(),
        )
        .unwrap();
        writer.append_buffer("T1/a.bin", vec![1, 2, 3]).await.unwrap();
        writer.finalize().await.unwrap();
        path
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let src = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let src_path = build_container(src.path()).await;
        let original = tokio::fs::read(&src_path).await.unwrap();

        let blob = FilesystemRemoteBlob::new(home.path());
        blob.put_container("batch_1.caf", &src_path).await.unwrap();

        let dest_path = src.path().join("fetched.caf");
        blob.get_container("batch_1.caf", &dest_path).await.unwrap();
        let fetched = tokio::fs::read(&dest_path).await.unwrap();
        assert_eq!(fetched, original);
    }

    #[tokio::test]
    async fn get_proofs_returns_ranges_from_index() {
        let src = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let src_path = build_container(src.path()).await;

        let blob = FilesystemRemoteBlob::new(home.path());
        blob.put_container("batch_1.caf", &src_path).await.unwrap();

        let proofs = blob
            .get_proofs("batch_1.caf", &["T1/a.bin".to_string()])
            .await
            .unwrap();
        assert_eq!(proofs.len(), 1);
        assert_eq!(proofs[0].start_byte, 0);
        assert_eq!(proofs[0].end_byte, 3);
    }

    #[tokio::test]
    async fn get_container_missing_is_not_found() {
        let home = tempfile::tempdir().unwrap();
        let blob = FilesystemRemoteBlob::new(home.path());
        let dest_path = home.path().join("dest.caf");
        let err = blob.get_container("missing.caf", &dest_path).await.unwrap_err();
        assert!(matches!(err, PackerError::NotFound(_)));
    }
}
