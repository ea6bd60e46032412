// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Filesystem-backed [`CafReader`] (§4.B). `load_index` reads the footer and
//! index from the end of the file; `extract` is a positional read of the
//! payload region, independent of the reader's current file position.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use caf_packer_domain::value_objects::{ContainerIndex, MemberRange, FOOTER_LEN};
use caf_packer_domain::services::CafReader;
use caf_packer_domain::PackerError;

pub struct CafFileReader {
    path: PathBuf,
    index: Option<ContainerIndex>,
}

impl CafFileReader {
    pub fn new(path: PathBuf) -> Self {
        Self { path, index: None }
    }

    fn index(&self) -> Result<&ContainerIndex, PackerError> {
        self.index
            .as_ref()
            .ok_or_else(|| PackerError::IndexNotLoaded("load_index must be called first".to_string()))
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

async fn read_range(path: PathBuf, position: u64, len: usize) -> Result<Vec<u8>, PackerError> {
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&path)?;
        read_at_blocking(&file, position, len)
    })
    .await
    .map_err(|e| PackerError::IoError(format!("reader task join error: {e}")))?
}

#[async_trait]
impl CafReader for CafFileReader {
    async fn load_index(&mut self) -> Result<(), PackerError> {
        let meta = tokio::fs::metadata(&self.path).await?;
        let file_length = meta.len();
        if file_length < FOOTER_LEN as u64 {
            return Err(PackerError::CorruptContainer(
                "container is shorter than the footer".to_string(),
            ));
        }

        let footer = read_range(self.path.clone(), file_length - FOOTER_LEN as u64, FOOTER_LEN).await?;
        let index_size = u32::from_le_bytes(footer.try_into().unwrap()) as u64;

        if index_size + FOOTER_LEN as u64 > file_length {
            return Err(PackerError::CorruptContainer(
                "index length in footer exceeds file length".to_string(),
            ));
        }

        let payload_region_length = file_length - FOOTER_LEN as u64 - index_size;
        let index_offset = payload_region_length;
        let index_bytes = read_range(self.path.clone(), index_offset, index_size as usize).await?;

        self.index = Some(ContainerIndex::parse(&index_bytes, payload_region_length)?);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, PackerError> {
        Ok(self.index()?.members().map(str::to_string).collect())
    }

    fn has(&self, member_path: &str) -> Result<bool, PackerError> {
        Ok(self.index()?.contains(member_path))
    }

    fn metadata(&self, member_path: &str) -> Result<MemberRange, PackerError> {
        self.index()?
            .get(member_path)
            .cloned()
            .ok_or_else(|| PackerError::NotFound(member_path.to_string()))
    }

    async fn extract(&self, member_path: &str) -> Result<Vec<u8>, PackerError> {
        let range = self.metadata(member_path)?;
        let len = (range.end_byte - range.start_byte) as usize;
        read_range(self.path.clone(), range.start_byte, len).await
    }

    async fn extract_all(&self, dir: &Path) -> Result<(), PackerError> {
        let members: Vec<String> = self.list()?;
        for member_path in members {
            let bytes = self.extract(&member_path).await?;
            let dest = dir.join(&member_path);
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o755);
                    let _ = tokio::fs::set_permissions(parent, perms).await;
                }
            }
            tokio::fs::write(&dest, &bytes).await?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o644);
                tokio::fs::set_permissions(&dest, perms).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::services::caf_file_writer::CafFileWriter;
    use caf_packer_domain::services::CafWriter;
    use caf_packer_domain::value_objects::ByteBudget;

    async fn write_fixture(path: PathBuf, members: &[(&str, &[u8])]) {
        let mut writer = CafFileWriter::create(path, ByteBudget::from_bytes(1024 * 1024).unwrap()).unwrap();
        for (path, bytes) in members {
            writer.append_buffer(path, bytes.to_vec()).await.unwrap();
        }
        writer.finalize().await.unwrap();
    }

    #[tokio::test]
    async fn round_trips_multiple_members() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        write_fixture(path.clone(), &[("T1/a.bin", b"hello"), ("T1/b.bin", b"world!")]).await;

        let mut reader = CafFileReader::new(path);
        reader.load_index().await.unwrap();

        let mut members = reader.list().unwrap();
        members.sort();
        assert_eq!(members, vec!["T1/a.bin", "T1/b.bin"]);

        assert_eq!(reader.extract("T1/a.bin").await.unwrap(), b"hello");
        assert_eq!(reader.extract("T1/b.bin").await.unwrap(), b"world!");
    }

    #[tokio::test]
    async fn extract_order_independent_of_other_members() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        write_fixture(path.clone(), &[("T1/a.bin", b"AAAA"), ("T1/b.bin", b"BB")]).await;

        let mut reader = CafFileReader::new(path);
        reader.load_index().await.unwrap();

        let second_first = reader.extract("T1/b.bin").await.unwrap();
        let first_second = reader.extract("T1/a.bin").await.unwrap();
        assert_eq!(second_first, b"BB");
        assert_eq!(first_second, b"AAAA");
    }

    #[tokio::test]
    async fn operations_before_load_index_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        write_fixture(path.clone(), &[("T1/a.bin", b"hi")]).await;

        let reader = CafFileReader::new(path);
        let err = reader.has("T1/a.bin").unwrap_err();
        assert!(matches!(err, PackerError::IndexNotLoaded(_)));
    }

    #[tokio::test]
    async fn extract_missing_member_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        write_fixture(path.clone(), &[("T1/a.bin", b"hi")]).await;

        let mut reader = CafFileReader::new(path);
        reader.load_index().await.unwrap();
        let err = reader.extract("T1/missing.bin").await.unwrap_err();
        assert!(matches!(err, PackerError::NotFound(_)));
    }
}
