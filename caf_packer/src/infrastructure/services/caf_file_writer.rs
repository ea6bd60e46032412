// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Filesystem-backed [`CafWriter`] (§4.A). Appends are sequential (the
//! packing pipeline enforces one append at a time), but the on-disk write is
//! done with the teacher's platform-specific positional write so a writer
//! mid-append never depends on the file cursor matching its logical offset.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::time::{timeout, Duration};

use caf_packer_domain::services::{ByteStream, CafWriter};
use caf_packer_domain::value_objects::{ByteBudget, ContainerIndex, MemberRange};
use caf_packer_domain::PackerError;

/// Bounded copy deadline for a single `AppendStream` call (§4.A default).
const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(5 * 60);

enum State {
    Open { file: Arc<std::fs::File> },
    Finalized,
}

pub struct CafFileWriter {
    path: PathBuf,
    state: State,
    offset: u64,
    index: ContainerIndex,
    budget: ByteBudget,
    stream_timeout: Duration,
}

impl CafFileWriter {
    /// Creates a writer at `path` (truncated if it exists) enforcing
    /// `budget`.
    pub fn create(path: PathBuf, budget: ByteBudget) -> Result<Self, PackerError> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self {
            path,
            state: State::Open { file: Arc::new(file) },
            offset: 0,
            index: ContainerIndex::new(),
            budget,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
        })
    }

    #[cfg(test)]
    fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    fn open_file(&self) -> Result<Arc<std::fs::File>, PackerError> {
        match &self.state {
            State::Open { file } => Ok(file.clone()),
            State::Finalized => Err(PackerError::UseAfterFinalize(
                "writer has already been finalized".to_string(),
            )),
        }
    }

    fn check_capacity(&self, additional: u64) -> bool {
        !self.budget.would_exceed(self.offset, additional)
    }

    fn record_member(&mut self, member_path: &str, len: u64) -> Result<(), PackerError> {
        if len == 0 {
            return Err(PackerError::validation(format!(
                "member '{member_path}' has empty bytes; empty members are rejected at the writer boundary"
            )));
        }
        if self.index.contains(member_path) {
            return Err(PackerError::DuplicateMember(member_path.to_string()));
        }
        self.index.insert(
            member_path.to_string(),
            MemberRange {
                start_byte: self.offset,
                end_byte: self.offset + len,
            },
        );
        self.offset += len;
        Ok(())
    }

    async fn write_at(file: Arc<std::fs::File>, bytes: Vec<u8>, position: u64) -> Result<(), PackerError> {
        tokio::task::spawn_blocking(move || write_at_blocking(&file, &bytes, position))
            .await
            .map_err(|e| PackerError::IoError(format!("writer task join error: {e}")))?
    }
}

#[cfg(unix)]
fn write_at_blocking(file: &std::fs::File, bytes: &[u8], position: u64) -> Result<(), PackerError> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(bytes, position)
        .map_err(|e| PackerError::IoError(format!("failed to write at position {position}: {e}")))
}

#[cfg(windows)]
fn write_at_blocking(file: &std::fs::File, bytes: &[u8], position: u64) -> Result<(), PackerError> {
    use std::os::windows::fs::FileExt;
    let mut written = 0usize;
    while written < bytes.len() {
        let n = file
            .seek_write(&bytes[written..], position + written as u64)
            .map_err(|e| PackerError::IoError(format!("failed to write at position {position}: {e}")))?;
        written += n;
    }
    Ok(())
}

#[async_trait]
impl CafWriter for CafFileWriter {
    async fn append_buffer(&mut self, member_path: &str, bytes: Vec<u8>) -> Result<bool, PackerError> {
        if self.index.contains(member_path) {
            return Err(PackerError::DuplicateMember(member_path.to_string()));
        }
        let len = bytes.len() as u64;
        if !self.check_capacity(len) {
            return Ok(false);
        }
        let file = self.open_file()?;
        let position = self.offset;
        Self::write_at(file, bytes, position).await?;
        self.record_member(member_path, len)?;
        Ok(true)
    }

    async fn append_stream(
        &mut self,
        member_path: &str,
        mut stream: ByteStream,
        declared_length: u64,
    ) -> Result<bool, PackerError> {
        if self.index.contains(member_path) {
            return Err(PackerError::DuplicateMember(member_path.to_string()));
        }
        if !self.check_capacity(declared_length) {
            return Ok(false);
        }

        let file = self.open_file()?;
        let base_offset = self.offset;
        let mut total = 0u64;

        let copy = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                if chunk.is_empty() {
                    continue;
                }
                let chunk_len = chunk.len() as u64;
                if total + chunk_len > declared_length {
                    return Err(PackerError::SizeMismatch(format!(
                        "stream for '{member_path}' yielded more than the declared {declared_length} bytes"
                    )));
                }
                let position = base_offset + total;
                Self::write_at(file.clone(), chunk, position).await?;
                total += chunk_len;
            }
            Ok::<_, PackerError>(())
        };

        match timeout(self.stream_timeout, copy).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(PackerError::Timeout(format!(
                    "append_stream for '{member_path}' exceeded {:?}",
                    self.stream_timeout
                )))
            }
        }

        if total != declared_length {
            return Err(PackerError::SizeMismatch(format!(
                "stream for '{member_path}' yielded {total} bytes, declared {declared_length}"
            )));
        }

        self.record_member(member_path, declared_length)?;
        Ok(true)
    }

    async fn finalize(&mut self) -> Result<PathBuf, PackerError> {
        let file = self.open_file()?;

        let index_bytes = self.index.to_json_bytes()?;
        let footer = ContainerIndex::footer_bytes(index_bytes.len())?;
        let mut trailer = index_bytes;
        trailer.extend_from_slice(&footer);

        let position = self.offset;
        Self::write_at(file.clone(), trailer, position).await?;

        tokio::task::spawn_blocking(move || file.sync_all())
            .await
            .map_err(|e| PackerError::IoError(format!("writer task join error: {e}")))?
            .map_err(PackerError::from)?;

        self.state = State::Finalized;
        Ok(self.path.clone())
    }

    async fn cleanup(&mut self) -> Result<(), PackerError> {
        if let State::Open { file } = &self.state {
            let file = file.clone();
            tokio::task::spawn_blocking(move || file.sync_all())
                .await
                .map_err(|e| PackerError::IoError(format!("writer task join error: {e}")))?
                .map_err(PackerError::from)?;
        }
        self.state = State::Finalized;
        Ok(())
    }

    fn payload_offset(&self) -> u64 {
        self.offset
    }

    fn member_count(&self) -> usize {
        self.index.files.len()
    }
}

/// Deletes the residual file behind a writer that was cleaned up without
/// finalizing. Separate from the trait because it is a caller-owned cleanup
/// step (§4.A: "the residual file is considered invalid and must be
/// deleted").
pub async fn delete_residual(path: &Path) -> Result<(), PackerError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PackerError::from(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn budget(bytes: u64) -> ByteBudget {
        ByteBudget::from_bytes(bytes).unwrap()
    }

    #[tokio::test]
    async fn append_buffer_then_finalize_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        let mut writer = CafFileWriter::create(path.clone(), budget(1024)).unwrap();

        assert!(writer.append_buffer("T1/a.bin", vec![1, 2, 3, 4]).await.unwrap());
        assert_eq!(writer.payload_offset(), 4);
        assert_eq!(writer.member_count(), 1);

        writer.finalize().await.unwrap();

        let bytes = tokio::fs::read(&path).await.unwrap();
        assert_eq!(&bytes[0..4], &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn append_buffer_rejects_duplicate_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        let mut writer = CafFileWriter::create(path, budget(1024)).unwrap();

        writer.append_buffer("T1/a.bin", vec![1]).await.unwrap();
        let err = writer.append_buffer("T1/a.bin", vec![2]).await.unwrap_err();
        assert!(matches!(err, PackerError::DuplicateMember(_)));
    }

    #[tokio::test]
    async fn append_buffer_rejects_empty_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        let mut writer = CafFileWriter::create(path, budget(1024)).unwrap();

        let err = writer.append_buffer("T1/a.bin", vec![]).await.unwrap_err();
        assert!(matches!(err, PackerError::Validation(_)));
    }

    #[tokio::test]
    async fn append_buffer_returns_false_past_budget_and_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        let mut writer = CafFileWriter::create(path, budget(4)).unwrap();

        assert!(writer.append_buffer("T1/a.bin", vec![1, 2, 3, 4]).await.unwrap());
        assert!(!writer.append_buffer("T1/b.bin", vec![5]).await.unwrap());
        assert_eq!(writer.payload_offset(), 4);
        assert_eq!(writer.member_count(), 1);
    }

    #[tokio::test]
    async fn finalize_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        let mut writer = CafFileWriter::create(path, budget(1024)).unwrap();
        writer.finalize().await.unwrap();

        let err = writer.append_buffer("T1/a.bin", vec![1]).await.unwrap_err();
        assert!(matches!(err, PackerError::UseAfterFinalize(_)));
    }

    #[tokio::test]
    async fn append_stream_rejects_short_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        let mut writer = CafFileWriter::create(path, budget(1024)).unwrap();

        let body: ByteStream = Box::pin(stream::iter(vec![Ok(vec![1, 2, 3])]));
        let err = writer.append_stream("T1/a.bin", body, 10).await.unwrap_err();
        assert!(matches!(err, PackerError::SizeMismatch(_)));
    }

    #[tokio::test]
    async fn append_stream_times_out_on_stalled_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        let mut writer = CafFileWriter::create(path, budget(1024))
            .unwrap()
            .with_stream_timeout(Duration::from_millis(20));

        let body: ByteStream = Box::pin(stream::pending());
        let err = writer.append_stream("T1/a.bin", body, 10).await.unwrap_err();
        assert!(matches!(err, PackerError::Timeout(_)));
    }

    #[tokio::test]
    async fn append_stream_records_exact_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.caf");
        let mut writer = CafFileWriter::create(path, budget(1024)).unwrap();

        let body: ByteStream = Box::pin(stream::iter(vec![Ok(vec![1, 2]), Ok(vec![3, 4])]));
        assert!(writer.append_stream("T1/a.bin", body, 4).await.unwrap());
        assert_eq!(writer.payload_offset(), 4);
    }
}
