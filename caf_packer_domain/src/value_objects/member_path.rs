// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The in-archive member key, `task_id + "/" + file_path`.

/// Composes the in-archive member path from the logical identifiers used
/// across the queue message, catalog record, and container index.
///
/// Ingest and retrieval must use the exact same composition rule, or a
/// catalog-asserted member will be missing from the container it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberPath(String);

impl MemberPath {
    pub fn compose(task_id: &str, file_path: &str) -> Self {
        Self(format!("{task_id}/{file_path}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for MemberPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_task_and_path() {
        assert_eq!(MemberPath::compose("T1", "a.bin").as_str(), "T1/a.bin");
    }
}
