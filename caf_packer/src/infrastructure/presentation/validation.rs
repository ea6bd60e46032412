// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Input validation for the three data endpoints (§4.G): uniform across
//! `/file`, `/file-info`, and `/file-proof`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::FacadeError;

static TASK_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

pub fn validate_task_id(task_id: &str) -> Result<(), FacadeError> {
    if task_id.is_empty() || !TASK_ID_PATTERN.is_match(task_id) {
        return Err(FacadeError::Validation("Invalid taskId format".to_string()));
    }
    Ok(())
}

pub fn validate_file_path(file_path: &str) -> Result<(), FacadeError> {
    if file_path.is_empty()
        || file_path.contains("..")
        || file_path.contains('~')
        || file_path.starts_with('/')
    {
        return Err(FacadeError::Validation("Invalid filePath format".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_task_id() {
        assert!(validate_task_id("T1-abc_2").is_ok());
    }

    #[test]
    fn rejects_task_id_with_path_separators() {
        assert!(validate_task_id("../etc").is_err());
    }

    #[test]
    fn rejects_file_path_with_dot_dot() {
        assert!(validate_file_path("../etc/passwd").is_err());
    }

    #[test]
    fn rejects_file_path_starting_with_slash() {
        assert!(validate_file_path("/etc/passwd").is_err());
    }

    #[test]
    fn rejects_file_path_with_tilde() {
        assert!(validate_file_path("~/secrets").is_err());
    }

    #[test]
    fn accepts_nested_relative_file_path() {
        assert!(validate_file_path("a/b/c.bin").is_ok());
    }
}
