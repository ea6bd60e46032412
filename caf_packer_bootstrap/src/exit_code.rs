// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process exit codes (§6): `0` on graceful shutdown, `1` on initialization
//! failure (catalog unreachable, worker row missing, blob adapter
//! unreachable).

/// The process's exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    InitializationFailure = 1,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Maps an initialization result to a process exit code, logging the
/// failure cause at `error` level before returning.
pub fn result_to_exit_code<E: std::fmt::Display>(result: Result<(), E>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            tracing::error!("initialization failure: {e}");
            ExitCode::InitializationFailure.into()
        }
    }
}
