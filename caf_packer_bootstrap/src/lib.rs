// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Module
//!
//! Sits outside the domain/infrastructure layers and provides entry-point
//! concerns: CLI parsing and validation, signal handling via
//! [`shutdown::ShutdownCoordinator`], bootstrap-phase logging, and exit-code
//! mapping. Enterprise layers never depend on this crate; it depends on
//! them.

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod shutdown;

pub use cli::{parse_and_validate, ChainMode, ParseError, ValidatedCli};
pub use exit_code::{result_to_exit_code, ExitCode};

/// Parses and validates CLI arguments. `clap` handles `--help`/`--version`
/// and exits the process itself.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
