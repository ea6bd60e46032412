// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling: parse with `clap`, then validate every
//! value against the ranges §6 enumerates before handing a [`ValidatedCli`]
//! to the application layer.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

/// Raw CLI surface, parsed by `clap` before validation.
#[derive(Debug, Parser)]
#[command(name = "caf-packer", about = "Batch-packing worker and retrieval façade for CAF containers")]
pub struct Cli {
    /// Selects the catalog worker row and seeds the HTTP port as 6700 + worker_id.
    #[arg(long)]
    pub worker_id: i64,

    /// Selects remote blob service endpoints.
    #[arg(long, value_enum, default_value_t = ChainMode::Testnet)]
    pub chain_mode: ChainMode,

    /// Hard ceiling on container size, in GB. Must be in (0, 32].
    #[arg(long, default_value_t = 4.0)]
    pub caf_max_size_gb: f64,

    /// Inactivity finalization threshold, in minutes.
    #[arg(long, default_value_t = 5)]
    pub caf_timeout_minutes: u64,

    /// Queue prefetch count.
    #[arg(long, default_value_t = 1)]
    pub prefetch: u16,

    /// Directory for containers-in-flight and the retrieval cache.
    #[arg(long, default_value = "/tmp/caf-packer")]
    pub temp_dir: PathBuf,

    /// Container download deadline for the façade, in milliseconds.
    #[arg(long, default_value_t = 300_000)]
    pub download_timeout_ms: u64,

    /// Keep downloaded containers in the local cache after serving.
    #[arg(long, default_value_t = false)]
    pub keep_caf_files: bool,

    /// Optional path to a layered configuration file (see `config` module).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainMode {
    Mainnet,
    Testnet,
}

impl ChainMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainMode::Mainnet => "mainnet",
            ChainMode::Testnet => "testnet",
        }
    }
}

/// CLI parsing/validation failure.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

/// Validated CLI configuration: every field has already been range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub worker_id: i64,
    pub chain_mode: ChainMode,
    pub caf_max_size_gb: f64,
    pub caf_timeout_minutes: u64,
    pub prefetch: u16,
    pub temp_dir: PathBuf,
    pub download_timeout_ms: u64,
    pub keep_caf_files: bool,
    pub config: Option<PathBuf>,
}

impl ValidatedCli {
    /// The deterministic HTTP port for this worker: `6700 + worker_id`.
    pub fn http_port(&self) -> u16 {
        (6700 + self.worker_id) as u16
    }
}

/// Parses `std::env::args` with `clap` and validates the result.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate_cli(Cli::parse())
}

pub fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    if cli.worker_id <= 0 {
        return Err(ParseError::InvalidValue {
            arg: "worker-id".to_string(),
            reason: "must be a positive integer".to_string(),
        });
    }

    if !cli.caf_max_size_gb.is_finite() || cli.caf_max_size_gb <= 0.0 || cli.caf_max_size_gb > 32.0 {
        return Err(ParseError::InvalidValue {
            arg: "caf-max-size-gb".to_string(),
            reason: "must be in (0, 32]".to_string(),
        });
    }

    if cli.caf_timeout_minutes == 0 {
        return Err(ParseError::InvalidValue {
            arg: "caf-timeout-minutes".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    if cli.prefetch == 0 {
        return Err(ParseError::InvalidValue {
            arg: "prefetch".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    Ok(ValidatedCli {
        worker_id: cli.worker_id,
        chain_mode: cli.chain_mode,
        caf_max_size_gb: cli.caf_max_size_gb,
        caf_timeout_minutes: cli.caf_timeout_minutes,
        prefetch: cli.prefetch,
        temp_dir: cli.temp_dir,
        download_timeout_ms: cli.download_timeout_ms,
        keep_caf_files: cli.keep_caf_files,
        config: cli.config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            worker_id: 1,
            chain_mode: ChainMode::Testnet,
            caf_max_size_gb: 4.0,
            caf_timeout_minutes: 5,
            prefetch: 1,
            temp_dir: PathBuf::from("/tmp/caf-packer"),
            download_timeout_ms: 300_000,
            keep_caf_files: false,
            config: None,
        }
    }

    #[test]
    fn valid_cli_passes_validation() {
        let validated = validate_cli(base_cli()).unwrap();
        assert_eq!(validated.http_port(), 6701);
    }

    #[test]
    fn rejects_non_positive_worker_id() {
        let mut cli = base_cli();
        cli.worker_id = 0;
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn rejects_budget_above_32_gb() {
        let mut cli = base_cli();
        cli.caf_max_size_gb = 33.0;
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn rejects_zero_prefetch() {
        let mut cli = base_cli();
        cli.prefetch = 0;
        assert!(validate_cli(cli).is_err());
    }
}
