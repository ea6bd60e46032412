// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The worker's fully-resolved runtime configuration (§6 Configuration
//! options). CLI flags always win; an optional config file fills in
//! anything the CLI left at its default; built-in defaults fill the rest.

use std::path::PathBuf;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use caf_packer_bootstrap::{ChainMode, ValidatedCli};
use caf_packer_domain::value_objects::ByteBudget;
use caf_packer_domain::PackerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub worker_id: i64,
    pub chain_mode: ChainMode,
    pub caf_max_size_gb: f64,
    pub caf_timeout_minutes: u64,
    pub prefetch: u16,
    pub temp_dir: PathBuf,
    pub download_timeout_ms: u64,
    pub keep_caf_files: bool,
}

impl WorkerConfig {
    /// Builds the effective configuration: CLI flags from `cli` layered over
    /// `cli.config_path`, if present, over these built-in defaults.
    pub fn load(cli: &ValidatedCli) -> Result<Self, PackerError> {
        let mut builder = Config::builder()
            .set_default("worker_id", 1i64)
            .map_err(config_error)?
            .set_default("chain_mode", "testnet")
            .map_err(config_error)?
            .set_default("caf_max_size_gb", 4.0)
            .map_err(config_error)?
            .set_default("caf_timeout_minutes", 5u64)
            .map_err(config_error)?
            .set_default("prefetch", 1u16)
            .map_err(config_error)?
            .set_default("temp_dir", "/tmp/caf-packer")
            .map_err(config_error)?
            .set_default("download_timeout_ms", 300_000u64)
            .map_err(config_error)?
            .set_default("keep_caf_files", false)
            .map_err(config_error)?;

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::new(
                path.to_string_lossy().as_ref(),
                FileFormat::Toml,
            ));
        }

        builder = builder
            .set_override("worker_id", cli.worker_id)
            .map_err(config_error)?
            .set_override("chain_mode", cli.chain_mode.as_str())
            .map_err(config_error)?
            .set_override("caf_max_size_gb", cli.caf_max_size_gb)
            .map_err(config_error)?
            .set_override("caf_timeout_minutes", cli.caf_timeout_minutes)
            .map_err(config_error)?
            .set_override("prefetch", cli.prefetch as i64)
            .map_err(config_error)?
            .set_override("temp_dir", cli.temp_dir.to_string_lossy().to_string())
            .map_err(config_error)?
            .set_override("download_timeout_ms", cli.download_timeout_ms)
            .map_err(config_error)?
            .set_override("keep_caf_files", cli.keep_caf_files)
            .map_err(config_error)?;

        let config = builder.build().map_err(config_error)?;

        config.try_deserialize().map_err(config_error)
    }

    pub fn http_port(&self) -> u16 {
        6700 + self.worker_id as u16
    }

    pub fn byte_budget(&self) -> Result<ByteBudget, PackerError> {
        ByteBudget::from_gb(self.caf_max_size_gb)
    }
}

fn config_error(err: config::ConfigError) -> PackerError {
    PackerError::InvalidConfiguration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use caf_packer_bootstrap::cli::Cli;
    use clap::Parser;

    fn cli_from(args: &[&str]) -> ValidatedCli {
        let cli = Cli::parse_from(args);
        caf_packer_bootstrap::cli::validate_cli(cli).unwrap()
    }

    #[test]
    fn loads_defaults_layered_under_cli_overrides() {
        let cli = cli_from(&["caf-packer", "--worker-id", "7"]);
        let config = WorkerConfig::load(&cli).unwrap();

        assert_eq!(config.worker_id, 7);
        assert_eq!(config.http_port(), 6707);
        assert_eq!(config.caf_max_size_gb, 4.0);
    }

    #[test]
    fn worker_id_zero_is_rejected_by_cli_validation_not_config() {
        let cli = cli_from(&["caf-packer", "--worker-id", "3", "--chain-mode", "mainnet"]);
        let config = WorkerConfig::load(&cli).unwrap();
        assert!(matches!(config.chain_mode, caf_packer_bootstrap::ChainMode::Mainnet));
    }
}
