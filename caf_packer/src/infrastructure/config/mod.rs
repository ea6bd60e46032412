// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Worker configuration (§6): layers the CLI flags parsed by
//! `caf_packer_bootstrap` over an optional config file and built-in
//! defaults, using the same `config` crate the workspace already depends
//! on for this purpose.

mod worker_config;

pub use worker_config::WorkerConfig;
