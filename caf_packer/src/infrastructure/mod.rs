// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete adapters implementing the domain's ports, plus the ambient
//! config/metrics wiring around them.

pub mod adapters;
pub mod config;
pub mod metrics;
pub mod presentation;
pub mod repositories;
pub mod services;
