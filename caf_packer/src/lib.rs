// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CAF Packer
//!
//! Batch-packing worker and retrieval façade for the Chunk Archive Format
//! (CAF). Follows the same layering as the domain crate it builds on:
//!
//! ```text
//! ┌────────────────────────────┐
//! │  infrastructure::presentation (HTTP façade)  │
//! ├────────────────────────────┤
//! │  application (packing pipeline state machine) │
//! ├────────────────────────────┤
//! │  caf_packer_domain (ports, value objects, entities) │
//! ├────────────────────────────┤
//! │  infrastructure::{services,repositories,adapters} (concrete adapters) │
//! └────────────────────────────┘
//! ```

pub mod application;
pub mod infrastructure;
