// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Application layer: the packing pipeline use case (§4.F) that drives the
//! domain ports into the ingest → finalize → ship → index → ack cycle.

mod packing_pipeline;

pub use packing_pipeline::{PackingPipeline, PackingPipelineConfig, DEFAULT_BATCH_COUNT_CEILING};
