// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Module
//!
//! Structured error taxonomy for the batch-packing worker. Each variant maps
//! to one row of the error taxonomy table: validation failures surface as
//! `400`/nack+requeue, not-found as `404`, append-stream failures poison the
//! in-flight container, and so on.

mod packer_error;

pub use packer_error::PackerError;
