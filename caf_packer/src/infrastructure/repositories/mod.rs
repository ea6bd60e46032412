// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete `sqlx`-backed repository adapters for the domain's persistence
//! ports.

pub mod schema;
mod sqlite_catalog_repository;

pub use sqlite_catalog_repository::SqliteCatalogRepository;
