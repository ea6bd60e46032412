// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Value objects shared by the CAF container format, the packing pipeline,
//! and the retrieval façade.

mod byte_budget;
mod container_index;
mod container_name;
mod member_path;

pub use byte_budget::ByteBudget;
pub use container_index::{ContainerIndex, MemberRange, FOOTER_LEN, FORMAT_VERSION};
pub use container_name::ContainerName;
pub use member_path::MemberPath;
