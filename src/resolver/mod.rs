// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reference and type resolution: the two tables the driver consults on
//! every composite value (spec §4.2, §4.4).

pub mod context;
pub mod ref_resolver;
pub mod type_resolver;

pub use context::{ReadContext, WriteContext};
pub use ref_resolver::{RefAction, RefResolver};
pub use type_resolver::{FieldDescriptor, Registration, StructDescriptor, TypeInfo, TypeResolver};
