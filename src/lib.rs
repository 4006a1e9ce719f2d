// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `fory-core`: the wire protocol, reference/type resolvers, meta-string
//! codec, and serializer set underlying the cross-language Fory
//! serialization framework.
//!
//! See [`Fory`] and [`ForyBuilder`] for the entry point, [`Value`] for the
//! dynamic object model this core serializes, and [`resolver::Registration`]
//! for registering struct/enum types.

pub mod buffer;
pub mod error;
pub mod fory;
pub mod meta;
pub mod resolver;
pub mod serializer;
pub mod types;
pub mod value;

pub use buffer::Buffer;
pub use error::{Error, Result};
pub use fory::{Fory, ForyBuilder, Mode};
pub use value::{StructValue, Value};
