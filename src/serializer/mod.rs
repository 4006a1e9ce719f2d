// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type codecs. Every submodule here is a pure function pair operating
//! on [`crate::buffer::Buffer`] and [`crate::value::Value`]; the driver in
//! [`crate::fory`] owns dispatch, ref tracking, and type-header writing, and
//! passes itself back into these modules as a recursion callback where a
//! codec needs to serialize nested values (lists, maps, structs).

pub mod bytes_array;
pub mod collection;
pub mod enum_;
pub mod map;
pub mod scalar;
pub mod string;
pub mod struct_;

use crate::types::type_id;
use crate::value::Value;

/// The built-in type id a `Value` would carry on the wire, for variants
/// whose id isn't already fixed by a type registration (scalars, string,
/// containers). Struct and enum values carry their own registered id.
///
/// Returns `None` for `Value::Null`, which is never type-tagged (spec §4.2:
/// ref flag `NULL` fully encodes it).
pub fn builtin_type_id(value: &Value) -> Option<i32> {
    Some(match value {
        Value::Null => return None,
        Value::Bool(_) => type_id::BOOL as i32,
        Value::I8(_) => type_id::INT8 as i32,
        Value::I16(_) => type_id::INT16 as i32,
        Value::I32(_) => type_id::INT32 as i32,
        Value::I64(_) => type_id::INT64 as i32,
        Value::F32(_) => type_id::FLOAT32 as i32,
        Value::F64(_) => type_id::FLOAT64 as i32,
        Value::String(_) => type_id::STRING as i32,
        Value::Bytes(_) => type_id::BINARY as i32,
        Value::Date(_) => type_id::LOCAL_DATE as i32,
        Value::Timestamp(_) => type_id::TIMESTAMP as i32,
        Value::List(_) => type_id::LIST as i32,
        Value::Set(_) => type_id::SET as i32,
        Value::Map(_) => type_id::MAP as i32,
        Value::Struct(handle) => handle.borrow().type_id,
        Value::Enum { type_id, .. } => *type_id,
        // Ext values carry their own header writer (`Fory::write_value`
        // special-cases them before ever consulting this function).
        Value::Ext { ordinal, .. } => *ordinal,
    })
}

/// `need_to_write_ref` (spec §4.5): only composite values participate in
/// reference tracking; scalars and strings are always fresh.
pub fn needs_ref_tracking(value: &Value) -> bool {
    value.identity().is_some()
}
