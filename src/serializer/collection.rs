// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! List/set codec (spec §4.5 "List / set / tuple"): a length, a flag byte,
//! and per-element payloads that share a type header when the elements are
//! homogeneous.

use crate::buffer::Buffer;
use crate::error::Result;
use crate::value::Value;

pub mod list_flags {
    pub const SAME_TYPE: u8 = 1 << 0;
    pub const NEEDS_REF: u8 = 1 << 1;
    pub const HAS_NULL: u8 = 1 << 2;
}

pub(crate) fn same_kind(a: &Value, b: &Value) -> bool {
    use Value::*;
    match (a, b) {
        (Null, Null)
        | (Bool(_), Bool(_))
        | (I8(_), I8(_))
        | (I16(_), I16(_))
        | (I32(_), I32(_))
        | (I64(_), I64(_))
        | (F32(_), F32(_))
        | (F64(_), F64(_))
        | (String(_), String(_))
        | (Bytes(_), Bytes(_))
        | (Date(_), Date(_))
        | (Timestamp(_), Timestamp(_))
        | (List(_), List(_))
        | (Set(_), Set(_))
        | (Map(_), Map(_)) => true,
        (Struct(x), Struct(y)) => x.borrow().type_id == y.borrow().type_id,
        (Enum { type_id: t1, .. }, Enum { type_id: t2, .. }) => t1 == t2,
        _ => false,
    }
}

/// Writes a list/set body. `write_elem(buf, value, write_type_header)` must
/// write the value's ref-or-null header and, when asked, its type header and
/// payload; it is supplied by the driver so this module stays type-agnostic.
pub fn write_list(
    buf: &mut Buffer,
    items: &[Value],
    mut write_elem: impl FnMut(&mut Buffer, &Value, bool) -> Result<()>,
) -> Result<()> {
    buf.write_varuint32(items.len() as u32);
    let homogeneous = items.len() > 1 && items.windows(2).all(|w| same_kind(&w[0], &w[1]));
    let mut flags = 0u8;
    if homogeneous {
        flags |= list_flags::SAME_TYPE;
    }
    if items.iter().any(|v| v.identity().is_some()) {
        flags |= list_flags::NEEDS_REF;
    }
    if items.iter().any(Value::is_null) {
        flags |= list_flags::HAS_NULL;
    }
    buf.write_u8(flags);
    let mut header_written = false;
    for item in items {
        let write_header = !homogeneous || !header_written;
        write_elem(buf, item, write_header)?;
        header_written = true;
    }
    Ok(())
}

/// Reads a list/set body; `read_elem(buf, read_type_header)` mirrors
/// [`write_list`]'s `write_elem`.
pub fn read_list(
    buf: &mut Buffer,
    mut read_elem: impl FnMut(&mut Buffer, bool) -> Result<Value>,
) -> Result<Vec<Value>> {
    let len = buf.read_varuint32()? as usize;
    let flags = buf.read_u8()?;
    let same = flags & list_flags::SAME_TYPE != 0;
    let mut out = Vec::with_capacity(len);
    let mut header_read = false;
    for _ in 0..len {
        let read_header = !same || !header_read;
        out.push(read_elem(buf, read_header)?);
        header_read = true;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homogeneous_list_writes_type_header_once() {
        let items = vec![Value::I32(1), Value::I32(2), Value::I32(3)];
        let mut buf = Buffer::new();
        let mut header_writes = 0;
        write_list(&mut buf, &items, |b, v, write_header| {
            if write_header {
                header_writes += 1;
            }
            if let Value::I32(n) = v {
                b.write_varint32(*n);
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(header_writes, 1);
    }

    #[test]
    fn mixed_list_writes_type_header_per_element() {
        let items = vec![Value::I32(1), Value::String("a".into())];
        let mut buf = Buffer::new();
        let mut header_writes = 0;
        write_list(&mut buf, &items, |_b, _v, write_header| {
            if write_header {
                header_writes += 1;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(header_writes, 2);
    }
}
