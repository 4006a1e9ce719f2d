// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct codec (spec §4.5 "Struct"): a schema hash followed by fields in
//! lexicographic name order, each recursively serialized through the driver.

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::value::Value;

pub fn write_struct(
    buf: &mut Buffer,
    hash: i32,
    fields: &[(String, Value)],
    mut write_field: impl FnMut(&mut Buffer, &Value) -> Result<()>,
) -> Result<()> {
    buf.write_i32(hash);
    let mut sorted: Vec<&(String, Value)> = fields.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    for (_, value) in sorted {
        write_field(buf, value)?;
    }
    Ok(())
}

/// Reads a struct body. `field_names_sorted` must already be in the same
/// lexicographic order the writer used. Fails with `SchemaIncompatible` if
/// the hash on the wire doesn't match `expected_hash`.
pub fn read_struct(
    buf: &mut Buffer,
    expected_hash: i32,
    struct_name: &str,
    field_names_sorted: &[String],
    mut read_field: impl FnMut(&mut Buffer) -> Result<Value>,
) -> Result<Vec<(String, Value)>> {
    let actual = buf.read_i32()?;
    if actual != expected_hash {
        return Err(Error::SchemaIncompatible {
            name: struct_name.to_string(),
            expected: expected_hash,
            actual,
        });
    }
    let mut fields = Vec::with_capacity(field_names_sorted.len());
    for name in field_names_sorted {
        fields.push((name.clone(), read_field(buf)?));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_written_in_sorted_order() {
        let fields = vec![
            ("zeta".to_string(), Value::I32(1)),
            ("alpha".to_string(), Value::I32(2)),
        ];
        let mut order = Vec::new();
        let mut buf = Buffer::new();
        write_struct(&mut buf, 42, &fields, |_, v| {
            if let Value::I32(n) = v {
                order.push(*n);
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(order, vec![2, 1]); // alpha (2) before zeta (1)
    }

    #[test]
    fn hash_mismatch_fails_schema_incompatible() {
        let mut buf = Buffer::new();
        buf.write_i32(7);
        let err = read_struct(&mut buf, 8, "Demo", &[], |_| Ok(Value::Null)).unwrap_err();
        assert!(matches!(err, Error::SchemaIncompatible { .. }));
    }
}
