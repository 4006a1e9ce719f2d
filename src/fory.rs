// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The protocol driver: stream header, recursive value dispatch, and
//! out-of-band plumbing (spec §4.5 "Driver", §6).

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::meta::MetaStringCache;
use crate::resolver::type_resolver::{schema_hash, Registration};
use crate::resolver::{ReadContext, RefResolver, TypeResolver, WriteContext};
use crate::serializer::{bytes_array, collection, enum_, map, scalar, string, struct_};
use crate::types::{config_flags, type_id as tid, Language, MAGIC_NUMBER};
use crate::value::{StructValue, Value};
use std::rc::Rc;

/// Schema-evolution posture (§3.1). `Compatible` is accepted but behaves
/// identically to `SchemaConsistent`: schema evolution beyond the hash check
/// in §4.5 is an explicit Non-goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SchemaConsistent,
    Compatible,
}

/// Staged builder for [`Fory`] (§3.1), mirroring the teacher's
/// `Participant::builder` pattern.
pub struct ForyBuilder {
    xlang: bool,
    peer_language: Language,
    compress_string: bool,
    ref_tracking: bool,
    mode: Mode,
    meta_cache_capacity: usize,
}

impl ForyBuilder {
    pub fn new() -> Self {
        ForyBuilder {
            xlang: true,
            peer_language: Language::Rust,
            compress_string: false,
            ref_tracking: true,
            mode: Mode::SchemaConsistent,
            meta_cache_capacity: 1024,
        }
    }

    pub fn xlang(mut self, enabled: bool) -> Self {
        self.xlang = enabled;
        self
    }

    pub fn peer_language(mut self, language: Language) -> Self {
        self.peer_language = language;
        self
    }

    pub fn compress_string(mut self, enabled: bool) -> Self {
        self.compress_string = enabled;
        self
    }

    pub fn ref_tracking(mut self, enabled: bool) -> Self {
        self.ref_tracking = enabled;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn meta_cache_capacity(mut self, capacity: usize) -> Self {
        self.meta_cache_capacity = capacity;
        self
    }

    pub fn build(self) -> Fory {
        log::debug!(
            "building Fory instance: xlang={} peer_language={:?} ref_tracking={}",
            self.xlang,
            self.peer_language,
            self.ref_tracking
        );
        Fory {
            type_resolver: TypeResolver::new(),
            xlang: self.xlang,
            peer_language: self.peer_language,
            compress_string: self.compress_string,
            ref_tracking: self.ref_tracking,
            mode: self.mode,
            meta_cache: MetaStringCache::new(self.meta_cache_capacity),
            oob_sink: None,
        }
    }
}

impl Default for ForyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The serialization engine: one instance per worker (spec §5 — not
/// thread-safe; share nothing mutable across threads).
pub struct Fory {
    type_resolver: TypeResolver,
    xlang: bool,
    peer_language: Language,
    #[allow(dead_code)]
    compress_string: bool,
    ref_tracking: bool,
    #[allow(dead_code)]
    mode: Mode,
    meta_cache: MetaStringCache,
    oob_sink: Option<Box<dyn FnMut(&[u8]) -> bool>>,
}

impl Fory {
    pub fn builder() -> ForyBuilder {
        ForyBuilder::new()
    }

    pub fn register(&mut self, reg: Registration) -> Result<i32> {
        let id = self.type_resolver.register(reg)?;
        log::debug!("registered type id {id}");
        Ok(id)
    }

    /// Installs the write-side out-of-band sink (spec §9 Design Notes,
    /// "Out-of-band callback"). `sink` returns `true` when it accepted a
    /// payload out-of-band.
    pub fn set_out_of_band_sink(&mut self, sink: impl FnMut(&[u8]) -> bool + 'static) {
        self.oob_sink = Some(Box::new(sink));
    }

    fn new_ref_resolver(&self) -> RefResolver {
        if self.ref_tracking {
            RefResolver::tracking()
        } else {
            RefResolver::untracked()
        }
    }

    /// Serializes `root`. Cross-language mode writes the magic number and
    /// peer language tag; a null root short-circuits right after the header
    /// byte, which carries only the is-null bit — no endian, cross-language,
    /// or out-of-band bits, and no peer language tag follows (spec §8
    /// scenario 1: `D4 62 01`, 3 bytes total).
    pub fn serialize(&mut self, root: &Value) -> Result<Vec<u8>> {
        let mut buf = Buffer::new();
        if self.xlang {
            buf.write_u16(MAGIC_NUMBER);
        }

        if root.is_null() {
            buf.write_u8(config_flags::IS_NULL_FLAG);
            log::trace!("serialize: null root, {} bytes total", buf.writer_index());
            return Ok(buf.as_slice().to_vec());
        }

        let has_oob = self.oob_sink.is_some();
        let mut flags = config_flags::IS_LITTLE_ENDIAN_FLAG;
        if self.xlang {
            flags |= config_flags::IS_CROSS_LANGUAGE_FLAG;
        }
        if has_oob {
            flags |= config_flags::IS_OUT_OF_BAND_FLAG;
        }
        buf.write_u8(flags);
        if self.xlang {
            buf.write_u8(self.peer_language as u8);
        }

        let mut wctx = WriteContext::new(self.new_ref_resolver());
        self.write_value(&mut buf, &mut wctx, root, true)?;
        log::trace!("serialize: {} bytes written", buf.writer_index());
        Ok(buf.as_slice().to_vec())
    }

    /// Deserializes a buffer written by [`Fory::serialize`]. `oob_source`
    /// must be supplied when the stream's out-of-band flag is set.
    pub fn deserialize(
        &mut self,
        bytes: Vec<u8>,
        oob_source: Option<&mut dyn Iterator<Item = Vec<u8>>>,
    ) -> Result<Value> {
        let mut buf = Buffer::from_vec(bytes);
        buf.set_reader_index(0);

        if self.xlang {
            let magic = buf.read_u16()?;
            if magic != MAGIC_NUMBER {
                return Err(Error::MagicMismatch {
                    expected: MAGIC_NUMBER,
                    actual: magic,
                });
            }
        }

        let flags = buf.read_u8()?;
        if flags & config_flags::IS_NULL_FLAG != 0 {
            return Ok(Value::Null);
        }
        if flags & config_flags::IS_LITTLE_ENDIAN_FLAG == 0 {
            return Err(Error::EndianUnsupported);
        }
        if flags & config_flags::IS_CROSS_LANGUAGE_FLAG != 0 {
            let tag = buf.read_u8()?;
            Language::from_u8(tag).ok_or(Error::EndianUnsupported)?;
        }
        let has_oob = flags & config_flags::IS_OUT_OF_BAND_FLAG != 0;
        if has_oob && oob_source.is_none() {
            return Err(Error::OutOfBandMissing);
        }
        if !has_oob && oob_source.is_some() {
            return Err(Error::OutOfBandUnexpected);
        }

        let mut rctx = ReadContext::new(self.new_ref_resolver()).with_oob_source(oob_source);
        let mut cached_type = None;
        self.read_value(&mut buf, &mut rctx, true, &mut cached_type)
    }

    // -- recursive write dispatch ------------------------------------------

    fn write_value(
        &mut self,
        buf: &mut Buffer,
        wctx: &mut WriteContext,
        value: &Value,
        write_type_header: bool,
    ) -> Result<()> {
        let header_complete = wctx.ref_resolver.write_ref_or_null(value, buf);
        if header_complete {
            return Ok(());
        }
        if write_type_header {
            if let Value::Ext {
                namespace,
                typename,
                ordinal,
                ..
            } = value
            {
                self.type_resolver.write_opaque_typeinfo(
                    buf,
                    &mut self.meta_cache,
                    wctx,
                    *ordinal,
                    namespace.as_deref(),
                    typename.as_deref(),
                )?;
            } else {
                let tid = crate::serializer::builtin_type_id(value)
                    .expect("non-null value always resolves to a type id");
                self.type_resolver
                    .write_typeinfo(buf, &mut self.meta_cache, wctx, tid)?;
            }
        }
        self.write_payload(buf, wctx, value)
    }

    fn write_payload(&mut self, buf: &mut Buffer, wctx: &mut WriteContext, value: &Value) -> Result<()> {
        match value {
            Value::Null => unreachable!("null short-circuits in write_value"),
            Value::Bool(v) => scalar::write_bool(buf, *v),
            Value::I8(v) => scalar::write_i8(buf, *v),
            Value::I16(v) => scalar::write_i16(buf, *v),
            Value::I32(v) => scalar::write_i32(buf, *v),
            Value::I64(v) => scalar::write_i64(buf, *v),
            Value::F32(v) => scalar::write_f32(buf, *v),
            Value::F64(v) => scalar::write_f64(buf, *v),
            Value::String(v) => string::write_string(buf, v),
            Value::Bytes(v) => match &mut self.oob_sink {
                Some(sink) => bytes_array::write_bytes(buf, v, Some(sink.as_mut())),
                None => bytes_array::write_bytes(buf, v, None),
            },
            Value::Date(v) => scalar::write_date(buf, *v),
            Value::Timestamp(v) => scalar::write_timestamp(buf, *v),
            Value::List(items) | Value::Set(items) => {
                let snapshot: Vec<Value> = items.borrow().clone();
                log::trace!("writing collection of {} elements", snapshot.len());
                collection::write_list(buf, &snapshot, |buf, v, header| {
                    self.write_value(buf, wctx, v, header)
                })?;
            }
            Value::Map(entries) => {
                let snapshot: Vec<(Value, Value)> = entries.borrow().clone();
                log::trace!("writing map of {} entries", snapshot.len());
                map::write_map(buf, &snapshot, |buf, v, header, _is_key| {
                    self.write_value(buf, wctx, v, header)
                })?;
            }
            Value::Struct(handle) => {
                let (type_id, fields): (i32, Vec<(String, Value)>) = {
                    let s = handle.borrow();
                    (s.type_id, s.fields.clone())
                };
                let descriptor = self
                    .type_resolver
                    .lookup(type_id)
                    .and_then(|info| info.struct_descriptor.clone())
                    .ok_or_else(|| Error::TypeUnregistered(type_id.to_string()))?;
                let hash = schema_hash(&descriptor);
                struct_::write_struct(buf, hash, &fields, |buf, v| {
                    self.write_value(buf, wctx, v, true)
                })?;
            }
            Value::Enum { variant, .. } => enum_::write_enum(buf, variant),
            Value::Ext { data, .. } => buf.write_bytes_prefixed(data),
        }
        Ok(())
    }

    // -- recursive read dispatch --------------------------------------------

    fn read_value(
        &mut self,
        buf: &mut Buffer,
        rctx: &mut ReadContext<'_>,
        read_type_header: bool,
        cached_type: &mut Option<i32>,
    ) -> Result<Value> {
        let action = rctx.ref_resolver.try_preserve_ref_id(buf)?;
        match action {
            crate::resolver::RefAction::WasNull => Ok(Value::Null),
            crate::resolver::RefAction::Existing(v) => Ok(v),
            crate::resolver::RefAction::New { reserved_id } => {
                let type_id = if read_type_header {
                    match self.type_resolver.read_typeinfo(buf, rctx)? {
                        crate::resolver::type_resolver::TypeHeader::Known(t) => {
                            *cached_type = Some(t);
                            t
                        }
                        crate::resolver::type_resolver::TypeHeader::Opaque {
                            ordinal,
                            namespace,
                            typename,
                        } => {
                            let data = buf.read_bytes_prefixed()?;
                            let value = Value::Ext {
                                language: self.peer_language,
                                namespace,
                                typename,
                                ordinal,
                                data,
                            };
                            if let Some(id) = reserved_id {
                                rctx.ref_resolver.reference(id, value.clone());
                            }
                            return Ok(value);
                        }
                    }
                } else {
                    cached_type.ok_or_else(|| {
                        Error::TypeUnregistered("no cached type for chunk continuation".into())
                    })?
                };
                self.read_payload(buf, rctx, type_id, reserved_id)
            }
        }
    }

    /// `reserved_id` is `Some` for composite (list/set/map/struct) values:
    /// those branches construct an empty handle and register it via
    /// [`crate::resolver::RefResolver::reference`] *before* decoding their
    /// children, so a child that refers back to this same object (a cycle)
    /// resolves to the same `Rc` instead of re-reading a payload that was
    /// never written.
    fn read_payload(
        &mut self,
        buf: &mut Buffer,
        rctx: &mut ReadContext<'_>,
        type_id: i32,
        reserved_id: Option<u32>,
    ) -> Result<Value> {
        match type_id as i16 {
            tid::BOOL => Ok(Value::Bool(scalar::read_bool(buf)?)),
            tid::INT8 => Ok(Value::I8(scalar::read_i8(buf)?)),
            tid::INT16 => Ok(Value::I16(scalar::read_i16(buf)?)),
            tid::INT32 => Ok(Value::I32(scalar::read_i32(buf)?)),
            tid::INT64 => Ok(Value::I64(scalar::read_i64(buf)?)),
            tid::FLOAT32 => Ok(Value::F32(scalar::read_f32(buf)?)),
            tid::FLOAT64 => Ok(Value::F64(scalar::read_f64(buf)?)),
            tid::STRING => Ok(Value::String(string::read_string(buf)?)),
            tid::BINARY => Ok(Value::Bytes(bytes_array::read_bytes(buf, rctx.oob_source_mut())?)),
            tid::LOCAL_DATE => Ok(Value::Date(scalar::read_date(buf)?)),
            tid::TIMESTAMP => Ok(Value::Timestamp(scalar::read_timestamp(buf)?)),
            tid::LIST => {
                let handle = Rc::new(std::cell::RefCell::new(Vec::new()));
                let value = Value::List(handle.clone());
                if let Some(id) = reserved_id {
                    rctx.ref_resolver.reference(id, value.clone());
                }
                let mut cached = None;
                let items = collection::read_list(buf, |buf, header| {
                    self.read_value(buf, rctx, header, &mut cached)
                })?;
                *handle.borrow_mut() = items;
                Ok(value)
            }
            tid::SET => {
                let handle = Rc::new(std::cell::RefCell::new(Vec::new()));
                let value = Value::Set(handle.clone());
                if let Some(id) = reserved_id {
                    rctx.ref_resolver.reference(id, value.clone());
                }
                let mut cached = None;
                let items = collection::read_list(buf, |buf, header| {
                    self.read_value(buf, rctx, header, &mut cached)
                })?;
                *handle.borrow_mut() = items;
                Ok(value)
            }
            tid::MAP => {
                let handle = Rc::new(std::cell::RefCell::new(Vec::new()));
                let value = Value::Map(handle.clone());
                if let Some(id) = reserved_id {
                    rctx.ref_resolver.reference(id, value.clone());
                }
                let mut cached_key = None;
                let mut cached_value = None;
                let entries = map::read_map(buf, |buf, header, is_key| {
                    let cached = if is_key { &mut cached_key } else { &mut cached_value };
                    self.read_value(buf, rctx, header, cached)
                })?;
                *handle.borrow_mut() = entries;
                Ok(value)
            }
            _ => self.read_struct_or_enum(buf, rctx, type_id, reserved_id),
        }
    }

    fn read_struct_or_enum(
        &mut self,
        buf: &mut Buffer,
        rctx: &mut ReadContext<'_>,
        type_id: i32,
        reserved_id: Option<u32>,
    ) -> Result<Value> {
        let info = self
            .type_resolver
            .lookup(type_id)
            .ok_or_else(|| Error::TypeUnregistered(type_id.to_string()))?
            .clone();
        if info.is_enum {
            let variant = enum_::read_enum(buf)?;
            return Ok(Value::Enum { type_id, variant });
        }
        let descriptor = info
            .struct_descriptor
            .ok_or_else(|| Error::TypeUnregistered(type_id.to_string()))?;
        let expected_hash = schema_hash(&descriptor);
        let names: Vec<String> = descriptor.fields.iter().map(|f| f.name.clone()).collect();
        let struct_name = info.typename.clone().unwrap_or_else(|| type_id.to_string());

        let handle = Rc::new(std::cell::RefCell::new(StructValue {
            type_id,
            fields: Vec::new(),
        }));
        let value = Value::Struct(handle.clone());
        if let Some(id) = reserved_id {
            rctx.ref_resolver.reference(id, value.clone());
        }
        let fields = struct_::read_struct(buf, expected_hash, &struct_name, &names, |buf| {
            let mut cached = None;
            self.read_value(buf, rctx, true, &mut cached)
        })?;
        handle.borrow_mut().fields = fields;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fory() -> Fory {
        ForyBuilder::new().build()
    }

    #[test]
    fn null_root_is_three_bytes_in_xlang_mode() {
        let mut f = fory();
        let bytes = f.serialize(&Value::Null).unwrap();
        assert_eq!(bytes, vec![0xD4, 0x62, 0x01]);
    }

    #[test]
    fn scalar_roundtrip() {
        let mut f = fory();
        let bytes = f.serialize(&Value::I32(42)).unwrap();
        let out = f.deserialize(bytes, None).unwrap();
        assert_eq!(out, Value::I32(42));
    }

    #[test]
    fn string_roundtrip() {
        let mut f = fory();
        let v = Value::String("hello fory".to_string());
        let bytes = f.serialize(&v).unwrap();
        assert_eq!(f.deserialize(bytes, None).unwrap(), v);
    }

    #[test]
    fn list_roundtrip() {
        let mut f = fory();
        let v = Value::list(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
        let bytes = f.serialize(&v).unwrap();
        assert_eq!(f.deserialize(bytes, None).unwrap(), v);
    }

    #[test]
    fn map_roundtrip_with_mixed_value_types() {
        let mut f = fory();
        let v = Value::map(vec![
            (Value::I64(1), Value::F64(2.0)),
            (Value::I64(2), Value::I64(3)),
            (Value::I64(4), Value::Bool(true)),
        ]);
        let bytes = f.serialize(&v).unwrap();
        assert_eq!(f.deserialize(bytes, None).unwrap(), v);
    }

    #[test]
    fn cycle_preservation_list_containing_itself() {
        let mut f = fory();
        let inner = Rc::new(std::cell::RefCell::new(Vec::new()));
        let list = Value::List(inner.clone());
        inner.borrow_mut().push(list.clone());

        let bytes = f.serialize(&list).unwrap();
        let decoded = f.deserialize(bytes, None).unwrap();
        if let Value::List(handle) = &decoded {
            let first = handle.borrow()[0].clone();
            assert!(matches!(&first, Value::List(h) if Rc::ptr_eq(h, handle)));
        } else {
            panic!("expected a list");
        }
    }

    #[test]
    fn shared_identity_is_preserved_across_two_positions() {
        let mut f = fory();
        let shared = Value::list(vec![Value::I32(1)]);
        let root = Value::list(vec![shared.clone(), shared.clone()]);
        let bytes = f.serialize(&root).unwrap();
        let decoded = f.deserialize(bytes, None).unwrap();
        if let Value::List(items) = &decoded {
            let items = items.borrow();
            if let (Value::List(a), Value::List(b)) = (&items[0], &items[1]) {
                assert!(Rc::ptr_eq(a, b));
            } else {
                panic!("expected nested lists");
            }
        } else {
            panic!("expected a list");
        }
    }

    #[test]
    fn struct_roundtrip_with_schema_hash_check() {
        use crate::resolver::type_resolver::FieldDescriptor;
        let mut f = fory();
        let id = f
            .register(
                Registration::by_name("demo", "P").with_fields(vec![
                    FieldDescriptor {
                        name: "f1".into(),
                        type_id: Some(tid::INT32 as i32),
                        canonical_type: "int32".into(),
                    },
                    FieldDescriptor {
                        name: "f2".into(),
                        type_id: Some(tid::STRING as i32),
                        canonical_type: "string".into(),
                    },
                ]),
            )
            .unwrap();
        let value = Value::struct_value(
            id,
            vec![
                ("f1".to_string(), Value::I32(7)),
                ("f2".to_string(), Value::String("hi".to_string())),
            ],
        );
        let bytes = f.serialize(&value).unwrap();
        let decoded = f.deserialize(bytes, None).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn schema_mismatch_on_reader_fails() {
        use crate::resolver::type_resolver::FieldDescriptor;
        let mut writer = fory();
        let id = writer
            .register(Registration::by_name("demo", "Q").with_fields(vec![FieldDescriptor {
                name: "a".into(),
                type_id: Some(tid::INT32 as i32),
                canonical_type: "int32".into(),
            }]))
            .unwrap();
        let value = Value::struct_value(id, vec![("a".to_string(), Value::I32(1))]);
        let bytes = writer.serialize(&value).unwrap();

        let mut reader = fory();
        reader
            .register(Registration::by_name("demo", "Q").with_fields(vec![
                FieldDescriptor {
                    name: "a".into(),
                    type_id: Some(tid::INT32 as i32),
                    canonical_type: "int32".into(),
                },
                FieldDescriptor {
                    name: "b".into(),
                    type_id: Some(tid::STRING as i32),
                    canonical_type: "string".into(),
                },
            ]))
            .unwrap();
        let err = reader.deserialize(bytes, None).unwrap_err();
        assert!(matches!(err, Error::SchemaIncompatible { .. }));
    }

    #[test]
    fn out_of_band_bytes_roundtrip_through_sink_and_source() {
        let mut f = fory();
        f.set_out_of_band_sink(|_| true);
        let value = Value::Bytes(b"large-payload".to_vec());
        let bytes = f.serialize(&value).unwrap();

        let mut reader = fory();
        let mut source = vec![b"large-payload".to_vec()].into_iter();
        let decoded = reader.deserialize(bytes, Some(&mut source)).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn opaque_named_ext_roundtrips_without_either_side_registering_it() {
        let ordinal = (7i32 << 8) | (tid::NAMED_EXT as i32);
        let value = Value::Ext {
            language: Language::Rust,
            namespace: Some("demo".to_string()),
            typename: Some("Widget".to_string()),
            ordinal,
            data: vec![1, 2, 3, 4],
        };
        let mut writer = fory();
        let bytes = writer.serialize(&value).unwrap();

        let mut reader = fory();
        let decoded = reader.deserialize(bytes, None).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn opaque_plain_ext_roundtrips_without_either_side_registering_it() {
        let value = Value::Ext {
            language: Language::Rust,
            namespace: None,
            typename: None,
            ordinal: tid::EXT as i32,
            data: vec![9, 9, 9],
        };
        let mut writer = fory();
        let bytes = writer.serialize(&value).unwrap();

        let mut reader = fory();
        let decoded = reader.deserialize(bytes, None).unwrap();
        assert_eq!(decoded, value);
    }
}
