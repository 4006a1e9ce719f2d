// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The dynamic value model this core serializes.
//!
//! Rust has no runtime type inspection the way the Python source does, so a
//! `Value` is the sum type every codec in [`crate::serializer`] reads and
//! writes. Composite variants are `Rc<RefCell<_>>`-backed so an object graph
//! can contain cycles and so the reference resolver has a stable identity
//! (the `Rc`'s address) to track, mirroring the index-slot design in the
//! Design Notes.

use crate::types::Language;
use std::cell::RefCell;
use std::rc::Rc;

pub type ListHandle = Rc<RefCell<Vec<Value>>>;
pub type MapHandle = Rc<RefCell<Vec<(Value, Value)>>>;
pub type StructHandle = Rc<RefCell<StructValue>>;

#[derive(Debug, Clone)]
pub struct StructValue {
    pub type_id: i32,
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// A value in the fory object model.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Days since 1970-01-01.
    Date(i32),
    /// Microseconds since epoch.
    Timestamp(i64),
    List(ListHandle),
    Set(ListHandle),
    Map(MapHandle),
    Struct(StructHandle),
    Enum { type_id: i32, variant: String },
    /// A peer-language value of a type this side never registered (spec §4.5
    /// "Peer-language opaque objects"): `namespace`/`typename` are set for a
    /// `NAMED_EXT` header, `None` for a plain `EXT` header; `ordinal` is the
    /// raw wire type id, preserved so writing this value back reproduces the
    /// same header. `data` is the length-prefixed payload, carried opaquely
    /// since this side has no descriptor to interpret it with. `language` is
    /// the stream's declared peer language (one tag per stream, not per
    /// value), recorded for the caller's reference.
    Ext {
        language: Language,
        namespace: Option<String>,
        typename: Option<String>,
        ordinal: i32,
        data: Vec<u8>,
    },
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn set(items: Vec<Value>) -> Value {
        Value::Set(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn struct_value(type_id: i32, fields: Vec<(String, Value)>) -> Value {
        Value::Struct(Rc::new(RefCell::new(StructValue { type_id, fields })))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// A stable per-object identity for trackable (composite) values, used by
    /// the reference resolver. Scalars return `None`: they never participate
    /// in reference tracking (`need_to_write_ref = false` per spec §4.5).
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::List(h) | Value::Set(h) => Some(Rc::as_ptr(h) as usize),
            Value::Map(h) => Some(Rc::as_ptr(h) as usize),
            Value::Struct(h) => Some(Rc::as_ptr(h) as usize),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Set(a), Value::Set(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                *a.borrow() == *b.borrow()
            }
            (Value::Map(a), Value::Map(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                *a.borrow() == *b.borrow()
            }
            (Value::Struct(a), Value::Struct(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.type_id == b.type_id && a.fields == b.fields
            }
            (Value::Enum { type_id: t1, variant: v1 }, Value::Enum { type_id: t2, variant: v2 }) => {
                t1 == t2 && v1 == v2
            }
            (
                Value::Ext {
                    language: l1,
                    namespace: ns1,
                    typename: tn1,
                    ordinal: o1,
                    data: d1,
                },
                Value::Ext {
                    language: l2,
                    namespace: ns2,
                    typename: tn2,
                    ordinal: o2,
                    data: d2,
                },
            ) => l1 == l2 && ns1 == ns2 && tn1 == tn2 && o1 == o2 && d1 == d2,
            _ => false,
        }
    }
}
