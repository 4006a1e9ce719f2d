// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire constants: magic number, header flags, language tags, type ids,
//! ref flags, and meta-string encoding tags.

/// Cross-language stream magic, little-endian `0x62D4` (bytes `D4 62` on the wire).
pub const MAGIC_NUMBER: u16 = 0x62D4;

/// Header bit flags (single byte following the magic, or leading the stream
/// in same-language mode).
pub mod config_flags {
    pub const IS_NULL_FLAG: u8 = 1 << 0;
    pub const IS_LITTLE_ENDIAN_FLAG: u8 = 1 << 1;
    pub const IS_CROSS_LANGUAGE_FLAG: u8 = 1 << 2;
    pub const IS_OUT_OF_BAND_FLAG: u8 = 1 << 3;
}

/// Peer language tag, written as one byte when the cross-language flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Language {
    Xlang = 0,
    Java = 1,
    Python = 2,
    Cpp = 3,
    Go = 4,
    JavaScript = 5,
    Rust = 6,
}

impl Language {
    pub fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Language::Xlang,
            1 => Language::Java,
            2 => Language::Python,
            3 => Language::Cpp,
            4 => Language::Go,
            5 => Language::JavaScript,
            6 => Language::Rust,
            _ => return None,
        })
    }
}

/// Reference-id sentinels written ahead of a value's payload.
pub mod ref_flags {
    /// Value is null/None.
    pub const NULL: i8 = -3;
    /// Value was already seen; a prior ref id follows.
    pub const REF: i8 = -2;
    /// Value is not null and is not reference-tracked.
    pub const NOT_NULL: i8 = -1;
    /// First sighting of a tracked value; a fresh ref id (>= 0) follows.
    pub const REF_VALUE: i8 = 0;
}

/// Built-in and namespaced type ids (spec §6, selected).
pub mod type_id {
    pub const BOOL: i16 = 1;
    pub const INT8: i16 = 2;
    pub const INT16: i16 = 3;
    pub const INT32: i16 = 4;
    pub const INT64: i16 = 6;
    pub const FLOAT32: i16 = 10;
    pub const FLOAT64: i16 = 11;
    pub const STRING: i16 = 12;
    pub const ENUM: i16 = 13;
    pub const NAMED_ENUM: i16 = 14;
    pub const STRUCT: i16 = 15;
    pub const NAMED_STRUCT: i16 = 19;
    pub const EXT: i16 = 23;
    pub const NAMED_EXT: i16 = 25;
    pub const LIST: i16 = 27;
    pub const SET: i16 = 28;
    pub const MAP: i16 = 29;
    pub const TIMESTAMP: i16 = 31;
    pub const LOCAL_DATE: i16 = 32;
    pub const BINARY: i16 = 34;
    pub const BOOL_ARRAY: i16 = 36;
    pub const INT8_ARRAY: i16 = 37;
    pub const INT16_ARRAY: i16 = 38;
    pub const INT32_ARRAY: i16 = 39;
    pub const INT64_ARRAY: i16 = 40;
    pub const FLOAT32_ARRAY: i16 = 42;
    pub const FLOAT64_ARRAY: i16 = 43;

    /// First user-assignable id; ids below this are reserved for built-ins.
    pub const USER_TYPE_START: i32 = 64;

    /// True when `id`'s low byte marks a namespaced wire representation
    /// (its header additionally carries namespace + typename meta-strings).
    pub fn is_namespaced(id: i32) -> bool {
        matches!(
            (id & 0xff) as i16,
            NAMED_ENUM | NAMED_STRUCT | NAMED_EXT
        )
    }

    /// True when `id`'s low byte marks an extension-type wire representation
    /// (payload is a length-prefixed raw byte blob, §4.5 "Peer-language
    /// opaque objects"): the one type-id category an unregistered local
    /// resolver can still pass through losslessly, since it never needs to
    /// know how to interpret the bytes.
    pub fn is_ext(id: i32) -> bool {
        matches!((id & 0xff) as i16, EXT | NAMED_EXT)
    }
}

/// Map chunk header bit flags (spec §4.5).
pub mod chunk_flags {
    pub const TRACKING_KEY_REF: u8 = 1 << 0;
    pub const KEY_HAS_NULL: u8 = 1 << 1;
    pub const KEY_DECL_TYPE: u8 = 1 << 2;
    pub const TRACKING_VALUE_REF: u8 = 1 << 3;
    pub const VALUE_HAS_NULL: u8 = 1 << 4;
    pub const VALUE_DECL_TYPE: u8 = 1 << 5;

    pub const KV_NULL: u8 = KEY_HAS_NULL | VALUE_HAS_NULL;

    /// Maximum entries a single chunk may describe.
    pub const MAX_CHUNK_SIZE: usize = 255;
}
