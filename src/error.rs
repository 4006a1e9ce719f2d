// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the fory wire protocol, resolvers, and codecs.

use thiserror::Error;

/// Errors returned by fory serialization and deserialization operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Attempted to read past the writer cursor.
    #[error("buffer underflow: read {requested} bytes at offset {offset}, only {available} available")]
    BufferUnderflow {
        offset: usize,
        requested: usize,
        available: usize,
    },

    /// Cross-language magic number did not match `0x62D4`.
    #[error("magic mismatch: expected {expected:#06X}, got {actual:#06X}")]
    MagicMismatch { expected: u16, actual: u16 },

    /// Peer declared big-endian, which this implementation does not support.
    #[error("endian unsupported: peer is not little-endian")]
    EndianUnsupported,

    /// Stream has the out-of-band flag set but the caller supplied no buffer iterator.
    #[error("out-of-band payload expected but no buffer source was supplied")]
    OutOfBandMissing,

    /// Caller supplied an out-of-band buffer source but the stream has no out-of-band payloads.
    #[error("out-of-band buffer source supplied but stream carries no out-of-band payloads")]
    OutOfBandUnexpected,

    /// Type id or (namespace, name) pair has no registered `TypeInfo`.
    #[error("type unregistered: {0}")]
    TypeUnregistered(String),

    /// A different runtime type is already registered under the requested id or name.
    #[error("type already registered: {0}")]
    TypeAlreadyRegistered(String),

    /// Both `id` and `typename` were supplied, or neither, during registration.
    #[error("invalid type registration: {0}")]
    InvalidRegistration(String),

    /// Struct schema hash computed locally does not match the hash on the wire.
    #[error("schema incompatible: expected hash {expected}, got {actual} for struct {name}")]
    SchemaIncompatible {
        name: String,
        expected: i32,
        actual: i32,
    },

    /// Meta-string input exceeds the 32767-character bound.
    #[error("meta-string too long: {len} characters (max 32767)")]
    MetaStringTooLong { len: usize },

    /// Meta-string input contains a character the requested encoding cannot represent.
    #[error("meta-string unsupported char {ch:?} for encoding {encoding}")]
    MetaStringUnsupportedChar { ch: char, encoding: &'static str },

    /// No serializer is registered for the runtime type and no fallback is available.
    #[error("unsupported object: {0}")]
    UnsupportedObject(String),

    /// Input bytes are not valid UTF-8 where a string was expected.
    #[error("invalid utf-8 string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
