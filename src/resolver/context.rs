// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-operation write/read state: ref tables plus the transient meta-string
//! dedup tables (spec §3, "Serialization context").
//!
//! Scoped to one `serialize`/`deserialize` call and cleared by
//! [`crate::fory::Fory::reset`]; this is distinct from the process-lifetime
//! [`crate::meta::MetaStringCache`].

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::meta::{MetaString, MetaStringBytes, MetaStringDecoder, MetaStringEncoding};
use crate::resolver::ref_resolver::RefResolver;
use std::collections::HashMap;

/// Meta-string bytes shorter than this get a one-byte encoding tag on first
/// write; longer ones additionally carry a 64-bit hash so the process-lifetime
/// cache can key on it without re-hashing the payload.
const INLINE_ENCODING_THRESHOLD: usize = 16;

pub struct WriteContext {
    pub ref_resolver: RefResolver,
    meta_ids: HashMap<u64, u32>,
}

impl WriteContext {
    pub fn new(ref_resolver: RefResolver) -> Self {
        WriteContext {
            ref_resolver,
            meta_ids: HashMap::new(),
        }
    }

    pub fn reset(&mut self) {
        self.ref_resolver.reset();
        self.meta_ids.clear();
    }

    /// Writes `ms` per spec §4.4: `(len << 1) | reused_flag`, back-reference
    /// when seen before this operation, else length + encoding tag (+ hash for
    /// long payloads) + raw bytes.
    pub fn write_meta_string(&mut self, buf: &mut Buffer, ms: &MetaString) {
        let msb = MetaStringBytes::new(ms.encoded.clone(), ms.encoding);
        if let Some(&id) = self.meta_ids.get(&msb.hash) {
            buf.write_varuint32((id << 1) | 1);
            return;
        }
        let id = self.meta_ids.len() as u32;
        self.meta_ids.insert(msb.hash, id);
        buf.write_varuint32((ms.encoded.len() as u32) << 1);
        buf.write_u8(ms.encoding as u8);
        if ms.encoded.len() > INLINE_ENCODING_THRESHOLD {
            buf.write_u64(msb.hash);
        }
        buf.write_bytes(&ms.encoded);
    }
}

pub struct ReadContext<'a> {
    pub ref_resolver: RefResolver,
    meta_table: Vec<MetaStringBytes>,
    oob_source: Option<&'a mut dyn Iterator<Item = Vec<u8>>>,
}

impl<'a> ReadContext<'a> {
    pub fn new(ref_resolver: RefResolver) -> Self {
        ReadContext {
            ref_resolver,
            meta_table: Vec::new(),
            oob_source: None,
        }
    }

    /// Installs the out-of-band payload source for this operation (spec §9
    /// Design Notes, "Out-of-band callback"). Read side counterpart to
    /// [`crate::fory::Fory::set_out_of_band_sink`].
    pub fn with_oob_source(mut self, source: Option<&'a mut dyn Iterator<Item = Vec<u8>>>) -> Self {
        self.oob_source = source;
        self
    }

    pub fn reset(&mut self) {
        self.ref_resolver.reset();
        self.meta_table.clear();
    }

    /// Reborrows the out-of-band source for a single [`read_bytes`] call
    /// without moving it out of this context, so sibling fields/elements can
    /// still consume later chunks from the same source.
    ///
    /// [`read_bytes`]: crate::serializer::bytes_array::read_bytes
    pub fn oob_source_mut(&mut self) -> Option<&mut dyn Iterator<Item = Vec<u8>>> {
        match &mut self.oob_source {
            Some(it) => Some(&mut **it),
            None => None,
        }
    }

    /// Reads one meta-string header, resolving back-references against this
    /// operation's table; returns the raw bytes plus the decoded text.
    pub fn read_meta_string(
        &mut self,
        buf: &mut Buffer,
        decoder: &MetaStringDecoder,
    ) -> Result<(MetaStringBytes, String)> {
        let tag = buf.read_varuint32()?;
        if tag & 1 == 1 {
            let id = (tag >> 1) as usize;
            let msb = self
                .meta_table
                .get(id)
                .cloned()
                .ok_or_else(|| Error::TypeUnregistered(format!("meta-string back-ref {id}")))?;
            let text = decoder.decode(&msb.bytes, msb.encoding)?;
            return Ok((msb, text));
        }
        let len = (tag >> 1) as usize;
        let encoding = MetaStringEncoding::from_u8(buf.read_u8()?).ok_or(
            Error::MetaStringUnsupportedChar {
                ch: '\u{0}',
                encoding: "unknown tag",
            },
        )?;
        if len > INLINE_ENCODING_THRESHOLD {
            let _hash_hint = buf.read_u64()?;
        }
        let bytes = buf.read_exact(len)?.to_vec();
        let text = decoder.decode(&bytes, encoding)?;
        let msb = MetaStringBytes::new(bytes, encoding);
        self.meta_table.push(msb.clone());
        Ok((msb, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaStringEncoder;

    #[test]
    fn repeated_meta_string_costs_one_varint() {
        let mut wctx = WriteContext::new(RefResolver::untracked());
        let encoder = MetaStringEncoder::new('.', '_');
        let ms = encoder.encode("demo.namespace").unwrap();
        let mut buf = Buffer::new();
        wctx.write_meta_string(&mut buf, &ms);
        let first_len = buf.writer_index();
        wctx.write_meta_string(&mut buf, &ms);
        let second_write = buf.writer_index() - first_len;
        assert!(second_write <= 2, "back-reference should be tiny, got {second_write} bytes");
    }

    #[test]
    fn write_then_read_roundtrips_text() {
        let mut wctx = WriteContext::new(RefResolver::untracked());
        let encoder = MetaStringEncoder::new('.', '_');
        let ms = encoder.encode("demo.namespace").unwrap();
        let mut buf = Buffer::new();
        wctx.write_meta_string(&mut buf, &ms);
        wctx.write_meta_string(&mut buf, &ms);
        buf.set_reader_index(0);
        let decoder = crate::meta::MetaStringDecoder::new('.', '_');
        let mut rctx = ReadContext::new(RefResolver::untracked());
        let (_, text1) = rctx.read_meta_string(&mut buf, &decoder).unwrap();
        let (_, text2) = rctx.read_meta_string(&mut buf, &decoder).unwrap();
        assert_eq!(text1, "demo.namespace");
        assert_eq!(text2, "demo.namespace");
    }
}
