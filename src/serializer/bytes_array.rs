// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bytes / primitive-array codec (spec §4.5 "Bytes / primitive arrays") with
//! out-of-band support: when the driver holds a callback and the callback
//! accepts the payload, the bytes are emitted through the callback and the
//! inline slot carries only a boolean placeholder.

use crate::buffer::Buffer;
use crate::error::{Error, Result};

/// Writes `data`, handing it to `sink` first. `sink` returns `true` when it
/// accepted the payload out-of-band; the inline placeholder is then `false`
/// (no bytes follow). With no sink, or a sink that declines, the payload is
/// written inline (placeholder `true` + length-prefixed bytes).
pub fn write_bytes(buf: &mut Buffer, data: &[u8], sink: Option<&mut dyn FnMut(&[u8]) -> bool>) {
    let sent_out_of_band = match sink {
        Some(cb) => cb(data),
        None => false,
    };
    buf.write_u8(if sent_out_of_band { 0 } else { 1 });
    if !sent_out_of_band {
        buf.write_bytes_prefixed(data);
    }
}

/// Reads a payload written by [`write_bytes`]. `source` must be supplied
/// when the stream carries out-of-band payloads (checked by the driver via
/// the header's out-of-band flag before any call reaches here).
pub fn read_bytes(
    buf: &mut Buffer,
    source: Option<&mut dyn Iterator<Item = Vec<u8>>>,
) -> Result<Vec<u8>> {
    let inline = buf.read_u8()? != 0;
    if inline {
        return buf.read_bytes_prefixed();
    }
    source
        .and_then(Iterator::next)
        .ok_or(Error::OutOfBandMissing)
}
