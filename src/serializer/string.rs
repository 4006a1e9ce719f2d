// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! String codec (spec §4.5 "String"): length-prefixed UTF-8, identical on
//! the native and cross-language paths.

use crate::buffer::Buffer;
use crate::error::Result;

pub fn write_string(buf: &mut Buffer, v: &str) {
    buf.write_string(v);
}

pub fn read_string(buf: &mut Buffer) -> Result<String> {
    buf.read_string()
}
