// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enum codec (spec §4.5 "Enum"): written as the member name, resolved by
//! name on read.

use crate::buffer::Buffer;
use crate::error::Result;

pub fn write_enum(buf: &mut Buffer, variant: &str) {
    buf.write_string(variant);
}

pub fn read_enum(buf: &mut Buffer) -> Result<String> {
    buf.read_string()
}
