// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar payload codecs (spec §4.5 "Scalars"). Type headers are the type
//! resolver's job; these functions write/read only the payload bytes.

use crate::buffer::Buffer;
use crate::error::Result;

pub fn write_bool(buf: &mut Buffer, v: bool) {
    buf.write_u8(if v { 1 } else { 0 });
}

pub fn read_bool(buf: &mut Buffer) -> Result<bool> {
    Ok(buf.read_u8()? != 0)
}

pub fn write_i8(buf: &mut Buffer, v: i8) {
    buf.write_i8(v);
}

pub fn read_i8(buf: &mut Buffer) -> Result<i8> {
    buf.read_i8()
}

pub fn write_i16(buf: &mut Buffer, v: i16) {
    buf.write_i16(v);
}

pub fn read_i16(buf: &mut Buffer) -> Result<i16> {
    buf.read_i16()
}

pub fn write_i32(buf: &mut Buffer, v: i32) {
    buf.write_varint32(v);
}

pub fn read_i32(buf: &mut Buffer) -> Result<i32> {
    buf.read_varint32()
}

pub fn write_i64(buf: &mut Buffer, v: i64) {
    buf.write_varint64(v);
}

pub fn read_i64(buf: &mut Buffer) -> Result<i64> {
    buf.read_varint64()
}

pub fn write_f32(buf: &mut Buffer, v: f32) {
    buf.write_f32(v);
}

pub fn read_f32(buf: &mut Buffer) -> Result<f32> {
    buf.read_f32()
}

pub fn write_f64(buf: &mut Buffer, v: f64) {
    buf.write_f64(v);
}

pub fn read_f64(buf: &mut Buffer) -> Result<f64> {
    buf.read_f64()
}

/// Days since 1970-01-01.
pub fn write_date(buf: &mut Buffer, v: i32) {
    buf.write_varint32(v);
}

pub fn read_date(buf: &mut Buffer) -> Result<i32> {
    buf.read_varint32()
}

/// Microseconds since epoch.
pub fn write_timestamp(buf: &mut Buffer, v: i64) {
    buf.write_varint64(v);
}

pub fn read_timestamp(buf: &mut Buffer) -> Result<i64> {
    buf.read_varint64()
}
