//! Byte-order aware float conversion.
//!
//! Vendor data files store IEEE-754 32-bit floats in a fixed byte order
//! that may differ from the host; these helpers decode and encode whole
//! buffers through `byteorder`.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte order of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrderKind {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrderKind {
    /// Byte order of the running platform.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }

    /// Would reading this order on the host require swapping?
    pub fn needs_swap(self) -> bool {
        self != Self::native()
    }
}

impl fmt::Display for ByteOrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BigEndian => write!(f, "big-endian"),
            Self::LittleEndian => write!(f, "little-endian"),
        }
    }
}

/// Decode `buf` (length a multiple of 4) into floats.
pub fn decode_f32s(buf: &[u8], order: ByteOrderKind) -> Vec<f32> {
    debug_assert!(buf.len() % 4 == 0, "decode_f32s: buffer length must be multiple of 4");
    let mut out = vec![0f32; buf.len() / 4];
    match order {
        ByteOrderKind::BigEndian => BigEndian::read_f32_into(&buf[..out.len() * 4], &mut out),
        ByteOrderKind::LittleEndian => LittleEndian::read_f32_into(&buf[..out.len() * 4], &mut out),
    }
    out
}

/// Decode a single float from the first four bytes of `buf`.
pub fn decode_f32(buf: &[u8], order: ByteOrderKind) -> f32 {
    match order {
        ByteOrderKind::BigEndian => BigEndian::read_f32(buf),
        ByteOrderKind::LittleEndian => LittleEndian::read_f32(buf),
    }
}

/// Encode floats into bytes of the given order.
pub fn encode_f32s(data: &[f32], order: ByteOrderKind) -> Vec<u8> {
    let mut buf = vec![0u8; data.len() * 4];
    match order {
        ByteOrderKind::BigEndian => BigEndian::write_f32_into(data, &mut buf),
        ByteOrderKind::LittleEndian => LittleEndian::write_f32_into(data, &mut buf),
    }
    buf
}
