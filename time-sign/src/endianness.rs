// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Detection of the byte order used by the running process.
//!
//! The order is probed once by laying a known 16-bit pattern out in memory and looking at which
//! byte comes first. The resulting [ByteOrder] is passed to whoever writes multi-byte integers, so
//! the timing stream is always encoded in the layout of the machine that produced it.

use crate::error::{TimeSignError, TimeSignResult};
use std::fmt::{self, Display};

const PROBE: u16 = 0xABCD;

/// Byte order of multi-byte integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Detect the native byte order of this process.
    pub fn detect() -> TimeSignResult<Self> {
        Self::from_probe(PROBE.to_ne_bytes())
    }

    /// Classify the in-memory layout of `0xABCD`.
    pub fn from_probe(bytes: [u8; 2]) -> TimeSignResult<Self> {
        match bytes {
            [0xCD, 0xAB] => Ok(ByteOrder::LittleEndian),
            [0xAB, 0xCD] => Ok(ByteOrder::BigEndian),
            other => Err(TimeSignError::UnknownEndianness(other)),
        }
    }

    /// The opposite order. Useful to check that a stream was not decoded by accident.
    pub fn swapped(self) -> Self {
        match self {
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
        }
    }

    pub fn encode_u64(self, value: u64) -> [u8; 8] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    pub fn decode_u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(bytes),
            ByteOrder::BigEndian => u64::from_be_bytes(bytes),
        }
    }

    /// Split a timing stream into its samples. Trailing bytes that do not form a full sample are
    /// ignored.
    pub fn decode_samples(self, stream: &[u8]) -> Vec<u64> {
        stream
            .chunks_exact(8)
            .map(|chunk| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                self.decode_u64(bytes)
            })
            .collect()
    }
}

impl Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::LittleEndian => write!(f, "little-endian"),
            ByteOrder::BigEndian => write!(f, "big-endian"),
        }
    }
}
