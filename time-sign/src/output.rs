// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The two output streams of a run.
//!
//! The signature stream is the plain concatenation of DER encoded signatures. DER is self
//! delimiting, so no length prefix or separator is written between them; [split_signatures] walks
//! the stream using the length of each outer SEQUENCE. The timing stream is the concatenation of
//! 64-bit samples in the byte order detected at startup.

use crate::endianness::ByteOrder;
use crate::error::{TimeSignError, TimeSignResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const SIGNATURES: &str = "signatures";
const TIMINGS: &str = "timings";

const DER_SEQUENCE: u8 = 0x30;

/// Appends (signature, timing sample) pairs to the two output streams.
pub struct OutputWriter<S: Write, T: Write> {
    signatures: S,
    timings: T,
    order: ByteOrder,
    entries: u64,
    signature_bytes: u64,
}

impl OutputWriter<BufWriter<File>, BufWriter<File>> {
    /// Create both output files, truncating them if they exist.
    pub fn create(signatures: &Path, timings: &Path, order: ByteOrder) -> TimeSignResult<Self> {
        Ok(Self::new(
            BufWriter::new(create_file(SIGNATURES, signatures)?),
            BufWriter::new(create_file(TIMINGS, timings)?),
            order,
        ))
    }
}

impl<S: Write, T: Write> OutputWriter<S, T> {
    pub fn new(signatures: S, timings: T, order: ByteOrder) -> Self {
        Self {
            signatures,
            timings,
            order,
            entries: 0,
            signature_bytes: 0,
        }
    }

    /// Append one pair. The signature goes first, so if writing the sample fails the signature
    /// stream is one entry ahead of the timing stream.
    pub fn write(&mut self, signature: &[u8], sample: u64) -> TimeSignResult<()> {
        self.signatures
            .write_all(signature)
            .map_err(|source| self.write_error(SIGNATURES, source))?;
        self.timings
            .write_all(&self.order.encode_u64(sample))
            .map_err(|source| self.write_error(TIMINGS, source))?;
        self.entries += 1;
        self.signature_bytes += signature.len() as u64;
        Ok(())
    }

    /// Flush both streams. Both are attempted even if the first fails.
    pub fn flush(&mut self) -> TimeSignResult<()> {
        let signatures = self.signatures.flush();
        let timings = self.timings.flush();
        signatures.map_err(|source| self.write_error(SIGNATURES, source))?;
        timings.map_err(|source| self.write_error(TIMINGS, source))
    }

    /// Number of complete pairs written.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn signature_bytes(&self) -> u64 {
        self.signature_bytes
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn into_inner(self) -> (S, T) {
        (self.signatures, self.timings)
    }

    fn write_error(&self, stream: &'static str, source: std::io::Error) -> TimeSignError {
        TimeSignError::Write {
            stream,
            blocks: self.entries,
            source,
        }
    }
}

fn create_file(role: &'static str, path: &Path) -> TimeSignResult<File> {
    File::create(path).map_err(|source| TimeSignError::Open {
        role,
        path: path.to_path_buf(),
        source,
    })
}

/// Split a signature stream into the individual DER signatures it is made of.
pub fn split_signatures(mut stream: &[u8]) -> TimeSignResult<Vec<&[u8]>> {
    let mut signatures = Vec::new();
    let mut offset = 0;
    while !stream.is_empty() {
        let len = der_sequence_len(stream).ok_or(TimeSignError::SignatureStream(offset))?;
        let (signature, rest) = stream.split_at(len);
        signatures.push(signature);
        offset += len;
        stream = rest;
    }
    Ok(signatures)
}

/// Total length, header included, of the DER SEQUENCE at the start of `bytes`.
fn der_sequence_len(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < 2 || bytes[0] != DER_SEQUENCE {
        return None;
    }
    let (header, content) = match bytes[1] {
        short @ 0x00..=0x7f => (2, short as usize),
        0x81 => (3, *bytes.get(2)? as usize),
        0x82 => (4, u16::from_be_bytes([*bytes.get(2)?, *bytes.get(3)?]) as usize),
        _ => return None,
    };
    let len = header + content;
    (len <= bytes.len()).then_some(len)
}
