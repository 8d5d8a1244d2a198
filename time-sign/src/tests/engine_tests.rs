// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::clock::{Clock, ClockSource};
use crate::endianness::ByteOrder;
use crate::engine::{sign_blocks, SignTimer};
use crate::error::TimeSignError;
use crate::key::Curve;
use crate::output::{split_signatures, OutputWriter};
use crate::reader::BlockReader;
use crate::test_helpers::{key_for, keys, verify};
use std::io::{Cursor, Read, Write};

fn timer(curve: Curve) -> SignTimer {
    SignTimer::new(key_for(curve), Clock::new(ClockSource::Monotonic).unwrap())
}

/// Accepts `limit` bytes, then fails every write.
struct Full {
    written: Vec<u8>,
    limit: usize,
}

impl Write for Full {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.written.len() + buf.len() > self.limit {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Delivers `data`, then fails every read.
struct Broken {
    data: Cursor<Vec<u8>>,
}

impl Read for Broken {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(std::io::Error::new(std::io::ErrorKind::Other, "device gone")),
            n => Ok(n),
        }
    }
}

#[test]
fn sign_block_verifies() {
    for key in keys() {
        let curve = key.curve();
        let mut timer = SignTimer::new(key, Clock::new(ClockSource::Monotonic).unwrap());
        let signed = timer.sign_block(b"0123456789abcdef").unwrap();
        assert!(verify(timer.key(), b"0123456789abcdef", &signed.signature), "{curve}");
        assert!(signed.elapsed > 0);
    }
}

#[test]
fn signs_every_block_in_order() {
    let input: Vec<u8> = (0..64u8).collect();
    let mut timer = timer(Curve::P256);
    let order = ByteOrder::detect().unwrap();
    let mut out = OutputWriter::new(Vec::new(), Vec::new(), order);

    let count = sign_blocks(
        BlockReader::new(Cursor::new(input.clone()), 16),
        &mut timer,
        &mut out,
    )
    .unwrap();
    assert_eq!(count, 4);

    let (signatures, timings) = out.into_inner();
    let signatures = split_signatures(&signatures).unwrap();
    assert_eq!(signatures.len(), 4);
    for (block, signature) in input.chunks(16).zip(&signatures) {
        assert!(verify(timer.key(), block, signature));
    }
    assert_eq!(timings.len(), 4 * 8);
    assert_eq!(order.decode_samples(&timings).len(), 4);
}

#[test]
fn identical_blocks_get_distinct_signatures() {
    let input = vec![0x42u8; 16 * 8];
    let mut timer = timer(Curve::Secp256k1);
    let mut out = OutputWriter::new(Vec::new(), Vec::new(), ByteOrder::detect().unwrap());
    sign_blocks(BlockReader::new(Cursor::new(input), 16), &mut timer, &mut out).unwrap();

    let (signatures, _) = out.into_inner();
    let signatures = split_signatures(&signatures).unwrap();
    assert_eq!(signatures.len(), 8);
    for (i, a) in signatures.iter().enumerate() {
        assert!(verify(timer.key(), &[0x42u8; 16], a));
        for b in &signatures[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn truncation_keeps_complete_blocks() {
    let input = vec![7u8; 65];
    let mut timer = timer(Curve::P384);
    let mut out = OutputWriter::new(Vec::new(), Vec::new(), ByteOrder::detect().unwrap());

    let err = sign_blocks(BlockReader::new(Cursor::new(input), 16), &mut timer, &mut out)
        .unwrap_err();
    assert!(matches!(
        err,
        TimeSignError::Truncated {
            expected: 16,
            actual: 1
        }
    ));
    assert_eq!(out.entries(), 4);
    let (signatures, timings) = out.into_inner();
    assert_eq!(split_signatures(&signatures).unwrap().len(), 4);
    assert_eq!(timings.len(), 32);
}

#[test]
fn timing_write_failure_stops_loop() {
    let input = vec![1u8; 16 * 5];
    let mut timer = timer(Curve::P256);
    // Room for two samples only.
    let timings = Full {
        written: Vec::new(),
        limit: 16,
    };
    let mut out = OutputWriter::new(Vec::new(), timings, ByteOrder::detect().unwrap());

    let err = sign_blocks(BlockReader::new(Cursor::new(input), 16), &mut timer, &mut out)
        .unwrap_err();
    match err {
        TimeSignError::Write { stream, blocks, .. } => {
            assert_eq!(stream, "timings");
            assert_eq!(blocks, 2);
        }
        other => panic!("unexpected error {other:?}"),
    }

    // The third signature made it out, its sample did not.
    let (signatures, timings) = out.into_inner();
    assert_eq!(split_signatures(&signatures).unwrap().len(), 3);
    assert_eq!(timings.written.len(), 16);
}

#[test]
fn signature_write_failure_stops_loop() {
    let input = vec![1u8; 16 * 5];
    let mut timer = timer(Curve::P256);
    let signatures = Full {
        written: Vec::new(),
        limit: 0,
    };
    let mut out = OutputWriter::new(signatures, Vec::new(), ByteOrder::detect().unwrap());

    let err = sign_blocks(BlockReader::new(Cursor::new(input), 16), &mut timer, &mut out)
        .unwrap_err();
    assert!(matches!(
        err,
        TimeSignError::Write {
            stream: "signatures",
            blocks: 0,
            ..
        }
    ));
    let (_, timings) = out.into_inner();
    assert!(timings.is_empty());
}

#[test]
fn read_error_keeps_earlier_blocks() {
    let input: Vec<u8> = (0..32u8).collect();
    let mut timer = timer(Curve::P256);
    let order = ByteOrder::detect().unwrap();
    let mut out = OutputWriter::new(Vec::new(), Vec::new(), order);
    let reader = Broken {
        data: Cursor::new(input.clone()),
    };

    let err = sign_blocks(BlockReader::new(reader, 16), &mut timer, &mut out).unwrap_err();
    assert!(matches!(err, TimeSignError::Read { blocks: 2, .. }));
    assert!(!err.is_setup_error());
    assert_eq!(out.entries(), 2);

    let (signatures, timings) = out.into_inner();
    let signatures = split_signatures(&signatures).unwrap();
    assert_eq!(signatures.len(), 2);
    for (block, signature) in input.chunks(16).zip(&signatures) {
        assert!(verify(timer.key(), block, signature));
    }
    assert_eq!(timings.len(), 16);
    assert_eq!(order.decode_samples(&timings).len(), 2);
}
