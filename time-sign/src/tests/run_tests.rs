// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::clock::ClockSource;
use crate::config::RunConfig;
use crate::endianness::ByteOrder;
use crate::error::TimeSignError;
use crate::key::{Curve, EcPrivateKey};
use crate::output::split_signatures;
use crate::run::run;
use crate::test_helpers::{pem_for, verify, RSA_PKCS8_PEM};
use std::path::Path;
use tempfile::TempDir;

struct Scratch {
    dir: TempDir,
    config: RunConfig,
}

fn scratch(input: &[u8], key_pem: &str, block_size: usize) -> Scratch {
    let dir = tempfile::tempdir().unwrap();
    let path = |name: &str| dir.path().join(name);
    std::fs::write(path("data"), input).unwrap();
    std::fs::write(path("priv_key.pem"), key_pem).unwrap();
    let config = RunConfig {
        input: path("data"),
        signatures: path("sigs"),
        timings: path("times"),
        key: path("priv_key.pem"),
        block_size,
        clock: ClockSource::Monotonic,
    };
    Scratch { dir, config }
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

#[test]
fn signs_whole_file() {
    let input: Vec<u8> = (0..64u8).collect();
    let pem = pem_for(Curve::P256, 11);
    let s = scratch(&input, &pem, 16);

    let summary = run(&s.config).unwrap();
    assert_eq!(summary.blocks, 4);
    assert_eq!(summary.curve, Curve::P256);
    assert_eq!(summary.clock, ClockSource::Monotonic);

    let key = EcPrivateKey::from_pem(pem.as_bytes()).unwrap();
    let signatures = read(&s.config.signatures);
    assert_eq!(summary.signature_bytes, signatures.len() as u64);
    let signatures = split_signatures(&signatures).unwrap();
    assert_eq!(signatures.len(), 4);
    for (i, signature) in signatures.iter().enumerate() {
        assert!(verify(&key, &input[i * 16..(i + 1) * 16], signature));
    }

    let timings = read(&s.config.timings);
    assert_eq!(timings.len(), 32);
    let order = ByteOrder::detect().unwrap();
    assert_eq!(summary.byte_order, order);
    let samples = order.decode_samples(&timings);
    assert!(samples.iter().all(|&ns| ns > 0 && ns < 60_000_000_000));
}

#[test]
fn truncated_input_keeps_complete_blocks() {
    let s = scratch(&[9u8; 65], &pem_for(Curve::P256, 12), 16);
    let err = run(&s.config).unwrap_err();
    assert!(matches!(
        err,
        TimeSignError::Truncated {
            expected: 16,
            actual: 1
        }
    ));
    assert!(!err.is_setup_error());
    assert_eq!(split_signatures(&read(&s.config.signatures)).unwrap().len(), 4);
    assert_eq!(read(&s.config.timings).len(), 32);
}

#[test]
fn empty_input_succeeds_with_empty_outputs() {
    let s = scratch(&[], &pem_for(Curve::Secp256k1, 13), 32);
    let summary = run(&s.config).unwrap();
    assert_eq!(summary.blocks, 0);
    assert!(read(&s.config.signatures).is_empty());
    assert!(read(&s.config.timings).is_empty());
}

#[test]
fn rsa_key_aborts_before_signing() {
    let s = scratch(&[1u8; 64], RSA_PKCS8_PEM, 16);
    std::fs::write(&s.config.signatures, b"stale").unwrap();

    let err = run(&s.config).unwrap_err();
    assert!(matches!(err, TimeSignError::NotEcKey(_)));
    assert!(err.is_setup_error());
    // Outputs were created and truncated, nothing was written.
    assert!(read(&s.config.signatures).is_empty());
    assert!(read(&s.config.timings).is_empty());
}

#[test]
fn zero_block_size_is_rejected() {
    let s = scratch(&[1u8; 64], &pem_for(Curve::P256, 14), 0);
    assert!(matches!(
        run(&s.config),
        Err(TimeSignError::InvalidBlockSize(0))
    ));
    assert!(!s.config.signatures.exists());
}

#[test]
fn missing_input_is_reported() {
    let s = scratch(&[], &pem_for(Curve::P256, 15), 16);
    std::fs::remove_file(&s.config.input).unwrap();
    let err = run(&s.config).unwrap_err();
    assert!(matches!(err, TimeSignError::Open { role: "input", .. }));
    assert!(s.dir.path().exists());
}

#[test]
fn wall_subsec_clock_records_subsecond_differences() {
    let mut s = scratch(&[3u8; 96], &pem_for(Curve::P384, 16), 32);
    s.config.clock = ClockSource::WallSubsec;
    let summary = run(&s.config).unwrap();
    assert_eq!(summary.clock, ClockSource::WallSubsec);

    let samples = ByteOrder::detect()
        .unwrap()
        .decode_samples(&read(&s.config.timings));
    assert_eq!(samples.len(), 3);
    // Either a plain sub-second difference or the wrapped value of a call crossing a second.
    assert!(samples
        .iter()
        .all(|&d| d < 1_000_000_000 || d > u64::MAX - 1_000_000_000));
}
