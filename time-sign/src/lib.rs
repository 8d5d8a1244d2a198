// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0
#![warn(
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    rust_2021_compatibility
)]

//! Sequential ECDSA signing harness.
//!
//! An input file is split into fixed-size blocks, each block is signed with an elliptic curve
//! private key using a fresh random nonce, and the duration of every signing call is recorded.
//! Signatures and timing samples are written to two separate flat binary streams, in input order.

#[cfg(test)]
#[path = "tests/test_helpers.rs"]
pub mod test_helpers;

#[cfg(test)]
#[path = "tests/endianness_tests.rs"]
pub mod endianness_tests;

#[cfg(test)]
#[path = "tests/key_tests.rs"]
pub mod key_tests;

#[cfg(test)]
#[path = "tests/reader_tests.rs"]
pub mod reader_tests;

#[cfg(test)]
#[path = "tests/clock_tests.rs"]
pub mod clock_tests;

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
pub mod engine_tests;

#[cfg(test)]
#[path = "tests/output_tests.rs"]
pub mod output_tests;

#[cfg(test)]
#[path = "tests/run_tests.rs"]
pub mod run_tests;

pub mod clock;
pub mod config;
pub mod endianness;
pub mod engine;
pub mod error;
pub mod key;
pub mod output;
pub mod reader;
pub mod run;

pub use config::RunConfig;
pub use error::{TimeSignError, TimeSignResult};
pub use run::{run, RunSummary};
