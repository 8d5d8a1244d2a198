// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::clock::ClockSource;
use crate::error::{TimeSignError, TimeSignResult};
use std::path::PathBuf;

/// Parameters of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// File with the data to sign.
    pub input: PathBuf,
    /// Destination of the concatenated DER signatures.
    pub signatures: PathBuf,
    /// Destination of the concatenated timing samples.
    pub timings: PathBuf,
    /// PEM file with a PKCS8 elliptic curve private key.
    pub key: PathBuf,
    /// Number of bytes signed per operation.
    pub block_size: usize,
    pub clock: ClockSource,
}

impl RunConfig {
    pub fn validate(&self) -> TimeSignResult<()> {
        if self.block_size == 0 {
            return Err(TimeSignError::InvalidBlockSize(self.block_size));
        }
        Ok(())
    }
}
