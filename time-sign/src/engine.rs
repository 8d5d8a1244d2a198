// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The sign-and-time loop.
//!
//! Blocks are processed strictly one at a time: a block is read, signed between two clock
//! readings, and its pair written out before the next block is read. The loop stops at the first
//! error and leaves whatever was already written in place.

use crate::clock::Clock;
use crate::error::{TimeSignError, TimeSignResult};
use crate::key::EcPrivateKey;
use crate::output::OutputWriter;
use crate::reader::BlockReader;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::io::{Read, Write};
use tracing::{trace, warn};

/// A signature together with the time it took to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBlock {
    /// DER encoding of (r, s).
    pub signature: Vec<u8>,
    /// Clock ticks between the readings taken around the signing call.
    pub elapsed: u64,
}

/// Holds the private key for the lifetime of a run and times each signing call.
pub struct SignTimer<G = OsRng> {
    key: EcPrivateKey,
    clock: Clock,
    rng: G,
}

impl SignTimer<OsRng> {
    /// Sign with nonces drawn from the operating system's secure random source.
    pub fn new(key: EcPrivateKey, clock: Clock) -> Self {
        Self::with_rng(key, clock, OsRng)
    }
}

impl<G: CryptoRng + RngCore> SignTimer<G> {
    pub fn with_rng(key: EcPrivateKey, clock: Clock, rng: G) -> Self {
        Self { key, clock, rng }
    }

    pub fn key(&self) -> &EcPrivateKey {
        &self.key
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Sign `block` and measure the duration of the signing call alone.
    pub fn sign_block(&mut self, block: &[u8]) -> TimeSignResult<SignedBlock> {
        let before = self.clock.start();
        let signature = self.key.sign(&mut self.rng, block);
        let after = self.clock.stop();

        Ok(SignedBlock {
            signature: signature?,
            elapsed: Clock::elapsed(before, after),
        })
    }
}

/// Sign every block of `blocks` and write the pairs to `out`. Returns the number of pairs written.
///
/// Read and write errors end the loop and are returned after being logged. A signing error is
/// returned before anything is written for the current block.
pub fn sign_blocks<R, S, T, G>(
    blocks: BlockReader<R>,
    timer: &mut SignTimer<G>,
    out: &mut OutputWriter<S, T>,
) -> TimeSignResult<u64>
where
    R: Read,
    S: Write,
    T: Write,
    G: CryptoRng + RngCore,
{
    for block in blocks {
        let block = block.map_err(|e| {
            if let TimeSignError::Read { .. } = e {
                warn!("Stopping: {}", e);
            }
            e
        })?;

        let signed = timer.sign_block(&block)?;

        out.write(&signed.signature, signed.elapsed).map_err(|e| {
            warn!("Stopping: {}", e);
            e
        })?;
        trace!(
            "Block {}: {} byte signature in {} ticks",
            out.entries(),
            signed.signature.len(),
            signed.elapsed
        );
    }
    Ok(out.entries())
}
