// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::clock::{Clock, ClockSource};
use crate::config::RunConfig;
use crate::endianness::ByteOrder;
use crate::engine::{sign_blocks, SignTimer};
use crate::error::{TimeSignError, TimeSignResult};
use crate::key::{Curve, EcPrivateKey};
use crate::output::OutputWriter;
use crate::reader::BlockReader;
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, info};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub blocks: u64,
    pub signature_bytes: u64,
    pub curve: Curve,
    pub byte_order: ByteOrder,
    pub clock: ClockSource,
}

/// Sign every block of `config.input` and record signatures and timings.
///
/// Setup order is fixed: the input is opened and both
/// outputs are created (and truncated) before the key is parsed. Nothing is signed unless every
/// setup step succeeds. Whatever the outcome of the loop, both outputs are flushed before
/// returning.
pub fn run(config: &RunConfig) -> TimeSignResult<RunSummary> {
    config.validate()?;
    let byte_order = ByteOrder::detect()?;
    debug!("Native byte order is {}", byte_order);
    let clock = Clock::new(config.clock)?;

    let input = File::open(&config.input).map_err(|source| TimeSignError::Open {
        role: "input",
        path: config.input.clone(),
        source,
    })?;
    let mut out = OutputWriter::create(&config.signatures, &config.timings, byte_order)?;

    let key = EcPrivateKey::from_file(&config.key)?;
    let curve = key.curve();
    info!(
        "Signing {}-byte blocks of {} with a {} key, timing with the {} clock",
        config.block_size,
        config.input.display(),
        curve,
        config.clock
    );

    let blocks = BlockReader::new(BufReader::new(input), config.block_size);
    let mut timer = SignTimer::new(key, clock);
    let result = sign_blocks(blocks, &mut timer, &mut out);
    let flushed = out.flush();
    let blocks = result?;
    flushed?;

    info!(
        "Finished: {} signatures ({} bytes) and {} timing samples",
        blocks,
        out.signature_bytes(),
        blocks
    );
    Ok(RunSummary {
        blocks,
        signature_bytes: out.signature_bytes(),
        curve,
        byte_order,
        clock: config.clock,
    })
}
